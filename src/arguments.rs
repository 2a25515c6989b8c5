/// Centralized argument handling for RelayBot
///
/// Consolidates command-line argument parsing and debug flag checking so the
/// logger and main can share one source of truth.
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
/// Thread-safe singleton that stores arguments for access throughout the application
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
/// Returns None if the flag is not found or has no value
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

/// Path to the JSON config file (-c / --config-path), defaults to config.json
pub fn get_config_path() -> String {
    get_arg_value("-c")
        .or_else(|| get_arg_value("--config-path"))
        .unwrap_or_else(|| "config.json".to_string())
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// =============================================================================

/// Pattern extraction debug mode
pub fn is_debug_patterns_enabled() -> bool {
    has_arg("--debug-patterns")
}

/// Dedup cache debug mode
pub fn is_debug_cache_enabled() -> bool {
    has_arg("--debug-cache")
}

/// Dispatch debug mode
pub fn is_debug_dispatch_enabled() -> bool {
    has_arg("--debug-dispatch")
}

/// Confirmation relay debug mode
pub fn is_debug_relay_enabled() -> bool {
    has_arg("--debug-relay")
}

/// Persistence task debug mode
pub fn is_debug_persist_enabled() -> bool {
    has_arg("--debug-persist")
}

/// Telegram transport debug mode
pub fn is_debug_telegram_enabled() -> bool {
    has_arg("--debug-telegram")
}

/// Engine event loop debug mode
pub fn is_debug_engine_enabled() -> bool {
    has_arg("--debug-engine")
}

/// Global verbose mode
pub fn is_verbose_enabled() -> bool {
    has_arg("--verbose")
}

/// Help requested
pub fn is_help_requested() -> bool {
    has_arg("--help") || has_arg("-h")
}

/// Print usage information
pub fn print_help() {
    println!("RelayBot - contract detection and forwarding engine");
    println!();
    println!("USAGE:");
    println!("  relaybot [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -c, --config-path <PATH>   Config file path (default: config.json)");
    println!("  -h, --help                 Show this help");
    println!("      --verbose              Enable verbose logging everywhere");
    println!();
    println!("DEBUG FLAGS:");
    println!("      --debug-engine         Message handling loop diagnostics");
    println!("      --debug-patterns       Pattern extraction diagnostics");
    println!("      --debug-cache          Dedup cache diagnostics");
    println!("      --debug-dispatch       Forwarding dispatch diagnostics");
    println!("      --debug-relay          Confirmation relay diagnostics");
    println!("      --debug-persist        Persistence task diagnostics");
    println!("      --debug-telegram       Telegram transport diagnostics");
}
