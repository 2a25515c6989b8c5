/// Log tags identifying the module a message originates from
///
/// Each tag maps to a --debug-<module> CLI flag so diagnostics can be
/// enabled per module without drowning the console.
use crate::arguments;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    System,
    Engine,
    Patterns,
    Cache,
    Dispatch,
    Relay,
    Persist,
    Telegram,
    Test,
}

impl LogTag {
    /// Plain display name, used for file output and alignment
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Engine => "ENGINE",
            LogTag::Patterns => "PATTERNS",
            LogTag::Cache => "CACHE",
            LogTag::Dispatch => "DISPATCH",
            LogTag::Relay => "RELAY",
            LogTag::Persist => "PERSIST",
            LogTag::Telegram => "TELEGRAM",
            LogTag::Test => "TEST",
        }
    }

    /// Whether debug output for this tag was requested on the command line
    pub fn is_debug_enabled(&self) -> bool {
        match self {
            LogTag::System => true,
            LogTag::Engine => arguments::is_debug_engine_enabled(),
            LogTag::Patterns => arguments::is_debug_patterns_enabled(),
            LogTag::Cache => arguments::is_debug_cache_enabled(),
            LogTag::Dispatch => arguments::is_debug_dispatch_enabled(),
            LogTag::Relay => arguments::is_debug_relay_enabled(),
            LogTag::Persist => arguments::is_debug_persist_enabled(),
            LogTag::Telegram => arguments::is_debug_telegram_enabled(),
            LogTag::Test => true,
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
