//! Runtime configuration loaded from a JSON file
//!
//! Mirrors the operational surface of the engine: tracked sources, ignore
//! lists, per-chain forwarding targets, the aggregation target, the
//! confirmation bot, time gating and persistence settings.

use crate::errors::RelayError;
use crate::patterns::ChainId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// A chat, channel, user or bot the transport can address, with a human
/// readable name for logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRef {
    pub id: i64,
    pub name: String,
}

/// Primary and secondary downstream targets for one chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainTargets {
    #[serde(default)]
    pub primary: Option<ChatRef>,
    #[serde(default)]
    pub secondary: Option<ChatRef>,
}

/// Runtime configuration, deserialized once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Transport bot token
    #[serde(default)]
    pub bot_token: String,

    /// Tracked message sources
    #[serde(default)]
    pub source_groups: Vec<ChatRef>,
    #[serde(default)]
    pub source_channels: Vec<ChatRef>,

    /// Senders whose messages are always dropped
    #[serde(default)]
    pub ignore_ids: Vec<ChatRef>,

    /// Senders whose shills are forwarded when confirmed (whitelist relay)
    #[serde(default)]
    pub always_forward: Vec<ChatRef>,

    /// Aggregation target for raw-message relays; also the chat the
    /// confirmation relay listens on
    pub fwd_group: ChatRef,

    /// Per-chain forwarding targets. A chain with no entry has no route;
    /// its addresses are still claimed, just not sent.
    #[serde(default)]
    pub targets: BTreeMap<ChainId, ChainTargets>,

    /// Sender id of the confirmation bot posting first-time notices
    #[serde(default = "default_confirmation_bot")]
    pub confirmation_bot: i64,

    /// Command prefixes that short-circuit all processing
    #[serde(default = "default_ignore_commands")]
    pub ignore_commands: Vec<String>,

    /// Strategy enable flags
    #[serde(default = "default_true")]
    pub aggregate: bool,
    #[serde(default)]
    pub confirm_relay: bool,
    #[serde(default)]
    pub whitelist_relay: bool,

    /// UTC hour window for the confirmation relay, inclusive on both ends
    #[serde(default)]
    pub start_hour: u32,
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,

    /// Dedup snapshot persistence
    #[serde(default = "default_seen_file")]
    pub seen_file: PathBuf,
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
    #[serde(default = "default_size_warn_bytes")]
    pub size_warn_bytes: usize,

    /// id -> name index over every ChatRef above, built after load
    #[serde(skip)]
    all_names: HashMap<i64, String>,
}

fn default_confirmation_bot() -> i64 {
    6126376117
}

fn default_ignore_commands() -> Vec<String> {
    ["/s", "/ask", "/nh", "/find", "/first"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_end_hour() -> u32 {
    23
}

fn default_seen_file() -> PathBuf {
    PathBuf::from("seen_contracts.txt")
}

fn default_flush_interval_secs() -> u64 {
    10
}

fn default_size_warn_bytes() -> usize {
    10 * 1024 * 1024
}

/// Reads the config file and returns a validated RelayConfig
pub fn read_config<P: AsRef<Path>>(path: P) -> Result<RelayConfig, RelayError> {
    let data = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        RelayError::Config(format!("failed to read {}: {}", path.as_ref().display(), e))
    })?;
    let mut config: RelayConfig = serde_json::from_str(&data)
        .map_err(|e| RelayError::Config(format!("failed to parse config: {}", e)))?;
    config.build_index();
    config.validate()?;
    Ok(config)
}

impl RelayConfig {
    /// Build the id -> name lookup from every configured ChatRef
    pub fn build_index(&mut self) {
        let mut names = HashMap::new();
        for chat in self
            .source_groups
            .iter()
            .chain(self.source_channels.iter())
            .chain(self.ignore_ids.iter())
            .chain(self.always_forward.iter())
        {
            names.insert(chat.id, chat.name.clone());
        }
        for targets in self.targets.values() {
            for chat in targets.primary.iter().chain(targets.secondary.iter()) {
                names.insert(chat.id, chat.name.clone());
            }
        }
        names.insert(self.fwd_group.id, self.fwd_group.name.clone());
        self.all_names = names;
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if (self.aggregate || self.whitelist_relay) && self.tracked_ids().is_empty() {
            return Err(RelayError::Config(
                "no source groups or channels configured".to_string(),
            ));
        }
        if self.start_hour > 23 || self.end_hour > 23 {
            return Err(RelayError::Config(format!(
                "hour window {}-{} out of range",
                self.start_hour, self.end_hour
            )));
        }
        if self.flush_interval_secs == 0 {
            return Err(RelayError::Config(
                "flush_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// All source ids the engine subscribes to
    pub fn tracked_ids(&self) -> HashSet<i64> {
        self.source_channels
            .iter()
            .chain(self.source_groups.iter())
            .map(|chat| chat.id)
            .collect()
    }

    pub fn ignored_sender_ids(&self) -> HashSet<i64> {
        self.ignore_ids.iter().map(|chat| chat.id).collect()
    }

    pub fn whitelist_ids(&self) -> HashSet<i64> {
        self.always_forward.iter().map(|chat| chat.id).collect()
    }

    pub fn is_tracked(&self, source: i64) -> bool {
        self.source_channels
            .iter()
            .chain(self.source_groups.iter())
            .any(|chat| chat.id == source)
    }

    /// Route table entry for one chain, if any
    pub fn route_for(&self, chain: ChainId) -> Option<&ChainTargets> {
        self.targets.get(&chain)
    }

    /// Human readable name for an id, for log lines
    pub fn name_of(&self, id: i64) -> &str {
        self.all_names
            .get(&id)
            .map(|name| name.as_str())
            .unwrap_or("unknown")
    }
}
