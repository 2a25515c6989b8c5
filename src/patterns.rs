//! Multi-chain contract address pattern registry
//!
//! A fixed, ordered table of per-chain address matchers plus a separate set
//! of coin-reference patterns (tickers, scan/chart commands) that carry no
//! chain identifier. Extraction is pure and stateless; deduplication lives
//! in the cache module.
//!
//! Ambiguity policy: matchers run in a fixed order from strictest to
//! loosest (Move, Evm, Ton, Trx, Xrp, Sol) and a match whose byte span
//! overlaps a span already claimed by an earlier chain is discarded. The
//! permissive Sol matcher (any base58 run of 32-44 chars) therefore never
//! re-reports the interior of an address another chain already claimed.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Blockchain networks whose address formats are recognized.
///
/// Variant order is the matcher evaluation order and is significant: see
/// the ambiguity policy above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    Move,
    Evm,
    Ton,
    Trx,
    Xrp,
    Sol,
}

impl ChainId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Move => "MOVE",
            ChainId::Evm => "EVM",
            ChainId::Ton => "TON",
            ChainId::Trx => "TRX",
            ChainId::Xrp => "XRP",
            ChainId::Sol => "SOL",
        }
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Raw pattern sources, shared between the plain and backtick-quoted tables.
const MOVE_PATTERN: &str = r"0x[a-fA-F0-9]{64}::[a-zA-Z0-9_]+::[a-zA-Z0-9_]+";
const EVM_PATTERN: &str = r"0x[a-fA-F0-9]{40}";
const TON_PATTERN: &str = r"(?:EQ|UQ)[A-Za-z0-9_-]{46}";
const TRX_PATTERN: &str = r"T[1-9A-HJ-NP-Za-km-z]{33}";
const XRP_PATTERN: &str = r"r[1-9A-HJ-NP-Za-km-z]{24,34}";
const SOL_PATTERN: &str = r"[1-9A-HJ-NP-Za-km-z]{32,44}";

/// Coin-reference patterns: tickers and the scan/chart bot commands.
/// These only influence raw-message relay, never address forwarding.
const TICKER_PATTERN: &str = r"\$[A-Za-z0-9]+";
const SCAN_PATTERN: &str = r"^/z";
const CHART_PATTERN: &str = r"^/cc";

fn chain_table() -> Vec<(ChainId, &'static str)> {
    vec![
        (ChainId::Move, MOVE_PATTERN),
        (ChainId::Evm, EVM_PATTERN),
        (ChainId::Ton, TON_PATTERN),
        (ChainId::Trx, TRX_PATTERN),
        (ChainId::Xrp, XRP_PATTERN),
        (ChainId::Sol, SOL_PATTERN),
    ]
}

static CONTRACT_PATTERNS: Lazy<Vec<(ChainId, Regex)>> = Lazy::new(|| {
    chain_table()
        .into_iter()
        .map(|(chain, pattern)| (chain, Regex::new(pattern).expect("static pattern")))
        .collect()
});

/// Backtick-quoted variants for confirmation-source listings, which wrap
/// every address in backtick emphasis.
static QUOTED_PATTERNS: Lazy<Vec<(ChainId, Regex)>> = Lazy::new(|| {
    chain_table()
        .into_iter()
        .map(|(chain, pattern)| {
            let quoted = format!("`{}`", pattern);
            (chain, Regex::new(&quoted).expect("static pattern"))
        })
        .collect()
});

static COIN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [TICKER_PATTERN, SCAN_PATTERN, CHART_PATTERN]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("static pattern"))
        .collect()
});

fn extract_with(table: &[(ChainId, Regex)], text: &str) -> BTreeMap<ChainId, BTreeSet<String>> {
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut out: BTreeMap<ChainId, BTreeSet<String>> = BTreeMap::new();

    for (chain, regex) in table {
        for hit in regex.find_iter(text) {
            let overlaps = claimed
                .iter()
                .any(|&(start, end)| hit.start() < end && start < hit.end());
            if overlaps {
                continue;
            }
            claimed.push((hit.start(), hit.end()));
            out.entry(*chain)
                .or_default()
                .insert(hit.as_str().trim_matches('`').to_string());
        }
    }

    out
}

/// Extract all contract addresses from free-form message text, grouped by
/// chain. Non-overlapping across chains per the ambiguity policy.
pub fn extract(text: &str) -> BTreeMap<ChainId, BTreeSet<String>> {
    extract_with(&CONTRACT_PATTERNS, text)
}

/// Extraction variant for confirmation-source messages: only accepts
/// addresses wrapped in backticks and strips the backticks from the result.
pub fn extract_quoted(text: &str) -> BTreeMap<ChainId, BTreeSet<String>> {
    extract_with(&QUOTED_PATTERNS, text)
}

/// Whether the text references a coin at all: any ticker, scan/chart
/// command, or contract address. Used to decide raw-message relay.
pub fn references_coin(text: &str) -> bool {
    COIN_PATTERNS.iter().any(|regex| regex.is_match(text))
        || CONTRACT_PATTERNS
            .iter()
            .any(|(_, regex)| regex.is_match(text))
}
