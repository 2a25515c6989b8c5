//! Filter & extraction pipeline
//!
//! Turns one inbound message into a list of dispatch jobs. Performs no I/O:
//! the only side effect is claiming fresh addresses in the dedup cache, so
//! the decision logic is testable without a transport.

use crate::cache::SeenCache;
use crate::configs::RelayConfig;
use crate::logger::{self, LogTag};
use crate::patterns::{self, ChainId};

/// Transport-independent inbound message, built by the transport adapter.
/// The engine never touches the transport library's event types.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Sender id (user or channel posting as itself)
    pub sender: i64,
    /// Chat the message appeared in
    pub source: i64,
    /// Transport message id, needed for verbatim forwarding
    pub message_id: i32,
    pub text: String,
    /// Whether the message is itself a forward
    pub forwarded: bool,
    /// Sender of the replied-to message, if this is a reply
    pub reply_to_sender: Option<i64>,
}

/// One newly claimed address to send downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressJob {
    pub chain: ChainId,
    pub address: String,
}

/// The pipeline's decision for one message: address forwards plus at most
/// one relay of the original message to the aggregation target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePlan {
    pub jobs: Vec<AddressJob>,
    pub relay_original: bool,
}

impl MessagePlan {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty() && !self.relay_original
    }
}

/// Run the primary filter & extraction pipeline over one message.
///
/// Ignore rules short-circuit everything. Address jobs are deduplicated
/// through the cache; the raw-message relay decision is independent of
/// dedup (a coin-referencing message is relayed even when every address in
/// it was already seen).
pub fn plan_message(msg: &InboundMessage, cache: &SeenCache, config: &RelayConfig) -> MessagePlan {
    if config.ignored_sender_ids().contains(&msg.sender) {
        logger::debug(
            LogTag::Engine,
            &format!(
                "Dropping message from ignored sender {} ({})",
                config.name_of(msg.sender),
                msg.sender
            ),
        );
        return MessagePlan::default();
    }

    for command in &config.ignore_commands {
        if msg.text.starts_with(command.as_str()) {
            logger::debug(
                LogTag::Engine,
                &format!("Dropping message starting with ignored command {}", command),
            );
            return MessagePlan::default();
        }
    }

    let jobs = claim_extracted(&patterns::extract(&msg.text), cache);
    let relay_original = patterns::references_coin(&msg.text);

    MessagePlan {
        jobs,
        relay_original,
    }
}

/// Claim extracted candidates per chain and turn the fresh ones into jobs.
/// Shared with the confirmation relay handler.
pub fn claim_extracted(
    extracted: &std::collections::BTreeMap<ChainId, std::collections::BTreeSet<String>>,
    cache: &SeenCache,
) -> Vec<AddressJob> {
    let mut jobs = Vec::new();
    for (chain, candidates) in extracted {
        let fresh = cache.claim_new(candidates.iter().map(|s| s.as_str()));
        if !fresh.is_empty() {
            logger::debug(
                LogTag::Cache,
                &format!("Claimed {} new {} address(es)", fresh.len(), chain),
            );
        }
        for address in fresh {
            jobs.push(AddressJob {
                chain: *chain,
                address,
            });
        }
    }
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::test_support::test_config;

    const EVM_ADDR: &str = "0x1234567890abcdef1234567890abcdef12345678";

    fn message(sender: i64, text: &str) -> InboundMessage {
        InboundMessage {
            sender,
            source: -1001,
            message_id: 1,
            text: text.to_string(),
            forwarded: false,
            reply_to_sender: None,
        }
    }

    #[test]
    fn new_address_produces_forward_and_relay() {
        let config = test_config();
        let cache = SeenCache::new();
        let msg = message(42, &format!("Buy CA: {} now", EVM_ADDR));

        let plan = plan_message(&msg, &cache, &config);
        assert_eq!(plan.jobs.len(), 1);
        assert_eq!(plan.jobs[0].chain, ChainId::Evm);
        assert_eq!(plan.jobs[0].address, EVM_ADDR);
        assert!(plan.relay_original);
    }

    #[test]
    fn seen_address_still_relays_message() {
        let config = test_config();
        let cache = SeenCache::new();
        cache.claim_new([EVM_ADDR]);

        let plan = plan_message(&message(42, &format!("again {}", EVM_ADDR)), &cache, &config);
        assert!(plan.jobs.is_empty());
        // Relay is independent of dedup.
        assert!(plan.relay_original);
    }

    #[test]
    fn ignored_sender_produces_no_jobs() {
        let config = test_config();
        let cache = SeenCache::new();

        let plan = plan_message(&message(666, &format!("CA {}", EVM_ADDR)), &cache, &config);
        assert!(plan.is_empty());
        // Nothing was claimed either; a later sender still gets the address.
        assert!(cache.is_empty());
    }

    #[test]
    fn ignored_command_short_circuits() {
        let config = test_config();
        let cache = SeenCache::new();

        let plan = plan_message(&message(42, &format!("/ask foo {}", EVM_ADDR)), &cache, &config);
        assert!(plan.is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn plain_chatter_produces_nothing() {
        let config = test_config();
        let cache = SeenCache::new();

        let plan = plan_message(&message(42, "anyone up for lunch?"), &cache, &config);
        assert!(plan.is_empty());
    }

    #[test]
    fn ticker_only_message_relays_without_jobs() {
        let config = test_config();
        let cache = SeenCache::new();

        let plan = plan_message(&message(42, "$PEPE to the moon"), &cache, &config);
        assert!(plan.jobs.is_empty());
        assert!(plan.relay_original);
    }

    #[test]
    fn second_plan_for_same_text_claims_nothing() {
        let config = test_config();
        let cache = SeenCache::new();
        let msg = message(42, &format!("CA {}", EVM_ADDR));

        let first = plan_message(&msg, &cache, &config);
        assert_eq!(first.jobs.len(), 1);

        let second = plan_message(&msg, &cache, &config);
        assert!(second.jobs.is_empty());
        assert!(second.relay_original);
    }
}
