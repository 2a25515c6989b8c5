//! Confirmation relay handler
//!
//! Secondary pipeline triggered by the designated confirmation bot's
//! "first confirmed appearance" notices. Two variants exist:
//!
//! - aggregation-chat notices, gated by the configured UTC hour window;
//! - notices inside tracked sources, honored only when the replied-to
//!   sender is on the always-forward whitelist.
//!
//! Both re-run extraction with the backtick-stripping matcher and claim
//! through the same cache as the primary pipeline, so this path only picks
//! up addresses the primary pipeline missed. Jobs route to each chain's
//! secondary target and no raw-message relay is produced (the message
//! already lives in the aggregation chat or is being aggregated anyway).

use crate::cache::SeenCache;
use crate::configs::RelayConfig;
use crate::logger::{self, LogTag};
use crate::patterns;
use crate::pipeline::{self, InboundMessage, MessagePlan};
use crate::utils;

/// Marker substring the confirmation bot puts in first-appearance notices.
pub const FIRST_TIME_MARKER: &str = "\u{1F4A8} You are first";

/// Whether a message is a first-time notice from the confirmation bot.
pub fn is_confirmation(msg: &InboundMessage, config: &RelayConfig) -> bool {
    msg.sender == config.confirmation_bot && msg.text.contains(FIRST_TIME_MARKER)
}

/// Plan for a confirmation notice seen in the aggregation chat.
/// Returns an empty plan outside the configured hour window.
pub fn plan_aggregation_confirmation(
    msg: &InboundMessage,
    cache: &SeenCache,
    config: &RelayConfig,
) -> MessagePlan {
    if !utils::within_utc_hours(config.start_hour, config.end_hour) {
        logger::debug(
            LogTag::Relay,
            &format!(
                "Confirmation outside {}-{} UTC window, skipped",
                config.start_hour, config.end_hour
            ),
        );
        return MessagePlan::default();
    }

    logger::info(
        LogTag::Relay,
        &format!(
            "First time ca detected in {}: {}",
            config.name_of(msg.source),
            msg.text
        ),
    );
    plan_confirmation(msg, cache)
}

/// Plan for a confirmation notice inside a tracked source. Honored only when
/// the replied-to sender (the original shiller) is whitelisted.
pub fn plan_whitelist_confirmation(
    msg: &InboundMessage,
    cache: &SeenCache,
    config: &RelayConfig,
) -> MessagePlan {
    let Some(reply_sender) = msg.reply_to_sender else {
        return MessagePlan::default();
    };
    if !config.whitelist_ids().contains(&reply_sender) {
        return MessagePlan::default();
    }

    logger::info(
        LogTag::Relay,
        &format!(
            "First time ca post detected by {} ({}) in {} ({})",
            config.name_of(reply_sender),
            reply_sender,
            config.name_of(msg.source),
            msg.source
        ),
    );
    plan_confirmation(msg, cache)
}

/// Shared extraction-and-claim for both confirmation variants. Uses the
/// backtick-quoted matcher since confirmation listings quote every address.
fn plan_confirmation(msg: &InboundMessage, cache: &SeenCache) -> MessagePlan {
    let jobs = pipeline::claim_extracted(&patterns::extract_quoted(&msg.text), cache);
    MessagePlan {
        jobs,
        relay_original: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::test_support::test_config;
    use crate::patterns::ChainId;

    const EVM_ADDR: &str = "0x1234567890abcdef1234567890abcdef12345678";

    fn confirmation_message(source: i64, text: &str) -> InboundMessage {
        InboundMessage {
            sender: 6126376117,
            source,
            message_id: 9,
            text: text.to_string(),
            forwarded: false,
            reply_to_sender: None,
        }
    }

    #[test]
    fn recognizes_confirmation_notices() {
        let config = test_config();
        let msg = confirmation_message(-2000, "💨 You are first to call this");
        assert!(is_confirmation(&msg, &config));

        let wrong_sender = InboundMessage {
            sender: 1,
            ..msg.clone()
        };
        assert!(!is_confirmation(&wrong_sender, &config));

        let no_marker = confirmation_message(-2000, "you are late");
        assert!(!is_confirmation(&no_marker, &config));
    }

    #[test]
    fn claims_backticked_address_for_secondary_route() {
        let config = test_config();
        let cache = SeenCache::new();
        let msg = confirmation_message(
            -2000,
            &format!("💨 You are first\nCA: `{}`", EVM_ADDR),
        );

        let plan = plan_aggregation_confirmation(&msg, &cache, &config);
        assert_eq!(plan.jobs.len(), 1);
        assert_eq!(plan.jobs[0].chain, ChainId::Evm);
        assert!(!plan.relay_original);
    }

    #[test]
    fn already_seen_address_produces_no_jobs() {
        let config = test_config();
        let cache = SeenCache::new();
        cache.claim_new([EVM_ADDR]);

        let msg = confirmation_message(
            -2000,
            &format!("💨 You are first\nCA: `{}`", EVM_ADDR),
        );
        let plan = plan_aggregation_confirmation(&msg, &cache, &config);
        assert!(plan.is_empty());
    }

    #[test]
    fn unquoted_address_in_confirmation_is_ignored() {
        let config = test_config();
        let cache = SeenCache::new();
        let msg = confirmation_message(
            -2000,
            &format!("💨 You are first\nCA: {}", EVM_ADDR),
        );

        let plan = plan_aggregation_confirmation(&msg, &cache, &config);
        assert!(plan.jobs.is_empty());
    }

    #[test]
    fn outside_hour_window_yields_empty_plan() {
        let mut config = test_config();
        // Pick a window that excludes the current hour.
        let hour = chrono::Timelike::hour(&chrono::Utc::now());
        if hour == 0 {
            config.start_hour = 23;
            config.end_hour = 23;
        } else {
            config.start_hour = 0;
            config.end_hour = hour - 1;
        }

        let cache = SeenCache::new();
        let msg = confirmation_message(
            -2000,
            &format!("💨 You are first\nCA: `{}`", EVM_ADDR),
        );
        let plan = plan_aggregation_confirmation(&msg, &cache, &config);
        assert!(plan.is_empty());
        // Nothing was claimed, the primary pipeline can still pick it up.
        assert!(cache.is_empty());
    }

    #[test]
    fn whitelist_relay_requires_whitelisted_reply_sender() {
        let config = test_config();
        let cache = SeenCache::new();
        let text = format!("💨 You are first\nCA: `{}`", EVM_ADDR);

        let mut msg = confirmation_message(-1001, &text);
        msg.reply_to_sender = Some(555); // not whitelisted
        assert!(plan_whitelist_confirmation(&msg, &cache, &config).is_empty());

        msg.reply_to_sender = Some(777); // whitelisted
        let plan = plan_whitelist_confirmation(&msg, &cache, &config);
        assert_eq!(plan.jobs.len(), 1);

        let mut no_reply = confirmation_message(-1001, &text);
        no_reply.reply_to_sender = None;
        assert!(plan_whitelist_confirmation(&no_reply, &cache, &config).is_empty());
    }
}
