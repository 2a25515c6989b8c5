//! Forwarding dispatcher
//!
//! Executes a MessagePlan against the transport: one send per newly claimed
//! address and at most one verbatim relay of the original message. All
//! operations for one message run concurrently and are awaited together;
//! a failed send is logged and dropped without affecting its siblings
//! (at-most-once delivery).

use crate::configs::RelayConfig;
use crate::errors::RelayResult;
use crate::logger::{self, LogTag};
use crate::pipeline::{InboundMessage, MessagePlan};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;

/// Which per-chain target a plan's address jobs go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Primary pipeline: first-choice bot per chain
    Primary,
    /// Confirmation relay: second-choice bot per chain
    Secondary,
}

/// The transport collaborator. Connecting, authenticating and delivering
/// inbound events live behind this seam; the engine only sends and forwards.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send bare text to a target
    async fn send(&self, target: i64, text: &str) -> RelayResult<()>;

    /// Forward the original message verbatim to a target
    async fn forward(&self, target: i64, message: &InboundMessage) -> RelayResult<()>;
}

/// Execute all jobs in `plan` concurrently and wait for every one to finish
/// or fail before returning.
pub async fn dispatch(
    transport: &dyn Transport,
    config: &RelayConfig,
    msg: &InboundMessage,
    plan: &MessagePlan,
    route: Route,
) {
    let mut ops: Vec<BoxFuture<'_, ()>> = Vec::new();

    for job in &plan.jobs {
        let target = config.route_for(job.chain).and_then(|entry| match route {
            Route::Primary => entry.primary.as_ref(),
            Route::Secondary => entry.secondary.as_ref(),
        });

        let Some(target) = target else {
            logger::debug(
                LogTag::Dispatch,
                &format!(
                    "No {:?} target for {}, claimed {} without sending",
                    route, job.chain, job.address
                ),
            );
            continue;
        };

        ops.push(
            async move {
                match transport.send(target.id, &job.address).await {
                    Ok(()) => {
                        logger::info(
                            LogTag::Dispatch,
                            &format!(
                                "Contract ({}) forwarded to {} ({})",
                                job.address,
                                config.name_of(target.id),
                                target.id
                            ),
                        );
                    }
                    Err(e) => {
                        logger::error(
                            LogTag::Dispatch,
                            &format!(
                                "Failed to forward {} to {} ({}): {}",
                                job.address,
                                config.name_of(target.id),
                                target.id,
                                e
                            ),
                        );
                    }
                }
            }
            .boxed(),
        );
    }

    if plan.relay_original {
        let target = config.fwd_group.id;
        ops.push(
            async move {
                match transport.forward(target, msg).await {
                    Ok(()) => {
                        logger::info(
                            LogTag::Dispatch,
                            &format!(
                                "Message relayed to {} ({}): {}",
                                config.name_of(target),
                                target,
                                msg.text
                            ),
                        );
                    }
                    Err(e) => {
                        logger::error(
                            LogTag::Dispatch,
                            &format!("Failed to relay message to {}: {}", target, e),
                        );
                    }
                }
            }
            .boxed(),
        );
    }

    futures::future::join_all(ops).await;
}


#[cfg(test)]
mod tests {
    use super::test_support::MockTransport;
    use super::*;
    use crate::configs::test_support::test_config;
    use crate::patterns::ChainId;
    use crate::pipeline::AddressJob;

    const EVM_ADDR: &str = "0x1234567890abcdef1234567890abcdef12345678";

    fn message(text: &str) -> InboundMessage {
        InboundMessage {
            sender: 42,
            source: -1001,
            message_id: 7,
            text: text.to_string(),
            forwarded: false,
            reply_to_sender: None,
        }
    }

    fn plan_with(jobs: Vec<AddressJob>, relay_original: bool) -> MessagePlan {
        MessagePlan {
            jobs,
            relay_original,
        }
    }

    #[tokio::test]
    async fn sends_address_to_primary_and_relays_original() {
        let config = test_config();
        let transport = MockTransport::default();
        let msg = message(&format!("Buy CA: {} now", EVM_ADDR));
        let plan = plan_with(
            vec![AddressJob {
                chain: ChainId::Evm,
                address: EVM_ADDR.to_string(),
            }],
            true,
        );

        dispatch(&transport, &config, &msg, &plan, Route::Primary).await;

        let sends = transport.sends.lock();
        assert_eq!(*sends, vec![(100, EVM_ADDR.to_string())]);
        let forwards = transport.forwards.lock();
        assert_eq!(forwards.len(), 1);
        assert_eq!(forwards[0].0, -2000);
    }

    #[tokio::test]
    async fn secondary_route_uses_second_target() {
        let config = test_config();
        let transport = MockTransport::default();
        let msg = message("confirmation");
        let plan = plan_with(
            vec![AddressJob {
                chain: ChainId::Sol,
                address: "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".to_string(),
            }],
            false,
        );

        dispatch(&transport, &config, &msg, &plan, Route::Secondary).await;

        let sends = transport.sends.lock();
        assert_eq!(sends[0].0, 201);
        assert!(transport.forwards.lock().is_empty());
    }

    #[tokio::test]
    async fn unrouted_chain_is_skipped_silently() {
        let config = test_config();
        let transport = MockTransport::default();
        let msg = message("ton contract");
        let plan = plan_with(
            vec![AddressJob {
                chain: ChainId::Ton,
                address: "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM".to_string(),
            }],
            false,
        );

        dispatch(&transport, &config, &msg, &plan, Route::Primary).await;

        assert!(transport.sends.lock().is_empty());
    }

    #[tokio::test]
    async fn one_failed_send_does_not_block_siblings() {
        let config = test_config();
        let transport = MockTransport {
            fail_targets: vec![100],
            ..Default::default()
        };
        let msg = message(&format!("two chains {} x", EVM_ADDR));
        let plan = plan_with(
            vec![
                AddressJob {
                    chain: ChainId::Evm,
                    address: EVM_ADDR.to_string(),
                },
                AddressJob {
                    chain: ChainId::Sol,
                    address: "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".to_string(),
                },
            ],
            true,
        );

        dispatch(&transport, &config, &msg, &plan, Route::Primary).await;

        // EVM send failed; SOL send and relay still happened.
        let sends = transport.sends.lock();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].0, 200);
        assert_eq!(transport.forwards.lock().len(), 1);
    }
}
