//! Engine wiring: routes inbound messages through the pipelines and the
//! dispatcher, owns the run loop, and logs the active strategy block at
//! startup.
//!
//! One message can legitimately travel more than one pipeline: a
//! confirmation notice inside a tracked group is aggregated like any other
//! message *and* checked against the whitelist relay. Dedup correctness
//! only depends on the atomicity of individual cache claims, so the order
//! the pipelines run in does not matter.

use crate::cache::SeenCache;
use crate::configs::RelayConfig;
use crate::dispatcher::{self, Route, Transport};
use crate::logger::{self, LogTag};
use crate::pipeline::{self, InboundMessage};
use crate::relay;
use crate::utils::check_shutdown_or_delay;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::Notify;

pub struct Engine {
    config: Arc<RelayConfig>,
    cache: Arc<SeenCache>,
    transport: Arc<dyn Transport>,
}

impl Engine {
    pub fn new(
        config: Arc<RelayConfig>,
        cache: Arc<SeenCache>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            cache,
            transport,
        }
    }

    pub fn cache(&self) -> &Arc<SeenCache> {
        &self.cache
    }

    /// Log the active settings block, like the original startup banner.
    pub fn log_active_settings(&self) {
        logger::info(LogTag::System, "Launching engine. The following settings are active:");

        if self.config.aggregate {
            let sources: Vec<String> = self
                .config
                .source_channels
                .iter()
                .chain(self.config.source_groups.iter())
                .map(|chat| format!("{} ({})", chat.name, chat.id))
                .collect();
            logger::info(
                LogTag::System,
                &format!(
                    "Aggregating all contracts to {} ({}) from: {}",
                    self.config.fwd_group.name,
                    self.config.fwd_group.id,
                    sources.join(", ")
                ),
            );
            if !self.config.ignore_ids.is_empty() {
                let ignored: Vec<String> = self
                    .config
                    .ignore_ids
                    .iter()
                    .map(|chat| format!("{} ({})", chat.name, chat.id))
                    .collect();
                logger::info(
                    LogTag::System,
                    &format!("Ignoring senders: {}", ignored.join(", ")),
                );
            }
        }

        if self.config.confirm_relay {
            logger::info(
                LogTag::System,
                &format!(
                    "Forwarding fresh contracts from {} between {} and {} UTC",
                    self.config.fwd_group.name, self.config.start_hour, self.config.end_hour
                ),
            );
        }

        if self.config.whitelist_relay {
            let whitelist: Vec<String> = self
                .config
                .always_forward
                .iter()
                .map(|chat| format!("{} ({})", chat.name, chat.id))
                .collect();
            logger::info(
                LogTag::System,
                &format!(
                    "Forwarding fresh contracts shilled by: {}",
                    whitelist.join(", ")
                ),
            );
        }
    }

    /// Route one inbound message through every applicable pipeline and wait
    /// for all resulting dispatches to finish or fail.
    pub async fn handle_message(&self, msg: &InboundMessage) {
        logger::verbose(
            LogTag::Engine,
            &format!("Message from {} in {}: {}", msg.sender, msg.source, msg.text),
        );

        // Primary pipeline: tracked sources only.
        if self.config.aggregate && self.config.is_tracked(msg.source) {
            let plan = pipeline::plan_message(msg, &self.cache, &self.config);
            if !plan.is_empty() {
                dispatcher::dispatch(
                    self.transport.as_ref(),
                    &self.config,
                    msg,
                    &plan,
                    Route::Primary,
                )
                .await;
            }
        }

        // Confirmation paths.
        if relay::is_confirmation(msg, &self.config) {
            let plan = if msg.source == self.config.fwd_group.id {
                if !self.config.confirm_relay {
                    return;
                }
                relay::plan_aggregation_confirmation(msg, &self.cache, &self.config)
            } else if self.config.whitelist_relay && self.config.is_tracked(msg.source) {
                relay::plan_whitelist_confirmation(msg, &self.cache, &self.config)
            } else {
                return;
            };

            if !plan.is_empty() {
                dispatcher::dispatch(
                    self.transport.as_ref(),
                    &self.config,
                    msg,
                    &plan,
                    Route::Secondary,
                )
                .await;
            }
        }
    }

    /// Consume inbound messages until the channel closes or shutdown is
    /// signalled. In-flight dispatches always complete before the next
    /// message is taken, and before this returns.
    pub async fn run(&self, mut rx: mpsc::Receiver<InboundMessage>, shutdown: Arc<Notify>) {
        self.log_active_settings();

        loop {
            tokio::select! {
                maybe_msg = rx.recv() => {
                    match maybe_msg {
                        Some(msg) => self.handle_message(&msg).await,
                        None => {
                            logger::info(LogTag::Engine, "Inbound channel closed, stopping");
                            break;
                        }
                    }
                }
                signalled = check_shutdown_or_delay(&shutdown, Duration::from_secs(3600)) => {
                    // A false result is just the idle timer elapsing; only a
                    // real signal stops the loop.
                    if signalled {
                        logger::info(LogTag::Engine, "Shutdown signalled, stopping message loop");
                        break;
                    }
                }
            }
        }
    }
}
