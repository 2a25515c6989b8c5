//! Telegram transport
//!
//! Outbound side implements the Transport seam with plain bot API calls.
//! Inbound side is a long-poll loop over getUpdates, filtered down to the
//! configured sources plus the aggregation chat, feeding InboundMessage
//! values into the engine's channel.

use crate::configs::RelayConfig;
use crate::dispatcher::Transport;
use crate::errors::{RelayError, RelayResult};
use crate::logger::{self, LogTag};
use crate::pipeline::InboundMessage;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{MessageId, UpdateKind};
use tokio::sync::mpsc;
use tokio::sync::Notify;

pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(token: &str) -> Result<Self, RelayError> {
        if token.is_empty() {
            return Err(RelayError::Config("bot_token is not configured".to_string()));
        }
        Ok(Self {
            bot: Bot::new(token),
        })
    }

    /// Validate the token against getMe before the listener starts.
    pub async fn validate(&self) -> RelayResult<()> {
        match self.bot.get_me().await {
            Ok(me) => {
                logger::info(
                    LogTag::Telegram,
                    &format!(
                        "Bot validated - @{} (ID: {})",
                        me.username.as_deref().unwrap_or("unknown"),
                        me.id
                    ),
                );
                Ok(())
            }
            Err(e) => Err(RelayError::Transport(format!("invalid bot token: {}", e))),
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(&self, target: i64, text: &str) -> RelayResult<()> {
        self.bot
            .send_message(ChatId(target), text)
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn forward(&self, target: i64, message: &InboundMessage) -> RelayResult<()> {
        self.bot
            .forward_message(
                ChatId(target),
                ChatId(message.source),
                MessageId(message.message_id),
            )
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Long-poll getUpdates until shutdown, forwarding messages from watched
/// chats into `tx`. Watched means a tracked source or the aggregation chat.
pub async fn listen(
    transport: Arc<TelegramTransport>,
    config: Arc<RelayConfig>,
    tx: mpsc::Sender<InboundMessage>,
    shutdown: Arc<Notify>,
) {
    let mut watched: HashSet<i64> = config.tracked_ids();
    watched.insert(config.fwd_group.id);

    let offset = AtomicI64::new(0);
    logger::info(
        LogTag::Telegram,
        &format!("Update polling started over {} chat(s)", watched.len()),
    );

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                logger::info(LogTag::Telegram, "Update polling received shutdown signal");
                break;
            }
            _ = poll_once(&transport.bot, &offset, &watched, &tx) => {}
        }

        if tx.is_closed() {
            logger::info(LogTag::Telegram, "Inbound channel closed, stopping polling");
            break;
        }
    }
}

/// One getUpdates round trip. Uses the offset to avoid reprocessing.
async fn poll_once(
    bot: &Bot,
    offset: &AtomicI64,
    watched: &HashSet<i64>,
    tx: &mpsc::Sender<InboundMessage>,
) {
    let current_offset = offset.load(Ordering::SeqCst);
    let mut request = bot.get_updates().timeout(10);
    if current_offset > 0 {
        request = request.offset(current_offset as i32);
    }

    match request.await {
        Ok(updates) => {
            for update in updates {
                offset.store(update.id.0 as i64 + 1, Ordering::SeqCst);

                let UpdateKind::Message(message) = update.kind else {
                    continue;
                };

                let chat_id = message.chat.id.0;
                if !watched.contains(&chat_id) {
                    continue;
                }

                let Some(text) = message.text() else {
                    continue;
                };

                // Channel posts carry no sender; fall back to the chat id so
                // confirmation matching still works for bot accounts.
                let sender = message
                    .from
                    .as_ref()
                    .map(|from| from.id.0 as i64)
                    .unwrap_or(chat_id);

                let reply_to_sender = message
                    .reply_to_message()
                    .and_then(|reply| reply.from.as_ref())
                    .map(|from| from.id.0 as i64);

                let inbound = InboundMessage {
                    sender,
                    source: chat_id,
                    message_id: message.id.0,
                    text: text.to_string(),
                    forwarded: message.forward_date().is_some(),
                    reply_to_sender,
                };

                if tx.send(inbound).await.is_err() {
                    return;
                }
            }
        }
        Err(e) => {
            logger::debug(
                LogTag::Telegram,
                &format!("Poll error (will retry): {}", e),
            );
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}
