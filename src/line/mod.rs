// Messaging-platform transport: webhook payloads, signatures, and outbound delivery.

pub mod client;
pub mod signature;

use futures::future::BoxFuture;
use serde::Deserialize;

use crate::error::TransportError;
use crate::responder::OutboundMessage;

pub use client::LineClient;

/// The messaging API accepts at most this many messages per reply or push.
pub const MAX_MESSAGES_PER_CALL: usize = 5;

// ── Webhook payload ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<Event>,
}

/// A webhook event. Only message events are acted on.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    Message {
        reply_token: String,
        message: EventMessage,
        #[serde(default)]
        source: Option<EventSource>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventMessage {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A text message event, ready to be answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEvent {
    pub reply_token: String,
    pub user_id: Option<String>,
    pub text: String,
}

impl WebhookPayload {
    /// Text message events in delivery order; everything else is skipped.
    pub fn text_events(self) -> Vec<TextEvent> {
        self.events
            .into_iter()
            .filter_map(|event| match event {
                Event::Message {
                    reply_token,
                    message: EventMessage::Text { text },
                    source,
                } => Some(TextEvent {
                    reply_token,
                    user_id: source.and_then(|s| s.user_id),
                    text,
                }),
                _ => None,
            })
            .collect()
    }
}

// ── Delivery ─────────────────────────────────────────────────────────

/// Destination for outbound messages.
pub trait MessageSink: Send + Sync {
    /// Answer a webhook event using its single-use reply token.
    fn reply<'a>(
        &'a self,
        reply_token: &'a str,
        messages: &'a [OutboundMessage],
    ) -> BoxFuture<'a, Result<(), TransportError>>;

    /// Send messages to a user outside of a reply.
    fn push<'a>(
        &'a self,
        to: &'a str,
        messages: &'a [OutboundMessage],
    ) -> BoxFuture<'a, Result<(), TransportError>>;
}

/// Deliver `messages` in order: the first batch as a reply, the rest pushed
/// to the user. Without a user id the overflow is dropped.
pub async fn deliver(
    sink: &dyn MessageSink,
    event: &TextEvent,
    messages: &[OutboundMessage],
) -> Result<(), TransportError> {
    let mut batches = messages.chunks(MAX_MESSAGES_PER_CALL);
    let Some(first) = batches.next() else {
        return Ok(());
    };
    sink.reply(&event.reply_token, first).await?;

    for batch in batches {
        match &event.user_id {
            Some(user_id) => sink.push(user_id, batch).await?,
            None => {
                tracing::warn!(
                    "Dropping {} messages past the reply limit: no user id to push to",
                    messages.len() - MAX_MESSAGES_PER_CALL
                );
                break;
            }
        }
    }
    Ok(())
}
