use async_trait::async_trait;
use thiserror::Error;

use super::events::{ConversationId, InboundEvent, MessageId};
use super::render::Reply;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error {code}: {description}")]
    Api { code: i64, description: String },
    #[error("malformed api response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result of an edit the transport accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Edited,
    /// The message already had this exact content.
    Unmodified,
}

/// The chat side of the bot.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(
        &self,
        conversation_id: ConversationId,
        reply: &Reply,
    ) -> Result<MessageId, TransportError>;

    async fn edit_message(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
        reply: &Reply,
    ) -> Result<EditOutcome, TransportError>;

    /// Acknowledge a button press, optionally with a short toast.
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError>;

    /// Wait for the next batch of updates. May return an empty batch.
    async fn receive_events(&self) -> Result<Vec<InboundEvent>, TransportError>;
}
