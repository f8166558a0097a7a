use std::sync::OnceLock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::engine::events::{ConversationId, InboundEvent, MessageId};
use crate::engine::render::{ParseMode, Reply};
use crate::engine::transport::{EditOutcome, Transport, TransportError};

use super::types::{ApiResponse, BotUser, InlineKeyboardMarkup, Message, Update};

/// Added on top of the long-poll timeout for the HTTP request deadline.
const HTTP_GRACE: Duration = Duration::from_secs(10);

const NOT_MODIFIED: &str = "message is not modified";

/// Bot API client over HTTPS long polling.
pub struct TelegramClient {
    http: reqwest::Client,
    /// `{api_url}/bot{token}`. Never logged.
    base_url: String,
    poll_timeout: Duration,
    /// Next update id to request. Sending it confirms everything before it.
    offset: AtomicI64,
    /// Set by `get_me`; commands mentioning another bot are dropped.
    username: OnceLock<String>,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(poll_timeout + HTTP_GRACE)
            .build()
            .map_err(|e| TransportError::Http(e.without_url()))?;

        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            poll_timeout,
            offset: AtomicI64::new(0),
            username: OnceLock::new(),
        })
    }

    /// The bot's own account; doubles as a token check at startup.
    pub async fn get_me(&self) -> Result<BotUser, TransportError> {
        let me: BotUser = self.call("getMe", &json!({})).await?;
        if let Some(username) = &me.username {
            let _ = self.username.set(username.clone());
        }
        Ok(me)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, TransportError> {
        // Error URLs would carry the token.
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.without_url()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Http(e.without_url()))?;

        let parsed: ApiResponse<T> = serde_json::from_slice(&bytes)?;
        match parsed {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                description,
                error_code,
                ..
            } => Err(TransportError::Api {
                code: error_code.unwrap_or_default(),
                description: description.unwrap_or_else(|| format!("{method} failed")),
            }),
        }
    }
}

/// Request body shared by `sendMessage` and `editMessageText`.
fn message_body(conversation_id: ConversationId, reply: &Reply) -> Value {
    let mut body = json!({
        "chat_id": conversation_id,
        "text": reply.text,
    });
    if reply.parse_mode == ParseMode::MarkdownV2 {
        body["parse_mode"] = json!("MarkdownV2");
    }
    if let Some(keyboard) = &reply.keyboard {
        body["reply_markup"] = json!(InlineKeyboardMarkup::from(keyboard));
    }
    body
}

fn is_not_modified(error: &TransportError) -> bool {
    matches!(error, TransportError::Api { description, .. } if description.contains(NOT_MODIFIED))
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_message(
        &self,
        conversation_id: ConversationId,
        reply: &Reply,
    ) -> Result<MessageId, TransportError> {
        let message: Message = self
            .call("sendMessage", &message_body(conversation_id, reply))
            .await?;
        Ok(message.message_id)
    }

    async fn edit_message(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
        reply: &Reply,
    ) -> Result<EditOutcome, TransportError> {
        let mut body = message_body(conversation_id, reply);
        body["message_id"] = json!(message_id);

        match self.call::<Value>("editMessageText", &body).await {
            Ok(_) => Ok(EditOutcome::Edited),
            Err(e) if is_not_modified(&e) => Ok(EditOutcome::Unmodified),
            Err(e) => Err(e),
        }
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        self.call::<bool>("answerCallbackQuery", &body).await?;
        Ok(())
    }

    async fn receive_events(&self) -> Result<Vec<InboundEvent>, TransportError> {
        let body = json!({
            "offset": self.offset.load(Ordering::SeqCst),
            "timeout": self.poll_timeout.as_secs(),
            "allowed_updates": ["message", "callback_query"],
        });
        let updates: Vec<Update> = self.call("getUpdates", &body).await?;

        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.offset.store(last + 1, Ordering::SeqCst);
        }
        debug!(count = updates.len(), "received updates");

        let me = self.username.get().map(String::as_str);
        Ok(updates
            .into_iter()
            .filter_map(|update| update.into_event(me))
            .collect())
    }
}
