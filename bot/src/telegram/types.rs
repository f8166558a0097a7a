//! The subset of Bot API objects the bot reads and writes.

use serde::{Deserialize, Serialize};

use crate::engine::events::{CallbackAction, Command, InboundEvent};
use crate::engine::render::Keyboard;

/// Envelope around every Bot API result.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    /// Absent when the message is too old for the API to include.
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// Convert to an inbound event. Plain chat messages, commands for other
    /// bots, and anything else the bot does not handle yield `None`.
    pub fn into_event(self, bot_username: Option<&str>) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            let message = query.message?;
            return Some(InboundEvent::Callback {
                conversation_id: message.chat.id,
                callback_id: query.id,
                message_id: message.message_id,
                action: query.data.as_deref().and_then(CallbackAction::from_data),
            });
        }

        let message = self.message?;
        let command = Command::parse(message.text.as_deref()?, bot_username)?;
        Some(InboundEvent::Command {
            conversation_id: message.chat.id,
            command,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl From<&Keyboard> for InlineKeyboardMarkup {
    fn from(keyboard: &Keyboard) -> Self {
        Self {
            inline_keyboard: keyboard
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| InlineKeyboardButton {
                            text: button.label.clone(),
                            callback_data: button.action.as_data().to_string(),
                        })
                        .collect()
                })
                .collect(),
        }
    }
}
