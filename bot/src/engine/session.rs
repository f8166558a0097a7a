use dashmap::DashMap;

use super::events::{ConversationId, MessageId};

/// The screen a conversation's anchor message currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Screen {
    /// Conversation never opened the menu (or the bot restarted).
    #[default]
    None,
    MainMenu,
    Status,
    Players,
    Settings,
}

impl Screen {
    pub const ALL: [Screen; 5] = [
        Screen::None,
        Screen::MainMenu,
        Screen::Status,
        Screen::Players,
        Screen::Settings,
    ];
}

/// UI state of one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub screen: Screen,
    /// Message that screen transitions edit in place. Meaningless while `screen` is `None`.
    pub anchor_message_id: MessageId,
}

/// In-memory per-conversation UI state. Missing entries read as `Screen::None`.
///
/// Guards never outlive a method call, so no lock is held across an `.await`.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<ConversationId, SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, conversation_id: ConversationId) -> SessionState {
        self.sessions
            .get(&conversation_id)
            .map(|s| *s)
            .unwrap_or_default()
    }

    pub fn screen(&self, conversation_id: ConversationId) -> Screen {
        self.get(conversation_id).screen
    }

    /// Record the screen together with the message that now displays it.
    pub fn set(&self, conversation_id: ConversationId, screen: Screen, anchor_message_id: MessageId) {
        self.sessions.insert(
            conversation_id,
            SessionState {
                screen,
                anchor_message_id,
            },
        );
    }

    pub fn clear(&self, conversation_id: ConversationId) {
        self.sessions.remove(&conversation_id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
