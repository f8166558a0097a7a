/// Identifier of one chat with the bot.
pub type ConversationId = i64;

/// Identifier of a message within a chat.
pub type MessageId = i64;

/// Inline button payloads. The string form is what travels in `callback_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackAction {
    Status,
    Settings,
    Players,
    Back,
    Refresh,
}

impl CallbackAction {
    pub const ALL: [CallbackAction; 5] = [
        CallbackAction::Status,
        CallbackAction::Settings,
        CallbackAction::Players,
        CallbackAction::Back,
        CallbackAction::Refresh,
    ];

    pub fn as_data(self) -> &'static str {
        match self {
            CallbackAction::Status => "status",
            CallbackAction::Settings => "settings",
            CallbackAction::Players => "players",
            CallbackAction::Back => "back",
            CallbackAction::Refresh => "refresh",
        }
    }

    pub fn from_data(data: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_data() == data)
    }
}

/// Slash commands the bot understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/mss`: open the main menu.
    OpenMenu,
    /// `/set <host[:port]> [name]`: register a server (Settings screen only).
    SetConfig { args: String },
    /// `/start`
    Start,
    /// `/help`
    Help,
}

impl Command {
    /// Parse a message like `/set@my_bot mc.example.com My Server`.
    ///
    /// Returns `None` for non-commands, unknown commands, and commands
    /// addressed to a bot other than `bot_username`. Without a username any
    /// mention is accepted.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim_start();
        let rest = text.strip_prefix('/')?;

        let (head, args) = match rest.find(char::is_whitespace) {
            Some(idx) => (&rest[..idx], rest[idx..].trim()),
            None => (rest, ""),
        };
        let (name, mention) = match head.split_once('@') {
            Some((name, mention)) => (name, Some(mention)),
            None => (head, None),
        };
        if let (Some(mention), Some(me)) = (mention, bot_username)
            && !mention.eq_ignore_ascii_case(me)
        {
            return None;
        }

        match name.to_ascii_lowercase().as_str() {
            "mss" => Some(Command::OpenMenu),
            "set" => Some(Command::SetConfig {
                args: args.to_string(),
            }),
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            _ => None,
        }
    }
}

/// A transport-neutral inbound update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command {
        conversation_id: ConversationId,
        command: Command,
    },
    Callback {
        conversation_id: ConversationId,
        /// Id used to acknowledge the button press.
        callback_id: String,
        /// The message carrying the pressed button.
        message_id: MessageId,
        /// `None` when the payload is not one we issued.
        action: Option<CallbackAction>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_data_round_trip() {
        for action in CallbackAction::ALL {
            assert_eq!(CallbackAction::from_data(action.as_data()), Some(action));
        }
        assert_eq!(CallbackAction::from_data("nope"), None);
    }

    #[test]
    fn test_callback_data_values() {
        let data: Vec<&str> = CallbackAction::ALL.iter().map(|a| a.as_data()).collect();
        assert_eq!(data, vec!["status", "settings", "players", "back", "refresh"]);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/mss", None), Some(Command::OpenMenu));
        assert_eq!(Command::parse("/MSS", None), Some(Command::OpenMenu));
        assert_eq!(Command::parse("/start", None), Some(Command::Start));
        assert_eq!(Command::parse("/help extra words", None), Some(Command::Help));
    }

    #[test]
    fn test_parse_set_with_args() {
        assert_eq!(
            Command::parse("/set mc.example.com:25565 My Server", None),
            Some(Command::SetConfig {
                args: "mc.example.com:25565 My Server".into()
            })
        );
        assert_eq!(
            Command::parse("/set", None),
            Some(Command::SetConfig { args: String::new() })
        );
    }

    #[test]
    fn test_parse_strips_bot_mention() {
        assert_eq!(Command::parse("/mss@mss_status_bot", None), Some(Command::OpenMenu));
        assert_eq!(
            Command::parse("/mss@MSS_Status_Bot", Some("mss_status_bot")),
            Some(Command::OpenMenu)
        );
        assert_eq!(
            Command::parse("/set@mss_status_bot   host:1  ", Some("mss_status_bot")),
            Some(Command::SetConfig {
                args: "host:1".into()
            })
        );
    }

    #[test]
    fn test_parse_ignores_commands_for_other_bots() {
        assert_eq!(Command::parse("/mss@other_bot", Some("mss_status_bot")), None);
        assert_eq!(
            Command::parse("/set@other_bot mc.example.com", Some("mss_status_bot")),
            None
        );
        // Unaddressed commands still reach us.
        assert_eq!(
            Command::parse("/mss", Some("mss_status_bot")),
            Some(Command::OpenMenu)
        );
    }

    #[test]
    fn test_parse_ignores_non_commands() {
        assert_eq!(Command::parse("hello", None), None);
        assert_eq!(Command::parse("/unknown", None), None);
        assert_eq!(Command::parse("", None), None);
    }
}
