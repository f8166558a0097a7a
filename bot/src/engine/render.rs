//! Text and keyboards for every screen.
//!
//! Screen texts use Telegram MarkdownV2. Anything that comes from a user or a
//! remote server goes through [`escape_markdown`] (or [`escape_code`] inside
//! inline code spans) before interpolation.

use crate::minecraft::status::ProbeResult;

use super::events::CallbackAction;
use super::status::StatusResult;
use super::store::ServerRecord;

/// Characters with meaning in MarkdownV2 outside code spans, starting with
/// the backslash escape itself.
const MARKDOWN_SPECIAL: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.',
    '!',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    MarkdownV2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: CallbackAction,
}

impl Button {
    fn new(label: &str, action: CallbackAction) -> Self {
        Self {
            label: label.to_string(),
            action,
        }
    }
}

/// Inline keyboard, row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

/// One outgoing message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub parse_mode: ParseMode,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: ParseMode::Plain,
            keyboard: None,
        }
    }

    fn markdown(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            parse_mode: ParseMode::MarkdownV2,
            keyboard: Some(keyboard),
        }
    }
}

/// Prefix every MarkdownV2 special character with `\`.
///
/// Not idempotent: escaping already escaped text escapes it again.
pub fn escape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        if MARKDOWN_SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape text placed inside an inline code span.
pub fn escape_code(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '`' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ── Keyboards ───────────────────────────────────────────────────────

pub fn main_menu_keyboard() -> Keyboard {
    Keyboard {
        rows: vec![
            vec![
                Button::new("📊 Status", CallbackAction::Status),
                Button::new("⚙️ Settings", CallbackAction::Settings),
            ],
            vec![Button::new("👥 Players", CallbackAction::Players)],
        ],
    }
}

pub fn status_keyboard() -> Keyboard {
    Keyboard {
        rows: vec![
            vec![
                Button::new("🔄 Refresh", CallbackAction::Refresh),
                Button::new("👥 Players", CallbackAction::Players),
            ],
            vec![Button::new("◀️ Back", CallbackAction::Back)],
        ],
    }
}

pub fn players_keyboard() -> Keyboard {
    Keyboard {
        rows: vec![
            vec![Button::new("📊 Status", CallbackAction::Status)],
            vec![Button::new("◀️ Back", CallbackAction::Back)],
        ],
    }
}

pub fn settings_keyboard() -> Keyboard {
    Keyboard {
        rows: vec![vec![Button::new("◀️ Back", CallbackAction::Back)]],
    }
}

// ── Screens ─────────────────────────────────────────────────────────

const NOT_CONFIGURED: &str =
    "⚠️ Server is not configured\\.\n\nOpen ⚙️ Settings to add a server\\.";

pub fn render_main_menu() -> Reply {
    Reply::markdown(
        "🎮 *Minecraft Server Status*\n\nChoose an action:",
        main_menu_keyboard(),
    )
}

pub fn render_status(result: &StatusResult) -> Reply {
    Reply::markdown(status_text(result), status_keyboard())
}

pub fn render_players(result: &StatusResult) -> Reply {
    Reply::markdown(players_text(result), players_keyboard())
}

pub fn render_config(record: Option<&ServerRecord>) -> Reply {
    Reply::markdown(config_text(record), settings_keyboard())
}

/// Generic failure shown in place of a screen, keeping its keyboard.
pub fn render_failure(keyboard: Keyboard) -> Reply {
    Reply::markdown(
        "❌ Something went wrong\\. Please try again later\\.",
        keyboard,
    )
}

fn status_text(result: &StatusResult) -> String {
    let Some(record) = result.record() else {
        return NOT_CONFIGURED.to_string();
    };
    let Some(probe) = result.online_probe() else {
        return offline_text(record);
    };

    let mut text = format!(
        "🟢 *{}*\n\nAddress: `{}`\nVersion: {}\nOnline: {}/{}",
        escape_markdown(&record.label()),
        escape_code(&record.formatted_address()),
        escape_markdown(&probe.version),
        probe.players_online,
        probe.players_max,
    );
    if !probe.description.is_empty() {
        text.push_str(&format!("\n\n_{}_", escape_markdown(&probe.description)));
    }
    if !probe.sample.is_empty() {
        text.push_str("\n\n👥 *Players online:*\n");
        text.push_str(&player_lines(probe));
    }
    text
}

fn players_text(result: &StatusResult) -> String {
    let Some(record) = result.record() else {
        return NOT_CONFIGURED.to_string();
    };
    let Some(probe) = result.online_probe() else {
        return offline_text(record);
    };

    let mut text = format!(
        "👥 *Players on {}*\n\nOnline: {}/{}",
        escape_markdown(&record.label()),
        probe.players_online,
        probe.players_max,
    );

    if probe.players_online == 0 {
        text.push_str("\n\nNobody is playing right now\\.");
    } else if probe.sample.is_empty() {
        text.push_str("\n\nThe server does not share player names\\.");
    } else {
        text.push_str("\n\n");
        text.push_str(&player_lines(probe));
        let hidden = probe.players_online - probe.sample.len() as i64;
        if hidden > 0 {
            text.push_str(&format!("\n…and {hidden} more"));
        }
    }
    text
}

fn offline_text(record: &ServerRecord) -> String {
    format!(
        "🔴 *{}*\n\nAddress: `{}`\nStatus: Offline",
        escape_markdown(&record.label()),
        escape_code(&record.formatted_address()),
    )
}

fn player_lines(probe: &ProbeResult) -> String {
    probe
        .sample
        .iter()
        .map(|p| format!("• {}", escape_markdown(&p.name)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn config_text(record: Option<&ServerRecord>) -> String {
    let Some(record) = record else {
        return "⚙️ *Server settings*\n\n\
                No server configured\\.\n\n\
                To set one up, send:\n\
                `/set <host>:<port> <name>`\n\n\
                Example:\n\
                `/set mc.example.com:25565 My Server`"
            .to_string();
    };

    let name = if record.address.display_name.is_empty() {
        "Not set".to_string()
    } else {
        escape_markdown(&record.address.display_name)
    };

    format!(
        "⚙️ *Server settings*\n\n\
         Host: `{}`\n\
         Port: `{}`\n\
         Name: {}\n\n\
         To change it, send:\n\
         `/set <host>:<port> <name>`",
        escape_code(record.host()),
        record.port(),
        name,
    )
}

// ── One-off messages ────────────────────────────────────────────────

pub fn start_message() -> Reply {
    Reply::plain(
        "👋 Hi! I check the status of Minecraft servers.\n\nUse /mss to open the menu.",
    )
}

pub fn help_message() -> Reply {
    Reply {
        text: "📖 *Help*\n\n\
               *Commands:*\n\
               /mss \\- Open the main menu\n\
               /set \\<host\\[:port\\]\\> \\<name\\> \\- Configure the server \\(from Settings\\)\n\n\
               *Example:*\n\
               `/set mc.example.com:25565 My Server`"
            .to_string(),
        parse_mode: ParseMode::MarkdownV2,
        keyboard: None,
    }
}

pub fn wrong_screen_message() -> Reply {
    Reply::plain(
        "⚠️ This command is only available from the settings menu.\n\
         Use /mss and press ⚙️ Settings.",
    )
}

pub fn usage_message() -> Reply {
    Reply::plain(
        "❌ Wrong format.\n\n\
         Usage: /set <host[:port]> [name]\n\
         Example: /set mc.example.com:25565 My Server",
    )
}

pub fn invalid_address_message(error: &impl std::fmt::Display) -> Reply {
    Reply::plain(format!("❌ Invalid address: {error}"))
}

pub fn save_failed_message() -> Reply {
    Reply::plain("❌ Could not save the server. Please try again later.")
}

pub fn saved_message() -> Reply {
    Reply::plain("✅ Server saved!")
}

/// Callback toast for buttons that no longer apply.
pub const STALE_MENU_HINT: &str = "This menu has expired. Send /mss to open a new one.";
