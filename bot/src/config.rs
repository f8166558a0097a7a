use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Token value shipped in the sample config.
const PLACEHOLDER_TOKEN: &str = "your-telegram-bot-token";

const DEFAULT_PING_TIMEOUT_MS: u64 = 5000;

/// Top-level bot configuration, loaded from bot.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct BotConfig {
    pub telegram: TelegramSection,
    pub database: DatabaseSection,
    pub minecraft: MinecraftSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    pub token: String,
    pub api_url: String,
    /// Long-poll duration for getUpdates.
    pub poll_timeout_secs: u64,
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: "https://api.telegram.org".into(),
            poll_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite:data/mss-bot.db?mode=rwc".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MinecraftSection {
    /// Upper bound for one status probe.
    pub timeout_ms: u64,
}

impl Default for MinecraftSection {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_PING_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Filter used when RUST_LOG is unset.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

/// Where the file-level values came from. Loading runs before logging is
/// set up, so the caller reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    /// The file was missing.
    Defaults,
}

impl BotConfig {
    /// Load config from a TOML file, falling back to defaults if it doesn't exist.
    /// Environment variables override file values.
    pub fn load(path: &Path) -> Result<(Self, ConfigSource)> {
        let (mut config, source) = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok((config, source))
    }

    fn from_file(path: &Path) -> Result<(Self, ConfigSource)> {
        if !path.exists() {
            return Ok((Self::default(), ConfigSource::Defaults));
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok((config, ConfigSource::File))
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("TELEGRAM_BOT_TOKEN") {
            self.telegram.token = v;
        }
        if let Some(v) = var("TELEGRAM_API_URL") {
            self.telegram.api_url = v;
        }
        if let Some(v) = var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = var("MINECRAFT_TIMEOUT_MS")
            && let Ok(ms) = v.parse()
        {
            self.minecraft.timeout_ms = ms;
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    fn validate(&mut self) -> Result<()> {
        let token = self.telegram.token.trim();
        if token.is_empty() || token == PLACEHOLDER_TOKEN {
            bail!("telegram bot token is not set (use [telegram].token or TELEGRAM_BOT_TOKEN)");
        }
        self.telegram.token = token.to_string();

        if self.minecraft.timeout_ms == 0 {
            self.minecraft.timeout_ms = DEFAULT_PING_TIMEOUT_MS;
        }
        Ok(())
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.minecraft.timeout_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.telegram.poll_timeout_secs)
    }

    /// Create the directory holding the SQLite file, if the URL names one.
    pub fn ensure_database_dir(&self) -> Result<()> {
        if let Some(dir) = sqlite_parent_dir(&self.database.url) {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create database directory {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Parent directory of the file behind a `sqlite:` URL. `None` for
/// in-memory databases and bare file names.
fn sqlite_parent_dir(url: &str) -> Option<PathBuf> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" || url.contains("mode=memory") {
        return None;
    }

    Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

impl fmt::Display for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "telegram api {} (token {}), poll {}s, database {}, ping timeout {}ms, log level {}",
            self.telegram.api_url,
            if self.telegram.token.is_empty() { "unset" } else { "<redacted>" },
            self.telegram.poll_timeout_secs,
            self.database.url,
            self.minecraft.timeout_ms,
            self.logging.level,
        )
    }
}
