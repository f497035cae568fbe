//! Shared configuration for Task Bridge.
//!
//! Provides functions to locate Task Bridge's state directory, load the
//! `.env.local` secrets file, and read the bot's runtime settings from the
//! environment.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.taskbridge/
//! └── config/       # User configuration files
//!     └── .env.local
//! ```
//!
//! # Environment Variables
//!
//! - `TASKBRIDGE_STATE_DIR`: Override the base state directory
//! - `TASKBRIDGE_CONFIG_DIR`: Override the config directory
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather (required)
//! - `SUPABASE_URL`: Base URL of the task store project (required)
//! - `SUPABASE_ANON_KEY`: API key for the task store (required)
//! - `TASKBRIDGE_USER_ID`: UUID that owns all tasks (required)
//! - `TASKBRIDGE_ALLOWED_CHATS`: Comma-separated chat IDs allowed to talk to the bot,
//!   or `*` for any chat. Unset or empty admits nobody.
//! - `TASKBRIDGE_STRICT_PRIORITY`: Reject priorities outside URGENT/HIGH/MEDIUM/LOW
//! - `TASKBRIDGE_HTTP_TIMEOUT_SECS`: Request timeout for the task store (default: 30)

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::{ConfigError, ConfigResult};

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "TASKBRIDGE_STATE_DIR";

/// Environment variable for custom config directory.
pub const CONFIG_DIR_ENV: &str = "TASKBRIDGE_CONFIG_DIR";

pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_ENV: &str = "SUPABASE_ANON_KEY";
pub const USER_ID_ENV: &str = "TASKBRIDGE_USER_ID";
pub const ALLOWED_CHATS_ENV: &str = "TASKBRIDGE_ALLOWED_CHATS";
pub const STRICT_PRIORITY_ENV: &str = "TASKBRIDGE_STRICT_PRIORITY";
pub const HTTP_TIMEOUT_ENV: &str = "TASKBRIDGE_HTTP_TIMEOUT_SECS";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".taskbridge";

const CONFIG_SUBDIR: &str = "config";

/// Default request timeout for the task store.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the Task Bridge state directory.
///
/// The state directory is determined by:
/// 1. `TASKBRIDGE_STATE_DIR` environment variable if set
/// 2. `~/.taskbridge` if home directory is available
/// 3. `.taskbridge` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the user config directory.
///
/// Defaults to `~/.taskbridge/config/` or `TASKBRIDGE_CONFIG_DIR` env var.
pub fn config_dir() -> PathBuf {
    std::env::var(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir().join(CONFIG_SUBDIR))
}

/// Get the .env.local file path.
///
/// Environment file for secrets (bot token, store key).
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Ensure the config directory exists.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn ensure_config_dir() -> std::io::Result<()> {
    let dir = config_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

/// Load secrets into the process environment.
///
/// Reads the config directory's `.env.local` first, then `.env.local` or
/// `.env` in the working directory. Variables already set are not overridden.
pub fn load_env_files() {
    let env_path = env_file();
    if env_path.exists() {
        match dotenvy::from_path(&env_path) {
            Ok(()) => debug!(path = %env_path.display(), "Loaded env file"),
            Err(e) => debug!(path = %env_path.display(), error = %e, "Failed to load env file"),
        }
    }
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());
}

/// Runtime settings for the bot and its task store.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Telegram bot token.
    pub telegram_token: String,
    /// Base URL of the hosted task store (e.g. `https://xyz.supabase.co`).
    pub store_url: Url,
    /// API key sent with every store request.
    pub store_key: String,
    /// Owner of every task row written or read.
    pub user_id: Uuid,
    /// Chats allowed to use the bot. Empty means nobody unless
    /// [`Settings::allow_any_chat`] is set.
    pub allowed_chats: Vec<i64>,
    /// Set by `*` in the allow-list: any chat may use the bot.
    pub allow_any_chat: bool,
    /// Reject priorities outside the four known levels.
    pub strict_priority: bool,
    /// Request timeout for the task store.
    pub http_timeout: Duration,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Separated from [`Settings::from_env`] so tests don't have to mutate
    /// the shared process environment.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> ConfigResult<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::Missing(key, env_file().display().to_string()))
        };

        let telegram_token = required(TELEGRAM_TOKEN_ENV)?;

        let raw_url = required(SUPABASE_URL_ENV)?;
        let store_url = Url::parse(&raw_url).map_err(|e| ConfigError::Invalid {
            key: SUPABASE_URL_ENV,
            reason: e.to_string(),
        })?;

        let store_key = required(SUPABASE_KEY_ENV)?;

        let raw_user = required(USER_ID_ENV)?;
        let user_id = Uuid::parse_str(&raw_user).map_err(|e| ConfigError::Invalid {
            key: USER_ID_ENV,
            reason: e.to_string(),
        })?;

        let (allowed_chats, allow_any_chat) = match lookup(ALLOWED_CHATS_ENV) {
            Some(raw) => parse_chat_list(&raw)?,
            None => (Vec::new(), false),
        };

        let strict_priority = match lookup(STRICT_PRIORITY_ENV) {
            Some(raw) => parse_bool(STRICT_PRIORITY_ENV, &raw)?,
            None => false,
        };

        let http_timeout = match lookup(HTTP_TIMEOUT_ENV) {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    key: HTTP_TIMEOUT_ENV,
                    reason: e.to_string(),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            telegram_token,
            store_url,
            store_key,
            user_id,
            allowed_chats,
            allow_any_chat,
            strict_priority,
            http_timeout,
        })
    }

    /// Whether a chat may use the bot.
    pub fn is_chat_allowed(&self, chat_id: i64) -> bool {
        self.allow_any_chat || self.allowed_chats.contains(&chat_id)
    }

    /// Whether no chat at all can use the bot.
    pub fn denies_every_chat(&self) -> bool {
        !self.allow_any_chat && self.allowed_chats.is_empty()
    }
}

/// Parses `12, -100200` into chat IDs. A `*` entry opens the bot to any chat.
fn parse_chat_list(raw: &str) -> ConfigResult<(Vec<i64>, bool)> {
    let mut chats = Vec::new();
    let mut any = false;
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if entry == "*" {
            any = true;
            continue;
        }
        let id = entry.parse::<i64>().map_err(|e| ConfigError::Invalid {
            key: ALLOWED_CHATS_ENV,
            reason: format!("'{}': {}", entry, e),
        })?;
        chats.push(id);
    }
    Ok((chats, any))
}

fn parse_bool(key: &'static str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}
