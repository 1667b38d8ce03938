//! Telegram configuration types

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Fallback file holding the bot token, relative to the working directory
pub const TOKEN_FILE: &str = "API_KEY";

/// Telegram bot configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token
    pub bot_token: String,
    /// Allowed user IDs (empty = allow all)
    pub allowed_users: Vec<i64>,
}

impl TelegramConfig {
    /// Create from environment variables
    ///
    /// The token is taken from `TELEGRAM_BOT_TOKEN`, then
    /// `TELEGRAM_API_KEY`, then the `API_KEY` file. Blank values are
    /// skipped.
    pub fn from_env() -> Result<Self> {
        let bot_token = resolve_token(
            std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            std::env::var("TELEGRAM_API_KEY").ok(),
            Path::new(TOKEN_FILE),
        )?;

        let allowed_users = std::env::var("TELEGRAM_ALLOWED_USERS")
            .ok()
            .map(|s| parse_user_ids(&s))
            .unwrap_or_default();

        Ok(Self {
            bot_token,
            allowed_users,
        })
    }

    /// Create with a bot token
    #[must_use]
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            allowed_users: Vec::new(),
        }
    }

    /// Set allowed users
    #[must_use]
    pub fn with_allowed_users(mut self, users: Vec<i64>) -> Self {
        self.allowed_users = users;
        self
    }
}

/// Pick the first non-blank token from the bot token variable, the API key
/// variable and finally `token_file`
pub fn resolve_token(
    bot_token: Option<String>,
    api_key: Option<String>,
    token_file: &Path,
) -> Result<String> {
    let from_env = [bot_token, api_key]
        .into_iter()
        .flatten()
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty());

    let token = match from_env {
        Some(token) => token,
        None => read_token_file(token_file)?,
    };
    if token.is_empty() {
        return Err(Error::Config("Telegram bot token is empty".to_string()));
    }
    Ok(token)
}

/// Read the bot token from a file
pub fn read_token_file(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "{} file not readable ({}) and TELEGRAM_BOT_TOKEN / TELEGRAM_API_KEY not set",
            path.display(),
            e
        ))
    })?;
    Ok(content.trim().to_string())
}

/// Parse a comma-separated list of user ids, skipping invalid entries
#[must_use]
pub fn parse_user_ids(s: &str) -> Vec<i64> {
    s.split(',')
        .filter_map(|id| id.trim().parse().ok())
        .collect()
}
