//! Telegram adapter core

use super::config::TelegramConfig;
use crate::message::{MessageButton, NormalizedMessage};
use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, Message as TelegramMessage},
};
use tracing::debug;

/// Telegram bot adapter
pub struct TelegramAdapter {
    pub(crate) bot: Bot,
    pub(crate) config: TelegramConfig,
}

impl TelegramAdapter {
    /// Create a new Telegram adapter
    #[must_use]
    pub fn new(config: TelegramConfig) -> Self {
        let bot = Bot::new(&config.bot_token);
        Self { bot, config }
    }

    /// Create from environment
    pub fn from_env() -> crate::Result<Self> {
        let config = TelegramConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Get the underlying bot
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Check if a user is allowed
    pub fn is_user_allowed(&self, user_id: i64) -> bool {
        self.config.allowed_users.is_empty() || self.config.allowed_users.contains(&user_id)
    }

    /// Convert a Telegram message to a normalized message
    ///
    /// Returns `None` for messages without text, without a sender, or from
    /// users outside the allowlist.
    pub fn normalize_message(&self, msg: &TelegramMessage) -> Option<NormalizedMessage> {
        let text = msg.text()?;
        let user = msg.from.as_ref()?;
        let user_id = user.id.0;

        if !self.is_user_allowed(user_id as i64) {
            debug!(user_id = %user_id, "User not allowed");
            return None;
        }

        Some(NormalizedMessage::new(
            msg.chat.id.0.to_string(),
            user_id.to_string(),
            msg.id.0.to_string(),
            text,
        ))
    }

    /// Build inline keyboard from buttons, one button per row
    pub fn build_keyboard(buttons: &[MessageButton]) -> Option<InlineKeyboardMarkup> {
        if buttons.is_empty() {
            return None;
        }

        let rows: Vec<Vec<InlineKeyboardButton>> = buttons
            .iter()
            .map(|b| vec![InlineKeyboardButton::callback(&b.text, &b.callback_data)])
            .collect();

        Some(InlineKeyboardMarkup::new(rows))
    }
}
