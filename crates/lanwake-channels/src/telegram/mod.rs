//! Telegram - teloxide adapter
//!
//! Routes `/start`, `/addmac`, `/listmacs`, `/wol` and `/delmac` to the
//! command executor and turns wake-button presses into wake requests.

mod adapter;
mod config;
mod handler;


pub use adapter::TelegramAdapter;
pub use config::{parse_user_ids, read_token_file, resolve_token, TelegramConfig, TOKEN_FILE};
