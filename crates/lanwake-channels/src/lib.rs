//! lanwake Channels - chat command surface
//!
//! - [`commands`]: transport-independent parsing and execution of the
//!   device commands
//! - [`telegram`]: the Telegram bot (via teloxide)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
pub mod error;
pub mod message;
pub mod telegram;
pub mod util;

pub use commands::{Command, CommandExecutor, WakeRequest};
pub use error::{Error, Result};
pub use message::{MessageButton, NormalizedMessage, Reply};
pub use telegram::{TelegramAdapter, TelegramConfig};
