//! Server module for lanwake
//!
//! - `config`: configuration structures
//! - `loader`: configuration loading from files and environment
//!
//! Wires the registry, the wake sender and the Telegram adapter together.

pub mod config;
mod loader;

pub use loader::load_config;

use anyhow::{Context, Result};
use self::config::AppConfig;
use lanwake_channels::{CommandExecutor, TelegramAdapter, TelegramConfig};
use lanwake_core::{DeviceDirectory, JsonFileStore, UdpWakeSender, WakeDispatcher};
use std::sync::Arc;
use tracing::info;

/// Open the device directory described by `config`
///
/// Takes the registry lock for the life of the returned directory, so a CLI
/// edit is refused while the bot is running on the same file.
pub fn open_directory(config: &AppConfig) -> Result<Arc<DeviceDirectory>> {
    let store = JsonFileStore::open_locked(&config.registry.path).with_context(|| {
        format!(
            "Registry {} is in use; stop the running bot first",
            config.registry.path.display()
        )
    })?;
    let store = Arc::new(store);
    let directory = DeviceDirectory::open(store, config.registry.policy()).with_context(|| {
        format!(
            "Failed to load device registry from {}",
            config.registry.path.display()
        )
    })?;
    Ok(Arc::new(directory))
}

/// Build the wake dispatcher (directory + UDP sender)
pub fn build_dispatcher(config: &AppConfig) -> Result<WakeDispatcher> {
    let directory = open_directory(config)?;
    let sender = UdpWakeSender::new(&config.wake.broadcast_address, config.wake.port)
        .context("Invalid wake configuration")?;
    Ok(WakeDispatcher::new(directory, Arc::new(sender)))
}

/// Run the Telegram bot until shutdown
pub async fn run(config: AppConfig) -> Result<()> {
    let dispatcher = build_dispatcher(&config)?;
    info!(
        registry = %config.registry.path.display(),
        users = dispatcher.directory().user_count().await,
        broadcast = %config.wake.broadcast_address,
        port = config.wake.port,
        "Device registry ready"
    );

    let mut telegram_config =
        TelegramConfig::from_env().context("Telegram bot token not configured")?;
    if !config.telegram.allowed_users.is_empty() {
        telegram_config = telegram_config.with_allowed_users(config.telegram.allowed_users.clone());
    }
    if telegram_config.allowed_users.is_empty() {
        info!("No Telegram allowlist configured, accepting all users");
    }

    let adapter = Arc::new(TelegramAdapter::new(telegram_config));
    let executor = Arc::new(CommandExecutor::new(dispatcher));

    adapter
        .run(executor)
        .await
        .context("Telegram adapter error")?;

    info!("lanwake stopped");
    Ok(())
}
