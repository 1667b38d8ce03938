//! Registry administration commands
//!
//! `lanwake devices list|add|remove --user <id>` and `lanwake wake`

use super::DevicesCommands;
use crate::server::config::AppConfig;
use crate::server::{build_dispatcher, open_directory};
use anyhow::{bail, Context, Result};
use lanwake_core::WakeOutcome;

/// Run a devices subcommand
pub async fn run(config: &AppConfig, cmd: DevicesCommands) -> Result<()> {
    let directory = open_directory(config)?;

    match cmd {
        DevicesCommands::List { user } => {
            let devices = directory.list(&user).await;
            if devices.is_empty() {
                println!("No registered devices for user {user}.");
            } else {
                for (name, mac) in devices {
                    println!("{name}: {mac}");
                }
            }
        }
        DevicesCommands::Add {
            user,
            name,
            mac_address,
        } => {
            let stored = directory
                .register(&user, &name, &mac_address)
                .await
                .context("Failed to register device")?;
            println!("MAC address '{stored}' registered as '{name}'.");
        }
        DevicesCommands::Remove { user, name } => {
            let removed = directory
                .remove(&user, &name)
                .await
                .context("Failed to remove device")?;
            if !removed {
                bail!("Device '{name}' not found for user {user}");
            }
            println!("Device '{name}' removed.");
        }
    }
    Ok(())
}

/// Send a wake packet to one of `user`'s devices
pub async fn wake(config: &AppConfig, user: &str, name: &str) -> Result<()> {
    let dispatcher = build_dispatcher(config)?;

    match dispatcher.wake(user, name).await? {
        WakeOutcome::Sent { name, address } => {
            println!("Sending Wake-on-LAN packet to '{name}' ({address}).");
            Ok(())
        }
        WakeOutcome::NotFound { name } => {
            bail!("Device '{name}' not found for user {user}")
        }
    }
}
