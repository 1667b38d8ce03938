//! CLI module for lanwake
//!
//! - `run`: start the Telegram bot (default)
//! - `devices`: offline registry administration
//! - `wake`: send a wake packet from the command line

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod devices;

/// Wake-on-LAN chat bot
#[derive(Parser, Debug)]
#[command(name = "lanwake")]
#[command(about = "Wake registered devices through a Telegram bot")]
#[command(version)]
pub struct Cli {
    /// Additional configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the bot (default)
    Run,
    /// Manage a user's registered devices
    #[command(subcommand)]
    Devices(DevicesCommands),
    /// Send a wake packet to a registered device
    Wake {
        /// Owner of the device
        #[arg(long)]
        user: String,
        /// Device name
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DevicesCommands {
    /// List a user's devices
    List {
        #[arg(long)]
        user: String,
    },
    /// Register or update a device
    Add {
        #[arg(long)]
        user: String,
        name: String,
        mac_address: String,
    },
    /// Remove a device
    Remove {
        #[arg(long)]
        user: String,
        name: String,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = crate::server::load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Devices(cmd)) => devices::run(&config, cmd).await,
        Some(Commands::Wake { user, name }) => devices::wake(&config, &user, &name).await,
        Some(Commands::Run) | None => crate::server::run(config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_devices_add() {
        let cli = Cli::parse_from([
            "lanwake",
            "devices",
            "add",
            "--user",
            "42",
            "desktop",
            "AA:BB:CC:DD:EE:FF",
        ]);
        match cli.command {
            Some(Commands::Devices(DevicesCommands::Add {
                user,
                name,
                mac_address,
            })) => {
                assert_eq!(user, "42");
                assert_eq!(name, "desktop");
                assert_eq!(mac_address, "AA:BB:CC:DD:EE:FF");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_defaults_to_run() {
        let cli = Cli::parse_from(["lanwake", "--config", "extra.toml"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, Some(PathBuf::from("extra.toml")));
    }

    #[test]
    fn test_cli_verify() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }
}
