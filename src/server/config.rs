//! Application configuration types

use lanwake_core::wake::{BROADCAST_ADDR, DEFAULT_WOL_PORT};
use lanwake_core::{DirectoryPolicy, JsonFileStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub wake: WakeConfig,
    #[serde(default)]
    pub telegram: TelegramAppConfig,
}

/// Registry persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub validate_addresses: bool,
    #[serde(default = "default_save_attempts")]
    pub save_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from(JsonFileStore::DEFAULT_FILENAME)
}

fn default_save_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    50
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
            validate_addresses: false,
            save_attempts: default_save_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl RegistryConfig {
    /// Directory policy derived from these settings
    pub fn policy(&self) -> DirectoryPolicy {
        DirectoryPolicy::default()
            .with_validate_addresses(self.validate_addresses)
            .with_save_attempts(self.save_attempts)
            .with_retry_backoff(Duration::from_millis(self.retry_backoff_ms))
    }
}

/// Wake-on-LAN network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakeConfig {
    #[serde(default = "default_broadcast_address")]
    pub broadcast_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_broadcast_address() -> String {
    BROADCAST_ADDR.to_string()
}

fn default_port() -> u16 {
    DEFAULT_WOL_PORT
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            broadcast_address: default_broadcast_address(),
            port: default_port(),
        }
    }
}

/// Telegram settings that are safe to keep in a config file
///
/// The bot token is read from the environment or the `API_KEY` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramAppConfig {
    #[serde(default)]
    pub allowed_users: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.registry.path, PathBuf::from("mac_registry.json"));
        assert!(!config.registry.validate_addresses);
        assert_eq!(config.wake.broadcast_address, "255.255.255.255");
        assert_eq!(config.wake.port, 9);
        assert!(config.telegram.allowed_users.is_empty());
    }

    #[test]
    fn test_registry_policy() {
        let registry = RegistryConfig {
            validate_addresses: true,
            save_attempts: 5,
            retry_backoff_ms: 10,
            ..RegistryConfig::default()
        };
        let policy = registry.policy();
        assert!(policy.validate_addresses);
        assert_eq!(policy.save_attempts, 5);
        assert_eq!(policy.retry_backoff, Duration::from_millis(10));
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str("[wake]\nport = 7\n").unwrap();
        assert_eq!(config.wake.port, 7);
        assert_eq!(config.wake.broadcast_address, "255.255.255.255");
        assert_eq!(config.registry.save_attempts, 3);
    }
}
