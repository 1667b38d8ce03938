//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment
pub fn load_config(extra: Option<&Path>) -> Result<AppConfig> {
    let mut builder = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/local").required(false));

    // 3. Explicit file from the command line (must exist)
    if let Some(path) = extra {
        builder = builder.add_source(File::from(path).required(true));
    }

    // 4. Environment variables (highest priority), e.g. LANWAKE_WAKE__PORT
    let config = builder
        .add_source(
            Environment::with_prefix("LANWAKE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_embedded_defaults_parse() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.wake.port, 9);
        assert_eq!(config.registry.save_attempts, 3);
    }

    #[test]
    fn test_extra_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[registry]\nvalidate_addresses = true").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert!(config.registry.validate_addresses);
        assert_eq!(config.wake.broadcast_address, "255.255.255.255");
    }

    #[test]
    fn test_missing_extra_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
