//! Error types for lanwake-channels

use thiserror::Error;

/// Channel error type
#[derive(Debug, Error)]
pub enum Error {
    /// Telegram error
    #[error("telegram error: {0}")]
    Telegram(String),

    /// Missing or invalid channel configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Command given with missing arguments; carries the usage line
    #[error("{0}")]
    Usage(&'static str),

    /// Registry or dispatch failure
    #[error(transparent)]
    Core(#[from] lanwake_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
