//! Error types for lanwake-core

use thiserror::Error;

/// Core error type
///
/// "Not found" is deliberately absent: an unknown user or device name is a
/// normal outcome and is reported through `Option`, empty lists or
/// [`crate::WakeOutcome::NotFound`].
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing arguments to a directory operation
    #[error("invalid input: {0}")]
    Validation(String),

    /// Durable storage could not be read, parsed or written
    #[error("persistence failed: {0}")]
    Persist(String),

    /// The registry file is held by another process
    #[error("registry locked: {0}")]
    Locked(String),

    /// The stored address cannot be turned into a wake signal
    #[error("invalid hardware address: {0}")]
    InvalidAddress(String),

    /// The wake signal could not be sent
    #[error("wake dispatch failed: {0}")]
    Dispatch(String),
}

impl Error {
    /// Whether this error came from the storage layer
    #[must_use]
    pub fn is_persist(&self) -> bool {
        matches!(self, Self::Persist(_) | Self::Locked(_))
    }

    /// Whether this error came from the wake path
    #[must_use]
    pub fn is_dispatch(&self) -> bool {
        matches!(self, Self::InvalidAddress(_) | Self::Dispatch(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
