//! Device Directory - per-user operations over the registry
//!
//! Mutations run as transactions under a single write lock: the change is
//! staged on a copy, persisted, and only then committed to memory. A failed
//! save leaves both the in-memory registry and the stored file untouched.
//! Reads share the lock and always see a fully committed state.

use crate::error::{Error, Result};
use crate::mac::normalize_mac;
use crate::registry::Registry;
use crate::store::RegistryStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Behavior knobs for the directory
#[derive(Debug, Clone)]
pub struct DirectoryPolicy {
    /// Reject addresses that are not six hex byte groups and store the
    /// normalized `AA:BB:CC:DD:EE:FF` form
    pub validate_addresses: bool,
    /// Total save attempts before a persist error is surfaced
    pub save_attempts: u32,
    /// Back-off between save attempts, multiplied by the attempt number
    pub retry_backoff: Duration,
}

impl Default for DirectoryPolicy {
    fn default() -> Self {
        Self {
            validate_addresses: false,
            save_attempts: 3,
            retry_backoff: Duration::from_millis(50),
        }
    }
}

impl DirectoryPolicy {
    /// Enable or disable strict address validation
    #[must_use]
    pub fn with_validate_addresses(mut self, enabled: bool) -> Self {
        self.validate_addresses = enabled;
        self
    }

    /// Set the number of save attempts (at least one is always made)
    #[must_use]
    pub fn with_save_attempts(mut self, attempts: u32) -> Self {
        self.save_attempts = attempts;
        self
    }

    /// Set the retry back-off
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

/// Per-user device directory backed by a [`RegistryStore`]
pub struct DeviceDirectory {
    store: Arc<dyn RegistryStore>,
    registry: RwLock<Registry>,
    policy: DirectoryPolicy,
}

impl DeviceDirectory {
    /// Load the registry from `store` and wrap it
    pub fn open(store: Arc<dyn RegistryStore>, policy: DirectoryPolicy) -> Result<Self> {
        let registry = store.load()?;
        Ok(Self {
            store,
            registry: RwLock::new(registry),
            policy,
        })
    }

    /// Directory policy in effect
    #[must_use]
    pub fn policy(&self) -> &DirectoryPolicy {
        &self.policy
    }

    /// Register a device for `user`, overwriting any entry with the same name
    ///
    /// Returns the address as stored, which is the normalized form when
    /// address validation is on.
    pub async fn register(&self, user: &str, name: &str, address: &str) -> Result<String> {
        let name = name.trim();
        let address = address.trim();

        if name.is_empty() {
            return Err(Error::Validation("Device name cannot be empty".to_string()));
        }
        if address.is_empty() {
            return Err(Error::Validation(
                "Hardware address cannot be empty".to_string(),
            ));
        }

        let address = if self.policy.validate_addresses {
            normalize_mac(address)?
        } else {
            address.to_string()
        };

        let mut registry = self.registry.write().await;
        let mut staged = registry.clone();
        let previous = staged.insert(user, name, address.as_str());
        self.persist(&staged).await?;
        *registry = staged;

        info!(
            user_id = %user,
            name = %name,
            mac = %address,
            replaced = previous.is_some(),
            "Device registered"
        );
        Ok(address)
    }

    /// Remove a device, returning whether it existed
    pub async fn remove(&self, user: &str, name: &str) -> Result<bool> {
        let mut registry = self.registry.write().await;
        if registry.get(user, name).is_none() {
            return Ok(false);
        }

        let mut staged = registry.clone();
        staged.remove(user, name);
        self.persist(&staged).await?;
        *registry = staged;

        info!(user_id = %user, name = %name, "Device removed");
        Ok(true)
    }

    /// List a user's devices in registration order
    pub async fn list(&self, user: &str) -> Vec<(String, String)> {
        self.registry
            .read()
            .await
            .devices(user)
            .map(|devices| {
                devices
                    .iter()
                    .map(|(name, mac)| (name.clone(), mac.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolve a device name to its stored address
    pub async fn resolve(&self, user: &str, name: &str) -> Option<String> {
        self.registry.read().await.get(user, name).map(str::to_string)
    }

    /// Number of devices registered by `user`
    pub async fn device_count(&self, user: &str) -> usize {
        self.registry
            .read()
            .await
            .devices(user)
            .map_or(0, |devices| devices.len())
    }

    /// Number of users with at least one device
    pub async fn user_count(&self) -> usize {
        self.registry.read().await.user_count()
    }

    async fn persist(&self, staged: &Registry) -> Result<()> {
        let attempts = self.policy.save_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.store.save(staged) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts => {
                    warn!(attempt, attempts, error = %e, "Registry save failed, retrying");
                    tokio::time::sleep(self.policy.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
