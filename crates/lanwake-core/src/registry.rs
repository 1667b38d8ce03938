//! Registry - per-user device name to hardware address mapping
//!
//! Both levels are insertion ordered so listings are stable for the
//! lifetime of the process and across restarts.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One user's devices (device name -> hardware address)
pub type DeviceMap = IndexMap<String, String>;

/// Full registry keyed by the caller's opaque user id
///
/// Serializes as a plain object of objects of strings:
/// `{"42": {"desktop": "AA:BB:CC:DD:EE:FF"}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    users: IndexMap<String, DeviceMap>,
}

impl Registry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Devices registered by `user`, if any
    #[must_use]
    pub fn devices(&self, user: &str) -> Option<&DeviceMap> {
        self.users.get(user)
    }

    /// Look up a single device address
    #[must_use]
    pub fn get(&self, user: &str, name: &str) -> Option<&str> {
        self.users
            .get(user)
            .and_then(|devices| devices.get(name))
            .map(String::as_str)
    }

    /// Insert or overwrite an entry, returning the previous address
    ///
    /// An overwritten entry keeps its original position.
    pub fn insert(
        &mut self,
        user: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Option<String> {
        self.users
            .entry(user.into())
            .or_default()
            .insert(name.into(), address.into())
    }

    /// Remove an entry, returning its address
    ///
    /// A user whose last device is removed is dropped from the registry.
    pub fn remove(&mut self, user: &str, name: &str) -> Option<String> {
        let devices = self.users.get_mut(user)?;
        let removed = devices.shift_remove(name);
        if devices.is_empty() {
            self.users.shift_remove(user);
        }
        removed
    }

    /// Number of users with at least one device
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Total number of devices across all users
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.users.values().map(IndexMap::len).sum()
    }

    /// Whether the registry holds no users
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut registry = Registry::new();
        registry.insert("u", "a", "AA:BB:CC:DD:EE:01");
        registry.insert("u", "b", "AA:BB:CC:DD:EE:02");

        let previous = registry.insert("u", "a", "11:22:33:44:55:66");
        assert_eq!(previous.as_deref(), Some("AA:BB:CC:DD:EE:01"));

        let names: Vec<&str> = registry.devices("u").unwrap().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(registry.get("u", "a"), Some("11:22:33:44:55:66"));
    }

    #[test]
    fn test_remove_drops_empty_user() {
        let mut registry = Registry::new();
        registry.insert("u", "pc", "AA:BB:CC:DD:EE:FF");

        assert_eq!(registry.remove("u", "pc").as_deref(), Some("AA:BB:CC:DD:EE:FF"));
        assert!(registry.devices("u").is_none());
        assert!(registry.is_empty());
        assert_eq!(registry.remove("u", "pc"), None);
    }

    #[test]
    fn test_serialized_shape() {
        let mut registry = Registry::new();
        registry.insert("42", "desktop", "AA:BB:CC:DD:EE:FF");

        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"42": {"desktop": "AA:BB:CC:DD:EE:FF"}})
        );
    }

    #[test]
    fn test_deserialize_keeps_document_order() {
        let registry: Registry =
            serde_json::from_str(r#"{"7": {"zeta": "1", "alpha": "2", "mid": "3"}}"#).unwrap();
        let names: Vec<&str> = registry.devices("7").unwrap().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.device_count(), 3);
        assert_eq!(registry.user_count(), 1);
    }
}
