//! lanwake Core - device registry and wake dispatch
//!
//! This crate holds everything with a real contract:
//! - [`store`]: durable, atomic load/save of the whole registry
//! - [`directory`]: per-user register/list/resolve/remove over the registry
//! - [`wake`]: magic packet construction and dispatch to a named device
//!
//! Transport concerns (chat commands, keyboards) live in `lanwake-channels`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod directory;
pub mod error;
pub mod mac;
pub mod registry;
pub mod store;
pub mod wake;

pub use directory::{DeviceDirectory, DirectoryPolicy};
pub use error::{Error, Result};
pub use registry::{DeviceMap, Registry};
pub use store::{JsonFileStore, MemoryStore, RegistryStore};
pub use wake::{UdpWakeSender, WakeDispatcher, WakeOutcome, WakeSender};
