//! Registry Store - durable load/save of the full registry
//!
//! The registry is always written as a single unit. [`JsonFileStore`] writes
//! to a uniquely named sibling temp file and renames it over the target, so an
//! interrupted save never leaves a partially written registry behind.
//! [`JsonFileStore::open_locked`] also holds an advisory lock on a sibling
//! `.lock` file so two processes never own the same registry.

use crate::error::{Error, Result};
use crate::registry::Registry;
use fs2::FileExt;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Durable storage for the registry
pub trait RegistryStore: Send + Sync {
    /// Load the persisted registry
    ///
    /// Missing storage is normal first-start state and yields an empty
    /// registry.
    fn load(&self) -> Result<Registry>;

    /// Replace the persisted registry with `registry`
    fn save(&self, registry: &Registry) -> Result<()>;
}

/// Exclusive advisory lock on a registry file
///
/// Released when the last clone of the owning store is dropped.
#[derive(Debug)]
struct RegistryLock {
    path: PathBuf,
    _file: File,
}

impl RegistryLock {
    fn acquire(path: PathBuf) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| {
                Error::Persist(format!("Failed to open lock file {}: {}", path.display(), e))
            })?;

        file.try_lock_exclusive().map_err(|_| {
            Error::Locked(format!(
                "{} is held by another lanwake process",
                path.display()
            ))
        })?;

        // Best effort, only for humans inspecting a stuck lock
        let _ = writeln!(file, "pid={}", std::process::id());

        debug!(path = ?path, "Registry lock acquired");
        Ok(Self { path, _file: file })
    }
}

/// JSON file backed store
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Option<Arc<RegistryLock>>,
}

impl JsonFileStore {
    /// Default registry filename
    pub const DEFAULT_FILENAME: &'static str = "mac_registry.json";

    /// Create a store for the given file path without taking the lock
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: None,
        }
    }

    /// Create a store that owns the registry file exclusively
    ///
    /// Fails with [`Error::Locked`] while another store (in this or any other
    /// process) holds the lock for the same path.
    pub fn open_locked(path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::new(path);
        fs::create_dir_all(store.dir()).map_err(|e| {
            Error::Persist(format!("Failed to create registry directory: {}", e))
        })?;
        store.lock = Some(Arc::new(RegistryLock::acquire(store.sibling(".lock"))?));
        Ok(store)
    }

    /// Path of the registry file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the held lock file, if any
    #[must_use]
    pub fn lock_path(&self) -> Option<&Path> {
        self.lock.as_deref().map(|lock| lock.path.as_path())
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn file_name(&self) -> OsString {
        self.path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from(Self::DEFAULT_FILENAME))
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.file_name();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn encode(registry: &Registry) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        registry
            .serialize(&mut serializer)
            .map_err(|e| Error::Persist(format!("Failed to serialize registry: {}", e)))?;
        buf.push(b'\n');
        Ok(buf)
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FILENAME)
    }
}

impl RegistryStore for JsonFileStore {
    fn load(&self) -> Result<Registry> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = ?self.path, "No registry file found, starting empty");
                return Ok(Registry::new());
            }
            Err(e) => {
                return Err(Error::Persist(format!(
                    "Failed to read registry {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let registry: Registry = serde_json::from_str(&content).map_err(|e| {
            Error::Persist(format!(
                "Failed to parse registry {}: {}",
                self.path.display(),
                e
            ))
        })?;

        info!(
            path = ?self.path,
            users = registry.user_count(),
            devices = registry.device_count(),
            "Registry loaded"
        );
        Ok(registry)
    }

    fn save(&self, registry: &Registry) -> Result<()> {
        let content = Self::encode(registry)?;

        let dir = self.dir();
        fs::create_dir_all(dir).map_err(|e| {
            Error::Persist(format!("Failed to create registry directory: {}", e))
        })?;

        // Unique temp name per save; concurrent writers never share one
        let mut prefix = OsString::from(".");
        prefix.push(self.file_name());
        prefix.push(".");
        let mut temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| Error::Persist(format!("Failed to create temp file: {}", e)))?;
        temp.write_all(&content)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| Error::Persist(format!("Failed to write registry: {}", e)))?;

        #[cfg(unix)]
        {
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(temp.path(), perms)
                .map_err(|e| Error::Persist(format!("Failed to set file permissions: {}", e)))?;
        }

        temp.persist(&self.path)
            .map_err(|e| Error::Persist(format!("Failed to replace registry: {}", e.error)))?;

        debug!(
            path = ?self.path,
            bytes = content.len(),
            "Registry saved"
        );
        Ok(())
    }
}

/// In-memory store
///
/// Useful for dry runs and tests. Saves can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Registry>,
    failing_saves: AtomicUsize,
    save_calls: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty in-memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `registry`
    #[must_use]
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            saved: Mutex::new(registry),
            ..Self::default()
        }
    }

    /// Make the next `count` saves fail
    pub fn fail_next_saves(&self, count: usize) {
        self.failing_saves.store(count, Ordering::SeqCst);
    }

    /// Total number of save attempts, failed ones included
    #[must_use]
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of the last successfully saved registry
    pub fn snapshot(&self) -> Result<Registry> {
        self.saved
            .lock()
            .map(|guard| guard.clone())
            .map_err(|e| Error::Persist(format!("Lock poisoned: {}", e)))
    }
}

impl RegistryStore for MemoryStore {
    fn load(&self) -> Result<Registry> {
        self.snapshot()
    }

    fn save(&self, registry: &Registry) -> Result<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);

        let should_fail = self
            .failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(Error::Persist("simulated write failure".to_string()));
        }

        let mut saved = self
            .saved
            .lock()
            .map_err(|e| Error::Persist(format!("Lock poisoned: {}", e)))?;
        *saved = registry.clone();
        Ok(())
    }
}
