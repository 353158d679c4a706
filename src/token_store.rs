//! Credential storage
//!
//! [`TokenStore`] holds the client's in-memory access/refresh pair and mirrors
//! every change into a durable [`TokenStorage`] backend under fixed key names.

use crate::error::{ClientError, Result};
use papaya::HashMap;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tracing::warn;

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Durable key/value backend for credentials
pub trait TokenStorage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local storage backed by a Papaya HashMap
///
/// Nothing survives a restart; useful for tests and short-lived tools.
#[derive(Clone)]
pub struct MemoryTokenStorage {
    entries: Arc<HashMap<String, String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(HashMap::new()),
        }
    }

    /// Check if a key is currently stored
    pub fn contains(&self, key: &str) -> bool {
        self.entries.pin().contains_key(key)
    }
}

impl Default for MemoryTokenStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.pin().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.entries.pin().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.pin().remove(key);
        Ok(())
    }
}

/// Storage backed by a single JSON object file
///
/// The file is replaced atomically on every change and deleted once it holds
/// no keys.
pub struct FileTokenStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(ClientError::Storage(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if entries.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(ClientError::Storage(format!(
                    "failed to remove {}: {e}",
                    self.path.display()
                ))),
            };
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| {
            ClientError::Storage(format!("failed to create {}: {e}", dir.display()))
        })?;

        // Write beside the target and rename over it so readers never see a partial file
        let contents = serde_json::to_vec_pretty(entries)?;
        let write_err = |e: std::io::Error| {
            ClientError::Storage(format!("failed to write {}: {e}", self.path.display()))
        };
        let mut staged = NamedTempFile::new_in(dir).map_err(write_err)?;
        staged.write_all(&contents).map_err(write_err)?;
        staged.as_file().sync_all().map_err(write_err)?;
        staged.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| ClientError::Storage("token file lock poisoned".to_string()))
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.guard()?;
        Ok(self.read_entries()?.remove(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.guard()?;
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.guard()?;
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// The client's credential pair
///
/// Reads are served from memory. Writes update memory and are mirrored into
/// the durable backend; a failed durable write is logged and the in-memory
/// value still wins.
#[derive(Clone)]
pub struct TokenStore {
    tokens: Arc<HashMap<&'static str, String>>,
    storage: Arc<dyn TokenStorage>,
}

impl TokenStore {
    /// Create a store over `storage`, loading any persisted credentials
    pub fn hydrate(storage: Arc<dyn TokenStorage>) -> Self {
        let store = Self {
            tokens: Arc::new(HashMap::new()),
            storage,
        };

        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            match store.storage.load(key) {
                Ok(Some(value)) => {
                    store.tokens.pin().insert(key, value);
                }
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "Failed to load persisted token"),
            }
        }

        store
    }

    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    pub fn set_access_token(&self, token: Option<String>) {
        self.set(ACCESS_TOKEN_KEY, token);
    }

    pub fn set_refresh_token(&self, token: Option<String>) {
        self.set(REFRESH_TOKEN_KEY, token);
    }

    /// Drop both tokens from memory and storage
    pub fn clear(&self) {
        self.set(ACCESS_TOKEN_KEY, None);
        self.set(REFRESH_TOKEN_KEY, None);
    }

    fn get(&self, key: &'static str) -> Option<String> {
        self.tokens.pin().get(key).cloned()
    }

    fn set(&self, key: &'static str, token: Option<String>) {
        let persisted = match token {
            Some(value) => {
                let result = self.storage.save(key, &value);
                self.tokens.pin().insert(key, value);
                result
            }
            None => {
                self.tokens.pin().remove(key);
                self.storage.remove(key)
            }
        };

        if let Err(e) = persisted {
            warn!(key = %key, error = %e, "Failed to persist token change");
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::hydrate(Arc::new(MemoryTokenStorage::new()))
    }
}
