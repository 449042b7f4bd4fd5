//! Persistence for the single opaque session token.
//!
//! One value lives under one well-known key. Reading never fails (a missing
//! or unreadable record is simply "no token"); writing and clearing surface
//! storage-medium failures as `StorageError`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use keyring::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Storage key of the persisted token record
pub const TOKEN_KEY: &str = "minibank_admin_token";

/// Keychain service name
const SERVICE_NAME: &str = "minibank-admin";

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Token file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("OS keychain unavailable: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Token storage is disabled")]
    Disabled,
}

/// Scoped key-value persistence for the session token.
pub trait TokenStore: Send + Sync {
    /// The persisted token, or `None` if there is none.
    fn read(&self) -> Option<String>;

    /// Persist `token`, replacing any previous value.
    fn write(&self, token: &str) -> Result<(), StorageError>;

    /// Remove the persisted token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Which medium holds the token between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl TokenBackend {
    /// Open the store for this backend. `data_dir` is only used by `File`.
    pub fn open(self, data_dir: &Path) -> Result<Arc<dyn TokenStore>, StorageError> {
        let store: Arc<dyn TokenStore> = match self {
            TokenBackend::File => Arc::new(FileTokenStore::new(data_dir)),
            TokenBackend::Keyring => Arc::new(KeyringTokenStore::new()?),
            TokenBackend::Memory => Arc::new(MemoryTokenStore::new()),
        };
        debug!(backend = ?self, "Token store opened");
        Ok(store)
    }
}

// ============================================================================
// File backend
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    #[serde(rename = "minibank_admin_token")]
    token: String,
}

/// Token persisted as a small JSON document in the user's data directory.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn read(&self) -> Option<String> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(error = %e, path = ?self.path, "Failed to read session file");
                return None;
            }
        };

        match serde_json::from_str::<TokenRecord>(&contents) {
            Ok(record) if !record.token.is_empty() => Some(record.token),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, path = ?self.path, "Failed to parse session file");
                None
            }
        }
    }

    fn write(&self, token: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let record = TokenRecord {
            token: token.to_string(),
        };
        let contents = serde_json::to_string_pretty(&record)?;
        std::fs::write(&self.path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Keyring backend
// ============================================================================

/// Token kept in the OS keychain.
pub struct KeyringTokenStore {
    entry: Entry,
}

impl KeyringTokenStore {
    pub fn new() -> Result<Self, StorageError> {
        let entry = Entry::new(SERVICE_NAME, TOKEN_KEY)?;
        Ok(Self { entry })
    }
}

impl TokenStore for KeyringTokenStore {
    fn read(&self) -> Option<String> {
        match self.entry.get_password() {
            Ok(token) if !token.is_empty() => Some(token),
            Ok(_) | Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read token from keychain");
                None
            }
        }
    }

    fn write(&self, token: &str) -> Result<(), StorageError> {
        self.entry.set_password(token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Process-local store. Nothing survives a restart.
///
/// `unavailable()` builds a store whose writes and clears always fail, which
/// is how a disabled or read-only medium looks to the session layer.
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
    available: bool,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self {
            token: Mutex::new(None),
            available: true,
        }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            token: Mutex::new(None),
            available: false,
        }
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for MemoryTokenStore {
    fn read(&self) -> Option<String> {
        let guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
        guard.clone().filter(|t| !t.is_empty())
    }

    fn write(&self, token: &str) -> Result<(), StorageError> {
        if !self.available {
            return Err(StorageError::Disabled);
        }
        let mut guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        if !self.available {
            return Err(StorageError::Disabled);
        }
        let mut guard = self.token.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path());
        assert_eq!(store.read(), None);
    }

    #[test]
    fn test_file_store_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path());
        store.write("tok123").unwrap();
        assert_eq!(store.read().as_deref(), Some("tok123"));

        store.write("tok456").unwrap();
        assert_eq!(store.read().as_deref(), Some("tok456"));
    }

    #[test]
    fn test_file_store_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("minibank-admin");
        let store = FileTokenStore::new(&nested);
        store.write("tok").unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_file_store_uses_well_known_key() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path());
        store.write("tok").unwrap();
        let contents = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value[TOKEN_KEY], "tok");
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path());
        store.write("tok").unwrap();
        store.clear().unwrap();
        assert_eq!(store.read(), None);
        store.clear().unwrap();
        assert_eq!(store.read(), None);
    }

    #[test]
    fn test_file_store_corrupt_record_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();
        assert_eq!(store.read(), None);

        std::fs::write(store.path(), r#"{"minibank_admin_token": ""}"#).unwrap();
        assert_eq!(store.read(), None);
    }

    #[test]
    fn test_file_store_write_fails_when_parent_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = FileTokenStore::new(&blocker);
        assert!(matches!(store.write("tok"), Err(StorageError::Io(_))));
    }

    #[test]
    fn test_memory_store_round_trip_and_clear() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.read(), None);
        store.write("abc").unwrap();
        assert_eq!(store.read().as_deref(), Some("abc"));
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.read(), None);
    }

    #[test]
    fn test_memory_store_unavailable_rejects_writes_and_clears() {
        let store = MemoryTokenStore::unavailable();
        assert!(matches!(store.write("abc"), Err(StorageError::Disabled)));
        assert_eq!(store.read(), None);
        assert!(matches!(store.clear(), Err(StorageError::Disabled)));
    }

    #[test]
    fn test_backend_deserializes_lowercase() {
        let backend: TokenBackend = serde_json::from_str(r#""keyring""#).unwrap();
        assert_eq!(backend, TokenBackend::Keyring);
        assert_eq!(TokenBackend::default(), TokenBackend::File);
    }

    #[test]
    fn test_backend_open_file_and_memory() {
        let dir = TempDir::new().unwrap();
        let store = TokenBackend::File.open(dir.path()).unwrap();
        store.write("t").unwrap();
        assert_eq!(store.read().as_deref(), Some("t"));

        let store = TokenBackend::Memory.open(dir.path()).unwrap();
        assert_eq!(store.read(), None);
    }
}
