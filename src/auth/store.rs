//! Persistent token storage.
//!
//! [`TokenStore`] keeps the authenticated session in a [`Storage`] backend
//! under fixed keys. The user record and the token pair are written as one
//! JSON document, so a single `set` persists both and a single `remove`
//! clears both.
//!
//! Reads never fail: a missing, corrupt or half-populated document reads as
//! "no session".
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use phantom_banking::auth::{MemoryStorage, TokenStore};
//! use phantom_banking::{AuthTokens, AuthUser, Session, UserRole};
//!
//! let store = TokenStore::new(Arc::new(MemoryStorage::new()));
//! let session = Session::new(AuthUser::new("u-1", UserRole::Admin), AuthTokens::new("a1", "r1"));
//!
//! store.save(&session).unwrap();
//! assert_eq!(store.session(), Some(session));
//!
//! store.clear().unwrap();
//! assert!(store.read().is_empty());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::session::{AuthTokens, AuthUser, Session};

/// Storage key holding the serialized session document.
pub const SESSION_STORAGE_KEY: &str = "phantom_banking.auth";

/// Storage key holding the user id awaiting its second factor.
pub const PENDING_2FA_STORAGE_KEY: &str = "phantom_banking.pending_2fa_user";

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stored data could not be encoded or decoded.
    #[error("Storage encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A string key/value storage backend.
///
/// Implementations serialize their own writes and must be shareable across
/// tasks.
pub trait Storage: Send + Sync + fmt::Debug {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Storage backend persisting a JSON object to a single file.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Creates a storage backed by the file at `path`.
    ///
    /// The file and its parent directories are created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling temp file named after the full file name, e.g. `auth.json.tmp`.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut HashMap<String, String>),
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(StorageError::Json(e)) => {
                tracing::warn!(
                    "Discarding unreadable storage file {}: {}",
                    self.path.display(),
                    e
                );
                HashMap::new()
            }
            Err(e) => return Err(e),
        };
        apply(&mut entries);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp_path = self.temp_path();
        fs::write(&tmp_path, serde_json::to_string_pretty(&entries)?)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// The stored authentication state.
///
/// Either both fields are `Some` or both are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoredAuth {
    /// The stored user record.
    pub user: Option<AuthUser>,
    /// The stored token pair.
    pub tokens: Option<AuthTokens>,
}

impl StoredAuth {
    /// Returns `true` if no session is stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.user.is_none()
    }

    /// Converts into a [`Session`], if one is stored.
    #[must_use]
    pub fn into_session(self) -> Option<Session> {
        match (self.user, self.tokens) {
            (Some(user), Some(tokens)) => Some(Session::new(user, tokens)),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct SessionDocument<'a> {
    user: &'a AuthUser,
    tokens: &'a AuthTokens,
    saved_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct StoredDocument {
    user: Option<AuthUser>,
    tokens: Option<AuthTokens>,
}

/// Session persistence over a [`Storage`] backend.
///
/// `TokenStore` is a cheap handle; clones share the same backend.
#[derive(Clone, Debug)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

// Verify TokenStore is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TokenStore>();
};

impl TokenStore {
    /// Creates a token store over the given backend.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Creates a token store over a fresh [`MemoryStorage`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Persists the user and tokens in a single write.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    pub fn save(&self, session: &Session) -> Result<(), StorageError> {
        let document = SessionDocument {
            user: &session.user,
            tokens: &session.tokens,
            saved_at: Utc::now(),
        };
        let encoded = serde_json::to_string(&document)?;
        self.storage.set(SESSION_STORAGE_KEY, &encoded)
    }

    /// Reads the stored session.
    ///
    /// Returns an empty [`StoredAuth`] if nothing is stored, if the stored
    /// document cannot be decoded, or if either half is missing.
    #[must_use]
    pub fn read(&self) -> StoredAuth {
        let raw = match self.storage.get(SESSION_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return StoredAuth::default(),
            Err(e) => {
                tracing::debug!("Session storage unreadable, treating as empty: {}", e);
                return StoredAuth::default();
            }
        };

        match serde_json::from_str::<StoredDocument>(&raw) {
            Ok(StoredDocument {
                user: Some(user),
                tokens: Some(tokens),
            }) => StoredAuth {
                user: Some(user),
                tokens: Some(tokens),
            },
            Ok(_) => {
                tracing::debug!("Stored session is incomplete, treating as empty");
                StoredAuth::default()
            }
            Err(e) => {
                tracing::debug!("Stored session is corrupt, treating as empty: {}", e);
                StoredAuth::default()
            }
        }
    }

    /// Returns the stored session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.read().into_session()
    }

    /// Returns the stored access token, if a session is stored.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.read().tokens.map(|tokens| tokens.access)
    }

    /// Returns the stored refresh token, if a session is stored.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.read().tokens.map(|tokens| tokens.refresh)
    }

    /// Replaces the stored access token, keeping the refresh token and user.
    ///
    /// Returns `Ok(false)` without writing if no session is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    pub fn replace_access(&self, access: &str) -> Result<bool, StorageError> {
        match self.session() {
            Some(session) => {
                self.save(&session.with_access_token(access))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes the stored session and any pending 2FA user id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written. The pending
    /// id removal is attempted even if the session removal fails.
    pub fn clear(&self) -> Result<(), StorageError> {
        let session = self.storage.remove(SESSION_STORAGE_KEY);
        let pending = self.storage.remove(PENDING_2FA_STORAGE_KEY);
        session.and(pending)
    }

    /// Records the user id awaiting OTP verification.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    pub fn set_pending_user(&self, user_id: &str) -> Result<(), StorageError> {
        self.storage.set(PENDING_2FA_STORAGE_KEY, user_id)
    }

    /// Returns the user id awaiting OTP verification, if any.
    #[must_use]
    pub fn pending_user(&self) -> Option<String> {
        self.storage
            .get(PENDING_2FA_STORAGE_KEY)
            .ok()
            .flatten()
            .filter(|id| !id.is_empty())
    }

    /// Forgets the user id awaiting OTP verification.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    pub fn clear_pending_user(&self) -> Result<(), StorageError> {
        self.storage.remove(PENDING_2FA_STORAGE_KEY)
    }
}
