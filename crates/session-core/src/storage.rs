//! Key-value cache used for the role and user id written at login.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use tracing::warn;

use crate::{
    config::SessionConfig,
    error::{SessionError, StorageError, StorageResult},
};

/// String key-value cache shared by the whole client (browser localStorage or equivalent).
///
/// Last writer wins; implementations are not expected to coordinate concurrent writers.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}

impl<T> KeyValueStore for Arc<T>
where
    T: KeyValueStore + ?Sized,
{
    fn get(&self, key: &str) -> Option<String> {
        self.as_ref().get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.as_ref().set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.as_ref().remove(key)
    }
}

/// In-process store for native clients and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store, e.g. from a previous run
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// localStorage - persists across browser sessions
    Local,
    /// sessionStorage - cleared when tab/window closes
    Session,
    /// No-op mode - for when storage is disabled or unavailable
    None,
}

/// Browser storage adapter over localStorage, sessionStorage, or nothing at all.
///
/// Without the `web` feature only [`StorageType::None`] is functional; the browser
/// variants read as empty and refuse writes.
#[derive(Debug, Clone, Copy)]
pub struct BrowserStorage {
    storage_type: StorageType,
}

impl BrowserStorage {
    pub fn new(storage_type: StorageType) -> Self {
        Self { storage_type }
    }

    #[cfg(feature = "web")]
    fn backend(&self) -> StorageResult<Option<web_sys::Storage>> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable("window not available".to_string()))?;
        let storage = match self.storage_type {
            StorageType::Local => window.local_storage(),
            StorageType::Session => window.session_storage(),
            StorageType::None => return Ok(None),
        }
        .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
        .ok_or_else(|| StorageError::Unavailable("storage not available".to_string()))?;
        Ok(Some(storage))
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self.storage_type {
            StorageType::None => None,
            #[cfg(feature = "web")]
            StorageType::Local | StorageType::Session => {
                let storage = self.backend().ok()??;
                match storage.get_item(key) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(key, error = ?e, "failed to read browser storage");
                        None
                    }
                }
            }
            #[cfg(not(feature = "web"))]
            StorageType::Local | StorageType::Session => {
                let _ = key;
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        match self.storage_type {
            StorageType::None => Ok(()),
            #[cfg(feature = "web")]
            StorageType::Local | StorageType::Session => match self.backend()? {
                Some(storage) => storage
                    .set_item(key, value)
                    .map_err(|e| StorageError::operation(key, format!("{:?}", e))),
                None => Ok(()),
            },
            #[cfg(not(feature = "web"))]
            StorageType::Local | StorageType::Session => {
                let _ = value;
                Err(StorageError::operation(key, "browser storage requires the `web` feature"))
            }
        }
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match self.storage_type {
            StorageType::None => Ok(()),
            #[cfg(feature = "web")]
            StorageType::Local | StorageType::Session => match self.backend()? {
                Some(storage) => storage
                    .remove_item(key)
                    .map_err(|e| StorageError::operation(key, format!("{:?}", e))),
                None => Ok(()),
            },
            #[cfg(not(feature = "web"))]
            StorageType::Local | StorageType::Session => {
                Err(StorageError::operation(key, "browser storage requires the `web` feature"))
            }
        }
    }
}

/// Cache the user id and role after a successful login so the next mount can
/// restore the role alongside the session.
pub fn remember_login(
    store: &impl KeyValueStore,
    config: &SessionConfig,
    user_id: &str,
    role: Option<&str>,
) -> StorageResult<()> {
    store.set(&config.user_id_key, user_id)?;
    match role {
        Some(role) => store.set(&config.role_key, role),
        None => store.remove(&config.role_key),
    }
}

/// Drop both login cache keys.
///
/// A failed removal does not stop the other one; the first failure is returned.
pub fn forget_login(store: &impl KeyValueStore, config: &SessionConfig) -> Result<(), SessionError> {
    let mut first_failure = None;
    for key in [&config.role_key, &config.user_id_key] {
        if let Err(err) = store.remove(key) {
            warn!(key = %key, error = %err, "failed to clear cached login value");
            first_failure.get_or_insert(SessionError::Storage(err));
        }
    }
    first_failure.map_or(Ok(()), Err)
}
