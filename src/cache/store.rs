//! The shared state store handed from server to client.
//!
//! The store is a flat mapping from string keys to JSON values. How it
//! crosses the server/client boundary is up to the host; [`MemoryStore`]
//! offers [`export`](MemoryStore::export) / [`import`](MemoryStore::import)
//! so a host can embed it in the rendered document and read it back.

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors produced by a [`TransferStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode or decode stored value: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("store backend failure: {message}")]
    Backend { message: String },
}

/// Key-value storage consumed by the transfer cache.
///
/// Implementations must make each single-key operation atomic. Removing a
/// key that does not exist is not an error.
pub trait TransferStore: Send + Sync {
    fn has_key(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Returns the value under `key`, or `default` when absent.
    fn get_or(&self, key: &str, default: Value) -> Result<Value, StoreError> {
        Ok(self.get(key)?.unwrap_or(default))
    }
}

impl<'a> dyn TransferStore + 'a {
    /// Reads and decodes the value under `key`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Encodes `value` and writes it under `key`.
    pub fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.set(key, serde_json::to_value(value)?)
    }
}

/// In-process [`TransferStore`] backed by a JSON object.
///
/// # Examples
///
/// ```
/// use rttp_handoff::cache::{MemoryStore, TransferStore};
/// use serde_json::json;
///
/// let server = MemoryStore::new();
/// server.set("greeting", json!("hello")).unwrap();
///
/// // Embedded in the rendered page, then read back by the client.
/// let blob = server.export().unwrap();
/// let client = MemoryStore::import(&blob).unwrap();
/// assert_eq!(client.get("greeting").unwrap(), Some(json!("hello")));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from the blob produced by [`export`](Self::export).
    pub fn import(blob: &str) -> Result<Self, StoreError> {
        let state: Map<String, Value> = serde_json::from_str(blob)?;
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    /// Serializes the whole store to a JSON object string.
    pub fn export(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(&*self.state.lock())?)
    }

    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().is_empty()
    }

    /// Returns every key currently stored.
    pub fn keys(&self) -> Vec<String> {
        self.state.lock().keys().cloned().collect()
    }
}

impl TransferStore for MemoryStore {
    fn has_key(&self, key: &str) -> bool {
        self.state.lock().contains_key(key)
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.state.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.state.lock().insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.state.lock().remove(key);
        Ok(())
    }
}
