//! Key-value persistence used by the relay and the admission desk.
//!
//! The store is a string-to-string map. Values are JSON documents; the store itself never
//! looks inside them. Implementations:
//!
//! - [`MemoryStore`]: process-local map, used in tests and for ephemeral deployments.
//! - [`FileStore`]: one file per key under a directory.
//! - [`UnavailableStore`]: every operation fails with [`StoreError::Unavailable`], modelling a
//!   context with no persistent storage at all.
//! - [`BroadcastStore`]: wraps another store for one context and publishes every write on a
//!   [`StorageBus`], so other contexts sharing the backing store can react to it.

mod broadcast;
mod file;
mod memory;

pub use broadcast::{BroadcastStore, ContextId, StorageBus, StorageEvent};
pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage is unavailable in this context")]
    Unavailable,
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// All keys currently present, in no particular order.
    fn keys(&self) -> StoreResult<Vec<String>>;
}

/// A store for contexts without persistent storage.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Unavailable)
    }

    fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable)
    }

    fn remove(&self, _key: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Err(StoreError::Unavailable)
    }
}

/// Keys double as file names, so they are limited to `[0-9A-Za-z_-]`.
pub(crate) fn validate_key(key: &str) -> StoreResult<()> {
    let ok = !key.is_empty()
        && key
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_owned()))
    }
}
