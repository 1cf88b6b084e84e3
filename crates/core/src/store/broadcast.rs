//! Cross-context change notification for a shared store.
//!
//! Several contexts (for example the dispatch console and the hospital portal) share one
//! backing store. Each context writes through its own [`BroadcastStore`], which tags every
//! write with the context's [`ContextId`] and publishes it on the shared [`StorageBus`].
//! Receivers filter out their own writes: a context is never told about a change it made.

use super::{KeyValueStore, StoreResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one writer on a [`StorageBus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    pub fn allocate() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A change to one key. `new_value` is `None` when the key was removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
    pub origin: ContextId,
}

#[derive(Clone, Debug)]
pub struct StorageBus {
    tx: broadcast::Sender<StorageEvent>,
}

impl StorageBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.tx.subscribe()
    }

    /// Publishing with no receivers is not an error; the event is simply dropped.
    pub fn publish(&self, event: StorageEvent) {
        let _ = self.tx.send(event);
    }
}

/// One context's view of a shared store.
#[derive(Clone)]
pub struct BroadcastStore {
    inner: Arc<dyn KeyValueStore>,
    bus: StorageBus,
    origin: ContextId,
}

impl BroadcastStore {
    /// Attaches a new context to `inner`, announcing its writes on `bus`.
    pub fn attach(inner: Arc<dyn KeyValueStore>, bus: StorageBus) -> Self {
        Self {
            inner,
            bus,
            origin: ContextId::allocate(),
        }
    }

    pub fn origin(&self) -> ContextId {
        self.origin
    }

    pub fn bus(&self) -> &StorageBus {
        &self.bus
    }
}

impl KeyValueStore for BroadcastStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.set(key, value)?;
        self.bus.publish(StorageEvent {
            key: key.to_owned(),
            new_value: Some(value.to_owned()),
            origin: self.origin,
        });
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.inner.remove(key)?;
        self.bus.publish(StorageEvent {
            key: key.to_owned(),
            new_value: None,
            origin: self.origin,
        });
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        self.inner.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, UnavailableStore};

    #[test]
    fn test_contexts_get_distinct_ids() {
        assert_ne!(ContextId::allocate(), ContextId::allocate());
    }

    #[test]
    fn test_writes_are_shared_and_published() {
        let backing: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let bus = StorageBus::new(8);
        let mut rx = bus.subscribe();

        let portal = BroadcastStore::attach(backing.clone(), bus.clone());
        let dispatch = BroadcastStore::attach(backing, bus);

        portal.set("resq_notifications", "[1]").unwrap();
        assert_eq!(
            dispatch.get("resq_notifications").unwrap().as_deref(),
            Some("[1]")
        );

        let event = rx.try_recv().unwrap();
        assert_eq!(event.key, "resq_notifications");
        assert_eq!(event.new_value.as_deref(), Some("[1]"));
        assert_eq!(event.origin, portal.origin());

        dispatch.remove("resq_notifications").unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.new_value, None);
        assert_eq!(event.origin, dispatch.origin());
    }

    #[test]
    fn test_failed_write_is_not_published() {
        let bus = StorageBus::new(8);
        let mut rx = bus.subscribe();
        let store = BroadcastStore::attach(Arc::new(UnavailableStore), bus);

        assert!(store.set("k", "v").is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_publish_without_receivers_is_silent() {
        let bus = StorageBus::new(1);
        bus.publish(StorageEvent {
            key: "k".into(),
            new_value: None,
            origin: ContextId::allocate(),
        });
    }
}
