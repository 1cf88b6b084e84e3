//! Notification relay between the hospital portal and the dispatch console.
//!
//! The relay keeps the most recent notifications in a key-value store under
//! [`NOTIFICATIONS_STORAGE_KEY`] (a JSON array, newest first) and fans every new notification
//! out to in-process listeners.
//!
//! ## Delivery
//! - **Local**: [`NotificationRelay::notify`] invokes every listener synchronously, in
//!   registration order, before returning.
//! - **Remote**: when the relay is built over a [`BroadcastStore`], writes made by *other*
//!   contexts arrive as [`StorageEvent`]s. Each event for the notifications key delivers the
//!   newest item of the written list to the listeners. Writers in different contexts are
//!   last-write-wins, so a remote context may miss a notification that was overwritten before
//!   it read the key. Within one relay, list updates are serialized.
//!
//! ## Failure handling
//! Relay operations never fail. An unavailable store degrades reads to an empty list and
//! writes to no-ops; corrupt stored JSON reads as an empty list; a panicking listener is
//! logged and skipped without affecting the others.

use crate::constants::NOTIFICATIONS_STORAGE_KEY;
use crate::models::Notification;
use crate::store::{
    BroadcastStore, ContextId, KeyValueStore, StorageBus, StorageEvent, StoreError,
};
use parking_lot::Mutex;
use resq_ids::NotificationId;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Callback invoked for every delivered notification.
pub type Listener = Arc<dyn Fn(&Notification) + Send + Sync>;

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Publish/subscribe service over a key-value store.
pub struct NotificationRelay {
    store: Arc<dyn KeyValueStore>,
    capacity: usize,
    context: Option<(ContextId, StorageBus)>,
    listeners: Arc<Mutex<ListenerRegistry>>,
    /// Held from the read to the write of every list update in this context.
    writes: Mutex<()>,
}

/// Handle returned by [`NotificationRelay::subscribe`].
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<ListenerRegistry>>,
}

impl Subscription {
    /// Removes the listener. Calling this more than once, or after the relay has been
    /// dropped, does nothing.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

impl NotificationRelay {
    /// Creates a relay over a plain store. No remote events are received.
    pub fn new(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self {
            store,
            capacity: capacity.max(1),
            context: None,
            listeners: Arc::new(Mutex::new(ListenerRegistry::default())),
            writes: Mutex::new(()),
        }
    }

    /// Creates a relay for one context of a shared store.
    ///
    /// Call [`NotificationRelay::watch`] to start receiving other contexts' writes.
    pub fn attached(store: BroadcastStore, capacity: usize) -> Self {
        let context = Some((store.origin(), store.bus().clone()));
        Self {
            store: Arc::new(store),
            capacity: capacity.max(1),
            context,
            listeners: Arc::new(Mutex::new(ListenerRegistry::default())),
            writes: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Registers `listener` for every future local or remote notification.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let mut registry = self.listeners.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, Arc::new(listener)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().entries.len()
    }

    /// Stores `notification` at the head of the list and delivers it to local listeners.
    ///
    /// An empty id is replaced with a freshly generated one. The stored list is truncated to
    /// the relay capacity. Returns the notification as stored.
    pub fn notify(&self, mut notification: Notification) -> Notification {
        if notification.id.trim().is_empty() {
            notification.id = NotificationId::generate().to_string();
        }

        {
            let _guard = self.writes.lock();
            let mut notifications = Vec::with_capacity(self.capacity);
            notifications.push(notification.clone());
            notifications.extend(self.get_notifications());
            self.save(notifications);
        }

        tracing::info!(
            notification_id = %notification.id,
            request_id = %notification.request.id,
            kind = ?notification.kind,
            "notification published"
        );
        self.broadcast(&notification);
        notification
    }

    /// Returns the stored notifications, newest first.
    pub fn get_notifications(&self) -> Vec<Notification> {
        let raw = match self.store.get(NOTIFICATIONS_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(StoreError::Unavailable) => return Vec::new(),
            Err(e) => {
                tracing::warn!("failed to load notifications from storage: {}", e);
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("discarding malformed stored notifications: {}", e);
            Vec::new()
        })
    }

    pub fn mark_as_read(&self, id: &str) {
        let _guard = self.writes.lock();
        let notifications = self
            .get_notifications()
            .into_iter()
            .map(|mut n| {
                if n.id == id {
                    n.is_read = Some(true);
                }
                n
            })
            .collect();
        self.save(notifications);
    }

    pub fn mark_all_as_read(&self) {
        let _guard = self.writes.lock();
        let notifications = self
            .get_notifications()
            .into_iter()
            .map(|mut n| {
                n.is_read = Some(true);
                n
            })
            .collect();
        self.save(notifications);
    }

    pub fn unread_count(&self) -> usize {
        self.get_notifications()
            .iter()
            .filter(|n| !n.is_read())
            .count()
    }

    /// Reacts to a write made through the shared store.
    ///
    /// Events for other keys, removals, this relay's own writes and unparseable payloads are
    /// ignored. Otherwise the newest notification of the written list is delivered.
    pub fn handle_storage_event(&self, event: &StorageEvent) {
        if event.key != NOTIFICATIONS_STORAGE_KEY {
            return;
        }
        if matches!(&self.context, Some((own, _)) if *own == event.origin) {
            return;
        }
        let Some(raw) = event.new_value.as_deref() else {
            return;
        };

        match serde_json::from_str::<Vec<Notification>>(raw) {
            Ok(notifications) => {
                if let Some(latest) = notifications.first() {
                    self.broadcast(latest);
                }
            }
            Err(e) => tracing::warn!("error parsing storage notification: {}", e),
        }
    }

    /// Spawns a task feeding other contexts' writes into [`Self::handle_storage_event`].
    ///
    /// Returns `None` for relays built with [`NotificationRelay::new`]. Must be called from
    /// within a Tokio runtime. The task ends once the relay has been dropped.
    pub fn watch(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let (_, bus) = self.context.as_ref()?;
        let mut rx = bus.subscribe();
        let relay = Arc::downgrade(self);

        Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let Some(relay) = relay.upgrade() else {
                            break;
                        };
                        relay.handle_storage_event(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "storage events lagged, remote notifications missed");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    }

    fn save(&self, mut notifications: Vec<Notification>) {
        notifications.truncate(self.capacity);

        let json = match serde_json::to_string(&notifications) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("failed to serialize notifications: {}", e);
                return;
            }
        };

        match self.store.set(NOTIFICATIONS_STORAGE_KEY, &json) {
            Ok(()) => {}
            Err(StoreError::Unavailable) => {
                tracing::debug!("storage unavailable, notifications not persisted");
            }
            Err(e) => tracing::error!("error saving notifications to storage: {}", e),
        }
    }

    fn broadcast(&self, notification: &Notification) {
        // Snapshot so listeners may (un)subscribe while being called.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(notification))).is_err() {
                tracing::error!(
                    notification_id = %notification.id,
                    "error in notification listener"
                );
            }
        }
    }
}
