//! Admission request storage and hospital decisions.
//!
//! Each request lives under `hospital_request_<id>` as one JSON document. The dispatch side
//! submits requests; the hospital portal lists them, decides on them, and the decision is
//! relayed back to dispatch as a [`Notification`].

use crate::constants::ADMISSION_REQUEST_KEY_PREFIX;
use crate::models::{AdmissionRequest, AdmissionStatus, Notification, NotificationType};
use crate::relay::NotificationRelay;
use crate::store::KeyValueStore;
use crate::{CoreError, CoreResult};
use parking_lot::Mutex;
use resq_ids::RequestId;
use resq_types::{KeySafeId, NonEmptyText};
use std::cmp::Reverse;
use std::sync::Arc;

/// A hospital's answer to an admission request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject { reason: String },
    Divert { reason: Option<String> },
}

impl Decision {
    fn status(&self) -> AdmissionStatus {
        match self {
            Decision::Accept => AdmissionStatus::Accepted,
            Decision::Reject { .. } => AdmissionStatus::Rejected,
            Decision::Divert { .. } => AdmissionStatus::Diverted,
        }
    }

    fn notification_type(&self) -> NotificationType {
        match self {
            Decision::Accept => NotificationType::Accepted,
            Decision::Reject { .. } => NotificationType::Rejected,
            Decision::Divert { .. } => NotificationType::Diverted,
        }
    }
}

pub struct AdmissionDesk {
    store: Arc<dyn KeyValueStore>,
    relay: Arc<NotificationRelay>,
    /// Serializes submit, take and the check-then-write of decide.
    writes: Mutex<()>,
}

impl AdmissionDesk {
    pub fn new(store: Arc<dyn KeyValueStore>, relay: Arc<NotificationRelay>) -> Self {
        Self {
            store,
            relay,
            writes: Mutex::new(()),
        }
    }

    /// Stores a new request as pending.
    ///
    /// An empty id is replaced with a generated one. Any status or rejection reason on the
    /// input is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if the id cannot be used as a storage key.
    pub fn submit(&self, mut request: AdmissionRequest) -> CoreResult<AdmissionRequest> {
        if request.id.trim().is_empty() {
            request.id = RequestId::generate().to_string();
        }
        let id = KeySafeId::new(request.id.trim())?;

        request.id = id.as_str().to_string();
        request.status = AdmissionStatus::Pending;
        request.rejection_reason = None;

        let _guard = self.writes.lock();
        self.save(&request)?;
        tracing::info!(
            request_id = %request.id,
            hospital_id = %request.hospital_id,
            "admission request submitted"
        );
        Ok(request)
    }

    pub fn get(&self, id: &str) -> CoreResult<AdmissionRequest> {
        let key = request_key(id)?;
        let raw = self
            .store
            .get(&key)?
            .ok_or_else(|| CoreError::RequestNotFound(id.to_string()))?;
        serde_json::from_str(&raw).map_err(CoreError::Deserialization)
    }

    /// All stored requests: pending first, each group newest first.
    ///
    /// Entries that fail to parse are skipped.
    pub fn list(&self) -> CoreResult<Vec<AdmissionRequest>> {
        let mut requests = Vec::new();
        for key in self.store.keys()? {
            if !key.starts_with(ADMISSION_REQUEST_KEY_PREFIX) {
                continue;
            }
            let Some(raw) = self.store.get(&key)? else {
                continue;
            };
            match serde_json::from_str::<AdmissionRequest>(&raw) {
                Ok(request) => requests.push(request),
                Err(e) => tracing::warn!(key = %key, "skipping malformed admission request: {}", e),
            }
        }

        requests.sort_by_key(|r| (!r.is_pending(), Reverse(r.request_timestamp)));
        Ok(requests)
    }

    pub fn pending(&self) -> CoreResult<Vec<AdmissionRequest>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(AdmissionRequest::is_pending)
            .collect())
    }

    /// Reads and deletes a request.
    pub fn take(&self, id: &str) -> CoreResult<AdmissionRequest> {
        let _guard = self.writes.lock();
        let request = self.get(id)?;
        self.store.remove(&request_key(id)?)?;
        tracing::info!(request_id = %id, "admission request consumed");
        Ok(request)
    }

    /// Applies `decision` to a pending request and relays it back to dispatch.
    ///
    /// # Errors
    ///
    /// - [`CoreError::RequestNotFound`] for an unknown id.
    /// - [`CoreError::RequestNotPending`] if the request was already decided.
    /// - [`CoreError::InvalidInput`] for a rejection without a reason.
    pub fn decide(&self, id: &str, decision: Decision) -> CoreResult<Notification> {
        let guard = self.writes.lock();
        let mut request = self.get(id)?;
        if !request.is_pending() {
            return Err(CoreError::RequestNotPending {
                id: request.id,
                status: request.status.to_string(),
            });
        }

        let message = match &decision {
            Decision::Accept => format!("Patient admission request {} has been accepted.", request.id),
            Decision::Reject { reason } => {
                let reason = NonEmptyText::new(reason)?;
                request.rejection_reason = Some(reason.as_str().to_string());
                format!("Admission request {} rejected: {}", request.id, reason)
            }
            Decision::Divert { reason } => match reason.as_deref().map(str::trim) {
                Some(reason) if !reason.is_empty() => {
                    format!("Admission request {} diverted: {}", request.id, reason)
                }
                _ => format!("Admission request {} diverted to another facility.", request.id),
            },
        };
        if !matches!(decision, Decision::Reject { .. }) {
            request.rejection_reason = None;
        }
        request.status = decision.status();

        self.save(&request)?;
        drop(guard);
        tracing::info!(
            request_id = %request.id,
            status = %request.status,
            "admission request decided"
        );

        let notification = Notification::new(decision.notification_type(), request, Some(message));
        Ok(self.relay.notify(notification))
    }

    fn save(&self, request: &AdmissionRequest) -> CoreResult<()> {
        let json = serde_json::to_string(request).map_err(CoreError::Serialization)?;
        self.store.set(&request_key(&request.id)?, &json)?;
        Ok(())
    }
}

fn request_key(id: &str) -> CoreResult<String> {
    let id = KeySafeId::new(id)?;
    Ok(format!("{ADMISSION_REQUEST_KEY_PREFIX}{id}"))
}
