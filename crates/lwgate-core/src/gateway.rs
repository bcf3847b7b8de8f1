//! Gateway - the single owner of all shared core state
//!
//! Request handlers and protocol-engine callbacks meet here. One mutex guards
//! the pending set, the journal, the webhook subscription and the credential
//! records; it is never held across an `.await` or network I/O.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use lwgate_creds::{
    create_from_validated_new, validate_new_entry, CredentialError, CredentialStore, PublicView,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::correlation::{CompletionOutcome, CorrelationEngine};
use crate::engine::{ClientInfo, CompletionHandle, EventSink, ProtocolEngine};
use crate::error::{GatewayError, GatewayResult};
use crate::journal::{CallbackSubscription, Journal, NotificationBatch, NotificationSender};
use crate::models::{CoapStatus, CorrelationId, JournalEvent};
use crate::translate::{translate, InboundRequest};

/// Mutable state behind the gateway lock
#[derive(Debug, Default)]
pub(crate) struct CoreState {
    correlation: CorrelationEngine,
    journal: Journal,
    subscription: Option<CallbackSubscription>,
    devices: CredentialStore,
}

/// State shared with completion handles and event sinks
#[derive(Debug)]
pub(crate) struct CoreShared {
    state: Mutex<CoreState>,
    wake: Notify,
}

impl CoreShared {
    pub(crate) fn new(devices: CredentialStore) -> Self {
        Self {
            state: Mutex::new(CoreState {
                devices,
                ..Default::default()
            }),
            wake: Notify::new(),
        }
    }

    pub(crate) fn complete(
        &self,
        id: &CorrelationId,
        status: CoapStatus,
        payload: Bytes,
    ) -> CompletionOutcome {
        {
            let mut state = self.state.lock();
            let Some(completed) = state.correlation.resolve(id, status, payload) else {
                return CompletionOutcome::Duplicate;
            };
            state.journal.record(JournalEvent::Completed(completed));
        }
        self.wake.notify_one();
        CompletionOutcome::Resolved
    }

    pub(crate) fn record(&self, event: JournalEvent) {
        self.state.lock().journal.record(event);
        self.wake.notify_one();
    }
}

/// Gateway core
pub struct Gateway {
    shared: Arc<CoreShared>,
    engine: Arc<dyn ProtocolEngine>,
    database_path: Option<PathBuf>,
}

impl Gateway {
    /// Create a gateway over `engine`.
    ///
    /// `database_path` is where credential changes are persisted; `None`
    /// keeps them in memory only.
    pub fn new(
        engine: Arc<dyn ProtocolEngine>,
        devices: CredentialStore,
        database_path: Option<PathBuf>,
    ) -> Self {
        Self {
            shared: Arc::new(CoreShared::new(devices)),
            engine,
            database_path,
        }
    }

    /// Sink the protocol engine uses to report device lifecycle events
    pub fn events(&self) -> EventSink {
        EventSink::new(self.shared.clone())
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.database_path.as_deref()
    }

    /// Clients currently registered with the protocol engine
    pub fn list_clients(&self) -> Vec<ClientInfo> {
        self.engine.list_clients()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Translate and dispatch a REST request, returning its correlation id
    pub fn submit(&self, request: InboundRequest<'_>) -> GatewayResult<CorrelationId> {
        let operation = translate(request, self.engine.as_ref())?;

        let mut state = self.shared.state.lock();
        let id = state
            .correlation
            .submit(self.engine.as_ref(), operation, |id| {
                CompletionHandle::new(id, self.shared.clone())
            })?;
        Ok(id)
    }

    pub fn is_pending(&self, id: &CorrelationId) -> bool {
        self.shared.state.lock().correlation.is_pending(id)
    }

    pub fn pending_count(&self) -> usize {
        self.shared.state.lock().correlation.pending_count()
    }

    // =========================================================================
    // Journal
    // =========================================================================

    pub fn record(&self, event: JournalEvent) {
        self.shared.record(event);
    }

    /// Take everything recorded since the last drain
    pub fn drain_all(&self) -> NotificationBatch {
        self.shared.state.lock().journal.drain_all()
    }

    pub fn subscription(&self) -> Option<CallbackSubscription> {
        self.shared.state.lock().subscription.clone()
    }

    /// Probe `subscription` and, if it answers, make it the webhook target.
    ///
    /// The probe runs without the lock. On a transport failure the current
    /// subscription is left as it was.
    pub async fn set_subscription(
        &self,
        subscription: CallbackSubscription,
        sender: &dyn NotificationSender,
    ) -> GatewayResult<()> {
        match sender.send(&subscription, &NotificationBatch::empty()).await {
            Ok(status) => {
                info!(url = %subscription.url, status, "[SET-CALLBACK] callback probe answered");
            }
            Err(e) => {
                warn!(url = %subscription.url, error = %e, "[SET-CALLBACK] callback unreachable");
                return Err(GatewayError::CallbackUnreachable(subscription.url));
            }
        }

        let url = subscription.url.clone();
        self.shared.state.lock().subscription = Some(subscription);
        info!(url = %url, "[SET-CALLBACK] subscription updated");
        self.shared.wake.notify_one();
        Ok(())
    }

    pub fn clear_subscription(&self) -> GatewayResult<()> {
        let previous = self.shared.state.lock().subscription.take();
        match previous {
            Some(sub) => {
                info!(url = %sub.url, "[DELETE-CALLBACK] subscription removed");
                Ok(())
            }
            None => Err(GatewayError::NotFound("no callback subscription".to_string())),
        }
    }

    /// Drain the journal for webhook delivery.
    ///
    /// Returns `None` when there is no subscription or nothing to send.
    /// Timeouts alone do not trigger a push; they stay journaled and leave
    /// with the next pull or non-empty push.
    pub fn take_push_batch(&self) -> Option<(CallbackSubscription, NotificationBatch)> {
        let mut state = self.shared.state.lock();
        let subscription = state.subscription.clone()?;
        if !state.journal.has_deliverable() {
            return None;
        }
        Some((subscription, state.journal.drain_all()))
    }

    /// Return an undelivered batch to the front of the journal
    pub fn restore_batch(&self, batch: NotificationBatch) {
        self.shared.state.lock().journal.restore(batch);
    }

    /// Wait until an event, completion or subscription change is recorded
    pub async fn wait_for_events(&self) {
        self.shared.wake.notified().await;
    }

    // =========================================================================
    // Device credentials
    // =========================================================================

    pub fn list_devices(&self) -> Vec<PublicView> {
        self.shared.state.lock().devices.public_views()
    }

    pub fn get_device(&self, id: &str) -> GatewayResult<PublicView> {
        self.shared
            .state
            .lock()
            .devices
            .find_by_id(id)
            .map(|r| r.to_public_view())
            .ok_or_else(|| CredentialError::NotFound(id.to_string()).into())
    }

    /// Validate a new-entry body, store it under a fresh uuid and persist
    pub fn add_device(&self, body: &Value) -> GatewayResult<PublicView> {
        validate_new_entry(body)?;
        let record = create_from_validated_new(body)?;
        let view = record.to_public_view();

        self.mutate_devices(|devices| {
            devices.insert(record);
            Ok(())
        })?;

        info!(uuid = %view.uuid, "[DEVICES DATABASE] device added");
        Ok(view)
    }

    /// Replace the keys of an existing record, keeping its uuid
    pub fn update_device(&self, id: &str, body: &Value) -> GatewayResult<()> {
        validate_new_entry(body)?;
        let replacement = create_from_validated_new(body)?;

        self.mutate_devices(|devices| {
            let record = devices
                .find_by_id_mut(id)
                .ok_or_else(|| CredentialError::NotFound(id.to_string()))?;
            record.psk = replacement.psk;
            record.psk_id = replacement.psk_id;
            Ok(())
        })?;

        info!(uuid = %id, "[DEVICES DATABASE] device updated");
        Ok(())
    }

    pub fn delete_device(&self, id: &str) -> GatewayResult<()> {
        self.mutate_devices(|devices| devices.delete_by_id(id).map(|_| ()))?;
        info!(uuid = %id, "[DEVICES DATABASE] device removed");
        Ok(())
    }

    /// Apply `change` and persist; a failed save restores the previous records
    fn mutate_devices<F>(&self, change: F) -> GatewayResult<()>
    where
        F: FnOnce(&mut CredentialStore) -> Result<(), CredentialError>,
    {
        let mut state = self.shared.state.lock();
        let snapshot = state.devices.clone();

        change(&mut state.devices)?;

        if let Err(e) = state.devices.save(self.database_path.as_deref()) {
            warn!(error = %e, "[DEVICES DATABASE] save failed, reverting change");
            state.devices = snapshot;
            return Err(e.into());
        }
        Ok(())
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("database_path", &self.database_path)
            .finish_non_exhaustive()
    }
}
