//! Async correlation engine
//!
//! Tracks operations dispatched to devices until their reply arrives. Each
//! operation is registered only after the protocol engine accepted it, and is
//! resolved at most once.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::engine::{CompletionHandle, EngineError, ProtocolEngine};
use crate::models::{
    CoapStatus, CompletedOperation, ContentFormat, CorrelationId, OperationKind, OperationRequest,
    PendingOperation,
};

/// What a completion call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The pending operation was resolved and journaled
    Resolved,
    /// No operation was pending under this id
    Duplicate,
}

/// Set of operations awaiting a device reply
#[derive(Debug, Default)]
pub struct CorrelationEngine {
    pending: HashMap<CorrelationId, PendingOperation>,
}

impl CorrelationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch `request` and register it as pending.
    ///
    /// `handle_for` builds the completion handle handed to the engine. On a
    /// dispatch error the operation and its payload are dropped and nothing
    /// is registered.
    pub fn submit<F>(
        &mut self,
        engine: &dyn ProtocolEngine,
        request: OperationRequest,
        handle_for: F,
    ) -> Result<CorrelationId, EngineError>
    where
        F: FnOnce(CorrelationId) -> CompletionHandle,
    {
        let id = self.unused_id();
        let operation = PendingOperation::new(id.clone(), request);
        let handle = handle_for(id.clone());
        let tag = operation.kind.log_tag();

        let result = match operation.kind {
            OperationKind::Read => engine.read(operation.client.id, &operation.uri, handle),
            OperationKind::Write | OperationKind::Execute => {
                let format = operation.format.unwrap_or(ContentFormat::Text);
                let payload = operation.payload.clone().unwrap_or_default();
                if operation.kind == OperationKind::Write {
                    engine.write(operation.client.id, &operation.uri, format, payload, handle)
                } else {
                    engine.execute(operation.client.id, &operation.uri, format, payload, handle)
                }
            }
        };

        match result {
            Ok(()) => {
                info!(
                    id = %id,
                    device = %operation.client.name,
                    uri = %operation.uri,
                    "[{}-REQUEST] dispatched",
                    tag
                );
                self.pending.insert(id.clone(), operation);
                Ok(id)
            }
            Err(e) => {
                warn!(
                    device = %operation.client.name,
                    uri = %operation.uri,
                    error = %e,
                    "[{}-REQUEST] dispatch failed",
                    tag
                );
                Err(e)
            }
        }
    }

    /// Resolve a pending operation into its completed form.
    ///
    /// Returns `None` when `id` is not pending (already resolved or never
    /// registered).
    pub fn resolve(
        &mut self,
        id: &CorrelationId,
        status: CoapStatus,
        payload: Bytes,
    ) -> Option<CompletedOperation> {
        let Some(operation) = self.pending.remove(id) else {
            warn!(id = %id, status = %status, "[ASYNC-RESPONSE] no pending operation, dropping reply");
            return None;
        };

        let completed = CompletedOperation {
            timestamp: Utc::now().timestamp(),
            id: operation.id,
            status: status.to_http(),
            payload,
        };

        debug!(
            id = %completed.id,
            device = %operation.client.name,
            kind = %operation.kind,
            coap_status = %status,
            http_status = completed.status,
            "[ASYNC-RESPONSE] operation completed"
        );
        Some(completed)
    }

    pub fn is_pending(&self, id: &CorrelationId) -> bool {
        self.pending.contains_key(id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn unused_id(&self) -> CorrelationId {
        loop {
            let id = CorrelationId::generate();
            if !self.pending.contains_key(&id) {
                return id;
            }
        }
    }
}
