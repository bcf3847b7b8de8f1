//! ProtocolEngine trait - the seam to the device-management protocol engine
//!
//! The engine owns device discovery, retransmission and payload codecs. The
//! gateway only asks it to start operations and gets results back through a
//! [`CompletionHandle`]; lifecycle events flow in through an [`EventSink`].

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

use crate::correlation::CompletionOutcome;
use crate::gateway::CoreShared;
use crate::models::{CoapStatus, ContentFormat, CorrelationId, JournalEvent, ResourceUri};

/// Engine-local client identifier
pub type ClientId = u16;

/// Registered device as known by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub id: ClientId,
    pub name: String,
}

/// Errors reported by the engine when starting an operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The client is no longer registered with the engine
    #[error("client {0} is not registered")]
    UnknownClient(ClientId),

    #[error("device unreachable: {0}")]
    Unreachable(String),

    #[error("operation rejected: {0}")]
    Rejected(String),

    #[error("engine resources exhausted")]
    Exhausted,
}

/// Device-management protocol engine.
///
/// Dispatch methods are called with the gateway lock held. They must only
/// start the operation and return; the reply has to be delivered later from
/// the engine's own context through the supplied [`CompletionHandle`].
pub trait ProtocolEngine: Send + Sync {
    /// Look up a registered client by endpoint name
    fn find_client(&self, name: &str) -> Option<ClientInfo>;

    /// All currently registered clients
    fn list_clients(&self) -> Vec<ClientInfo>;

    fn read(
        &self,
        client: ClientId,
        uri: &ResourceUri,
        handle: CompletionHandle,
    ) -> Result<(), EngineError>;

    fn write(
        &self,
        client: ClientId,
        uri: &ResourceUri,
        format: ContentFormat,
        payload: Bytes,
        handle: CompletionHandle,
    ) -> Result<(), EngineError>;

    fn execute(
        &self,
        client: ClientId,
        uri: &ResourceUri,
        format: ContentFormat,
        payload: Bytes,
        handle: CompletionHandle,
    ) -> Result<(), EngineError>;
}

/// Delivers the device reply for one dispatched operation
#[derive(Clone)]
pub struct CompletionHandle {
    id: CorrelationId,
    shared: Arc<CoreShared>,
}

impl CompletionHandle {
    pub(crate) fn new(id: CorrelationId, shared: Arc<CoreShared>) -> Self {
        Self { id, shared }
    }

    /// Correlation id this handle resolves
    pub fn id(&self) -> &CorrelationId {
        &self.id
    }

    /// Resolve the pending operation with the device response.
    ///
    /// Only the first call for an id takes effect; later calls are logged and
    /// reported as [`CompletionOutcome::Duplicate`].
    pub fn complete(&self, status: CoapStatus, payload: Bytes) -> CompletionOutcome {
        self.shared.complete(&self.id, status, payload)
    }
}

impl std::fmt::Debug for CompletionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Entry point for device lifecycle events raised by the engine
#[derive(Clone)]
pub struct EventSink {
    shared: Arc<CoreShared>,
}

impl EventSink {
    pub(crate) fn new(shared: Arc<CoreShared>) -> Self {
        Self { shared }
    }

    /// Append an event to the journal and wake the notification pusher
    pub fn record(&self, event: JournalEvent) {
        self.shared.record(event);
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}
