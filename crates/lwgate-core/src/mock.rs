//! Mock protocol engine for demos and testing
//!
//! Keeps a registry of named clients and a simulated resource store per
//! client. Dispatched operations are recorded and answered either on demand
//! ([`MockEngine::respond_next`]) or automatically from a spawned task.

use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::correlation::CompletionOutcome;
use crate::engine::{ClientId, ClientInfo, CompletionHandle, EngineError, EventSink, ProtocolEngine};
use crate::models::{CoapStatus, ContentFormat, JournalEvent, OperationKind, ResourceUri};

/// Operation handed to the mock engine
#[derive(Debug, Clone)]
pub struct DispatchedOperation {
    pub client: ClientId,
    pub kind: OperationKind,
    pub uri: ResourceUri,
    pub format: Option<ContentFormat>,
    pub payload: Option<Bytes>,
    pub handle: CompletionHandle,
}

#[derive(Debug, Default)]
struct MockState {
    clients: Vec<ClientInfo>,
    next_id: ClientId,
    fail_dispatch: bool,
    auto_complete: bool,
    dispatched: VecDeque<DispatchedOperation>,
    resources: HashMap<(ClientId, String), Bytes>,
}

/// In-process protocol engine
#[derive(Debug, Default)]
pub struct MockEngine {
    state: Mutex<MockState>,
    sink: Mutex<Option<EventSink>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect the engine to a gateway's event sink
    pub fn attach(&self, sink: EventSink) {
        *self.sink.lock() = Some(sink);
    }

    /// Refuse every dispatch with [`EngineError::Unreachable`]
    pub fn set_fail_dispatch(&self, fail: bool) {
        self.state.lock().fail_dispatch = fail;
    }

    /// Answer dispatched operations from the simulated resource store
    pub fn set_auto_complete(&self, enabled: bool) {
        self.state.lock().auto_complete = enabled;
    }

    /// Add a client without raising a registration event
    pub fn add_client(&self, name: &str) -> ClientInfo {
        let mut state = self.state.lock();
        if let Some(existing) = state.clients.iter().find(|c| c.name == name) {
            return existing.clone();
        }

        let info = ClientInfo {
            id: state.next_id,
            name: name.to_string(),
        };
        state.next_id = state.next_id.wrapping_add(1);
        state.clients.push(info.clone());
        info
    }

    /// Register a client and record the registration
    pub fn register(&self, name: &str) -> ClientInfo {
        let info = self.add_client(name);
        info!(device = %name, "Client registered");
        self.emit(JournalEvent::registered(name));
        info
    }

    /// Record a registration update for a known client
    pub fn update(&self, name: &str) -> bool {
        if !self.has_client(name) {
            return false;
        }
        self.emit(JournalEvent::updated(name));
        true
    }

    /// Remove a client and record the deregistration
    pub fn deregister(&self, name: &str) -> bool {
        if !self.remove_client(name) {
            return false;
        }
        info!(device = %name, "Client deregistered");
        self.emit(JournalEvent::deregistered(name));
        true
    }

    /// Remove a client whose registration lifetime expired
    pub fn time_out(&self, name: &str) -> bool {
        if !self.remove_client(name) {
            return false;
        }
        info!(device = %name, "Client registration timed out");
        self.emit(JournalEvent::timed_out(name));
        true
    }

    /// Seed a value in a client's simulated resource store
    pub fn set_resource(&self, client: &str, uri: &ResourceUri, value: impl Into<Bytes>) -> bool {
        let mut state = self.state.lock();
        let Some(id) = state.clients.iter().find(|c| c.name == client).map(|c| c.id) else {
            return false;
        };
        state.resources.insert((id, uri.to_string()), value.into());
        true
    }

    /// Take all operations not yet answered by [`respond_next`](Self::respond_next)
    pub fn take_dispatched(&self) -> Vec<DispatchedOperation> {
        self.state.lock().dispatched.drain(..).collect()
    }

    pub fn dispatched_count(&self) -> usize {
        self.state.lock().dispatched.len()
    }

    /// Answer the oldest outstanding operation
    pub fn respond_next(&self, status: CoapStatus, payload: Bytes) -> Option<CompletionOutcome> {
        let operation = self.state.lock().dispatched.pop_front()?;
        Some(operation.handle.complete(status, payload))
    }

    fn has_client(&self, name: &str) -> bool {
        self.state.lock().clients.iter().any(|c| c.name == name)
    }

    fn remove_client(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let Some(index) = state.clients.iter().position(|c| c.name == name) else {
            return false;
        };
        let removed = state.clients.remove(index);
        state.resources.retain(|(id, _), _| *id != removed.id);
        true
    }

    fn emit(&self, event: JournalEvent) {
        if let Some(sink) = self.sink.lock().as_ref() {
            sink.record(event);
        }
    }

    fn dispatch(&self, operation: DispatchedOperation) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        if state.fail_dispatch {
            return Err(EngineError::Unreachable(format!("client {}", operation.client)));
        }
        if !state.clients.iter().any(|c| c.id == operation.client) {
            return Err(EngineError::UnknownClient(operation.client));
        }

        debug!(
            client = operation.client,
            kind = %operation.kind,
            uri = %operation.uri,
            "Mock engine accepted operation"
        );

        if !state.auto_complete {
            state.dispatched.push_back(operation);
            return Ok(());
        }

        let (status, payload) = simulate(&mut state.resources, &operation);
        deliver_later(operation.handle, status, payload);
        Ok(())
    }
}

/// Apply an operation to the simulated resource store
fn simulate(
    resources: &mut HashMap<(ClientId, String), Bytes>,
    operation: &DispatchedOperation,
) -> (CoapStatus, Bytes) {
    let key = (operation.client, operation.uri.to_string());
    match operation.kind {
        OperationKind::Read => match resources.get(&key) {
            Some(value) => (CoapStatus::CONTENT, value.clone()),
            None => (CoapStatus::NOT_FOUND, Bytes::new()),
        },
        OperationKind::Write => {
            resources.insert(key, operation.payload.clone().unwrap_or_default());
            (CoapStatus::CHANGED, Bytes::new())
        }
        OperationKind::Execute => (CoapStatus::CHANGED, Bytes::new()),
    }
}

/// Complete from outside the dispatch call, which runs under the gateway lock
fn deliver_later(handle: CompletionHandle, status: CoapStatus, payload: Bytes) {
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(async move {
                handle.complete(status, payload);
            });
        }
        Err(_) => {
            std::thread::spawn(move || {
                handle.complete(status, payload);
            });
        }
    }
}

impl ProtocolEngine for MockEngine {
    fn find_client(&self, name: &str) -> Option<ClientInfo> {
        self.state
            .lock()
            .clients
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    fn list_clients(&self) -> Vec<ClientInfo> {
        self.state.lock().clients.clone()
    }

    fn read(
        &self,
        client: ClientId,
        uri: &ResourceUri,
        handle: CompletionHandle,
    ) -> Result<(), EngineError> {
        self.dispatch(DispatchedOperation {
            client,
            kind: OperationKind::Read,
            uri: *uri,
            format: None,
            payload: None,
            handle,
        })
    }

    fn write(
        &self,
        client: ClientId,
        uri: &ResourceUri,
        format: ContentFormat,
        payload: Bytes,
        handle: CompletionHandle,
    ) -> Result<(), EngineError> {
        self.dispatch(DispatchedOperation {
            client,
            kind: OperationKind::Write,
            uri: *uri,
            format: Some(format),
            payload: Some(payload),
            handle,
        })
    }

    fn execute(
        &self,
        client: ClientId,
        uri: &ResourceUri,
        format: ContentFormat,
        payload: Bytes,
        handle: CompletionHandle,
    ) -> Result<(), EngineError> {
        self.dispatch(DispatchedOperation {
            client,
            kind: OperationKind::Execute,
            uri: *uri,
            format: Some(format),
            payload: Some(payload),
            handle,
        })
    }
}
