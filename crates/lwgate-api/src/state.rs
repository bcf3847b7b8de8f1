//! Application state for the gateway API

use std::sync::Arc;

use lwgate_core::{Gateway, NotificationSender};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    gateway: Arc<Gateway>,
    /// Used for callback liveness probes
    sender: Arc<dyn NotificationSender>,
}

impl AppState {
    pub fn new(gateway: Arc<Gateway>, sender: Arc<dyn NotificationSender>) -> Self {
        Self { gateway, sender }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Shared handle to the gateway (for background workers)
    pub fn gateway_arc(&self) -> Arc<Gateway> {
        self.gateway.clone()
    }

    pub fn sender(&self) -> &dyn NotificationSender {
        self.sender.as_ref()
    }

    pub fn sender_arc(&self) -> Arc<dyn NotificationSender> {
        self.sender.clone()
    }
}
