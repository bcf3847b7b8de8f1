//! lwgate-core - Core of the asynchronous device-management gateway
//!
//! The gateway turns synchronous REST calls into asynchronous
//! read/write/execute operations on constrained devices. This crate holds
//! the parts that share mutable state between HTTP request handlers and the
//! protocol engine:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Gateway                             │
//! │                 (one Mutex<CoreState> lock)                  │
//! │                                                              │
//! │  ┌────────────┐   ┌──────────────────┐   ┌───────────────┐  │
//! │  │ translate  │──▶│ CorrelationEngine│──▶│ ProtocolEngine│  │
//! │  │ (HTTP→op)  │   │  (pending set)   │   │  (external)   │  │
//! │  └────────────┘   └────────▲─────────┘   └───────┬───────┘  │
//! │                            │ CompletionHandle    │          │
//! │                            └─────────────────────┘          │
//! │                            │                                 │
//! │                   ┌────────▼─────────┐   ┌───────────────┐  │
//! │                   │     Journal      │   │CredentialStore│  │
//! │                   │ (+ subscription) │   │ (lwgate-creds)│  │
//! │                   └──────────────────┘   └───────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The protocol engine itself (device registration, retransmission, codec)
//! is an external collaborator behind the [`ProtocolEngine`] trait;
//! [`mock::MockEngine`] is an in-process implementation used for demos and
//! tests.

pub mod correlation;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod journal;
pub mod mock;
pub mod models;
pub mod translate;

pub use correlation::{CompletionOutcome, CorrelationEngine};
pub use engine::{ClientId, ClientInfo, CompletionHandle, EngineError, EventSink, ProtocolEngine};
pub use error::{GatewayError, GatewayResult};
pub use gateway::Gateway;
pub use journal::{
    CallbackSubscription, DeliveryError, Journal, NotificationBatch, NotificationSender,
};
pub use models::*;
pub use translate::{translate, InboundRequest};

// Re-export the credential store for convenience
pub use lwgate_creds::{CredentialError, CredentialStore, DeviceCredential, PublicView};
