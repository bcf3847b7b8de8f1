//! Operation descriptors and their completion records

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use super::{ContentFormat, ResourceUri};
use crate::engine::ClientInfo;

/// Device operation requested over REST
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Read,
    Write,
    Execute,
}

impl OperationKind {
    /// Upper-case tag used in log lines
    pub fn log_tag(self) -> &'static str {
        match self {
            OperationKind::Read => "READ",
            OperationKind::Write => "WRITE",
            OperationKind::Execute => "EXEC",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Read => write!(f, "read"),
            OperationKind::Write => write!(f, "write"),
            OperationKind::Execute => write!(f, "execute"),
        }
    }
}

/// Opaque identifier correlating a REST request with its device reply.
///
/// Rendered as four decimal `u32` values joined by `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        let raw = Uuid::new_v4().as_u128();
        let words = [
            (raw >> 96) as u32,
            (raw >> 64) as u32,
            (raw >> 32) as u32,
            raw as u32,
        ];
        CorrelationId(format!(
            "{}#{}#{}#{}",
            words[0], words[1], words[2], words[3]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        CorrelationId(s.to_string())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully validated operation ready for dispatch
#[derive(Debug, Clone)]
pub struct OperationRequest {
    pub client: ClientInfo,
    pub kind: OperationKind,
    pub uri: ResourceUri,
    /// Present for write and execute
    pub format: Option<ContentFormat>,
    /// Present for write and execute
    pub payload: Option<Bytes>,
}

/// Operation dispatched to a device and awaiting its reply.
///
/// An operation is pending exactly as long as it is held in the pending set;
/// resolving it moves it out and turns it into a [`CompletedOperation`].
#[derive(Debug, Clone)]
pub struct PendingOperation {
    pub id: CorrelationId,
    pub client: ClientInfo,
    pub kind: OperationKind,
    pub uri: ResourceUri,
    pub format: Option<ContentFormat>,
    pub payload: Option<Bytes>,
}

impl PendingOperation {
    pub fn new(id: CorrelationId, request: OperationRequest) -> Self {
        Self {
            id,
            client: request.client,
            kind: request.kind,
            uri: request.uri,
            format: request.format,
            payload: request.payload,
        }
    }
}

/// Result of a resolved operation, waiting in the journal for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedOperation {
    /// Completion time, unix seconds
    pub timestamp: i64,
    pub id: CorrelationId,
    /// HTTP status mapped from the device response code
    pub status: u16,
    #[serde(serialize_with = "serialize_base64")]
    pub payload: Bytes,
}

fn serialize_base64<S: Serializer>(payload: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(payload))
}
