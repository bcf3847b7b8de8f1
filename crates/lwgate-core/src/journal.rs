//! Notification journal and webhook subscription
//!
//! Events are appended per collection in arrival order and handed out in one
//! atomic drain, either to a REST pull or to the webhook pusher.

use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::error::{GatewayError, GatewayResult};
use crate::models::{CompletedOperation, DeviceNotification, JournalEvent};

/// Everything accumulated since the previous drain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationBatch {
    pub registrations: Vec<DeviceNotification>,
    #[serde(rename = "reg-updates")]
    pub updates: Vec<DeviceNotification>,
    #[serde(rename = "de-registrations")]
    pub deregistrations: Vec<DeviceNotification>,
    /// Drained with the rest but not part of the REST representation
    #[serde(skip)]
    pub timeouts: Vec<DeviceNotification>,
    #[serde(rename = "async-responses")]
    pub completed: Vec<CompletedOperation>,
}

impl NotificationBatch {
    /// Batch with all collections empty
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
            && self.updates.is_empty()
            && self.deregistrations.is_empty()
            && self.timeouts.is_empty()
            && self.completed.is_empty()
    }

    /// Whether any collection of the REST representation has entries
    pub fn has_deliverable(&self) -> bool {
        !(self.registrations.is_empty()
            && self.updates.is_empty()
            && self.deregistrations.is_empty()
            && self.completed.is_empty())
    }

    /// Number of entries across all collections
    pub fn len(&self) -> usize {
        self.registrations.len()
            + self.updates.len()
            + self.deregistrations.len()
            + self.timeouts.len()
            + self.completed.len()
    }
}

/// Append-ordered event collections
#[derive(Debug, Default)]
pub struct Journal {
    registrations: VecDeque<DeviceNotification>,
    updates: VecDeque<DeviceNotification>,
    deregistrations: VecDeque<DeviceNotification>,
    timeouts: VecDeque<DeviceNotification>,
    completed: VecDeque<CompletedOperation>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: JournalEvent) {
        match event {
            JournalEvent::Registered(n) => self.registrations.push_back(n),
            JournalEvent::Updated(n) => self.updates.push_back(n),
            JournalEvent::Deregistered(n) => self.deregistrations.push_back(n),
            JournalEvent::TimedOut(n) => self.timeouts.push_back(n),
            JournalEvent::Completed(c) => self.completed.push_back(c),
        }
    }

    /// Take every collection, leaving the journal empty
    pub fn drain_all(&mut self) -> NotificationBatch {
        NotificationBatch {
            registrations: self.registrations.drain(..).collect(),
            updates: self.updates.drain(..).collect(),
            deregistrations: self.deregistrations.drain(..).collect(),
            timeouts: self.timeouts.drain(..).collect(),
            completed: self.completed.drain(..).collect(),
        }
    }

    /// Put an undelivered batch back ahead of anything recorded since
    pub fn restore(&mut self, batch: NotificationBatch) {
        prepend(&mut self.registrations, batch.registrations);
        prepend(&mut self.updates, batch.updates);
        prepend(&mut self.deregistrations, batch.deregistrations);
        prepend(&mut self.timeouts, batch.timeouts);
        prepend(&mut self.completed, batch.completed);
    }

    pub fn is_empty(&self) -> bool {
        self.timeouts.is_empty() && !self.has_deliverable()
    }

    /// Whether a drain would produce anything visible in the REST representation
    pub fn has_deliverable(&self) -> bool {
        !(self.registrations.is_empty()
            && self.updates.is_empty()
            && self.deregistrations.is_empty()
            && self.completed.is_empty())
    }
}

fn prepend<T>(queue: &mut VecDeque<T>, items: Vec<T>) {
    for item in items.into_iter().rev() {
        queue.push_front(item);
    }
}

/// Webhook target for journal delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackSubscription {
    pub url: String,
    /// Header names are lower-cased
    pub headers: BTreeMap<String, String>,
}

impl CallbackSubscription {
    /// Parse a `{"url": .., "headers": {..}}` request body.
    ///
    /// The object must hold exactly these two keys; every header value must
    /// be a string. Header names are folded to lower case, and a later
    /// duplicate replaces an earlier one.
    pub fn from_json(value: &Value) -> GatewayResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| GatewayError::BadRequest("callback must be a JSON object".into()))?;

        if object.len() != 2 {
            return Err(GatewayError::BadRequest(
                "callback must contain exactly 'url' and 'headers'".into(),
            ));
        }

        let url = object
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::BadRequest("'url' must be a string".into()))?;
        let parsed = Url::parse(url)
            .map_err(|e| GatewayError::BadRequest(format!("invalid callback url: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GatewayError::BadRequest(format!(
                "unsupported callback url scheme '{}'",
                parsed.scheme()
            )));
        }

        let raw_headers = object
            .get("headers")
            .and_then(Value::as_object)
            .ok_or_else(|| GatewayError::BadRequest("'headers' must be an object".into()))?;

        let mut headers = BTreeMap::new();
        for (name, value) in raw_headers {
            let value = value.as_str().ok_or_else(|| {
                GatewayError::BadRequest(format!("header '{}' must be a string", name))
            })?;
            headers.insert(name.to_ascii_lowercase(), value.to_string());
        }

        Ok(Self {
            url: url.to_string(),
            headers,
        })
    }
}

/// Errors delivering a batch to a webhook
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The request never left the gateway; the batch can be sent again
    #[error("request not sent: {0}")]
    NotSent(String),

    /// The request may have reached the callback before failing
    #[error("transport error: {0}")]
    Transport(String),

    #[error("callback answered with status {0}")]
    Rejected(u16),
}

/// Outbound HTTP side of the webhook
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// PUT `batch` to the subscription, returning the HTTP status.
    ///
    /// Only transport failures are errors; any HTTP status is returned as-is.
    /// Failures known to happen before anything was written to the peer are
    /// reported as [`DeliveryError::NotSent`].
    async fn send(
        &self,
        subscription: &CallbackSubscription,
        batch: &NotificationBatch,
    ) -> Result<u16, DeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CorrelationId;
    use bytes::Bytes;
    use serde_json::json;

    fn completed(id: &str) -> CompletedOperation {
        CompletedOperation {
            timestamp: 10,
            id: CorrelationId::from(id),
            status: 200,
            payload: Bytes::from_static(b"ok"),
        }
    }

    #[test]
    fn test_drain_keeps_order_and_empties() {
        let mut journal = Journal::new();
        journal.record(JournalEvent::registered("a"));
        journal.record(JournalEvent::registered("b"));
        journal.record(JournalEvent::updated("a"));
        journal.record(JournalEvent::Completed(completed("1#1#1#1")));

        let batch = journal.drain_all();
        assert_eq!(
            batch.registrations,
            vec![DeviceNotification::new("a"), DeviceNotification::new("b")]
        );
        assert_eq!(batch.updates.len(), 1);
        assert_eq!(batch.completed.len(), 1);
        assert!(journal.is_empty());

        let second = journal.drain_all();
        assert!(second.is_empty());
    }

    #[test]
    fn test_no_deduplication() {
        let mut journal = Journal::new();
        journal.record(JournalEvent::deregistered("a"));
        journal.record(JournalEvent::deregistered("a"));
        assert_eq!(journal.drain_all().deregistrations.len(), 2);
    }

    #[test]
    fn test_batch_json_omits_timeouts() {
        let mut journal = Journal::new();
        journal.record(JournalEvent::timed_out("slow"));
        journal.record(JournalEvent::registered("a"));

        let batch = journal.drain_all();
        assert_eq!(batch.timeouts.len(), 1);
        assert_eq!(
            serde_json::to_value(&batch).unwrap(),
            json!({
                "registrations": [{"name": "a"}],
                "reg-updates": [],
                "de-registrations": [],
                "async-responses": []
            })
        );
    }

    #[test]
    fn test_timeouts_alone_are_not_deliverable() {
        let mut journal = Journal::new();
        journal.record(JournalEvent::timed_out("slow"));
        assert!(!journal.is_empty());
        assert!(!journal.has_deliverable());

        journal.record(JournalEvent::Completed(completed("2#2#2#2")));
        assert!(journal.has_deliverable());

        let batch = journal.drain_all();
        assert!(batch.has_deliverable());
        assert_eq!(batch.timeouts.len(), 1);
    }

    #[test]
    fn test_empty_batch_json() {
        assert_eq!(
            serde_json::to_value(NotificationBatch::empty()).unwrap(),
            json!({
                "registrations": [],
                "reg-updates": [],
                "de-registrations": [],
                "async-responses": []
            })
        );
    }

    #[test]
    fn test_restore_goes_before_newer_events() {
        let mut journal = Journal::new();
        journal.record(JournalEvent::registered("old-1"));
        journal.record(JournalEvent::registered("old-2"));
        let batch = journal.drain_all();

        journal.record(JournalEvent::registered("new"));
        journal.restore(batch);

        let names: Vec<String> = journal
            .drain_all()
            .registrations
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, vec!["old-1", "old-2", "new"]);
    }

    #[test]
    fn test_subscription_parsing() {
        let sub = CallbackSubscription::from_json(&json!({
            "url": "http://127.0.0.1:9999/hook",
            "headers": {"Authorization": "Bearer x", "X-Trace": "1"}
        }))
        .unwrap();

        assert_eq!(sub.url, "http://127.0.0.1:9999/hook");
        assert_eq!(sub.headers.get("authorization").unwrap(), "Bearer x");
        assert_eq!(sub.headers.get("x-trace").unwrap(), "1");
    }

    #[test]
    fn test_subscription_duplicate_header_later_wins() {
        let body = r#"{"url":"http://h/x","headers":{"A":"1","a":"2"}}"#;
        let value: Value = serde_json::from_str(body).unwrap();
        let sub = CallbackSubscription::from_json(&value).unwrap();
        assert_eq!(sub.headers.len(), 1);
        assert_eq!(sub.headers.get("a").unwrap(), "2");
    }

    #[test]
    fn test_subscription_rejects_malformed_bodies() {
        let cases = [
            json!([]),
            json!({"url": "http://h/x"}),
            json!({"url": "http://h/x", "headers": {}, "extra": 1}),
            json!({"url": 5, "headers": {}}),
            json!({"url": "not a url", "headers": {}}),
            json!({"url": "ftp://h/x", "headers": {}}),
            json!({"url": "http://h/x", "headers": []}),
            json!({"url": "http://h/x", "headers": {"a": 1}}),
            json!({"uri": "http://h/x", "headers": {}}),
        ];

        for case in cases {
            let result = CallbackSubscription::from_json(&case);
            assert!(
                matches!(result, Err(GatewayError::BadRequest(_))),
                "accepted {}",
                case
            );
        }
    }
}
