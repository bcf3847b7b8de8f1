//! Webhook delivery over HTTP
//!
//! [`ReqwestSender`] performs callback probes and batch deliveries.
//! [`spawn_push_worker`] moves journal contents to the subscribed callback
//! whenever something new is recorded.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lwgate_core::{
    CallbackSubscription, DeliveryError, Gateway, NotificationBatch, NotificationSender,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default time allowed for a callback to answer
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(20);

/// [`NotificationSender`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestSender {
    client: Client,
}

impl ReqwestSender {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

fn header_map(subscription: &CallbackSubscription) -> Result<HeaderMap, DeliveryError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &subscription.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| DeliveryError::NotSent(format!("invalid header '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| DeliveryError::NotSent(format!("invalid header value: {}", e)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[async_trait]
impl NotificationSender for ReqwestSender {
    async fn send(
        &self,
        subscription: &CallbackSubscription,
        batch: &NotificationBatch,
    ) -> Result<u16, DeliveryError> {
        let headers = header_map(subscription)?;

        let response = self
            .client
            .put(&subscription.url)
            .headers(headers)
            .json(batch)
            .send()
            .await
            .map_err(delivery_error)?;

        Ok(response.status().as_u16())
    }
}

/// Classify a reqwest failure by whether the callback could have seen the request
fn delivery_error(err: reqwest::Error) -> DeliveryError {
    if err.is_connect() || err.is_builder() {
        DeliveryError::NotSent(err.to_string())
    } else {
        DeliveryError::Transport(err.to_string())
    }
}

/// Deliver everything currently in the journal.
///
/// Each batch is handed out at most once. Only a batch that never left the
/// gateway is put back at the front of the journal. A batch that may have
/// reached the callback (timeout, broken response, non-2xx status) is
/// dropped. Delivery stops at the first failure until the next wake-up.
pub async fn push_pending(gateway: &Gateway, sender: &dyn NotificationSender) -> usize {
    let mut delivered = 0;

    while let Some((subscription, batch)) = gateway.take_push_batch() {
        let result = match sender.send(&subscription, &batch).await {
            Ok(status) if (200..300).contains(&status) => Ok(status),
            Ok(status) => Err(DeliveryError::Rejected(status)),
            Err(e) => Err(e),
        };

        match result {
            Ok(status) => {
                debug!(url = %subscription.url, status, count = batch.len(), "Notifications delivered");
                delivered += batch.len();
            }
            Err(DeliveryError::NotSent(reason)) => {
                warn!(url = %subscription.url, error = %reason, "Notification delivery not attempted, keeping batch");
                gateway.restore_batch(batch);
                break;
            }
            Err(e) => {
                warn!(
                    url = %subscription.url,
                    error = %e,
                    dropped = batch.len(),
                    "Notification delivery failed after sending, dropping batch"
                );
                break;
            }
        }
    }

    delivered
}

/// Run webhook delivery in the background.
///
/// The worker wakes on every journal change and every `interval`, which also
/// paces retries after a failed delivery.
pub fn spawn_push_worker(
    gateway: Arc<Gateway>,
    sender: Arc<dyn NotificationSender>,
    interval: Duration,
) -> JoinHandle<()> {
    info!(interval_ms = interval.as_millis() as u64, "Starting notification push worker");

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = gateway.wait_for_events() => {}
                _ = tokio::time::sleep(interval) => {}
            }
            push_pending(&gateway, sender.as_ref()).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_header_map() {
        let mut headers = BTreeMap::new();
        headers.insert("authorization".to_string(), "Bearer abc".to_string());
        let subscription = CallbackSubscription {
            url: "http://127.0.0.1/hook".to_string(),
            headers,
        };

        let map = header_map(&subscription).unwrap();
        assert_eq!(map.get("Authorization").unwrap(), "Bearer abc");
    }

    #[test]
    fn test_invalid_header_is_not_sent() {
        let mut headers = BTreeMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        let subscription = CallbackSubscription {
            url: "http://127.0.0.1/hook".to_string(),
            headers,
        };

        assert!(matches!(
            header_map(&subscription),
            Err(DeliveryError::NotSent(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_not_sent() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sender = ReqwestSender::new(Duration::from_secs(2)).unwrap();
        let subscription = CallbackSubscription {
            url: format!("http://{}/hook", addr),
            headers: BTreeMap::new(),
        };

        let result = sender.send(&subscription, &NotificationBatch::empty()).await;
        assert!(matches!(result, Err(DeliveryError::NotSent(_))));
    }
}
