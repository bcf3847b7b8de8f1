//! E2E tests for device operations and the credential database
//!
//! A live server is started on a local port and driven with reqwest:
//! 1. Submit an operation via /endpoints
//! 2. Complete it from the mock protocol engine
//! 3. Collect the result via /notifications/pull

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use lwgate_api::testing::{wait_for, TestServer};
use lwgate_api::{create_router, AppState, ReqwestSender};
use lwgate_core::mock::MockEngine;
use lwgate_core::{CoapStatus, CredentialStore, Gateway};
use reqwest::StatusCode;
use serde_json::{json, Value};

// =============================================================================
// Test Helpers
// =============================================================================

struct Harness {
    server: TestServer,
    engine: Arc<MockEngine>,
    gateway: Arc<Gateway>,
}

async fn start(devices: CredentialStore, path: Option<std::path::PathBuf>) -> Harness {
    let engine = Arc::new(MockEngine::new());
    let gateway = Arc::new(Gateway::new(engine.clone(), devices, path));
    engine.attach(gateway.events());

    let sender = Arc::new(ReqwestSender::new(Duration::from_secs(2)).unwrap());
    let router = create_router(AppState::new(gateway.clone(), sender));
    let server = TestServer::start(router).await.unwrap();

    Harness {
        server,
        engine,
        gateway,
    }
}

async fn pull(server: &TestServer) -> Value {
    let response = server
        .client
        .get(server.url("/notifications/pull"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.unwrap()
}

// =============================================================================
// Operations
// =============================================================================

#[tokio::test]
async fn test_read_then_pull() {
    let h = start(CredentialStore::new(), None).await;
    h.engine.register("sensor-1");
    pull(&h.server).await;

    let response = h
        .server
        .client
        .get(h.server.url("/endpoints/sensor-1/3/0/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: Value = response.json().await.unwrap();
    let id = body["async-response-id"].as_str().unwrap().to_string();

    h.engine
        .respond_next(CoapStatus::CONTENT, Bytes::from_static(b"21.5"))
        .unwrap();

    let batch = pull(&h.server).await;
    let responses = batch["async-responses"].as_array().unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], id.as_str());
    assert_eq!(responses[0]["status"], 200);
    assert!(responses[0]["timestamp"].as_i64().unwrap() > 0);
    let payload = BASE64
        .decode(responses[0]["payload"].as_str().unwrap())
        .unwrap();
    assert_eq!(payload, b"21.5");

    let second = pull(&h.server).await;
    assert_eq!(second["async-responses"], json!([]));
}

#[tokio::test]
async fn test_device_error_is_reported_as_completed_operation() {
    let h = start(CredentialStore::new(), None).await;
    h.engine.add_client("sensor-1");

    let response = h
        .server
        .client
        .put(h.server.url("/endpoints/sensor-1/3/0/13"))
        .header("content-type", "application/vnd.oma.lwm2m+json")
        .body(r#"{"e":[{"v":1}]}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let dispatched = h.engine.take_dispatched();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(
        dispatched[0].payload.as_deref(),
        Some(&br#"{"e":[{"v":1}]}"#[..])
    );
    dispatched[0]
        .handle
        .complete(CoapStatus::METHOD_NOT_ALLOWED, Bytes::new());

    let batch = pull(&h.server).await;
    assert_eq!(batch["async-responses"][0]["status"], 405);
    assert_eq!(batch["async-responses"][0]["payload"], "");
}

#[tokio::test]
async fn test_auto_completed_execute() {
    let h = start(CredentialStore::new(), None).await;
    h.engine.add_client("sensor-1");
    h.engine.set_auto_complete(true);

    let response = h
        .server
        .client
        .post(h.server.url("/endpoints/sensor-1/3/0/4"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let gateway = h.gateway.clone();
    assert!(
        wait_for(
            || {
                let gateway = gateway.clone();
                async move { gateway.pending_count() == 0 }
            },
            Duration::from_secs(2)
        )
        .await
    );

    let batch = pull(&h.server).await;
    assert_eq!(batch["async-responses"][0]["status"], 200);
}

// =============================================================================
// Device credentials
// =============================================================================

#[tokio::test]
async fn test_device_crud() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("devices.json");
    let h = start(CredentialStore::new(), Some(path.clone())).await;
    let client = &h.server.client;

    let response = client
        .post(h.server.url("/devices"))
        .json(&json!({"psk": "QQ==", "psk_id": "Qg=="}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["psk_id"], "Qg==");
    assert!(created.get("psk").is_none());
    let uuid = created["uuid"].as_str().unwrap().to_string();

    let list: Value = client
        .get(h.server.url("/devices"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list, json!([{"uuid": uuid, "psk_id": "Qg=="}]));

    let on_disk: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk[0]["psk"], "QQ==");

    let response = client
        .put(h.server.url(&format!("/devices/{}", uuid)))
        .json(&json!({"psk": "Qw==", "psk_id": "RA=="}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let single: Value = client
        .get(h.server.url(&format!("/devices/{}", uuid)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(single["psk_id"], "RA==");

    let response = client
        .delete(h.server.url(&format!("/devices/{}", uuid)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(CredentialStore::load(&path).unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_device_body() {
    let h = start(CredentialStore::new(), None).await;

    let response = h
        .server
        .client
        .post(h.server.url("/devices"))
        .json(&json!({"psk": "!!!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(h.gateway.list_devices().is_empty());
}

#[tokio::test]
async fn test_delete_unknown_device_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("devices.json");
    std::fs::write(
        &path,
        r#"[{"uuid":"known","psk":"QQ==","psk_id":"Qg=="}]"#,
    )
    .unwrap();
    let before = std::fs::read(&path).unwrap();

    let store = CredentialStore::load(&path).unwrap();
    let h = start(store, Some(path.clone())).await;

    let response = h
        .server
        .client
        .delete(h.server.url("/devices/unknown"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(h.gateway.list_devices().len(), 1);
    assert_eq!(std::fs::read(&path).unwrap(), before);
}
