//! Integration tests: envelope shapes, auth ordering, single-key and batch ops.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;
use zone_api::{server, AppState, Authorizer, MemoryBindings};
use zone_store::InMemoryKvStore;
use zone_types::{KeyPage, KvStore, KvStoreError};

/// Store whose every call fails.
struct BrokenStore;

#[async_trait::async_trait]
impl KvStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, KvStoreError> {
        Err(KvStoreError::Other("disk on fire".into()))
    }
    async fn put(&self, _key: &str, _value: &str) -> Result<(), KvStoreError> {
        Err(KvStoreError::Other("disk on fire".into()))
    }
    async fn delete(&self, _key: &str) -> Result<(), KvStoreError> {
        Err(KvStoreError::Other("disk on fire".into()))
    }
    async fn list(&self, _cursor: Option<&str>) -> Result<KeyPage, KvStoreError> {
        Err(KvStoreError::Other("disk on fire".into()))
    }
}

/// Store whose every call never completes.
struct HungStore;

#[async_trait::async_trait]
impl KvStore for HungStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, KvStoreError> {
        futures::future::pending().await
    }
    async fn put(&self, _key: &str, _value: &str) -> Result<(), KvStoreError> {
        futures::future::pending().await
    }
    async fn delete(&self, _key: &str) -> Result<(), KvStoreError> {
        futures::future::pending().await
    }
    async fn list(&self, _cursor: Option<&str>) -> Result<KeyPage, KvStoreError> {
        futures::future::pending().await
    }
}

async fn test_state() -> AppState {
    let registry = InMemoryKvStore::new();
    registry.put("t1", "active").await.unwrap();
    let mut bindings = MemoryBindings::new();
    bindings
        .bind("notes", Arc::new(InMemoryKvStore::new()))
        .unwrap();
    bindings
        .bind("paged", Arc::new(InMemoryKvStore::with_page_size(2)))
        .unwrap();
    bindings.bind("broken", Arc::new(BrokenStore)).unwrap();
    bindings.bind("hung", Arc::new(HungStore)).unwrap();
    AppState::new(Authorizer::new(Arc::new(registry)), bindings)
}

async fn test_app() -> axum::Router {
    server::router(Arc::new(test_state().await))
}

async fn call(app: &axum::Router, method: &str, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let j: Value = serde_json::from_slice(&bytes).unwrap();
    (status, j)
}

async fn call_json(app: &axum::Router, method: &str, path: &str, body: Value) -> (StatusCode, Value) {
    call(app, method, &format!("/v1/zone{}", path), body.to_string()).await
}

fn assert_error(j: &Value, code: &str) {
    assert_eq!(j["ok"], false);
    assert_eq!(j["status"], "ERROR");
    assert_eq!(j["decision"], "STOP");
    assert_eq!(j["content"], Value::Null);
    assert_eq!(j["error"]["code"], code);
    assert!(j["error"]["message"].is_string());
}

#[tokio::test]
async fn set_get_delete_get_scenario() {
    let app = test_app().await;

    let (status, j) = call_json(
        &app,
        "POST",
        "/set",
        json!({ "token": "t1", "memory": "notes", "key": "a", "value": "hello" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        j,
        json!({ "ok": true, "status": "SUCCESS", "decision": "CONTINUE", "content": { "value": "hello" } })
    );

    let (status, j) = call_json(
        &app,
        "POST",
        "/get",
        json!({ "token": "t1", "memory": "notes", "key": "a" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["status"], "SUCCESS");
    assert_eq!(j["content"], json!({ "value": "hello" }));

    let (status, j) = call_json(
        &app,
        "DELETE",
        "/delete",
        json!({ "token": "t1", "memory": "notes", "key": "a" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        j,
        json!({ "ok": true, "status": "SUCCESS", "decision": "CONTINUE", "content": null })
    );

    let (status, j) = call_json(
        &app,
        "POST",
        "/get",
        json!({ "token": "t1", "memory": "notes", "key": "a" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        j,
        json!({ "ok": true, "status": "NOOP", "decision": "CONTINUE", "content": { "value": null } })
    );
}

#[tokio::test]
async fn empty_string_value_is_stored_not_noop() {
    let app = test_app().await;
    let (status, j) = call_json(
        &app,
        "POST",
        "/set",
        json!({ "token": "t1", "memory": "notes", "key": "blank", "value": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["content"]["value"], "");

    let (_, j) = call_json(
        &app,
        "POST",
        "/get",
        json!({ "token": "t1", "memory": "notes", "key": "blank" }),
    )
    .await;
    assert_eq!(j["status"], "SUCCESS");
    assert_eq!(j["content"]["value"], "");
}

#[tokio::test]
async fn set_without_value_is_invalid_request() {
    let app = test_app().await;
    let (status, j) = call_json(
        &app,
        "POST",
        "/set",
        json!({ "token": "t1", "memory": "notes", "key": "a" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&j, "INVALID_REQUEST");
}

#[tokio::test]
async fn exists_tracks_set_and_delete() {
    let app = test_app().await;
    let body = json!({ "token": "t1", "memory": "notes", "key": "k" });

    let (_, j) = call_json(&app, "POST", "/exists", body.clone()).await;
    assert_eq!(j["status"], "SUCCESS");
    assert_eq!(j["content"], false);

    call_json(
        &app,
        "POST",
        "/set",
        json!({ "token": "t1", "memory": "notes", "key": "k", "value": "v" }),
    )
    .await;
    let (_, j) = call_json(&app, "POST", "/exists", body.clone()).await;
    assert_eq!(j["content"], true);

    call_json(&app, "DELETE", "/delete", body.clone()).await;
    let (_, j) = call_json(&app, "POST", "/exists", body).await;
    assert_eq!(j["content"], false);
}

#[tokio::test]
async fn missing_or_unregistered_token_is_401() {
    let app = test_app().await;
    for path in ["/get", "/set", "/exists", "/mget", "/mset", "/keys"] {
        let (status, j) =
            call_json(&app, "POST", path, json!({ "memory": "notes", "key": "a" })).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", path);
        assert_error(&j, "INVALID_TOKEN");

        let (status, j) = call_json(
            &app,
            "POST",
            path,
            json!({ "token": "nope", "memory": "notes", "key": "a" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", path);
        assert_error(&j, "INVALID_TOKEN");
    }
    for path in ["/delete", "/mdelete"] {
        let (status, j) = call_json(&app, "DELETE", path, json!({ "memory": "notes" })).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", path);
        assert_error(&j, "INVALID_TOKEN");
    }
}

#[tokio::test]
async fn unbound_namespace_is_404_but_only_after_auth() {
    let app = test_app().await;
    let (status, j) = call_json(
        &app,
        "POST",
        "/get",
        json!({ "token": "t1", "memory": "nowhere", "key": "a" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&j, "MEMORY_NOT_FOUND");

    let (status, j) = call_json(
        &app,
        "POST",
        "/get",
        json!({ "token": "bad", "memory": "nowhere", "key": "a" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&j, "INVALID_TOKEN");
}

#[tokio::test]
async fn reserved_binding_names_are_not_namespaces() {
    let app = test_app().await;
    for memory in ["API_TOKEN", "MEMORY_LIST"] {
        let (status, j) = call_json(
            &app,
            "POST",
            "/get",
            json!({ "token": "t1", "memory": memory, "key": "t1" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_error(&j, "MEMORY_NOT_FOUND");
    }
}

#[tokio::test]
async fn malformed_json_is_400_before_auth() {
    let app = test_app().await;
    let (status, j) = call(&app, "POST", "/v1/zone/get", "{\"token\": ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&j, "INVALID_REQUEST");

    let (status, j) = call(&app, "DELETE", "/v1/zone/mdelete", "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&j, "INVALID_REQUEST");

    let (status, j) = call(&app, "POST", "/v1/zone/keys", "[]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&j, "INVALID_REQUEST");
}

#[tokio::test]
async fn mget_maps_every_requested_key() {
    let app = test_app().await;
    call_json(
        &app,
        "POST",
        "/mset",
        json!({ "token": "t1", "memory": "notes", "key": { "a": "1", "b": "2" } }),
    )
    .await;

    let (status, j) = call_json(
        &app,
        "POST",
        "/mget",
        json!({ "token": "t1", "memory": "notes", "key": ["a", "b", "missing"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["status"], "SUCCESS");
    assert_eq!(j["content"], json!({ "a": "1", "b": "2", "missing": null }));
}

#[tokio::test]
async fn batch_containers_must_have_the_right_shape() {
    let app = test_app().await;
    let cases = [
        ("POST", "/mget", json!({ "token": "t1", "memory": "notes", "key": "a" })),
        ("POST", "/mset", json!({ "token": "t1", "memory": "notes", "key": ["a"] })),
        ("POST", "/mset", json!({ "token": "t1", "memory": "notes", "key": { "a": 1 } })),
        ("DELETE", "/mdelete", json!({ "token": "t1", "memory": "notes", "value": "a" })),
        ("DELETE", "/mdelete", json!({ "token": "t1", "memory": "notes", "key": ["a"] })),
    ];
    for (method, path, body) in cases {
        let (status, j) = call_json(&app, method, path, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", path);
        assert_error(&j, "INVALID_REQUEST");
    }
}

#[tokio::test]
async fn keys_returns_union_of_all_pages() {
    let app = test_app().await;
    let entries: serde_json::Map<String, Value> = (0..7)
        .map(|i| (format!("k{}", i), json!(format!("v{}", i))))
        .collect();
    let (status, _) = call_json(
        &app,
        "POST",
        "/mset",
        json!({ "token": "t1", "memory": "paged", "key": entries }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, j) = call_json(&app, "POST", "/keys", json!({ "token": "t1", "memory": "paged" })).await;
    assert_eq!(status, StatusCode::OK);
    let content = j["content"].as_object().unwrap();
    assert_eq!(content.len(), 7);
    for i in 0..7 {
        assert_eq!(content[&format!("k{}", i)], format!("v{}", i));
    }
}

#[tokio::test]
async fn keys_on_empty_namespace_is_empty_object() {
    let app = test_app().await;
    let (status, j) = call_json(&app, "POST", "/keys", json!({ "token": "t1", "memory": "notes" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["content"], json!({}));
}

#[tokio::test]
async fn mdelete_removes_listed_keys() {
    let app = test_app().await;
    call_json(
        &app,
        "POST",
        "/mset",
        json!({ "token": "t1", "memory": "notes", "key": { "a": "1", "b": "2", "c": "3" } }),
    )
    .await;
    let (status, j) = call_json(
        &app,
        "DELETE",
        "/mdelete",
        json!({ "token": "t1", "memory": "notes", "value": ["a", "c", "never"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["content"], Value::Null);

    let (_, j) = call_json(&app, "POST", "/keys", json!({ "token": "t1", "memory": "notes" })).await;
    assert_eq!(j["content"], json!({ "b": "2" }));
}

#[tokio::test]
async fn store_failure_is_internal_error() {
    let app = test_app().await;
    let (status, j) = call_json(
        &app,
        "POST",
        "/mget",
        json!({ "token": "t1", "memory": "broken", "key": ["a", "b"] }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&j, "INTERNAL_ERROR");

    let (status, j) = call_json(&app, "POST", "/keys", json!({ "token": "t1", "memory": "broken" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&j, "INTERNAL_ERROR");
}

#[tokio::test]
async fn hung_store_times_out_when_bounded() {
    let state = test_state()
        .await
        .with_store_timeout(Some(Duration::from_millis(50)));
    let app = server::router(Arc::new(state));
    let (status, j) = call_json(
        &app,
        "POST",
        "/get",
        json!({ "token": "t1", "memory": "hung", "key": "a" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&j, "INTERNAL_ERROR");
}

#[tokio::test]
async fn health_reports_version() {
    let app = test_app().await;
    let (status, j) = call(&app, "GET", "/", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j, json!({ "status": "ok", "version": "v1" }));
}

#[tokio::test]
async fn wrong_method_and_unknown_route_still_get_envelopes() {
    let app = test_app().await;

    let (status, j) = call_json(&app, "GET", "/get", json!({ "token": "t1" })).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_error(&j, "INVALID_REQUEST");

    let (status, j) = call_json(&app, "POST", "/mdelete", json!({ "token": "t1" })).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_error(&j, "INVALID_REQUEST");

    let (status, j) = call_json(&app, "POST", "/nope", json!({ "token": "t1" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&j, "INVALID_REQUEST");

    let (status, j) = call(&app, "GET", "/elsewhere", Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&j, "INVALID_REQUEST");
}
