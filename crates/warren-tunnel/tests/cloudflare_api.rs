//! CloudflareClient tests against a local API double.
//!
//! The double records the order of remote calls so the multi-step
//! create sequence and the DNS-before-tunnel delete ordering are
//! observable.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use warren_tunnel::{CloudflareClient, ProviderConfig, ProviderError, TunnelProvider};

#[derive(Default)]
struct Behavior {
    fail_configure: bool,
    dns_delete_status: Option<u16>,
    tunnel_delete_status: Option<u16>,
}

struct FakeCloudflare {
    calls: Mutex<Vec<&'static str>>,
    tunnels_created: AtomicUsize,
    behavior: Behavior,
}

impl FakeCloudflare {
    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

fn ok(result: Value) -> Json<Value> {
    Json(json!({ "success": true, "errors": [], "result": result }))
}

async fn create_tunnel(State(state): State<Arc<FakeCloudflare>>) -> Json<Value> {
    state.record("create_tunnel");
    let n = state.tunnels_created.fetch_add(1, Ordering::SeqCst) + 1;
    ok(json!({ "id": format!("cf-tunnel-{n}"), "token": format!("cf-token-{n}") }))
}

async fn configure_ingress(
    State(state): State<Arc<FakeCloudflare>>,
    Path((_account, _id)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    state.record("configure_ingress");
    if state.behavior.fail_configure {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "errors": [{ "code": 1021, "message": "invalid ingress rule" }],
                "result": null,
            })),
        );
    }
    (StatusCode::OK, ok(json!({})))
}

async fn create_dns(State(state): State<Arc<FakeCloudflare>>) -> Json<Value> {
    state.record("create_dns");
    ok(json!({ "id": "cf-dns-1" }))
}

async fn delete_dns(
    State(state): State<Arc<FakeCloudflare>>,
    Path((_zone, _id)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    state.record("delete_dns");
    let status = state.behavior.dns_delete_status.unwrap_or(200);
    (StatusCode::from_u16(status).unwrap(), ok(json!({})))
}

async fn delete_connections(
    State(state): State<Arc<FakeCloudflare>>,
    Path((_account, _id)): Path<(String, String)>,
) -> Json<Value> {
    state.record("delete_connections");
    ok(json!({}))
}

async fn delete_tunnel(
    State(state): State<Arc<FakeCloudflare>>,
    Path((_account, _id)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    state.record("delete_tunnel");
    match state.behavior.tunnel_delete_status.unwrap_or(200) {
        200 => (StatusCode::OK, ok(json!({}))),
        404 => (StatusCode::NOT_FOUND, ok(json!(null))),
        status => (
            StatusCode::from_u16(status).unwrap(),
            Json(json!({
                "success": false,
                "errors": [{ "code": 1000, "message": "tunnel delete failed" }],
                "result": null,
            })),
        ),
    }
}

async fn connections(
    State(state): State<Arc<FakeCloudflare>>,
    Path((_account, _id)): Path<(String, String)>,
) -> Json<Value> {
    state.record("status");
    ok(json!([
        { "id": "conn-1", "colo_name": "SJC", "opened_at": "2024-01-01T00:00:00Z" }
    ]))
}

async fn serve(behavior: Behavior) -> (Arc<FakeCloudflare>, CloudflareClient) {
    let state = Arc::new(FakeCloudflare {
        calls: Mutex::new(Vec::new()),
        tunnels_created: AtomicUsize::new(0),
        behavior,
    });

    let app = Router::new()
        .route("/accounts/:account/cfd_tunnel", post(create_tunnel))
        .route(
            "/accounts/:account/cfd_tunnel/:id/configurations",
            put(configure_ingress),
        )
        .route(
            "/accounts/:account/cfd_tunnel/:id/connections",
            get(connections).delete(delete_connections),
        )
        .route("/accounts/:account/cfd_tunnel/:id", delete(delete_tunnel))
        .route("/zones/:zone/dns_records", post(create_dns))
        .route("/zones/:zone/dns_records/:id", delete(delete_dns))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = CloudflareClient::with_config(
        format!("http://{addr}"),
        ProviderConfig {
            api_token: "test-token".into(),
            account_id: "acct-1".into(),
            zone_id: "zone-1".into(),
            tunnel_domain: "tunnel.example.com".into(),
            engine_service: "http://engine:8080".into(),
            dashboard_service: "http://dashboard:3000".into(),
        },
    );
    (state, client)
}

#[tokio::test]
async fn create_runs_three_steps_in_order() {
    let (state, client) = serve(Behavior::default()).await;

    let endpoint = client.create_tunnel("acme-corp").await.unwrap();

    assert_eq!(endpoint.tunnel_id, "cf-tunnel-1");
    assert_eq!(endpoint.token, "cf-token-1");
    assert_eq!(endpoint.hostname, "acme-corp.tunnel.example.com");
    assert_eq!(endpoint.dns_record_id, "cf-dns-1");
    assert_eq!(
        state.calls(),
        vec!["create_tunnel", "configure_ingress", "create_dns"]
    );
}

#[tokio::test]
async fn create_aborts_on_step_failure_without_rollback() {
    let (state, client) = serve(Behavior {
        fail_configure: true,
        ..Default::default()
    })
    .await;

    let err = client.create_tunnel("acme-corp").await.unwrap_err();

    match err {
        ProviderError::Api {
            status,
            operation,
            message,
        } => {
            assert_eq!(status, 400);
            assert_eq!(operation, "configure ingress");
            assert_eq!(message, "invalid ingress rule");
        }
        other => panic!("expected Api error, got {other}"),
    }
    // No DNS record was attempted and nothing was rolled back.
    assert_eq!(state.calls(), vec!["create_tunnel", "configure_ingress"]);
}

#[tokio::test]
async fn delete_removes_dns_before_tunnel() {
    let (state, client) = serve(Behavior::default()).await;

    client.delete_tunnel("cf-tunnel-1", "cf-dns-1").await.unwrap();

    assert_eq!(
        state.calls(),
        vec!["delete_dns", "delete_connections", "delete_tunnel"]
    );
}

#[tokio::test]
async fn delete_tolerates_already_deleted_resources() {
    let (_, client) = serve(Behavior {
        dns_delete_status: Some(404),
        tunnel_delete_status: Some(404),
        ..Default::default()
    })
    .await;

    client.delete_tunnel("cf-tunnel-1", "cf-dns-1").await.unwrap();
}

#[tokio::test]
async fn delete_continues_past_failed_dns_step() {
    let (state, client) = serve(Behavior {
        dns_delete_status: Some(500),
        ..Default::default()
    })
    .await;

    client.delete_tunnel("cf-tunnel-1", "cf-dns-1").await.unwrap();

    assert_eq!(
        state.calls(),
        vec!["delete_dns", "delete_connections", "delete_tunnel"]
    );
}

#[tokio::test]
async fn delete_raises_only_on_final_step() {
    let (_, client) = serve(Behavior {
        tunnel_delete_status: Some(500),
        ..Default::default()
    })
    .await;

    let err = client.delete_tunnel("cf-tunnel-1", "cf-dns-1").await.unwrap_err();
    match err {
        ProviderError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 500);
            assert_eq!(message, "tunnel delete failed");
        }
        other => panic!("expected Api error, got {other}"),
    }
}

#[tokio::test]
async fn rotate_reuses_hostname_with_fresh_identifiers() {
    let (state, client) = serve(Behavior::default()).await;

    let first = client.create_tunnel("acme-corp").await.unwrap();
    let rotated = client
        .rotate_tunnel("acme-corp", &first.tunnel_id, &first.dns_record_id)
        .await
        .unwrap();

    assert_eq!(rotated.hostname, first.hostname);
    assert_ne!(rotated.tunnel_id, first.tunnel_id);
    assert_ne!(rotated.token, first.token);
    // Full teardown ran before the replacement was created.
    let calls = state.calls();
    let delete_pos = calls.iter().position(|c| *c == "delete_tunnel").unwrap();
    let recreate_pos = calls.iter().rposition(|c| *c == "create_tunnel").unwrap();
    assert!(delete_pos < recreate_pos);
}

#[tokio::test]
async fn status_reports_open_connections() {
    let (_, client) = serve(Behavior::default()).await;

    let status = client.tunnel_status("cf-tunnel-1").await.unwrap();
    assert!(status.is_connected());
    assert_eq!(status.connections.len(), 1);
    assert_eq!(status.connections[0].colo_name.as_deref(), Some("SJC"));
}
