//! Integration tests for resolution against an HTTP Nailgun.
//!
//! A wiremock server plays Nailgun; the real `HttpClusterApi` talks to it.

use std::sync::Arc;
use std::time::Duration;

use fuel_config::client::{paths, ClusterApi};
use fuel_config::{
    ApiError, ClusterMode, ConfigOrchestrator, ConfigurationState, HttpClusterApi,
    InventoryPolicy, MemoryProxySink, ResolveError, Step,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLUSTER_ID: u64 = 42;

async fn mount_json(server: &MockServer, api_path: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(api_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_nodes(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/nodes"))
        .and(query_param("clusters_id", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn nailgun(mode: &str, network: Value) -> MockServer {
    let server = MockServer::start().await;

    mount_json(&server, "/api/clusters/42", json!({"id": 42, "mode": mode})).await;
    mount_json(
        &server,
        "/api/clusters/42/attributes",
        json!({
            "editable": {
                "access": {
                    "tenant": {"value": "admin"},
                    "user": {"value": "ostf_admin"},
                    "password": {"value": "ostf_pass"},
                    "email": {"value": "admin@example.org"}
                }
            }
        }),
    )
    .await;
    mount_nodes(
        &server,
        json!([
            {
                "id": 1,
                "role": "controller",
                "ip": "10.0.0.2",
                "fqdn": "node-1.domain.tld",
                "network_data": [
                    {"name": "management", "ip": "192.168.0.2/24"},
                    {"name": "public", "ip": "10.0.0.5/24"}
                ]
            },
            {
                "id": 2,
                "role": "compute",
                "ip": "10.0.0.3",
                "fqdn": "node-2.domain.tld",
                "network_data": [{"name": "public", "ip": "10.0.0.6/24"}]
            },
            {
                "id": 3,
                "role": "controller",
                "ip": "10.0.0.4",
                "fqdn": "node-3.domain.tld",
                "network_data": [{"name": "public", "ip": "10.0.0.7/24"}]
            }
        ]),
    )
    .await;
    mount_json(&server, "/api/clusters/42/network_configuration/", network).await;

    server
}

fn orchestrator(server: &MockServer, sink: &MemoryProxySink) -> ConfigOrchestrator {
    let api = HttpClusterApi::new(&server.uri(), Some(Duration::from_secs(5))).unwrap();
    ConfigOrchestrator::new(
        Arc::new(api),
        Arc::new(sink.clone()),
        CLUSTER_ID,
        InventoryPolicy::Abort,
    )
}

#[tokio::test]
async fn test_ha_cluster_falls_back_to_ostf() {
    let server = nailgun("ha", json!({})).await;
    Mock::given(method("GET"))
        .and(path("/api/ostf/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "horizon_url": "http://10.0.0.9/",
            "keystone_url": "http://10.0.0.9:5000/"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sink = MemoryProxySink::new();
    let mut state = ConfigurationState::default();
    let report = orchestrator(&server, &sink).prepare(&mut state).await;

    assert!(report.is_complete(), "{:?}", report.failure());
    assert_eq!(state.mode, ClusterMode::Ha);
    assert_eq!(state.identity.url, "http://10.0.0.9/dashboard");
    assert_eq!(state.identity.uri, "http://10.0.0.9:5000/v2.0/");
    assert_eq!(state.identity.admin_username, "ostf_admin");
    assert_eq!(state.identity.admin_tenant_name, "admin");
    assert_eq!(state.identity.admin_password.expose(), "ostf_pass");
    assert_eq!(state.compute.controller_nodes, vec!["10.0.0.2", "10.0.0.4"]);
    assert_eq!(state.compute.public_ips, vec!["10.0.0.5", "10.0.0.7"]);
    assert_eq!(
        state.compute.controller_nodes_name,
        vec!["node-1.domain.tld", "node-3.domain.tld"]
    );
    assert_eq!(state.network.raw_data, Some(json!({})));
    assert_eq!(sink.installed().as_deref(), Some("http://10.0.0.2:8888"));
}

#[tokio::test]
async fn test_vip_cluster_never_calls_ostf() {
    let server = nailgun("ha", json!({"public_vip": "10.0.0.100"})).await;
    Mock::given(method("GET"))
        .and(path("/api/ostf/42"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let sink = MemoryProxySink::new();
    let mut state = ConfigurationState::default();
    let report = orchestrator(&server, &sink).prepare(&mut state).await;

    assert!(report.is_complete());
    assert_eq!(state.identity.url, "http://10.0.0.100/dashboard/");
    assert_eq!(state.identity.uri, "http://10.0.0.100:5000/v2.0/");
}

#[tokio::test]
async fn test_non_ha_cluster_uses_first_public_ip() {
    let server = nailgun("multinode", json!({"networks": []})).await;
    Mock::given(method("GET"))
        .and(path("/api/ostf/42"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let sink = MemoryProxySink::new();
    let mut state = ConfigurationState::default();
    let report = orchestrator(&server, &sink).prepare(&mut state).await;

    assert!(report.is_complete());
    assert_eq!(state.mode, ClusterMode::NonHa);
    assert_eq!(state.identity.url, "http://10.0.0.5/dashboard/");
    assert_eq!(state.identity.uri, "http://10.0.0.5:5000/v2.0/");
}

#[tokio::test]
async fn test_attributes_error_keeps_default_credentials() {
    let server = MockServer::start().await;
    mount_json(&server, "/api/clusters/42", json!({"mode": "ha"})).await;
    Mock::given(method("GET"))
        .and(path("/api/clusters/42/attributes"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let sink = MemoryProxySink::new();
    let mut state = ConfigurationState::default();
    let report = orchestrator(&server, &sink).prepare(&mut state).await;

    let (step, err) = report.failure().expect("credentials step should fail");
    assert_eq!(step, Step::Credentials);
    assert!(matches!(
        err,
        ResolveError::Api(ApiError::Status { status: 500, .. })
    ));
    assert_eq!(state.identity.admin_username, "admin");
    assert_eq!(state.identity.url, "http://192.168.56.103/");
    assert!(sink.installed().is_none());
}

#[tokio::test]
async fn test_unreachable_nailgun_is_not_fatal() {
    // Nothing listens on port 1.
    let api = HttpClusterApi::new("http://127.0.0.1:1", Some(Duration::from_secs(2))).unwrap();
    let sink = MemoryProxySink::new();
    let mut state = ConfigurationState::default();

    let report = ConfigOrchestrator::new(
        Arc::new(api),
        Arc::new(sink.clone()),
        CLUSTER_ID,
        InventoryPolicy::Abort,
    )
    .prepare(&mut state)
    .await;

    let (step, err) = report.failure().unwrap();
    assert_eq!(step, Step::Mode);
    assert!(err.is_transport());
    assert_eq!(state.mode, ClusterMode::Unknown);
    assert_eq!(state.cluster_id, Some(CLUSTER_ID));
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/clusters/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let api = HttpClusterApi::new(&server.uri(), None).unwrap();
    let err = api.get_json(&paths::cluster(CLUSTER_ID)).await.unwrap_err();

    assert!(matches!(err, ApiError::Decode { .. }));
}
