#![allow(clippy::unwrap_used)]
// Integration tests for `AdminClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use william_api::types::CreateInterfaceRequest;
use william_api::{AdminClient, AdminService, Code, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, AdminClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/api", server.uri())).unwrap();
    let client = AdminClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn rpc(method_name: &str) -> String {
    format!("/api/admin.v1.WilliamAdminService/{method_name}")
}

// ── Queries ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_interfaces() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("ListInterfaces")))
        .and(header("connect-protocol-version", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "interfaces": [
                {"id": "wg0", "name": "office", "address": "10.0.0.1/24",
                 "listenPort": 51820, "mtu": 1420, "endpoint": "vpn.example.com:51820"},
                {"id": "wg1", "name": "lab"}
            ]
        })))
        .mount(&server)
        .await;

    let interfaces = client.list_interfaces().await.unwrap();
    assert_eq!(interfaces.len(), 2);
    assert_eq!(interfaces[0].name, "office");
    assert_eq!(interfaces[0].listen_port, 51820);
    assert_eq!(interfaces[1].address, "");
}

#[tokio::test]
async fn test_list_peers_sends_interface_filter() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("ListPeers")))
        .and(body_json(json!({"interfaceId": "wg0"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "peers": [{"peerId": "pk1", "email": "a@example.com", "interfaceId": "wg0",
                       "allowedIp": "10.0.0.2/32", "createdAt": "2024-05-01T12:00:00Z"}]
        })))
        .mount(&server)
        .await;

    let peers = client.list_peers("wg0").await.unwrap();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].peer_id, "pk1");
    assert!(peers[0].created_at.is_some());
}

#[tokio::test]
async fn test_empty_list_response() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("ListPeerRoutes")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let routes = client.list_peer_routes("pk1").await.unwrap();
    assert!(routes.is_empty());
}

#[tokio::test]
async fn test_firewall_rules() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("GetFirewallRules")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"rules": "*filter\n-A FORWARD"})),
        )
        .mount(&server)
        .await;

    assert_eq!(client.get_firewall_rules().await.unwrap(), "*filter\n-A FORWARD");
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_interface() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("CreateInterface")))
        .and(body_json(json!({
            "name": "office", "address": "10.0.0.1/24", "listenPort": 51820,
            "mtu": 1420, "endpoint": "vpn.example.com:51820"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "interface": {"id": "wg0", "name": "office", "address": "10.0.0.1/24",
                          "listenPort": 51820, "mtu": 1420}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .create_interface(&CreateInterfaceRequest {
            name: "office".into(),
            address: "10.0.0.1/24".into(),
            listen_port: 51820,
            mtu: 1420,
            endpoint: "vpn.example.com:51820".into(),
        })
        .await
        .unwrap();
    assert_eq!(created.id, "wg0");
}

#[tokio::test]
async fn test_create_peer_route_with_empty_body_response() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("CreatePeerRoute")))
        .and(body_json(json!({"peerId": "p1", "cidr": "10.1.0.0/16"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.create_peer_route("p1", "10.1.0.0/16").await.unwrap();
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_already_exists_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("CreateAllowedEmail")))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "already_exists", "message": "email already allowed"
        })))
        .mount(&server)
        .await;

    let err = client
        .create_allowed_email("wg0", "a@example.com")
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(Code::AlreadyExists));
    assert!(!err.is_not_found());
    assert!(err.to_string().contains("email already allowed"));
}

#[tokio::test]
async fn test_not_found_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("DeleteInterface")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "not_found", "message": "interface not found"
        })))
        .mount(&server)
        .await;

    let err = client.delete_interface("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_plain_text_error_falls_back_to_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("ListPeerStats")))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = client.list_peer_stats().await.unwrap_err();
    assert!(
        matches!(&err, Error::Rpc { code: Code::Unavailable, message, status: 503 } if message == "upstream down"),
        "unexpected error: {err:?}"
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_success_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("ListInterfaces")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = client.list_interfaces().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
}
