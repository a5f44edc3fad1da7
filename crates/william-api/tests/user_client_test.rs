#![allow(clippy::unwrap_used)]
// Integration tests for `UserClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use william_api::{Error, UserClient, UserService};

async fn setup() -> (MockServer, UserClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = UserClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn rpc(method_name: &str) -> String {
    format!("/server.v1.WilliamService/{method_name}")
}

#[tokio::test]
async fn test_identity_header_is_sent() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("ListWireguardInterfaces")))
        .and(header("x-email", "alice@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "interfaces": [{"id": "wg0", "name": "office"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let interfaces = client
        .list_wireguard_interfaces(Some("alice@example.com"))
        .await
        .unwrap();
    assert_eq!(interfaces[0].id, "wg0");
}

#[tokio::test]
async fn test_identity_header_omitted_without_email() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("ListPeerStatuses")))
        .respond_with(|req: &Request| {
            if req.headers.contains_key("x-email") {
                ResponseTemplate::new(400)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"statuses": []}))
            }
        })
        .mount(&server)
        .await;

    assert!(client.list_peer_statuses(None).await.unwrap().is_empty());
    assert!(client.list_peer_statuses(Some("")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_my_peer_by_interface() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("GetMyWireguardPeerByInterface")))
        .and(body_json(json!({"interfaceId": "wg0"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "peerId": "pk-alice", "peerConfig": "[Interface]\nPrivateKey = x"
        })))
        .mount(&server)
        .await;

    let peer = client
        .get_my_peer_by_interface(Some("alice@example.com"), "wg0")
        .await
        .unwrap();
    assert_eq!(peer.peer_id, "pk-alice");
    assert!(peer.peer_config.starts_with("[Interface]"));
}

#[tokio::test]
async fn test_get_my_peer_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("GetMyWireguardPeerByInterface")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "not_found", "message": "peer not found"
        })))
        .mount(&server)
        .await;

    let err = client
        .get_my_peer_by_interface(Some("alice@example.com"), "wg0")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_create_peer_sends_interface() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(rpc("CreateWireguardPeer")))
        .and(body_json(json!({"wireguardInterfaceId": "wg0"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "peerId": "pk-new", "peerConfig": "cfg"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let peer = client
        .create_peer(Some("bob@example.com"), "wg0")
        .await
        .unwrap();
    assert_eq!(peer.peer_id, "pk-new");
}

#[tokio::test]
async fn test_invalid_identity_is_rejected_locally() {
    let (_server, client) = setup().await;

    let err = client
        .delete_peer(Some("bad\nemail"), "pk")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidIdentity(_)));
}
