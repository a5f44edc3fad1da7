//! Integration tests for the `william` CLI binary.
//!
//! Argument parsing, help output and shell completions run without any
//! service; the rest talk to a wiremock stand-in for the admin service.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `william` binary with env isolation.
///
/// Clears all `WILLIAM_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn william_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("william");
    cmd.env("HOME", "/tmp/william-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/william-cli-test-nonexistent")
        .env_remove("WILLIAM_PROFILE")
        .env_remove("WILLIAM_EMAIL")
        .env_remove("WILLIAM_OUTPUT")
        .env_remove("WILLIAM_TIMEOUT")
        .env_remove("WILLIAM_ADMIN_API_BASE_URL")
        .env_remove("WILLIAM_API_BASE_URL");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn rpc(method_name: &str) -> String {
    format!("/api/admin.v1.WilliamAdminService/{method_name}")
}

async fn mock_rpc(server: &MockServer, method_name: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(rpc(method_name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Run the binary off the async runtime so wiremock keeps serving.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let admin_url = format!("{}/api", server.uri());
    let args: Vec<String> = args.iter().map(|a| (*a).to_owned()).collect();
    tokio::task::spawn_blocking(move || {
        william_cmd()
            .arg("--admin-url")
            .arg(admin_url)
            .args(args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = william_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    william_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("WireGuard")
            .and(predicate::str::contains("interfaces"))
            .and(predicate::str::contains("peers"))
            .and(predicate::str::contains("me")),
    );
}

#[test]
fn test_version_flag() {
    william_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("william"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    william_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    william_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    william_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = william_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let output = william_cmd()
        .args(["--output", "xml", "interfaces", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("xml"));
}

#[test]
fn test_me_without_email_is_usage_error() {
    let output = william_cmd()
        .args(["--user-url", "http://127.0.0.1:9", "me", "show"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("X-Email"));
}

#[test]
fn test_unknown_profile() {
    let output = william_cmd()
        .args(["--profile", "nope", "interfaces", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("nope"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path() {
    william_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_defaults() {
    william_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]").and(predicate::str::contains("timeout = 30")));
}

// ── Against a mock admin service ────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_interfaces_list_json() {
    let server = MockServer::start().await;
    mock_rpc(
        &server,
        "ListInterfaces",
        json!({"interfaces": [
            {"id": "wg0", "name": "office", "address": "10.0.0.1/24", "listenPort": 51820, "mtu": 1420},
            {"id": "wg1", "name": "lab"}
        ]}),
    )
    .await;

    let output = run_against(&server, &["-o", "json", "interfaces", "list"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "office");
    assert_eq!(items[1]["id"], "wg1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_peer_delete_requires_yes_without_tty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(rpc("DeletePeer")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let output = run_against(&server, &["peers", "delete", "pk1"]).await;
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_peer_delete_with_yes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(rpc("DeletePeer")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &["--yes", "peers", "delete", "pk1"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stats_plain_lists_peer_ids() {
    let server = MockServer::start().await;
    mock_rpc(
        &server,
        "ListPeerStats",
        json!({"stats": [
            {"peerId": "pk1", "interfaceId": "wg0", "rxBytes": "1024", "txBytes": "2048", "lastHandshakeAt": "0"},
            {"peerId": "pk2", "interfaceId": "wg0"}
        ]}),
    )
    .await;
    mock_rpc(&server, "ListPeers", json!({"peers": []})).await;
    mock_rpc(&server, "ListInterfaces", json!({"interfaces": [{"id": "wg0", "name": "office"}]})).await;

    let output = run_against(&server, &["-o", "plain", "stats"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "pk1\npk2");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rpc_error_maps_to_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(rpc("ListInterfaces")))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({"code": "permission_denied", "message": "admins only"})),
        )
        .mount(&server)
        .await;

    let output = run_against(&server, &["interfaces", "list"]).await;
    assert_eq!(output.status.code(), Some(5));
}
