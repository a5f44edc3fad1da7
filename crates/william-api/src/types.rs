// Wire messages for the admin and public services (Connect JSON mapping).
//
// Field names are lowerCamelCase. Default-valued fields may be omitted by
// the server, so every message tolerates missing fields. 64-bit integers
// arrive as JSON strings under the proto3 mapping; `int64` accepts both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Accept an integer encoded either as a JSON number or a decimal string.
fn int64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) if s.is_empty() => Ok(0),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Empty request/response message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

// ── Admin: interfaces ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminInterface {
    pub id: String,
    pub name: String,
    pub address: String,
    pub listen_port: u32,
    pub mtu: u32,
    pub endpoint: String,
    pub public_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterfaceRequest {
    pub name: String,
    pub address: String,
    pub listen_port: u32,
    pub mtu: u32,
    pub endpoint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInterfaceRequest {
    pub id: String,
    pub name: String,
    pub address: String,
    pub listen_port: u32,
    pub mtu: u32,
    pub endpoint: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct InterfaceResponse {
    pub interface: AdminInterface,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListInterfacesResponse {
    pub interfaces: Vec<AdminInterface>,
}

// ── Admin: routes ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterfaceRoute {
    pub interface_id: String,
    pub cidr: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeerRoute {
    pub peer_id: String,
    pub cidr: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListInterfaceRoutesResponse {
    pub routes: Vec<InterfaceRoute>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListPeerRoutesResponse {
    pub routes: Vec<PeerRoute>,
}

// ── Admin: peers ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminPeer {
    pub peer_id: String,
    pub email: String,
    pub interface_id: String,
    pub allowed_ip: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListPeersResponse {
    pub peers: Vec<AdminPeer>,
}

// ── Admin: allowed emails / configs / firewall ───────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllowedEmail {
    pub interface_id: String,
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListAllowedEmailsResponse {
    pub emails: Vec<AllowedEmail>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireguardConfig {
    pub interface_id: String,
    pub config: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListWireguardConfigsResponse {
    pub configs: Vec<WireguardConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FirewallRulesResponse {
    pub rules: String,
}

// ── Telemetry ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeerStat {
    pub peer_id: String,
    pub interface_id: String,
    #[serde(deserialize_with = "int64")]
    pub rx_bytes: i64,
    #[serde(deserialize_with = "int64")]
    pub tx_bytes: i64,
    /// Unix seconds; `0` means no handshake yet.
    #[serde(deserialize_with = "int64")]
    pub last_handshake_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListPeerStatsResponse {
    pub stats: Vec<PeerStat>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeerStatus {
    pub peer_id: String,
    pub interface_id: String,
    pub interface_name: String,
    #[serde(deserialize_with = "int64")]
    pub rx_bytes: i64,
    #[serde(deserialize_with = "int64")]
    pub tx_bytes: i64,
    #[serde(deserialize_with = "int64")]
    pub last_handshake_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListPeerStatusesResponse {
    pub statuses: Vec<PeerStatus>,
}

// ── Public service ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireguardInterface {
    pub id: String,
    pub name: String,
    pub address: String,
    pub listen_port: u32,
    pub mtu: u32,
    pub public_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListWireguardInterfacesResponse {
    pub interfaces: Vec<WireguardInterface>,
}

/// The caller's own peer: identifier plus rendered client config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeerConfig {
    pub peer_id: String,
    pub peer_config: String,
}
