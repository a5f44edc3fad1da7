// ── API-to-domain type conversions ──
//
// Bridges raw `william_api::types` messages into canonical
// `william_core::model` types. Counters are clamped to non-negative,
// ports saturate into `u16`, and a zero handshake time becomes `None`.

use chrono::{DateTime, Utc};

use william_api::types;

use crate::model::{
    AllowedEmail, Interface, InterfaceSpec, Peer, PeerConfig, PeerStat, PeerStatus, Route,
    WireguardConfig,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Epoch seconds to `DateTime<Utc>`; `0` (never) maps to `None`.
fn epoch_to_datetime(epoch: i64) -> Option<DateTime<Utc>> {
    (epoch > 0)
        .then(|| DateTime::from_timestamp(epoch, 0))
        .flatten()
}

fn counter(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or(0)
}

fn port(raw: u32) -> u16 {
    u16::try_from(raw).unwrap_or(u16::MAX)
}

// ── Interfaces ─────────────────────────────────────────────────────

impl From<types::AdminInterface> for Interface {
    fn from(w: types::AdminInterface) -> Self {
        Self {
            id: w.id,
            name: w.name,
            address: w.address,
            listen_port: port(w.listen_port),
            mtu: w.mtu,
            endpoint: w.endpoint,
            public_key: w.public_key,
        }
    }
}

impl From<types::WireguardInterface> for Interface {
    fn from(w: types::WireguardInterface) -> Self {
        Self {
            id: w.id,
            name: w.name,
            address: w.address,
            listen_port: port(w.listen_port),
            mtu: w.mtu,
            endpoint: String::new(),
            public_key: w.public_key,
        }
    }
}

impl From<&InterfaceSpec> for types::CreateInterfaceRequest {
    fn from(spec: &InterfaceSpec) -> Self {
        Self {
            name: spec.name.trim().to_owned(),
            address: spec.address.trim().to_owned(),
            listen_port: u32::from(spec.listen_port),
            mtu: spec.mtu,
            endpoint: spec.endpoint.trim().to_owned(),
        }
    }
}

pub(crate) fn update_request(id: &str, spec: &InterfaceSpec) -> types::UpdateInterfaceRequest {
    let create = types::CreateInterfaceRequest::from(spec);
    types::UpdateInterfaceRequest {
        id: id.to_owned(),
        name: create.name,
        address: create.address,
        listen_port: create.listen_port,
        mtu: create.mtu,
        endpoint: create.endpoint,
    }
}

// ── Peers ──────────────────────────────────────────────────────────

impl From<types::AdminPeer> for Peer {
    fn from(w: types::AdminPeer) -> Self {
        Self {
            peer_id: w.peer_id,
            email: w.email,
            interface_id: w.interface_id,
            allowed_ip: w.allowed_ip,
            created_at: w.created_at,
        }
    }
}

impl From<types::PeerConfig> for PeerConfig {
    fn from(w: types::PeerConfig) -> Self {
        Self {
            peer_id: w.peer_id,
            config: w.peer_config,
        }
    }
}

// ── Routes ─────────────────────────────────────────────────────────

impl From<types::InterfaceRoute> for Route {
    fn from(w: types::InterfaceRoute) -> Self {
        Self {
            owner_id: w.interface_id,
            cidr: w.cidr,
            created_at: w.created_at,
        }
    }
}

impl From<types::PeerRoute> for Route {
    fn from(w: types::PeerRoute) -> Self {
        Self {
            owner_id: w.peer_id,
            cidr: w.cidr,
            created_at: w.created_at,
        }
    }
}

// ── Access ─────────────────────────────────────────────────────────

impl From<types::AllowedEmail> for AllowedEmail {
    fn from(w: types::AllowedEmail) -> Self {
        Self {
            interface_id: w.interface_id,
            email: w.email,
            created_at: w.created_at,
        }
    }
}

impl From<types::WireguardConfig> for WireguardConfig {
    fn from(w: types::WireguardConfig) -> Self {
        Self {
            interface_id: w.interface_id,
            config: w.config,
        }
    }
}

// ── Telemetry ──────────────────────────────────────────────────────

impl From<types::PeerStat> for PeerStat {
    fn from(w: types::PeerStat) -> Self {
        Self {
            peer_id: w.peer_id,
            interface_id: w.interface_id,
            rx_bytes: counter(w.rx_bytes),
            tx_bytes: counter(w.tx_bytes),
            last_handshake: epoch_to_datetime(w.last_handshake_at),
        }
    }
}

impl From<types::PeerStatus> for PeerStatus {
    fn from(w: types::PeerStatus) -> Self {
        Self {
            peer_id: w.peer_id,
            interface_id: w.interface_id,
            interface_name: w.interface_name,
            rx_bytes: counter(w.rx_bytes),
            tx_bytes: counter(w.tx_bytes),
            last_handshake: epoch_to_datetime(w.last_handshake_at),
        }
    }
}
