use chrono::{DateTime, Utc};
use serde::Serialize;

/// A peer as seen by the admin console.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Peer {
    /// The peer's public key.
    pub peer_id: String,
    /// Owner.
    pub email: String,
    pub interface_id: String,
    pub allowed_ip: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// The calling user's own peer: identifier plus rendered client config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeerConfig {
    pub peer_id: String,
    pub config: String,
}
