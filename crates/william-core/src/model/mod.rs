// ── Domain model ──
//
// Canonical view-model types. Wire messages from `william_api::types`
// are converted into these in `crate::convert`.

pub mod access;
pub mod interface;
pub mod peer;
pub mod route;
pub mod stats;

pub use access::{AllowedEmail, WireguardConfig};
pub use interface::{Interface, InterfaceSpec};
pub use peer::{Peer, PeerConfig};
pub use route::Route;
pub use stats::{HandshakeAge, PeerStat, PeerStatus, RECENT_HANDSHAKE_SECS, TrafficSummary, format_bytes};
