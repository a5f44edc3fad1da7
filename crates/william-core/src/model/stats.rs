// ── Peer telemetry ──
//
// Ephemeral counters refreshed on a fixed interval. A handshake time of
// `None` means the peer never completed a handshake.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A handshake within this window counts as "connected" in the user console.
pub const RECENT_HANDSHAKE_SECS: i64 = 600;

/// Admin view of one peer's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeerStat {
    pub peer_id: String,
    pub interface_id: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub last_handshake: Option<DateTime<Utc>>,
}

/// End-user view of their peer's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeerStatus {
    pub peer_id: String,
    pub interface_id: String,
    pub interface_name: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub last_handshake: Option<DateTime<Utc>>,
}

impl PeerStatus {
    /// Whether the last handshake happened within [`RECENT_HANDSHAKE_SECS`] of `now`.
    pub fn has_recent_handshake(&self, now: DateTime<Utc>) -> bool {
        self.last_handshake
            .is_some_and(|at| (now - at).num_seconds() <= RECENT_HANDSHAKE_SECS)
    }

    pub fn summary(&self, now: DateTime<Utc>) -> TrafficSummary {
        TrafficSummary {
            label: format!(
                "↑:{} / ↓:{}",
                format_bytes(self.tx_bytes),
                format_bytes(self.rx_bytes)
            ),
            recent_handshake: self.has_recent_handshake(now),
        }
    }
}

/// One-line connection summary for the user console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficSummary {
    /// `↑:<tx> / ↓:<rx>`.
    pub label: String,
    pub recent_handshake: bool,
}

/// How long ago a peer last completed a handshake, bucketed for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HandshakeAge {
    Never,
    Seconds(i64),
    Minutes(i64),
    Hours(i64),
}

impl HandshakeAge {
    pub fn since(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(at) = at else {
            return Self::Never;
        };
        let diff = (now - at).num_seconds().max(0);
        if diff < 60 {
            Self::Seconds(diff)
        } else if diff < 3600 {
            Self::Minutes(diff / 60)
        } else {
            Self::Hours(diff / 3600)
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::Never => "never".into(),
            Self::Seconds(s) => format!("{s}s ago"),
            Self::Minutes(m) => format!("{m}m ago"),
            Self::Hours(h) => format!("{h}h ago"),
        }
    }
}

/// Format a byte count with 1024-based units (`B`, `KB`, `MB`, `GB`, `TB`).
///
/// Values of 10 or more, and plain bytes, are shown without decimals.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".into();
    }

    let mut value = bytes as f64;
    let mut index = 0;
    while value >= 1024.0 && index < UNITS.len() - 1 {
        value /= 1024.0;
        index += 1;
    }

    if value >= 10.0 || index == 0 {
        format!("{value:.0} {}", UNITS[index])
    } else {
        format!("{value:.1} {}", UNITS[index])
    }
}
