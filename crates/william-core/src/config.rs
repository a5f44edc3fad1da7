// ── Runtime service configuration ──
//
// Describes *where* the two services live and how the view-model polls
// them. Never touches disk: the CLI (via william-config) builds a
// `ServiceConfig` and hands it in.

use std::time::Duration;

use url::Url;

/// Connection and refresh settings for the admin and public services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Admin service base URL (may carry a path prefix such as `/api`).
    pub admin_url: Url,
    /// Public service base URL.
    pub user_url: Url,
    /// The caller's email, sent as `X-Email` on public-service calls.
    pub email: Option<String>,
    /// When set, per-user operations refuse to run without `email`.
    /// Disable when an upstream proxy injects the identity header.
    pub require_identity: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Firewall rules refresh period.
    pub firewall_poll: Duration,
    /// Admin peer stats refresh period.
    pub peer_stats_poll: Duration,
    /// End-user peer status refresh period.
    pub peer_status_poll: Duration,
}

impl ServiceConfig {
    pub const DEFAULT_FIREWALL_POLL: Duration = Duration::from_secs(60);
    pub const DEFAULT_PEER_STATS_POLL: Duration = Duration::from_secs(5);
    pub const DEFAULT_PEER_STATUS_POLL: Duration = Duration::from_secs(10);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(admin_url: Url, user_url: Url) -> Self {
        Self {
            admin_url,
            user_url,
            email: None,
            require_identity: true,
            timeout: Self::DEFAULT_TIMEOUT,
            firewall_poll: Self::DEFAULT_FIREWALL_POLL,
            peer_stats_poll: Self::DEFAULT_PEER_STATS_POLL,
            peer_status_poll: Self::DEFAULT_PEER_STATUS_POLL,
        }
    }

    /// The configured email, if non-empty.
    pub fn identity(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }

    pub(crate) fn transport(&self) -> william_api::TransportConfig {
        william_api::TransportConfig::default().with_timeout(self.timeout)
    }
}
