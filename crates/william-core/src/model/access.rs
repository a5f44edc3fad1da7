use chrono::{DateTime, Utc};
use serde::Serialize;

/// An email permitted to create a peer on an interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllowedEmail {
    pub interface_id: String,
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Server-rendered WireGuard configuration for one interface. Read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WireguardConfig {
    pub interface_id: String,
    pub config: String,
}
