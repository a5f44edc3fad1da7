use chrono::{DateTime, Utc};
use serde::Serialize;

/// An allowed route, owned by either an interface or a peer.
///
/// Identity is `(owner_id, cidr)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Route {
    pub owner_id: String,
    pub cidr: String,
    pub created_at: Option<DateTime<Utc>>,
}
