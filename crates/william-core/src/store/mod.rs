// ── Resource store ──
//
// Read-through caches over the two services. Each store is an ordinary,
// injectable object holding one `ResourceCache` per resource kind.

mod admin;
mod cache;
mod subscription;
mod user;

use strum::Display;

pub use admin::AdminStore;
pub use cache::{Resource, ResourceCache};
pub(crate) use cache::lock;
pub use subscription::{ResourceStream, Subscription};
pub use user::UserStore;

/// Key used by kinds that are not keyed (one entry per store).
pub const GLOBAL_KEY: &str = "global";

/// Gate an identifier into a fetch key: empty means "do not fetch".
pub fn gate(id: &str) -> Option<&str> {
    (!id.is_empty()).then_some(id)
}

/// Every cached resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ResourceKind {
    Interfaces,
    InterfaceRoutes,
    Peers,
    PeerRoutes,
    AllowedEmails,
    WireguardConfigs,
    FirewallRules,
    PeerStats,
    UserInterfaces,
    PeerStatuses,
}

impl ResourceKind {
    /// Fetch key for `id` under this kind's keying rule.
    ///
    /// Unkeyed kinds ignore `id`. The peer list treats `""` as "all
    /// interfaces" and is never gated. Owner-keyed kinds are gated on an
    /// empty owner.
    pub fn key(self, id: &str) -> Option<&str> {
        match self {
            Self::Interfaces | Self::FirewallRules | Self::PeerStats => Some(GLOBAL_KEY),
            Self::Peers => Some(id),
            Self::InterfaceRoutes
            | Self::PeerRoutes
            | Self::AllowedEmails
            | Self::WireguardConfigs
            | Self::UserInterfaces
            | Self::PeerStatuses => gate(id),
        }
    }
}

/// A cache effect of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// Refetch `key` if cached; `None` refetches every cached key.
    Revalidate {
        kind: ResourceKind,
        key: Option<String>,
    },
    /// The owner of `key` is gone: reset it to empty.
    Discard { kind: ResourceKind, key: String },
}

impl Invalidation {
    pub fn all(kind: ResourceKind) -> Self {
        Self::Revalidate { kind, key: None }
    }

    pub fn key(kind: ResourceKind, key: impl Into<String>) -> Self {
        Self::Revalidate {
            kind,
            key: Some(key.into()),
        }
    }

    pub fn discard(kind: ResourceKind, key: impl Into<String>) -> Self {
        Self::Discard {
            kind,
            key: key.into(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Revalidate { kind, .. } | Self::Discard { kind, .. } => *kind,
        }
    }
}

/// Apply one invalidation to a cache of the matching kind.
pub(crate) async fn apply<T: Default + Send + Sync + 'static>(
    cache: &ResourceCache<T>,
    invalidation: &Invalidation,
) {
    match invalidation {
        Invalidation::Revalidate { key: None, .. } => cache.revalidate_all().await,
        Invalidation::Revalidate { key: Some(key), .. } => {
            cache.revalidate_existing(key).await;
        }
        Invalidation::Discard { key, .. } => cache.discard(key),
    }
}
