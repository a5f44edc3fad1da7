// ── Admin resource store ──
//
// One cache per admin resource kind, each fetching through the injected
// `AdminService`. Firewall rules and peer stats poll while subscribed.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, join_all};

use william_api::AdminService;

use super::{Invalidation, ResourceCache, ResourceKind, apply};
use crate::config::ServiceConfig;
use crate::error::CoreError;
use crate::model::{AllowedEmail, Interface, Peer, PeerStat, Route, WireguardConfig};

fn convert<W, M: From<W>>(items: Vec<W>) -> Vec<M> {
    items.into_iter().map(M::from).collect()
}

/// Caches for every resource the admin console reads.
pub struct AdminStore {
    interfaces: ResourceCache<Vec<Interface>>,
    interface_routes: ResourceCache<Vec<Route>>,
    peers: ResourceCache<Vec<Peer>>,
    peer_routes: ResourceCache<Vec<Route>>,
    allowed_emails: ResourceCache<Vec<AllowedEmail>>,
    wireguard_configs: ResourceCache<Vec<WireguardConfig>>,
    firewall_rules: ResourceCache<String>,
    peer_stats: ResourceCache<Vec<PeerStat>>,
}

impl AdminStore {
    pub fn new(api: Arc<dyn AdminService>, config: &ServiceConfig) -> Self {
        let a = Arc::clone(&api);
        let interfaces = ResourceCache::new(ResourceKind::Interfaces, None, move |_key| {
            let api = Arc::clone(&a);
            async move { Ok::<_, CoreError>(convert(api.list_interfaces().await?)) }
        });

        let a = Arc::clone(&api);
        let interface_routes = ResourceCache::new(ResourceKind::InterfaceRoutes, None, move |id| {
            let api = Arc::clone(&a);
            async move { Ok::<_, CoreError>(convert(api.list_interface_routes(&id).await?)) }
        });

        let a = Arc::clone(&api);
        let peers = ResourceCache::new(ResourceKind::Peers, None, move |filter| {
            let api = Arc::clone(&a);
            async move { Ok::<_, CoreError>(convert(api.list_peers(&filter).await?)) }
        });

        let a = Arc::clone(&api);
        let peer_routes = ResourceCache::new(ResourceKind::PeerRoutes, None, move |peer_id| {
            let api = Arc::clone(&a);
            async move { Ok::<_, CoreError>(convert(api.list_peer_routes(&peer_id).await?)) }
        });

        let a = Arc::clone(&api);
        let allowed_emails = ResourceCache::new(ResourceKind::AllowedEmails, None, move |id| {
            let api = Arc::clone(&a);
            async move { Ok::<_, CoreError>(convert(api.list_allowed_emails(&id).await?)) }
        });

        let a = Arc::clone(&api);
        let wireguard_configs = ResourceCache::new(ResourceKind::WireguardConfigs, None, move |id| {
            let api = Arc::clone(&a);
            async move { Ok::<_, CoreError>(convert(api.list_wireguard_configs(&id).await?)) }
        });

        let a = Arc::clone(&api);
        let firewall_rules = ResourceCache::new(
            ResourceKind::FirewallRules,
            Some(config.firewall_poll),
            move |_key| {
                let api = Arc::clone(&a);
                async move { Ok::<_, CoreError>(api.get_firewall_rules().await?) }
            },
        );

        let a = api;
        let peer_stats = ResourceCache::new(
            ResourceKind::PeerStats,
            Some(config.peer_stats_poll),
            move |_key| {
                let api = Arc::clone(&a);
                async move { Ok::<_, CoreError>(convert(api.list_peer_stats().await?)) }
            },
        );

        Self {
            interfaces,
            interface_routes,
            peers,
            peer_routes,
            allowed_emails,
            wireguard_configs,
            firewall_rules,
            peer_stats,
        }
    }

    // ── Cache accessors ──────────────────────────────────────────────

    pub fn interfaces(&self) -> &ResourceCache<Vec<Interface>> {
        &self.interfaces
    }

    pub fn interface_routes(&self) -> &ResourceCache<Vec<Route>> {
        &self.interface_routes
    }

    pub fn peers(&self) -> &ResourceCache<Vec<Peer>> {
        &self.peers
    }

    pub fn peer_routes(&self) -> &ResourceCache<Vec<Route>> {
        &self.peer_routes
    }

    pub fn allowed_emails(&self) -> &ResourceCache<Vec<AllowedEmail>> {
        &self.allowed_emails
    }

    pub fn wireguard_configs(&self) -> &ResourceCache<Vec<WireguardConfig>> {
        &self.wireguard_configs
    }

    pub fn firewall_rules(&self) -> &ResourceCache<String> {
        &self.firewall_rules
    }

    pub fn peer_stats(&self) -> &ResourceCache<Vec<PeerStat>> {
        &self.peer_stats
    }

    // ── Invalidation ─────────────────────────────────────────────────

    /// Apply mutation effects; all refetches run concurrently.
    pub async fn invalidate(&self, effects: &[Invalidation]) {
        let tasks: Vec<BoxFuture<'_, ()>> = effects
            .iter()
            .map(|effect| match effect.kind() {
                ResourceKind::Interfaces => apply(&self.interfaces, effect).boxed(),
                ResourceKind::InterfaceRoutes => apply(&self.interface_routes, effect).boxed(),
                ResourceKind::Peers => apply(&self.peers, effect).boxed(),
                ResourceKind::PeerRoutes => apply(&self.peer_routes, effect).boxed(),
                ResourceKind::AllowedEmails => apply(&self.allowed_emails, effect).boxed(),
                ResourceKind::WireguardConfigs => apply(&self.wireguard_configs, effect).boxed(),
                ResourceKind::FirewallRules => apply(&self.firewall_rules, effect).boxed(),
                ResourceKind::PeerStats => apply(&self.peer_stats, effect).boxed(),
                ResourceKind::UserInterfaces | ResourceKind::PeerStatuses => {
                    async {}.boxed()
                }
            })
            .collect();
        join_all(tasks).await;
    }
}
