// ── Status page ──
//
// Live peer stats (polled while subscribed) joined with the peer list
// and interface names.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::controller::AdminController;
use crate::model::{HandshakeAge, Interface, Peer, PeerStat, format_bytes};
use crate::store::{GLOBAL_KEY, Resource, Subscription};

/// One stat joined with its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerStatRow {
    pub peer_id: String,
    /// `None` when the peer is not in the peer list (yet).
    pub email: Option<String>,
    pub interface_id: String,
    /// Falls back to the interface id when the name is unknown.
    pub interface_name: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx: String,
    pub tx: String,
    pub handshake: HandshakeAge,
}

pub struct StatusView {
    controller: AdminController,
    stats: Subscription<Vec<PeerStat>>,
    _peers: Subscription<Vec<Peer>>,
    _interfaces: Subscription<Vec<Interface>>,
}

impl StatusView {
    pub fn new(controller: AdminController) -> Self {
        let store = controller.store();
        let stats = store.peer_stats().subscribe_for("");
        let peers = store.peers().subscribe_for("");
        let interfaces = store.interfaces().subscribe_for("");
        Self {
            controller,
            stats,
            _peers: peers,
            _interfaces: interfaces,
        }
    }

    /// Fetch stats, every peer and the interface list concurrently.
    pub async fn load(&self) -> Resource<Vec<PeerStat>> {
        let store = self.controller.store();
        let (stats, _, _) = tokio::join!(
            store.peer_stats().fetch(Some(GLOBAL_KEY)),
            store.peers().fetch(Some("")),
            store.interfaces().fetch(Some(GLOBAL_KEY)),
        );
        stats
    }

    /// A fresh handle on the polled stats, for observers that want every
    /// refresh.
    pub fn watch(&self) -> Subscription<Vec<PeerStat>> {
        self.controller.store().peer_stats().subscribe_for("")
    }

    pub fn is_loading(&self) -> bool {
        self.stats.latest().is_loading
    }

    pub fn rows(&self, now: DateTime<Utc>) -> Vec<PeerStatRow> {
        let store = self.controller.store();
        let stats = self.stats.latest().data;
        let peers = store.peers().peek(Some("")).data;
        let interfaces = store.interfaces().peek(Some(GLOBAL_KEY)).data;

        let names: HashMap<&str, &str> = interfaces
            .iter()
            .map(|i| (i.id.as_str(), i.name.as_str()))
            .collect();
        let owners: HashMap<&str, &Peer> = peers.iter().map(|p| (p.peer_id.as_str(), p)).collect();

        stats
            .iter()
            .map(|stat| {
                let owner = owners.get(stat.peer_id.as_str());
                let interface_id = owner.map_or(stat.interface_id.as_str(), |p| p.interface_id.as_str());
                PeerStatRow {
                    peer_id: stat.peer_id.clone(),
                    email: owner.map(|p| p.email.clone()),
                    interface_id: interface_id.to_owned(),
                    interface_name: names.get(interface_id).copied().unwrap_or(interface_id).to_owned(),
                    rx_bytes: stat.rx_bytes,
                    tx_bytes: stat.tx_bytes,
                    rx: format_bytes(stat.rx_bytes),
                    tx: format_bytes(stat.tx_bytes),
                    handshake: HandshakeAge::since(stat.last_handshake, now),
                }
            })
            .collect()
    }

    pub fn error(&self) -> Option<String> {
        let store = self.controller.store();
        self.stats
            .latest()
            .error_message()
            .or_else(|| store.peers().peek(Some("")).error_message())
            .or_else(|| store.interfaces().peek(Some(GLOBAL_KEY)).error_message())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use url::Url;
    use william_api::types::PeerStat as WireStat;

    use super::*;
    use crate::config::ServiceConfig;
    use crate::testing::{FakeAdmin, admin_peer};

    fn config() -> ServiceConfig {
        ServiceConfig::new(
            Url::parse("http://localhost:8081/api").unwrap(),
            Url::parse("http://localhost:8080").unwrap(),
        )
    }

    fn stat(peer_id: &str, interface_id: &str, handshake: i64) -> WireStat {
        WireStat {
            peer_id: peer_id.into(),
            interface_id: interface_id.into(),
            rx_bytes: 1536,
            tx_bytes: 512,
            last_handshake_at: handshake,
        }
    }

    #[tokio::test]
    async fn rows_join_owner_and_interface_name() {
        let fake = FakeAdmin::with_interfaces(&["wg0"]);
        {
            let mut state = fake.state();
            state.peers.push(admin_peer("p1", "wg0", "alice@example.com"));
            state.stats = vec![stat("p1", "wg0", 1_700_000_000), stat("ghost", "wg9", 0)];
        }
        let view = StatusView::new(AdminController::new(fake.clone(), &config()));
        view.load().await;

        let now = Utc.timestamp_opt(1_700_000_090, 0).unwrap();
        let rows = view.rows(now);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].email.as_deref(), Some("alice@example.com"));
        assert_eq!(rows[0].interface_name, "WG0");
        assert_eq!(rows[0].rx, "1.5 KB");
        assert_eq!(rows[0].handshake.label(), "1m ago");

        assert_eq!(rows[1].email, None);
        assert_eq!(rows[1].interface_name, "wg9");
        assert_eq!(rows[1].handshake, HandshakeAge::Never);
    }

    #[tokio::test(start_paused = true)]
    async fn stats_poll_while_view_is_alive() {
        let fake = FakeAdmin::with_interfaces(&["wg0"]);
        let mut config = config();
        config.peer_stats_poll = Duration::from_secs(5);
        let view = StatusView::new(AdminController::new(fake.clone(), &config));
        view.load().await;
        assert_eq!(fake.script.calls("list_peer_stats"), 1);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(fake.script.calls("list_peer_stats") >= 3);

        drop(view);
        let settled = fake.script.calls("list_peer_stats");
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fake.script.calls("list_peer_stats"), settled);
    }
}
