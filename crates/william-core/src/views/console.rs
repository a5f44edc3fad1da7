// ── End-user console ──
//
// The caller's interfaces (keyed by their email), first-available
// interface selection, the peer on that interface, and its live status.
// Every selection or identity change resets the peer and resolves again.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use william_api::{UserClient, UserService};

use super::{Follower, Picker, settled};
use crate::config::ServiceConfig;
use crate::error::CoreError;
use crate::lifecycle::{PeerDeletion, PeerLifecycle, PeerPresence};
use crate::model::{Interface, PeerConfig, PeerStatus, TrafficSummary};
use crate::mutation::{Confirmed, MutationOutcome, Proposal};
use crate::selection::{Selection, SelectionPolicy};
use crate::store::{Resource, Subscription, UserStore, lock};

/// The caller's peer status with its display summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerSummary {
    pub status: PeerStatus,
    pub traffic: TrafficSummary,
}

pub struct ConsoleView {
    store: UserStore,
    lifecycle: PeerLifecycle,
    picker: Picker,
    email: watch::Sender<String>,
    interfaces: Mutex<Subscription<Vec<Interface>>>,
    statuses: Follower<Vec<PeerStatus>>,
}

impl ConsoleView {
    pub fn new(api: Arc<dyn UserService>, config: &ServiceConfig) -> Self {
        let store = UserStore::new(Arc::clone(&api), config);
        let email = config.identity().unwrap_or_default().to_owned();
        let interfaces = store.interfaces().subscribe(store.identity_key(&email));
        let statuses = Follower::new(store.peer_statuses());
        let lifecycle = PeerLifecycle::new(api, config.require_identity)
            .with_statuses(store.peer_statuses().clone());
        let (email, _) = watch::channel(email);
        Self {
            lifecycle,
            store,
            picker: Picker::new(SelectionPolicy::FirstAvailable),
            email,
            interfaces: Mutex::new(interfaces),
            statuses,
        }
    }

    /// Build an HTTP-backed console for `config.user_url`.
    pub fn connect(config: &ServiceConfig) -> Result<Self, CoreError> {
        let client = UserClient::new(config.user_url.as_str(), &config.transport())?;
        debug!(url = %config.user_url, "user client ready");
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn lifecycle(&self) -> &PeerLifecycle {
        &self.lifecycle
    }

    // ── Identity ─────────────────────────────────────────────────────

    pub fn email(&self) -> String {
        self.email.borrow().clone()
    }

    /// Whether per-user calls may be issued with the current email.
    pub fn has_identity(&self) -> bool {
        self.store.identity_key(self.email.borrow().trim()).is_some()
    }

    /// Change the identity. The peer and the interface selection are
    /// forgotten; the next list load selects from the new identity's list.
    pub fn set_email(&self, email: &str) {
        let email = email.trim().to_owned();
        let changed = self.email.send_if_modified(|current| {
            if *current == email {
                return false;
            }
            current.clone_from(&email);
            true
        });
        if !changed {
            return;
        }
        debug!("identity changed");
        *lock(&self.interfaces) = self
            .store
            .interfaces()
            .subscribe(self.store.identity_key(&email));
        self.lifecycle.reset();
        self.picker.clear();
        self.follow_status();
    }

    fn identity_key(&self) -> Option<String> {
        let email = self.email();
        self.store.identity_key(&email).map(str::to_owned)
    }

    // ── Interfaces ───────────────────────────────────────────────────

    fn sync(&self, resource: &Resource<Vec<Interface>>) -> bool {
        if !self.has_identity() {
            return self.picker.clear();
        }
        settled(resource)
            && self
                .picker
                .reconcile(resource.data.iter().map(|i| i.id.as_str()))
    }

    /// Interfaces the caller may join; empty without a call when the
    /// identity is missing.
    pub async fn load_interfaces(&self) -> Resource<Vec<Interface>> {
        let key = self.identity_key();
        let resource = self.store.interfaces().fetch(key.as_deref()).await;
        if self.sync(&resource) {
            self.lifecycle.reset();
        }
        resource
    }

    pub fn interfaces(&self) -> Resource<Vec<Interface>> {
        self.store.interfaces().peek(self.identity_key().as_deref())
    }

    pub fn selection(&self) -> Selection {
        self.picker.current()
    }

    /// Load interfaces, then resolve the peer on the selected one.
    pub async fn refresh(&self) -> PeerPresence {
        self.load_interfaces().await;
        self.resolve().await
    }

    /// Explicitly pick an interface and resolve the peer on it.
    pub async fn select_interface(&self, interface_id: &str) -> PeerPresence {
        if self.picker.select(interface_id) {
            self.lifecycle.reset();
        }
        self.resolve().await
    }

    pub async fn resolve(&self) -> PeerPresence {
        let interface_id = self.picker.key();
        let email = self.email();
        self.lifecycle.resolve_peer(&interface_id, &email).await
    }

    // ── Peer ─────────────────────────────────────────────────────────

    pub fn presence(&self) -> PeerPresence {
        self.lifecycle.presence()
    }

    pub async fn create_peer(&self) -> MutationOutcome<PeerConfig> {
        let interface_id = self.picker.key();
        let email = self.email();
        let outcome = self.lifecycle.create_peer(&interface_id, &email).await;
        self.follow_status();
        outcome
    }

    pub async fn load_my_peer(&self) -> MutationOutcome<PeerConfig> {
        let email = self.email();
        let outcome = self.lifecycle.load_my_peer(&email).await;
        self.follow_status();
        outcome
    }

    pub fn propose_delete(&self) -> Result<Proposal, CoreError> {
        self.lifecycle.propose_delete()
    }

    pub fn confirm_delete(&self, proposal: &Proposal) -> Option<Confirmed<PeerDeletion>> {
        self.lifecycle.confirm_delete(proposal)
    }

    pub async fn delete_peer(&self, deletion: Confirmed<PeerDeletion>) -> MutationOutcome<()> {
        let email = self.email();
        let outcome = self.lifecycle.delete_peer(deletion, &email).await;
        self.follow_status();
        outcome
    }

    pub fn is_busy(&self) -> bool {
        self.lifecycle.gate().is_busy()
    }

    // ── Status ───────────────────────────────────────────────────────

    /// Status polling runs only with a peer and a usable identity.
    pub fn status_enabled(&self) -> bool {
        self.presence().peer_id().is_some() && self.has_identity()
    }

    fn status_key(&self) -> Option<String> {
        if self.status_enabled() {
            self.identity_key()
        } else {
            None
        }
    }

    fn follow_status(&self) {
        self.statuses.follow(self.status_key().as_deref());
    }

    /// Polled status list; detached while status is disabled.
    pub fn watch_status(&self) -> Subscription<Vec<PeerStatus>> {
        self.store
            .peer_statuses()
            .subscribe(self.status_key().as_deref())
    }

    /// The caller's peer status, fetched once per invalidation window.
    pub async fn load_status(&self, now: DateTime<Utc>) -> Option<PeerSummary> {
        let key = self.status_key()?;
        let statuses = self.statuses.fetch(Some(key.as_str())).await;
        self.summarize(&statuses.data, now)
    }

    fn summarize(&self, statuses: &[PeerStatus], now: DateTime<Utc>) -> Option<PeerSummary> {
        let presence = self.presence();
        let peer_id = presence.peer_id()?;
        let status = statuses.iter().find(|s| s.peer_id == peer_id)?.clone();
        let traffic = status.summary(now);
        Some(PeerSummary { status, traffic })
    }

    /// The action error, else the interface or status list error.
    pub fn error(&self) -> Option<String> {
        let statuses = self
            .statuses
            .peek(self.status_key().as_deref())
            .error_message();
        self.lifecycle
            .gate()
            .error()
            .or_else(|| self.interfaces().error_message())
            .or(statuses)
    }

    /// Follow interface-list and identity changes until cancelled,
    /// resolving the peer whenever the selection moves.
    ///
    /// An identity change first switches to that identity's list, then
    /// resolves against the selection made from it.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut emails = self.email.subscribe();
        emails.borrow_and_update();
        let mut identity_changed = false;
        loop {
            let key = self.identity_key();
            let mut list = self.store.interfaces().subscribe(key.as_deref());
            let current = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                current = list.fetch() => current,
            };
            let switched = std::mem::take(&mut identity_changed);
            if self.sync(&current) || switched {
                self.lifecycle.reset();
                self.resolve().await;
            }
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return,
                    changed = emails.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        emails.borrow_and_update();
                        identity_changed = true;
                        break;
                    }
                    snapshot = list.changed() => {
                        let Some(snapshot) = snapshot else { return };
                        if self.sync(&snapshot) {
                            self.lifecycle.reset();
                            self.resolve().await;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use url::Url;
    use william_api::types::PeerStatus as WireStatus;

    use super::*;
    use crate::lifecycle::MISSING_IDENTITY;
    use crate::testing::{FakeUser, user_interface};

    const EMAIL: &str = "alice@example.com";
    const BOB: &str = "bob@example.com";

    fn status(peer_id: &str, interface_id: &str) -> WireStatus {
        WireStatus {
            peer_id: peer_id.into(),
            interface_id: interface_id.into(),
            interface_name: interface_id.to_uppercase(),
            rx_bytes: 2048,
            tx_bytes: 1024,
            last_handshake_at: 1_700_000_000,
        }
    }

    fn config(email: Option<&str>) -> ServiceConfig {
        let mut config = ServiceConfig::new(
            Url::parse("http://localhost:8081/api").unwrap(),
            Url::parse("http://localhost:8080").unwrap(),
        );
        config.email = email.map(str::to_owned);
        config
    }

    #[tokio::test]
    async fn refresh_selects_first_interface_and_resolves() {
        let fake = FakeUser::with_interfaces(&["a", "b"]);
        fake.add_peer(EMAIL, "a", "peer-a");
        let console = ConsoleView::new(fake.clone(), &config(Some(EMAIL)));

        let presence = console.refresh().await;
        assert_eq!(console.selection(), Selection::Selected("a".into()));
        assert_eq!(presence.peer_id(), Some("peer-a"));
    }

    #[tokio::test]
    async fn missing_email_makes_no_calls() {
        let fake = FakeUser::with_interfaces(&["a"]);
        let console = ConsoleView::new(fake.clone(), &config(None));

        let presence = console.refresh().await;
        assert_eq!(presence, PeerPresence::Unknown);
        assert_eq!(console.selection(), Selection::Unselected);
        assert!(console.interfaces().data.is_empty());

        let outcome = console.load_my_peer().await;
        assert!(matches!(outcome, MutationOutcome::Failed(CoreError::Validation { .. })));
        assert_eq!(console.error().as_deref(), Some(MISSING_IDENTITY));
        assert_eq!(fake.script.total_calls(), 0);
    }

    #[tokio::test]
    async fn switching_interface_resolves_absent() {
        let fake = FakeUser::with_interfaces(&["a", "x"]);
        fake.add_peer(EMAIL, "a", "peer-a");
        let console = ConsoleView::new(fake.clone(), &config(Some(EMAIL)));
        console.refresh().await;

        let presence = console.select_interface("x").await;
        assert_eq!(presence, PeerPresence::Absent);
        assert_eq!(presence.config(), "");
        assert_eq!(console.error(), None);
    }

    #[tokio::test]
    async fn create_then_delete_round_trip() {
        let fake = FakeUser::with_interfaces(&["a"]);
        let console = ConsoleView::new(fake.clone(), &config(Some(EMAIL)));
        assert!(console.refresh().await.is_absent());

        let created = console.create_peer().await.completed().unwrap();
        assert_eq!(console.presence().peer_id(), Some(created.peer_id.as_str()));

        let proposal = console.propose_delete().unwrap();
        let confirmed = console.confirm_delete(&proposal).unwrap();
        assert!(console.delete_peer(confirmed).await.is_completed());
        assert!(console.presence().is_absent());
    }

    #[tokio::test]
    async fn status_requires_a_peer() {
        let fake = FakeUser::with_interfaces(&["a"]);
        fake.state().statuses = vec![WireStatus {
            peer_id: "peer-a".into(),
            interface_id: "a".into(),
            interface_name: "A".into(),
            rx_bytes: 2048,
            tx_bytes: 1024,
            last_handshake_at: 1_700_000_000,
        }];
        let console = ConsoleView::new(fake.clone(), &config(Some(EMAIL)));
        let now = Utc.timestamp_opt(1_700_000_100, 0).unwrap();

        console.refresh().await;
        assert_eq!(console.load_status(now).await, None);
        assert_eq!(fake.script.calls("list_peer_statuses"), 0);

        fake.add_peer(EMAIL, "a", "peer-a");
        console.resolve().await;
        let summary = console.load_status(now).await.unwrap();
        assert_eq!(summary.traffic.label, "↑:1.0 KB / ↓:2.0 KB");
        assert!(summary.traffic.recent_handshake);
    }

    #[tokio::test]
    async fn created_peer_status_is_refetched() {
        let fake = FakeUser::with_interfaces(&["a", "x"]);
        fake.add_peer(EMAIL, "a", "peer-a");
        fake.state().statuses = vec![status("peer-a", "a")];
        let console = ConsoleView::new(fake.clone(), &config(Some(EMAIL)));
        let now = Utc.timestamp_opt(1_700_000_100, 0).unwrap();

        console.refresh().await;
        assert!(console.load_status(now).await.is_some());
        assert!(console.select_interface("x").await.is_absent());

        // The server reports the new peer as soon as it exists.
        fake.state().statuses.push(status("alice@example.com@x", "x"));
        let created = console.create_peer().await.completed().unwrap();
        assert_eq!(fake.script.calls("list_peer_statuses"), 2);

        let summary = console.load_status(now).await.unwrap();
        assert_eq!(summary.status.peer_id, created.peer_id);
        assert_eq!(fake.script.calls("list_peer_statuses"), 2);

        let proposal = console.propose_delete().unwrap();
        let confirmed = console.confirm_delete(&proposal).unwrap();
        assert!(console.delete_peer(confirmed).await.is_completed());
        assert_eq!(fake.script.calls("list_peer_statuses"), 3);
        assert!(console.store.peer_statuses().keys().is_empty());
    }

    #[tokio::test]
    async fn run_loop_resolves_against_new_identity() {
        let fake = FakeUser::with_interfaces(&["a"]);
        fake.add_peer(EMAIL, "a", "peer-a");
        fake.add_peer(BOB, "b", "peer-b");
        fake.state()
            .interfaces_for
            .insert(BOB.to_owned(), vec![user_interface("b")]);
        let console = Arc::new(ConsoleView::new(fake.clone(), &config(Some(EMAIL))));
        assert_eq!(console.refresh().await.peer_id(), Some("peer-a"));

        let cancel = CancellationToken::new();
        let runner = {
            let console = Arc::clone(&console);
            let cancel = cancel.clone();
            tokio::spawn(async move { console.run(cancel).await })
        };

        let mut presence = console.lifecycle().watch_presence();
        presence.borrow_and_update();
        console.set_email(BOB);
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                presence.changed().await.unwrap();
                if presence.borrow().peer_id() == Some("peer-b") {
                    break;
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(console.selection(), Selection::Selected("b".into()));
        assert_eq!(console.error(), None);
        cancel.cancel();
        runner.await.unwrap();
    }

    #[tokio::test]
    async fn clearing_email_clears_selection() {
        let fake = FakeUser::with_interfaces(&["a"]);
        fake.add_peer(EMAIL, "a", "peer-a");
        let console = ConsoleView::new(fake.clone(), &config(Some(EMAIL)));
        console.refresh().await;

        console.set_email("");
        assert_eq!(console.selection(), Selection::Unselected);
        assert_eq!(console.presence(), PeerPresence::Unknown);
        assert!(!console.status_enabled());
    }

    #[tokio::test]
    async fn interface_removed_upstream_clears_selection() {
        let fake = FakeUser::with_interfaces(&["a"]);
        let console = ConsoleView::new(fake.clone(), &config(Some(EMAIL)));
        console.refresh().await;

        fake.state().interfaces = vec![user_interface("b")];
        console.store.interfaces().revalidate(Some(EMAIL)).await;
        console.load_interfaces().await;
        assert_eq!(console.selection(), Selection::Unselected);
    }
}
