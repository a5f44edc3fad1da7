// ── Peers page ──
//
// Peers filtered by interface (`""` lists every interface), a manually
// selected peer, and that peer's routes. The filter never auto-selects.

use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

use super::{Actions, Follower, Picker, settled};
use crate::command::{AdminCommand, CommandResult, RouteRequest};
use crate::controller::AdminController;
use crate::error::CoreError;
use crate::model::{Interface, Peer, Route};
use crate::mutation::{MutationOutcome, Proposal};
use crate::selection::{Selection, SelectionPolicy};
use crate::store::{GLOBAL_KEY, Resource, ResourceCache, Subscription, lock};

pub struct PeersView {
    actions: Actions,
    filter: Picker,
    peer: Picker,
    list: Mutex<Subscription<Vec<Peer>>>,
    routes: Follower<Vec<Route>>,
    _interfaces: Subscription<Vec<Interface>>,
}

impl PeersView {
    pub fn new(controller: AdminController) -> Self {
        let list = controller.store().peers().subscribe_for("");
        let interfaces = controller.store().interfaces().subscribe_for("");
        let routes = Follower::new(controller.store().peer_routes());
        Self {
            actions: Actions::new(controller),
            filter: Picker::new(SelectionPolicy::Manual),
            peer: Picker::new(SelectionPolicy::Manual),
            list: Mutex::new(list),
            routes,
            _interfaces: interfaces,
        }
    }

    fn cache(&self) -> &ResourceCache<Vec<Peer>> {
        self.actions.controller().store().peers()
    }

    fn route_cache(&self) -> &ResourceCache<Vec<Route>> {
        self.actions.controller().store().peer_routes()
    }

    fn sync(&self, resource: &Resource<Vec<Peer>>) {
        if settled(resource)
            && self
                .peer
                .reconcile(resource.data.iter().map(|p| p.peer_id.as_str()))
        {
            self.follow_routes();
        }
    }

    /// Keep the route cache on the selected peer only.
    fn follow_routes(&self) {
        let key = self.peer.key();
        self.routes.follow(self.route_cache().kind().key(&key));
    }

    fn sync_filter(&self, resource: &Resource<Vec<Interface>>) {
        if settled(resource)
            && self
                .filter
                .reconcile(resource.data.iter().map(|i| i.id.as_str()))
        {
            self.follow_filter();
        }
    }

    fn follow_filter(&self) {
        if self.peer.clear() {
            self.follow_routes();
        }
        *lock(&self.list) = self.cache().subscribe_for(&self.filter.key());
    }

    // ── Filter ───────────────────────────────────────────────────────

    /// Interface filter; `""` means every interface.
    pub fn filter(&self) -> String {
        self.filter.key()
    }

    /// Switch the listed interface. Clears the selected peer.
    pub fn set_filter(&self, interface_id: &str) {
        if self.filter.select(interface_id) {
            self.follow_filter();
        }
    }

    /// Interfaces offered as filter choices.
    pub async fn load_interfaces(&self) -> Resource<Vec<Interface>> {
        let resource = self
            .actions
            .controller()
            .store()
            .interfaces()
            .fetch(Some(GLOBAL_KEY))
            .await;
        self.sync_filter(&resource);
        resource
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub async fn load(&self) -> Resource<Vec<Peer>> {
        let filter = self.filter.key();
        let resource = self.cache().fetch(Some(filter.as_str())).await;
        self.sync(&resource);
        resource
    }

    pub async fn refresh(&self) -> Resource<Vec<Peer>> {
        let filter = self.filter.key();
        let resource = self.cache().revalidate(Some(filter.as_str())).await;
        self.sync(&resource);
        resource
    }

    pub fn peers(&self) -> Resource<Vec<Peer>> {
        self.cache().peek(Some(self.filter.key().as_str()))
    }

    pub fn selection(&self) -> Selection {
        self.peer.current()
    }

    pub fn select(&self, peer_id: &str) {
        if self.peer.select(peer_id) {
            self.follow_routes();
        }
    }

    pub fn routes(&self) -> Subscription<Vec<Route>> {
        self.route_cache().subscribe_for(&self.peer.key())
    }

    pub async fn load_routes(&self) -> Resource<Vec<Route>> {
        let key = self.peer.key();
        self.routes.fetch(self.route_cache().kind().key(&key)).await
    }

    pub fn error(&self) -> Option<String> {
        let key = self.peer.key();
        let routes = self.routes.peek(self.route_cache().kind().key(&key));
        let interfaces = self
            .actions
            .controller()
            .store()
            .interfaces()
            .peek(Some(GLOBAL_KEY));
        self.actions.error(&[
            self.peers().error_message(),
            routes.error_message(),
            interfaces.error_message(),
        ])
    }

    pub fn is_busy(&self) -> bool {
        self.actions.gate().is_busy()
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub fn propose_delete(&self, peer_id: &str) -> Result<Proposal, CoreError> {
        self.actions.propose(AdminCommand::DeletePeer {
            peer_id: peer_id.to_owned(),
        })
    }

    pub fn propose_add_route(&self, cidr: &str) -> Result<Proposal, CoreError> {
        let owner = self.peer.key();
        self.actions
            .propose(AdminCommand::CreatePeerRoute(RouteRequest::new(owner, cidr)))
    }

    pub fn propose_remove_route(&self, cidr: &str) -> Result<Proposal, CoreError> {
        let owner = self.peer.key();
        self.actions
            .propose(AdminCommand::DeletePeerRoute(RouteRequest::new(owner, cidr)))
    }

    pub async fn confirm(&self, proposal: &Proposal) -> MutationOutcome<CommandResult> {
        let outcome = self.actions.confirm(proposal).await;
        if outcome.is_completed() {
            self.sync(&self.peers());
        }
        outcome
    }

    pub fn cancel(&self) {
        self.actions.cancel();
    }

    /// Reconcile the peer selection on every list change until cancelled.
    ///
    /// Follows the filter: switching interfaces resubscribes.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut filters = self.filter.watch();
        loop {
            let filter = filters.borrow_and_update().as_key().to_owned();
            let mut list = self.cache().subscribe_for(&filter);
            self.sync(list.current());
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return,
                    changed = filters.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        break;
                    }
                    snapshot = list.changed() => match snapshot {
                        Some(snapshot) => self.sync(&snapshot),
                        None => return,
                    },
                }
            }
        }
    }
}
