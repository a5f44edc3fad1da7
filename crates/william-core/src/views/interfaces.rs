// ── Interfaces page ──
//
// Interface list with first-available selection, create / update /
// delete, and the selected interface's routes.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{Actions, Follower, Picker, settled};
use crate::command::{AdminCommand, CommandResult, RouteRequest};
use crate::controller::AdminController;
use crate::error::CoreError;
use crate::model::{Interface, InterfaceSpec, Route};
use crate::mutation::{MutationOutcome, Proposal};
use crate::selection::{Selection, SelectionPolicy};
use crate::store::{GLOBAL_KEY, Resource, ResourceCache, Subscription};

pub struct InterfacesView {
    actions: Actions,
    picker: Picker,
    routes: Follower<Vec<Route>>,
    _list: Subscription<Vec<Interface>>,
}

impl InterfacesView {
    pub fn new(controller: AdminController) -> Self {
        let list = controller.store().interfaces().subscribe_for("");
        let routes = Follower::new(controller.store().interface_routes());
        Self {
            actions: Actions::new(controller),
            picker: Picker::new(SelectionPolicy::FirstAvailable),
            routes,
            _list: list,
        }
    }

    fn cache(&self) -> &ResourceCache<Vec<Interface>> {
        self.actions.controller().store().interfaces()
    }

    fn route_cache(&self) -> &ResourceCache<Vec<Route>> {
        self.actions.controller().store().interface_routes()
    }

    fn sync(&self, resource: &Resource<Vec<Interface>>) {
        if settled(resource)
            && self
                .picker
                .reconcile(resource.data.iter().map(|i| i.id.as_str()))
        {
            self.follow_routes();
        }
    }

    /// Keep the route cache on the selected interface only.
    fn follow_routes(&self) {
        let key = self.picker.key();
        self.routes.follow(self.route_cache().kind().key(&key));
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Fetch the list (once per invalidation window) and reconcile.
    pub async fn load(&self) -> Resource<Vec<Interface>> {
        let resource = self.cache().fetch(Some(GLOBAL_KEY)).await;
        self.sync(&resource);
        resource
    }

    /// Force a refetch and reconcile.
    pub async fn refresh(&self) -> Resource<Vec<Interface>> {
        let resource = self.cache().revalidate(Some(GLOBAL_KEY)).await;
        self.sync(&resource);
        resource
    }

    pub fn interfaces(&self) -> Resource<Vec<Interface>> {
        self.cache().peek(Some(GLOBAL_KEY))
    }

    pub fn selection(&self) -> Selection {
        self.picker.current()
    }

    pub fn selected(&self) -> Option<Interface> {
        let key = self.picker.key();
        self.interfaces().data.iter().find(|i| i.id == key).cloned()
    }

    pub fn select(&self, id: &str) {
        if self.picker.select(id) {
            self.follow_routes();
        }
    }

    /// Routes of the selected interface; detached when nothing is selected.
    pub fn routes(&self) -> Subscription<Vec<Route>> {
        self.route_cache().subscribe_for(&self.picker.key())
    }

    pub async fn load_routes(&self) -> Resource<Vec<Route>> {
        let key = self.picker.key();
        self.routes.fetch(self.route_cache().kind().key(&key)).await
    }

    pub fn error(&self) -> Option<String> {
        let key = self.picker.key();
        let routes = self.routes.peek(self.route_cache().kind().key(&key));
        self.actions
            .error(&[self.interfaces().error_message(), routes.error_message()])
    }

    pub fn is_busy(&self) -> bool {
        self.actions.gate().is_busy()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Create an interface and select it.
    pub async fn create(&self, spec: InterfaceSpec) -> MutationOutcome<Interface> {
        let outcome = self
            .actions
            .execute(AdminCommand::CreateInterface(spec))
            .await
            .map(|result| result.interface().unwrap_or_default());
        if let MutationOutcome::Completed(created) = &outcome {
            self.sync(&self.interfaces());
            self.select(&created.id);
        }
        outcome
    }

    pub fn propose_update(&self, spec: InterfaceSpec) -> Result<Proposal, CoreError> {
        let id = self.picker.key();
        self.actions.propose(AdminCommand::UpdateInterface { id, spec })
    }

    pub fn propose_delete(&self) -> Result<Proposal, CoreError> {
        let id = self.picker.key();
        self.actions.propose(AdminCommand::DeleteInterface { id })
    }

    pub fn propose_add_route(&self, cidr: &str) -> Result<Proposal, CoreError> {
        let owner = self.picker.key();
        self.actions
            .propose(AdminCommand::CreateInterfaceRoute(RouteRequest::new(owner, cidr)))
    }

    pub fn propose_remove_route(&self, cidr: &str) -> Result<Proposal, CoreError> {
        let owner = self.picker.key();
        self.actions
            .propose(AdminCommand::DeleteInterfaceRoute(RouteRequest::new(owner, cidr)))
    }

    /// Run a confirmed proposal, then reconcile against the refreshed list.
    pub async fn confirm(&self, proposal: &Proposal) -> MutationOutcome<CommandResult> {
        let outcome = self.actions.confirm(proposal).await;
        if outcome.is_completed() {
            self.sync(&self.interfaces());
        }
        outcome
    }

    pub fn cancel(&self) {
        self.actions.cancel();
    }

    pub fn has_pending(&self) -> bool {
        self.actions.is_pending()
    }

    /// Reconcile the selection on every list change until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut list = self.cache().subscribe_for("");
        self.sync(list.current());
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                snapshot = list.changed() => match snapshot {
                    Some(snapshot) => self.sync(&snapshot),
                    None => break,
                },
            }
        }
    }

    pub fn controller(&self) -> &AdminController {
        self.actions.controller()
    }

    pub fn selection_changes(&self) -> tokio::sync::watch::Receiver<Selection> {
        self.picker.watch()
    }

    pub fn snapshot(&self) -> Arc<Vec<Interface>> {
        self.interfaces().data
    }
}
