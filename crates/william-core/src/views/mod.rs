// ── Headless views ──
//
// Per-page controllers for the admin and end-user consoles. A view owns
// its selection, its busy gate and its pending confirmation; everything
// it reads comes from the shared store. Nothing here renders.

mod allowed_emails;
mod configs;
mod console;
mod firewall;
mod interfaces;
mod peers;
mod status;

use std::sync::Mutex;

use tokio::sync::watch;
use tracing::debug;

pub use allowed_emails::AllowedEmailsView;
pub use configs::ConfigView;
pub use console::{ConsoleView, PeerSummary};
pub use firewall::FirewallView;
pub use interfaces::InterfacesView;
pub use peers::PeersView;
pub use status::{PeerStatRow, StatusView};

use crate::command::{AdminCommand, CommandResult};
use crate::controller::AdminController;
use crate::error::CoreError;
use crate::mutation::{Confirmation, MutationGate, MutationOutcome, Proposal};
use crate::selection::{Selection, SelectionPolicy};
use crate::store::{Resource, ResourceCache, Subscription, lock};

/// Shown when `confirm` is called with a stale or cancelled proposal.
pub const NOTHING_TO_CONFIRM: &str = "Nothing to confirm; the action was cancelled or replaced.";

// ── Selection holder ─────────────────────────────────────────────────

/// A `Selection` behind a watch channel so observers see every change.
pub(crate) struct Picker {
    selection: watch::Sender<Selection>,
    policy: SelectionPolicy,
}

impl Picker {
    pub(crate) fn new(policy: SelectionPolicy) -> Self {
        let (selection, _) = watch::channel(Selection::Unselected);
        Self { selection, policy }
    }

    pub(crate) fn current(&self) -> Selection {
        self.selection.borrow().clone()
    }

    /// Selected id, or `""`.
    pub(crate) fn key(&self) -> String {
        self.selection.borrow().as_key().to_owned()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<Selection> {
        self.selection.subscribe()
    }

    pub(crate) fn select(&self, id: &str) -> bool {
        self.selection.send_if_modified(|selection| {
            let before = selection.clone();
            selection.select(id);
            *selection != before
        })
    }

    pub(crate) fn clear(&self) -> bool {
        self.selection.send_if_modified(|selection| {
            let changed = *selection != Selection::Unselected;
            selection.clear();
            changed
        })
    }

    pub(crate) fn reconcile<'a, I>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let changed = self
            .selection
            .send_if_modified(|selection| selection.reconcile(ids, self.policy));
        if changed {
            debug!(selection = ?self.selection.borrow(), "selection reconciled");
        }
        changed
    }
}

/// Whether a snapshot is a settled server answer worth reconciling against.
pub(crate) fn settled<T>(resource: &Resource<T>) -> bool {
    !resource.is_loading && resource.error.is_none()
}

// ── Key follower ─────────────────────────────────────────────────────

/// One subscription that moves with the key a view shows, so that key
/// stays cached and the key it replaced is released.
pub(crate) struct Follower<T: Default + Send + Sync + 'static> {
    cache: ResourceCache<T>,
    held: Mutex<Subscription<T>>,
}

impl<T: Default + Send + Sync + 'static> Follower<T> {
    pub(crate) fn new(cache: &ResourceCache<T>) -> Self {
        Self {
            cache: cache.clone(),
            held: Mutex::new(cache.subscribe(None)),
        }
    }

    pub(crate) fn follow(&self, key: Option<&str>) {
        let mut held = lock(&self.held);
        if held.key() != key {
            *held = self.cache.subscribe(key);
        }
    }

    /// Follow `key`, then fetch it through the cache.
    pub(crate) async fn fetch(&self, key: Option<&str>) -> Resource<T> {
        self.follow(key);
        self.cache.fetch(key).await
    }

    pub(crate) fn peek(&self, key: Option<&str>) -> Resource<T> {
        self.cache.peek(key)
    }
}

// ── Admin actions ────────────────────────────────────────────────────

/// Busy gate plus two-step confirmation around an `AdminController`.
pub(crate) struct Actions {
    controller: AdminController,
    gate: MutationGate,
    confirmation: Confirmation<AdminCommand>,
}

impl Actions {
    pub(crate) fn new(controller: AdminController) -> Self {
        Self {
            controller,
            gate: MutationGate::new(),
            confirmation: Confirmation::default(),
        }
    }

    pub(crate) fn controller(&self) -> &AdminController {
        &self.controller
    }

    pub(crate) fn gate(&self) -> &MutationGate {
        &self.gate
    }

    /// Stage `cmd` for confirmation. Invalid commands are reported and
    /// never staged.
    pub(crate) fn propose(&self, cmd: AdminCommand) -> Result<Proposal, CoreError> {
        if let Err(err) = cmd.validate() {
            self.gate.report(&err);
            return Err(err);
        }
        self.gate.clear_error();
        let prompt = cmd.prompt();
        Ok(self.confirmation.propose(cmd, prompt))
    }

    pub(crate) async fn confirm(&self, proposal: &Proposal) -> MutationOutcome<CommandResult> {
        let Some(confirmed) = self.confirmation.confirm(proposal) else {
            let err = CoreError::validation(NOTHING_TO_CONFIRM);
            self.gate.report(&err);
            return MutationOutcome::Failed(err);
        };
        let name = confirmed.command().name();
        self.gate
            .run(name, || self.controller.execute_confirmed(confirmed))
            .await
    }

    /// Run a command that needs no confirmation.
    pub(crate) async fn execute(&self, cmd: AdminCommand) -> MutationOutcome<CommandResult> {
        let name = cmd.name();
        self.gate
            .run(name, || self.controller.execute(cmd))
            .await
    }

    pub(crate) fn cancel(&self) {
        self.confirmation.cancel();
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.confirmation.is_pending()
    }

    /// The action error, else the first list error.
    pub(crate) fn error(&self, lists: &[Option<String>]) -> Option<String> {
        self.gate
            .error()
            .or_else(|| lists.iter().flatten().next().cloned())
    }
}
