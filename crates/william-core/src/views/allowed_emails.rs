// ── Allowed emails page ──

use tokio_util::sync::CancellationToken;

use super::{Actions, Follower, Picker, settled};
use crate::command::{AdminCommand, AllowedEmailRequest, CommandResult};
use crate::controller::AdminController;
use crate::error::CoreError;
use crate::model::{AllowedEmail, Interface};
use crate::mutation::{MutationOutcome, Proposal};
use crate::selection::{Selection, SelectionPolicy};
use crate::store::{GLOBAL_KEY, Resource, ResourceCache, Subscription};

/// Emails allowed to self-provision on the selected interface.
pub struct AllowedEmailsView {
    actions: Actions,
    picker: Picker,
    emails: Follower<Vec<AllowedEmail>>,
    _interfaces: Subscription<Vec<Interface>>,
}

impl AllowedEmailsView {
    pub fn new(controller: AdminController) -> Self {
        let interfaces = controller.store().interfaces().subscribe_for("");
        let emails = Follower::new(controller.store().allowed_emails());
        Self {
            actions: Actions::new(controller),
            picker: Picker::new(SelectionPolicy::FirstAvailable),
            emails,
            _interfaces: interfaces,
        }
    }

    fn interface_cache(&self) -> &ResourceCache<Vec<Interface>> {
        self.actions.controller().store().interfaces()
    }

    fn cache(&self) -> &ResourceCache<Vec<AllowedEmail>> {
        self.actions.controller().store().allowed_emails()
    }

    fn sync(&self, resource: &Resource<Vec<Interface>>) {
        if settled(resource)
            && self
                .picker
                .reconcile(resource.data.iter().map(|i| i.id.as_str()))
        {
            self.follow();
        }
    }

    fn email_key(&self) -> Option<String> {
        self.cache().kind().key(&self.picker.key()).map(str::to_owned)
    }

    fn follow(&self) {
        self.emails.follow(self.email_key().as_deref());
    }

    pub async fn load_interfaces(&self) -> Resource<Vec<Interface>> {
        let resource = self.interface_cache().fetch(Some(GLOBAL_KEY)).await;
        self.sync(&resource);
        resource
    }

    pub fn selection(&self) -> Selection {
        self.picker.current()
    }

    pub fn select(&self, interface_id: &str) {
        if self.picker.select(interface_id) {
            self.follow();
        }
    }

    /// Emails for the selected interface; empty without a call when
    /// nothing is selected.
    pub async fn load(&self) -> Resource<Vec<AllowedEmail>> {
        self.emails.fetch(self.email_key().as_deref()).await
    }

    pub fn subscribe(&self) -> Subscription<Vec<AllowedEmail>> {
        self.cache().subscribe_for(&self.picker.key())
    }

    pub fn error(&self) -> Option<String> {
        let emails = self.emails.peek(self.email_key().as_deref());
        let interfaces = self.interface_cache().peek(Some(GLOBAL_KEY));
        self.actions
            .error(&[interfaces.error_message(), emails.error_message()])
    }

    pub fn is_busy(&self) -> bool {
        self.actions.gate().is_busy()
    }

    /// Allow `email` on the selected interface.
    pub async fn add(&self, email: &str) -> MutationOutcome<CommandResult> {
        let request = AllowedEmailRequest::new(self.picker.key(), email);
        self.actions
            .execute(AdminCommand::CreateAllowedEmail(request))
            .await
    }

    pub fn propose_remove(&self, email: &str) -> Result<Proposal, CoreError> {
        let request = AllowedEmailRequest::new(self.picker.key(), email);
        self.actions
            .propose(AdminCommand::DeleteAllowedEmail(request))
    }

    pub async fn confirm(&self, proposal: &Proposal) -> MutationOutcome<CommandResult> {
        self.actions.confirm(proposal).await
    }

    pub fn cancel(&self) {
        self.actions.cancel();
    }

    pub async fn run(&self, cancel: CancellationToken) {
        let mut list = self.interface_cache().subscribe_for("");
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
}
