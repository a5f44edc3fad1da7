// ── Admin controller ──
//
// Routes `AdminCommand`s to the admin service and applies their cache
// effects. Views share one controller, and so one store.

use std::sync::Arc;

use tracing::{debug, info};

use william_api::types::CreateInterfaceRequest;
use william_api::{AdminClient, AdminService};

use crate::command::{AdminCommand, CommandResult};
use crate::config::ServiceConfig;
use crate::convert::update_request;
use crate::error::CoreError;
use crate::model::Interface;
use crate::mutation::Confirmed;
use crate::store::AdminStore;

/// Entry point for the admin console.
///
/// Cheaply cloneable via `Arc<AdminInner>`.
#[derive(Clone)]
pub struct AdminController {
    inner: Arc<AdminInner>,
}

struct AdminInner {
    api: Arc<dyn AdminService>,
    store: AdminStore,
}

impl AdminController {
    pub fn new(api: Arc<dyn AdminService>, config: &ServiceConfig) -> Self {
        let store = AdminStore::new(Arc::clone(&api), config);
        Self {
            inner: Arc::new(AdminInner { api, store }),
        }
    }

    /// Build an HTTP-backed controller for `config.admin_url`.
    pub fn connect(config: &ServiceConfig) -> Result<Self, CoreError> {
        let client = AdminClient::new(config.admin_url.as_str(), &config.transport())?;
        debug!(url = %config.admin_url, "admin client ready");
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn store(&self) -> &AdminStore {
        &self.inner.store
    }

    // ── Command execution ────────────────────────────────────────────

    /// Execute a command that needs no confirmation.
    pub async fn execute(&self, cmd: AdminCommand) -> Result<CommandResult, CoreError> {
        if cmd.requires_confirmation() {
            return Err(CoreError::validation(format!(
                "{} must be confirmed before it runs.",
                cmd.name()
            )));
        }
        self.run(cmd).await
    }

    /// Execute a command the user has explicitly confirmed.
    pub async fn execute_confirmed(
        &self,
        cmd: Confirmed<AdminCommand>,
    ) -> Result<CommandResult, CoreError> {
        self.run(cmd.into_inner()).await
    }

    async fn run(&self, cmd: AdminCommand) -> Result<CommandResult, CoreError> {
        cmd.validate()?;
        debug!(command = cmd.name(), "executing");

        let result = self.call(&cmd).await?;
        info!(command = cmd.name(), "command succeeded");

        self.inner.store.invalidate(&cmd.invalidations()).await;
        Ok(result)
    }

    async fn call(&self, cmd: &AdminCommand) -> Result<CommandResult, CoreError> {
        let api = &self.inner.api;
        match cmd {
            AdminCommand::CreateInterface(spec) => {
                let created = api.create_interface(&CreateInterfaceRequest::from(spec)).await?;
                Ok(CommandResult::Interface(Interface::from(created)))
            }
            AdminCommand::UpdateInterface { id, spec } => {
                let updated = api.update_interface(&update_request(id, spec)).await?;
                Ok(CommandResult::Interface(Interface::from(updated)))
            }
            AdminCommand::DeleteInterface { id } => {
                api.delete_interface(id).await?;
                Ok(CommandResult::Ok)
            }
            AdminCommand::CreateInterfaceRoute(r) => {
                api.create_interface_route(&r.owner_id, &r.cidr).await?;
                Ok(CommandResult::Ok)
            }
            AdminCommand::DeleteInterfaceRoute(r) => {
                api.delete_interface_route(&r.owner_id, &r.cidr).await?;
                Ok(CommandResult::Ok)
            }
            AdminCommand::DeletePeer { peer_id } => {
                api.delete_peer(peer_id).await?;
                Ok(CommandResult::Ok)
            }
            AdminCommand::CreatePeerRoute(r) => {
                api.create_peer_route(&r.owner_id, &r.cidr).await?;
                Ok(CommandResult::Ok)
            }
            AdminCommand::DeletePeerRoute(r) => {
                api.delete_peer_route(&r.owner_id, &r.cidr).await?;
                Ok(CommandResult::Ok)
            }
            AdminCommand::CreateAllowedEmail(e) => {
                api.create_allowed_email(&e.interface_id, &e.email).await?;
                Ok(CommandResult::Ok)
            }
            AdminCommand::DeleteAllowedEmail(e) => {
                api.delete_allowed_email(&e.interface_id, &e.email).await?;
                Ok(CommandResult::Ok)
            }
        }
    }
}
