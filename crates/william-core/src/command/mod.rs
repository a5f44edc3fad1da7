// ── Command API ──
//
// Every admin mutation flows through `AdminCommand`. A command knows how
// to validate itself, whether it needs explicit confirmation, and which
// cache entries it can affect once it succeeds.

pub mod requests;

use serde::Serialize;

use crate::model::{Interface, InterfaceSpec};
use crate::store::{Invalidation, ResourceKind};

pub use requests::{AllowedEmailRequest, RouteRequest, parse_cidr};

pub(crate) const SELECT_INTERFACE: &str = "Select an interface first.";
pub(crate) const SELECT_PEER: &str = "Select a peer first.";

/// All admin mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AdminCommand {
    // ── Interfaces ───────────────────────────────────────────────────
    CreateInterface(InterfaceSpec),
    UpdateInterface { id: String, spec: InterfaceSpec },
    DeleteInterface { id: String },
    CreateInterfaceRoute(RouteRequest),
    DeleteInterfaceRoute(RouteRequest),

    // ── Peers ────────────────────────────────────────────────────────
    DeletePeer { peer_id: String },
    CreatePeerRoute(RouteRequest),
    DeletePeerRoute(RouteRequest),

    // ── Allowed emails ───────────────────────────────────────────────
    CreateAllowedEmail(AllowedEmailRequest),
    DeleteAllowedEmail(AllowedEmailRequest),
}

/// What a completed command hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    Interface(Interface),
}

impl CommandResult {
    pub fn interface(self) -> Option<Interface> {
        match self {
            Self::Interface(interface) => Some(interface),
            Self::Ok => None,
        }
    }
}

impl AdminCommand {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateInterface(_) => "create_interface",
            Self::UpdateInterface { .. } => "update_interface",
            Self::DeleteInterface { .. } => "delete_interface",
            Self::CreateInterfaceRoute(_) => "create_interface_route",
            Self::DeleteInterfaceRoute(_) => "delete_interface_route",
            Self::DeletePeer { .. } => "delete_peer",
            Self::CreatePeerRoute(_) => "create_peer_route",
            Self::DeletePeerRoute(_) => "delete_peer_route",
            Self::CreateAllowedEmail(_) => "create_allowed_email",
            Self::DeleteAllowedEmail(_) => "delete_allowed_email",
        }
    }

    /// Commands that must go through `propose` / `confirm`.
    ///
    /// Every delete, plus interface updates and route additions (both
    /// rewrite the live WireGuard configuration).
    pub fn requires_confirmation(&self) -> bool {
        !matches!(
            self,
            Self::CreateInterface(_) | Self::CreateAllowedEmail(_)
        )
    }

    /// Prompt text for the confirmation step.
    pub fn prompt(&self) -> String {
        match self {
            Self::CreateInterface(spec) => format!("Create interface {}?", spec.name.trim()),
            Self::UpdateInterface { spec, .. } => {
                format!("Update interface {}?", spec.name.trim())
            }
            Self::DeleteInterface { id } => format!("Delete interface {id}?"),
            Self::CreateInterfaceRoute(r) => format!("Add route {} to interface {}?", r.cidr, r.owner_id),
            Self::DeleteInterfaceRoute(r) => {
                format!("Remove route {} from interface {}?", r.cidr, r.owner_id)
            }
            Self::DeletePeer { peer_id } => format!("Delete peer {peer_id}?"),
            Self::CreatePeerRoute(r) => format!("Add route {} to peer {}?", r.cidr, r.owner_id),
            Self::DeletePeerRoute(r) => format!("Remove route {} from peer {}?", r.cidr, r.owner_id),
            Self::CreateAllowedEmail(e) => {
                format!("Allow {} on interface {}?", e.email, e.interface_id)
            }
            Self::DeleteAllowedEmail(e) => {
                format!("Remove {} from interface {}?", e.email, e.interface_id)
            }
        }
    }

    /// Local checks. A failure here means no network call is made.
    pub fn validate(&self) -> Result<(), crate::error::CoreError> {
        use crate::error::CoreError;

        match self {
            Self::CreateInterface(spec) => spec.validate(),
            Self::UpdateInterface { id, spec } => {
                if id.is_empty() {
                    return Err(CoreError::validation(SELECT_INTERFACE));
                }
                spec.validate()
            }
            Self::DeleteInterface { id } => {
                if id.is_empty() {
                    return Err(CoreError::validation(SELECT_INTERFACE));
                }
                Ok(())
            }
            Self::CreateInterfaceRoute(r) | Self::DeleteInterfaceRoute(r) => {
                r.validate(SELECT_INTERFACE)
            }
            Self::DeletePeer { peer_id } => {
                if peer_id.is_empty() {
                    return Err(CoreError::validation(SELECT_PEER));
                }
                Ok(())
            }
            Self::CreatePeerRoute(r) | Self::DeletePeerRoute(r) => r.validate(SELECT_PEER),
            Self::CreateAllowedEmail(e) | Self::DeleteAllowedEmail(e) => e.validate(),
        }
    }

    /// Cache effects of this command succeeding.
    pub fn invalidations(&self) -> Vec<Invalidation> {
        use ResourceKind as K;

        match self {
            Self::CreateInterface(_) => vec![
                Invalidation::all(K::Interfaces),
                Invalidation::all(K::WireguardConfigs),
            ],
            Self::UpdateInterface { id, .. } => vec![
                Invalidation::all(K::Interfaces),
                Invalidation::key(K::WireguardConfigs, id),
                Invalidation::all(K::Peers),
            ],
            Self::DeleteInterface { id } => vec![
                Invalidation::all(K::Interfaces),
                Invalidation::all(K::Peers),
                Invalidation::all(K::PeerStats),
                Invalidation::discard(K::InterfaceRoutes, id),
                Invalidation::discard(K::AllowedEmails, id),
                Invalidation::discard(K::WireguardConfigs, id),
            ],
            Self::CreateInterfaceRoute(r) | Self::DeleteInterfaceRoute(r) => vec![
                Invalidation::key(K::InterfaceRoutes, &r.owner_id),
                Invalidation::key(K::WireguardConfigs, &r.owner_id),
                Invalidation::all(K::FirewallRules),
            ],
            Self::DeletePeer { peer_id } => vec![
                Invalidation::all(K::Peers),
                Invalidation::all(K::PeerStats),
                Invalidation::all(K::WireguardConfigs),
                Invalidation::discard(K::PeerRoutes, peer_id),
            ],
            Self::CreatePeerRoute(r) | Self::DeletePeerRoute(r) => vec![
                Invalidation::key(K::PeerRoutes, &r.owner_id),
                Invalidation::all(K::FirewallRules),
            ],
            Self::CreateAllowedEmail(e) | Self::DeleteAllowedEmail(e) => {
                vec![Invalidation::key(K::AllowedEmails, &e.interface_id)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletes_require_confirmation() {
        assert!(AdminCommand::DeleteInterface { id: "wg0".into() }.requires_confirmation());
        assert!(AdminCommand::DeletePeer { peer_id: "p1".into() }.requires_confirmation());
        assert!(
            AdminCommand::DeleteAllowedEmail(AllowedEmailRequest::new("wg0", "a@example.com"))
                .requires_confirmation()
        );
        assert!(
            !AdminCommand::CreateAllowedEmail(AllowedEmailRequest::new("wg0", "a@example.com"))
                .requires_confirmation()
        );
    }

    #[test]
    fn peer_route_invalidates_owner_key() {
        let cmd = AdminCommand::CreatePeerRoute(RouteRequest::new("p1", "10.0.0.0/24"));
        let effects = cmd.invalidations();
        assert!(effects.contains(&Invalidation::key(ResourceKind::PeerRoutes, "p1")));
        assert!(effects.contains(&Invalidation::all(ResourceKind::FirewallRules)));
    }

    #[test]
    fn deleting_interface_discards_dependents() {
        let effects = AdminCommand::DeleteInterface { id: "wg0".into() }.invalidations();
        assert!(effects.contains(&Invalidation::discard(ResourceKind::InterfaceRoutes, "wg0")));
        assert!(effects.contains(&Invalidation::discard(ResourceKind::AllowedEmails, "wg0")));
    }

    #[test]
    fn route_without_selection_fails_validation() {
        let cmd = AdminCommand::CreateInterfaceRoute(RouteRequest::new("", "10.0.0.0/24"));
        assert_eq!(
            cmd.validate().map_err(|e| e.display_message()),
            Err(SELECT_INTERFACE.to_owned())
        );
    }
}
