// ── Peer lifecycle ──
//
// Resolves whether the caller owns a peer on the selected interface and
// drives create / load / delete of that peer. "Not found" is an expected
// outcome (`Absent`), never an error. Resolutions carry a sequence number;
// a response that arrives after a newer resolution or mutation is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, trace};

use william_api::UserService;

use crate::command::SELECT_INTERFACE;
use crate::error::CoreError;
use crate::model::{PeerConfig, PeerStatus};
use crate::mutation::{Confirmation, Confirmed, MutationGate, MutationOutcome, Proposal};
use crate::store::ResourceCache;

pub const MISSING_IDENTITY: &str = "Enter the email to send as X-Email.";
pub const MISSING_PEER_ID: &str = "There is no peer ID to delete.";

/// Whether the caller has a peer on the selected interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PeerPresence {
    /// Nothing selected, or not resolved yet.
    #[default]
    Unknown,
    Absent,
    Exists { peer_id: String, config: String },
}

impl PeerPresence {
    fn exists(peer: PeerConfig) -> Self {
        Self::Exists {
            peer_id: peer.peer_id,
            config: peer.config,
        }
    }

    pub fn peer_id(&self) -> Option<&str> {
        match self {
            Self::Exists { peer_id, .. } if !peer_id.is_empty() => Some(peer_id),
            _ => None,
        }
    }

    /// Rendered client config, or `""` when there is no peer.
    pub fn config(&self) -> &str {
        match self {
            Self::Exists { config, .. } => config,
            _ => "",
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// A staged deletion of the caller's peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDeletion {
    pub peer_id: String,
}

pub struct PeerLifecycle {
    api: Arc<dyn UserService>,
    require_identity: bool,
    seq: AtomicU64,
    presence: watch::Sender<PeerPresence>,
    gate: MutationGate,
    deletion: Confirmation<PeerDeletion>,
    statuses: Option<ResourceCache<Vec<PeerStatus>>>,
}

impl PeerLifecycle {
    pub fn new(api: Arc<dyn UserService>, require_identity: bool) -> Self {
        let (presence, _) = watch::channel(PeerPresence::Unknown);
        Self {
            api,
            require_identity,
            seq: AtomicU64::new(0),
            presence,
            gate: MutationGate::new(),
            deletion: Confirmation::default(),
            statuses: None,
        }
    }

    /// Refetch the caller's cached status list after every successful
    /// create or delete, before the busy flag clears.
    #[must_use]
    pub fn with_statuses(mut self, statuses: ResourceCache<Vec<PeerStatus>>) -> Self {
        self.statuses = Some(statuses);
        self
    }

    pub fn presence(&self) -> PeerPresence {
        self.presence.borrow().clone()
    }

    pub fn watch_presence(&self) -> watch::Receiver<PeerPresence> {
        self.presence.subscribe()
    }

    pub fn gate(&self) -> &MutationGate {
        &self.gate
    }

    /// The identity to send for `email`, or a validation error when one
    /// is required and missing.
    fn identity<'a>(&self, email: &'a str) -> Result<Option<&'a str>, CoreError> {
        let email = email.trim();
        match (email.is_empty(), self.require_identity) {
            (true, true) => Err(CoreError::validation(MISSING_IDENTITY)),
            (true, false) => Ok(None),
            (false, _) => Ok(Some(email)),
        }
    }

    /// Start a new generation; in-flight resolutions become stale.
    fn bump(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, seq: u64) -> bool {
        self.seq.load(Ordering::SeqCst) == seq
    }

    async fn revalidate_statuses(&self, identity: Option<&str>) {
        if let Some(statuses) = &self.statuses {
            statuses
                .revalidate_existing(identity.unwrap_or_default())
                .await;
        }
    }

    /// Forget the resolved peer (selection or identity changed).
    pub fn reset(&self) {
        self.bump();
        self.deletion.cancel();
        self.presence.send_replace(PeerPresence::Unknown);
    }

    // ── Resolution ───────────────────────────────────────────────────

    /// Ask the server for the caller's peer on `interface_id`.
    ///
    /// Not-found yields `Absent` without an error. Any other failure is
    /// reported and leaves presence as it was.
    pub async fn resolve_peer(&self, interface_id: &str, email: &str) -> PeerPresence {
        let seq = self.bump();
        if interface_id.is_empty() {
            self.presence.send_replace(PeerPresence::Unknown);
            return PeerPresence::Unknown;
        }
        let identity = match self.identity(email) {
            Ok(identity) => identity,
            Err(err) => {
                self.gate.report(&err);
                return self.presence();
            }
        };

        self.gate.clear_error();
        debug!(interface_id, "resolving peer");
        let result = self
            .api
            .get_my_peer_by_interface(identity, interface_id)
            .await
            .map_err(CoreError::from);

        if !self.is_current(seq) {
            trace!(interface_id, seq, "discarding superseded peer resolution");
            return self.presence();
        }
        match result {
            Ok(peer) => {
                self.presence.send_replace(PeerPresence::exists(peer.into()));
            }
            Err(err) if err.is_not_found() => {
                self.presence.send_replace(PeerPresence::Absent);
            }
            Err(err) => self.gate.report(&err),
        }
        self.presence()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Provision a peer on `interface_id`. Fails on any error, including
    /// an existing peer.
    pub async fn create_peer(&self, interface_id: &str, email: &str) -> MutationOutcome<PeerConfig> {
        self.gate
            .run("create_peer", || async move {
                if interface_id.is_empty() {
                    return Err(CoreError::validation(SELECT_INTERFACE));
                }
                let identity = self.identity(email)?;
                let peer: PeerConfig = self.api.create_peer(identity, interface_id).await?.into();
                self.bump();
                self.presence.send_replace(PeerPresence::exists(peer.clone()));
                self.revalidate_statuses(identity).await;
                Ok(peer)
            })
            .await
    }

    /// Load the caller's peer on whichever interface the server picks.
    pub async fn load_my_peer(&self, email: &str) -> MutationOutcome<PeerConfig> {
        self.gate
            .run("load_my_peer", || async move {
                let identity = self.identity(email)?;
                let peer: PeerConfig = self.api.get_my_peer(identity).await?.into();
                self.bump();
                self.presence.send_replace(PeerPresence::exists(peer.clone()));
                Ok(peer)
            })
            .await
    }

    /// Stage deletion of the current peer.
    pub fn propose_delete(&self) -> Result<Proposal, CoreError> {
        let Some(peer_id) = self.presence().peer_id().map(str::to_owned) else {
            let err = CoreError::validation(MISSING_PEER_ID);
            self.gate.report(&err);
            return Err(err);
        };
        let prompt = format!("Delete peer {peer_id}?");
        Ok(self.deletion.propose(PeerDeletion { peer_id }, prompt))
    }

    pub fn confirm_delete(&self, proposal: &Proposal) -> Option<Confirmed<PeerDeletion>> {
        self.deletion.confirm(proposal)
    }

    pub fn cancel_delete(&self) {
        self.deletion.cancel();
    }

    pub async fn delete_peer(
        &self,
        deletion: Confirmed<PeerDeletion>,
        email: &str,
    ) -> MutationOutcome<()> {
        let PeerDeletion { peer_id } = deletion.into_inner();
        self.gate
            .run("delete_peer", || async move {
                if peer_id.is_empty() {
                    return Err(CoreError::validation(MISSING_PEER_ID));
                }
                let identity = self.identity(email)?;
                self.api.delete_peer(identity, &peer_id).await?;
                self.bump();
                self.presence.send_replace(PeerPresence::Absent);
                self.revalidate_statuses(identity).await;
                Ok(())
            })
            .await
    }
}
