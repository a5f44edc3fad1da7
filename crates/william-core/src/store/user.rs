// ── End-user resource store ──
//
// Caches keyed by the caller's email. With `require_identity` set, an
// empty email gates every fetch; otherwise the empty key fetches without
// an `X-Email` header and lets the upstream proxy supply identity.

use std::sync::Arc;

use william_api::UserService;

use super::{ResourceCache, ResourceKind, gate};
use crate::config::ServiceConfig;
use crate::error::CoreError;
use crate::model::{Interface, PeerStatus};

pub struct UserStore {
    interfaces: ResourceCache<Vec<Interface>>,
    peer_statuses: ResourceCache<Vec<PeerStatus>>,
    require_identity: bool,
}

impl UserStore {
    pub fn new(api: Arc<dyn UserService>, config: &ServiceConfig) -> Self {
        let a = Arc::clone(&api);
        let interfaces = ResourceCache::new(ResourceKind::UserInterfaces, None, move |email| {
            let api = Arc::clone(&a);
            async move {
                let list = api.list_wireguard_interfaces(gate(&email)).await?;
                Ok::<_, CoreError>(list.into_iter().map(Interface::from).collect())
            }
        });

        let a = api;
        let peer_statuses = ResourceCache::new(
            ResourceKind::PeerStatuses,
            Some(config.peer_status_poll),
            move |email| {
                let api = Arc::clone(&a);
                async move {
                    let list = api.list_peer_statuses(gate(&email)).await?;
                    Ok::<_, CoreError>(list.into_iter().map(PeerStatus::from).collect())
                }
            },
        );

        Self {
            interfaces,
            peer_statuses,
            require_identity: config.require_identity,
        }
    }

    pub fn require_identity(&self) -> bool {
        self.require_identity
    }

    /// Fetch key for `email` under the identity rule.
    pub fn identity_key<'a>(&self, email: &'a str) -> Option<&'a str> {
        if self.require_identity {
            gate(email)
        } else {
            Some(email)
        }
    }

    pub fn interfaces(&self) -> &ResourceCache<Vec<Interface>> {
        &self.interfaces
    }

    pub fn peer_statuses(&self) -> &ResourceCache<Vec<PeerStatus>> {
        &self.peer_statuses
    }
}
