// In-memory service fakes for view-model tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;

use william_api::types::{
    AdminInterface, AdminPeer, AllowedEmail, CreateInterfaceRequest, InterfaceRoute, PeerConfig,
    PeerRoute, PeerStat, PeerStatus, UpdateInterfaceRequest, WireguardConfig, WireguardInterface,
};
use william_api::{AdminService, Code, Error, UserService};

use crate::store::lock;

pub(crate) fn rpc_error(code: Code, message: &str) -> Error {
    Error::Rpc {
        code,
        message: message.to_owned(),
        status: 400,
    }
}

/// Call log, injected failures and one-shot holds shared by both fakes.
#[derive(Default)]
pub(crate) struct Script {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, (Code, String)>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
}

impl Script {
    pub(crate) fn calls(&self, method: &str) -> usize {
        lock(&self.calls).iter().filter(|m| *m == method).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Every later call to `method` fails with `code`.
    pub(crate) fn fail(&self, method: &str, code: Code, message: &str) {
        lock(&self.failures).insert(method.to_owned(), (code, message.to_owned()));
    }

    pub(crate) fn heal(&self, method: &str) {
        lock(&self.failures).remove(method);
    }

    /// The next call to `method` waits until the returned handle is notified.
    pub(crate) fn hold(&self, method: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        lock(&self.holds).insert(method.to_owned(), Arc::clone(&notify));
        notify
    }

    async fn enter(&self, method: &str) -> Result<(), Error> {
        lock(&self.calls).push(method.to_owned());
        let hold = lock(&self.holds).remove(method);
        if let Some(hold) = hold {
            hold.notified().await;
        }
        let failure = lock(&self.failures).get(method).cloned();
        match failure {
            Some((code, message)) => Err(rpc_error(code, &message)),
            None => Ok(()),
        }
    }
}

// ── Admin ────────────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct AdminState {
    pub interfaces: Vec<AdminInterface>,
    pub peers: Vec<AdminPeer>,
    pub interface_routes: Vec<InterfaceRoute>,
    pub peer_routes: Vec<PeerRoute>,
    pub emails: Vec<AllowedEmail>,
    pub configs: Vec<WireguardConfig>,
    pub firewall: String,
    pub stats: Vec<PeerStat>,
}

#[derive(Default)]
pub(crate) struct FakeAdmin {
    pub script: Script,
    state: Mutex<AdminState>,
    next_id: Mutex<u32>,
}

pub(crate) fn admin_interface(id: &str) -> AdminInterface {
    AdminInterface {
        id: id.to_owned(),
        name: id.to_uppercase(),
        address: "10.8.0.1/24".to_owned(),
        listen_port: 51820,
        mtu: 1420,
        endpoint: "vpn.example.com:51820".to_owned(),
        public_key: format!("{id}-pub"),
    }
}

pub(crate) fn admin_peer(peer_id: &str, interface_id: &str, email: &str) -> AdminPeer {
    AdminPeer {
        peer_id: peer_id.to_owned(),
        email: email.to_owned(),
        interface_id: interface_id.to_owned(),
        allowed_ip: "10.8.0.2/32".to_owned(),
        created_at: None,
    }
}

impl FakeAdmin {
    pub(crate) fn with_interfaces(ids: &[&str]) -> Arc<Self> {
        let fake = Self::default();
        fake.state().interfaces = ids.iter().map(|id| admin_interface(id)).collect();
        Arc::new(fake)
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, AdminState> {
        lock(&self.state)
    }

    fn interface_from(&self, request: &CreateInterfaceRequest, id: Option<&str>) -> AdminInterface {
        let id = id.map_or_else(
            || {
                let mut next = lock(&self.next_id);
                *next += 1;
                format!("if-{next}")
            },
            str::to_owned,
        );
        AdminInterface {
            public_key: format!("{id}-pub"),
            id,
            name: request.name.clone(),
            address: request.address.clone(),
            listen_port: request.listen_port,
            mtu: request.mtu,
            endpoint: request.endpoint.clone(),
        }
    }
}

#[async_trait]
impl AdminService for FakeAdmin {
    async fn list_interfaces(&self) -> Result<Vec<AdminInterface>, Error> {
        self.script.enter("list_interfaces").await?;
        Ok(self.state().interfaces.clone())
    }

    async fn create_interface(
        &self,
        request: &CreateInterfaceRequest,
    ) -> Result<AdminInterface, Error> {
        self.script.enter("create_interface").await?;
        let created = self.interface_from(request, None);
        self.state().interfaces.push(created.clone());
        Ok(created)
    }

    async fn update_interface(
        &self,
        request: &UpdateInterfaceRequest,
    ) -> Result<AdminInterface, Error> {
        self.script.enter("update_interface").await?;
        let create = CreateInterfaceRequest {
            name: request.name.clone(),
            address: request.address.clone(),
            listen_port: request.listen_port,
            mtu: request.mtu,
            endpoint: request.endpoint.clone(),
        };
        let updated = self.interface_from(&create, Some(request.id.as_str()));
        let mut state = self.state();
        let slot = state
            .interfaces
            .iter_mut()
            .find(|i| i.id == request.id)
            .ok_or_else(|| rpc_error(Code::NotFound, "interface not found"))?;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete_interface(&self, id: &str) -> Result<(), Error> {
        self.script.enter("delete_interface").await?;
        let mut state = self.state();
        state.interfaces.retain(|i| i.id != id);
        state.peers.retain(|p| p.interface_id != id);
        Ok(())
    }

    async fn list_interface_routes(&self, interface_id: &str) -> Result<Vec<InterfaceRoute>, Error> {
        self.script.enter("list_interface_routes").await?;
        Ok(self
            .state()
            .interface_routes
            .iter()
            .filter(|r| r.interface_id == interface_id)
            .cloned()
            .collect())
    }

    async fn create_interface_route(&self, interface_id: &str, cidr: &str) -> Result<(), Error> {
        self.script.enter("create_interface_route").await?;
        self.state().interface_routes.push(InterfaceRoute {
            interface_id: interface_id.to_owned(),
            cidr: cidr.to_owned(),
            created_at: None,
        });
        Ok(())
    }

    async fn delete_interface_route(&self, interface_id: &str, cidr: &str) -> Result<(), Error> {
        self.script.enter("delete_interface_route").await?;
        self.state()
            .interface_routes
            .retain(|r| !(r.interface_id == interface_id && r.cidr == cidr));
        Ok(())
    }

    async fn list_peers(&self, interface_id: &str) -> Result<Vec<AdminPeer>, Error> {
        self.script.enter("list_peers").await?;
        Ok(self
            .state()
            .peers
            .iter()
            .filter(|p| interface_id.is_empty() || p.interface_id == interface_id)
            .cloned()
            .collect())
    }

    async fn delete_peer(&self, peer_id: &str) -> Result<(), Error> {
        self.script.enter("delete_peer").await?;
        self.state().peers.retain(|p| p.peer_id != peer_id);
        Ok(())
    }

    async fn list_peer_routes(&self, peer_id: &str) -> Result<Vec<PeerRoute>, Error> {
        self.script.enter("list_peer_routes").await?;
        Ok(self
            .state()
            .peer_routes
            .iter()
            .filter(|r| r.peer_id == peer_id)
            .cloned()
            .collect())
    }

    async fn create_peer_route(&self, peer_id: &str, cidr: &str) -> Result<(), Error> {
        self.script.enter("create_peer_route").await?;
        self.state().peer_routes.push(PeerRoute {
            peer_id: peer_id.to_owned(),
            cidr: cidr.to_owned(),
            created_at: None,
        });
        Ok(())
    }

    async fn delete_peer_route(&self, peer_id: &str, cidr: &str) -> Result<(), Error> {
        self.script.enter("delete_peer_route").await?;
        self.state()
            .peer_routes
            .retain(|r| !(r.peer_id == peer_id && r.cidr == cidr));
        Ok(())
    }

    async fn list_allowed_emails(&self, interface_id: &str) -> Result<Vec<AllowedEmail>, Error> {
        self.script.enter("list_allowed_emails").await?;
        Ok(self
            .state()
            .emails
            .iter()
            .filter(|e| e.interface_id == interface_id)
            .cloned()
            .collect())
    }

    async fn create_allowed_email(&self, interface_id: &str, email: &str) -> Result<(), Error> {
        self.script.enter("create_allowed_email").await?;
        let mut state = self.state();
        if state
            .emails
            .iter()
            .any(|e| e.interface_id == interface_id && e.email == email)
        {
            return Err(rpc_error(Code::AlreadyExists, "email already allowed"));
        }
        state.emails.push(AllowedEmail {
            interface_id: interface_id.to_owned(),
            email: email.to_owned(),
            created_at: None,
        });
        Ok(())
    }

    async fn delete_allowed_email(&self, interface_id: &str, email: &str) -> Result<(), Error> {
        self.script.enter("delete_allowed_email").await?;
        self.state()
            .emails
            .retain(|e| !(e.interface_id == interface_id && e.email == email));
        Ok(())
    }

    async fn list_wireguard_configs(
        &self,
        interface_id: &str,
    ) -> Result<Vec<WireguardConfig>, Error> {
        self.script.enter("list_wireguard_configs").await?;
        Ok(self
            .state()
            .configs
            .iter()
            .filter(|c| c.interface_id == interface_id)
            .cloned()
            .collect())
    }

    async fn get_firewall_rules(&self) -> Result<String, Error> {
        self.script.enter("get_firewall_rules").await?;
        Ok(self.state().firewall.clone())
    }

    async fn list_peer_stats(&self) -> Result<Vec<PeerStat>, Error> {
        self.script.enter("list_peer_stats").await?;
        Ok(self.state().stats.clone())
    }
}

// ── User ─────────────────────────────────────────────────────────────

pub(crate) struct OwnedPeer {
    pub email: String,
    pub interface_id: String,
    pub peer: PeerConfig,
}

#[derive(Default)]
pub(crate) struct UserState {
    pub interfaces: Vec<WireguardInterface>,
    /// Per-identity interface lists; identities not listed see `interfaces`.
    pub interfaces_for: HashMap<String, Vec<WireguardInterface>>,
    pub peers: Vec<OwnedPeer>,
    pub statuses: Vec<PeerStatus>,
    /// Identity passed on each call, in order.
    pub identities: Vec<Option<String>>,
}

#[derive(Default)]
pub(crate) struct FakeUser {
    pub script: Script,
    state: Mutex<UserState>,
}

pub(crate) fn user_interface(id: &str) -> WireguardInterface {
    WireguardInterface {
        id: id.to_owned(),
        name: id.to_uppercase(),
        address: "10.8.0.1/24".to_owned(),
        listen_port: 51820,
        mtu: 1420,
        public_key: format!("{id}-pub"),
    }
}

impl FakeUser {
    pub(crate) fn with_interfaces(ids: &[&str]) -> Arc<Self> {
        let fake = Self::default();
        fake.state().interfaces = ids.iter().map(|id| user_interface(id)).collect();
        Arc::new(fake)
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, UserState> {
        lock(&self.state)
    }

    pub(crate) fn add_peer(&self, email: &str, interface_id: &str, peer_id: &str) {
        self.state().peers.push(OwnedPeer {
            email: email.to_owned(),
            interface_id: interface_id.to_owned(),
            peer: PeerConfig {
                peer_id: peer_id.to_owned(),
                peer_config: format!("[Interface]\n# {peer_id}\n"),
            },
        });
    }

    fn record(&self, identity: Option<&str>) -> String {
        let mut state = self.state();
        state.identities.push(identity.map(str::to_owned));
        identity.unwrap_or_default().to_owned()
    }
}

#[async_trait]
impl UserService for FakeUser {
    async fn list_wireguard_interfaces(
        &self,
        identity: Option<&str>,
    ) -> Result<Vec<WireguardInterface>, Error> {
        let email = self.record(identity);
        self.script.enter("list_wireguard_interfaces").await?;
        let state = self.state();
        Ok(state
            .interfaces_for
            .get(&email)
            .unwrap_or(&state.interfaces)
            .clone())
    }

    async fn get_my_peer(&self, identity: Option<&str>) -> Result<PeerConfig, Error> {
        let email = self.record(identity);
        self.script.enter("get_my_peer").await?;
        self.state()
            .peers
            .iter()
            .find(|p| p.email == email)
            .map(|p| p.peer.clone())
            .ok_or_else(|| rpc_error(Code::NotFound, "peer not found"))
    }

    async fn get_my_peer_by_interface(
        &self,
        identity: Option<&str>,
        interface_id: &str,
    ) -> Result<PeerConfig, Error> {
        let email = self.record(identity);
        self.script.enter("get_my_peer_by_interface").await?;
        self.state()
            .peers
            .iter()
            .find(|p| p.email == email && p.interface_id == interface_id)
            .map(|p| p.peer.clone())
            .ok_or_else(|| rpc_error(Code::NotFound, "peer not found"))
    }

    async fn create_peer(
        &self,
        identity: Option<&str>,
        interface_id: &str,
    ) -> Result<PeerConfig, Error> {
        let email = self.record(identity);
        self.script.enter("create_peer").await?;
        let exists = self
            .state()
            .peers
            .iter()
            .any(|p| p.email == email && p.interface_id == interface_id);
        if exists {
            return Err(rpc_error(Code::AlreadyExists, "peer already exists"));
        }
        let peer_id = format!("{email}@{interface_id}");
        self.add_peer(&email, interface_id, &peer_id);
        self.state()
            .peers
            .last()
            .map(|p| p.peer.clone())
            .ok_or_else(|| rpc_error(Code::Internal, "peer vanished"))
    }

    async fn delete_peer(&self, identity: Option<&str>, peer_id: &str) -> Result<(), Error> {
        self.record(identity);
        self.script.enter("delete_peer").await?;
        let mut state = self.state();
        let before = state.peers.len();
        state.peers.retain(|p| p.peer.peer_id != peer_id);
        if state.peers.len() == before {
            return Err(rpc_error(Code::NotFound, "peer not found"));
        }
        Ok(())
    }

    async fn list_peer_statuses(&self, identity: Option<&str>) -> Result<Vec<PeerStatus>, Error> {
        self.record(identity);
        self.script.enter("list_peer_statuses").await?;
        Ok(self.state().statuses.clone())
    }
}
