// Client for the administrative service (`admin.v1.WilliamAdminService`).

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Serialize;
use url::Url;

use crate::connect::ConnectClient;
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{
    AdminInterface, AdminPeer, AllowedEmail, CreateInterfaceRequest, Empty,
    FirewallRulesResponse, InterfaceResponse, InterfaceRoute, ListAllowedEmailsResponse,
    ListInterfaceRoutesResponse, ListInterfacesResponse, ListPeerRoutesResponse,
    ListPeerStatsResponse, ListPeersResponse, ListWireguardConfigsResponse, PeerRoute, PeerStat,
    UpdateInterfaceRequest, WireguardConfig,
};

pub const ADMIN_SERVICE: &str = "admin.v1.WilliamAdminService";

/// Default admin base URL when no deployment override is configured.
pub const DEFAULT_ADMIN_BASE_URL: &str = "http://localhost:8081/api";

/// Every operation the admin console can perform against the server.
#[async_trait]
pub trait AdminService: Send + Sync {
    async fn list_interfaces(&self) -> Result<Vec<AdminInterface>, Error>;
    async fn create_interface(
        &self,
        request: &CreateInterfaceRequest,
    ) -> Result<AdminInterface, Error>;
    async fn update_interface(
        &self,
        request: &UpdateInterfaceRequest,
    ) -> Result<AdminInterface, Error>;
    async fn delete_interface(&self, id: &str) -> Result<(), Error>;

    async fn list_interface_routes(&self, interface_id: &str) -> Result<Vec<InterfaceRoute>, Error>;
    async fn create_interface_route(&self, interface_id: &str, cidr: &str) -> Result<(), Error>;
    async fn delete_interface_route(&self, interface_id: &str, cidr: &str) -> Result<(), Error>;

    /// An empty `interface_id` lists peers across all interfaces.
    async fn list_peers(&self, interface_id: &str) -> Result<Vec<AdminPeer>, Error>;
    async fn delete_peer(&self, peer_id: &str) -> Result<(), Error>;

    async fn list_peer_routes(&self, peer_id: &str) -> Result<Vec<PeerRoute>, Error>;
    async fn create_peer_route(&self, peer_id: &str, cidr: &str) -> Result<(), Error>;
    async fn delete_peer_route(&self, peer_id: &str, cidr: &str) -> Result<(), Error>;

    async fn list_allowed_emails(&self, interface_id: &str) -> Result<Vec<AllowedEmail>, Error>;
    async fn create_allowed_email(&self, interface_id: &str, email: &str) -> Result<(), Error>;
    async fn delete_allowed_email(&self, interface_id: &str, email: &str) -> Result<(), Error>;

    async fn list_wireguard_configs(
        &self,
        interface_id: &str,
    ) -> Result<Vec<WireguardConfig>, Error>;
    async fn get_firewall_rules(&self) -> Result<String, Error>;
    async fn list_peer_stats(&self) -> Result<Vec<PeerStat>, Error>;
}

// ── Request bodies ───────────────────────────────────────────────────

#[derive(Serialize)]
struct ById<'a> {
    id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ByInterface<'a> {
    interface_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ByPeer<'a> {
    peer_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InterfaceCidr<'a> {
    interface_id: &'a str,
    cidr: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PeerCidr<'a> {
    peer_id: &'a str,
    cidr: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InterfaceEmail<'a> {
    interface_id: &'a str,
    email: &'a str,
}

// ── Client ───────────────────────────────────────────────────────────

/// HTTP implementation of [`AdminService`].
#[derive(Debug, Clone)]
pub struct AdminClient {
    inner: ConnectClient,
}

impl AdminClient {
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            inner: ConnectClient::new(base_url, ADMIN_SERVICE, transport)?,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            inner: ConnectClient::with_client(http, base_url, ADMIN_SERVICE),
        }
    }

    pub fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    async fn call<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, Error>
    where
        Req: Serialize + Sync + ?Sized,
        Resp: serde::de::DeserializeOwned,
    {
        self.inner.unary(method, request, HeaderMap::new()).await
    }

    async fn call_empty<Req: Serialize + Sync + ?Sized>(
        &self,
        method: &str,
        request: &Req,
    ) -> Result<(), Error> {
        let _: Empty = self.call(method, request).await?;
        Ok(())
    }
}

#[async_trait]
impl AdminService for AdminClient {
    async fn list_interfaces(&self) -> Result<Vec<AdminInterface>, Error> {
        let resp: ListInterfacesResponse = self.call("ListInterfaces", &Empty {}).await?;
        Ok(resp.interfaces)
    }

    async fn create_interface(
        &self,
        request: &CreateInterfaceRequest,
    ) -> Result<AdminInterface, Error> {
        let resp: InterfaceResponse = self.call("CreateInterface", request).await?;
        Ok(resp.interface)
    }

    async fn update_interface(
        &self,
        request: &UpdateInterfaceRequest,
    ) -> Result<AdminInterface, Error> {
        let resp: InterfaceResponse = self.call("UpdateInterface", request).await?;
        Ok(resp.interface)
    }

    async fn delete_interface(&self, id: &str) -> Result<(), Error> {
        self.call_empty("DeleteInterface", &ById { id }).await
    }

    async fn list_interface_routes(&self, interface_id: &str) -> Result<Vec<InterfaceRoute>, Error> {
        let resp: ListInterfaceRoutesResponse = self
            .call("ListInterfaceRoutes", &ByInterface { interface_id })
            .await?;
        Ok(resp.routes)
    }

    async fn create_interface_route(&self, interface_id: &str, cidr: &str) -> Result<(), Error> {
        self.call_empty("CreateInterfaceRoute", &InterfaceCidr { interface_id, cidr })
            .await
    }

    async fn delete_interface_route(&self, interface_id: &str, cidr: &str) -> Result<(), Error> {
        self.call_empty("DeleteInterfaceRoute", &InterfaceCidr { interface_id, cidr })
            .await
    }

    async fn list_peers(&self, interface_id: &str) -> Result<Vec<AdminPeer>, Error> {
        let resp: ListPeersResponse = self.call("ListPeers", &ByInterface { interface_id }).await?;
        Ok(resp.peers)
    }

    async fn delete_peer(&self, peer_id: &str) -> Result<(), Error> {
        self.call_empty("DeletePeer", &ByPeer { peer_id }).await
    }

    async fn list_peer_routes(&self, peer_id: &str) -> Result<Vec<PeerRoute>, Error> {
        let resp: ListPeerRoutesResponse = self.call("ListPeerRoutes", &ByPeer { peer_id }).await?;
        Ok(resp.routes)
    }

    async fn create_peer_route(&self, peer_id: &str, cidr: &str) -> Result<(), Error> {
        self.call_empty("CreatePeerRoute", &PeerCidr { peer_id, cidr })
            .await
    }

    async fn delete_peer_route(&self, peer_id: &str, cidr: &str) -> Result<(), Error> {
        self.call_empty("DeletePeerRoute", &PeerCidr { peer_id, cidr })
            .await
    }

    async fn list_allowed_emails(&self, interface_id: &str) -> Result<Vec<AllowedEmail>, Error> {
        let resp: ListAllowedEmailsResponse = self
            .call("ListAllowedEmails", &ByInterface { interface_id })
            .await?;
        Ok(resp.emails)
    }

    async fn create_allowed_email(&self, interface_id: &str, email: &str) -> Result<(), Error> {
        self.call_empty("CreateAllowedEmail", &InterfaceEmail { interface_id, email })
            .await
    }

    async fn delete_allowed_email(&self, interface_id: &str, email: &str) -> Result<(), Error> {
        self.call_empty("DeleteAllowedEmail", &InterfaceEmail { interface_id, email })
            .await
    }

    async fn list_wireguard_configs(
        &self,
        interface_id: &str,
    ) -> Result<Vec<WireguardConfig>, Error> {
        let resp: ListWireguardConfigsResponse = self
            .call("ListWireguardConfigs", &ByInterface { interface_id })
            .await?;
        Ok(resp.configs)
    }

    async fn get_firewall_rules(&self) -> Result<String, Error> {
        let resp: FirewallRulesResponse = self.call("GetFirewallRules", &Empty {}).await?;
        Ok(resp.rules)
    }

    async fn list_peer_stats(&self) -> Result<Vec<PeerStat>, Error> {
        let resp: ListPeerStatsResponse = self.call("ListPeerStats", &Empty {}).await?;
        Ok(resp.stats)
    }
}
