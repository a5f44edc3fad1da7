// Client for the public service (`server.v1.WilliamService`).
//
// Every call optionally carries the caller's email in `X-Email`. In
// production an upstream proxy injects it; in development the console
// supplies it explicitly.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use url::Url;

use crate::connect::ConnectClient;
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{
    Empty, ListPeerStatusesResponse, ListWireguardInterfacesResponse, PeerConfig, PeerStatus,
    WireguardInterface,
};

pub const USER_SERVICE: &str = "server.v1.WilliamService";

/// Default public base URL when no deployment override is configured.
pub const DEFAULT_USER_BASE_URL: &str = "http://localhost:8080";

/// Header carrying the caller's identity.
pub const IDENTITY_HEADER: &str = "x-email";

/// Per-user operations. `identity` is the caller's email, when known.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn list_wireguard_interfaces(
        &self,
        identity: Option<&str>,
    ) -> Result<Vec<WireguardInterface>, Error>;

    /// The caller's peer on whichever interface the server picks.
    async fn get_my_peer(&self, identity: Option<&str>) -> Result<PeerConfig, Error>;

    async fn get_my_peer_by_interface(
        &self,
        identity: Option<&str>,
        interface_id: &str,
    ) -> Result<PeerConfig, Error>;

    async fn create_peer(
        &self,
        identity: Option<&str>,
        interface_id: &str,
    ) -> Result<PeerConfig, Error>;

    async fn delete_peer(&self, identity: Option<&str>, peer_id: &str) -> Result<(), Error>;

    async fn list_peer_statuses(&self, identity: Option<&str>) -> Result<Vec<PeerStatus>, Error>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ByInterface<'a> {
    interface_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePeer<'a> {
    wireguard_interface_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ByPeer<'a> {
    peer_id: &'a str,
}

/// HTTP implementation of [`UserService`].
#[derive(Debug, Clone)]
pub struct UserClient {
    inner: ConnectClient,
}

impl UserClient {
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            inner: ConnectClient::new(base_url, USER_SERVICE, transport)?,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            inner: ConnectClient::with_client(http, base_url, USER_SERVICE),
        }
    }

    pub fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    fn identity_headers(identity: Option<&str>) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        if let Some(email) = identity.filter(|e| !e.is_empty()) {
            let value = HeaderValue::from_str(email)
                .map_err(|e| Error::InvalidIdentity(format!("{email:?}: {e}")))?;
            headers.insert(IDENTITY_HEADER, value);
        }
        Ok(headers)
    }

    async fn call<Req, Resp>(
        &self,
        identity: Option<&str>,
        method: &str,
        request: &Req,
    ) -> Result<Resp, Error>
    where
        Req: Serialize + Sync + ?Sized,
        Resp: serde::de::DeserializeOwned,
    {
        let headers = Self::identity_headers(identity)?;
        self.inner.unary(method, request, headers).await
    }
}

#[async_trait]
impl UserService for UserClient {
    async fn list_wireguard_interfaces(
        &self,
        identity: Option<&str>,
    ) -> Result<Vec<WireguardInterface>, Error> {
        let resp: ListWireguardInterfacesResponse = self
            .call(identity, "ListWireguardInterfaces", &Empty {})
            .await?;
        Ok(resp.interfaces)
    }

    async fn get_my_peer(&self, identity: Option<&str>) -> Result<PeerConfig, Error> {
        self.call(identity, "GetMyWireguardPeer", &Empty {}).await
    }

    async fn get_my_peer_by_interface(
        &self,
        identity: Option<&str>,
        interface_id: &str,
    ) -> Result<PeerConfig, Error> {
        self.call(
            identity,
            "GetMyWireguardPeerByInterface",
            &ByInterface { interface_id },
        )
        .await
    }

    async fn create_peer(
        &self,
        identity: Option<&str>,
        interface_id: &str,
    ) -> Result<PeerConfig, Error> {
        self.call(
            identity,
            "CreateWireguardPeer",
            &CreatePeer {
                wireguard_interface_id: interface_id,
            },
        )
        .await
    }

    async fn delete_peer(&self, identity: Option<&str>, peer_id: &str) -> Result<(), Error> {
        let _: Empty = self
            .call(identity, "DeleteWireguardPeer", &ByPeer { peer_id })
            .await?;
        Ok(())
    }

    async fn list_peer_statuses(&self, identity: Option<&str>) -> Result<Vec<PeerStatus>, Error> {
        let resp: ListPeerStatusesResponse =
            self.call(identity, "ListPeerStatuses", &Empty {}).await?;
        Ok(resp.statuses)
    }
}
