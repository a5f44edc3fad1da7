// Connect unary-call plumbing shared by the admin and public clients.
//
// Every RPC is `POST {base}/{package.Service}/{Method}` with a JSON body.
// Errors come back as `{"code": "...", "message": "..."}`; when the body
// is missing or unparseable the HTTP status decides the code.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{Code, Error};
use crate::transport::TransportConfig;

const PROTOCOL_VERSION: &str = "connect-protocol-version";

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Low-level client for one Connect service.
#[derive(Debug, Clone)]
pub struct ConnectClient {
    http: reqwest::Client,
    base_url: Url,
    service: &'static str,
}

impl ConnectClient {
    pub fn new(
        base_url: &str,
        service: &'static str,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, Url::parse(base_url)?, service))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, service: &'static str) -> Self {
        Self {
            http,
            base_url,
            service,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/{service}/{method}`, preserving any path prefix on the base.
    fn url(&self, method: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{}/{method}", self.service))?)
    }

    /// Issue a unary call and decode the response message.
    pub async fn unary<Req, Resp>(
        &self,
        method: &str,
        request: &Req,
        headers: HeaderMap,
    ) -> Result<Resp, Error>
    where
        Req: Serialize + Sync + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.url(method)?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(PROTOCOL_VERSION, HeaderValue::from_static("1"))
            .headers(headers)
            .json(request)
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        // Empty messages may be sent as an empty body.
        let text = if body.trim().is_empty() { "{}" } else { &body };
        serde_json::from_str(text).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(err) => Error::Rpc {
                code: err
                    .code
                    .as_deref()
                    .map_or_else(|| Code::from_http_status(status.as_u16()), Code::from_wire),
                message: err.message.unwrap_or_default(),
                status: status.as_u16(),
            },
            Err(_) => Error::Rpc {
                code: Code::from_http_status(status.as_u16()),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                status: status.as_u16(),
            },
        }
    }
}
