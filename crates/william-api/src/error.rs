use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Connect RPC status codes, as carried in the `code` field of an error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Code {
    Canceled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl Code {
    /// Parse a wire code, falling back to `Unknown` for anything unrecognised.
    pub fn from_wire(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Unknown)
    }

    /// Infer a code from the HTTP status when the body carries none.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthenticated,
            403 => Self::PermissionDenied,
            404 => Self::Unimplemented,
            429 | 502 | 503 | 504 => Self::Unavailable,
            _ => Self::Unknown,
        }
    }
}

/// Top-level error type for the `william-api` crate.
///
/// `william-core` maps these into view-model errors; nothing above the core
/// sees HTTP status codes or JSON parse failures directly.
#[derive(Debug, Error)]
pub enum Error {
    // ── RPC ─────────────────────────────────────────────────────────
    /// Structured error returned by the service.
    #[error("RPC error ({code}): {message}")]
    Rpc {
        code: Code,
        message: String,
        status: u16,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The caller's email cannot be sent as an `X-Email` header.
    #[error("Invalid identity header value: {0}")]
    InvalidIdentity(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// The Connect code for this error, if the service produced one.
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.code() == Some(Code::NotFound)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Rpc { code, .. } => matches!(code, Code::Unavailable | Code::DeadlineExceeded),
            _ => false,
        }
    }
}
