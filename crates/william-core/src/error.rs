// ── Core error types ──
//
// View-model errors from william-core. Consumers never see HTTP status
// codes or JSON parse failures directly; `From<william_api::Error>`
// translates transport-layer errors into these variants.
//
// `CoreError` is `Clone` because a failed fetch is stored alongside the
// stale value in every cache snapshot handed to subscribers.

use thiserror::Error;

/// Shown when a failure carries no usable message.
pub const FALLBACK_MESSAGE: &str = "An unexpected error occurred.";

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── State-driving errors ─────────────────────────────────────────
    /// The requested entity does not exist. Drives state; never a banner.
    #[error("Not found: {message}")]
    NotFound { message: String },

    // ── Local errors ─────────────────────────────────────────────────
    /// Rejected before any network call.
    #[error("{message}")]
    Validation { message: String },

    // ── Remote errors ────────────────────────────────────────────────
    #[error("{message}")]
    Rpc {
        /// Connect code, e.g. `already_exists`.
        code: String,
        message: String,
    },

    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Normalized, user-displayable message.
    ///
    /// Remote failures show the server's message; anything without a
    /// usable message falls back to [`FALLBACK_MESSAGE`].
    pub fn display_message(&self) -> String {
        let message = match self {
            Self::NotFound { message } | Self::Validation { message } | Self::Rpc { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            FALLBACK_MESSAGE.to_owned()
        } else {
            message
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<william_api::Error> for CoreError {
    fn from(err: william_api::Error) -> Self {
        match err {
            william_api::Error::Rpc { code, message, .. } => {
                if code == william_api::Code::NotFound {
                    CoreError::NotFound { message }
                } else {
                    CoreError::Rpc {
                        code: code.to_string(),
                        message,
                    }
                }
            }
            william_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Rpc {
                        code: william_api::Code::Unknown.to_string(),
                        message: e.to_string(),
                    }
                }
            }
            william_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            william_api::Error::InvalidIdentity(reason) => CoreError::Validation {
                message: format!("Invalid email: {reason}"),
            },
            william_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
