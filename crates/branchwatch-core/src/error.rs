// ── Core error types ──
//
// User-facing errors from branchwatch-core. Consumers never match on raw
// HTTP statuses; the `From<branchwatch_api::Error>` impl translates
// transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Backend request timed out")]
    Timeout,

    // ── Session errors ───────────────────────────────────────────────
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Session expired -- log in again")]
    SessionExpired,

    #[error("Login failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("A status check batch is already running")]
    CheckInProgress,

    /// Backend rejected the request; `message` is what it said.
    #[error("{message}")]
    Api { message: String, status: Option<u16> },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Session storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the operator has to log in (again) to continue.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::NotLoggedIn | Self::SessionExpired)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<branchwatch_api::Error> for CoreError {
    fn from(err: branchwatch_api::Error) -> Self {
        use branchwatch_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::SessionExpired => CoreError::SessionExpired,
            ApiError::Transport(ref e) => {
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
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Unexpected response from backend: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expiry_maps_to_login_required() {
        let err = CoreError::from(branchwatch_api::Error::SessionExpired);
        assert!(err.requires_login());
    }

    #[test]
    fn backend_message_is_kept_verbatim() {
        let err = CoreError::from(branchwatch_api::Error::Api {
            status: 400,
            message: "name: This field is required.".into(),
        });
        assert_eq!(err.to_string(), "name: This field is required.");
    }

    #[test]
    fn rejected_login_is_not_session_expiry() {
        let err = CoreError::from(branchwatch_api::Error::Authentication {
            message: "Şifre hatalı".into(),
        });
        assert!(!err.requires_login());
        assert_eq!(err.to_string(), "Login failed: Şifre hatalı");
    }
}
