//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use branchwatch_config::ConfigError;
use branchwatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend at {url}")]
    #[diagnostic(
        code(branchwatch::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Reason: {reason}\n\
             Override the address with --server or `branchwatch config set server <url>`."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(branchwatch::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Login failed: {message}")]
    #[diagnostic(code(branchwatch::auth_failed), help("Check the email and password."))]
    AuthFailed { message: String },

    #[error("Not logged in")]
    #[diagnostic(code(branchwatch::not_logged_in), help("Run: branchwatch login"))]
    NotLoggedIn,

    #[error("Session expired")]
    #[diagnostic(
        code(branchwatch::session_expired),
        help("The backend rejected the stored token. Run: branchwatch login")
    )]
    SessionExpired,

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(branchwatch::no_credentials),
        help(
            "Pass --password-stdin, set BRANCHWATCH_PASSWORD, or store one with:\n\
             branchwatch config set-password --profile {profile}"
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(branchwatch::not_found),
        help("Run: branchwatch {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Backend ──────────────────────────────────────────────────────
    /// The backend's own message, shown as-is.
    #[error("{message}")]
    #[diagnostic(code(branchwatch::api_error))]
    ApiError { message: String, status: Option<u16> },

    #[error("A status check batch is already running")]
    #[diagnostic(code(branchwatch::busy))]
    CheckInProgress,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(branchwatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(branchwatch::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: branchwatch config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(branchwatch::config))]
    Config { message: String },

    #[error("Could not store session: {message}")]
    #[diagnostic(code(branchwatch::storage))]
    Storage { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(branchwatch::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. }
            | Self::NotLoggedIn
            | Self::SessionExpired
            | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl CliError {
    /// Like `From<CoreError>`, but knows the configured timeout.
    pub fn from_core(err: CoreError, timeout_secs: u64) -> Self {
        match err {
            CoreError::Timeout => Self::Timeout {
                seconds: timeout_secs,
            },
            other => other.into(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::Timeout => CliError::Timeout { seconds: 0 },
            CoreError::NotLoggedIn => CliError::NotLoggedIn,
            CoreError::SessionExpired => CliError::SessionExpired,
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: list_command_for(&entity_type),
                resource_type: entity_type,
                identifier,
            },
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::CheckInProgress => CliError::CheckInProgress,
            CoreError::Api { message, status } => CliError::ApiError { message, status },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Storage { message } => CliError::Storage { message },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

fn list_command_for(entity_type: &str) -> String {
    match entity_type {
        "branch" => "branches list".into(),
        "restaurant" => "restaurants list".into(),
        _ => "overview".into(),
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn session_problems_exit_with_auth_code() {
        assert_eq!(CliError::from(CoreError::SessionExpired).exit_code(), exit_code::AUTH);
        assert_eq!(CliError::from(CoreError::NotLoggedIn).exit_code(), exit_code::AUTH);
    }

    #[test]
    fn validation_is_a_usage_error() {
        let err = CliError::from(CoreError::ValidationFailed {
            message: "Address: required".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn not_found_points_at_list_command() {
        let err = CliError::from(CoreError::NotFound {
            entity_type: "branch".into(),
            identifier: "9".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        match err {
            CliError::NotFound { list_command, .. } => assert_eq!(list_command, "branches list"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn backend_message_is_verbatim() {
        let err = CliError::from(CoreError::Api {
            message: "name: restaurant with this name already exists.".into(),
            status: Some(400),
        });
        assert_eq!(err.to_string(), "name: restaurant with this name already exists.");
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn timeout_carries_configured_seconds() {
        match CliError::from_core(CoreError::Timeout, 45) {
            CliError::Timeout { seconds } => assert_eq!(seconds, 45),
            other => panic!("unexpected {other:?}"),
        }
    }
}
