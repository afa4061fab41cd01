// ── Runtime service configuration ──
//
// Describes *how* to reach the backend. The CLI/TUI builds a
// `ServiceConfig` from the profile on disk and hands it in; core never
// reads config files.

use std::time::Duration;

use url::Url;

/// Default backend address used by development deployments.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

/// Default spacing between automatic "check all branches" batches.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(300);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed dev backends).
    DangerAcceptInvalid,
}

/// Configuration for talking to one backend.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Backend root URL (e.g. `http://127.0.0.1:8000`).
    pub url: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Spacing between automatic batch checks.
    pub check_interval: Duration,
}

impl ServiceConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}
