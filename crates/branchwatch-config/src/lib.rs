//! Shared configuration for the branchwatch CLI and TUI.
//!
//! TOML profiles, password resolution (env + keyring + plaintext), the
//! per-profile session file, and translation to
//! `branchwatch_core::ServiceConfig`. The CLI adds `GlobalOpts`-aware
//! overrides on top.

mod session;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use branchwatch_core::{DEFAULT_CHECK_INTERVAL, DEFAULT_SERVER, ServiceConfig, TlsVerification};

pub use session::FileSessionStore;

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "branchwatch";

/// Environment variable consulted for the login password.
pub const PASSWORD_ENV: &str = "BRANCHWATCH_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("session file is corrupt: {0}")]
    Session(#[from] serde_json::Error),

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit choice, then `default_profile`,
    /// then `"default"`.
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// The named profile, or a built-in one pointing at the local backend
    /// when the name is `"default"` and nothing is configured yet.
    pub fn profile_or_builtin(&self, name: &str) -> Result<Profile, ConfigError> {
        match self.profiles.get(name) {
            Some(profile) => Ok(profile.clone()),
            None if name == "default" => Ok(Profile::default()),
            None => Err(ConfigError::UnknownProfile { name: name.into() }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between automatic batch checks.
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            check_interval: default_check_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL.as_secs()
}

/// A named backend profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "http://127.0.0.1:8000").
    pub server: String,

    /// Login email.
    pub email: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    /// Override batch check interval (seconds).
    pub check_interval: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.into(),
            email: None,
            password: None,
            password_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            check_interval: None,
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "branchwatch", "branchwatch")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || {
            let mut p = home_fallback(".config");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory holding per-profile session files.
pub fn sessions_dir() -> PathBuf {
    project_dirs().map_or_else(
        || {
            let mut p = home_fallback(".local/share");
            p.push("sessions");
            p
        },
        |dirs| dirs.data_dir().join("sessions"),
    )
}

/// Session file for one profile.
pub fn session_path(profile_name: &str) -> PathBuf {
    sessions_dir().join(format!("{profile_name}.json"))
}

fn home_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("branchwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BRANCHWATCH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Password resolution (without CLI flags) ─────────────────────────

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

/// Resolve the login password.
///
/// Order: the profile's `password_env` variable, `BRANCHWATCH_PASSWORD`,
/// the system keyring, then the plaintext `password` field.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a password in the system keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

// ── ServiceConfig translation ───────────────────────────────────────

/// Build a `ServiceConfig` from a profile with no CLI overrides.
///
/// `defaults` supplies timeout, interval and TLS settings the profile
/// leaves unset.
pub fn profile_to_service_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ServiceConfig, ConfigError> {
    let url: url::Url = profile
        .server
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {}", profile.server),
        })?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let check_interval = profile.check_interval.unwrap_or(defaults.check_interval);
    if check_interval == 0 {
        return Err(ConfigError::Validation {
            field: "check_interval".into(),
            reason: "must be at least one second".into(),
        });
    }

    Ok(ServiceConfig {
        url,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        check_interval: Duration::from_secs(check_interval),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builtin_default_profile_targets_local_backend() {
        let cfg = Config::default();
        let profile = cfg.profile_or_builtin("default").unwrap();
        assert_eq!(profile.server, DEFAULT_SERVER);
        assert!(matches!(
            cfg.profile_or_builtin("prod"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn active_profile_prefers_explicit_choice() {
        let cfg = Config {
            default_profile: Some("office".into()),
            ..Config::default()
        };
        assert_eq!(cfg.active_profile_name(Some("prod")), "prod");
        assert_eq!(cfg.active_profile_name(None), "office");
    }

    #[test]
    fn service_config_uses_profile_overrides() {
        let profile = Profile {
            server: "https://status.example.com".into(),
            ca_cert: Some(PathBuf::from("/etc/ca.pem")),
            timeout: Some(5),
            check_interval: Some(60),
            ..Profile::default()
        };
        let svc = profile_to_service_config(&profile, &Defaults::default()).unwrap();

        assert_eq!(svc.url.as_str(), "https://status.example.com/");
        assert_eq!(svc.tls, TlsVerification::CustomCa(PathBuf::from("/etc/ca.pem")));
        assert_eq!(svc.timeout, Duration::from_secs(5));
        assert_eq!(svc.check_interval, Duration::from_secs(60));
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        let profile = Profile {
            insecure: Some(true),
            ca_cert: Some(PathBuf::from("/etc/ca.pem")),
            ..Profile::default()
        };
        let svc = profile_to_service_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(svc.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(svc.check_interval, DEFAULT_CHECK_INTERVAL);
    }

    #[test]
    fn bad_server_url_is_rejected() {
        let profile = Profile {
            server: "not a url".into(),
            ..Profile::default()
        };
        let err = profile_to_service_config(&profile, &Defaults::default()).unwrap_err();
        assert!(err.to_string().starts_with("invalid server"));
    }
}
