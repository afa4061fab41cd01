//! CLI configuration: thin wrapper around `branchwatch_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--server, --insecure, --timeout) on top of the shared profile logic.

use std::time::Duration;

use branchwatch_core::{ServiceConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use branchwatch_config::{
    Config, FileSessionStore, Profile, config_path, load_config_or_default, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Look up the active profile, listing the known ones when it is missing.
pub fn active_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);
    match config.profile_or_builtin(&name) {
        Ok(profile) => Ok((name, profile)),
        Err(_) => {
            let mut available: Vec<_> = config.profiles.keys().cloned().collect();
            available.sort();
            Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            })
        }
    }
}

/// Translate a `Profile` + global flags into a `ServiceConfig`.
///
/// Flag values win over the profile; the profile wins over `[defaults]`.
pub fn resolve_profile(
    profile: &Profile,
    config: &Config,
    global: &GlobalOpts,
) -> Result<ServiceConfig, CliError> {
    let mut svc = branchwatch_config::profile_to_service_config(profile, &config.defaults)?;

    if let Some(ref server) = global.server {
        svc.url = server.parse().map_err(|_| CliError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {server}"),
        })?;
    }

    if global.insecure {
        svc.tls = TlsVerification::DangerAcceptInvalid;
    }

    svc.timeout = Duration::from_secs(global.timeout);
    Ok(svc)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["branchwatch"];
        argv.extend_from_slice(args);
        argv.push("whoami");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn server_flag_overrides_profile() {
        let cfg = Config::default();
        let g = global(&["--server", "http://10.0.0.5:9000", "--timeout", "7"]);
        let (_, profile) = active_profile(&g, &cfg).unwrap();
        let svc = resolve_profile(&profile, &cfg, &g).unwrap();

        assert_eq!(svc.url.as_str(), "http://10.0.0.5:9000/");
        assert_eq!(svc.timeout, Duration::from_secs(7));
        assert_eq!(svc.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn insecure_flag_disables_verification() {
        let cfg = Config::default();
        let g = global(&["-k"]);
        let svc = resolve_profile(&Profile::default(), &cfg, &g).unwrap();
        assert_eq!(svc.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn unknown_profile_lists_alternatives() {
        let mut cfg = Config::default();
        cfg.profiles.insert("office".into(), Profile::default());
        let g = global(&["-p", "prod"]);

        match active_profile(&g, &cfg).unwrap_err() {
            CliError::ProfileNotFound { name, available } => {
                assert_eq!(name, "prod");
                assert_eq!(available, "office");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
