mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use branchwatch_core::{Dashboard, ServiceConfig};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never talk to the backend
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "branchwatch", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let (profile_name, mut svc) = build_service_config(&cli.global)?;
            if let Command::Watch(ref args) = cmd {
                if let Some(secs) = args.interval {
                    svc.check_interval = Duration::from_secs(secs.max(1));
                }
            }

            let sessions = Arc::new(config::FileSessionStore::for_profile(&profile_name));
            let timeout = svc.timeout.as_secs();
            let dashboard =
                Dashboard::new(svc, sessions).map_err(|e| CliError::from_core(e, timeout))?;

            tracing::debug!(command = ?cmd, profile = %profile_name, "dispatching command");
            commands::dispatch(cmd, &dashboard, &cli.global).await
        }
    }
}

/// Config file + active profile + flag overrides.
fn build_service_config(global: &GlobalOpts) -> Result<(String, ServiceConfig), CliError> {
    let cfg = config::load_config_or_default();
    let (name, profile) = config::active_profile(global, &cfg)?;
    let svc = config::resolve_profile(&profile, &cfg, global)?;
    Ok((name, svc))
}
