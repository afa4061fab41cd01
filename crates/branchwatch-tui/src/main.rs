//! `branchwatch-tui`: terminal dashboard for restaurant delivery-platform
//! availability.
//!
//! Built on [ratatui](https://ratatui.rs) with reactive data from
//! `branchwatch-core`'s [`EntityStream`](branchwatch_core::EntityStream).
//! Screens: Login, then Dashboard, Branches and Add Restaurant (keys 1-3).
//! A background poller re-checks every branch on the configured interval.
//!
//! Logs go to a file (default `$TMPDIR/branchwatch-tui.log`) so they never
//! corrupt the terminal.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use branchwatch_config::FileSessionStore;
use branchwatch_core::Dashboard;

use crate::app::App;

/// Terminal dashboard for delivery-platform branch status.
#[derive(Parser, Debug)]
#[command(name = "branchwatch-tui", version, about)]
struct Cli {
    /// Config profile to use
    #[arg(short, long, env = "BRANCHWATCH_PROFILE")]
    profile: Option<String>,

    /// Backend URL, overriding the profile
    #[arg(short, long, env = "BRANCHWATCH_SERVER")]
    server: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Seconds between automatic checks of every branch
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Log file path (defaults to branchwatch-tui.log in the temp dir)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing; stdout and stderr belong to the terminal UI.
/// The returned guard must live until exit so buffered lines are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "branchwatch_tui={log_level},branchwatch_core={log_level},branchwatch_api={log_level}"
        ))
    });

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("branchwatch-tui.log"));
    let log_dir = log_file
        .parent()
        .map_or_else(std::env::temp_dir, std::path::Path::to_path_buf);
    let log_name = log_file
        .file_name()
        .map_or_else(|| "branchwatch-tui.log".into(), std::ffi::OsStr::to_os_string);

    let file_appender = tracing_appender::rolling::never(log_dir, log_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Resolve the profile (flags over config file) and open its session.
fn build_dashboard(cli: &Cli) -> Result<(String, Option<String>, Dashboard)> {
    let cfg = branchwatch_config::load_config_or_default();
    let profile_name = cfg.active_profile_name(cli.profile.as_deref());
    let mut profile = cfg.profile_or_builtin(&profile_name)?;

    if let Some(ref server) = cli.server {
        profile.server.clone_from(server);
    }
    if cli.insecure {
        profile.insecure = Some(true);
    }
    if let Some(secs) = cli.interval {
        profile.check_interval = Some(secs);
    }

    let svc = branchwatch_config::profile_to_service_config(&profile, &cfg.defaults)
        .wrap_err_with(|| format!("invalid settings in profile '{profile_name}'"))?;
    let sessions = Arc::new(FileSessionStore::for_profile(&profile_name));
    let dashboard = Dashboard::new(svc, sessions).wrap_err("could not start the backend client")?;

    Ok((profile_name, profile.email, dashboard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal is touched.
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    let (profile, email, dashboard) = build_dashboard(&cli)?;
    info!(
        profile = %profile,
        server = %dashboard.config().url,
        interval = %humantime::format_duration(dashboard.config().check_interval),
        "starting branchwatch-tui"
    );

    let mut app = App::new(dashboard, profile, email);
    app.run().await?;

    Ok(())
}
