//! `watch`: re-check every branch on a fixed interval until interrupted.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use branchwatch_core::{Countdown, Dashboard, PollEvent, StatusPoller};

use super::branches::batch_spinner;
use super::util;
use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    dashboard: &Dashboard,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Fail fast on a missing or stale session.
    let overview = dashboard.refresh().await.map_err(util::core(global))?;
    let color = output::should_color(&global.color);

    if args.once {
        let report = dashboard.check_all(|_| {}).await.map_err(util::core(global))?;
        for outcome in &report.outcomes {
            output::print_output(&outcome_line(outcome, color), global.quiet);
        }
        return Ok(());
    }

    if !global.quiet {
        eprintln!(
            "Watching {} branches every {}s (Ctrl-C to stop)",
            overview.total_branches,
            dashboard.config().check_interval.as_secs()
        );
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let poller = StatusPoller::spawn(dashboard.clone(), tx, cancel.clone());
    let spinner = batch_spinner(global.quiet);

    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            event = rx.recv() => {
                let Some(event) = event else { break Ok(()) };
                match event {
                    PollEvent::Tick { remaining } => {
                        if !dashboard.is_checking() {
                            spinner.set_message(format!(
                                "Next check in {}",
                                Countdown::clock(remaining)
                            ));
                        }
                    }
                    PollEvent::BatchStarted => spinner.set_message("Checking branches..."),
                    PollEvent::BranchChecked(outcome) => {
                        spinner.suspend(|| {
                            output::print_output(&outcome_line(&outcome, color), global.quiet);
                        });
                    }
                    PollEvent::BatchFinished { checked } => {
                        tracing::info!(checked, "batch finished");
                    }
                    PollEvent::BatchFailed(message) => {
                        spinner.suspend(|| eprintln!("Batch check failed: {message}"));
                    }
                    PollEvent::SessionExpired => break Err(CliError::SessionExpired),
                }
            }
        }
    };

    spinner.finish_and_clear();
    poller.shutdown().await;
    result
}

fn outcome_line(outcome: &branchwatch_core::CheckOutcome, color: bool) -> String {
    let statuses: Vec<String> = outcome
        .statuses
        .iter()
        .map(|(p, s)| format!("{}={}", p.wire_name(), output::paint_status(s, color)))
        .collect();
    format!(
        "{} {:<24} {}",
        chrono::Local::now().format("%H:%M:%S"),
        outcome.branch_name,
        statuses.join(" ")
    )
}
