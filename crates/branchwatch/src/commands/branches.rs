//! Branch command handlers.

use std::fmt::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use branchwatch_core::{
    Branch, CheckOutcome, Dashboard, NewBranch, Platform, PlatformStatus, filter_branches,
};

use super::util;
use crate::cli::{AddBranchArgs, BranchesArgs, BranchesCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct BranchRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Restaurant")]
    restaurant: String,
    #[tabled(rename = "Branch")]
    name: String,
    #[tabled(rename = "Yemeksepeti")]
    yemeksepeti: String,
    #[tabled(rename = "Migros")]
    migros: String,
    #[tabled(rename = "Getir")]
    getir: String,
    #[tabled(rename = "Trendyol")]
    trendyol: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

fn branch_row(b: &Branch) -> BranchRow {
    let label = |p: Platform| b.status(p).label().to_owned();
    BranchRow {
        id: b.id,
        restaurant: b.restaurant_name.clone(),
        name: b.name.clone(),
        yemeksepeti: label(Platform::Yemeksepeti),
        migros: label(Platform::Migros),
        getir: label(Platform::Getir),
        trendyol: label(Platform::Trendyol),
        status: if b.is_online { "online" } else { "offline" },
    }
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Branch")]
    name: String,
    #[tabled(rename = "Yemeksepeti")]
    yemeksepeti: String,
    #[tabled(rename = "Migros")]
    migros: String,
    #[tabled(rename = "Getir")]
    getir: String,
    #[tabled(rename = "Trendyol")]
    trendyol: String,
}

fn outcome_status(o: &CheckOutcome, p: Platform) -> PlatformStatus {
    o.statuses
        .get(&p)
        .cloned()
        .unwrap_or(PlatformStatus::NotConfigured)
}

fn outcome_row(o: &CheckOutcome) -> OutcomeRow {
    let label = |p: Platform| outcome_status(o, p).label().to_owned();
    OutcomeRow {
        id: o.branch_id,
        name: o.branch_name.clone(),
        yemeksepeti: label(Platform::Yemeksepeti),
        migros: label(Platform::Migros),
        getir: label(Platform::Getir),
        trendyol: label(Platform::Trendyol),
    }
}

/// One line per platform, colored by status.
fn outcome_detail(o: &CheckOutcome, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", o.branch_name, o.branch_id);
    for p in Platform::all() {
        let _ = writeln!(
            out,
            "  {:<12} {}",
            p.label(),
            output::paint_status(&outcome_status(o, p), color)
        );
    }
    let _ = write!(out, "  {:<12} {}", "Overall", output::paint_online(o.any_online(), color));
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: BranchesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        BranchesCommand::List { search, restaurant } => {
            let mut branches = dashboard.branches().await.map_err(util::core(global))?;
            if let Some(rid) = restaurant {
                branches.retain(|b| b.restaurant_id == rid);
            }
            if let Some(ref term) = search {
                branches = filter_branches(&branches, term);
            }
            let out = output::render_list(&global.output, &branches, branch_row, |b| {
                b.id.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BranchesCommand::Add(args) => add(dashboard, args, global).await,

        BranchesCommand::Delete { id } => {
            if !util::confirm(
                "branches delete",
                &format!("Delete branch {id}?"),
                global.yes,
            )? {
                return Ok(());
            }
            dashboard.delete_branch(id).await.map_err(util::core(global))?;
            if !global.quiet {
                eprintln!("Branch {id} deleted");
            }
            Ok(())
        }

        BranchesCommand::Check { id } => {
            let outcome = dashboard
                .check_branch(id)
                .await
                .map_err(util::core(global))?;
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &outcome,
                |o| outcome_detail(o, color),
                |o| format!("{}\t{}", o.branch_id, if o.any_online() { "online" } else { "offline" }),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BranchesCommand::CheckAll => check_all(dashboard, global).await,
    }
}

async fn add(
    dashboard: &Dashboard,
    args: AddBranchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let branch = NewBranch {
        restaurant: args.restaurant,
        fields: util::branch_fields(args.branch)?,
    };
    let created = dashboard
        .create_branch(&branch)
        .await
        .map_err(util::core(global))?;

    if !global.quiet {
        eprintln!("Created branch {} ({})", created.name, created.id);
    }
    if !matches!(global.output, OutputFormat::Table) {
        let out = output::render_single(&global.output, &created, |_| String::new(), |b| {
            b.id.to_string()
        });
        output::print_output(&out, global.quiet);
    }
    Ok(())
}

/// Spinner on stderr while branches are checked one by one.
pub fn batch_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

async fn check_all(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let spinner = batch_spinner(global.quiet);
    spinner.set_message("Checking branches...");

    let mut done = 0usize;
    let progress = spinner.clone();
    let result = dashboard
        .check_all(move |outcome| {
            done += 1;
            progress.set_message(format!("Checked {done}: {}", outcome.branch_name));
        })
        .await;
    spinner.finish_and_clear();

    let report = result.map_err(util::core(global))?;
    let out = output::render_list(&global.output, &report.outcomes, outcome_row, |o| {
        o.branch_id.to_string()
    });
    output::print_output(&out, global.quiet);
    if !global.quiet {
        eprintln!("Checked {} branches", report.checked());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn outcome() -> CheckOutcome {
        let mut statuses = BTreeMap::new();
        statuses.insert(Platform::Getir, PlatformStatus::Online);
        statuses.insert(Platform::Trendyol, PlatformStatus::AuthError);
        CheckOutcome {
            branch_id: 4,
            branch_name: "Moda".into(),
            statuses,
        }
    }

    #[test]
    fn unreported_platforms_read_as_not_configured() {
        let row = outcome_row(&outcome());
        assert_eq!(row.getir, "Online");
        assert_eq!(row.trendyol, "Auth Error");
        assert_eq!(row.migros, "Not configured");
    }

    #[test]
    fn detail_lists_every_platform() {
        let text = outcome_detail(&outcome(), false);
        assert!(text.starts_with("Moda (4)"));
        for p in Platform::all() {
            assert!(text.contains(p.label()));
        }
        assert!(text.ends_with("online"));
    }
}
