//! Overview: branch counts plus the restaurant table.

use serde::Serialize;

use branchwatch_core::{Dashboard, Overview, Restaurant};

use super::restaurants::restaurant_row;
use super::util;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct OverviewReport<'a> {
    #[serde(flatten)]
    counts: Overview,
    restaurants: &'a [Restaurant],
}

fn summary(o: &Overview) -> String {
    format!(
        "Restaurants: {}   Branches: {}   Online: {}   Offline: {}",
        o.total_restaurants, o.total_branches, o.online_branches, o.offline_branches
    )
}

pub async fn handle(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let counts = dashboard.refresh().await.map_err(util::core(global))?;
    let restaurants: Vec<Restaurant> = dashboard
        .restaurants_snapshot()
        .iter()
        .map(|r| (**r).clone())
        .collect();

    let out = match global.output {
        OutputFormat::Table => {
            let table =
                output::render_list(&global.output, &restaurants, restaurant_row, |r| {
                    r.id.to_string()
                });
            format!("{}\n\n{table}", summary(&counts))
        }
        OutputFormat::Plain => summary(&counts),
        _ => {
            let report = OverviewReport {
                counts,
                restaurants: &restaurants,
            };
            output::render_single(&global.output, &report, |_| String::new(), |_| String::new())
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
