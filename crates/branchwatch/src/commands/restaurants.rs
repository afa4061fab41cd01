//! Restaurant command handlers.

use tabled::Tabled;

use branchwatch_core::{Dashboard, NewRestaurantForm, Restaurant};

use super::util;
use crate::cli::{AddRestaurantArgs, GlobalOpts, RestaurantsArgs, RestaurantsCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct RestaurantRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Branches")]
    total: u32,
    #[tabled(rename = "Online")]
    online: u32,
    #[tabled(rename = "Offline")]
    offline: u32,
}

pub fn restaurant_row(r: &Restaurant) -> RestaurantRow {
    RestaurantRow {
        id: r.id,
        name: r.name.clone(),
        total: r.total_branches,
        online: r.online_branches,
        offline: r.offline_branches,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: RestaurantsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RestaurantsCommand::List => {
            let restaurants = dashboard.restaurants().await.map_err(util::core(global))?;
            let out = output::render_list(&global.output, &restaurants, restaurant_row, |r| {
                r.id.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RestaurantsCommand::Add(args) => add(dashboard, args, global).await,

        RestaurantsCommand::Delete { id } => {
            let label = dashboard
                .store()
                .restaurant(id)
                .map_or_else(|| format!("restaurant {id}"), |r| r.name.clone());
            if !util::confirm(
                "restaurants delete",
                &format!("Delete {label} and all of its branches?"),
                global.yes,
            )? {
                return Ok(());
            }
            dashboard
                .delete_restaurant(id)
                .await
                .map_err(util::core(global))?;
            if !global.quiet {
                eprintln!("Restaurant {id} deleted");
            }
            Ok(())
        }
    }
}

async fn add(
    dashboard: &Dashboard,
    args: AddRestaurantArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let restaurant_name = match args.name {
        Some(name) => name,
        None if util::interactive() => util::prompt_text("Restaurant name", true)?,
        None => String::new(),
    };
    let form = NewRestaurantForm {
        restaurant_name,
        branch: util::branch_fields(args.branch)?,
    };

    let (restaurant, branch) = dashboard
        .add_restaurant(&form)
        .await
        .map_err(util::core(global))?;

    if !global.quiet {
        eprintln!(
            "Created restaurant {} ({}) with branch {} ({})",
            restaurant.name, restaurant.id, branch.name, branch.id
        );
    }
    let out = output::render_single(&global.output, &restaurant, |_| String::new(), |r| {
        r.id.to_string()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
