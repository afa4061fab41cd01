//! Command dispatch: bridges CLI args -> dashboard calls -> output formatting.

pub mod auth;
pub mod branches;
pub mod config_cmd;
pub mod overview;
pub mod restaurants;
pub mod util;
pub mod watch;

use branchwatch_core::Dashboard;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    dashboard: &Dashboard,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(dashboard, args, global).await,
        Command::Logout => auth::logout(dashboard, global).await,
        Command::Whoami => auth::whoami(dashboard, global),
        Command::Register(args) => auth::register(dashboard, args, global).await,
        Command::Overview => overview::handle(dashboard, global).await,
        Command::Restaurants(args) => restaurants::handle(dashboard, args, global).await,
        Command::Branches(args) => branches::handle(dashboard, args, global).await,
        Command::Watch(args) => watch::handle(dashboard, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need a backend connection".into(),
        )),
    }
}
