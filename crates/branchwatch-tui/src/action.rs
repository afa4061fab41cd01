//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::fmt;
use std::sync::Arc;

use branchwatch_core::{
    Branch, CheckOutcome, EntityId, LoginForm, NewRestaurantForm, Restaurant, User,
};

use crate::screen::ScreenId;

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A toast shown in the status bar until dismissed or replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Pending confirmation action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteRestaurant { id: EntityId, name: String },
    DeleteBranch { id: EntityId, name: String },
    Logout,
}

impl ConfirmAction {
    /// The action dispatched when the user answers yes.
    pub fn into_action(self) -> Action {
        match self {
            Self::DeleteRestaurant { id, .. } => Action::DeleteRestaurant(id),
            Self::DeleteBranch { id, .. } => Action::DeleteBranch(id),
            Self::Logout => Action::Logout,
        }
    }
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteRestaurant { name, .. } => {
                write!(f, "Delete restaurant {name} and all of its branches?")
            }
            Self::DeleteBranch { name, .. } => write!(f, "Delete branch {name}?"),
            Self::Logout => f.write_str("Log out?"),
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    /// Open the branches screen limited to one restaurant.
    ShowRestaurantBranches(EntityId),

    // ── Session ───────────────────────────────────────────────────
    Login(LoginForm),
    LoggedIn(User),
    LoginFailed(String),
    Logout,
    SessionExpired,

    // ── Data Events (from branchwatch-core streams) ───────────────
    RestaurantsUpdated(Arc<Vec<Arc<Restaurant>>>),
    BranchesUpdated(Arc<Vec<Arc<Branch>>>),
    Refresh,

    // ── Status Checks ─────────────────────────────────────────────
    CheckBranch(EntityId),
    BranchChecked(CheckOutcome),
    BranchCheckFailed(EntityId),
    CheckAll,
    BatchStarted,
    BatchFinished { checked: usize },
    BatchFailed(String),
    CountdownTick(u64),

    // ── Add Restaurant ────────────────────────────────────────────
    SubmitRestaurant(Box<NewRestaurantForm>),
    RestaurantAdded { restaurant: String, branch: String },
    SubmitFailed(String),

    // ── Deletes ───────────────────────────────────────────────────
    DeleteRestaurant(EntityId),
    DeleteBranch(EntityId),

    // ── Confirm Dialog ────────────────────────────────────────────
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,

    // ── Help ──────────────────────────────────────────────────────
    ToggleHelp,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn confirm_prompts_name_the_target() {
        let confirm = ConfirmAction::DeleteBranch {
            id: 7,
            name: "Moda".into(),
        };
        assert_eq!(confirm.to_string(), "Delete branch Moda?");
        assert!(matches!(confirm.into_action(), Action::DeleteBranch(7)));
    }
}
