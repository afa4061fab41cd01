//! Screen implementations. Each screen is a top-level Component.

pub mod add;
pub mod branches;
pub mod dashboard;
pub mod login;

use ratatui::widgets::TableState;

use crate::component::Component;
use crate::screen::ScreenId;

/// Build every screen, keyed by id.
pub fn create_screens(
    server: &str,
    email: Option<String>,
) -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (
            ScreenId::Login,
            Box::new(login::LoginScreen::new(server, email)),
        ),
        (ScreenId::Dashboard, Box::new(dashboard::DashboardScreen::new())),
        (ScreenId::Branches, Box::new(branches::BranchesScreen::new())),
        (ScreenId::AddRestaurant, Box::new(add::AddRestaurantScreen::new())),
    ]
}

/// Move the table cursor by `delta` rows, clamped to `len`.
fn move_selection(state: &mut TableState, len: usize, delta: isize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let current = state.selected().unwrap_or(0);
    let next = if delta.is_negative() {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta.unsigned_abs())
    };
    state.select(Some(next.min(len - 1)));
}

/// Keep the cursor inside the table after the rows change.
fn clamp_selection(state: &mut TableState, len: usize) {
    match (state.selected(), len) {
        (_, 0) => state.select(None),
        (None, _) => state.select(Some(0)),
        (Some(i), n) if i >= n => state.select(Some(n - 1)),
        _ => {}
    }
}
