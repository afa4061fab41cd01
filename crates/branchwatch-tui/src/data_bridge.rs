//! Data bridge: connects [`Dashboard`] streams and poller events to TUI
//! actions.
//!
//! Runs as a background task forwarding every listing change, auth-state
//! transition and [`PollEvent`] as an [`Action`] through the action channel.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use branchwatch_core::{AuthState, Dashboard, PollEvent};

use crate::action::Action;

/// Translate a poller event into the action the screens react to.
pub fn poll_action(event: PollEvent) -> Action {
    match event {
        PollEvent::Tick { remaining } => Action::CountdownTick(remaining),
        PollEvent::BatchStarted => Action::BatchStarted,
        PollEvent::BranchChecked(outcome) => Action::BranchChecked(outcome),
        PollEvent::BatchFinished { checked } => Action::BatchFinished { checked },
        PollEvent::BatchFailed(message) => Action::BatchFailed(message),
        PollEvent::SessionExpired => Action::SessionExpired,
    }
}

/// Forward store snapshots, auth changes and poller events until cancelled.
///
/// Sends the current snapshots first so screens render immediately.
pub async fn spawn_data_bridge(
    dashboard: Dashboard,
    mut poll_rx: mpsc::UnboundedReceiver<PollEvent>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut restaurants = dashboard.restaurants_stream();
    let mut branches = dashboard.branches_stream();
    let mut auth = dashboard.subscribe_auth_state();

    let _ = action_tx.send(Action::RestaurantsUpdated(restaurants.current().clone()));
    let _ = action_tx.send(Action::BranchesUpdated(branches.current().clone()));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(r) = restaurants.changed() => {
                let _ = action_tx.send(Action::RestaurantsUpdated(r));
            }
            Some(b) = branches.changed() => {
                let _ = action_tx.send(Action::BranchesUpdated(b));
            }
            Ok(()) = auth.changed() => {
                let state = auth.borrow_and_update().clone();
                debug!(?state, "auth state changed");
                if state == AuthState::Expired {
                    let _ = action_tx.send(Action::SessionExpired);
                }
            }
            Some(event) = poll_rx.recv() => {
                let _ = action_tx.send(poll_action(event));
            }
        }
    }

    debug!("data bridge stopped");
}
