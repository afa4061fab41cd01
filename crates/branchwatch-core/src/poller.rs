// ── Periodic batch checks ──
//
// A one-second tick drives a `Countdown`; when it runs out the poller
// starts a batch check through `Dashboard::check_all`. Manual "check all"
// requests go through the same task via `StatusPoller::trigger`, so there
// is exactly one place that starts batches.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::dashboard::Dashboard;
use crate::error::CoreError;
use crate::model::CheckOutcome;

// ── Countdown ────────────────────────────────────────────────────────

/// Seconds until the next automatic batch check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    interval: u64,
    remaining: u64,
}

impl Countdown {
    /// A fresh countdown starting at the full interval (at least one second).
    pub fn new(interval: Duration) -> Self {
        let interval = interval.as_secs().max(1);
        Self {
            interval,
            remaining: interval,
        }
    }

    /// Resume from the last recorded check.
    ///
    /// Picks up where the previous run left off when the last check is
    /// within one interval; otherwise starts over at the full interval.
    pub fn from_last_check(
        interval: Duration,
        last_check: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut countdown = Self::new(interval);
        if let Some(last) = last_check {
            let elapsed = u64::try_from((now - last).num_seconds()).unwrap_or(0);
            if elapsed < countdown.interval {
                countdown.remaining = countdown.interval - elapsed;
            }
        }
        countdown
    }

    /// Advance one second. Returns `true` when a check is due, in which
    /// case the countdown has already been reset.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            self.reset();
            true
        } else {
            self.remaining -= 1;
            false
        }
    }

    pub fn reset(&mut self) {
        self.remaining = self.interval;
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// `m:ss` rendering of a number of seconds, as shown for a countdown.
    pub fn clock(secs: u64) -> String {
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::clock(self.remaining))
    }
}

// ── Events ───────────────────────────────────────────────────────────

/// Progress reported by the poller task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Tick { remaining: u64 },
    BatchStarted,
    BranchChecked(CheckOutcome),
    BatchFinished { checked: usize },
    BatchFailed(String),
    SessionExpired,
}

// ── StatusPoller ─────────────────────────────────────────────────────

/// Background task owning the countdown.
///
/// Cancelling stops the timers. A request already sent finishes in the
/// background and its events are still delivered while the receiver lives.
/// Dropping the handle cancels the task, and the task also stops once the
/// event receiver is gone.
pub struct StatusPoller {
    trigger_tx: mpsc::Sender<()>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    _guard: DropGuard,
}

impl StatusPoller {
    /// Start polling with the dashboard's configured interval.
    ///
    /// The countdown resumes from the stored last-check time; with no
    /// record, now is recorded and the full interval applies.
    pub fn spawn(
        dashboard: Dashboard,
        events: mpsc::UnboundedSender<PollEvent>,
        cancel: CancellationToken,
    ) -> Self {
        let countdown = initial_countdown(&dashboard, Utc::now());
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let handle = tokio::spawn(poll_task(
            dashboard,
            countdown,
            events,
            trigger_rx,
            cancel.clone(),
        ));
        Self {
            trigger_tx,
            _guard: cancel.clone().drop_guard(),
            cancel,
            handle,
        }
    }

    /// Start a batch now and restart the countdown.
    ///
    /// Ignored while a trigger is already queued. The countdown is left
    /// alone when a batch is already running.
    pub fn trigger(&self) {
        if self.trigger_tx.try_send(()).is_err() {
            debug!("batch trigger already pending");
        }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop and wait for the tick loop to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "poller task ended abnormally");
        }
    }
}

fn initial_countdown(dashboard: &Dashboard, now: DateTime<Utc>) -> Countdown {
    let interval = dashboard.config().check_interval;
    let last = match dashboard.last_check() {
        Ok(last) => last,
        Err(e) => {
            warn!(error = %e, "could not read last check time");
            None
        }
    };
    if last.is_none() {
        if let Err(e) = dashboard.record_check(now) {
            warn!(error = %e, "could not persist last check time");
        }
    }
    Countdown::from_last_check(interval, last, now)
}

async fn poll_task(
    dashboard: Dashboard,
    mut countdown: Countdown,
    events: mpsc::UnboundedSender<PollEvent>,
    mut trigger_rx: mpsc::Receiver<()>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.tick().await; // consume the immediate first tick

    info!(every = countdown.interval().as_secs(), "status poller started");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            Some(()) = trigger_rx.recv() => {
                if start_batch(&dashboard, &events) {
                    countdown.reset();
                }
            }
            _ = interval.tick() => {
                let due = countdown.tick();
                if events.send(PollEvent::Tick { remaining: countdown.remaining() }).is_err() {
                    debug!("event receiver closed");
                    break;
                }
                if due {
                    start_batch(&dashboard, &events);
                }
            }
        }
    }

    debug!("status poller stopped");
}

/// Spawn a batch unless one is running. Returns whether it was spawned.
fn start_batch(dashboard: &Dashboard, events: &mpsc::UnboundedSender<PollEvent>) -> bool {
    if dashboard.is_checking() || events.is_closed() {
        debug!("batch still running or nobody listening; skipping this round");
        return false;
    }
    tokio::spawn(run_batch(dashboard.clone(), events.clone()));
    true
}

async fn run_batch(dashboard: Dashboard, events: mpsc::UnboundedSender<PollEvent>) {
    let _ = events.send(PollEvent::BatchStarted);
    let result = dashboard
        .check_all(|outcome| {
            let _ = events.send(PollEvent::BranchChecked(outcome.clone()));
        })
        .await;

    let event = match result {
        Ok(report) => PollEvent::BatchFinished {
            checked: report.checked(),
        },
        Err(CoreError::CheckInProgress) => {
            debug!("another batch won the race");
            return;
        }
        Err(e) if e.requires_login() => PollEvent::SessionExpired,
        Err(e) => PollEvent::BatchFailed(e.to_string()),
    };
    let _ = events.send(event);
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    const FIVE_MIN: Duration = Duration::from_secs(300);

    #[test]
    fn no_record_starts_at_full_interval() {
        let c = Countdown::from_last_check(FIVE_MIN, None, Utc::now());
        assert_eq!(c.remaining(), 300);
    }

    #[test]
    fn recent_check_resumes() {
        let now = Utc::now();
        let c = Countdown::from_last_check(FIVE_MIN, Some(now - TimeDelta::seconds(120)), now);
        assert_eq!(c.remaining(), 180);
    }

    #[test]
    fn stale_check_restarts() {
        let now = Utc::now();
        let c = Countdown::from_last_check(FIVE_MIN, Some(now - TimeDelta::seconds(301)), now);
        assert_eq!(c.remaining(), 300);
        let exact = Countdown::from_last_check(FIVE_MIN, Some(now - TimeDelta::seconds(300)), now);
        assert_eq!(exact.remaining(), 300);
    }

    #[test]
    fn future_timestamp_counts_as_just_checked() {
        let now = Utc::now();
        let c = Countdown::from_last_check(FIVE_MIN, Some(now + TimeDelta::seconds(30)), now);
        assert_eq!(c.remaining(), 300);
    }

    #[test]
    fn tick_fires_after_reaching_zero() {
        let mut c = Countdown::new(Duration::from_secs(2));
        assert!(!c.tick());
        assert_eq!(c.remaining(), 1);
        assert!(!c.tick());
        assert_eq!(c.remaining(), 0);
        assert!(c.tick());
        assert_eq!(c.remaining(), 2);
    }

    #[test]
    fn reset_restores_interval() {
        let mut c = Countdown::new(FIVE_MIN);
        c.tick();
        c.tick();
        c.reset();
        assert_eq!(c.remaining(), 300);
    }

    #[test]
    fn display_is_minutes_and_padded_seconds() {
        let now = Utc::now();
        assert_eq!(Countdown::new(FIVE_MIN).to_string(), "5:00");
        let c = Countdown::from_last_check(FIVE_MIN, Some(now - TimeDelta::seconds(295)), now);
        assert_eq!(c.to_string(), "0:05");
        assert_eq!(
            Countdown::new(Duration::from_secs(3725)).to_string(),
            "62:05"
        );
    }

    #[test]
    fn clock_matches_display() {
        assert_eq!(Countdown::clock(61), "1:01");
        assert_eq!(Countdown::clock(9), "0:09");
        let mut c = Countdown::new(Duration::from_secs(70));
        c.tick();
        assert_eq!(c.to_string(), Countdown::clock(c.remaining()));
    }

    #[test]
    fn zero_interval_is_clamped() {
        assert_eq!(Countdown::new(Duration::ZERO).remaining(), 1);
    }
}
