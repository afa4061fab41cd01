//! Application core: event loop, screen management, action dispatch.
//!
//! Backend calls run as spawned tokio tasks that report back through the
//! action channel, so the loop never waits on the network.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs, Wrap},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use branchwatch_core::{CoreError, Dashboard, NewRestaurantForm, PollEvent, StatusPoller, User};

use crate::action::{Action, ConfirmAction, Notification, NotificationLevel};
use crate::component::Component;
use crate::data_bridge::spawn_data_bridge;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::centered;

const NOTIFICATION_TTL: Duration = Duration::from_secs(6);

/// Text to show for a failed backend call. Backend messages pass through
/// untouched.
fn failure_message(err: &CoreError) -> String {
    match err {
        CoreError::AuthenticationFailed { message }
        | CoreError::Api { message, .. }
        | CoreError::ValidationFailed { message } => message.clone(),
        other => other.to_string(),
    }
}

/// Follow-up for a failed call. Session expiry is reported by the data
/// bridge when the auth state flips, so it produces nothing here.
fn failure(err: &CoreError) -> Vec<Action> {
    match err {
        CoreError::SessionExpired => Vec::new(),
        CoreError::NotLoggedIn => vec![Action::SessionExpired],
        other => vec![Action::Notify(Notification::error(failure_message(other)))],
    }
}

/// Top-level application state and event loop.
pub struct App {
    dashboard: Dashboard,
    profile: String,
    active_screen: ScreenId,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    user: Option<User>,
    help_visible: bool,
    confirm: Option<ConfirmAction>,
    notification: Option<(Notification, Instant)>,
    poller: Option<StatusPoller>,
    poll_tx: mpsc::UnboundedSender<PollEvent>,
    poll_rx: Option<mpsc::UnboundedReceiver<PollEvent>>,
    batch_started: Option<Instant>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(dashboard: Dashboard, profile: String, email: Option<String>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (poll_tx, poll_rx) = mpsc::unbounded_channel();
        let screens = create_screens(dashboard.config().url.as_str(), email)
            .into_iter()
            .collect();

        Self {
            dashboard,
            profile,
            active_screen: ScreenId::Login,
            screens,
            running: true,
            user: None,
            help_visible: false,
            confirm: None,
            notification: None,
            poller: None,
            poll_tx,
            poll_rx: Some(poll_rx),
            batch_started: None,
            action_tx,
            action_rx,
        }
    }

    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        Ok(())
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_screens()?;

        let bridge_cancel = CancellationToken::new();
        if let Some(poll_rx) = self.poll_rx.take() {
            tokio::spawn(spawn_data_bridge(
                self.dashboard.clone(),
                poll_rx,
                self.action_tx.clone(),
                bridge_cancel.clone(),
            ));
        }

        if self.dashboard.is_logged_in() {
            self.user = self.dashboard.current_user();
            self.switch_to(ScreenId::Dashboard);
            self.start_session();
        }

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!(profile = %self.profile, "TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        bridge_cancel.cancel();
        if let Some(poller) = self.poller.take() {
            poller.shutdown().await;
        }
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    // ── Keys ─────────────────────────────────────────────────────────

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.confirm.is_some() {
            return Ok(match key.code {
                KeyCode::Char('y' | 'Y') | KeyCode::Enter => Some(Action::ConfirmYes),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(Action::ConfirmNo),
                _ => None,
            });
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        let captures = self
            .screens
            .get(&self.active_screen)
            .is_some_and(|s| s.captures_input());

        if !captures {
            match key.code {
                KeyCode::Char('q') => return Ok(Some(Action::Quit)),
                KeyCode::Char('?') => return Ok(Some(Action::ToggleHelp)),
                KeyCode::Char('L') => return Ok(Some(Action::ShowConfirm(ConfirmAction::Logout))),
                KeyCode::Char(c @ '1'..='9') => {
                    let n = u8::try_from(c).map_or(0, |b| b - b'0');
                    if let Some(screen) = ScreenId::from_number(n) {
                        return Ok(Some(Action::SwitchScreen(screen)));
                    }
                }
                KeyCode::Tab => return Ok(Some(Action::SwitchScreen(self.active_screen.next()))),
                KeyCode::BackTab => {
                    return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
                }
                _ => {}
            }
        }

        let action = match self.screens.get_mut(&self.active_screen) {
            Some(screen) => screen.handle_key_event(key)?,
            None => None,
        };
        if action.is_none() && key.code == KeyCode::Esc && self.notification.is_some() {
            return Ok(Some(Action::DismissNotification));
        }
        Ok(action)
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Run a backend call in the background and dispatch what it returns.
    fn spawn_task<F>(&self, task: F)
    where
        F: Future<Output = Vec<Action>> + Send + 'static,
    {
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            for action in task.await {
                let _ = tx.send(action);
            }
        });
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some((notification, Instant::now()));
    }

    fn switch_to(&mut self, target: ScreenId) {
        if target == self.active_screen {
            return;
        }
        debug!("switching screen: {} → {}", self.active_screen, target);
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(false);
        }
        self.active_screen = target;
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
    }

    /// Load the listings and start the countdown.
    fn start_session(&mut self) {
        let dashboard = self.dashboard.clone();
        self.spawn_task(async move {
            match dashboard.refresh().await {
                Ok(_) => Vec::new(),
                Err(e) => failure(&e),
            }
        });
        if self.poller.is_none() {
            self.poller = Some(StatusPoller::spawn(
                self.dashboard.clone(),
                self.poll_tx.clone(),
                CancellationToken::new(),
            ));
        }
    }

    fn end_session(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        self.user = None;
        self.batch_started = None;
        self.confirm = None;
        self.switch_to(ScreenId::Login);
    }

    /// Hand an action to every screen; data and status updates matter to
    /// screens that are not currently shown.
    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Render => {}

            Action::Resize(w, h) => debug!(w, h, "terminal resized"),

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() > NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
                self.broadcast(action)?;
            }

            Action::SwitchScreen(target) => {
                if *target == ScreenId::Login || self.dashboard.is_logged_in() {
                    self.switch_to(*target);
                }
            }

            Action::ShowRestaurantBranches(_) => {
                self.switch_to(ScreenId::Branches);
                self.broadcast(action)?;
            }

            // ── Session ───────────────────────────────────────────
            Action::Login(form) => {
                let dashboard = self.dashboard.clone();
                let form = form.clone();
                self.spawn_task(async move {
                    match dashboard.login(&form).await {
                        Ok(user) => vec![Action::LoggedIn(user)],
                        Err(e) => vec![Action::LoginFailed(failure_message(&e))],
                    }
                });
            }

            Action::LoggedIn(user) => {
                info!(user = %user.display_name(), "logged in");
                self.user = Some(user.clone());
                self.notify(Notification::success(format!(
                    "Logged in as {}",
                    user.display_name()
                )));
                self.switch_to(ScreenId::Dashboard);
                self.start_session();
                self.broadcast(action)?;
            }

            Action::Logout => {
                self.end_session();
                let dashboard = self.dashboard.clone();
                self.spawn_task(async move {
                    if let Err(e) = dashboard.logout().await {
                        warn!(error = %e, "logout failed");
                    }
                    vec![Action::Notify(Notification::info("Logged out"))]
                });
                self.broadcast(action)?;
            }

            Action::SessionExpired => {
                warn!("session expired");
                self.end_session();
                self.broadcast(action)?;
            }

            // ── Listings ──────────────────────────────────────────
            Action::Refresh => {
                let dashboard = self.dashboard.clone();
                self.spawn_task(async move {
                    match dashboard.refresh().await {
                        Ok(_) => vec![Action::Notify(Notification::info("Refreshed"))],
                        Err(e) => failure(&e),
                    }
                });
            }

            // ── Checks ────────────────────────────────────────────
            Action::CheckBranch(id) => {
                let dashboard = self.dashboard.clone();
                let id = *id;
                self.spawn_task(async move {
                    match dashboard.check_branch(id).await {
                        Ok(outcome) => {
                            let state = if outcome.any_online() { "online" } else { "offline" };
                            let note = Notification::success(format!(
                                "{}: {state}",
                                outcome.branch_name
                            ));
                            vec![Action::BranchChecked(outcome), Action::Notify(note)]
                        }
                        Err(e) => {
                            let mut actions = vec![Action::BranchCheckFailed(id)];
                            actions.extend(failure(&e));
                            actions
                        }
                    }
                });
            }

            Action::CheckAll => {
                if self.dashboard.is_checking() {
                    self.notify(Notification::info("A check is already running"));
                } else if let Some(ref poller) = self.poller {
                    poller.trigger();
                }
            }

            Action::BatchStarted => {
                self.batch_started = Some(Instant::now());
                self.broadcast(action)?;
            }

            Action::BatchFinished { checked } => {
                let took = self
                    .batch_started
                    .take()
                    .map(|t| Duration::from_secs(t.elapsed().as_secs()))
                    .unwrap_or_default();
                self.notify(Notification::success(format!(
                    "Checked {checked} branches in {}",
                    humantime::format_duration(took)
                )));
                self.broadcast(action)?;
            }

            Action::BatchFailed(message) => {
                self.batch_started = None;
                self.notify(Notification::error(message.clone()));
                self.broadcast(action)?;
            }

            // ── Add / delete ──────────────────────────────────────
            Action::SubmitRestaurant(form) => {
                let dashboard = self.dashboard.clone();
                let form = form.clone();
                self.spawn_task(async move { submit_restaurant(&dashboard, &form).await });
            }

            Action::RestaurantAdded { restaurant, branch } => {
                self.notify(Notification::success(format!(
                    "Added {restaurant} with branch {branch}"
                )));
                self.broadcast(action)?;
            }

            Action::DeleteRestaurant(id) => {
                let dashboard = self.dashboard.clone();
                let id = *id;
                self.spawn_task(async move {
                    match dashboard.delete_restaurant(id).await {
                        Ok(()) => vec![Action::Notify(Notification::success("Restaurant deleted"))],
                        Err(e) => failure(&e),
                    }
                });
            }

            Action::DeleteBranch(id) => {
                let dashboard = self.dashboard.clone();
                let id = *id;
                self.spawn_task(async move {
                    match dashboard.delete_branch(id).await {
                        Ok(()) => vec![Action::Notify(Notification::success("Branch deleted"))],
                        Err(e) => failure(&e),
                    }
                });
            }

            // ── Dialogs ───────────────────────────────────────────
            Action::ShowConfirm(confirm) => self.confirm = Some(confirm.clone()),

            Action::ConfirmYes => {
                if let Some(confirm) = self.confirm.take() {
                    self.action_tx.send(confirm.into_action())?;
                }
            }

            Action::ConfirmNo => self.confirm = None,

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Notify(notification) => self.notify(notification.clone()),

            Action::DismissNotification => self.notification = None,

            // Data and per-screen status updates.
            other => self.broadcast(other)?,
        }

        Ok(())
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        if self.active_screen == ScreenId::Login {
            let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);
            if let Some(screen) = self.screens.get(&ScreenId::Login) {
                screen.render(frame, layout[0]);
            }
            self.render_status_bar(frame, layout[1]);
            return;
        }

        let layout = Layout::vertical([
            Constraint::Length(1), // Tab bar
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        self.render_tab_bar(frame, layout[0]);
        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, layout[1]);
        }
        self.render_status_bar(frame, layout[2]);

        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
        if let Some(ref confirm) = self.confirm {
            Self::render_confirm(frame, area, confirm);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {} ", id.number(), id.label()), style))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );

        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let who = match self.user {
            Some(ref user) => Span::styled(
                format!("● {}", user.display_name()),
                Style::default().fg(theme::SUCCESS_GREEN),
            ),
            None if self.dashboard.is_logged_in() => {
                Span::styled("● logged in", Style::default().fg(theme::SUCCESS_GREEN))
            }
            None => Span::styled("○ logged out", Style::default().fg(theme::ERROR_RED)),
        };

        let mut spans = vec![
            Span::raw(" "),
            who,
            Span::styled(format!(" │ {}", self.profile), theme::key_hint()),
            Span::styled(" │ ", theme::key_hint()),
        ];

        match self.notification {
            Some((ref n, _)) => {
                let color = match n.level {
                    NotificationLevel::Success => theme::SUCCESS_GREEN,
                    NotificationLevel::Error => theme::ERROR_RED,
                    NotificationLevel::Info => theme::NEON_CYAN,
                };
                spans.push(Span::styled(n.message.as_str(), Style::default().fg(color)));
            }
            None if self.active_screen == ScreenId::Login => {
                spans.push(Span::styled("Ctrl+C quit", theme::key_hint()));
            }
            None => spans.push(Span::styled("? help  L logout  q quit", theme::key_hint())),
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_confirm(frame: &mut Frame, area: Rect, confirm: &ConfirmAction) {
        let dialog = centered(area, 52, 7);
        frame.render_widget(Clear, dialog);

        let block = Block::default()
            .title(" Confirm ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::CORAL))
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(dialog);
        frame.render_widget(block, dialog);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(confirm.to_string(), theme::table_row())),
            Line::from(""),
            Line::from(vec![
                Span::styled("y ", theme::key_hint_key()),
                Span::styled("confirm   ", theme::key_hint()),
                Span::styled("n ", theme::key_hint_key()),
                Span::styled("cancel", theme::key_hint()),
            ]),
        ];
        frame.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            inner,
        );
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let help_area = centered(area, 56, 20);
        frame.render_widget(Clear, help_area);

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let key = |k: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {k:<10}"), theme::key_hint_key()),
                Span::styled(what, theme::key_hint()),
            ])
        };
        let heading = |title: &'static str| {
            Line::from(Span::styled(format!("  {title}"), Style::default().fg(theme::NEON_CYAN)))
        };

        let help_text = vec![
            Line::from(""),
            heading("Navigation"),
            key("1-3", "Jump to screen"),
            key("Tab", "Next screen"),
            key("j/k ↑/↓", "Move up/down"),
            key("Esc", "Back / clear / dismiss"),
            Line::from(""),
            heading("Restaurants & branches"),
            key("c", "Check selected branch"),
            key("C", "Check all branches now"),
            key("/", "Search branches by name"),
            key("d", "Delete selected"),
            key("r", "Refresh"),
            key("Ctrl+S", "Save the add form"),
            Line::from(""),
            heading("Global"),
            key("L", "Log out"),
            key("q", "Quit"),
        ];

        frame.render_widget(Paragraph::new(help_text), inner);
    }
}

/// Create a restaurant with its first branch.
///
/// On failure the store is refreshed anyway, since the restaurant may
/// exist without its branch. The add error is what the form shows.
async fn submit_restaurant(dashboard: &Dashboard, form: &NewRestaurantForm) -> Vec<Action> {
    match dashboard.add_restaurant(form).await {
        Ok((restaurant, branch)) => vec![Action::RestaurantAdded {
            restaurant: restaurant.name,
            branch: branch.name,
        }],
        Err(e) => {
            if !e.requires_login() {
                if let Err(refresh) = dashboard.refresh().await {
                    warn!(error = %refresh, "refresh after failed add failed");
                }
            }
            vec![Action::SubmitFailed(failure_message(&e))]
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn backend_messages_pass_through_verbatim() {
        let err = CoreError::Api {
            message: "Bu şube zaten var".into(),
            status: Some(400),
        };
        assert_eq!(failure_message(&err), "Bu şube zaten var");

        let err = CoreError::AuthenticationFailed {
            message: "Invalid credentials".into(),
        };
        assert_eq!(failure_message(&err), "Invalid credentials");
    }

    fn offline_dashboard() -> Dashboard {
        let sessions = std::sync::Arc::new(branchwatch_core::MemorySessionStore::new());
        branchwatch_core::SessionStore::save(
            sessions.as_ref(),
            &branchwatch_core::Session::new("tok".to_string().into(), None),
        )
        .unwrap();
        let config = branchwatch_core::ServiceConfig::new("http://127.0.0.1:9".parse().unwrap());
        Dashboard::new(config, sessions).unwrap()
    }

    #[tokio::test]
    async fn failed_add_reports_the_add_error_even_if_refresh_fails() {
        let mut form = NewRestaurantForm::default();
        form.set(branchwatch_core::FormField::RestaurantName, "Kebapci".into());
        form.set(branchwatch_core::FormField::BranchName, "Moda".into());
        form.set(branchwatch_core::FormField::Address, "Moda Cd. 1".into());
        form.set(
            branchwatch_core::FormField::NotificationEmail,
            "ops@example.com".into(),
        );

        let actions = submit_restaurant(&offline_dashboard(), &form).await;
        let [Action::SubmitFailed(message)] = actions.as_slice() else {
            panic!("unexpected actions: {actions:?}");
        };
        assert!(!message.is_empty());
    }

    #[tokio::test]
    async fn incomplete_add_is_rejected_locally() {
        let actions = submit_restaurant(&offline_dashboard(), &NewRestaurantForm::default()).await;
        let [Action::SubmitFailed(message)] = actions.as_slice() else {
            panic!("unexpected actions: {actions:?}");
        };
        assert!(message.contains("required"));
    }

    #[test]
    fn expiry_is_left_to_the_auth_watch() {
        assert!(failure(&CoreError::SessionExpired).is_empty());
        assert!(matches!(
            failure(&CoreError::NotLoggedIn).as_slice(),
            [Action::SessionExpired]
        ));
        assert!(matches!(
            failure(&CoreError::Timeout).as_slice(),
            [Action::Notify(n)] if n.level == NotificationLevel::Error
        ));
    }
}
