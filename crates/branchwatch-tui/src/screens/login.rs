//! Login screen: email and password, shown until a session exists.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};
use throbber_widgets_tui::{Throbber, ThrobberState};

use branchwatch_core::LoginForm;

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::{centered, text_field::TextField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Email,
    Password,
}

pub struct LoginScreen {
    server: String,
    email: TextField,
    password: TextField,
    focus: Focus,
    /// Shown verbatim under the form.
    error: Option<String>,
    submitting: bool,
    throbber: ThrobberState,
}

impl LoginScreen {
    pub fn new(server: impl Into<String>, email: Option<String>) -> Self {
        let focus = if email.is_some() {
            Focus::Password
        } else {
            Focus::Email
        };
        Self {
            server: server.into(),
            email: TextField::new("Email").with_value(email.unwrap_or_default()),
            password: TextField::new("Password").masked(),
            focus,
            error: None,
            submitting: false,
            throbber: ThrobberState::default(),
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Email => Focus::Password,
            Focus::Password => Focus::Email,
        };
    }

    fn submit(&mut self) -> Option<Action> {
        let form = LoginForm::new(self.email.value(), self.password.value());
        if let Err(e) = form.validate() {
            self.error = Some(e.to_string());
            return None;
        }
        self.error = None;
        self.submitting = true;
        Some(Action::Login(form))
    }
}

impl Component for LoginScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.submitting {
            return Ok(None);
        }
        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => self.toggle_focus(),
            KeyCode::Enter => match self.focus {
                Focus::Email => self.focus = Focus::Password,
                Focus::Password => return Ok(self.submit()),
            },
            KeyCode::Esc => return Ok(Some(Action::Quit)),
            _ => {
                let field = match self.focus {
                    Focus::Email => &mut self.email,
                    Focus::Password => &mut self.password,
                };
                field.handle_key(key);
            }
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::LoginFailed(message) => {
                self.submitting = false;
                self.error = Some(message.clone());
                self.password.reset();
                self.focus = Focus::Password;
            }
            Action::LoggedIn(_) => {
                self.submitting = false;
                self.error = None;
                self.password.reset();
            }
            Action::SessionExpired => {
                self.submitting = false;
                self.error = Some("Session expired. Please log in again.".into());
            }
            Action::Tick if self.submitting => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            area,
        );

        let panel = centered(area, 56, 18);
        let block = Block::default()
            .title(" branchwatch ")
            .title_style(theme::title_style())
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let layout = Layout::vertical([
            Constraint::Length(2), // server
            Constraint::Length(4), // email
            Constraint::Length(4), // password
            Constraint::Length(1), // spacer
            Constraint::Min(2),    // error / throbber
            Constraint::Length(1), // hints
        ])
        .horizontal_margin(2)
        .split(inner);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Server ", theme::key_hint()),
                Span::styled(self.server.as_str(), theme::table_row()),
            ])),
            layout[0],
        );

        self.email.render(frame, layout[1], self.focus == Focus::Email && !self.submitting);
        self.password
            .render(frame, layout[2], self.focus == Focus::Password && !self.submitting);

        if self.submitting {
            let throbber = Throbber::default()
                .label(" Logging in...")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, layout[4], &mut self.throbber.clone());
        } else if let Some(ref error) = self.error {
            frame.render_widget(
                Paragraph::new(Span::styled(error.as_str(), theme::error_text()))
                    .wrap(Wrap { trim: true }),
                layout[4],
            );
        }

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Tab ", theme::key_hint_key()),
                Span::styled("switch field  ", theme::key_hint()),
                Span::styled("Enter ", theme::key_hint_key()),
                Span::styled("log in  ", theme::key_hint()),
                Span::styled("Esc ", theme::key_hint_key()),
                Span::styled("quit", theme::key_hint()),
            ]))
            .alignment(Alignment::Center),
            layout[5],
        );
    }

    fn captures_input(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    use super::*;

    fn press(screen: &mut LoginScreen, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .ok()
            .flatten()
    }

    fn type_str(screen: &mut LoginScreen, s: &str) {
        for c in s.chars() {
            press(screen, KeyCode::Char(c));
        }
    }

    #[test]
    fn empty_password_is_rejected_locally() {
        let mut screen = LoginScreen::new("http://localhost:8000", Some("ops@example.com".into()));
        assert!(press(&mut screen, KeyCode::Enter).is_none());
        assert!(!screen.submitting);
        assert!(screen.error.is_some());
    }

    #[test]
    fn enter_on_password_submits() {
        let mut screen = LoginScreen::new("http://localhost:8000", None);
        type_str(&mut screen, "ops@example.com");
        assert!(press(&mut screen, KeyCode::Enter).is_none());
        type_str(&mut screen, "secret");

        let Some(Action::Login(form)) = press(&mut screen, KeyCode::Enter) else {
            panic!("expected a login action");
        };
        assert_eq!(form.email, "ops@example.com");
        assert_eq!(form.password, "secret");
        assert!(screen.submitting);
    }

    #[test]
    fn backend_message_is_shown_verbatim() {
        let mut screen = LoginScreen::new("http://localhost:8000", None);
        screen.submitting = true;
        screen
            .update(&Action::LoginFailed("Şifre hatalı".into()))
            .ok();
        assert_eq!(screen.error.as_deref(), Some("Şifre hatalı"));
        assert!(!screen.submitting);
    }
}
