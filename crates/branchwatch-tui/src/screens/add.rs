//! Add-restaurant form: a restaurant and its first branch.
//!
//! The whole form is checked locally before submitting; a form with
//! problems never produces a request. Backend errors are shown verbatim.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};
use throbber_widgets_tui::{Throbber, ThrobberState};

use branchwatch_core::{FormField, NewRestaurantForm};

use crate::action::Action;
use crate::component::Component;
use crate::screen::ScreenId;
use crate::theme;
use crate::widgets::text_field::TextField;

/// Rows taken by one field: label plus a bordered box.
const FIELD_HEIGHT: u16 = 4;

pub struct AddRestaurantScreen {
    focused: bool,
    fields: Vec<(FormField, TextField)>,
    active: usize,
    /// Local validation failures from the last submit attempt.
    problems: Vec<String>,
    /// Backend rejection, verbatim.
    error: Option<String>,
    submitting: bool,
    throbber: ThrobberState,
}

impl AddRestaurantScreen {
    pub fn new() -> Self {
        let fields = FormField::all()
            .map(|f| {
                let label = if f.is_required() {
                    format!("{} *", f.label())
                } else {
                    f.label().to_owned()
                };
                let field = TextField::new(label);
                (f, if f.is_secret() { field.masked() } else { field })
            })
            .collect();
        Self {
            focused: false,
            fields,
            active: 0,
            problems: Vec::new(),
            error: None,
            submitting: false,
            throbber: ThrobberState::default(),
        }
    }

    fn form(&self) -> NewRestaurantForm {
        let mut form = NewRestaurantForm::default();
        for (field, input) in &self.fields {
            form.set(*field, input.value().to_owned());
        }
        form
    }

    fn focus_next(&mut self) {
        self.active = (self.active + 1) % self.fields.len();
    }

    fn focus_prev(&mut self) {
        self.active = (self.active + self.fields.len() - 1) % self.fields.len();
    }

    fn submit(&mut self) -> Option<Action> {
        let form = self.form();
        self.error = None;
        self.problems = form.problems().iter().map(ToString::to_string).collect();
        if !self.problems.is_empty() {
            return None;
        }
        self.submitting = true;
        Some(Action::SubmitRestaurant(Box::new(form)))
    }

    fn clear(&mut self) {
        for (_, input) in &mut self.fields {
            input.reset();
        }
        self.active = 0;
        self.problems.clear();
        self.error = None;
    }

    /// First field index and count that fit in `height` rows, keeping the
    /// active field visible.
    fn visible_window(&self, height: u16) -> (usize, usize) {
        let per_column = usize::from((height / FIELD_HEIGHT).max(1));
        let capacity = per_column * 2;
        let start = if self.active < capacity {
            0
        } else {
            self.active + 1 - capacity
        };
        (start, capacity.min(self.fields.len() - start))
    }

    fn render_messages(&self, frame: &mut Frame, area: Rect) {
        if self.submitting {
            let throbber = Throbber::default()
                .label(" Saving restaurant...")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, area, &mut self.throbber.clone());
            return;
        }

        let lines: Vec<Line> = self
            .error
            .iter()
            .chain(&self.problems)
            .map(|msg| Line::from(Span::styled(msg.as_str(), theme::error_text())))
            .collect();
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
    }
}

impl Component for AddRestaurantScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.submitting {
            return Ok(None);
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('s') if ctrl => return Ok(self.submit()),
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_prev(),
            KeyCode::Enter => {
                if self.active + 1 == self.fields.len() {
                    return Ok(self.submit());
                }
                self.focus_next();
            }
            KeyCode::Esc => return Ok(Some(Action::SwitchScreen(ScreenId::Dashboard))),
            _ => {
                if let Some((_, input)) = self.fields.get_mut(self.active) {
                    input.handle_key(key);
                }
            }
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::RestaurantAdded { .. } => {
                self.submitting = false;
                self.clear();
                return Ok(Some(Action::SwitchScreen(ScreenId::Dashboard)));
            }
            Action::SubmitFailed(message) => {
                self.submitting = false;
                self.error = Some(message.clone());
            }
            Action::SessionExpired | Action::Logout => self.submitting = false,
            Action::Tick if self.submitting => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Add Restaurant ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([
            Constraint::Min(FIELD_HEIGHT),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .horizontal_margin(1)
        .split(inner);

        let (start, count) = self.visible_window(layout[0].height);
        let per_column = count.div_ceil(2).max(1);
        let columns = Layout::horizontal([Constraint::Percentage(50); 2])
            .spacing(2)
            .split(layout[0]);

        for (offset, (_, input)) in self.fields.iter().skip(start).take(count).enumerate() {
            let column = columns[offset / per_column];
            let row = u16::try_from(offset % per_column).unwrap_or(0);
            let y = column.y + row * FIELD_HEIGHT;
            if y + FIELD_HEIGHT > column.y + column.height {
                continue;
            }
            let slot = Rect::new(column.x, y, column.width, FIELD_HEIGHT);
            input.render(frame, slot, start + offset == self.active && !self.submitting);
        }

        self.render_messages(frame, layout[1]);

        let hints = Line::from(vec![
            Span::styled("  Tab/↑↓ ", theme::key_hint_key()),
            Span::styled("move  ", theme::key_hint()),
            Span::styled("Ctrl+S ", theme::key_hint_key()),
            Span::styled("save  ", theme::key_hint()),
            Span::styled("Esc ", theme::key_hint_key()),
            Span::styled("back  ", theme::key_hint()),
            Span::styled("* ", theme::key_hint_key()),
            Span::styled("required", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[2]);
    }

    fn captures_input(&self) -> bool {
        true
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn press(screen: &mut AddRestaurantScreen, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, modifiers))
            .ok()
            .flatten()
    }

    fn fill(screen: &mut AddRestaurantScreen, field: FormField, value: &str) {
        screen.active = screen
            .fields
            .iter()
            .position(|(f, _)| *f == field)
            .unwrap_or_default();
        for c in value.chars() {
            press(screen, KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn empty_form_is_blocked_and_names_missing_fields() {
        let mut screen = AddRestaurantScreen::new();
        assert!(press(&mut screen, KeyCode::Char('s'), KeyModifiers::CONTROL).is_none());
        assert!(!screen.submitting);
        assert_eq!(
            screen.problems,
            vec![
                "Restaurant name: required",
                "Branch name: required",
                "Address: required",
                "Notification email: required",
            ]
        );
    }

    #[test]
    fn complete_form_submits_once() {
        let mut screen = AddRestaurantScreen::new();
        fill(&mut screen, FormField::RestaurantName, "Kebapci");
        fill(&mut screen, FormField::BranchName, "Moda");
        fill(&mut screen, FormField::Address, "Moda Cd. 1");
        fill(&mut screen, FormField::NotificationEmail, "ops@example.com");
        fill(&mut screen, FormField::TrendyolApiKey, "key-1");

        let Some(Action::SubmitRestaurant(form)) =
            press(&mut screen, KeyCode::Char('s'), KeyModifiers::CONTROL)
        else {
            panic!("expected a submit action");
        };
        assert_eq!(form.restaurant_name, "Kebapci");
        assert_eq!(form.branch.trendyol_api_key, "key-1");
        assert!(screen.problems.is_empty());

        // Keys are ignored until the backend answers.
        assert!(press(&mut screen, KeyCode::Char('s'), KeyModifiers::CONTROL).is_none());

        screen.update(&Action::SubmitFailed("Bu isim zaten kayıtlı".into())).ok();
        assert_eq!(screen.error.as_deref(), Some("Bu isim zaten kayıtlı"));
        assert_eq!(screen.form().restaurant_name, "Kebapci");
    }

    #[test]
    fn success_clears_the_form() {
        let mut screen = AddRestaurantScreen::new();
        fill(&mut screen, FormField::Address, "Moda Cd. 1");
        let follow_up = screen
            .update(&Action::RestaurantAdded {
                restaurant: "Kebapci".into(),
                branch: "Moda".into(),
            })
            .ok()
            .flatten();
        assert!(matches!(
            follow_up,
            Some(Action::SwitchScreen(ScreenId::Dashboard))
        ));
        assert_eq!(screen.form(), NewRestaurantForm::default());
        assert_eq!(screen.active, 0);
    }

    #[test]
    fn tab_wraps_around_the_fields() {
        let mut screen = AddRestaurantScreen::new();
        press(&mut screen, KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(screen.active, FormField::all().count() - 1);
        press(&mut screen, KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(screen.active, 0);
    }
}
