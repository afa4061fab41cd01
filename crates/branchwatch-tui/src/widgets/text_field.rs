//! Labelled single-line text field backed by `tui-input`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Position, Rect},
    style::Style,
    text::Span,
    widgets::{Block, BorderType, Borders, Paragraph},
};
use tui_input::{Input, InputRequest};

use crate::theme;

const MASK: char = '\u{25CF}';

#[derive(Debug, Clone, Default)]
pub struct TextField {
    label: String,
    input: Input,
    masked: bool,
}

impl TextField {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            input: Input::default(),
            masked: false,
        }
    }

    /// Echo every character as a dot.
    #[must_use]
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.input = Input::new(value.into());
        self
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn reset(&mut self) {
        self.input.reset();
    }

    /// Apply an editing key. Returns `false` for keys the field ignores
    /// (Tab, Enter, Esc, arrows up/down) so the caller can handle them.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let request = match key.code {
            KeyCode::Char('w') if ctrl => InputRequest::DeletePrevWord,
            KeyCode::Char('u') if ctrl => InputRequest::DeleteLine,
            KeyCode::Char('a') if ctrl => InputRequest::GoToStart,
            KeyCode::Char('e') if ctrl => InputRequest::GoToEnd,
            KeyCode::Char(_) if ctrl => return false,
            KeyCode::Char(c) => InputRequest::InsertChar(c),
            KeyCode::Backspace => InputRequest::DeletePrevChar,
            KeyCode::Delete => InputRequest::DeleteNextChar,
            KeyCode::Left => InputRequest::GoToPrevChar,
            KeyCode::Right => InputRequest::GoToNextChar,
            KeyCode::Home => InputRequest::GoToStart,
            KeyCode::End => InputRequest::GoToEnd,
            _ => return false,
        };
        self.input.handle(request);
        true
    }

    /// Label on the first row, a bordered box on the next three.
    pub fn render(&self, frame: &mut Frame, area: Rect, active: bool) {
        if area.height < 4 {
            return;
        }

        let label_style = if active {
            Style::default().fg(theme::NEON_CYAN)
        } else {
            Style::default().fg(theme::DIM_WHITE)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(self.label.as_str(), label_style)),
            Rect::new(area.x, area.y, area.width, 1),
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if active {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let box_area = Rect::new(area.x, area.y + 1, area.width, 3);
        let inner = block.inner(box_area);
        frame.render_widget(block, box_area);

        let width = usize::from(inner.width.max(1));
        let (display, cursor) = if self.masked {
            (
                MASK.to_string().repeat(self.input.value().chars().count()),
                self.input.cursor(),
            )
        } else {
            (self.input.value().to_owned(), self.input.visual_cursor())
        };
        let scroll = cursor.saturating_sub(width.saturating_sub(1));

        frame.render_widget(
            Paragraph::new(Span::styled(display, Style::default().fg(theme::NEON_CYAN)))
                .scroll((0, u16::try_from(scroll).unwrap_or(u16::MAX))),
            inner,
        );

        if active {
            let offset = u16::try_from(cursor - scroll).unwrap_or(inner.width);
            frame.set_cursor_position(Position::new(inner.x + offset, inner.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn type_str(field: &mut TextField, s: &str) {
        for c in s.chars() {
            field.handle_key(key(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    #[test]
    fn typing_and_editing() {
        let mut field = TextField::new("Email");
        type_str(&mut field, "ops@exmple.com");
        assert_eq!(field.value(), "ops@exmple.com");

        field.handle_key(key(KeyCode::Home, KeyModifiers::NONE));
        for _ in 0.."ops@ex".len() {
            field.handle_key(key(KeyCode::Right, KeyModifiers::NONE));
        }
        type_str(&mut field, "a");
        assert_eq!(field.value(), "ops@example.com");

        field.handle_key(key(KeyCode::End, KeyModifiers::NONE));
        field.handle_key(key(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(field.value(), "ops@example.co");

        field.handle_key(key(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(field.value(), "");
    }

    #[test]
    fn navigation_keys_are_left_to_the_caller() {
        let mut field = TextField::new("Email");
        assert!(!field.handle_key(key(KeyCode::Tab, KeyModifiers::NONE)));
        assert!(!field.handle_key(key(KeyCode::Enter, KeyModifiers::NONE)));
        assert!(!field.handle_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert_eq!(field.value(), "");
    }
}
