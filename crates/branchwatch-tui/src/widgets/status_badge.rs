//! Platform status badge: ●/○/◐/◉ plus the status label, colored by tone.

use ratatui::text::Span;

use branchwatch_core::{PlatformStatus, StatusTone};

use crate::theme;

pub fn tone_symbol(tone: StatusTone) -> &'static str {
    match tone {
        StatusTone::Good => "●",
        StatusTone::Bad => "○",
        StatusTone::Alert => "◉",
        StatusTone::Warning => "◐",
        StatusTone::Neutral => "·",
    }
}

/// Styled `● Online` / `○ Offline` / ... span for a table cell.
pub fn status_span(status: &PlatformStatus) -> Span<'static> {
    let tone = status.tone();
    Span::styled(
        format!("{} {}", tone_symbol(tone), status.label()),
        theme::status_style(tone),
    )
}

/// Overall branch state.
pub fn online_span(online: bool) -> Span<'static> {
    let text = if online { "● online" } else { "○ offline" };
    Span::styled(text, theme::online_style(online))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn badge_keeps_unknown_labels_verbatim() {
        let span = status_span(&PlatformStatus::Unknown("Kapalı".into()));
        assert_eq!(span.content, "· Kapalı");
        assert_eq!(status_span(&PlatformStatus::AuthError).content, "◉ Auth Error");
    }
}
