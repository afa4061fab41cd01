//! Branches: per-platform status table with search, checks and deletes.

use std::collections::HashSet;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState},
};
use throbber_widgets_tui::{Throbber, ThrobberState};

use branchwatch_core::{Branch, EntityId, Platform, filter_branches};

use super::{clamp_selection, move_selection};
use crate::action::{Action, ConfirmAction};
use crate::component::Component;
use crate::theme;
use crate::widgets::{status_badge, text_field::TextField};

pub struct BranchesScreen {
    focused: bool,
    branches: Arc<Vec<Arc<Branch>>>,
    /// Rows after the restaurant and search filters.
    visible: Vec<Arc<Branch>>,
    restaurant_filter: Option<EntityId>,
    search: TextField,
    searching: bool,
    table_state: TableState,
    /// Branches with a single check in flight.
    checking: HashSet<EntityId>,
    batch_running: bool,
    throbber: ThrobberState,
}

impl BranchesScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            branches: Arc::new(Vec::new()),
            visible: Vec::new(),
            restaurant_filter: None,
            search: TextField::new("Search"),
            searching: false,
            table_state: TableState::default(),
            checking: HashSet::new(),
            batch_running: false,
            throbber: ThrobberState::default(),
        }
    }

    fn apply_filter(&mut self) {
        let scoped: Vec<Arc<Branch>> = match self.restaurant_filter {
            Some(rid) => self
                .branches
                .iter()
                .filter(|b| b.restaurant_id == rid)
                .cloned()
                .collect(),
            None => self.branches.to_vec(),
        };
        self.visible = filter_branches(&scoped, self.search.value());
        clamp_selection(&mut self.table_state, self.visible.len());
    }

    fn selected(&self) -> Option<&Arc<Branch>> {
        self.table_state.selected().and_then(|i| self.visible.get(i))
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.search.reset();
                self.searching = false;
            }
            KeyCode::Enter => self.searching = false,
            _ => {
                self.search.handle_key(key);
            }
        }
        self.apply_filter();
    }

    fn filter_line(&self) -> Line<'_> {
        let mut spans = vec![Span::styled(
            format!(" {} of {} branches", self.visible.len(), self.branches.len()),
            theme::table_row(),
        )];
        if let Some(rid) = self.restaurant_filter {
            let name = self
                .branches
                .iter()
                .find(|b| b.restaurant_id == rid)
                .map_or_else(|| format!("#{rid}"), |b| b.restaurant_name.clone());
            spans.push(Span::styled("  Restaurant: ", theme::key_hint()));
            spans.push(Span::styled(name, Style::default().fg(theme::CORAL)));
        }
        if !self.search.value().is_empty() {
            spans.push(Span::styled("  Search: ", theme::key_hint()));
            spans.push(Span::styled(
                self.search.value().to_owned(),
                Style::default().fg(theme::NEON_CYAN),
            ));
        }
        Line::from(spans)
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let mut titles = vec!["ID", "Restaurant", "Branch"];
        titles.extend(Platform::all().map(Platform::label));
        titles.push("Status");
        let header = Row::new(
            titles
                .into_iter()
                .map(|h| Cell::from(h).style(theme::table_header())),
        );

        let rows: Vec<Row> = self
            .visible
            .iter()
            .map(|b| {
                let mut cells = vec![
                    Cell::from(b.id.to_string()),
                    Cell::from(b.restaurant_name.clone()),
                    Cell::from(b.name.clone()).style(Style::default().fg(theme::NEON_CYAN)),
                ];
                cells.extend(
                    Platform::all().map(|p| Cell::from(status_badge::status_span(&b.status(p)))),
                );
                cells.push(if self.checking.contains(&b.id) {
                    Cell::from(Span::styled("◐ checking", Style::default().fg(theme::ELECTRIC_YELLOW)))
                } else {
                    Cell::from(status_badge::online_span(b.is_online))
                });
                Row::new(cells).style(theme::table_row())
            })
            .collect();

        let mut widths = vec![
            Constraint::Length(5),
            Constraint::Min(12),
            Constraint::Min(12),
        ];
        widths.extend(Platform::all().map(|_| Constraint::Length(15)));
        widths.push(Constraint::Length(11));

        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected())
            .highlight_symbol("▸ ")
            .block(
                Block::default()
                    .title(" Branches ")
                    .title_style(theme::title_style())
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(if self.focused {
                        theme::border_focused()
                    } else {
                        theme::border_default()
                    }),
            );

        let mut state = self.table_state;
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect, branch: &Branch) {
        let field = |label: &'static str, value: String| {
            Line::from(vec![
                Span::styled(format!(" {label:<20}"), theme::key_hint()),
                Span::styled(value, theme::table_row()),
            ])
        };
        let dash = || "─".to_owned();

        let lines = vec![
            field("Address", branch.address.clone()),
            field(
                "Notification email",
                branch.notification_email.clone().unwrap_or_else(dash),
            ),
            field("Telegram", branch.telegram_username.clone().unwrap_or_else(dash)),
            field(
                "Last status change",
                branch.last_status_change.map_or_else(dash, |t| {
                    t.with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string()
                }),
            ),
        ];

        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title(format!(" {} ", branch.name))
                    .title_style(theme::title_style())
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(theme::border_default()),
            ),
            area,
        );
    }
}

impl Component for BranchesScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.searching {
            self.handle_search_key(key);
            return Ok(None);
        }

        let len = self.visible.len();
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                move_selection(&mut self.table_state, len, 1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                move_selection(&mut self.table_state, len, -1);
                None
            }
            KeyCode::Char('/') => {
                self.searching = true;
                None
            }
            KeyCode::Esc if self.restaurant_filter.is_some() || !self.search.value().is_empty() => {
                self.restaurant_filter = None;
                self.search.reset();
                self.apply_filter();
                None
            }
            KeyCode::Char('c') | KeyCode::Enter => {
                let id = self.selected().map(|b| b.id);
                id.filter(|id| self.checking.insert(*id))
                    .map(Action::CheckBranch)
            }
            KeyCode::Char('C') => Some(Action::CheckAll),
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Char('d') => self.selected().map(|b| {
                Action::ShowConfirm(ConfirmAction::DeleteBranch {
                    id: b.id,
                    name: b.name.clone(),
                })
            }),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::BranchesUpdated(branches) => {
                self.branches = Arc::clone(branches);
                self.apply_filter();
            }
            Action::ShowRestaurantBranches(rid) => {
                self.restaurant_filter = Some(*rid);
                self.search.reset();
                self.apply_filter();
                self.table_state.select(if self.visible.is_empty() { None } else { Some(0) });
            }
            Action::BranchChecked(outcome) => {
                self.checking.remove(&outcome.branch_id);
            }
            Action::BranchCheckFailed(id) => {
                self.checking.remove(id);
            }
            Action::BatchStarted => self.batch_running = true,
            Action::BatchFinished { .. } | Action::BatchFailed(_) => self.batch_running = false,
            Action::SessionExpired | Action::Logout => {
                self.checking.clear();
                self.batch_running = false;
            }
            Action::Tick if self.batch_running || !self.checking.is_empty() => {
                self.throbber.calc_next();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let search_height = if self.searching { 4 } else { 0 };
        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(search_height),
            Constraint::Min(5),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(area);

        if self.batch_running {
            let throbber = Throbber::default()
                .label(" Checking all branches...")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, layout[0], &mut self.throbber.clone());
        } else {
            frame.render_widget(Paragraph::new(self.filter_line()), layout[0]);
        }

        if self.searching {
            self.search.render(frame, layout[1], true);
        }

        self.render_table(frame, layout[2]);

        if let Some(branch) = self.selected() {
            self.render_detail(frame, layout[3], branch);
        }

        let hints = Line::from(vec![
            Span::styled("  j/k ", theme::key_hint_key()),
            Span::styled("navigate  ", theme::key_hint()),
            Span::styled("/ ", theme::key_hint_key()),
            Span::styled("search  ", theme::key_hint()),
            Span::styled("c ", theme::key_hint_key()),
            Span::styled("check  ", theme::key_hint()),
            Span::styled("C ", theme::key_hint_key()),
            Span::styled("check all  ", theme::key_hint()),
            Span::styled("d ", theme::key_hint_key()),
            Span::styled("delete  ", theme::key_hint()),
            Span::styled("Esc ", theme::key_hint_key()),
            Span::styled("clear filter", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[4]);
    }

    fn captures_input(&self) -> bool {
        self.searching
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    use super::*;

    fn branch(id: i64, restaurant_id: i64, name: &str) -> Arc<Branch> {
        Arc::new(Branch {
            id,
            restaurant_id,
            restaurant_name: format!("R{restaurant_id}"),
            name: name.into(),
            address: "Moda Cd. 1".into(),
            manager_name: None,
            notification_email: None,
            telegram_username: None,
            is_online: id % 2 == 0,
            last_status_change: None,
            platforms: BTreeMap::new(),
        })
    }

    fn press(screen: &mut BranchesScreen, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .ok()
            .flatten()
    }

    fn loaded() -> BranchesScreen {
        let mut screen = BranchesScreen::new();
        let branches = Arc::new(vec![
            branch(1, 1, "Kadıköy Moda"),
            branch(2, 1, "Bebek"),
            branch(3, 2, "Moda Sahil"),
        ]);
        screen.update(&Action::BranchesUpdated(branches)).ok();
        screen
    }

    fn visible_ids(screen: &BranchesScreen) -> Vec<i64> {
        screen.visible.iter().map(|b| b.id).collect()
    }

    #[test]
    fn search_filters_while_typing() {
        let mut screen = loaded();
        press(&mut screen, KeyCode::Char('/'));
        assert!(screen.captures_input());
        for c in "moda".chars() {
            press(&mut screen, KeyCode::Char(c));
        }
        assert_eq!(visible_ids(&screen), vec![1, 3]);

        press(&mut screen, KeyCode::Enter);
        assert!(!screen.captures_input());
        assert_eq!(visible_ids(&screen), vec![1, 3]);

        press(&mut screen, KeyCode::Esc);
        assert_eq!(visible_ids(&screen), vec![1, 2, 3]);
    }

    #[test]
    fn restaurant_scope_combines_with_search() {
        let mut screen = loaded();
        screen.update(&Action::ShowRestaurantBranches(1)).ok();
        assert_eq!(visible_ids(&screen), vec![1, 2]);

        press(&mut screen, KeyCode::Char('/'));
        for c in "MODA".chars() {
            press(&mut screen, KeyCode::Char(c));
        }
        assert_eq!(visible_ids(&screen), vec![1]);
    }

    #[test]
    fn a_branch_is_checked_once_at_a_time() {
        let mut screen = loaded();
        assert!(matches!(
            press(&mut screen, KeyCode::Char('c')),
            Some(Action::CheckBranch(1))
        ));
        assert!(press(&mut screen, KeyCode::Char('c')).is_none());

        screen.update(&Action::BranchCheckFailed(1)).ok();
        assert!(matches!(
            press(&mut screen, KeyCode::Char('c')),
            Some(Action::CheckBranch(1))
        ));
    }
}
