//! Dashboard: headline counts, next-check countdown and the restaurant table.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState},
};
use throbber_widgets_tui::{Throbber, ThrobberState};

use branchwatch_core::{Branch, Countdown, Overview, Restaurant};

use super::{clamp_selection, move_selection};
use crate::action::{Action, ConfirmAction};
use crate::component::Component;
use crate::screen::ScreenId;
use crate::theme;

pub struct DashboardScreen {
    focused: bool,
    restaurants: Arc<Vec<Arc<Restaurant>>>,
    branches: Arc<Vec<Arc<Branch>>>,
    table_state: TableState,
    /// Seconds until the next automatic batch; `None` until the poller ticks.
    countdown: Option<u64>,
    /// Branches checked so far while a batch runs.
    batch_progress: Option<usize>,
    throbber: ThrobberState,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            restaurants: Arc::new(Vec::new()),
            branches: Arc::new(Vec::new()),
            table_state: TableState::default(),
            countdown: None,
            batch_progress: None,
            throbber: ThrobberState::default(),
        }
    }

    fn overview(&self) -> Overview {
        Overview::compute(
            self.restaurants.len(),
            self.branches.iter().map(AsRef::as_ref),
        )
    }

    fn selected(&self) -> Option<&Arc<Restaurant>> {
        self.table_state
            .selected()
            .and_then(|i| self.restaurants.get(i))
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect) {
        let overview = self.overview();
        let cards = Layout::horizontal([Constraint::Ratio(1, 5); 5]).split(area);

        let stat = |label: &'static str, value: String, color: Color| {
            Paragraph::new(vec![
                Line::from(Span::styled(
                    value,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(label, theme::key_hint())),
            ])
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(theme::border_default()),
            )
        };

        frame.render_widget(
            stat("Restaurants", overview.total_restaurants.to_string(), theme::NEON_CYAN),
            cards[0],
        );
        frame.render_widget(
            stat("Branches", overview.total_branches.to_string(), theme::NEON_CYAN),
            cards[1],
        );
        frame.render_widget(
            stat("Online", overview.online_branches.to_string(), theme::SUCCESS_GREEN),
            cards[2],
        );
        frame.render_widget(
            stat("Offline", overview.offline_branches.to_string(), theme::ERROR_RED),
            cards[3],
        );

        if let Some(done) = self.batch_progress {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme::border_focused());
            let inner = block.inner(cards[4]);
            frame.render_widget(block, cards[4]);
            let throbber = Throbber::default()
                .label(format!(" Checking {done}/{}", overview.total_branches))
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, inner, &mut self.throbber.clone());
        } else {
            let next = self.countdown.map_or_else(|| "-:--".to_owned(), Countdown::clock);
            frame.render_widget(stat("Next check", next, theme::ELECTRIC_YELLOW), cards[4]);
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(
            ["ID", "Restaurant", "Branches", "Online", "Offline"]
                .map(|h| Cell::from(h).style(theme::table_header())),
        );

        let rows: Vec<Row> = self
            .restaurants
            .iter()
            .map(|r| {
                Row::new(vec![
                    Cell::from(r.id.to_string()),
                    Cell::from(r.name.clone()).style(Style::default().fg(theme::NEON_CYAN)),
                    Cell::from(r.total_branches.to_string()),
                    Cell::from(r.online_branches.to_string())
                        .style(Style::default().fg(theme::SUCCESS_GREEN)),
                    Cell::from(r.offline_branches.to_string()).style(
                        if r.offline_branches > 0 {
                            Style::default().fg(theme::ERROR_RED)
                        } else {
                            theme::table_row()
                        },
                    ),
                ])
                .style(theme::table_row())
            })
            .collect();

        let widths = [
            Constraint::Length(6),
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(8),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected())
            .highlight_symbol("▸ ")
            .block(
                Block::default()
                    .title(" Restaurants ")
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
}

impl Component for DashboardScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let len = self.restaurants.len();
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                move_selection(&mut self.table_state, len, 1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                move_selection(&mut self.table_state, len, -1);
                None
            }
            KeyCode::Char('g') => {
                move_selection(&mut self.table_state, len, isize::MIN);
                None
            }
            KeyCode::Char('G') => {
                move_selection(&mut self.table_state, len, isize::MAX);
                None
            }
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Char('c') => Some(Action::CheckAll),
            KeyCode::Char('a') => Some(Action::SwitchScreen(ScreenId::AddRestaurant)),
            KeyCode::Char('d') => self.selected().map(|r| {
                Action::ShowConfirm(ConfirmAction::DeleteRestaurant {
                    id: r.id,
                    name: r.name.clone(),
                })
            }),
            KeyCode::Enter => self.selected().map(|r| Action::ShowRestaurantBranches(r.id)),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::RestaurantsUpdated(restaurants) => {
                self.restaurants = Arc::clone(restaurants);
                clamp_selection(&mut self.table_state, self.restaurants.len());
            }
            Action::BranchesUpdated(branches) => self.branches = Arc::clone(branches),
            Action::CountdownTick(remaining) => self.countdown = Some(*remaining),
            Action::BatchStarted => self.batch_progress = Some(0),
            Action::BranchChecked(_) => {
                if let Some(done) = self.batch_progress.as_mut() {
                    *done += 1;
                }
            }
            Action::BatchFinished { .. } | Action::BatchFailed(_) => self.batch_progress = None,
            Action::SessionExpired | Action::Logout => {
                self.batch_progress = None;
                self.countdown = None;
            }
            Action::Tick if self.batch_progress.is_some() => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Length(4),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

        self.render_stats(frame, layout[0]);
        self.render_table(frame, layout[1]);

        let hints = Line::from(vec![
            Span::styled("  j/k ", theme::key_hint_key()),
            Span::styled("navigate  ", theme::key_hint()),
            Span::styled("Enter ", theme::key_hint_key()),
            Span::styled("branches  ", theme::key_hint()),
            Span::styled("c ", theme::key_hint_key()),
            Span::styled("check all  ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("refresh  ", theme::key_hint()),
            Span::styled("a ", theme::key_hint_key()),
            Span::styled("add  ", theme::key_hint()),
            Span::styled("d ", theme::key_hint_key()),
            Span::styled("delete", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[2]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
