//! Generic queue grid screen
//!
//! One Elm-style state machine instantiated for each of the four queues:
//! messages in, commands out, all store work behind `Command::perform`.
//! Edit/select/commit keys are ignored while a load or commit is in flight,
//! which keeps the controller's mutual-exclusion invariant visible in the
//! UI as disabled controls.

use std::collections::BTreeMap;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row as TableRow, Table,
    TableState,
};
use ratatui::Frame;

use crate::queue::{CommitKind, FilterState, GridRow, LoadMode, Phase, QueueGridController};
use crate::store::QueueStore;

use super::command::Command;
use super::theme::Theme;
use super::view::{centered_rect, notice_style};

pub enum Msg<S: QueueStore> {
    Load(LoadMode),
    Loaded {
        mode: LoadMode,
        result: anyhow::Result<(Vec<S::Row>, Vec<String>)>,
    },
    CommitFinished {
        kind: CommitKind,
        batch: BTreeMap<i64, String>,
        result: anyhow::Result<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

enum PickTarget {
    Row(i64),
    Bulk,
}

enum PendingAction {
    Individual,
    Bulk(String),
}

enum Overlay {
    None,
    Search,
    StatusPicker { target: PickTarget, index: usize },
    Confirm(PendingAction),
}

pub struct QueueScreen<S: QueueStore> {
    title: &'static str,
    store: Arc<S>,
    controller: QueueGridController<S::Row>,
    cursor: usize,
    table_state: TableState,
    overlay: Overlay,
    notice: Option<Notice>,
    loaded_once: bool,
}

impl<S: QueueStore> QueueScreen<S> {
    pub fn new(title: &'static str, store: Arc<S>, controller: QueueGridController<S::Row>) -> Self {
        Self {
            title,
            store,
            controller,
            cursor: 0,
            table_state: TableState::default(),
            overlay: Overlay::None,
            notice: None,
            loaded_once: false,
        }
    }

    /// Called when the screen becomes the active tab. The first activation
    /// kicks off the initial load; later ones find the screen already open
    /// with its state intact.
    pub fn activate(&mut self) -> Command<Msg<S>> {
        if self.loaded_once {
            Command::None
        } else {
            self.loaded_once = true;
            self.load_command(LoadMode::Initial)
        }
    }

    /// True while an overlay owns the keyboard; the app must not treat keys
    /// as global shortcuts then.
    pub fn captures_input(&self) -> bool {
        !matches!(self.overlay, Overlay::None)
    }

    fn busy(&self) -> bool {
        matches!(self.controller.phase(), Phase::Loading | Phase::Committing)
    }

    fn set_notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            text: text.into(),
        });
    }

    fn load_command(&mut self, mode: LoadMode) -> Command<Msg<S>> {
        if let Err(err) = self.controller.begin_load(mode) {
            self.set_notice(NoticeLevel::Warning, err.to_string());
            return Command::None;
        }

        let store = self.store.clone();
        Command::perform(
            async move {
                let rows = store.fetch_all().await?;
                let statuses = store.fetch_distinct_statuses().await?;
                Ok((rows, statuses))
            },
            move |result| Msg::Loaded { mode, result },
        )
    }

    pub fn update(&mut self, msg: Msg<S>) -> Command<Msg<S>> {
        match msg {
            Msg::Load(mode) => self.load_command(mode),

            Msg::Loaded { mode, result } => match result {
                Ok((rows, statuses)) => {
                    let summary = self.controller.finish_load(mode, rows, statuses);
                    self.cursor = self.controller.anchor();
                    if summary.catalog_empty {
                        self.set_notice(
                            NoticeLevel::Warning,
                            "Status catalog is empty: no valid target statuses until data exists",
                        );
                    } else if summary.dropped_selections > 0 || summary.dropped_edits > 0 {
                        self.set_notice(
                            NoticeLevel::Info,
                            format!(
                                "Refreshed: {} selection(s) and {} staged edit(s) no longer apply",
                                summary.dropped_selections, summary.dropped_edits
                            ),
                        );
                    }
                    Command::None
                }
                Err(err) => {
                    // Previous snapshot stays visible; controls come back.
                    self.controller.fail_load();
                    self.set_notice(NoticeLevel::Error, format!("Load failed: {err:#}"));
                    Command::None
                }
            },

            Msg::CommitFinished {
                kind,
                batch,
                result,
            } => match result {
                Ok(count) => {
                    self.controller.finish_commit(kind, &batch);
                    self.set_notice(
                        NoticeLevel::Info,
                        format!("Successfully updated {count} record(s)"),
                    );
                    self.load_command(LoadMode::Refresh)
                }
                Err(err) => {
                    // Staged edits and selection are preserved for retry.
                    self.controller.fail_commit();
                    self.set_notice(NoticeLevel::Error, format!("Update failed: {err:#}"));
                    Command::None
                }
            },
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Command<Msg<S>> {
        match &self.overlay {
            Overlay::None => self.handle_grid_key(key),
            Overlay::Search => {
                self.handle_search_key(key);
                Command::None
            }
            Overlay::StatusPicker { .. } => {
                self.handle_picker_key(key);
                Command::None
            }
            Overlay::Confirm(_) => self.handle_confirm_key(key),
        }
    }

    fn handle_grid_key(&mut self, key: KeyEvent) -> Command<Msg<S>> {
        // Refresh is always allowed (begin_load rejects it when busy); the
        // editing keys are disabled outright.
        if key.code == KeyCode::Char('r') {
            return self.load_command(LoadMode::Refresh);
        }
        if self.busy() {
            return Command::None;
        }

        let visible_len = self.controller.visible().len();
        match key.code {
            KeyCode::Up => self.move_cursor(-1, visible_len),
            KeyCode::Down => self.move_cursor(1, visible_len),
            KeyCode::PageUp => self.move_cursor(-15, visible_len),
            KeyCode::PageDown => self.move_cursor(15, visible_len),
            KeyCode::Home => {
                self.cursor = 0;
                self.controller.set_anchor(0);
            }
            KeyCode::End => {
                self.cursor = visible_len.saturating_sub(1);
                self.controller.set_anchor(self.cursor);
            }

            KeyCode::Char(' ') => {
                if let Some(id) = self.cursor_row_id() {
                    let selected = !self.controller.is_selected(id);
                    if let Err(err) = self.controller.toggle_select(id, selected) {
                        self.set_notice(NoticeLevel::Warning, err.to_string());
                    }
                }
            }

            KeyCode::Enter => {
                if let Some(id) = self.cursor_row_id() {
                    if self.controller.status_catalog().is_empty() {
                        self.set_notice(
                            NoticeLevel::Warning,
                            "No valid statuses available to choose from",
                        );
                    } else {
                        self.overlay = Overlay::StatusPicker {
                            target: PickTarget::Row(id),
                            index: 0,
                        };
                    }
                }
            }

            KeyCode::Char('s') => {
                if self.controller.pending_count() == 0 {
                    self.set_notice(NoticeLevel::Info, "No individual status changes to save");
                } else {
                    self.overlay = Overlay::Confirm(PendingAction::Individual);
                }
            }

            KeyCode::Char('b') => {
                if self.controller.selected_count() == 0 {
                    self.set_notice(NoticeLevel::Info, "No rows selected for a bulk update");
                } else if self.controller.status_catalog().is_empty() {
                    self.set_notice(
                        NoticeLevel::Warning,
                        "No valid statuses available to choose from",
                    );
                } else {
                    self.overlay = Overlay::StatusPicker {
                        target: PickTarget::Bulk,
                        index: 0,
                    };
                }
            }

            KeyCode::Char('/') => {
                self.overlay = Overlay::Search;
            }

            KeyCode::Char('c') => self.cycle_company_filter(),
            KeyCode::Char('f') => self.cycle_status_filter(),

            KeyCode::Char('x') => {
                if self.controller.set_filter(FilterState::default()).is_ok() {
                    self.set_notice(NoticeLevel::Info, "Filters cleared");
                }
            }

            KeyCode::Esc => {
                self.notice = None;
            }

            _ => {}
        }
        Command::None
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.overlay = Overlay::None;
            }
            KeyCode::Backspace => {
                let mut filter = self.controller.filter().clone();
                filter.search.pop();
                let _ = self.controller.set_filter(filter);
            }
            KeyCode::Char(c) => {
                let mut filter = self.controller.filter().clone();
                filter.search.push(c);
                let _ = self.controller.set_filter(filter);
            }
            _ => {}
        }
        self.clamp_cursor();
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        let catalog_len = self.controller.status_catalog().len();
        match key.code {
            KeyCode::Esc => {
                self.overlay = Overlay::None;
            }
            KeyCode::Up => {
                if let Overlay::StatusPicker { index, .. } = &mut self.overlay {
                    *index = index.saturating_sub(1);
                }
            }
            KeyCode::Down => {
                if let Overlay::StatusPicker { index, .. } = &mut self.overlay {
                    if *index + 1 < catalog_len {
                        *index += 1;
                    }
                }
            }
            KeyCode::Enter => {
                let (target, index) = match std::mem::replace(&mut self.overlay, Overlay::None) {
                    Overlay::StatusPicker { target, index } => (target, index),
                    other => {
                        self.overlay = other;
                        return;
                    }
                };
                let Some(status) = self.controller.status_catalog().get(index).cloned() else {
                    return;
                };
                match target {
                    PickTarget::Row(id) => {
                        if let Err(err) = self.controller.edit_status(id, &status) {
                            self.set_notice(NoticeLevel::Warning, err.to_string());
                        }
                    }
                    PickTarget::Bulk => {
                        self.overlay = Overlay::Confirm(PendingAction::Bulk(status));
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Command<Msg<S>> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let action = std::mem::replace(&mut self.overlay, Overlay::None);
                let Overlay::Confirm(action) = action else {
                    return Command::None;
                };
                self.start_commit(action)
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.overlay = Overlay::None;
                Command::None
            }
            _ => Command::None,
        }
    }

    fn start_commit(&mut self, action: PendingAction) -> Command<Msg<S>> {
        let (kind, staged) = match &action {
            PendingAction::Individual => (
                CommitKind::Individual,
                self.controller.begin_commit_individual(),
            ),
            PendingAction::Bulk(status) => {
                (CommitKind::Bulk, self.controller.begin_commit_bulk(status))
            }
        };

        match staged {
            Ok(Some(batch)) => {
                let store = self.store.clone();
                let actor = self.controller.actor().to_string();
                Command::perform(
                    async move {
                        let result = store.apply_status_updates(&batch, &actor).await;
                        (batch, result)
                    },
                    move |(batch, result)| Msg::CommitFinished {
                        kind,
                        batch,
                        result,
                    },
                )
            }
            Ok(None) => {
                self.set_notice(NoticeLevel::Info, "Nothing to save");
                Command::None
            }
            Err(err) => {
                self.set_notice(NoticeLevel::Warning, err.to_string());
                Command::None
            }
        }
    }

    fn move_cursor(&mut self, delta: isize, visible_len: usize) {
        if visible_len == 0 {
            self.cursor = 0;
        } else {
            let next = self.cursor as isize + delta;
            self.cursor = next.clamp(0, visible_len as isize - 1) as usize;
        }
        self.controller.set_anchor(self.cursor);
    }

    fn clamp_cursor(&mut self) {
        let visible_len = self.controller.visible().len();
        if self.cursor >= visible_len {
            self.cursor = visible_len.saturating_sub(1);
        }
        self.controller.set_anchor(self.cursor);
    }

    fn cursor_row_id(&self) -> Option<i64> {
        self.controller.visible().get(self.cursor).map(|r| r.id())
    }

    fn cycle_company_filter(&mut self) {
        let companies = self.controller.companies();
        let mut filter = self.controller.filter().clone();
        filter.company = match &filter.company {
            None => companies.first().cloned(),
            Some(current) => {
                let next = companies.iter().position(|c| c == current).map(|i| i + 1);
                next.and_then(|i| companies.get(i).cloned())
            }
        };
        let _ = self.controller.set_filter(filter);
        self.clamp_cursor();
    }

    fn cycle_status_filter(&mut self) {
        let catalog = self.controller.status_catalog().to_vec();
        let mut filter = self.controller.filter().clone();
        filter.status = match &filter.status {
            None => catalog.first().cloned(),
            Some(current) => {
                let next = catalog.iter().position(|s| s == current).map(|i| i + 1);
                next.and_then(|i| catalog.get(i).cloned())
            }
        };
        let _ = self.controller.set_filter(filter);
        self.clamp_cursor();
    }

    pub fn view(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_filter_bar(frame, chunks[0], theme);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(chunks[1]);

        self.render_grid(frame, body[0], theme);
        self.render_side_panel(frame, body[1], theme);
        self.render_footer(frame, chunks[2], theme);
        self.render_overlay(frame, area, theme);
    }

    fn render_filter_bar(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let filter = self.controller.filter();
        let searching = matches!(self.overlay, Overlay::Search);

        let mut spans = vec![
            Span::styled("Company: ", Style::default().fg(theme.muted)),
            Span::styled(
                filter.company.clone().unwrap_or_else(|| "All".to_string()),
                Style::default().fg(theme.text),
            ),
            Span::raw("  "),
            Span::styled("Status: ", Style::default().fg(theme.muted)),
            Span::styled(
                filter.status.clone().unwrap_or_else(|| "All".to_string()),
                Style::default().fg(theme.text),
            ),
            Span::raw("  "),
            Span::styled("Search: ", Style::default().fg(theme.muted)),
        ];
        if searching {
            spans.push(Span::styled(
                format!("{}_", filter.search),
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            ));
        } else if filter.search.is_empty() {
            spans.push(Span::styled("(none)", Style::default().fg(theme.muted)));
        } else {
            spans.push(Span::styled(
                filter.search.clone(),
                Style::default().fg(theme.text),
            ));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border))
            .title("Filters");
        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn render_grid(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let visible = self.controller.visible();

        let header = TableRow::new(
            std::iter::once("Sel")
                .chain(S::Row::columns().iter().copied())
                .map(|name| {
                    Cell::from(name).style(
                        Style::default()
                            .fg(theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                })
                .collect::<Vec<_>>(),
        );

        let rows: Vec<TableRow> = visible
            .iter()
            .map(|row| {
                let marker = if self.controller.is_selected(row.id()) {
                    "[x]"
                } else {
                    "[ ]"
                };
                let mut style = Style::default().fg(theme.text);
                if self.controller.has_pending(row.id()) {
                    style = Style::default().fg(theme.pending_fg).bg(theme.pending_bg);
                }
                let cells = std::iter::once(marker.to_string()).chain(row.cells());
                TableRow::new(cells.map(Cell::from).collect::<Vec<_>>()).style(style)
            })
            .collect();

        let widths: Vec<Constraint> = std::iter::once(Constraint::Length(4))
            .chain(S::Row::columns().iter().map(|_| Constraint::Min(8)))
            .collect();

        let busy_tag = match self.controller.phase() {
            Phase::Loading => " [loading...]",
            Phase::Committing => " [saving...]",
            _ => "",
        };
        let title = format!(
            "{} ({} of {} records){}",
            self.title,
            visible.len(),
            self.controller.total(),
            busy_tag
        );

        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.border))
                    .title(title),
            );

        self.table_state.select(if visible.is_empty() {
            None
        } else {
            Some(self.cursor.min(visible.len() - 1))
        });
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_side_panel(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(3)])
            .split(area);

        let counts = vec![
            Line::from(vec![
                Span::styled("Total records: ", Style::default().fg(theme.muted)),
                Span::styled(
                    self.controller.total().to_string(),
                    Style::default().fg(theme.text),
                ),
            ]),
            Line::from(vec![
                Span::styled("Selected: ", Style::default().fg(theme.muted)),
                Span::styled(
                    self.controller.selected_count().to_string(),
                    Style::default().fg(theme.selected),
                ),
            ]),
            Line::from(vec![
                Span::styled("Individual changes: ", Style::default().fg(theme.muted)),
                Span::styled(
                    self.controller.pending_count().to_string(),
                    Style::default().fg(theme.warning),
                ),
            ]),
            Line::from(vec![
                Span::styled("Statuses: ", Style::default().fg(theme.muted)),
                Span::styled(
                    self.controller.status_catalog().len().to_string(),
                    Style::default().fg(theme.text),
                ),
            ]),
        ];
        frame.render_widget(
            Paragraph::new(counts).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.border))
                    .title("Counts"),
            ),
            chunks[0],
        );

        // Selection crosses filter boundaries, so this projection may show
        // rows the grid currently hides.
        let items: Vec<ListItem> = self
            .controller
            .selected_rows()
            .iter()
            .map(|row| {
                ListItem::new(format!(
                    "{}  {}  {}",
                    row.id(),
                    row.company(),
                    row.status()
                ))
            })
            .collect();
        frame.render_widget(
            List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.border))
                    .title("Selected records"),
            ),
            chunks[1],
        );
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let line = if let Some(notice) = &self.notice {
            Line::from(Span::styled(
                notice.text.clone(),
                notice_style(notice.level, theme),
            ))
        } else {
            Line::from(Span::styled(
                "space select | enter edit status | s save | b bulk update | / search | c company | f status | x clear | r refresh | q quit",
                Style::default().fg(theme.muted),
            ))
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_overlay(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        match &self.overlay {
            Overlay::None | Overlay::Search => {}
            Overlay::StatusPicker { target, index } => {
                let title = match target {
                    PickTarget::Row(id) => format!("Set status for row {id}"),
                    PickTarget::Bulk => format!(
                        "Set status for {} selected row(s)",
                        self.controller.selected_count()
                    ),
                };
                let items: Vec<ListItem> = self
                    .controller
                    .status_catalog()
                    .iter()
                    .map(|s| ListItem::new(s.clone()))
                    .collect();
                let popup = centered_rect(area, 40, (items.len() as u16 + 2).min(12));
                let mut state = ListState::default();
                state.select(Some(*index));
                frame.render_widget(Clear, popup);
                frame.render_stateful_widget(
                    List::new(items)
                        .highlight_style(
                            Style::default()
                                .fg(theme.accent)
                                .add_modifier(Modifier::REVERSED),
                        )
                        .block(
                            Block::default()
                                .borders(Borders::ALL)
                                .border_style(Style::default().fg(theme.accent))
                                .title(title),
                        ),
                    popup,
                    &mut state,
                );
            }
            Overlay::Confirm(action) => {
                let text = match action {
                    PendingAction::Individual => format!(
                        "Save {} individual status change(s)? (y/n)",
                        self.controller.pending_count()
                    ),
                    PendingAction::Bulk(status) => format!(
                        "Set {} selected row(s) to '{}'? (y/n)",
                        self.controller.selected_count(),
                        status
                    ),
                };
                let popup = centered_rect(area, (text.len() as u16 + 4).max(30), 3);
                frame.render_widget(Clear, popup);
                frame.render_widget(
                    Paragraph::new(text).block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(theme.warning))
                            .title("Confirm"),
                    ),
                    popup,
                );
            }
        }
    }
}
