//! Top-level application: the four queue tabs and the screen registry.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use log::info;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Tabs;
use ratatui::Frame;
use sqlx::SqlitePool;

use crate::config::{Config, QueueSettings};
use crate::queue::{DefaultFilterPolicy, GridRow, QueueGridController, SortPolicy};
use crate::store::{R26Store, ReportScheduleStore, RpaDetailStore, SdReportStore};

use super::command::Command;
use super::screen::{Msg, QueueScreen};
use super::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    R26,
    ReportSchedule,
    RpaDetail,
    SdReport,
}

impl QueueKind {
    pub const ALL: [QueueKind; 4] = [
        QueueKind::R26,
        QueueKind::ReportSchedule,
        QueueKind::RpaDetail,
        QueueKind::SdReport,
    ];

    pub fn title(self) -> &'static str {
        match self {
            QueueKind::R26 => "R26 Daily Queue",
            QueueKind::ReportSchedule => "Report Process Schedule",
            QueueKind::RpaDetail => "RPA Schedule Detail",
            QueueKind::SdReport => "SD Report Schedule",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

pub enum AppMsg {
    Key(KeyEvent),
    /// Terminal resized or similar; nothing to do beyond the redraw the
    /// runtime performs for every message.
    Redraw,
    R26(Msg<R26Store>),
    ReportSchedule(Msg<ReportScheduleStore>),
    RpaDetail(Msg<RpaDetailStore>),
    SdReport(Msg<SdReportStore>),
    Quit,
}

/// Lazily-created screens, one per queue. Navigation always reuses an
/// already-open screen (with its snapshot, staged edits and filters intact)
/// instead of constructing a fresh one.
#[derive(Default)]
pub struct ScreenRegistry {
    r26: Option<QueueScreen<R26Store>>,
    report_schedule: Option<QueueScreen<ReportScheduleStore>>,
    rpa_detail: Option<QueueScreen<RpaDetailStore>>,
    sd_report: Option<QueueScreen<SdReportStore>>,
}

impl ScreenRegistry {
    pub fn is_open(&self, kind: QueueKind) -> bool {
        match kind {
            QueueKind::R26 => self.r26.is_some(),
            QueueKind::ReportSchedule => self.report_schedule.is_some(),
            QueueKind::RpaDetail => self.rpa_detail.is_some(),
            QueueKind::SdReport => self.sd_report.is_some(),
        }
    }
}

pub struct App {
    pool: SqlitePool,
    config: Config,
    theme: Theme,
    active: QueueKind,
    registry: ScreenRegistry,
}

impl App {
    pub fn new(pool: SqlitePool, config: Config, start: QueueKind) -> Self {
        Self {
            pool,
            config,
            theme: Theme::default(),
            active: start,
            registry: ScreenRegistry::default(),
        }
    }

    pub fn init(&mut self) -> Command<AppMsg> {
        self.switch_to(self.active)
    }

    fn controller_for<R: GridRow>(&self, settings: &QueueSettings) -> QueueGridController<R> {
        let policy = settings
            .default_company
            .clone()
            .map(DefaultFilterPolicy::Company)
            .unwrap_or_default();
        let sort = if settings.pending_first {
            SortPolicy::PendingFirst
        } else {
            SortPolicy::SnapshotOrder
        };
        QueueGridController::new(self.config.actor(), policy, sort)
    }

    fn switch_to(&mut self, kind: QueueKind) -> Command<AppMsg> {
        self.active = kind;
        if !self.registry.is_open(kind) {
            info!("opening screen: {}", kind.title());
        }

        match kind {
            QueueKind::R26 => {
                if self.registry.r26.is_none() {
                    let controller = self.controller_for(&self.config.queues.r26);
                    let store = Arc::new(R26Store::new(self.pool.clone()));
                    self.registry.r26 = Some(QueueScreen::new(kind.title(), store, controller));
                }
                match self.registry.r26.as_mut() {
                    Some(screen) => screen.activate().map(AppMsg::R26),
                    None => Command::None,
                }
            }
            QueueKind::ReportSchedule => {
                if self.registry.report_schedule.is_none() {
                    let controller = self.controller_for(&self.config.queues.report_schedule);
                    let store = Arc::new(ReportScheduleStore::new(self.pool.clone()));
                    self.registry.report_schedule =
                        Some(QueueScreen::new(kind.title(), store, controller));
                }
                match self.registry.report_schedule.as_mut() {
                    Some(screen) => screen.activate().map(AppMsg::ReportSchedule),
                    None => Command::None,
                }
            }
            QueueKind::RpaDetail => {
                if self.registry.rpa_detail.is_none() {
                    let controller = self.controller_for(&self.config.queues.rpa_detail);
                    let store = Arc::new(RpaDetailStore::new(self.pool.clone()));
                    self.registry.rpa_detail =
                        Some(QueueScreen::new(kind.title(), store, controller));
                }
                match self.registry.rpa_detail.as_mut() {
                    Some(screen) => screen.activate().map(AppMsg::RpaDetail),
                    None => Command::None,
                }
            }
            QueueKind::SdReport => {
                if self.registry.sd_report.is_none() {
                    let controller = self.controller_for(&self.config.queues.sd_report);
                    let store = Arc::new(SdReportStore::new(self.pool.clone()));
                    self.registry.sd_report =
                        Some(QueueScreen::new(kind.title(), store, controller));
                }
                match self.registry.sd_report.as_mut() {
                    Some(screen) => screen.activate().map(AppMsg::SdReport),
                    None => Command::None,
                }
            }
        }
    }

    fn active_captures_input(&self) -> bool {
        match self.active {
            QueueKind::R26 => self.registry.r26.as_ref().is_some_and(|s| s.captures_input()),
            QueueKind::ReportSchedule => self
                .registry
                .report_schedule
                .as_ref()
                .is_some_and(|s| s.captures_input()),
            QueueKind::RpaDetail => self
                .registry
                .rpa_detail
                .as_ref()
                .is_some_and(|s| s.captures_input()),
            QueueKind::SdReport => self
                .registry
                .sd_report
                .as_ref()
                .is_some_and(|s| s.captures_input()),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command<AppMsg> {
        // Global shortcuts only apply while no overlay owns the keyboard.
        if !self.active_captures_input() {
            match key.code {
                KeyCode::Char('q') => return Command::Quit,
                KeyCode::Tab => {
                    let next = self.active.next();
                    return self.switch_to(next);
                }
                KeyCode::BackTab => {
                    let prev = self.active.prev();
                    return self.switch_to(prev);
                }
                KeyCode::F(n @ 1..=4) => {
                    return self.switch_to(QueueKind::ALL[(n - 1) as usize]);
                }
                _ => {}
            }
        }

        match self.active {
            QueueKind::R26 => match self.registry.r26.as_mut() {
                Some(screen) => screen.handle_key(key).map(AppMsg::R26),
                None => Command::None,
            },
            QueueKind::ReportSchedule => match self.registry.report_schedule.as_mut() {
                Some(screen) => screen.handle_key(key).map(AppMsg::ReportSchedule),
                None => Command::None,
            },
            QueueKind::RpaDetail => match self.registry.rpa_detail.as_mut() {
                Some(screen) => screen.handle_key(key).map(AppMsg::RpaDetail),
                None => Command::None,
            },
            QueueKind::SdReport => match self.registry.sd_report.as_mut() {
                Some(screen) => screen.handle_key(key).map(AppMsg::SdReport),
                None => Command::None,
            },
        }
    }

    pub fn update(&mut self, msg: AppMsg) -> Command<AppMsg> {
        match msg {
            AppMsg::Quit => Command::Quit,
            AppMsg::Redraw => Command::None,
            AppMsg::Key(key) => self.handle_key(key),
            AppMsg::R26(msg) => match self.registry.r26.as_mut() {
                Some(screen) => screen.update(msg).map(AppMsg::R26),
                None => Command::None,
            },
            AppMsg::ReportSchedule(msg) => match self.registry.report_schedule.as_mut() {
                Some(screen) => screen.update(msg).map(AppMsg::ReportSchedule),
                None => Command::None,
            },
            AppMsg::RpaDetail(msg) => match self.registry.rpa_detail.as_mut() {
                Some(screen) => screen.update(msg).map(AppMsg::RpaDetail),
                None => Command::None,
            },
            AppMsg::SdReport(msg) => match self.registry.sd_report.as_mut() {
                Some(screen) => screen.update(msg).map(AppMsg::SdReport),
                None => Command::None,
            },
        }
    }

    pub fn view(&mut self, frame: &mut Frame) {
        let theme = self.theme.clone();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(5)])
            .split(frame.area());

        let titles: Vec<String> = QueueKind::ALL
            .iter()
            .enumerate()
            .map(|(i, kind)| format!("F{} {}", i + 1, kind.title()))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.active.index())
            .style(Style::default().fg(theme.muted))
            .highlight_style(
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, chunks[0]);

        match self.active {
            QueueKind::R26 => {
                if let Some(screen) = self.registry.r26.as_mut() {
                    screen.view(frame, chunks[1], &theme);
                }
            }
            QueueKind::ReportSchedule => {
                if let Some(screen) = self.registry.report_schedule.as_mut() {
                    screen.view(frame, chunks[1], &theme);
                }
            }
            QueueKind::RpaDetail => {
                if let Some(screen) = self.registry.rpa_detail.as_mut() {
                    screen.view(frame, chunks[1], &theme);
                }
            }
            QueueKind::SdReport => {
                if let Some(screen) = self.registry.sd_report.as_mut() {
                    screen.view(frame, chunks[1], &theme);
                }
            }
        }
    }
}
