//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::tui::QueueKind;

#[derive(Parser)]
#[command(name = "dailyqueue-tui")]
#[command(about = "Terminal console for the daily work queues")]
pub struct Cli {
    /// Path to the config file (defaults to the platform config directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Queue to open on startup
    #[arg(short, long, value_enum, default_value_t = QueueArg::R26)]
    pub queue: QueueArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum QueueArg {
    R26,
    ReportSchedule,
    RpaDetail,
    SdReport,
}

impl From<QueueArg> for QueueKind {
    fn from(arg: QueueArg) -> Self {
        match arg {
            QueueArg::R26 => QueueKind::R26,
            QueueArg::ReportSchedule => QueueKind::ReportSchedule,
            QueueArg::RpaDetail => QueueKind::RpaDetail,
            QueueArg::SdReport => QueueKind::SdReport,
        }
    }
}
