//! Queue store boundary
//!
//! The controller only ever sees these three operations; SQL, transport and
//! schema stay behind them. One implementation per backing queue table.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::queue::GridRow;

pub mod db;
pub mod r26;
pub mod report_schedule;
pub mod rpa_detail;
pub mod sd_report;

pub use r26::{R26Row, R26Store};
pub use report_schedule::{ReportScheduleRow, ReportScheduleStore};
pub use rpa_detail::{RpaDetailRow, RpaDetailStore};
pub use sd_report::{SdReportRow, SdReportStore};

#[async_trait]
pub trait QueueStore: Send + Sync + 'static {
    type Row: GridRow;

    /// Full scan of the queue. No paging: the controller holds the whole
    /// snapshot in memory.
    async fn fetch_all(&self) -> Result<Vec<Self::Row>>;

    /// Distinct non-empty status values currently present in the backing
    /// table. May legitimately be empty.
    async fn fetch_distinct_statuses(&self) -> Result<Vec<String>>;

    /// Apply all edits inside one all-or-nothing transaction and return the
    /// number of rows affected. `actor` is an opaque audit identifier.
    async fn apply_status_updates(
        &self,
        edits: &BTreeMap<i64, String>,
        actor: &str,
    ) -> Result<u64>;
}

pub(crate) fn fmt_datetime(value: Option<NaiveDateTime>) -> String {
    value
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

pub(crate) fn fmt_date(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub(crate) fn fmt_time(value: Option<NaiveTime>) -> String {
    value
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

pub(crate) fn fmt_int(value: Option<i64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}
