//! Report process schedule queue (report delivery schedules)

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::SqlitePool;

use crate::queue::GridRow;

use super::{fmt_date, fmt_datetime, fmt_time, QueueStore};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportScheduleRow {
    pub queue_uid: i64,
    pub company_name: String,
    pub report_type_name: Option<String>,
    pub schedule_date: Option<NaiveDate>,
    pub schedule_time: Option<NaiveTime>,
    pub raw_file_path: Option<String>,
    pub processed_file_path: Option<String>,
    pub sla_compliance_flag: Option<String>,
    pub status: String,
    pub created_date: Option<NaiveDateTime>,
    pub created_by: Option<String>,
    pub modified_date: Option<NaiveDateTime>,
    pub modified_by: Option<String>,
}

impl GridRow for ReportScheduleRow {
    fn id(&self) -> i64 {
        self.queue_uid
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn set_status(&mut self, status: String) {
        self.status = status;
    }

    fn company(&self) -> &str {
        &self.company_name
    }

    fn created_at(&self) -> Option<NaiveDateTime> {
        self.created_date
    }

    fn modified_at(&self) -> Option<NaiveDateTime> {
        self.modified_date
    }

    fn columns() -> &'static [&'static str] {
        &[
            "Queue ID",
            "Company Name",
            "Report Type",
            "Schedule Date",
            "Schedule Time",
            "Raw File",
            "Processed File",
            "SLA",
            "Status",
            "Created",
            "Modified",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.queue_uid.to_string(),
            self.company_name.clone(),
            self.report_type_name.clone().unwrap_or_default(),
            fmt_date(self.schedule_date),
            fmt_time(self.schedule_time),
            self.raw_file_path.clone().unwrap_or_default(),
            self.processed_file_path.clone().unwrap_or_default(),
            self.sla_compliance_flag.clone().unwrap_or_default(),
            self.status.clone(),
            fmt_datetime(self.created_date),
            fmt_datetime(self.modified_date),
        ]
    }
}

#[derive(Clone)]
pub struct ReportScheduleStore {
    pool: SqlitePool,
}

impl ReportScheduleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueStore for ReportScheduleStore {
    type Row = ReportScheduleRow;

    async fn fetch_all(&self) -> Result<Vec<ReportScheduleRow>> {
        sqlx::query_as(
            r#"
            SELECT reportschedulequeueuid AS queue_uid,
                   COALESCE(companyname, 'Company ' || companyuid) AS company_name,
                   reporttypename AS report_type_name,
                   scheduledate AS schedule_date,
                   scheduletime AS schedule_time,
                   rawfilepath AS raw_file_path,
                   processedfilepath AS processed_file_path,
                   slacomplianceflag AS sla_compliance_flag,
                   COALESCE(status, '') AS status,
                   createddate AS created_date,
                   createdby AS created_by,
                   modifieddate AS modified_date,
                   modifiedby AS modified_by
            FROM report_process_schedule_queue
            ORDER BY reportschedulequeueuid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch report process schedule queue")
    }

    async fn fetch_distinct_statuses(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT status FROM report_process_schedule_queue \
             WHERE status IS NOT NULL AND status != '' ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch report schedule statuses")?;

        Ok(rows.into_iter().map(|(status,)| status).collect())
    }

    async fn apply_status_updates(
        &self,
        edits: &BTreeMap<i64, String>,
        actor: &str,
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await.context("Failed to start transaction")?;
        let mut count = 0;
        for (id, status) in edits {
            let result = sqlx::query(
                "UPDATE report_process_schedule_queue \
                 SET status = ?, modifiedby = ?, modifieddate = CURRENT_TIMESTAMP \
                 WHERE reportschedulequeueuid = ?",
            )
            .bind(status)
            .bind(actor)
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to update status for report schedule row {id}"))?;
            count += result.rows_affected();
        }
        tx.commit().await.context("Failed to commit status updates")?;

        Ok(count)
    }
}
