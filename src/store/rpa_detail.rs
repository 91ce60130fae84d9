//! RPA schedule queue detail (bot execution rows)

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::queue::GridRow;

use super::{fmt_datetime, QueueStore};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RpaDetailRow {
    pub detail_uid: i64,
    pub schedule_queue_uid: i64,
    pub company_name: String,
    pub raw_report_name: Option<String>,
    pub raw_file_path: Option<String>,
    pub bot_start_time: Option<NaiveDateTime>,
    pub bot_end_time: Option<NaiveDateTime>,
    pub duration: Option<String>,
    pub status: String,
    pub created_date: Option<NaiveDateTime>,
    pub created_by: Option<String>,
    pub modified_date: Option<NaiveDateTime>,
    pub modified_by: Option<String>,
}

impl GridRow for RpaDetailRow {
    fn id(&self) -> i64 {
        self.detail_uid
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
            "Detail ID",
            "Schedule ID",
            "Company Name",
            "Raw Report",
            "Raw File",
            "Bot Start",
            "Bot End",
            "Duration",
            "Status",
            "Created",
            "Modified",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.detail_uid.to_string(),
            self.schedule_queue_uid.to_string(),
            self.company_name.clone(),
            self.raw_report_name.clone().unwrap_or_default(),
            self.raw_file_path.clone().unwrap_or_default(),
            fmt_datetime(self.bot_start_time),
            fmt_datetime(self.bot_end_time),
            self.duration.clone().unwrap_or_default(),
            self.status.clone(),
            fmt_datetime(self.created_date),
            fmt_datetime(self.modified_date),
        ]
    }
}

#[derive(Clone)]
pub struct RpaDetailStore {
    pool: SqlitePool,
}

impl RpaDetailStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueStore for RpaDetailStore {
    type Row = RpaDetailRow;

    async fn fetch_all(&self) -> Result<Vec<RpaDetailRow>> {
        sqlx::query_as(
            r#"
            SELECT rpaschedulequeuedetailuid AS detail_uid,
                   rpaschedulequeueuid AS schedule_queue_uid,
                   COALESCE(companyname, 'Company ' || companyuid) AS company_name,
                   rawreportname AS raw_report_name,
                   rawfilepath AS raw_file_path,
                   botstarttime AS bot_start_time,
                   botendtime AS bot_end_time,
                   duration,
                   COALESCE(status, '') AS status,
                   createddate AS created_date,
                   createdby AS created_by,
                   modifieddate AS modified_date,
                   modifiedby AS modified_by
            FROM rpa_schedule_queue_detail
            ORDER BY rpaschedulequeuedetailuid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch RPA schedule queue detail")
    }

    async fn fetch_distinct_statuses(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT status FROM rpa_schedule_queue_detail \
             WHERE status IS NOT NULL AND status != '' ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch RPA detail statuses")?;

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
                "UPDATE rpa_schedule_queue_detail \
                 SET status = ?, modifiedby = ?, modifieddate = CURRENT_TIMESTAMP \
                 WHERE rpaschedulequeuedetailuid = ?",
            )
            .bind(status)
            .bind(actor)
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to update status for RPA detail row {id}"))?;
            count += result.rows_affected();
        }
        tx.commit().await.context("Failed to commit status updates")?;

        Ok(count)
    }
}
