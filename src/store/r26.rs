//! R26 daily queue (patient record processing)

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::debug;
use sqlx::SqlitePool;

use crate::queue::GridRow;

use super::{fmt_datetime, fmt_int, QueueStore};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct R26Row {
    pub queue_uid: i64,
    pub company_uid: i64,
    pub company_name: String,
    pub pat_number: Option<i64>,
    pub pat_first_name: Option<String>,
    pub pat_last_name: Option<String>,
    pub appt_type: Option<String>,
    pub reason: Option<String>,
    pub provider_name: Option<String>,
    pub bot_name: Option<String>,
    pub status: String,
    pub created_date: Option<NaiveDateTime>,
    pub modified_date: Option<NaiveDateTime>,
}

impl R26Row {
    fn patient(&self) -> String {
        let first = self.pat_first_name.as_deref().unwrap_or("");
        let last = self.pat_last_name.as_deref().unwrap_or("");
        format!("{first} {last}").trim().to_string()
    }
}

impl GridRow for R26Row {
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
            "Pat Number",
            "Patient",
            "Appt Type",
            "Reason",
            "Provider",
            "Bot Name",
            "Status",
            "Created",
            "Modified",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.queue_uid.to_string(),
            self.company_name.clone(),
            fmt_int(self.pat_number),
            self.patient(),
            self.appt_type.clone().unwrap_or_default(),
            self.reason.clone().unwrap_or_default(),
            self.provider_name.clone().unwrap_or_default(),
            self.bot_name.clone().unwrap_or_default(),
            self.status.clone(),
            fmt_datetime(self.created_date),
            fmt_datetime(self.modified_date),
        ]
    }

    // The R26 grid searched only these columns.
    fn search_text(&self) -> Vec<String> {
        vec![
            self.queue_uid.to_string(),
            self.company_name.clone(),
            fmt_int(self.pat_number),
            self.status.clone(),
        ]
    }
}

#[derive(Clone)]
pub struct R26Store {
    pool: SqlitePool,
}

impl R26Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueStore for R26Store {
    type Row = R26Row;

    async fn fetch_all(&self) -> Result<Vec<R26Row>> {
        sqlx::query_as(
            r#"
            SELECT r26queueuid AS queue_uid,
                   companyuid AS company_uid,
                   COALESCE(companyname, 'Company ' || companyuid) AS company_name,
                   patnumber AS pat_number,
                   patfname AS pat_first_name,
                   patlname AS pat_last_name,
                   appttype AS appt_type,
                   reason,
                   providername AS provider_name,
                   botname AS bot_name,
                   COALESCE(status, '') AS status,
                   createdate AS created_date,
                   modifieddate AS modified_date
            FROM r26_daily_queue
            ORDER BY r26queueuid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch R26 daily queue")
    }

    async fn fetch_distinct_statuses(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT status FROM r26_daily_queue \
             WHERE status IS NOT NULL AND status != '' ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch R26 statuses")?;

        Ok(rows.into_iter().map(|(status,)| status).collect())
    }

    async fn apply_status_updates(
        &self,
        edits: &BTreeMap<i64, String>,
        actor: &str,
    ) -> Result<u64> {
        // The R26 update path carries no audit column; the actor is logged
        // but not written.
        debug!("applying {} R26 status updates as {actor}", edits.len());

        let mut tx = self.pool.begin().await.context("Failed to start transaction")?;
        let mut count = 0;
        for (id, status) in edits {
            let result = sqlx::query(
                "UPDATE r26_daily_queue \
                 SET status = ?, modifieddate = CURRENT_TIMESTAMP \
                 WHERE r26queueuid = ?",
            )
            .bind(status)
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to update status for R26 row {id}"))?;
            count += result.rows_affected();
        }
        tx.commit().await.context("Failed to commit status updates")?;

        Ok(count)
    }
}
