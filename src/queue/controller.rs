//! Editable queue grid controller
//!
//! Owns one authoritative snapshot of queue rows, the staged per-row status
//! edits, the checked selection and the active filter, and orchestrates
//! load/apply/commit cycles against a [`QueueStore`]. All four queue grids
//! are instances of this one component.
//!
//! The controller is a synchronous state machine
//! (`Uninitialized -> Loading -> Ready <-> Committing`); the async wrappers
//! at the bottom tie the begin/finish phases to an actual store. Only one
//! load or commit may be in flight per instance, which is what protects the
//! snapshot from being mutated while it is half replaced.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, info, warn};

use crate::store::QueueStore;

use super::error::QueueError;
use super::filter::{filtered_view, FilterState, SortPolicy};
use super::row::GridRow;

pub const DEFAULT_STATUS: &str = "Pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Initial,
    Refresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Loading,
    Ready,
    Committing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    Individual,
    Bulk,
}

/// Outcome of a commit attempt. Empty staging areas are informational
/// no-ops, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied { kind: CommitKind, count: u64 },
    NothingStaged,
    NothingSelected,
}

/// What a finished load reconciled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub total: usize,
    /// The store reported no status values at all. Surfaced as a warning,
    /// never silently defaulted; it is a genuine data-quality signal.
    pub catalog_empty: bool,
    /// Selection ids that vanished upstream and were dropped.
    pub dropped_selections: usize,
    /// Staged edits dropped because the row vanished or the server caught up
    /// with the staged value.
    pub dropped_edits: usize,
}

/// Initial-load filter convention. Some deployments designate a company
/// that every session starts filtered to; that used to be a hardcoded
/// business literal and is now supplied at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DefaultFilterPolicy {
    #[default]
    None,
    Company(String),
}

impl DefaultFilterPolicy {
    fn initial_filter(&self) -> FilterState {
        match self {
            DefaultFilterPolicy::None => FilterState::default(),
            DefaultFilterPolicy::Company(name) => FilterState {
                company: Some(name.clone()),
                ..Default::default()
            },
        }
    }
}

pub struct QueueGridController<R: GridRow> {
    rows: Vec<R>,
    /// Status of each row as fetched with the current snapshot, before any
    /// local edit. A pending entry exists iff the row's status differs from
    /// this value.
    original_status: HashMap<i64, String>,
    pending: BTreeMap<i64, String>,
    selection: BTreeSet<i64>,
    filter: FilterState,
    catalog: Vec<String>,
    sort_policy: SortPolicy,
    default_filter: DefaultFilterPolicy,
    actor: String,
    phase: Phase,
    /// Best-effort viewport position, restored (clamped) across reloads.
    anchor: usize,
    had_snapshot: bool,
}

impl<R: GridRow> QueueGridController<R> {
    pub fn new(
        actor: impl Into<String>,
        default_filter: DefaultFilterPolicy,
        sort_policy: SortPolicy,
    ) -> Self {
        Self {
            rows: Vec::new(),
            original_status: HashMap::new(),
            pending: BTreeMap::new(),
            selection: BTreeSet::new(),
            filter: FilterState::default(),
            catalog: Vec::new(),
            sort_policy,
            default_filter,
            actor: actor.into(),
            phase: Phase::Uninitialized,
            anchor: 0,
            had_snapshot: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn status_catalog(&self) -> &[String] {
        &self.catalog
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn total(&self) -> usize {
        self.rows.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn has_pending(&self, id: i64) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.selection.contains(&id)
    }

    pub fn pending_edits(&self) -> &BTreeMap<i64, String> {
        &self.pending
    }

    pub fn original_status(&self, id: i64) -> Option<&str> {
        self.original_status.get(&id).map(String::as_str)
    }

    pub fn anchor(&self) -> usize {
        self.anchor
    }

    pub fn set_anchor(&mut self, anchor: usize) {
        self.anchor = anchor;
    }

    /// Distinct company names present in the snapshot, for the company
    /// filter choices.
    pub fn companies(&self) -> Vec<String> {
        let mut companies: Vec<String> = self
            .rows
            .iter()
            .map(|row| row.company().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        companies.sort();
        companies.dedup();
        companies
    }

    /// The filtered, ordered view of the current snapshot.
    pub fn visible(&self) -> Vec<&R> {
        filtered_view(&self.rows, &self.filter, &self.pending, self.sort_policy)
    }

    /// The "selected records" side projection. Independent of the active
    /// filter: selection crosses filter boundaries.
    pub fn selected_rows(&self) -> Vec<&R> {
        self.rows
            .iter()
            .filter(|row| self.selection.contains(&row.id()))
            .collect()
    }

    fn ensure_ready(&self) -> Result<(), QueueError> {
        match self.phase {
            Phase::Ready => Ok(()),
            _ => Err(QueueError::Busy),
        }
    }

    /// Enter the loading state. Rejected (never queued) while another load
    /// or commit is in flight.
    pub fn begin_load(&mut self, _mode: LoadMode) -> Result<(), QueueError> {
        match self.phase {
            Phase::Uninitialized | Phase::Ready => {
                self.phase = Phase::Loading;
                Ok(())
            }
            Phase::Loading | Phase::Committing => Err(QueueError::Busy),
        }
    }

    /// Install a freshly fetched snapshot and reconcile staged state onto it.
    pub fn finish_load(
        &mut self,
        mode: LoadMode,
        mut rows: Vec<R>,
        statuses: Vec<String>,
    ) -> LoadSummary {
        // Rows with a null/empty status read as "Pending".
        for row in &mut rows {
            if row.status().trim().is_empty() {
                row.set_status(DEFAULT_STATUS.to_string());
            }
        }

        let mut catalog: Vec<String> = statuses
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect();
        catalog.sort();
        catalog.dedup();

        let mut summary = LoadSummary {
            total: rows.len(),
            catalog_empty: catalog.is_empty(),
            ..Default::default()
        };

        self.original_status = rows
            .iter()
            .map(|row| (row.id(), row.status().to_string()))
            .collect();

        match mode {
            LoadMode::Initial => {
                // A session starts clean.
                self.pending.clear();
                self.selection.clear();
                self.filter = self.default_filter.initial_filter();
                self.anchor = 0;
            }
            LoadMode::Refresh => {
                // Local edits win over server state until committed or
                // reverted. Entries whose row vanished, or whose staged
                // value the server caught up with, are dropped so the
                // pending-iff-differs invariant keeps holding.
                let before = self.pending.len();
                let original = &self.original_status;
                self.pending
                    .retain(|id, staged| original.get(id).is_some_and(|orig| orig != staged));
                summary.dropped_edits = before - self.pending.len();

                for row in &mut rows {
                    if let Some(staged) = self.pending.get(&row.id()) {
                        row.set_status(staged.clone());
                    }
                }

                let before = self.selection.len();
                let present: BTreeSet<i64> = rows.iter().map(|r| r.id()).collect();
                self.selection.retain(|id| present.contains(id));
                summary.dropped_selections = before - self.selection.len();
            }
        }

        self.rows = rows;
        self.catalog = catalog;
        self.phase = Phase::Ready;
        self.had_snapshot = true;

        // Clamp the viewport anchor to the new view; never fail a reload
        // over a stale position.
        let visible = self.visible().len();
        if self.anchor >= visible {
            self.anchor = visible.saturating_sub(1);
        }

        if summary.catalog_empty {
            warn!("status catalog is empty; no valid target statuses until data exists");
        }
        info!(
            "loaded snapshot: {} rows, {} pending, {} selected",
            summary.total,
            self.pending.len(),
            self.selection.len()
        );

        summary
    }

    /// Abort an in-flight load. The previous snapshot (if any) stays
    /// visible and staged state is untouched.
    pub fn fail_load(&mut self) {
        self.phase = if self.had_snapshot {
            Phase::Ready
        } else {
            Phase::Uninitialized
        };
    }

    /// Stage (or revert) an individual status edit. `new_status` must come
    /// from the catalog; free-text statuses never reach the store.
    pub fn edit_status(&mut self, id: i64, new_status: &str) -> Result<(), QueueError> {
        self.ensure_ready()?;

        if !self.catalog.iter().any(|s| s == new_status) {
            return Err(QueueError::UnknownStatus(new_status.to_string()));
        }

        let row = self
            .rows
            .iter_mut()
            .find(|row| row.id() == id)
            .ok_or(QueueError::UnknownRow(id))?;
        row.set_status(new_status.to_string());

        let original = self.original_status.get(&id).map(String::as_str);
        if original == Some(new_status) {
            self.pending.remove(&id);
        } else {
            self.pending.insert(id, new_status.to_string());
        }

        debug!("staged edits: {}", self.pending.len());
        Ok(())
    }

    pub fn toggle_select(&mut self, id: i64, selected: bool) -> Result<(), QueueError> {
        self.ensure_ready()?;

        if !self.rows.iter().any(|row| row.id() == id) {
            return Err(QueueError::UnknownRow(id));
        }

        if selected {
            self.selection.insert(id);
        } else {
            self.selection.remove(&id);
        }
        Ok(())
    }

    pub fn set_filter(&mut self, filter: FilterState) -> Result<(), QueueError> {
        self.ensure_ready()?;
        self.filter = filter;

        let visible = self.visible().len();
        if self.anchor >= visible {
            self.anchor = visible.saturating_sub(1);
        }
        Ok(())
    }

    /// Enter the committing state for the staged individual edits. Returns
    /// the batch to send, or `None` when there is nothing to save.
    pub fn begin_commit_individual(&mut self) -> Result<Option<BTreeMap<i64, String>>, QueueError> {
        self.ensure_ready()?;
        if self.pending.is_empty() {
            return Ok(None);
        }
        self.phase = Phase::Committing;
        Ok(Some(self.pending.clone()))
    }

    /// Enter the committing state for a bulk update: one target status
    /// applied to every selected row. Returns `None` when nothing is
    /// selected.
    pub fn begin_commit_bulk(
        &mut self,
        target_status: &str,
    ) -> Result<Option<BTreeMap<i64, String>>, QueueError> {
        self.ensure_ready()?;

        if !self.catalog.iter().any(|s| s == target_status) {
            return Err(QueueError::UnknownStatus(target_status.to_string()));
        }
        if self.selection.is_empty() {
            return Ok(None);
        }

        self.phase = Phase::Committing;
        Ok(Some(
            self.selection
                .iter()
                .map(|id| (*id, target_status.to_string()))
                .collect(),
        ))
    }

    /// Record a successful commit of `batch`. Individual and bulk staging
    /// areas are orthogonal: an individual commit clears pending edits, a
    /// bulk commit clears the selection. Where a bulk write covered a row
    /// that also had a staged individual edit, the bulk value wins (it was
    /// applied last), so that row's pending entry is dropped too.
    pub fn finish_commit(&mut self, kind: CommitKind, batch: &BTreeMap<i64, String>) {
        match kind {
            CommitKind::Individual => {
                self.pending.clear();
            }
            CommitKind::Bulk => {
                self.selection.clear();
                self.pending.retain(|id, _| !batch.contains_key(id));
            }
        }
        self.phase = Phase::Ready;
    }

    /// Abort an in-flight commit, preserving staged state exactly as it was
    /// before the attempt so the user can retry without re-entering data.
    pub fn fail_commit(&mut self) {
        self.phase = Phase::Ready;
    }
}

// Async wrappers tying the state machine to a store. The TUI drives the
// begin/finish phases itself (futures cannot borrow screen state), but
// headless callers and tests use these directly.
impl<R: GridRow> QueueGridController<R> {
    pub async fn load<S>(&mut self, store: &S, mode: LoadMode) -> Result<LoadSummary, QueueError>
    where
        S: QueueStore<Row = R>,
    {
        self.begin_load(mode)?;

        let rows = match store.fetch_all().await {
            Ok(rows) => rows,
            Err(err) => {
                self.fail_load();
                return Err(QueueError::LoadFailed(err));
            }
        };
        let statuses = match store.fetch_distinct_statuses().await {
            Ok(statuses) => statuses,
            Err(err) => {
                self.fail_load();
                return Err(QueueError::LoadFailed(err));
            }
        };

        Ok(self.finish_load(mode, rows, statuses))
    }

    pub async fn commit_individual<S>(&mut self, store: &S) -> Result<CommitOutcome, QueueError>
    where
        S: QueueStore<Row = R>,
    {
        let Some(batch) = self.begin_commit_individual()? else {
            return Ok(CommitOutcome::NothingStaged);
        };
        self.run_commit(store, CommitKind::Individual, batch).await
    }

    pub async fn commit_bulk<S>(
        &mut self,
        store: &S,
        target_status: &str,
    ) -> Result<CommitOutcome, QueueError>
    where
        S: QueueStore<Row = R>,
    {
        let Some(batch) = self.begin_commit_bulk(target_status)? else {
            return Ok(CommitOutcome::NothingSelected);
        };
        self.run_commit(store, CommitKind::Bulk, batch).await
    }

    async fn run_commit<S>(
        &mut self,
        store: &S,
        kind: CommitKind,
        batch: BTreeMap<i64, String>,
    ) -> Result<CommitOutcome, QueueError>
    where
        S: QueueStore<Row = R>,
    {
        match store.apply_status_updates(&batch, &self.actor).await {
            Ok(count) => {
                self.finish_commit(kind, &batch);
                // The post-commit refresh is best-effort: the commit already
                // succeeded, so a fetch error here must not be reported as a
                // commit failure.
                if let Err(err) = self.load(store, LoadMode::Refresh).await {
                    warn!("post-commit refresh failed: {err}");
                }
                Ok(CommitOutcome::Applied { kind, count })
            }
            Err(err) => {
                self.fail_commit();
                Err(QueueError::CommitFailed(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq)]
    struct TestRow {
        id: i64,
        status: String,
        company: String,
    }

    impl TestRow {
        fn new(id: i64, status: &str, company: &str) -> Self {
            Self {
                id,
                status: status.to_string(),
                company: company.to_string(),
            }
        }
    }

    impl GridRow for TestRow {
        fn id(&self) -> i64 {
            self.id
        }
        fn status(&self) -> &str {
            &self.status
        }
        fn set_status(&mut self, status: String) {
            self.status = status;
        }
        fn company(&self) -> &str {
            &self.company
        }
        fn created_at(&self) -> Option<NaiveDateTime> {
            None
        }
        fn modified_at(&self) -> Option<NaiveDateTime> {
            None
        }
        fn columns() -> &'static [&'static str] {
            &["Queue ID", "Company", "Status"]
        }
        fn cells(&self) -> Vec<String> {
            vec![self.id.to_string(), self.company.clone(), self.status.clone()]
        }
    }

    /// In-memory store with a failure switch for the all-or-nothing tests.
    struct MockStore {
        rows: Mutex<Vec<TestRow>>,
        fail_updates: Mutex<bool>,
        fail_fetch: Mutex<bool>,
    }

    impl MockStore {
        fn with_rows(rows: Vec<TestRow>) -> Self {
            Self {
                rows: Mutex::new(rows),
                fail_updates: Mutex::new(false),
                fail_fetch: Mutex::new(false),
            }
        }

        fn set_rows(&self, rows: Vec<TestRow>) {
            *self.rows.lock().unwrap() = rows;
        }

        fn set_fail_updates(&self, fail: bool) {
            *self.fail_updates.lock().unwrap() = fail;
        }

        fn set_fail_fetch(&self, fail: bool) {
            *self.fail_fetch.lock().unwrap() = fail;
        }

        fn status_of(&self, id: i64) -> Option<String> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == id)
                .map(|r| r.status.clone())
        }
    }

    #[async_trait]
    impl QueueStore for MockStore {
        type Row = TestRow;

        async fn fetch_all(&self) -> Result<Vec<TestRow>> {
            if *self.fail_fetch.lock().unwrap() {
                return Err(anyhow!("connection reset"));
            }
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn fetch_distinct_statuses(&self) -> Result<Vec<String>> {
            if *self.fail_fetch.lock().unwrap() {
                return Err(anyhow!("connection reset"));
            }
            let mut statuses: Vec<String> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.status.clone())
                .filter(|s| !s.trim().is_empty())
                .collect();
            statuses.sort();
            statuses.dedup();
            // Make sure edits always have somewhere to go in tests.
            for extra in ["Completed", "Failed", "Done"] {
                if !statuses.iter().any(|s| s == extra) {
                    statuses.push(extra.to_string());
                }
            }
            Ok(statuses)
        }

        async fn apply_status_updates(
            &self,
            edits: &BTreeMap<i64, String>,
            _actor: &str,
        ) -> Result<u64> {
            if *self.fail_updates.lock().unwrap() {
                return Err(anyhow!("deadlock victim"));
            }
            let mut rows = self.rows.lock().unwrap();
            let mut count = 0;
            for (id, status) in edits {
                if let Some(row) = rows.iter_mut().find(|r| r.id == *id) {
                    row.status = status.clone();
                    count += 1;
                }
            }
            Ok(count)
        }
    }

    fn controller() -> QueueGridController<TestRow> {
        QueueGridController::new("TESTHOST", DefaultFilterPolicy::None, SortPolicy::SnapshotOrder)
    }

    fn store() -> MockStore {
        MockStore::with_rows(vec![
            TestRow::new(1, "Pending", "Acme"),
            TestRow::new(2, "Pending", "Acme"),
            TestRow::new(5, "Pending", "Globex"),
            TestRow::new(9, "Failed", "Globex"),
        ])
    }

    #[tokio::test]
    async fn test_initial_load_normalizes_empty_status() {
        let store = MockStore::with_rows(vec![
            TestRow::new(1, "", "Acme"),
            TestRow::new(2, "Processed", "Acme"),
        ]);
        let mut ctl = controller();

        let summary = ctl.load(&store, LoadMode::Initial).await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(ctl.visible()[0].status(), "Pending");
        assert_eq!(ctl.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_initial_load_applies_default_filter_policy() {
        let store = store();
        let mut ctl = QueueGridController::new(
            "TESTHOST",
            DefaultFilterPolicy::Company("Globex".to_string()),
            SortPolicy::SnapshotOrder,
        );

        ctl.load(&store, LoadMode::Initial).await.unwrap();
        assert_eq!(ctl.filter().company.as_deref(), Some("Globex"));
        let ids: Vec<i64> = ctl.visible().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![5, 9]);
    }

    #[tokio::test]
    async fn test_edit_then_revert_is_net_noop() {
        let store = store();
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();

        ctl.edit_status(5, "Completed").unwrap();
        assert!(ctl.has_pending(5));

        ctl.edit_status(5, "Pending").unwrap();
        assert!(!ctl.has_pending(5));
        assert_eq!(ctl.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_edit_rejects_status_outside_catalog() {
        let store = store();
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();

        let err = ctl.edit_status(5, "Made Up").unwrap_err();
        assert!(matches!(err, QueueError::UnknownStatus(_)));
        assert_eq!(ctl.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_preserves_staged_edits() {
        let store = store();
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();

        ctl.edit_status(5, "Completed").unwrap();
        ctl.load(&store, LoadMode::Refresh).await.unwrap();

        let row5 = ctl.visible().into_iter().find(|r| r.id() == 5).unwrap();
        assert_eq!(row5.status(), "Completed");
        assert_eq!(ctl.pending_edits().get(&5).map(String::as_str), Some("Completed"));
    }

    #[tokio::test]
    async fn test_refresh_preserves_filter_state() {
        let store = store();
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();

        ctl.set_filter(FilterState {
            company: Some("Acme".to_string()),
            ..Default::default()
        })
        .unwrap();
        ctl.load(&store, LoadMode::Refresh).await.unwrap();

        assert_eq!(ctl.filter().company.as_deref(), Some("Acme"));
        assert_eq!(ctl.visible().len(), 2);
    }

    #[tokio::test]
    async fn test_commit_individual_clears_and_survives_reload() {
        let store = store();
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();

        ctl.edit_status(5, "Completed").unwrap();
        ctl.edit_status(9, "Done").unwrap();

        let outcome = ctl.commit_individual(&store).await.unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Applied {
                kind: CommitKind::Individual,
                count: 2
            }
        );
        assert_eq!(ctl.pending_count(), 0);

        ctl.load(&store, LoadMode::Refresh).await.unwrap();
        let rows = ctl.visible();
        let row5 = rows.iter().find(|r| r.id() == 5).unwrap();
        let row9 = rows.iter().find(|r| r.id() == 9).unwrap();
        assert_eq!(row5.status(), "Completed");
        assert_eq!(row9.status(), "Done");
        assert!(!ctl.has_pending(5));
        assert!(!ctl.has_pending(9));
    }

    #[tokio::test]
    async fn test_commit_individual_with_nothing_staged_is_noop() {
        let store = store();
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();

        let outcome = ctl.commit_individual(&store).await.unwrap();
        assert_eq!(outcome, CommitOutcome::NothingStaged);
        assert_eq!(ctl.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_selection_crosses_filter_boundaries() {
        let store = store();
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();

        ctl.toggle_select(5, true).unwrap();
        // Filter Globex (and row 5 with it) out of the visible view.
        ctl.set_filter(FilterState {
            company: Some("Acme".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert!(ctl.visible().iter().all(|r| r.id() != 5));
        let selected: Vec<i64> = ctl.selected_rows().iter().map(|r| r.id()).collect();
        assert_eq!(selected, vec![5]);

        let outcome = ctl.commit_bulk(&store, "Failed").await.unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Applied {
                kind: CommitKind::Bulk,
                count: 1
            }
        );
        assert_eq!(store.status_of(5).as_deref(), Some("Failed"));
    }

    #[tokio::test]
    async fn test_failed_commit_preserves_staged_edits() {
        let store = store();
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();

        ctl.edit_status(5, "Completed").unwrap();
        ctl.edit_status(9, "Done").unwrap();
        store.set_fail_updates(true);

        let err = ctl.commit_individual(&store).await.unwrap_err();
        assert!(matches!(err, QueueError::CommitFailed(_)));
        assert_eq!(ctl.pending_count(), 2);
        assert_eq!(ctl.phase(), Phase::Ready);
        // The store saw no partial application either.
        assert_eq!(store.status_of(5).as_deref(), Some("Pending"));
    }

    #[tokio::test]
    async fn test_stale_selection_dropped_on_refresh() {
        let store = MockStore::with_rows(vec![
            TestRow::new(3, "Pending", "Acme"),
            TestRow::new(8, "Pending", "Acme"),
        ]);
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();

        ctl.toggle_select(3, true).unwrap();
        ctl.toggle_select(8, true).unwrap();

        // Row 8 deleted upstream.
        store.set_rows(vec![TestRow::new(3, "Pending", "Acme")]);
        let summary = ctl.load(&store, LoadMode::Refresh).await.unwrap();

        assert_eq!(summary.dropped_selections, 1);
        assert!(ctl.is_selected(3));
        assert!(!ctl.is_selected(8));
    }

    #[tokio::test]
    async fn test_stale_pending_edit_dropped_on_refresh() {
        let store = store();
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();

        ctl.edit_status(9, "Done").unwrap();
        store.set_rows(vec![TestRow::new(1, "Pending", "Acme")]);

        let summary = ctl.load(&store, LoadMode::Refresh).await.unwrap();
        assert_eq!(summary.dropped_edits, 1);
        assert_eq!(ctl.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_bulk_commit_wins_on_overlapping_row() {
        let store = store();
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();

        // Row 2 has both a staged individual edit and a bulk selection.
        ctl.edit_status(1, "Done").unwrap();
        ctl.edit_status(2, "Done").unwrap();
        ctl.toggle_select(2, true).unwrap();

        ctl.commit_bulk(&store, "Failed").await.unwrap();

        // Bulk was applied last, so row 2's individual edit is gone; row 1's
        // is untouched and still wins over the server value after refresh.
        assert_eq!(store.status_of(2).as_deref(), Some("Failed"));
        assert!(!ctl.has_pending(2));
        assert_eq!(ctl.pending_edits().get(&1).map(String::as_str), Some("Done"));
        let row1 = ctl.visible().into_iter().find(|r| r.id() == 1).unwrap();
        assert_eq!(row1.status(), "Done");
        assert_eq!(ctl.selected_count(), 0);
    }

    #[tokio::test]
    async fn test_bulk_commit_with_empty_selection_is_noop() {
        let store = store();
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();

        let outcome = ctl.commit_bulk(&store, "Failed").await.unwrap();
        assert_eq!(outcome, CommitOutcome::NothingSelected);
        assert_eq!(ctl.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_snapshot() {
        let store = store();
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();
        ctl.edit_status(5, "Completed").unwrap();

        store.set_fail_fetch(true);
        let err = ctl.load(&store, LoadMode::Refresh).await.unwrap_err();
        assert!(matches!(err, QueueError::LoadFailed(_)));

        // Previous snapshot still visible, staged edit intact, controls
        // usable again.
        assert_eq!(ctl.phase(), Phase::Ready);
        assert_eq!(ctl.total(), 4);
        assert!(ctl.has_pending(5));
    }

    #[tokio::test]
    async fn test_operations_rejected_while_loading() {
        let store = store();
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();

        ctl.begin_load(LoadMode::Refresh).unwrap();
        assert!(matches!(ctl.begin_load(LoadMode::Refresh), Err(QueueError::Busy)));
        assert!(matches!(ctl.edit_status(5, "Completed"), Err(QueueError::Busy)));
        assert!(matches!(ctl.toggle_select(5, true), Err(QueueError::Busy)));
        assert!(matches!(ctl.begin_commit_individual(), Err(QueueError::Busy)));

        ctl.fail_load();
        assert_eq!(ctl.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_empty_catalog_is_warned_not_defaulted() {
        struct EmptyStatusStore(MockStore);

        #[async_trait]
        impl QueueStore for EmptyStatusStore {
            type Row = TestRow;
            async fn fetch_all(&self) -> Result<Vec<TestRow>> {
                self.0.fetch_all().await
            }
            async fn fetch_distinct_statuses(&self) -> Result<Vec<String>> {
                Ok(vec![])
            }
            async fn apply_status_updates(
                &self,
                edits: &BTreeMap<i64, String>,
                actor: &str,
            ) -> Result<u64> {
                self.0.apply_status_updates(edits, actor).await
            }
        }

        let store = EmptyStatusStore(store());
        let mut ctl = controller();
        let summary = ctl.load(&store, LoadMode::Initial).await.unwrap();

        assert!(summary.catalog_empty);
        assert!(ctl.status_catalog().is_empty());
        // With zero valid targets every edit is rejected, but the grid is
        // still browsable.
        assert!(matches!(
            ctl.edit_status(1, "Pending"),
            Err(QueueError::UnknownStatus(_))
        ));
    }

    #[tokio::test]
    async fn test_anchor_clamped_after_shrinking_reload() {
        let store = store();
        let mut ctl = controller();
        ctl.load(&store, LoadMode::Initial).await.unwrap();
        ctl.set_anchor(3);

        store.set_rows(vec![TestRow::new(1, "Pending", "Acme")]);
        ctl.load(&store, LoadMode::Refresh).await.unwrap();
        assert_eq!(ctl.anchor(), 0);
    }
}
