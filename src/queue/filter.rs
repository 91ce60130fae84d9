//! Client-side filter predicates and view ordering
//!
//! Filtering is a pure function over the current snapshot: it never touches
//! pending edits or the selection, and the same snapshot plus the same
//! filter always yields the same ordered view.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::row::GridRow;

/// Active filter predicates, conjoined with AND semantics.
///
/// Empty/`None` predicates match everything. Date filters match a single
/// calendar day, mirroring the original day-bucket filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub company: Option<String>,
    pub status: Option<String>,
    pub created_on: Option<NaiveDate>,
    pub modified_on: Option<NaiveDate>,
    pub search: String,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.company.is_none()
            && self.status.is_none()
            && self.created_on.is_none()
            && self.modified_on.is_none()
            && self.search.trim().is_empty()
    }

    pub fn matches<R: GridRow>(&self, row: &R) -> bool {
        if let Some(company) = &self.company {
            if !row.company().eq_ignore_ascii_case(company) {
                return false;
            }
        }

        if let Some(status) = &self.status {
            if !row.status().eq_ignore_ascii_case(status) {
                return false;
            }
        }

        if let Some(day) = self.created_on {
            match row.created_at() {
                Some(ts) if ts.date() == day => {}
                _ => return false,
            }
        }

        if let Some(day) = self.modified_on {
            match row.modified_at() {
                Some(ts) if ts.date() == day => {}
                _ => return false,
            }
        }

        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty() {
            let hit = row
                .search_text()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        true
    }
}

/// How the filtered view is ordered.
///
/// `PendingFirst` floats rows with staged edits to the top (descending id
/// within each group), which only one of the original grids did; it is an
/// explicit per-queue setting rather than universal behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortPolicy {
    #[default]
    SnapshotOrder,
    PendingFirst,
}

/// Apply `filter` to `rows` and order the result per `policy`.
pub fn filtered_view<'a, R: GridRow>(
    rows: &'a [R],
    filter: &FilterState,
    pending: &BTreeMap<i64, String>,
    policy: SortPolicy,
) -> Vec<&'a R> {
    let mut view: Vec<&R> = rows.iter().filter(|row| filter.matches(*row)).collect();

    if policy == SortPolicy::PendingFirst {
        view.sort_by_key(|row| (!pending.contains_key(&row.id()), Reverse(row.id())));
    }

    view
}
