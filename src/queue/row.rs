//! Row contract shared by the four queue grids

use chrono::NaiveDateTime;

/// One record in a queue snapshot.
///
/// The controller only cares about identity, the mutable status field and a
/// handful of display/search projections; everything else stays on the
/// concrete row types in the store layer.
pub trait GridRow: Clone + Send + Sync + 'static {
    /// Stable primary key, unique within one snapshot.
    fn id(&self) -> i64;

    fn status(&self) -> &str;

    fn set_status(&mut self, status: String);

    /// Company the record belongs to, used by the company filter.
    fn company(&self) -> &str;

    fn created_at(&self) -> Option<NaiveDateTime>;

    fn modified_at(&self) -> Option<NaiveDateTime>;

    /// Column headers for the grid, in display order.
    fn columns() -> &'static [&'static str];

    /// Cell text matching `columns()`.
    fn cells(&self) -> Vec<String>;

    /// Text the search box matches against (case-insensitive substring).
    ///
    /// Defaults to the displayed cells, which is what the original grids
    /// searched over.
    fn search_text(&self) -> Vec<String> {
        self.cells()
    }
}
