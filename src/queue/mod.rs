//! The editable queue grid core: snapshot, staged edits, filtering and
//! commit orchestration shared by all four queue screens.

pub mod controller;
pub mod error;
pub mod filter;
pub mod row;

pub use controller::{
    CommitKind, CommitOutcome, DefaultFilterPolicy, LoadMode, LoadSummary, Phase,
    QueueGridController, DEFAULT_STATUS,
};
pub use error::QueueError;
pub use filter::{filtered_view, FilterState, SortPolicy};
pub use row::GridRow;
