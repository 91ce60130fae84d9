//! Controller-boundary error taxonomy
//!
//! Store failures never cross into the presentation layer raw; they are
//! wrapped here so the UI can always leave controls in a consistent,
//! re-enabled state.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    /// Malformed or missing store connection configuration. Fatal to
    /// construction; a controller backed by this store never reaches Ready.
    #[error("invalid store configuration: {0}")]
    ConnectionConfig(String),

    /// A fetch failed at some stage of a load. The previous snapshot, staged
    /// edits and selection are all preserved.
    #[error("failed to load queue data")]
    LoadFailed(#[source] anyhow::Error),

    /// The transactional status update failed. Staged edits and the
    /// selection are preserved exactly as before the attempt.
    #[error("failed to commit status updates")]
    CommitFailed(#[source] anyhow::Error),

    /// Status values are selection-only; anything outside the catalog is
    /// rejected before it can reach the store.
    #[error("'{0}' is not a valid status for this queue")]
    UnknownStatus(String),

    #[error("row {0} is not in the current snapshot")]
    UnknownRow(i64),

    /// A load or commit is already in flight; operations are mutually
    /// exclusive per controller instance.
    #[error("another load or commit is already in progress")]
    Busy,
}
