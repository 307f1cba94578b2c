//! Error types returned by this crate's graph transformations.

use thiserror::Error;

/// Failure modes for [`crate::tred::transitive_reduction`] and
/// [`crate::nsup::node_superiority_transform`].
///
/// Both kinds are fatal: a transformation that returns an error has either
/// left the [`Ddg`](crate::Ddg) untouched, or partially transformed but still
/// acyclic with invariants I1-I5 holding, per the propagation policy this
/// crate follows. Benign, expected conditions (a stale worklist entry, the
/// resource-edge stub doing nothing, redundant-edge removal finding nothing
/// to remove) are not represented here; they are logged at debug level and
/// folded into the pass's statistics instead.
#[derive(Debug, Error)]
pub enum TransformError {
    /// An invariant the [`Ddg`](crate::Ddg) is supposed to uphold did not
    /// hold when a transformation inspected it (for example, the edge set
    /// was not actually acyclic).
    #[error("contract violation: {detail}")]
    ContractViolation {
        /// Human-readable description of what was expected.
        detail: String,
    },

    /// The dense `N x N` distance or superiority matrix NSUP needs could not
    /// be sized; `rows`/`cols` are the dimensions that were requested.
    #[error("cannot allocate a {rows}x{cols} matrix for this transformation")]
    AllocationFailure {
        /// Requested row count (equal to the node count).
        rows: usize,
        /// Requested column count (equal to the node count).
        cols: usize,
    },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = core::result::Result<T, TransformError>;
