#![forbid(unsafe_code)]

//! Pre-scheduling graph transformations for an instruction scheduler's data
//! dependence graph (DDG).
//!
//! This crate implements the two graph-mutating passes that run before list
//! or branch-and-bound scheduling: [`tred`], which prunes edges implied by a
//! longer path, and [`nsup`], which strengthens the graph by committing
//! provable node-superiority orderings as zero-latency edges. Both operate on
//! the [`Ddg`] type in [`ddg`], which a caller builds once via
//! [`DdgBuilder`](ddg::DdgBuilder) and then hands to [`run_passes`].

pub mod ddg;
pub mod error;
pub mod grid;
pub mod nsup;
pub mod passes;
pub mod tred;

pub use ddg::{Ddg, DdgBuilder, EdgeKind, EdgeView, InstType, NodeId};
pub use error::TransformError;
pub use nsup::NsupStats;
pub use passes::{run_passes, PassConfig, PassReport};
pub use tred::TredStats;
