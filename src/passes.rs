//! Selects and runs the transformations in this crate over a single [`Ddg`].

use crate::ddg::Ddg;
use crate::error::TransformError;
use crate::nsup::{self, NsupStats};
use crate::tred::{self, TredStats};

/// Which passes to run, and in what order: transitive reduction first (if
/// enabled), then node-superiority.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassConfig {
    /// Run transitive reduction.
    pub tred: bool,
    /// Run the node-superiority transformation.
    pub nsup: bool,
}

/// Per-pass statistics for whichever passes actually ran.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassReport {
    /// Present when [`PassConfig::tred`] was set.
    pub tred: Option<TredStats>,
    /// Present when [`PassConfig::nsup`] was set.
    pub nsup: Option<NsupStats>,
}

/// Runs the configured passes over `ddg` in order.
pub fn run_passes(ddg: &mut Ddg, config: &PassConfig) -> Result<PassReport, TransformError> {
    let mut report = PassReport::default();

    if config.tred {
        report.tred = Some(tred::transitive_reduction(ddg));
    }
    if config.nsup {
        report.nsup = Some(nsup::node_superiority_transform(ddg)?);
    }

    Ok(report)
}
