//! Transitive reduction: removing edges implied by a longer path between the
//! same two nodes.
//!
//! For every node `u`, and for every direct successor `v` of `u`, this walks
//! the subgraph reachable from `v` and marks any node `w != v` that `u` also
//! has a direct edge to. Marks for a given `u` are collected across all of
//! `u`'s successors and only applied once that node's DFS passes are done, so
//! the reduction decision for one successor never starves the walk over
//! another.

use fixedbitset::FixedBitSet;

use crate::ddg::{Ddg, NodeId};

/// Outcome of a [`transitive_reduction`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TredStats {
    /// Number of edges removed because a longer path made them redundant.
    pub edges_removed: usize,
}

/// Removes every edge `(u, w)` for which a longer `u -> ... -> w` path also
/// exists.
///
/// Runs in node-id order over the fixed node set; the `Ddg` is expected to
/// already be acyclic (guaranteed by [`crate::ddg::DdgBuilder::build`]).
pub fn transitive_reduction(ddg: &mut Ddg) -> TredStats {
    tracing::info!(nodes = ddg.node_count(), "running transitive reduction");

    let node_count = ddg.node_count();
    let mut visited = FixedBitSet::with_capacity(node_count);
    let mut stack: Vec<NodeId> = Vec::new();
    let mut edges_removed = 0usize;

    for u_index in 0..node_count {
        let u = NodeId::new(u_index);
        let direct_successors: Vec<NodeId> = ddg.successors(u).map(|e| e.to).collect();
        let mut to_remove: Vec<NodeId> = Vec::new();

        for &v in &direct_successors {
            visited.clear();
            stack.clear();
            stack.push(v);
            visited.insert(v.index());

            while let Some(current) = stack.pop() {
                let next: Vec<NodeId> = ddg.successors(current).map(|e| e.to).collect();
                for w in next {
                    if visited.contains(w.index()) {
                        continue;
                    }
                    visited.insert(w.index());
                    stack.push(w);
                    if w != v && ddg.find_successor_edge(u, w).is_some() {
                        to_remove.push(w);
                    }
                }
            }
        }

        for w in to_remove {
            if ddg.remove_edge(u, w) {
                edges_removed += 1;
            }
        }
    }

    tracing::debug!(edges_removed, "transitive reduction complete");
    TredStats { edges_removed }
}
