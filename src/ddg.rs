//! The data dependence graph: the shared mutable structure both
//! transformations operate over.
//!
//! Nodes carry an [`InstType`] and two precomputed [`FixedBitSet`]s giving
//! O(1) recursive predecessor/successor membership tests. Edges are owned by
//! a `petgraph` [`StableDiGraph`], which gives stable node and edge indices
//! across removal, exactly the "O(1) mark-and-sweep deletion" a
//! transitive-reduction or redundant-edge pass needs, without the
//! custom-allocator intrusive-list headaches a hand-rolled arena would
//! otherwise have to solve itself.
//!
//! A [`Ddg`] is always built through [`DdgBuilder`]: the topological order and
//! the recursive reachability sets are precomputed once, in
//! [`DdgBuilder::build`], and are then incrementally maintained by NSUP as it
//! inserts edges (see [`crate::nsup`]).

use std::iter;

use fixedbitset::FixedBitSet;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::error::TransformError;

/// Stable identity of a node in `[0, N)`.
///
/// Node ids never change: transformations only ever add or remove edges, so
/// an id handed out by [`DdgBuilder::add_node`] remains valid and dense for
/// the lifetime of the resulting [`Ddg`].
pub type NodeId = petgraph::graph::NodeIndex<u32>;

/// The instruction/issue type of a node.
///
/// Two nodes are only ever candidates for a superiority edge when their
/// `InstType`s compare equal; this crate never interprets the value beyond
/// that equality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstType(pub u32);

/// The dependence kind an edge encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// A true (read-after-write) data dependence.
    Data,
    /// A write-after-read anti-dependence.
    Anti,
    /// A write-after-write output dependence.
    Output,
    /// Any other ordering constraint, including the zero-latency edges NSUP
    /// inserts.
    Other,
}

/// An immutable snapshot of one edge: its endpoints, latency, and kind.
///
/// This is a value type returned from queries, not a handle into the graph;
/// mutating the [`Ddg`] after obtaining one does not affect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeView {
    /// The edge's source node.
    pub from: NodeId,
    /// The edge's target node.
    pub to: NodeId,
    /// The latency in cycles; always non-negative.
    pub label: i32,
    /// The dependence kind.
    pub kind: EdgeKind,
}

#[derive(Debug, Clone)]
struct NodeData {
    inst_type: InstType,
    recursive_preds: FixedBitSet,
    recursive_succs: FixedBitSet,
}

#[derive(Debug, Clone, Copy)]
struct EdgeData {
    label: i32,
    kind: EdgeKind,
}

/// Builds a [`Ddg`] from a fixed node and edge set.
///
/// Nodes and edges are added in any order; [`build`](DdgBuilder::build)
/// computes the topological order and the recursive reachability sets once,
/// up front, as the distilled specification requires ("precomputed by the
/// DDG before any transformation runs").
#[derive(Debug, Clone, Default)]
pub struct DdgBuilder {
    graph: StableDiGraph<NodeData, EdgeData, u32>,
}

impl DdgBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node with the given instruction type and returns its id.
    pub fn add_node(&mut self, inst_type: InstType) -> NodeId {
        self.graph.add_node(NodeData {
            inst_type,
            recursive_preds: FixedBitSet::new(),
            recursive_succs: FixedBitSet::new(),
        })
    }

    /// Adds an edge `from -> to` with the given latency and kind.
    ///
    /// The caller is responsible for `(from, to)` uniqueness, matching the
    /// `ddg.create_edge` contract; this crate never relies on multi-edges
    /// being absent, but nothing checks for them either.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, label: i32, kind: EdgeKind) {
        self.graph.add_edge(from, to, EdgeData { label, kind });
    }

    /// Consumes the builder, computing the topological order and the
    /// recursive reachability sets and producing a ready-to-transform
    /// [`Ddg`].
    ///
    /// Returns [`TransformError::ContractViolation`] if the edge set is not
    /// acyclic; every transformation in this crate assumes a DAG.
    pub fn build(mut self) -> Result<Ddg, TransformError> {
        let node_count = self.graph.node_count();
        for node in self.graph.node_weights_mut() {
            node.recursive_preds = FixedBitSet::with_capacity(node_count);
            node.recursive_succs = FixedBitSet::with_capacity(node_count);
        }

        let topo_order = petgraph::algo::toposort(&self.graph, None).map_err(|cycle| {
            TransformError::ContractViolation {
                detail: format!(
                    "data dependence graph contains a cycle through node {}",
                    cycle.node_id().index()
                ),
            }
        })?;

        let max_latency = self.graph.edge_weights().map(|e| e.label).max().unwrap_or(0);

        let mut ddg = Ddg {
            graph: self.graph,
            topo_order,
            max_latency,
        };
        ddg.compute_recursive_reachability();
        Ok(ddg)
    }
}

/// The data dependence graph: nodes with latency-labeled edges, a
/// topological order, and precomputed recursive reachability.
#[derive(Debug, Clone)]
pub struct Ddg {
    graph: StableDiGraph<NodeData, EdgeData, u32>,
    topo_order: Vec<NodeId>,
    max_latency: i32,
}

impl Ddg {
    /// Starts building a new graph.
    pub fn builder() -> DdgBuilder {
        DdgBuilder::new()
    }

    /// Number of nodes, stable for the lifetime of this `Ddg`.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// The largest single-edge latency present when this graph was built;
    /// used as the saturation cap for the distance table.
    pub fn max_latency(&self) -> i32 {
        self.max_latency
    }

    /// The node at position `k` of the topological order fixed at build
    /// time.
    pub fn node_by_topological_order(&self, k: usize) -> NodeId {
        self.topo_order[k]
    }

    /// The full topological order fixed at build time.
    pub fn topological_order(&self) -> &[NodeId] {
        &self.topo_order
    }

    /// The instruction type of a node.
    pub fn inst_type(&self, node: NodeId) -> InstType {
        self.graph[node].inst_type
    }

    /// Iterates the outgoing edges of `node`.
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = EdgeView> + '_ {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| EdgeView {
                from: e.source(),
                to: e.target(),
                label: e.weight().label,
                kind: e.weight().kind,
            })
    }

    /// Iterates the incoming edges of `node`.
    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = EdgeView> + '_ {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| EdgeView {
                from: e.source(),
                to: e.target(),
                label: e.weight().label,
                kind: e.weight().kind,
            })
    }

    /// Looks up the edge `from -> to`, if one exists.
    pub fn find_successor_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeView> {
        let edge_index = self.graph.find_edge(from, to)?;
        let weight = &self.graph[edge_index];
        Some(EdgeView {
            from,
            to,
            label: weight.label,
            kind: weight.kind,
        })
    }

    /// Inserts the edge `from -> to` and returns a snapshot of it.
    ///
    /// Does not update reachability or any distance/superiority tables;
    /// callers that need those invariants maintained (NSUP's main loop) are
    /// responsible for calling the matching update routines afterward.
    pub fn create_edge(&mut self, from: NodeId, to: NodeId, label: i32, kind: EdgeKind) -> EdgeView {
        self.graph.add_edge(from, to, EdgeData { label, kind });
        EdgeView { from, to, label, kind }
    }

    /// Removes the edge `from -> to`, if one exists. Returns whether an edge
    /// was actually removed.
    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        match self.graph.find_edge(from, to) {
            Some(edge_index) => {
                self.graph.remove_edge(edge_index);
                true
            }
            None => false,
        }
    }

    /// Whether `node` is a recursive predecessor of `other` (zero or more
    /// hops backward from `other` reaches `node`).
    pub fn is_recursive_predecessor_of(&self, node: NodeId, other: NodeId) -> bool {
        self.graph[other].recursive_preds.contains(node.index())
    }

    /// Whether `node` is a recursive successor of `other` (zero or more hops
    /// forward from `other` reaches `node`).
    pub fn is_recursive_successor_of(&self, node: NodeId, other: NodeId) -> bool {
        self.graph[other].recursive_succs.contains(node.index())
    }

    /// Iterates the recursive successors of `node` (not including `node`
    /// itself).
    pub fn recursive_successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph[node].recursive_succs.ones().map(NodeId::new)
    }

    /// Iterates the recursive predecessors of `node` (not including `node`
    /// itself).
    pub fn recursive_predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph[node].recursive_preds.ones().map(NodeId::new)
    }

    /// Registers `other` as a recursive successor of `node` (and, by the
    /// same stroke, `node` as a recursive predecessor of `other`).
    pub fn add_recursive_successor(&mut self, node: NodeId, other: NodeId) {
        self.graph[node].recursive_succs.insert(other.index());
        self.graph[other].recursive_preds.insert(node.index());
    }

    /// Registers `other` as a recursive predecessor of `node` (and `node` as
    /// a recursive successor of `other`).
    pub fn add_recursive_predecessor(&mut self, node: NodeId, other: NodeId) {
        self.graph[node].recursive_preds.insert(other.index());
        self.graph[other].recursive_succs.insert(node.index());
    }

    /// Two nodes are independent when neither is a recursive ancestor of the
    /// other (and they aren't the same node).
    pub fn are_independent(&self, a: NodeId, b: NodeId) -> bool {
        a != b
            && !self.is_recursive_predecessor_of(a, b)
            && !self.is_recursive_predecessor_of(b, a)
    }

    fn compute_recursive_reachability(&mut self) {
        let node_count = self.graph.node_count();
        let mut visited = FixedBitSet::with_capacity(node_count);
        let mut stack: Vec<NodeId> = Vec::new();

        for start in self.graph.node_indices().collect::<Vec<_>>() {
            visited.clear();
            stack.clear();
            stack.push(start);
            visited.insert(start.index());

            while let Some(current) = stack.pop() {
                let successors: Vec<NodeId> = self
                    .graph
                    .edges_directed(current, Direction::Outgoing)
                    .map(|e| e.target())
                    .collect();

                for successor in successors {
                    if !visited.contains(successor.index()) {
                        visited.insert(successor.index());
                        stack.push(successor);
                        self.graph[start].recursive_succs.insert(successor.index());
                        self.graph[successor].recursive_preds.insert(start.index());
                    }
                }
            }
        }
    }
}

/// A convenience iterator adapter: `once(node).chain(ddg.recursive_successors(node))`,
/// i.e. the reflexive-transitive closure rather than the strict one.
pub fn closed_successors(ddg: &Ddg, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    iter::once(node).chain(ddg.recursive_successors(node))
}

/// The reflexive-transitive predecessor closure, dually to
/// [`closed_successors`].
pub fn closed_predecessors(ddg: &Ddg, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    iter::once(node).chain(ddg.recursive_predecessors(node))
}
