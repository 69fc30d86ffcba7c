//! Bounded-depth reference cycle detection.
//!
//! The search is a depth-first walk from a root. Two pieces of state live for
//! the duration of one call:
//!
//! - `visited`: every node expanded so far. A node is expanded at most once,
//!   which bounds the total work for finite graphs.
//! - `path`: the nodes on the active branch, root first. Meeting a node that
//!   is on the path closes a loop; the path suffix starting at that node is
//!   reported as a [`CycleRecord`].
//!
//! Identities may be addresses, so every expanded node is held until the call
//! returns. A node materialized on demand cannot be freed mid-search and have
//! its address handed to an unrelated object.
//!
//! The walk uses an explicit stack of frames instead of recursion so deep
//! graphs cannot exhaust the call stack.
//!
//! Known limitations: branches past the depth bound are cut silently, so a
//! cycle lying beyond the bound is not found even if a shorter detour to it
//! exists through an already-expanded node. Cycles are not deduplicated;
//! parallel edges closing the same loop report it once per edge.

use std::collections::{HashMap, HashSet};

use gcprobe_types::{CycleRecord, CycleSearch, ObjectId};
use tracing::{debug, trace};

use crate::config::ProbeConfig;
use crate::graph::ReferenceGraph;

/// Depth-bounded cycle search over a [`ReferenceGraph`].
///
/// Holds no traversal state, so one detector can serve concurrent searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleDetector {
    max_depth: u32,
    node_budget: Option<u64>,
}

impl CycleDetector {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            node_budget: None,
        }
    }

    /// Stop expanding new nodes once `budget` nodes have been expanded.
    pub fn with_node_budget(mut self, budget: u64) -> Self {
        self.node_budget = Some(budget);
        self
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            node_budget: config.node_budget,
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn node_budget(&self) -> Option<u64> {
        self.node_budget
    }

    /// Cycles reachable from `root` within the depth bound. Empty when there
    /// are none; never fails.
    pub fn find_cycles<G: ReferenceGraph>(&self, graph: &G, root: G::Node) -> Vec<CycleRecord> {
        self.search(graph, root).cycles
    }

    /// Like [`CycleDetector::find_cycles`], with traversal counters.
    pub fn search<G: ReferenceGraph>(&self, graph: &G, root: G::Node) -> CycleSearch {
        let mut traversal = Traversal {
            graph,
            max_depth: self.max_depth,
            node_budget: self.node_budget,
            visited: HashSet::new(),
            path: Vec::new(),
            on_path: HashMap::new(),
            stack: Vec::new(),
            expanded: Vec::new(),
            report: CycleSearch::default(),
        };
        traversal.run(root);
        let report = traversal.report;
        debug!(
            max_depth = self.max_depth,
            cycles = report.cycles.len(),
            nodes_expanded = report.nodes_expanded,
            truncated_branches = report.truncated_branches,
            denied_nodes = report.denied_nodes,
            budget_exhausted = report.budget_exhausted,
            "cycle search finished"
        );
        report
    }
}

impl Default for CycleDetector {
    fn default() -> Self {
        Self::from_config(&ProbeConfig::default())
    }
}

struct Frame<N> {
    depth: u32,
    pending: std::vec::IntoIter<N>,
}

struct Traversal<'g, G: ReferenceGraph> {
    graph: &'g G,
    max_depth: u32,
    node_budget: Option<u64>,
    visited: HashSet<ObjectId>,
    path: Vec<ObjectId>,
    /// Position of each path node in `path`.
    on_path: HashMap<ObjectId, usize>,
    stack: Vec<Frame<G::Node>>,
    /// Keeps every id in `visited` and `path` bound to a live node.
    expanded: Vec<G::Node>,
    report: CycleSearch,
}

impl<G: ReferenceGraph> Traversal<'_, G> {
    fn run(&mut self, root: G::Node) {
        self.visit(root, 0);
        while let Some(frame) = self.stack.last_mut() {
            match frame.pending.next() {
                Some(child) => {
                    let depth = frame.depth.saturating_add(1);
                    self.visit(child, depth);
                }
                None => {
                    self.stack.pop();
                    if let Some(id) = self.path.pop() {
                        self.on_path.remove(&id);
                    }
                }
            }
        }
    }

    fn visit(&mut self, node: G::Node, depth: u32) {
        let id = self.graph.identity(&node);

        // Path membership is checked before the depth bound: closing a loop
        // never descends, so it is reported even one level past the bound.
        if let Some(&start) = self.on_path.get(&id) {
            if let Ok(cycle) = CycleRecord::new(self.path[start..].to_vec()) {
                trace!(entry = %id, len = cycle.len(), "cycle closed");
                self.report.cycles.push(cycle);
            }
            return;
        }
        if self.visited.contains(&id) {
            return;
        }
        if depth > self.max_depth {
            self.report.truncated_branches += 1;
            return;
        }
        if self
            .node_budget
            .is_some_and(|budget| self.report.nodes_expanded >= budget)
        {
            self.report.budget_exhausted = true;
            return;
        }

        self.visited.insert(id);
        self.report.nodes_expanded += 1;
        let referents = match self.graph.referents(&node) {
            Ok(referents) => referents,
            Err(denied) => {
                trace!(node = %id, reason = %denied.reason, "node refused introspection");
                self.report.denied_nodes += 1;
                Vec::new()
            }
        };

        self.on_path.insert(id, self.path.len());
        self.path.push(id);
        self.expanded.push(node);
        self.stack.push(Frame {
            depth,
            pending: referents.into_iter(),
        });
    }
}
