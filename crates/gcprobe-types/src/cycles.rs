use facet::Facet;

use crate::{InvariantError, ObjectId};

/// A closed loop in the reference graph.
///
/// `nodes` is `[n0, n1, .., nk]` where each node references the next and `nk`
/// references `n0`. The closing node is not repeated: a self-referencing
/// object is `[a]`, a mutual pair is `[a, b]`.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct CycleRecord {
    nodes: Vec<ObjectId>,
}

impl CycleRecord {
    pub fn new(nodes: Vec<ObjectId>) -> Result<Self, InvariantError> {
        if nodes.is_empty() {
            return Err(InvariantError::EmptyCycle);
        }
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[ObjectId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true for a record built through [`CycleRecord::new`].
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.nodes.contains(&id)
    }

    /// First node of the loop. `None` only for a record decoded from data
    /// that bypassed [`CycleRecord::new`].
    pub fn entry(&self) -> Option<ObjectId> {
        self.nodes.first().copied()
    }

    /// The cycle as a walk that returns to its entry node.
    pub fn closed_walk(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.nodes.iter().copied().chain(self.entry())
    }
}

/// Outcome of one bounded cycle search, with traversal counters.
#[derive(Facet, Debug, Clone, Default, PartialEq)]
pub struct CycleSearch {
    /// Cycles in discovery order. Not deduplicated.
    pub cycles: Vec<CycleRecord>,
    /// Nodes whose outgoing references were enumerated.
    pub nodes_expanded: u64,
    /// Branches cut off because they went past the depth bound.
    pub truncated_branches: u64,
    /// Nodes that refused introspection and were treated as leaves.
    pub denied_nodes: u64,
    /// Whether the node budget ran out before the traversal finished.
    pub budget_exhausted: bool,
}
