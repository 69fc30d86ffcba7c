//! Reference-graph capability and the graphs gcprobe ships with.
//!
//! The cycle detector only needs two things from a host: a stable identity for
//! each node, and the list of nodes it references. [`ReferenceGraph`] captures
//! exactly that. [`AdjacencyGraph`] is an explicit graph (built in code or
//! loaded from JSON); [`ArcGraph`] walks live `Arc` object graphs.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use facet::Facet;
use gcprobe_types::ObjectId;

use crate::error::IntrospectionDenied;

/// Host primitive for enumerating outgoing references.
pub trait ReferenceGraph {
    type Node;

    /// Stable identity of `node`; equal identities mean the same object.
    fn identity(&self, node: &Self::Node) -> ObjectId;

    /// Objects directly referenced by `node`. May be empty.
    fn referents(&self, node: &Self::Node) -> Result<Vec<Self::Node>, IntrospectionDenied>;

    /// Objects that directly reference `node`. Graphs that only know outgoing
    /// edges keep the default, which reports none.
    fn referrers(&self, _node: &Self::Node) -> Result<Vec<Self::Node>, IntrospectionDenied> {
        Ok(Vec::new())
    }

    /// Shallow size of `node` in bytes, when the graph knows it.
    fn object_size(&self, _node: &Self::Node) -> Option<u64> {
        None
    }
}

impl<G: ReferenceGraph + ?Sized> ReferenceGraph for &G {
    type Node = G::Node;

    fn identity(&self, node: &Self::Node) -> ObjectId {
        (**self).identity(node)
    }

    fn referents(&self, node: &Self::Node) -> Result<Vec<Self::Node>, IntrospectionDenied> {
        (**self).referents(node)
    }

    fn referrers(&self, node: &Self::Node) -> Result<Vec<Self::Node>, IntrospectionDenied> {
        (**self).referrers(node)
    }

    fn object_size(&self, node: &Self::Node) -> Option<u64> {
        (**self).object_size(node)
    }
}

// ── Explicit adjacency graph ────────────────────────────────

#[derive(Debug)]
pub enum GraphError {
    DuplicateNode { id: ObjectId },
    DanglingReference { from: ObjectId, to: ObjectId },
    UnknownRoot { id: ObjectId },
    Decode { message: String },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode { id } => write!(f, "node {} is declared more than once", id.get()),
            Self::DanglingReference { from, to } => write!(
                f,
                "node {} references undeclared node {}",
                from.get(),
                to.get()
            ),
            Self::UnknownRoot { id } => write!(f, "root node {} is not in the graph", id.get()),
            Self::Decode { message } => write!(f, "failed to decode graph document: {message}"),
        }
    }
}

impl Error for GraphError {}

/// Serialized form of an [`AdjacencyGraph`].
#[derive(Facet, Debug, Clone, Default)]
pub struct GraphDocument {
    pub nodes: Vec<DocumentNode>,
}

#[derive(Facet, Debug, Clone)]
pub struct DocumentNode {
    pub id: u64,
    #[facet(default)]
    pub label: Option<String>,
    /// Ids of the nodes this node references, in order.
    #[facet(default)]
    pub refs: Vec<u64>,
    /// Opaque nodes refuse introspection.
    #[facet(default)]
    pub opaque: bool,
    /// Shallow size in bytes.
    #[facet(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default)]
struct AdjacencyNode {
    label: Option<String>,
    referents: Vec<ObjectId>,
    opaque: bool,
    size: Option<u64>,
}

/// Graph with explicitly listed edges. Nodes are their own identities.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    nodes: BTreeMap<ObjectId, AdjacencyNode>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: impl Into<ObjectId>) -> &mut Self {
        self.nodes.entry(id.into()).or_default();
        self
    }

    /// Add `from -> to`, declaring both nodes if needed. Parallel edges are kept.
    pub fn add_edge(&mut self, from: impl Into<ObjectId>, to: impl Into<ObjectId>) -> &mut Self {
        let to = to.into();
        self.nodes.entry(to).or_default();
        self.nodes.entry(from.into()).or_default().referents.push(to);
        self
    }

    pub fn set_label(&mut self, id: impl Into<ObjectId>, label: impl Into<String>) -> &mut Self {
        self.nodes.entry(id.into()).or_default().label = Some(label.into());
        self
    }

    /// Make `id` refuse introspection.
    pub fn set_opaque(&mut self, id: impl Into<ObjectId>) -> &mut Self {
        self.nodes.entry(id.into()).or_default().opaque = true;
        self
    }

    pub fn set_size(&mut self, id: impl Into<ObjectId>, bytes: u64) -> &mut Self {
        self.nodes.entry(id.into()).or_default().size = Some(bytes);
        self
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn label(&self, id: ObjectId) -> Option<&str> {
        self.nodes.get(&id).and_then(|node| node.label.as_deref())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.referents.len()).sum()
    }

    /// Resolve a root id, failing if the graph does not declare it.
    pub fn root(&self, id: impl Into<ObjectId>) -> Result<ObjectId, GraphError> {
        let id = id.into();
        if self.contains(id) {
            Ok(id)
        } else {
            Err(GraphError::UnknownRoot { id })
        }
    }

    pub fn from_document(document: &GraphDocument) -> Result<Self, GraphError> {
        let mut nodes = BTreeMap::new();
        for node in &document.nodes {
            let id = ObjectId::from_raw(node.id);
            match nodes.entry(id) {
                Entry::Occupied(_) => return Err(GraphError::DuplicateNode { id }),
                Entry::Vacant(slot) => {
                    slot.insert(AdjacencyNode {
                        label: node.label.clone(),
                        referents: node.refs.iter().copied().map(ObjectId::from_raw).collect(),
                        opaque: node.opaque,
                        size: node.size,
                    });
                }
            }
        }
        for (from, node) in &nodes {
            if let Some(to) = node.referents.iter().find(|to| !nodes.contains_key(*to)) {
                return Err(GraphError::DanglingReference {
                    from: *from,
                    to: *to,
                });
            }
        }
        Ok(Self { nodes })
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let document: GraphDocument = facet_json::from_str(json).map_err(|e| GraphError::Decode {
            message: e.to_string(),
        })?;
        Self::from_document(&document)
    }

    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            nodes: self
                .nodes
                .iter()
                .map(|(id, node)| DocumentNode {
                    id: id.get(),
                    label: node.label.clone(),
                    refs: node.referents.iter().map(|to| to.get()).collect(),
                    opaque: node.opaque,
                    size: node.size,
                })
                .collect(),
        }
    }
}

impl ReferenceGraph for AdjacencyGraph {
    type Node = ObjectId;

    fn identity(&self, node: &ObjectId) -> ObjectId {
        *node
    }

    fn referents(&self, node: &ObjectId) -> Result<Vec<ObjectId>, IntrospectionDenied> {
        match self.nodes.get(node) {
            Some(entry) if entry.opaque => Err(IntrospectionDenied::new(format!(
                "node {} is opaque",
                node.get()
            ))),
            Some(entry) => Ok(entry.referents.clone()),
            None => Ok(Vec::new()),
        }
    }

    /// Every node with at least one edge to `node`, once each, in id order.
    /// Opaque referrers are included; only their own edges are hidden.
    fn referrers(&self, node: &ObjectId) -> Result<Vec<ObjectId>, IntrospectionDenied> {
        Ok(self
            .nodes
            .iter()
            .filter(|(_, entry)| entry.referents.contains(node))
            .map(|(id, _)| *id)
            .collect())
    }

    fn object_size(&self, node: &ObjectId) -> Option<u64> {
        self.nodes.get(node).and_then(|entry| entry.size)
    }
}

// ── Live Arc graphs ─────────────────────────────────────────

/// An object that can report the shared objects it holds.
///
/// Implementations guarding their children behind a lock should use a
/// non-blocking acquire and return [`IntrospectionDenied`] when it fails, so
/// a traversal never blocks on a held lock.
pub trait Traceable {
    fn trace(&self, visit: &mut dyn FnMut(Arc<dyn Traceable>)) -> Result<(), IntrospectionDenied>;

    /// Shallow size in bytes. Heap buffers the object owns are not counted
    /// unless an implementation adds them.
    fn size_bytes(&self) -> usize {
        std::mem::size_of_val(self)
    }
}

/// Reference graph over `Arc<dyn Traceable>` objects, identified by address.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArcGraph;

impl ReferenceGraph for ArcGraph {
    type Node = Arc<dyn Traceable>;

    fn identity(&self, node: &Arc<dyn Traceable>) -> ObjectId {
        ObjectId::from_address(Arc::as_ptr(node) as *const () as usize)
    }

    fn referents(
        &self,
        node: &Arc<dyn Traceable>,
    ) -> Result<Vec<Arc<dyn Traceable>>, IntrospectionDenied> {
        let mut referents = Vec::new();
        node.trace(&mut |child| referents.push(child))?;
        Ok(referents)
    }

    fn object_size(&self, node: &Arc<dyn Traceable>) -> Option<u64> {
        Some(node.size_bytes() as u64)
    }
}
