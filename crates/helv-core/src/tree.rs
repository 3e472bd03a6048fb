//! # Region Tree Model
//!
//! [`GeoNode`] and [`GeoTree`]: the lazily-expanded tree of administrative
//! regions. The tree is the single source of truth for navigation state and
//! is mutated only through an explicit ensure-children pass in the store
//! layer.
//!
//! ## Mutation discipline
//!
//! - Nodes are append-only: once inserted they are never removed, renamed,
//!   or overwritten ([`GeoTree::insert_if_absent`]).
//! - A node's `children_ids` is either empty (not yet expanded, or genuinely
//!   childless) or fully populated for its level; it is replaced in one step
//!   ([`GeoTree::set_children`]), never grown incrementally.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{GeoId, GeoLevel};

/// One administrative region in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoNode {
    /// Identifier; its shape determines `level`.
    pub id: GeoId,
    /// Administrative level, derived from `id` at construction.
    pub level: GeoLevel,
    /// Human-readable display name.
    pub name: String,
    /// Parent identifier. `None` only for the country root.
    pub parent_id: Option<GeoId>,
    /// Ordered child identifiers. Empty until lazily populated.
    pub children_ids: Vec<GeoId>,
}

impl GeoNode {
    /// Create a node with an empty child list. The level is derived from
    /// the identifier's shape, so id and level cannot disagree.
    pub fn new(id: GeoId, name: impl Into<String>, parent_id: Option<GeoId>) -> Self {
        let level = id.level();
        Self {
            id,
            level,
            name: name.into(),
            parent_id,
            children_ids: Vec::new(),
        }
    }

    /// Whether the child list has been populated.
    pub fn has_children(&self) -> bool {
        !self.children_ids.is_empty()
    }
}

/// The region tree: a designated root plus a mapping from id to node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoTree {
    /// Identifier of the root node.
    pub root_id: GeoId,
    /// All known nodes, keyed by identifier.
    pub nodes: HashMap<GeoId, GeoNode>,
}

impl GeoTree {
    /// Create a tree containing only the given root node.
    pub fn new(root: GeoNode) -> Self {
        let root_id = root.id.clone();
        let mut nodes = HashMap::new();
        nodes.insert(root_id.clone(), root);
        Self { root_id, nodes }
    }

    /// Look up a node by id.
    pub fn node(&self, id: &GeoId) -> Option<&GeoNode> {
        self.nodes.get(id)
    }

    /// The root node, if present in the mapping.
    pub fn root(&self) -> Option<&GeoNode> {
        self.nodes.get(&self.root_id)
    }

    /// Whether the tree knows the given id.
    pub fn contains(&self, id: &GeoId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a node unless its id is already present. Returns whether the
    /// node was inserted. Existing nodes are never overwritten.
    pub fn insert_if_absent(&mut self, node: GeoNode) -> bool {
        use std::collections::hash_map::Entry;
        match self.nodes.entry(node.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(node);
                true
            }
        }
    }

    /// Replace a node's child list in one step. Returns `false` when the
    /// node is unknown.
    pub fn set_children(&mut self, id: &GeoId, children: Vec<GeoId>) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.children_ids = children;
                true
            }
            None => false,
        }
    }

    /// Resolve a node's children to nodes, skipping ids the tree does not
    /// know (tolerated, like malformed features in the reference data).
    pub fn children_of(&self, id: &GeoId) -> Vec<&GeoNode> {
        match self.nodes.get(id) {
            Some(node) => node
                .children_ids
                .iter()
                .filter_map(|child| self.nodes.get(child))
                .collect(),
            None => Vec::new(),
        }
    }
}
