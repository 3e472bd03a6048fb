//! Snapshot-based navigation over the region tree.
//!
//! A navigator owns its own tree snapshot and a current position, so a
//! browsing surface can render breadcrumbs and child lists without touching
//! the shared store. Moving deeper calls back into the store to expand the
//! current node, then re-snapshots.

use std::collections::HashSet;
use std::sync::Arc;

use helv_core::{GeoId, GeoNode, GeoTree};

use crate::store::{GeoStore, StoreError};

/// A cursor into the region tree with breadcrumb support.
#[derive(Debug)]
pub struct GeoNavigator {
    store: Arc<GeoStore>,
    snapshot: GeoTree,
    current_id: GeoId,
}

impl GeoNavigator {
    /// Start a navigator at the country root.
    pub fn new(store: Arc<GeoStore>) -> Self {
        let snapshot = store.tree();
        Self {
            store,
            snapshot,
            current_id: GeoId::country(),
        }
    }

    /// The node the navigator currently points at.
    ///
    /// Falls back to the root when the current id is not in the snapshot.
    pub fn current(&self) -> &GeoNode {
        self.snapshot
            .node(&self.current_id)
            .or_else(|| self.snapshot.root())
            .expect("snapshot always contains its root")
    }

    /// Children of the current node, unknown ids skipped.
    pub fn children(&self) -> Vec<&GeoNode> {
        self.snapshot.children_of(&self.current().id)
    }

    /// The chain of nodes from the root to the current node.
    pub fn breadcrumb(&self) -> Vec<&GeoNode> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = Some(self.current());
        while let Some(node) = cursor {
            // Guards against malformed parent links looping forever.
            if !visited.insert(node.id.clone()) {
                break;
            }
            chain.push(node);
            cursor = node
                .parent_id
                .as_ref()
                .and_then(|parent| self.snapshot.node(parent));
        }
        chain.reverse();
        chain
    }

    /// Move to a node in the snapshot; unknown ids are ignored.
    pub fn go_to(&mut self, id: &GeoId) {
        if self.snapshot.contains(id) {
            self.current_id = id.clone();
        } else {
            tracing::debug!(%id, "ignoring navigation to unknown node");
        }
    }

    /// Whether the current node has a parent to return to.
    pub fn can_go_back(&self) -> bool {
        self.current().parent_id.is_some()
    }

    /// Move to the parent of the current node, if it has one.
    pub fn go_back(&mut self) {
        if let Some(parent) = self.current().parent_id.clone() {
            self.go_to(&parent);
        }
    }

    /// Expand the current node through the store, then refresh the
    /// snapshot so the new children are visible.
    pub async fn ensure_children(&mut self) -> Result<(), StoreError> {
        let id = self.current_id.clone();
        let level = id.level();
        self.store.ensure_children(&id, level).await?;
        self.refresh();
        Ok(())
    }

    /// Re-snapshot the store's tree.
    pub fn refresh(&mut self) {
        self.snapshot = self.store.tree();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
