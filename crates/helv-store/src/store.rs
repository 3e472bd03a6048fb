//! The seeded region tree and its on-demand expansion.
//!
//! The country and canton layers are fixed seed data. District and
//! community layers are attached lazily by [`GeoStore::ensure_children`],
//! which is idempotent and safe to race: whichever expansion commits first
//! wins, and every later attempt for the same node is a no-op.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use helv_core::{GeoId, GeoLevel, GeoNode, GeoTree};
use helv_geodata::builders::{community_nodes_for_parent, district_nodes_for_canton, BuiltNodes};
use helv_geodata::{DatasetKind, DatasetStore, GeodataError};

/// Display name of the seeded root node.
const COUNTRY_NAME: &str = "Schweiz";

/// German display names of the 26 cantons, indexed by canton number - 1.
const CANTON_NAMES: [&str; 26] = [
    "Kanton Zürich",
    "Kanton Bern",
    "Kanton Luzern",
    "Kanton Uri",
    "Kanton Schwyz",
    "Kanton Obwalden",
    "Kanton Nidwalden",
    "Kanton Glarus",
    "Kanton Zug",
    "Kanton Fribourg",
    "Kanton Solothurn",
    "Kanton Basel-Stadt",
    "Kanton Basel-Landschaft",
    "Kanton Schaffhausen",
    "Kanton Appenzell Ausserrhoden",
    "Kanton Appenzell Innerrhoden",
    "Kanton St. Gallen",
    "Kanton Graubünden",
    "Kanton Aargau",
    "Kanton Thurgau",
    "Kanton Tessin",
    "Kanton Waadt",
    "Kanton Wallis",
    "Kanton Neuchâtel",
    "Kanton Genève",
    "Kanton Jura",
];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure while expanding the region tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A boundary dataset needed for the expansion could not be loaded.
    #[error("failed to load {kind} dataset: {reason}")]
    Dataset {
        /// Dataset whose load failed.
        kind: DatasetKind,
        /// Description of the underlying failure.
        reason: String,
    },
}

fn dataset_error(kind: DatasetKind, e: GeodataError) -> StoreError {
    StoreError::Dataset {
        kind,
        reason: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Process-wide region tree, seeded at the top and expanded on demand.
#[derive(Debug)]
pub struct GeoStore {
    datasets: Arc<DatasetStore>,
    tree: RwLock<GeoTree>,
}

impl GeoStore {
    /// Build a store over a dataset cache, seeded with the country and all
    /// 26 cantons.
    pub fn new(datasets: Arc<DatasetStore>) -> Self {
        Self {
            datasets,
            tree: RwLock::new(seeded_tree()),
        }
    }

    /// The dataset cache this store expands from.
    pub fn datasets(&self) -> &Arc<DatasetStore> {
        &self.datasets
    }

    /// A snapshot of the current tree. Later expansions do not affect it.
    pub fn tree(&self) -> GeoTree {
        self.tree.read().clone()
    }

    /// Look up a single node by id.
    pub fn node(&self, id: &GeoId) -> Option<GeoNode> {
        self.tree.read().node(id).cloned()
    }

    /// Attach the children of a canton or district, fetching datasets as
    /// needed.
    ///
    /// Idempotent: once a node has children, every later call is a no-op.
    /// Calls for unknown nodes, for a `level` that does not match the id,
    /// or for country/community nodes are no-ops as well; racing UI layers
    /// must never turn into errors here. A canton whose districts dataset
    /// yields no match falls back to attaching its communities directly.
    pub async fn ensure_children(&self, id: &GeoId, level: GeoLevel) -> Result<(), StoreError> {
        if id.level() != level {
            tracing::debug!(%id, requested = level.as_str(), "level mismatch, skipping expansion");
            return Ok(());
        }
        match level {
            GeoLevel::Canton | GeoLevel::District => {}
            GeoLevel::Country | GeoLevel::Community => return Ok(()),
        }
        if !self.needs_expansion(id) {
            return Ok(());
        }

        // Fetch and build outside any lock.
        let built = if level == GeoLevel::Canton {
            self.build_canton_children(id).await?
        } else {
            self.build_district_children(id).await?
        };

        self.commit_children(id, built);
        Ok(())
    }

    fn needs_expansion(&self, id: &GeoId) -> bool {
        let tree = self.tree.read();
        match tree.node(id) {
            None => {
                tracing::debug!(%id, "unknown node, skipping expansion");
                false
            }
            Some(node) => node.children_ids.is_empty(),
        }
    }

    async fn build_canton_children(&self, canton: &GeoId) -> Result<BuiltNodes, StoreError> {
        let districts = self
            .datasets
            .load(DatasetKind::Districts)
            .await
            .map_err(|e| dataset_error(DatasetKind::Districts, e))?;
        let built = district_nodes_for_canton(&districts, canton);
        if !built.is_empty() {
            return Ok(built);
        }

        // Cantons without a district layer attach communities directly.
        tracing::debug!(%canton, "no districts in dataset, attaching communities directly");
        let communities = self
            .datasets
            .load(DatasetKind::Communities)
            .await
            .map_err(|e| dataset_error(DatasetKind::Communities, e))?;
        Ok(community_nodes_for_parent(&communities, canton))
    }

    async fn build_district_children(&self, district: &GeoId) -> Result<BuiltNodes, StoreError> {
        let communities = self
            .datasets
            .load(DatasetKind::Communities)
            .await
            .map_err(|e| dataset_error(DatasetKind::Communities, e))?;
        Ok(community_nodes_for_parent(&communities, district))
    }

    /// Commit an expansion: merge the built nodes and replace the parent's
    /// child list, all under one write lock.
    fn commit_children(&self, id: &GeoId, built: BuiltNodes) {
        let BuiltNodes { nodes, child_ids } = built;
        let mut tree = self.tree.write();
        // A concurrent expansion may have committed while we were fetching.
        let still_empty = tree
            .node(id)
            .map_or(false, |node| node.children_ids.is_empty());
        if !still_empty {
            return;
        }
        for node in nodes.into_values() {
            tree.insert_if_absent(node);
        }
        tree.set_children(id, child_ids);
        tracing::debug!(%id, children = tree.node(id).map_or(0, |n| n.children_ids.len()), "expanded node");
    }
}

/// The compiled-in top of the tree: `ch` plus the 26 cantons in numeric
/// order.
fn seeded_tree() -> GeoTree {
    let root_id = GeoId::country();
    let mut tree = GeoTree::new(GeoNode::new(root_id.clone(), COUNTRY_NAME, None));

    let mut children = Vec::with_capacity(CANTON_NAMES.len());
    for (index, name) in CANTON_NAMES.iter().enumerate() {
        let id = GeoId::canton(index as u16 + 1);
        children.push(id.clone());
        tree.insert_if_absent(GeoNode::new(id, *name, Some(root_id.clone())));
    }
    tree.set_children(&root_id, children);
    tree
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
