//! # Seeded tree expansion end to end
//!
//! Exercises [`GeoStore`] and [`GeoNavigator`] over in-memory datasets:
//!
//! 1. The seeded tree serves the country and all 26 cantons before any
//!    dataset is touched.
//! 2. Expansion is idempotent per node and fetches each dataset once.
//! 3. A canton without district features falls back to direct community
//!    children.
//! 4. A failed expansion leaves the tree exactly as it was.
//! 5. In a fully expanded tree, every node hangs below a strictly broader
//!    parent and is reachable from the root.
//! 6. A navigator descends and climbs through freshly expanded levels.

use std::sync::Arc;

use serde_json::json;

use helv_core::{GeoId, GeoLevel};
use helv_geodata::{
    DatasetKind, DatasetSource, DatasetStore, FeatureCollection, MemoryDatasetSource,
};
use helv_store::{GeoNavigator, GeoStore, StoreError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn collection(value: serde_json::Value) -> FeatureCollection {
    serde_json::from_value(value).unwrap()
}

/// Districts for canton 1 only; canton 16 has none on purpose.
fn districts_fixture() -> FeatureCollection {
    collection(json!({
        "features": [
            { "properties": { "kantonsnummer": 1, "bezirksnummer": 101, "name": "Affoltern" } },
            { "properties": { "kantonsnummer": 1, "bezirksnummer": 102, "name": "Andelfingen" } }
        ]
    }))
}

/// Communities for canton 1 (per district) and canton 16 (no district
/// number, attached directly to the canton).
fn communities_fixture() -> FeatureCollection {
    collection(json!({
        "features": [
            { "properties": { "kantonsnummer": 1, "bezirksnummer": 101, "id": 1, "name": "Aeugst am Albis" } },
            { "properties": { "kantonsnummer": 1, "bezirksnummer": 101, "id": 2, "name": "Affoltern am Albis" } },
            { "properties": { "kantonsnummer": 1, "bezirksnummer": 102, "id": 23, "name": "Andelfingen" } },
            { "properties": { "kantonsnummer": 16, "id": 3101, "name": "Appenzell" } },
            { "properties": { "kantonsnummer": 16, "id": 3102, "name": "Gonten" } },
            { "properties": { "kantonsnummer": 16, "id": 3103, "name": "Rüte" } }
        ]
    }))
}

/// Store over both fixtures.
fn store_with_fixtures() -> Arc<GeoStore> {
    Arc::new(GeoStore::new(Arc::new(DatasetStore::new(
        MemoryDatasetSource::new()
            .with_dataset(DatasetKind::Districts, districts_fixture())
            .with_dataset(DatasetKind::Communities, communities_fixture()),
    ))))
}

/// Upstream fetches performed so far.
fn fetch_count(store: &GeoStore) -> u64 {
    match store.datasets().source() {
        DatasetSource::Memory(source) => source.fetch_count(),
        other => panic!("expected memory source, got {other:?}"),
    }
}

fn canton(number: u16) -> GeoId {
    GeoId::canton(number)
}

fn district(canton_number: u16, number: &str) -> GeoId {
    GeoId::district(&canton(canton_number), number).unwrap()
}

// ---------------------------------------------------------------------------
// 1. The seeded tree serves navigation before any fetch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn the_seeded_tree_is_complete_before_any_fetch() {
    let store = store_with_fixtures();

    let tree = store.tree();
    let root = tree.root().unwrap();
    assert_eq!(root.id, GeoId::country());
    assert_eq!(root.name, "Schweiz");
    assert_eq!(root.children_ids.len(), 26);
    assert_eq!(tree.len(), 27);

    assert_eq!(store.node(&canton(1)).unwrap().name, "Kanton Zürich");
    assert_eq!(
        store.node(&canton(16)).unwrap().name,
        "Kanton Appenzell Innerrhoden"
    );
    assert_eq!(store.node(&canton(26)).unwrap().name, "Kanton Jura");

    // Seed data only; the dataset layer has not been consulted.
    assert_eq!(fetch_count(&store), 0);
}

// ---------------------------------------------------------------------------
// 2. Expansion is idempotent and fetches once
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_expansion_is_a_no_op() {
    let store = store_with_fixtures();

    store
        .ensure_children(&canton(1), GeoLevel::Canton)
        .await
        .unwrap();
    let after_first = store.tree();
    assert_eq!(fetch_count(&store), 1);

    store
        .ensure_children(&canton(1), GeoLevel::Canton)
        .await
        .unwrap();
    assert_eq!(store.tree(), after_first);
    assert_eq!(fetch_count(&store), 1);

    let children = after_first.children_of(&canton(1));
    let names: Vec<&str> = children.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Affoltern", "Andelfingen"]);

    // One level deeper, same contract.
    let affoltern = district(1, "101");
    store
        .ensure_children(&affoltern, GeoLevel::District)
        .await
        .unwrap();
    store
        .ensure_children(&affoltern, GeoLevel::District)
        .await
        .unwrap();
    assert_eq!(fetch_count(&store), 2);
    assert_eq!(store.tree().children_of(&affoltern).len(), 2);
}

// ---------------------------------------------------------------------------
// 3. A canton without districts gets community children
// ---------------------------------------------------------------------------

#[tokio::test]
async fn a_canton_without_districts_gets_direct_community_children() {
    let store = store_with_fixtures();

    store
        .ensure_children(&canton(16), GeoLevel::Canton)
        .await
        .unwrap();

    let tree = store.tree();
    let children = tree.children_of(&canton(16));
    let names: Vec<&str> = children.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Appenzell", "Gonten", "Rüte"]);

    for child in &children {
        assert_eq!(child.level, GeoLevel::Community);
        assert_eq!(child.parent_id, Some(canton(16)));
    }

    // Districts were tried first, then communities.
    assert_eq!(fetch_count(&store), 2);
}

// ---------------------------------------------------------------------------
// 4. A failed expansion leaves the tree untouched
// ---------------------------------------------------------------------------

#[tokio::test]
async fn a_failed_expansion_leaves_the_tree_untouched() {
    // No districts dataset configured at all.
    let store = Arc::new(GeoStore::new(Arc::new(DatasetStore::new(
        MemoryDatasetSource::new().with_dataset(DatasetKind::Communities, communities_fixture()),
    ))));
    let before = store.tree();

    let err = store
        .ensure_children(&canton(1), GeoLevel::Canton)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Dataset {
            kind: DatasetKind::Districts,
            ..
        }
    ));

    assert_eq!(store.tree(), before);
    assert!(store.node(&canton(1)).unwrap().children_ids.is_empty());
}

// ---------------------------------------------------------------------------
// 5. Every node hangs below a strictly broader parent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn every_node_hangs_below_a_strictly_broader_parent() {
    let store = store_with_fixtures();

    // Expand everything the fixtures can produce.
    store
        .ensure_children(&canton(1), GeoLevel::Canton)
        .await
        .unwrap();
    store
        .ensure_children(&canton(16), GeoLevel::Canton)
        .await
        .unwrap();
    store
        .ensure_children(&district(1, "101"), GeoLevel::District)
        .await
        .unwrap();
    store
        .ensure_children(&district(1, "102"), GeoLevel::District)
        .await
        .unwrap();

    // Root + 26 cantons + 2 districts + 3 communities + 3 fallback
    // communities.
    let tree = store.tree();
    assert_eq!(tree.len(), 35);

    let root_id = tree.root().unwrap().id.clone();
    let mut queue = vec![root_id.clone()];
    let mut visited = 0usize;
    while let Some(id) = queue.pop() {
        let node = tree.node(&id).unwrap();
        visited += 1;
        match &node.parent_id {
            None => assert_eq!(node.id, root_id),
            Some(parent_id) => {
                let parent = tree
                    .node(parent_id)
                    .unwrap_or_else(|| panic!("dangling parent for {id}"));
                assert!(parent.children_ids.contains(&node.id));
                assert!(parent.level < node.level);
                // Exactly one step apart, except for communities attached
                // directly to a district-less canton.
                let fallback_edge =
                    parent.level == GeoLevel::Canton && node.level == GeoLevel::Community;
                if !fallback_edge {
                    assert_eq!(parent.level.child_level(), Some(node.level));
                }
            }
        }
        queue.extend(node.children_ids.iter().cloned());
    }

    // Everything in the mapping is reachable from the root.
    assert_eq!(visited, tree.len());
}

// ---------------------------------------------------------------------------
// 6. A navigator descends and climbs through expanded levels
// ---------------------------------------------------------------------------

#[tokio::test]
async fn a_navigator_descends_and_climbs_through_expanded_levels() {
    let store = store_with_fixtures();
    let mut navigator = GeoNavigator::new(Arc::clone(&store));

    assert_eq!(navigator.current().name, "Schweiz");
    assert_eq!(navigator.children().len(), 26);
    assert!(!navigator.can_go_back());

    navigator.go_to(&canton(1));
    navigator.ensure_children().await.unwrap();
    let names: Vec<&str> = navigator.children().iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Affoltern", "Andelfingen"]);

    navigator.go_to(&district(1, "101"));
    navigator.ensure_children().await.unwrap();
    assert_eq!(navigator.children().len(), 2);

    let breadcrumb: Vec<&str> = navigator
        .breadcrumb()
        .iter()
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(breadcrumb, vec!["Schweiz", "Kanton Zürich", "Affoltern"]);

    navigator.go_back();
    assert_eq!(navigator.current().id, canton(1));
    navigator.go_back();
    assert_eq!(navigator.current().id, GeoId::country());

    // Climbing above the root is a no-op.
    navigator.go_back();
    assert_eq!(navigator.current().id, GeoId::country());
}
