//! Node builders: from raw feature collections to hierarchy nodes.
//!
//! The builders are pure filters over a collection. They tolerate dirty
//! features: a district feature without a usable number, or a community
//! feature without an id, is skipped at debug log level and never fails the
//! build. Child lists preserve first-seen upstream order with duplicates
//! collapsed.

use std::collections::HashMap;

use helv_core::{GeoId, GeoNode};

use crate::collection::FeatureCollection;

/// Fallback display name for a district feature without one.
const DISTRICT_FALLBACK_NAME: &str = "Bezirk";
/// Fallback display name for a community feature without one.
const COMMUNITY_FALLBACK_NAME: &str = "Gemeinde";

/// Result of a build pass: the nodes to merge and the ordered child list
/// for the parent.
#[derive(Debug, Clone, Default)]
pub struct BuiltNodes {
    /// Synthesized nodes, keyed by id.
    pub nodes: HashMap<GeoId, GeoNode>,
    /// Distinct child ids in first-seen order.
    pub child_ids: Vec<GeoId>,
}

impl BuiltNodes {
    /// Number of distinct children built.
    pub fn len(&self) -> usize {
        self.child_ids.len()
    }

    /// True when no feature matched the parent.
    pub fn is_empty(&self) -> bool {
        self.child_ids.is_empty()
    }

    fn push(&mut self, node: GeoNode) {
        if !self.nodes.contains_key(&node.id) {
            self.child_ids.push(node.id.clone());
            self.nodes.insert(node.id.clone(), node);
        }
    }
}

// ---------------------------------------------------------------------------
// District builder
// ---------------------------------------------------------------------------

/// Build the district nodes of one canton from the districts dataset.
///
/// Features of other cantons are ignored, as are features without a usable
/// district number (those describe communities attached directly to the
/// canton). One node is produced per distinct district number.
pub fn district_nodes_for_canton(collection: &FeatureCollection, canton: &GeoId) -> BuiltNodes {
    let mut built = BuiltNodes::default();
    if !canton.is_canton() {
        return built;
    }
    let canton_number = canton.as_str();

    for feature in &collection.features {
        let props = &feature.properties;
        if props.canton_number().as_deref() != Some(canton_number) {
            continue;
        }
        let Some(number) = props.district_number() else {
            continue;
        };
        let id = match GeoId::district(canton, &number) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!(canton = %canton, error = %e, "skipping unusable district feature");
                continue;
            }
        };
        let name = props
            .district_display_name()
            .unwrap_or_else(|| DISTRICT_FALLBACK_NAME.to_string());
        built.push(GeoNode::new(id, name, Some(canton.clone())));
    }
    built
}

// ---------------------------------------------------------------------------
// Community builder
// ---------------------------------------------------------------------------

/// Build the community nodes under a parent from the communities dataset.
///
/// The parent is normally a district; community features are matched by
/// canton number and district number. For a canton parent (a canton whose
/// districts dataset yields nothing) the matching features are those of the
/// canton that carry no district number at all. Any other parent level
/// yields an empty build.
pub fn community_nodes_for_parent(collection: &FeatureCollection, parent: &GeoId) -> BuiltNodes {
    let mut built = BuiltNodes::default();
    let (canton, district_number) = if parent.is_canton() {
        (parent.clone(), None)
    } else if let Some((canton, number)) = parent.district_parts() {
        (canton, Some(number))
    } else {
        return built;
    };
    let canton_number = canton.as_str().to_string();

    for feature in &collection.features {
        let props = &feature.properties;
        if props.canton_number().as_deref() != Some(canton_number.as_str()) {
            continue;
        }
        if props.district_number() != district_number {
            continue;
        }
        let Some(raw) = props.feature_id() else {
            tracing::debug!(parent = %parent, "skipping community feature without id");
            continue;
        };
        let id = match GeoId::community(&canton, &raw) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!(parent = %parent, error = %e, "skipping unusable community feature");
                continue;
            }
        };
        let name = props
            .community_display_name()
            .unwrap_or_else(|| COMMUNITY_FALLBACK_NAME.to_string());
        built.push(GeoNode::new(id, name, Some(parent.clone())));
    }
    built
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
