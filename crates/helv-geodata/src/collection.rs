//! GeoJSON feature collections as served by the boundary dataset endpoints.
//!
//! The upstream files are conventional GeoJSON, but the property bags are
//! not uniform: canton features carry `id`/`name`, district features carry
//! `bezirksnummer`/`bezirksname`, community features carry `gemeindename`
//! plus parent numbers, and numeric fields arrive sometimes as JSON numbers
//! and sometimes as strings. Every property is therefore deserialized as an
//! optional raw [`serde_json::Value`] and normalised on access, so a single
//! malformed feature degrades to "skipped" instead of failing the whole
//! collection decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Collection & feature shells
// ---------------------------------------------------------------------------

/// A GeoJSON `FeatureCollection` restricted to the parts the stack reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// The member features, in upstream order.
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Number of features in the collection.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True when the collection carries no features at all.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A single GeoJSON feature.
///
/// Geometry is carried opaquely: the stack never interprets coordinates,
/// but embedding map layers expect it to survive a round trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// The property bag with naming and numbering for the region.
    #[serde(default)]
    pub properties: FeatureProperties,
    /// Raw geometry, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// The union of property fields observed across the three dataset kinds.
///
/// Each field is optional and raw; use the accessor methods rather than the
/// fields directly, since they normalise `7`, `7.0` and `" 7 "` to the same
/// `"7"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureProperties {
    /// Canton number on district and community features.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kantonsnummer: Option<Value>,
    /// District number on district and community features.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bezirksnummer: Option<Value>,
    /// Feature identifier; the canton number on canton features, the
    /// community number on community features.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Generic display name, used by canton and district features.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    /// District display name on district features.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bezirksname: Option<Value>,
    /// Community display name on community features.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemeindename: Option<Value>,
    /// Canton display name on community features.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kantonsname: Option<Value>,
    /// Alternate canton number key seen in some exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canton_id: Option<Value>,
    /// Alternate canton name key seen in some exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canton_name: Option<Value>,
}

impl FeatureProperties {
    /// Canton number from the primary `kantonsnummer` key.
    pub fn canton_number(&self) -> Option<String> {
        self.kantonsnummer.as_ref().and_then(normalize)
    }

    /// Canton number for a canton feature, where the feature's own `id` is
    /// the canton number: `kantonsnummer`, then `id`, then `canton_id`.
    pub fn canton_number_any(&self) -> Option<String> {
        self.canton_number()
            .or_else(|| self.feature_id())
            .or_else(|| self.canton_id.as_ref().and_then(normalize))
    }

    /// Canton display name: `name`, then `kantonsname`, then `canton_name`.
    pub fn canton_display_name(&self) -> Option<String> {
        self.name
            .as_ref()
            .and_then(normalize)
            .or_else(|| self.kantonsname.as_ref().and_then(normalize))
            .or_else(|| self.canton_name.as_ref().and_then(normalize))
    }

    /// District number from `bezirksnummer`.
    pub fn district_number(&self) -> Option<String> {
        self.bezirksnummer.as_ref().and_then(normalize)
    }

    /// The feature's own identifier from `id`.
    pub fn feature_id(&self) -> Option<String> {
        self.id.as_ref().and_then(normalize)
    }

    /// District display name: `name`, falling back to `bezirksname`.
    pub fn district_display_name(&self) -> Option<String> {
        self.name
            .as_ref()
            .and_then(normalize)
            .or_else(|| self.bezirksname.as_ref().and_then(normalize))
    }

    /// Community display name: `name`, falling back to `gemeindename`.
    pub fn community_display_name(&self) -> Option<String> {
        self.name
            .as_ref()
            .and_then(normalize)
            .or_else(|| self.gemeindename.as_ref().and_then(normalize))
    }
}

/// Normalise a raw property value to a comparable string.
///
/// Strings are trimmed and rejected when blank. Numbers are rendered as
/// integers; a fractional number has no meaning as a region number and is
/// treated as absent. Every other JSON shape is treated as absent.
fn normalize(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 => {
                        Some(format!("{}", f as i64))
                    }
                    _ => None,
                }
            }
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
