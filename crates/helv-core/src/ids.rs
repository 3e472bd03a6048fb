//! # Geographic Identifier Newtypes
//!
//! Validated identifiers for the Swiss administrative hierarchy. Four shapes
//! share a single string space and parse unambiguously:
//!
//! - country: the literal `ch`
//! - canton: an all-digit string (`1` … `26` in the reference data)
//! - district: `d-<canton>-<districtNo>`, both groups all digits
//! - community: `m-<canton>-<raw>`, raw is any non-empty remainder and may
//!   itself contain dashes
//!
//! ## Validation
//!
//! [`GeoId::new`] trims surrounding whitespace and rejects anything that does
//! not match one of the four shapes. Deserialization routes through the same
//! constructor, so malformed identifiers are rejected at the serde boundary —
//! not silently accepted.

use serde::{Deserialize, Serialize};

/// Helper macro to implement `Deserialize` for string newtypes that must
/// validate their contents. Deserializes as a plain `String`, then routes
/// through the type's `new()` constructor so that invalid values are
/// rejected at deserialization time — not silently accepted.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// The fixed identifier of the country root node.
pub const COUNTRY_ID: &str = "ch";

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// Administrative level of a region.
///
/// Levels form a strict total order from broad to narrow:
/// `Country < Canton < District < Community`. Every non-root node's parent
/// sits exactly one level broader than the node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoLevel {
    /// The country root (`ch`). Exactly one node carries this level.
    Country,
    /// One of the 26 cantons.
    Canton,
    /// A district within a canton. Some cantons have no district layer.
    District,
    /// A municipality. The leaf level — expansion below it is undefined.
    Community,
}

impl GeoLevel {
    /// Lowercase string form, matching the reference data vocabulary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Canton => "canton",
            Self::District => "district",
            Self::Community => "community",
        }
    }

    /// The level one step narrower, if any.
    pub fn child_level(&self) -> Option<GeoLevel> {
        match self {
            Self::Country => Some(Self::Canton),
            Self::Canton => Some(Self::District),
            Self::District => Some(Self::Community),
            Self::Community => None,
        }
    }

    /// The level one step broader, if any.
    pub fn parent_level(&self) -> Option<GeoLevel> {
        match self {
            Self::Country => None,
            Self::Canton => Some(Self::Country),
            Self::District => Some(Self::Canton),
            Self::Community => Some(Self::District),
        }
    }
}

impl std::fmt::Display for GeoLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from geographic identifier validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeoIdError {
    /// The identifier was empty (or whitespace only).
    #[error("geographic identifier is empty")]
    Empty,

    /// The identifier matches none of the four known shapes.
    #[error("unrecognized geographic identifier shape: {id:?}")]
    UnrecognizedShape {
        /// The offending identifier, after trimming.
        id: String,
    },
}

// ---------------------------------------------------------------------------
// GeoId
// ---------------------------------------------------------------------------

/// A validated geographic region identifier.
///
/// The shape of the string determines the region's [`GeoLevel`]; no type tag
/// is stored. Composite identifiers are synthesized with [`GeoId::district`]
/// and [`GeoId::community`] and decomposed with [`GeoId::district_parts`] and
/// [`GeoId::community_parts`]; synthesis and decomposition round-trip
/// exactly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GeoId(String);

impl_validating_deserialize!(GeoId);

impl GeoId {
    /// Create an identifier from a string, validating its shape.
    ///
    /// Surrounding whitespace is trimmed before validation, matching how
    /// the reference datasets normalize raw property values.
    ///
    /// # Errors
    ///
    /// [`GeoIdError::Empty`] for empty/whitespace input,
    /// [`GeoIdError::UnrecognizedShape`] for anything that is not one of
    /// the four shapes.
    pub fn new(value: impl Into<String>) -> Result<Self, GeoIdError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GeoIdError::Empty);
        }
        if shape_of(trimmed).is_none() {
            return Err(GeoIdError::UnrecognizedShape {
                id: trimmed.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The country root identifier, `ch`.
    pub fn country() -> Self {
        Self(COUNTRY_ID.to_string())
    }

    /// A canton identifier from its number (`1` … `26` in the seed data).
    pub fn canton(number: u16) -> Self {
        Self(number.to_string())
    }

    /// Synthesize a district identifier: `d-<canton>-<districtNo>`.
    ///
    /// # Errors
    ///
    /// Rejects a non-canton `canton` argument or a `district_no` that is
    /// not a non-empty all-digit string.
    pub fn district(canton: &GeoId, district_no: &str) -> Result<Self, GeoIdError> {
        let candidate = format!("d-{}-{}", canton.as_str(), district_no);
        if !canton.is_canton() || !is_digits(district_no) {
            return Err(GeoIdError::UnrecognizedShape { id: candidate });
        }
        Ok(Self(candidate))
    }

    /// Synthesize a community identifier: `m-<canton>-<raw>`.
    ///
    /// `raw` is the community's own id from the reference data (never its
    /// name). It must be non-empty and carry no surrounding whitespace; any
    /// interior characters, dashes included, are preserved verbatim.
    ///
    /// # Errors
    ///
    /// Rejects a non-canton `canton` argument or an empty/padded `raw`.
    pub fn community(canton: &GeoId, raw: &str) -> Result<Self, GeoIdError> {
        let candidate = format!("m-{}-{}", canton.as_str(), raw);
        if !canton.is_canton() || raw.is_empty() || raw.trim() != raw {
            return Err(GeoIdError::UnrecognizedShape { id: candidate });
        }
        Ok(Self(candidate))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The administrative level encoded by this identifier's shape.
    pub fn level(&self) -> GeoLevel {
        shape_of(&self.0).expect("validated at construction")
    }

    /// Whether this is the country root.
    pub fn is_country(&self) -> bool {
        self.level() == GeoLevel::Country
    }

    /// Whether this is a canton identifier.
    pub fn is_canton(&self) -> bool {
        self.level() == GeoLevel::Canton
    }

    /// Whether this is a district identifier.
    pub fn is_district(&self) -> bool {
        self.level() == GeoLevel::District
    }

    /// Whether this is a community identifier.
    pub fn is_community(&self) -> bool {
        self.level() == GeoLevel::Community
    }

    /// Decompose a district identifier into `(canton, districtNo)`.
    ///
    /// Returns `None` for any other shape.
    pub fn district_parts(&self) -> Option<(GeoId, String)> {
        let rest = self.0.strip_prefix("d-")?;
        let (canton, district_no) = rest.split_once('-')?;
        if !is_digits(canton) || !is_digits(district_no) {
            return None;
        }
        Some((GeoId(canton.to_string()), district_no.to_string()))
    }

    /// Decompose a community identifier into `(canton, raw)`.
    ///
    /// Returns `None` for any other shape.
    pub fn community_parts(&self) -> Option<(GeoId, String)> {
        let rest = self.0.strip_prefix("m-")?;
        let (canton, raw) = rest.split_once('-')?;
        if !is_digits(canton) || raw.is_empty() {
            return None;
        }
        Some((GeoId(canton.to_string()), raw.to_string()))
    }

    /// The canton an identifier belongs to: the id itself for cantons, the
    /// embedded canton for districts and communities, `None` for the
    /// country root.
    pub fn containing_canton(&self) -> Option<GeoId> {
        match self.level() {
            GeoLevel::Country => None,
            GeoLevel::Canton => Some(self.clone()),
            GeoLevel::District => self.district_parts().map(|(canton, _)| canton),
            GeoLevel::Community => self.community_parts().map(|(canton, _)| canton),
        }
    }
}

impl std::fmt::Display for GeoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for GeoId {
    type Err = GeoIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Classify a trimmed identifier string by shape, or `None` if it matches
/// no shape. Composite shapes require an all-digit canton group; district
/// numbers are all digits while community raw ids are unrestricted beyond
/// being non-empty.
fn shape_of(s: &str) -> Option<GeoLevel> {
    if s == COUNTRY_ID {
        return Some(GeoLevel::Country);
    }
    if is_digits(s) {
        return Some(GeoLevel::Canton);
    }
    if let Some(rest) = s.strip_prefix("d-") {
        if let Some((canton, district_no)) = rest.split_once('-') {
            if is_digits(canton) && is_digits(district_no) {
                return Some(GeoLevel::District);
            }
        }
        return None;
    }
    if let Some(rest) = s.strip_prefix("m-") {
        if let Some((canton, raw)) = rest.split_once('-') {
            if is_digits(canton) && !raw.is_empty() {
                return Some(GeoLevel::Community);
            }
        }
        return None;
    }
    None
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
