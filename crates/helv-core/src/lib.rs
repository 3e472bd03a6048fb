//! # helv-core — Geographic Identifiers & Tree Model
//!
//! Foundational types shared by every crate in the Helvetia stack:
//!
//! - **Identifiers** ([`ids`]): [`GeoId`], a validated newtype covering the
//!   four identifier shapes of the Swiss administrative hierarchy (country,
//!   canton, district, community), and [`GeoLevel`], the strictly ordered
//!   level enum.
//!
//! - **Tree model** ([`tree`]): [`GeoNode`] and [`GeoTree`], the
//!   lazily-expanded region tree. Nodes are append-only; a node's child
//!   list grows from empty to fully populated exactly once.
//!
//! ## Design Principle
//!
//! Identifiers are parsed by shape, never by a stored tag. A `GeoId` that
//! exists is valid: construction and deserialization both route through the
//! same validator, so downstream code can derive a node's level from its id
//! alone.

pub mod ids;
pub mod tree;

// Re-export primary types.
pub use ids::{GeoId, GeoIdError, GeoLevel};
pub use tree::{GeoNode, GeoTree};
