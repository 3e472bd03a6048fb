//! # helv-store — Seeded Hierarchy Store & Navigation
//!
//! ## Purpose
//! Holds the process-wide Swiss region tree. The tree starts life fully
//! seeded at the top (the country and all 26 cantons are compiled in, never
//! fetched) and grows downward on demand: expanding a canton or district
//! pulls the matching boundary dataset through [`helv_geodata::DatasetStore`]
//! and attaches the resulting child nodes.
//!
//! ## Design
//! Readers work on cheap snapshots. [`GeoStore::tree`] clones the tree under
//! a read lock, so navigation and rendering never contend with an expansion
//! in flight. Expansion itself fetches outside any lock and commits the new
//! nodes and the parent's child list in one write-locked step; a failed
//! dataset load therefore leaves the tree exactly as it was.

pub mod navigation;
pub mod store;

// Re-export primary types.
pub use navigation::GeoNavigator;
pub use store::{GeoStore, StoreError};
