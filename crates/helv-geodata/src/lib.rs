//! # helv-geodata — Swiss Administrative Dataset Layer
//!
//! ## Purpose
//! Owns everything between "a region id" and "the GeoJSON features that
//! describe its subdivisions": the feature collection model, the dataset
//! sources that produce collections (HTTP, filesystem, in-memory), the
//! deduplicating permanent cache in front of those sources, and the
//! builders that turn raw features into [`helv_core::GeoNode`] values.
//!
//! ## Design
//! Datasets are immutable snapshots. A collection, once fetched, is wrapped
//! in an [`std::sync::Arc`] and cached for the lifetime of the process;
//! there is no invalidation path because the upstream boundary files change
//! on a yearly cadence at most. Fetch failures are never cached, so a
//! transient outage at startup does not poison later retries.
//!
//! Feature properties tolerate schema drift: every upstream field is held
//! as an optional raw JSON value and normalised on access, so one malformed
//! feature can degrade gracefully instead of failing the whole collection.

pub mod builders;
pub mod collection;
pub mod error;
pub mod source;
pub mod store;

// Re-export primary types.
pub use builders::BuiltNodes;
pub use collection::{Feature, FeatureCollection, FeatureProperties};
pub use error::GeodataError;
pub use source::{
    DatasetKind, DatasetSource, FileDatasetSource, HttpDatasetSource, MemoryDatasetSource,
};
pub use store::DatasetStore;
