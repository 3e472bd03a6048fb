//! Dataset sources: where boundary feature collections come from.
//!
//! Three producers share one fetch shape. [`HttpDatasetSource`] talks to a
//! boundary server over `reqwest`, [`FileDatasetSource`] reads exported
//! GeoJSON from a directory, and [`MemoryDatasetSource`] serves collections
//! registered up front (the test workhorse, which also counts fetches so
//! deduplication is observable). [`DatasetSource`] is the closed union the
//! rest of the stack holds.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::collection::FeatureCollection;
use crate::error::GeodataError;

// ---------------------------------------------------------------------------
// Dataset kinds
// ---------------------------------------------------------------------------

/// The three boundary datasets the stack consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// The 26 canton boundaries.
    Cantons,
    /// District boundaries, nationwide.
    Districts,
    /// Community boundaries, nationwide.
    Communities,
}

impl DatasetKind {
    /// All dataset kinds, in coarse-to-fine order.
    pub const ALL: [DatasetKind; 3] = [
        DatasetKind::Cantons,
        DatasetKind::Districts,
        DatasetKind::Communities,
    ];

    /// Stable lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Cantons => "cantons",
            DatasetKind::Districts => "districts",
            DatasetKind::Communities => "communities",
        }
    }

    /// File name of the dataset inside an export directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            DatasetKind::Cantons => "cantons.geojson",
            DatasetKind::Districts => "districts.geojson",
            DatasetKind::Communities => "communities.geojson",
        }
    }

    /// Endpoint path of the dataset on a boundary server.
    pub fn endpoint_path(&self) -> String {
        format!("/geo/{}", self.file_name())
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// HTTP source
// ---------------------------------------------------------------------------

/// Fetches datasets from a boundary server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDatasetSource {
    client: reqwest::Client,
    /// Validated at construction, trailing slashes trimmed.
    base_url: String,
}

impl HttpDatasetSource {
    /// Default request timeout applied by [`HttpDatasetSource::new`].
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Build a source against `base_url` with the default timeout.
    pub fn new(base_url: &str) -> Result<Self, GeodataError> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    /// Build a source against `base_url` with an explicit request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, GeodataError> {
        let trimmed = base_url.trim_end_matches('/');
        Url::parse(trimmed).map_err(|e| GeodataError::Configuration {
            reason: format!("invalid base URL {trimmed:?}: {e}"),
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeodataError::Configuration {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: trimmed.to_string(),
        })
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch and decode one dataset.
    pub async fn fetch(&self, kind: DatasetKind) -> Result<FeatureCollection, GeodataError> {
        let url = format!("{}{}", self.base_url, kind.endpoint_path());
        tracing::debug!(dataset = %kind, %url, "fetching boundary dataset");

        let response = self.client.get(&url).send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                format!("request to {url} timed out")
            } else {
                e.to_string()
            };
            GeodataError::Transport { kind, reason }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeodataError::Http {
                kind,
                status: status.as_u16(),
                url,
            });
        }

        response
            .json::<FeatureCollection>()
            .await
            .map_err(|e| GeodataError::Decode {
                kind,
                reason: e.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// File source
// ---------------------------------------------------------------------------

/// Reads datasets from an export directory on disk.
///
/// Expects the conventional file layout: `<base_dir>/cantons.geojson` and
/// siblings, as produced by the boundary export tooling.
#[derive(Debug, Clone)]
pub struct FileDatasetSource {
    base_dir: PathBuf,
}

impl FileDatasetSource {
    /// Build a source reading from `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Read and decode one dataset file.
    pub async fn fetch(&self, kind: DatasetKind) -> Result<FeatureCollection, GeodataError> {
        let path = self.base_dir.join(kind.file_name());
        tracing::debug!(dataset = %kind, path = %path.display(), "reading boundary dataset");

        let bytes = tokio::fs::read(&path).await.map_err(|e| GeodataError::Io {
            kind,
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        serde_json::from_slice(&bytes).map_err(|e| GeodataError::Decode {
            kind,
            reason: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// In-memory source
// ---------------------------------------------------------------------------

/// Serves datasets registered at construction time.
///
/// Counts every fetch, so tests can assert that the caching layer above it
/// reached the source exactly once per dataset.
#[derive(Debug, Default)]
pub struct MemoryDatasetSource {
    datasets: HashMap<DatasetKind, FeatureCollection>,
    fetches: AtomicU64,
}

impl MemoryDatasetSource {
    /// An empty source; every fetch fails with `NotConfigured`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset, replacing any previous one of the same kind.
    pub fn with_dataset(mut self, kind: DatasetKind, collection: FeatureCollection) -> Self {
        self.datasets.insert(kind, collection);
        self
    }

    /// Number of fetches served so far, successful or not.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Return a clone of the registered dataset.
    pub async fn fetch(&self, kind: DatasetKind) -> Result<FeatureCollection, GeodataError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.datasets
            .get(&kind)
            .cloned()
            .ok_or(GeodataError::NotConfigured { kind })
    }
}

// ---------------------------------------------------------------------------
// Source union
// ---------------------------------------------------------------------------

/// The closed set of dataset producers the stack can be wired to.
#[derive(Debug)]
pub enum DatasetSource {
    /// Boundary server over HTTP.
    Http(HttpDatasetSource),
    /// Export directory on disk.
    File(FileDatasetSource),
    /// Collections registered in memory.
    Memory(MemoryDatasetSource),
}

impl DatasetSource {
    /// Fetch one dataset from whichever producer is configured.
    pub async fn fetch(&self, kind: DatasetKind) -> Result<FeatureCollection, GeodataError> {
        match self {
            DatasetSource::Http(source) => source.fetch(kind).await,
            DatasetSource::File(source) => source.fetch(kind).await,
            DatasetSource::Memory(source) => source.fetch(kind).await,
        }
    }
}

impl From<HttpDatasetSource> for DatasetSource {
    fn from(source: HttpDatasetSource) -> Self {
        DatasetSource::Http(source)
    }
}

impl From<FileDatasetSource> for DatasetSource {
    fn from(source: FileDatasetSource) -> Self {
        DatasetSource::File(source)
    }
}

impl From<MemoryDatasetSource> for DatasetSource {
    fn from(source: MemoryDatasetSource) -> Self {
        DatasetSource::Memory(source)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
