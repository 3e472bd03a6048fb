//! Error taxonomy for dataset retrieval.
//!
//! Variants carry string reasons rather than wrapped source errors so the
//! type stays [`Clone`]: the dataset store broadcasts one fetch outcome to
//! every caller waiting on the same dataset, and each of them receives an
//! owned copy.

use thiserror::Error;

use crate::source::DatasetKind;

/// Failure while retrieving or decoding a boundary dataset.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeodataError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("transport failure while fetching {kind} dataset: {reason}")]
    Transport {
        /// Dataset that was being fetched.
        kind: DatasetKind,
        /// Transport-level description of the failure.
        reason: String,
    },

    /// The endpoint answered with a non-success status.
    #[error("{kind} dataset request to {url} returned status {status}")]
    Http {
        /// Dataset that was being fetched.
        kind: DatasetKind,
        /// HTTP status code of the response.
        status: u16,
        /// Full URL of the failing request.
        url: String,
    },

    /// The response body was not a decodable feature collection.
    #[error("failed to decode {kind} dataset: {reason}")]
    Decode {
        /// Dataset that was being decoded.
        kind: DatasetKind,
        /// Decoder description of the failure.
        reason: String,
    },

    /// A dataset file could not be read from disk.
    #[error("failed to read {kind} dataset from {path}: {reason}")]
    Io {
        /// Dataset that was being read.
        kind: DatasetKind,
        /// Path of the file that failed.
        path: String,
        /// Filesystem description of the failure.
        reason: String,
    },

    /// An in-memory source has no dataset registered for the kind.
    #[error("no {kind} dataset registered on in-memory source")]
    NotConfigured {
        /// Dataset that was requested.
        kind: DatasetKind,
    },

    /// The source itself is misconfigured (for example a malformed base URL).
    #[error("dataset source misconfigured: {reason}")]
    Configuration {
        /// Description of the configuration problem.
        reason: String,
    },
}
