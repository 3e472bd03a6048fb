//! The repository seam that supplies quiz modes and targets.
//!
//! The trait is async and object-safe so engines can hold `Arc<dyn
//! QuizRepository>` and tests can swap in failing or scripted
//! implementations. [`MemoryQuizRepository`] is the production
//! implementation for the built-in catalogue: one canton mode whose targets
//! are derived from the cantons dataset and memoized for the process
//! lifetime.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use helv_core::GeoId;
use helv_geodata::{DatasetKind, DatasetStore, GeodataError};

use crate::model::{QuizMode, QuizTarget};

/// Mode id of the built-in "find the canton" quiz.
pub const CH_CANTONS_MODE_ID: &str = "ch-cantons";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure while reading quiz modes or targets.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuizError {
    /// The repository backend failed.
    #[error("quiz repository failure: {reason}")]
    Repository {
        /// Description of the backend failure.
        reason: String,
    },

    /// A boundary dataset needed for target building could not be loaded.
    #[error("failed to load {kind} dataset for quiz targets: {reason}")]
    Dataset {
        /// Dataset whose load failed.
        kind: DatasetKind,
        /// Description of the underlying failure.
        reason: String,
    },

    /// The requested mode does not exist. Available to implementations that
    /// prefer failing over the empty-target-list policy.
    #[error("unknown quiz mode: {id}")]
    UnknownMode {
        /// The mode id that was requested.
        id: String,
    },
}

impl QuizError {
    fn dataset(kind: DatasetKind, e: GeodataError) -> Self {
        QuizError::Dataset {
            kind,
            reason: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Source of quiz modes and their target lists.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// All modes the player can choose from.
    async fn list_modes(&self) -> Result<Vec<QuizMode>, QuizError>;

    /// A single mode by id, `None` when unknown.
    async fn get_mode(&self, mode_id: &str) -> Result<Option<QuizMode>, QuizError>;

    /// The raw (unshuffled) target list of a mode. An unknown mode yields
    /// an empty list, which the session treats as a terminal round.
    async fn load_targets(&self, mode_id: &str) -> Result<Vec<QuizTarget>, QuizError>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// Built-in mode catalogue backed by the boundary datasets.
pub struct MemoryQuizRepository {
    datasets: Arc<DatasetStore>,
    /// Canton targets, built once from the cantons dataset.
    canton_targets: RwLock<Option<Vec<QuizTarget>>>,
}

impl MemoryQuizRepository {
    /// Build the catalogue over a dataset cache.
    pub fn new(datasets: Arc<DatasetStore>) -> Self {
        Self {
            datasets,
            canton_targets: RwLock::new(None),
        }
    }

    fn builtin_modes() -> Vec<QuizMode> {
        vec![QuizMode {
            id: CH_CANTONS_MODE_ID.to_string(),
            title: "Kantone – Schweiz".to_string(),
            description: "Finde den richtigen Kanton auf der Karte".to_string(),
            start_scope_id: GeoId::country(),
        }]
    }

    /// One target per canton, sorted by canton number, memoized.
    async fn canton_targets(&self) -> Result<Vec<QuizTarget>, QuizError> {
        if let Some(cached) = self.canton_targets.read().as_ref() {
            return Ok(cached.clone());
        }

        let collection = self
            .datasets
            .load(DatasetKind::Cantons)
            .await
            .map_err(|e| QuizError::dataset(DatasetKind::Cantons, e))?;

        let mut numbered: Vec<(u16, QuizTarget)> = Vec::new();
        for feature in &collection.features {
            let props = &feature.properties;
            let Some(raw_number) = props.canton_number_any() else {
                tracing::debug!("skipping canton feature without number");
                continue;
            };
            let Ok(number) = raw_number.parse::<u16>() else {
                tracing::debug!(number = %raw_number, "skipping canton feature with non-numeric number");
                continue;
            };
            let name = props
                .canton_display_name()
                .unwrap_or_else(|| format!("Kanton {number}"));
            numbered.push((
                number,
                QuizTarget {
                    name,
                    path: vec![GeoId::canton(number)],
                },
            ));
        }
        numbered.sort_by_key(|(number, _)| *number);
        numbered.dedup_by_key(|(number, _)| *number);
        let targets: Vec<QuizTarget> = numbered.into_iter().map(|(_, target)| target).collect();

        let mut slot = self.canton_targets.write();
        if slot.is_none() {
            *slot = Some(targets.clone());
        }
        Ok(targets)
    }
}

#[async_trait]
impl QuizRepository for MemoryQuizRepository {
    async fn list_modes(&self) -> Result<Vec<QuizMode>, QuizError> {
        Ok(Self::builtin_modes())
    }

    async fn get_mode(&self, mode_id: &str) -> Result<Option<QuizMode>, QuizError> {
        Ok(Self::builtin_modes()
            .into_iter()
            .find(|mode| mode.id == mode_id))
    }

    async fn load_targets(&self, mode_id: &str) -> Result<Vec<QuizTarget>, QuizError> {
        if mode_id == CH_CANTONS_MODE_ID {
            return self.canton_targets().await;
        }
        tracing::debug!(mode = %mode_id, "unknown quiz mode, returning empty target list");
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
