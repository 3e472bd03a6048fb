//! Quiz modes and targets.

use serde::{Deserialize, Serialize};

use helv_core::GeoId;

/// A selectable quiz configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizMode {
    /// Stable mode identifier, e.g. `ch-cantons`.
    pub id: String,
    /// Display title.
    pub title: String,
    /// One-line description shown on the mode card.
    pub description: String,
    /// Hierarchy scope the quiz map starts on.
    pub start_scope_id: GeoId,
}

/// One thing to find on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizTarget {
    /// Name shown in the question prompt.
    pub name: String,
    /// Hierarchy path to the target, ordered shallow to deep.
    pub path: Vec<GeoId>,
}

impl QuizTarget {
    /// The region that counts as the correct answer: the deepest path
    /// element. `None` for a malformed target with an empty path.
    pub fn answer_id(&self) -> Option<&GeoId> {
        self.path.last()
    }
}
