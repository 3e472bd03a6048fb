//! Derived map-rendering context for one question.

use serde::{Deserialize, Serialize};

use helv_core::{GeoId, GeoLevel};

use crate::model::QuizTarget;

/// What part of the hierarchy the quiz map should render for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapContext {
    /// Region whose children the map shows.
    pub scope_id: GeoId,
    /// Level of the scope, not of the answer.
    pub level: GeoLevel,
    /// The region that counts as the correct answer, if there is a target.
    pub answer_id: Option<GeoId>,
}

impl MapContext {
    /// Derive the context for a target.
    ///
    /// The scope is the answer's parent step in the target path; a
    /// single-step path has no parent step, so the mode's start scope is
    /// used instead. With no target at all (round over, or not started) the
    /// map falls back to the start scope with no answer.
    pub fn for_target(target: Option<&QuizTarget>, fallback_scope: &GeoId) -> Self {
        let path = target.map(|t| t.path.as_slice()).unwrap_or(&[]);
        match path.last() {
            None => Self {
                scope_id: fallback_scope.clone(),
                level: fallback_scope.level(),
                answer_id: None,
            },
            Some(answer) => {
                let scope_id = if path.len() >= 2 {
                    path[path.len() - 2].clone()
                } else {
                    fallback_scope.clone()
                };
                Self {
                    level: scope_id.level(),
                    scope_id,
                    answer_id: Some(answer.clone()),
                }
            }
        }
    }
}
