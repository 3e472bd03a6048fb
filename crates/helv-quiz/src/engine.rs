//! Async orchestration of quiz rounds.
//!
//! The engine owns the optional current session, the repository handle, and
//! the RNG that shuffles each round. Transitions delegate to the pure
//! session methods; the engine's own job is the async edge (loading
//! targets), the per-start shuffle, and mapping "no session" onto the
//! `idle` phase for readers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::map_context::MapContext;
use crate::model::{QuizMode, QuizTarget};
use crate::repository::{QuizError, QuizRepository};
use crate::session::{
    format_ms, shuffle_targets, QuizPhase, QuizSession, VisualFrame,
};

/// Driver for one player's quiz rounds.
pub struct QuizEngine {
    repository: Arc<dyn QuizRepository>,
    session: Option<QuizSession>,
    rng: StdRng,
}

impl QuizEngine {
    /// Engine with an entropy-seeded RNG.
    pub fn new(repository: Arc<dyn QuizRepository>) -> Self {
        Self::with_rng(repository, StdRng::from_entropy())
    }

    /// Engine with a caller-provided RNG, for deterministic shuffles in
    /// tests.
    pub fn with_rng(repository: Arc<dyn QuizRepository>, rng: StdRng) -> Self {
        Self {
            repository,
            session: None,
            rng,
        }
    }

    /// The modes the player can choose from.
    pub async fn modes(&self) -> Result<Vec<QuizMode>, QuizError> {
        self.repository.list_modes().await
    }

    /// Start a round for a mode: fresh session, targets loaded and
    /// shuffled.
    ///
    /// Never fails: a repository error is logged and turns the session
    /// terminal, and the player recovers by picking a mode again.
    pub async fn start_mode(&mut self, mode: QuizMode) {
        let mode_id = mode.id.clone();
        self.session = Some(QuizSession::start(mode));

        match self.repository.load_targets(&mode_id).await {
            Ok(mut targets) => {
                shuffle_targets(&mut targets, &mut self.rng);
                self.apply(|session| session.targets_loaded(targets));
            }
            Err(e) => {
                tracing::warn!(mode = %mode_id, error = %e, "failed to load quiz targets");
                self.apply(QuizSession::load_failed);
            }
        }
    }

    /// Begin the current round at `now`.
    pub fn begin(&mut self, now: DateTime<Utc>) {
        self.apply(|session| session.begin(now));
    }

    /// Process a map click at `now`.
    pub fn answer(&mut self, clicked: &str, now: DateTime<Utc>) {
        self.apply(|session| session.answer(clicked, now));
    }

    /// Toggle hint mode at `now`.
    pub fn toggle_hint(&mut self, now: DateTime<Utc>) {
        self.apply(|session| session.toggle_hint(now));
    }

    /// Re-run the current mode from scratch: fresh shuffle, fresh counters.
    /// No-op without an active session.
    pub async fn restart(&mut self) {
        let Some(mode) = self.session.as_ref().map(|session| session.mode.clone()) else {
            return;
        };
        self.start_mode(mode).await;
    }

    /// Abandon the round and return to mode selection.
    pub fn back_to_modes(&mut self) {
        self.session = None;
    }

    /// Current phase; `idle` when no round exists.
    pub fn phase(&self) -> QuizPhase {
        self.session
            .as_ref()
            .map_or(QuizPhase::Idle, |session| session.phase)
    }

    /// The current session, if a round exists.
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    /// The question currently being asked.
    pub fn current_target(&self) -> Option<&QuizTarget> {
        self.session
            .as_ref()
            .and_then(QuizSession::current_target)
    }

    /// Map-rendering context for the current question.
    pub fn map_context(&self) -> Option<MapContext> {
        self.session.as_ref().map(|session| {
            MapContext::for_target(session.current_target(), &session.mode.start_scope_id)
        })
    }

    /// Progress label, `"0/0"` without a round.
    pub fn progress_label(&self) -> String {
        self.session
            .as_ref()
            .map_or_else(|| "0/0".to_string(), QuizSession::progress_label)
    }

    /// Elapsed round time at `now`, 0 without a round.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        self.session
            .as_ref()
            .map_or(0, |session| session.elapsed_ms(now))
    }

    /// Elapsed round time as a zero-padded `MM:SS` label.
    pub fn time_label(&self, now: DateTime<Utc>) -> String {
        format_ms(self.elapsed_ms(now))
    }

    /// Derived map visuals at `now`.
    pub fn visuals_at(&self, now: DateTime<Utc>) -> VisualFrame {
        self.session
            .as_ref()
            .map_or_else(VisualFrame::default, |session| session.visuals_at(now))
    }

    fn apply(&mut self, transition: impl FnOnce(QuizSession) -> QuizSession) {
        if let Some(session) = self.session.take() {
            self.session = Some(transition(session));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use helv_core::{GeoId, GeoLevel};
    use helv_geodata::{DatasetKind, DatasetStore, FeatureCollection, MemoryDatasetSource};
    use serde_json::json;

    use crate::repository::{MemoryQuizRepository, CH_CANTONS_MODE_ID};

    fn canton_repository() -> Arc<MemoryQuizRepository> {
        let cantons: FeatureCollection = serde_json::from_value(json!({
            "features": [
                { "properties": { "id": 1, "name": "Zürich" } },
                { "properties": { "id": 2, "name": "Bern" } },
                { "properties": { "id": 3, "name": "Luzern" } }
            ]
        }))
        .unwrap();
        Arc::new(MemoryQuizRepository::new(Arc::new(DatasetStore::new(
            MemoryDatasetSource::new().with_dataset(DatasetKind::Cantons, cantons),
        ))))
    }

    async fn canton_mode(repository: &MemoryQuizRepository) -> QuizMode {
        repository
            .get_mode(CH_CANTONS_MODE_ID)
            .await
            .unwrap()
            .unwrap()
    }

    fn seeded_engine(seed: u64) -> QuizEngine {
        QuizEngine::with_rng(canton_repository(), StdRng::seed_from_u64(seed))
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn at(offset_ms: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(offset_ms)
    }

    struct FailingRepository;

    #[async_trait]
    impl QuizRepository for FailingRepository {
        async fn list_modes(&self) -> Result<Vec<QuizMode>, QuizError> {
            Err(QuizError::Repository {
                reason: "backend offline".to_string(),
            })
        }

        async fn get_mode(&self, _mode_id: &str) -> Result<Option<QuizMode>, QuizError> {
            Err(QuizError::Repository {
                reason: "backend offline".to_string(),
            })
        }

        async fn load_targets(&self, _mode_id: &str) -> Result<Vec<QuizTarget>, QuizError> {
            Err(QuizError::Repository {
                reason: "backend offline".to_string(),
            })
        }
    }

    // ── starting rounds ──

    #[tokio::test]
    async fn idle_until_a_mode_is_started() {
        let engine = seeded_engine(1);

        assert_eq!(engine.phase(), QuizPhase::Idle);
        assert!(engine.session().is_none());
        assert_eq!(engine.progress_label(), "0/0");
        assert_eq!(engine.elapsed_ms(t0()), 0);
        assert_eq!(engine.time_label(t0()), "00:00");
        assert_eq!(engine.visuals_at(t0()), VisualFrame::default());
        assert!(engine.map_context().is_none());
    }

    #[tokio::test]
    async fn start_mode_loads_and_shuffles_targets() {
        let repository = canton_repository();
        let mode = canton_mode(&repository).await;
        let mut engine = QuizEngine::with_rng(repository, StdRng::seed_from_u64(1));

        engine.start_mode(mode).await;

        assert_eq!(engine.phase(), QuizPhase::Ready);
        let session = engine.session().unwrap();
        assert_eq!(session.targets.len(), 3);
        let mut names: Vec<&str> = session.targets.iter().map(|t| t.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Bern", "Luzern", "Zürich"]);
    }

    #[tokio::test]
    async fn the_shuffle_is_deterministic_under_a_seeded_rng() {
        let repository = canton_repository();
        let mode = canton_mode(&repository).await;

        // The engine shuffles the sorted raw list with its own RNG; an
        // identically seeded RNG applied by hand must agree.
        let mut expected = repository.load_targets(CH_CANTONS_MODE_ID).await.unwrap();
        shuffle_targets(&mut expected, &mut StdRng::seed_from_u64(42));

        let mut engine = QuizEngine::with_rng(
            Arc::<MemoryQuizRepository>::clone(&repository),
            StdRng::seed_from_u64(42),
        );
        engine.start_mode(mode).await;

        assert_eq!(engine.session().unwrap().targets, expected);
    }

    #[tokio::test]
    async fn every_start_draws_a_fresh_shuffle() {
        let repository = canton_repository();
        let mode = canton_mode(&repository).await;

        let raw = repository.load_targets(CH_CANTONS_MODE_ID).await.unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut first_expected = raw.clone();
        shuffle_targets(&mut first_expected, &mut rng);
        let mut second_expected = raw.clone();
        shuffle_targets(&mut second_expected, &mut rng);

        let mut engine = QuizEngine::with_rng(
            Arc::<MemoryQuizRepository>::clone(&repository),
            StdRng::seed_from_u64(7),
        );
        engine.start_mode(mode.clone()).await;
        assert_eq!(engine.session().unwrap().targets, first_expected);

        engine.start_mode(mode).await;
        // The RNG advanced: the second round consumed the next draw.
        assert_eq!(engine.session().unwrap().targets, second_expected);
    }

    #[tokio::test]
    async fn unknown_mode_ends_in_an_empty_terminal_round() {
        let mut engine = seeded_engine(1);
        let mode = QuizMode {
            id: "moon-craters".to_string(),
            title: "Mondkrater".to_string(),
            description: "gibt es nicht".to_string(),
            start_scope_id: GeoId::country(),
        };

        engine.start_mode(mode).await;

        assert_eq!(engine.phase(), QuizPhase::Done);
        assert_eq!(engine.progress_label(), "0/0");
    }

    #[tokio::test]
    async fn repository_failure_turns_the_session_terminal() {
        let mut engine = QuizEngine::with_rng(
            Arc::new(FailingRepository),
            StdRng::seed_from_u64(1),
        );
        let mode = QuizMode {
            id: "ch-cantons".to_string(),
            title: "Kantone – Schweiz".to_string(),
            description: "Finde den richtigen Kanton auf der Karte".to_string(),
            start_scope_id: GeoId::country(),
        };

        engine.start_mode(mode).await;

        assert_eq!(engine.phase(), QuizPhase::Done);
        let session = engine.session().unwrap();
        assert!(session.targets.is_empty());
    }

    // ── playing through ──

    #[tokio::test]
    async fn a_full_round_flows_through_the_engine() {
        let repository = canton_repository();
        let mode = canton_mode(&repository).await;
        let mut engine = QuizEngine::with_rng(repository, StdRng::seed_from_u64(3));

        engine.start_mode(mode).await;
        engine.begin(t0());
        assert_eq!(engine.phase(), QuizPhase::Playing);
        assert_eq!(engine.progress_label(), "1/3");

        // Solve the three questions in whatever order the shuffle chose.
        let answers: Vec<String> = engine
            .session()
            .unwrap()
            .targets
            .iter()
            .map(|t| t.path[0].as_str().to_string())
            .collect();
        engine.answer(&answers[0], at(1_000));
        assert_eq!(engine.progress_label(), "2/3");
        engine.answer(&answers[1], at(2_000));
        engine.answer(&answers[2], at(62_000));

        assert_eq!(engine.phase(), QuizPhase::Done);
        let session = engine.session().unwrap();
        assert_eq!(session.correct_count, 3);
        assert_eq!(engine.progress_label(), "3/3");
        // Frozen at the final answer: 62 seconds.
        assert_eq!(engine.time_label(at(300_000)), "01:02");
    }

    #[tokio::test]
    async fn map_context_follows_the_current_question() {
        let repository = canton_repository();
        let mode = canton_mode(&repository).await;
        let mut engine = QuizEngine::with_rng(repository, StdRng::seed_from_u64(3));

        engine.start_mode(mode).await;
        engine.begin(t0());

        let context = engine.map_context().unwrap();
        assert_eq!(context.scope_id, GeoId::country());
        assert_eq!(context.level, GeoLevel::Country);
        assert_eq!(
            context.answer_id.as_ref(),
            engine.current_target().unwrap().answer_id(),
        );
    }

    // ── restart & abandon ──

    #[tokio::test]
    async fn restart_reruns_the_same_mode_fresh() {
        let repository = canton_repository();
        let mode = canton_mode(&repository).await;
        let mut engine = QuizEngine::with_rng(repository, StdRng::seed_from_u64(5));

        engine.start_mode(mode).await;
        engine.begin(t0());
        let answers: Vec<String> = engine
            .session()
            .unwrap()
            .targets
            .iter()
            .map(|t| t.path[0].as_str().to_string())
            .collect();
        for (i, answer) in answers.iter().enumerate() {
            engine.answer(answer, at((i as i64 + 1) * 1_000));
        }
        assert_eq!(engine.phase(), QuizPhase::Done);
        let finished_id = engine.session().unwrap().id;

        engine.restart().await;

        assert_eq!(engine.phase(), QuizPhase::Ready);
        let session = engine.session().unwrap();
        assert_ne!(session.id, finished_id);
        assert_eq!(session.mode.id, "ch-cantons");
        assert_eq!(session.correct_count, 0);
        assert_eq!(session.index, 0);
        assert_eq!(session.stopwatch, crate::session::Stopwatch::Idle);
    }

    #[tokio::test]
    async fn restart_without_a_session_is_a_no_op() {
        let mut engine = seeded_engine(1);
        engine.restart().await;
        assert_eq!(engine.phase(), QuizPhase::Idle);
        assert!(engine.session().is_none());
    }

    #[tokio::test]
    async fn back_to_modes_discards_the_round() {
        let repository = canton_repository();
        let mode = canton_mode(&repository).await;
        let mut engine = QuizEngine::with_rng(repository, StdRng::seed_from_u64(5));

        engine.start_mode(mode).await;
        engine.begin(t0());
        engine.back_to_modes();

        assert_eq!(engine.phase(), QuizPhase::Idle);
        assert!(engine.session().is_none());
        assert_eq!(engine.time_label(at(10_000)), "00:00");
        assert_eq!(engine.progress_label(), "0/0");
    }
}
