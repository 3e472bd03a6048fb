//! # helv-quiz — Region Quiz Sessions
//!
//! ## Purpose
//! Drives the guessing game over the region hierarchy: quiz modes and their
//! target lists, the per-round session state machine, derived map-rendering
//! context, and the repository seam that supplies targets.
//!
//! ## Design
//! A [`QuizSession`] is an immutable value mutated only by consuming
//! transitions: the old session goes in, the next one comes out, and a call
//! in the wrong phase hands the session back unchanged. The session owns no
//! timers. Flashes carry an absolute deadline and the hint pulse is a
//! cadence computed from its start instant, so every recurring visual is a
//! pure function of an injected `now` and a dropped session cannot leak a
//! stale callback.
//!
//! [`QuizEngine`] adds the async edges: loading targets through a
//! [`QuizRepository`], shuffling them with its own seedable RNG, and holding
//! the `Option<QuizSession>` that distinguishes "no round" from every live
//! phase.

pub mod engine;
pub mod map_context;
pub mod model;
pub mod repository;
pub mod session;

// Re-export primary types.
pub use engine::QuizEngine;
pub use map_context::MapContext;
pub use model::{QuizMode, QuizTarget};
pub use repository::{MemoryQuizRepository, QuizError, QuizRepository, CH_CANTONS_MODE_ID};
pub use session::{
    FlashColor, QuizPhase, QuizSession, QuizVisuals, RegionFill, Stopwatch, VisualFrame,
    FLASH_CORRECT_MS, FLASH_WRONG_MS, HINT_ATTEMPT_THRESHOLD, HINT_PULSE_ON_MS,
    HINT_PULSE_PERIOD_MS, STOPWATCH_TICK_MS,
};
