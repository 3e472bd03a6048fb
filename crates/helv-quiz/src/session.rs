//! The per-round quiz session state machine.
//!
//! Sessions are values, not actors. Every transition consumes the old
//! session and returns the next one, and a transition called in the wrong
//! phase returns the session unchanged so stale UI events can never crash a
//! round. All visual effects are derived: a flash stores its absolute
//! expiry, the hint pulse is computed from the instant hint mode was
//! enabled, and the stopwatch freezes its value exactly once on the
//! transition to `done`.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{QuizMode, QuizTarget};

// ---------------------------------------------------------------------------
// Timing constants
// ---------------------------------------------------------------------------

/// How long the green confirmation flash stays visible.
pub const FLASH_CORRECT_MS: i64 = 420;
/// How long the red rejection flash stays visible.
pub const FLASH_WRONG_MS: i64 = 520;
/// Visible part of one hint pulse window.
pub const HINT_PULSE_ON_MS: i64 = 450;
/// Full length of one hint pulse window.
pub const HINT_PULSE_PERIOD_MS: i64 = 900;
/// Wrong attempts on one question before hint mode switches on.
pub const HINT_ATTEMPT_THRESHOLD: u32 = 3;
/// Suggested render cadence for embedders polling `visuals_at`. The session
/// itself owns no timer.
pub const STOPWATCH_TICK_MS: i64 = 250;

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Lifecycle phase of a quiz round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizPhase {
    /// No round; a mode has not been chosen.
    Idle,
    /// Targets are being fetched.
    Loading,
    /// Targets loaded, waiting for the player to begin.
    Ready,
    /// Round in progress.
    Playing,
    /// Round over; counters and clock are frozen.
    Done,
}

impl QuizPhase {
    /// Stable lowercase name of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizPhase::Idle => "idle",
            QuizPhase::Loading => "loading",
            QuizPhase::Ready => "ready",
            QuizPhase::Playing => "playing",
            QuizPhase::Done => "done",
        }
    }

    /// Whether the round has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuizPhase::Done)
    }
}

impl std::fmt::Display for QuizPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Visual state
// ---------------------------------------------------------------------------

/// Color of a transient flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashColor {
    /// Correct answer confirmation.
    Green,
    /// Wrong answer rejection.
    Red,
    /// Hint pulse.
    Blue,
}

/// Persistent fill of a resolved region, encoding its attempt bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionFill {
    /// Solved on the first attempt.
    White,
    /// Solved on the second attempt.
    Yellow,
    /// Solved on the third attempt.
    Orange,
    /// Solved under hint, or permanently marked wrong.
    Red,
}

impl RegionFill {
    /// Fill for a region solved after the given number of wrong attempts.
    pub fn for_prior_attempts(attempts: u32) -> Self {
        match attempts {
            0 => RegionFill::White,
            1 => RegionFill::Yellow,
            2 => RegionFill::Orange,
            _ => RegionFill::Red,
        }
    }

    /// Stable lowercase name of the fill.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionFill::White => "white",
            RegionFill::Yellow => "yellow",
            RegionFill::Orange => "orange",
            RegionFill::Red => "red",
        }
    }
}

/// A transient region highlight with an absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    /// Region being flashed.
    pub region_id: String,
    /// Flash color.
    pub color: FlashColor,
    /// Instant the flash stops being visible.
    pub until: DateTime<Utc>,
}

/// Stored visual state of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizVisuals {
    /// Latest flash, possibly already expired.
    pub flash: Option<Flash>,
    /// Instant hint mode was enabled for the current question; hint mode is
    /// active iff this is `Some`.
    pub hint_since: Option<DateTime<Utc>>,
    /// Persistent per-region fills. A region with an entry here is resolved
    /// and ignores further clicks for the rest of the round.
    pub locked_fills: HashMap<String, RegionFill>,
}

/// What the map should show at one instant, derived by
/// [`QuizSession::visuals_at`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisualFrame {
    /// Region currently flashing, if any.
    pub flash_id: Option<String>,
    /// Color of that flash.
    pub flash_color: Option<FlashColor>,
    /// Region the map should lock onto while hint mode is active.
    pub lock_to_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Stopwatch
// ---------------------------------------------------------------------------

/// Round clock. Freezes exactly once, on the transition to `done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stopwatch {
    /// Not started.
    Idle,
    /// Running since the contained instant.
    Running {
        /// Instant the round began.
        started_at: DateTime<Utc>,
    },
    /// Frozen at the contained value.
    Stopped {
        /// Final elapsed milliseconds.
        elapsed_ms: i64,
    },
}

impl Stopwatch {
    /// Start measuring from `now`.
    pub fn start(now: DateTime<Utc>) -> Self {
        Stopwatch::Running { started_at: now }
    }

    /// Freeze the clock. A stopped clock stays at its frozen value.
    pub fn stop(self, now: DateTime<Utc>) -> Self {
        match self {
            Stopwatch::Idle => Stopwatch::Stopped { elapsed_ms: 0 },
            Stopwatch::Running { started_at } => Stopwatch::Stopped {
                elapsed_ms: (now - started_at).num_milliseconds().max(0),
            },
            stopped @ Stopwatch::Stopped { .. } => stopped,
        }
    }

    /// Elapsed milliseconds at `now`; 0 before start, frozen after stop.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        match self {
            Stopwatch::Idle => 0,
            Stopwatch::Running { started_at } => {
                (now - *started_at).num_milliseconds().max(0)
            }
            Stopwatch::Stopped { elapsed_ms } => *elapsed_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One play-through of a quiz mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    /// Unique id of this round.
    pub id: Uuid,
    /// The mode being played.
    pub mode: QuizMode,
    /// Current lifecycle phase.
    pub phase: QuizPhase,
    /// Shuffled targets for this round.
    pub targets: Vec<QuizTarget>,
    /// Position of the current question; equals `targets.len()` once done.
    pub index: usize,
    /// Targets solved on the first attempt.
    pub correct_count: u32,
    /// Total wrong clicks across the round.
    pub wrong_count: u32,
    /// Wrong clicks on the current question.
    pub attempts_on_current: u32,
    /// Stored visual state.
    pub visuals: QuizVisuals,
    /// Round clock.
    pub stopwatch: Stopwatch,
}

impl QuizSession {
    /// Fresh session for a mode, in `loading` with everything zeroed.
    pub fn start(mode: QuizMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            phase: QuizPhase::Loading,
            targets: Vec::new(),
            index: 0,
            correct_count: 0,
            wrong_count: 0,
            attempts_on_current: 0,
            visuals: QuizVisuals::default(),
            stopwatch: Stopwatch::Idle,
        }
    }

    /// Accept the (already shuffled) target list. `ready` when non-empty,
    /// straight to `done` when the mode has no targets.
    pub fn targets_loaded(mut self, targets: Vec<QuizTarget>) -> Self {
        if self.phase != QuizPhase::Loading {
            return self;
        }
        self.phase = if targets.is_empty() {
            QuizPhase::Done
        } else {
            QuizPhase::Ready
        };
        self.targets = targets;
        self
    }

    /// Record that the target list could not be loaded. Terminal, not an
    /// error: the player returns to mode selection.
    pub fn load_failed(mut self) -> Self {
        if self.phase != QuizPhase::Loading {
            return self;
        }
        self.targets.clear();
        self.phase = QuizPhase::Done;
        self
    }

    /// Start the round: the clock begins at `now`.
    pub fn begin(mut self, now: DateTime<Utc>) -> Self {
        if self.phase != QuizPhase::Ready || self.targets.is_empty() {
            return self;
        }
        self.stopwatch = Stopwatch::start(now);
        self.phase = QuizPhase::Playing;
        self
    }

    /// Process a click on `clicked` at `now`.
    ///
    /// Clicks outside `playing`, on a region already carrying a persistent
    /// fill, or while the current target is malformed are ignored entirely:
    /// no attempt is counted and no flash is set.
    pub fn answer(mut self, clicked: &str, now: DateTime<Utc>) -> Self {
        if self.phase != QuizPhase::Playing {
            return self;
        }
        let correct = match self.current_target().and_then(QuizTarget::answer_id) {
            Some(id) => id.as_str().to_string(),
            None => return self,
        };
        if self.visuals.locked_fills.contains_key(clicked) {
            return self;
        }

        if clicked == correct {
            self.visuals.locked_fills.insert(
                correct.clone(),
                RegionFill::for_prior_attempts(self.attempts_on_current),
            );
            if self.attempts_on_current == 0 {
                self.correct_count += 1;
            }
            self.attempts_on_current = 0;
            self.visuals.hint_since = None;
            self.index += 1;

            if self.index >= self.targets.len() {
                self.stopwatch = self.stopwatch.stop(now);
                self.visuals.flash = None;
                self.phase = QuizPhase::Done;
            } else {
                self.visuals.flash = Some(Flash {
                    region_id: correct,
                    color: FlashColor::Green,
                    until: now + Duration::milliseconds(FLASH_CORRECT_MS),
                });
            }
        } else {
            self.wrong_count += 1;
            self.attempts_on_current += 1;
            let hint_was_active = self.visuals.hint_since.is_some();
            if !hint_was_active && self.attempts_on_current >= HINT_ATTEMPT_THRESHOLD {
                self.visuals.hint_since = Some(now);
            }
            if hint_was_active {
                // A wrong click under hint marks the region for good.
                self.visuals
                    .locked_fills
                    .insert(clicked.to_string(), RegionFill::Red);
            }
            self.visuals.flash = Some(Flash {
                region_id: clicked.to_string(),
                color: FlashColor::Red,
                until: now + Duration::milliseconds(FLASH_WRONG_MS),
            });
        }
        self
    }

    /// Manually switch hint mode on or off for the current question.
    pub fn toggle_hint(mut self, now: DateTime<Utc>) -> Self {
        if self.phase != QuizPhase::Playing {
            return self;
        }
        self.visuals.hint_since = match self.visuals.hint_since {
            Some(_) => None,
            None => Some(now),
        };
        self
    }

    /// The question currently being asked, `None` once the round is over.
    pub fn current_target(&self) -> Option<&QuizTarget> {
        self.targets.get(self.index)
    }

    /// Progress as `"current/total"`, clamped so the final answer reads
    /// `"n/n"`; `"0/0"` for an empty round.
    pub fn progress_label(&self) -> String {
        let total = self.targets.len();
        if total == 0 {
            return "0/0".to_string();
        }
        format!("{}/{}", (self.index + 1).min(total), total)
    }

    /// Elapsed round time at `now`.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        self.stopwatch.elapsed_ms(now)
    }

    /// Derive what the map should show at `now`.
    ///
    /// An unexpired stored flash wins. Otherwise, while hint mode is active
    /// the correct region pulses blue: visible for the first
    /// [`HINT_PULSE_ON_MS`] of every [`HINT_PULSE_PERIOD_MS`] window
    /// measured from the hint start. Hint mode also locks the map onto the
    /// correct region. Persistent fills live in
    /// [`QuizVisuals::locked_fills`] and are not repeated here.
    pub fn visuals_at(&self, now: DateTime<Utc>) -> VisualFrame {
        let mut frame = VisualFrame::default();

        if let Some(flash) = &self.visuals.flash {
            if flash.until > now {
                frame.flash_id = Some(flash.region_id.clone());
                frame.flash_color = Some(flash.color);
            }
        }

        if let Some(hint_since) = self.visuals.hint_since {
            if let Some(correct) = self.current_target().and_then(QuizTarget::answer_id) {
                let correct = correct.as_str().to_string();
                frame.lock_to_id = Some(correct.clone());
                if frame.flash_id.is_none() {
                    let into_window =
                        (now - hint_since).num_milliseconds().max(0) % HINT_PULSE_PERIOD_MS;
                    if into_window < HINT_PULSE_ON_MS {
                        frame.flash_id = Some(correct);
                        frame.flash_color = Some(FlashColor::Blue);
                    }
                }
            }
        }
        frame
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Shuffle a target list in place with a uniform Fisher-Yates pass.
pub fn shuffle_targets<R: Rng + ?Sized>(targets: &mut [QuizTarget], rng: &mut R) {
    targets.shuffle(rng);
}

/// Render elapsed milliseconds as a zero-padded `MM:SS` label.
pub fn format_ms(elapsed_ms: i64) -> String {
    let total_seconds = elapsed_ms.max(0) / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
