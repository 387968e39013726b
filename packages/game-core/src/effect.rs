//! Side effects the engine asks its host to perform.
//!
//! The engine never sleeps and never talks to clients. Each mutation pushes
//! effects into an outbox that the caller drains after every event.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{PlayerId, Target};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// State changed; send every connected client its snapshot.
    Publish,
    Narrate(String),
    /// Private result for the seer who just inspected.
    Inspection {
        seer_id: PlayerId,
        target_id: PlayerId,
        is_wolf: bool,
    },
    Schedule { alarm: Alarm, delay: Duration },
}

/// A single-fire continuation. Stale once the room has moved past the
/// transition it was scheduled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alarm {
    Advance { seq: u64, target: Target },
    ReopenVote { seq: u64 },
}

impl Alarm {
    pub fn seq(&self) -> u64 {
        match self {
            Alarm::Advance { seq, .. } | Alarm::ReopenVote { seq } => *seq,
        }
    }
}

/// Inclusive millisecond range a delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn fixed(ms: u64) -> Self {
        Self { min_ms: ms, max_ms: ms }
    }

    pub const fn between(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn sample(&self, rng: &mut dyn RngCore) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }

    fn scaled(&self, factor: f64) -> Self {
        let scale = |ms: u64| (ms as f64 * factor).round() as u64;
        Self {
            min_ms: scale(self.min_ms),
            max_ms: scale(self.max_ms),
        }
    }
}

/// Game-designed pauses between transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    pub after_action: DelayRange,
    pub game_start: DelayRange,
    pub night_start: DelayRange,
    pub night_resolve: DelayRange,
    pub announce: DelayRange,
    /// Pretend-to-wait when the role whose turn it is has no living holder.
    pub absent_role: DelayRange,
    pub tie_reopen: DelayRange,
    pub after_execution: DelayRange,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            after_action: DelayRange::fixed(1_200),
            game_start: DelayRange::fixed(3_000),
            night_start: DelayRange::fixed(3_000),
            night_resolve: DelayRange::between(3_000, 5_000),
            announce: DelayRange::fixed(3_000),
            absent_role: DelayRange::between(5_000, 25_000),
            tie_reopen: DelayRange::fixed(3_000),
            after_execution: DelayRange::fixed(3_000),
        }
    }
}

impl Timings {
    pub fn scaled(&self, factor: f64) -> Self {
        let factor = factor.max(0.0);
        Self {
            after_action: self.after_action.scaled(factor),
            game_start: self.game_start.scaled(factor),
            night_start: self.night_start.scaled(factor),
            night_resolve: self.night_resolve.scaled(factor),
            announce: self.announce.scaled(factor),
            absent_role: self.absent_role.scaled(factor),
            tie_reopen: self.tie_reopen.scaled(factor),
            after_execution: self.after_execution.scaled(factor),
        }
    }
}
