//! Elapsed time and decaying score
//!
//! Elapsed time is always `now - started_at`, recomputed from the clock on
//! every tick so missed or late ticks never drift.

use serde::{Deserialize, Serialize};

use crate::consts::{POINTS_PER_PAIR, SCORE_DECAY_SECS};

/// Wall-clock game timer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    running: bool,
    started_at: Option<u64>,
    elapsed_ms: u64,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Start or resume. Resuming continues from the paused elapsed time.
    pub fn start(&mut self, now: u64) {
        if self.running {
            return;
        }
        self.running = true;
        self.started_at = Some(now.saturating_sub(self.elapsed_ms));
    }

    /// Recompute elapsed time from the clock
    pub fn tick(&mut self, now: u64) {
        if !self.running {
            return;
        }
        if let Some(started_at) = self.started_at {
            self.elapsed_ms = now.saturating_sub(started_at);
        }
    }

    /// One last tick, then halt
    pub fn stop(&mut self, now: u64) {
        if !self.running {
            return;
        }
        self.tick(now);
        self.running = false;
        self.started_at = None;
    }

    /// Halt and zero. Not an end-of-game stop, so no final tick.
    pub fn reset(&mut self) {
        self.running = false;
        self.started_at = None;
        self.elapsed_ms = 0;
    }
}

/// Score that decays linearly with whole elapsed seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreModel {
    pub max_score: u32,
    pub penalty_per_second: u32,
}

impl ScoreModel {
    /// Score model for a board with `pairs` pairs
    pub fn for_pairs(pairs: u32) -> Self {
        let max_score = pairs * POINTS_PER_PAIR;
        let penalty_per_second = if max_score == 0 {
            0
        } else {
            // Reaches zero after roughly SCORE_DECAY_SECS
            ((max_score as f64 / SCORE_DECAY_SECS as f64).round() as u32).max(1)
        };
        Self {
            max_score,
            penalty_per_second,
        }
    }

    pub fn score_at(&self, elapsed_ms: u64) -> u32 {
        let elapsed_secs = elapsed_ms / 1000;
        let penalty = elapsed_secs.saturating_mul(self.penalty_per_second as u64);
        (self.max_score as u64).saturating_sub(penalty) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_penalty_per_second() {
        // 2 pairs: 200 / 180 rounds to 1
        assert_eq!(ScoreModel::for_pairs(2).penalty_per_second, 1);
        // 12 pairs: 1200 / 180 = 6.67 rounds to 7
        let model = ScoreModel::for_pairs(12);
        assert_eq!(model.max_score, 1200);
        assert_eq!(model.penalty_per_second, 7);
        // 0 pairs never decays
        assert_eq!(ScoreModel::for_pairs(0).penalty_per_second, 0);
    }

    #[test]
    fn test_score_uses_whole_seconds() {
        let model = ScoreModel::for_pairs(2);
        assert_eq!(model.score_at(0), 200);
        assert_eq!(model.score_at(999), 200);
        assert_eq!(model.score_at(1000), 199);
        assert_eq!(model.score_at(500_000), 0);
    }

    #[test]
    fn test_timer_start_is_idempotent() {
        let mut timer = Timer::new();
        timer.start(1000);
        timer.start(5000);
        timer.tick(6000);
        assert_eq!(timer.elapsed_ms(), 5000);
    }

    #[test]
    fn test_timer_resume_continues() {
        let mut timer = Timer::new();
        timer.start(0);
        timer.stop(3000);
        assert_eq!(timer.elapsed_ms(), 3000);
        assert!(!timer.is_running());

        // Ticks while stopped do nothing
        timer.tick(50_000);
        assert_eq!(timer.elapsed_ms(), 3000);

        timer.start(10_000);
        timer.tick(11_500);
        assert_eq!(timer.elapsed_ms(), 4500);
    }

    #[test]
    fn test_timer_reset() {
        let mut timer = Timer::new();
        timer.start(0);
        timer.tick(2000);
        timer.reset();
        assert_eq!(timer.elapsed_ms(), 0);
        assert!(!timer.is_running());
    }

    proptest! {
        #[test]
        fn prop_score_non_increasing(
            pairs in 1u32..=12,
            mut ticks in prop::collection::vec(0u64..600_000, 1..50),
        ) {
            ticks.sort_unstable();
            let model = ScoreModel::for_pairs(pairs);
            let mut timer = Timer::new();
            timer.start(0);

            let mut last = model.score_at(timer.elapsed_ms());
            prop_assert_eq!(last, pairs * 100);
            for now in ticks {
                timer.tick(now);
                let score = model.score_at(timer.elapsed_ms());
                prop_assert!(score <= last);
                last = score;
            }
        }
    }
}
