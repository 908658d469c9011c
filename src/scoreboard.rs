//! In-session score keeping
//!
//! Tracks the current run's score and misses plus the best score seen since
//! the page loaded. Nothing is persisted.

use serde::{Deserialize, Serialize};

/// Counters as shown on the HUD / menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub score: u64,
    pub misses: u32,
    pub high_score: u64,
}

/// Score, miss and high-score counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scoreboard {
    score: u64,
    misses: u32,
    high_score: u64,
    /// Misses that end a run
    loss_threshold: u32,
}

impl Scoreboard {
    pub fn new(loss_threshold: u32) -> Self {
        Self {
            loss_threshold: loss_threshold.max(1),
            ..Self::default()
        }
    }

    /// Start of a run: clear score and misses, keep the high score
    pub fn reset_run(&mut self) {
        self.score = 0;
        self.misses = 0;
    }

    /// A globe was clicked
    pub fn record_goal(&mut self) {
        self.score += 1;
    }

    /// A globe escaped. Returns true once the loss threshold is reached.
    pub fn record_miss(&mut self) -> bool {
        self.misses += 1;
        self.is_lost()
    }

    pub fn is_lost(&self) -> bool {
        self.misses >= self.loss_threshold
    }

    /// Promote the current score to high score if it beats it.
    /// Returns true if the high score changed.
    pub fn settle(&mut self) -> bool {
        if self.score > self.high_score {
            self.high_score = self.score;
            true
        } else {
            false
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            score: self.score,
            misses: self.misses,
            high_score: self.high_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_after_threshold() {
        let mut board = Scoreboard::new(3);
        assert!(!board.record_miss());
        assert!(!board.record_miss());
        assert!(board.record_miss());
        assert_eq!(board.misses(), 3);
    }

    #[test]
    fn test_settle_only_raises() {
        let mut board = Scoreboard::new(3);
        board.record_goal();
        board.record_goal();
        assert!(board.settle());
        assert_eq!(board.high_score(), 2);

        board.reset_run();
        board.record_goal();
        assert!(!board.settle());
        assert_eq!(board.high_score(), 2);
        assert_eq!(
            board.snapshot(),
            ScoreSnapshot {
                score: 1,
                misses: 0,
                high_score: 2
            }
        );
    }

    #[test]
    fn test_zero_threshold_is_clamped() {
        let mut board = Scoreboard::new(0);
        assert!(board.record_miss());
    }
}
