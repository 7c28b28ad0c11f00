//! Process-wide player statistics and the high-score persistence seam.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub trait HighScoreStore {
    fn load_high_score(&mut self) -> Result<u32, StoreError>;
    fn save_high_score(&mut self, score: u32) -> Result<(), StoreError>;
}

/// Volatile store. Clones share nothing.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    value: Option<u32>,
}

impl MemoryStore {
    pub fn with_value(score: u32) -> Self {
        Self { value: Some(score) }
    }
}

impl HighScoreStore for MemoryStore {
    fn load_high_score(&mut self) -> Result<u32, StoreError> {
        Ok(self.value.unwrap_or(0))
    }

    fn save_high_score(&mut self, score: u32) -> Result<(), StoreError> {
        self.value = Some(score);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundStats {
    pub score: u32,
    pub elapsed_time: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub high_score: u32,
    pub total_loss_count: u32,
    pub total_time_played: f64,
}

/// What one finished round did to the session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: RoundStats,
    pub previous_high_score: u32,
    pub new_high_score: bool,
    pub stats: SessionStats,
}

/// Owns [`SessionStats`] for the life of the application and writes the
/// high score through to its store.
pub struct Session {
    stats: SessionStats,
    store: Box<dyn HighScoreStore>,
}

impl Session {
    /// Loads the persisted high score; a failed load starts from 0.
    pub fn open(mut store: Box<dyn HighScoreStore>) -> Self {
        let high_score = match store.load_high_score() {
            Ok(score) => score,
            Err(err) => {
                tracing::warn!("failed to load high score, starting from 0: {err}");
                0
            }
        };
        tracing::debug!(high_score, "session opened");

        Self {
            stats: SessionStats {
                high_score,
                ..SessionStats::default()
            },
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryStore::default()))
    }

    #[inline]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Folds a finished round into the session. The high score is saved
    /// only when it moved; a failed save keeps the in-memory value.
    pub fn finalize_round(&mut self, round: &RoundStats) -> RoundSummary {
        let previous_high_score = self.stats.high_score;
        self.stats.total_loss_count = self.stats.total_loss_count.saturating_add(1);
        self.stats.total_time_played += round.elapsed_time.max(0.0);
        self.stats.high_score = previous_high_score.max(round.score);

        let new_high_score = self.stats.high_score > previous_high_score;
        if new_high_score {
            if let Err(err) = self.store.save_high_score(self.stats.high_score) {
                tracing::warn!(
                    high_score = self.stats.high_score,
                    "failed to persist high score: {err}"
                );
            }
        }

        RoundSummary {
            round: *round,
            previous_high_score,
            new_high_score,
            stats: self.stats,
        }
    }

    /// Explicit "new session": clears losses and play time, keeps the best.
    pub fn begin_new_session(&mut self) {
        tracing::info!(
            losses = self.stats.total_loss_count,
            time_played = self.stats.total_time_played,
            "starting a new session"
        );
        self.stats = SessionStats {
            high_score: self.stats.high_score,
            ..SessionStats::default()
        };
    }
}
