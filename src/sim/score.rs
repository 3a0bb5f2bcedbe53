//! Score ledger: points for drops and merges, plus the best-score mark

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tuning::ScoreTuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreLedger {
    score: u64,
    best: u64,
    drop_points: BTreeMap<u8, u64>,
    merge_points: BTreeMap<u8, u64>,
    merge_fallback_per_rank: u64,
}

impl ScoreLedger {
    pub fn new(tuning: &ScoreTuning, best: u64) -> Self {
        Self {
            score: 0,
            best,
            drop_points: tuning.drop_points.clone(),
            merge_points: tuning.merge_points.clone(),
            merge_fallback_per_rank: tuning.merge_fallback_per_rank,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    pub fn drop_points(&self, rank: u8) -> u64 {
        self.drop_points.get(&rank).copied().unwrap_or(0)
    }

    pub fn merge_points(&self, output_rank: u8) -> u64 {
        self.merge_points
            .get(&output_rank)
            .copied()
            .unwrap_or(output_rank as u64 * self.merge_fallback_per_rank)
    }

    /// Returns the new best score if this drop set one
    pub fn on_drop(&mut self, rank: u8) -> Option<u64> {
        self.add(self.drop_points(rank))
    }

    /// Returns the new best score if this merge set one
    pub fn on_merge(&mut self, output_rank: u8) -> Option<u64> {
        self.add(self.merge_points(output_rank))
    }

    /// Zero the score; the best mark is kept
    pub fn reset(&mut self) {
        self.score = 0;
    }

    fn add(&mut self, points: u64) -> Option<u64> {
        self.score = self.score.saturating_add(points);
        if self.score > self.best {
            self.best = self.score;
            Some(self.best)
        } else {
            None
        }
    }
}
