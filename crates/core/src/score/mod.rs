//! Combo, score and accuracy bookkeeping.
//!
//! A full combo of `waow` hits scores exactly 1,000,000: the n-th consecutive
//! hit is worth `n * base` where `base` normalises the sum `1 + 2 + ... + N`.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{JudgmentEngine, JudgmentEvent, JudgmentState, Tier};

pub const MAX_SCORE: f64 = 1_000_000.0;

/// Letter classification of final accuracy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
)]
pub enum Rank {
    S,
    A,
    B,
    C,
    F,
}

impl Rank {
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= 95.0 {
            Self::S
        } else if accuracy >= 85.0 {
            Self::A
        } else if accuracy >= 75.0 {
            Self::B
        } else if accuracy >= 50.0 {
            Self::C
        } else {
            Self::F
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub waow: u32,
    pub good: u32,
    pub ok: u32,
    pub bad: u32,
    pub miss: u32,
}

impl TierCounts {
    pub fn get(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Waow => self.waow,
            Tier::Good => self.good,
            Tier::Ok => self.ok,
            Tier::Bad => self.bad,
        }
    }

    fn bump(&mut self, tier: Tier) {
        match tier {
            Tier::Waow => self.waow += 1,
            Tier::Good => self.good += 1,
            Tier::Ok => self.ok += 1,
            Tier::Bad => self.bad += 1,
        }
    }

    pub fn hits(&self) -> u32 {
        self.waow + self.good + self.ok + self.bad
    }
}

/// HUD values exposed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub combo: u32,
    pub max_combo: u32,
    pub score: u64,
    pub accuracy: f64,
    pub rank: Rank,
    pub counts: TierCounts,
}

#[derive(Debug, Clone)]
pub struct ScoreTracker {
    base: f64,
    start_offset: f64,
    combo: u32,
    max_combo: u32,
    multiplier: u32,
    raw_score: f64,
    counts: TierCounts,
}

impl ScoreTracker {
    /// `judgable` is the number of non-`none` points in the whole chart.
    pub fn new(judgable: usize) -> Self {
        let n = judgable as f64;
        let base = if judgable == 0 {
            0.0
        } else {
            MAX_SCORE / (n * (n + 1.0) / 2.0)
        };
        Self {
            base,
            start_offset: 0.0,
            combo: 0,
            max_combo: 0,
            multiplier: 0,
            raw_score: 0.0,
            counts: TierCounts::default(),
        }
    }

    /// Points before `start_offset` only count against accuracy once every
    /// point is counted.
    pub fn with_start_offset(mut self, start_offset: f64) -> Self {
        self.start_offset = start_offset;
        self
    }

    pub fn on_hit(&mut self, tier: Tier) {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.multiplier += 1;
        self.raw_score += f64::from(self.multiplier) * self.base * tier.score_multiplier();
        self.counts.bump(tier);
    }

    pub fn on_miss(&mut self) {
        self.combo = 0;
        self.multiplier /= 2;
        self.counts.miss += 1;
    }

    pub fn apply(&mut self, event: &JudgmentEvent) {
        match event {
            JudgmentEvent::Hit { tier, .. } => self.on_hit(*tier),
            JudgmentEvent::Miss { .. } => self.on_miss(),
        }
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    pub fn raw_score(&self) -> f64 {
        self.raw_score
    }

    pub fn score(&self) -> u64 {
        self.raw_score.round() as u64
    }

    pub fn counts(&self) -> &TierCounts {
        &self.counts
    }

    /// Accuracy percentage at `time_ms`.
    ///
    /// Hit points contribute their tier weight. Unhit points count as zero
    /// credit when `count_all` is set, or once their window has closed and
    /// they lie at or after the start offset. Returns 0 when nothing counts.
    pub fn accuracy(&self, judgments: &JudgmentEngine, time_ms: f64, count_all: bool) -> f64 {
        let outer = judgments.window().outer_ms();
        let mut credit = 0.0;
        let mut counted = 0usize;

        for entry in judgments.entries() {
            match judgments.state(entry.key) {
                JudgmentState::Hit(tier) => {
                    credit += tier.accuracy_weight();
                    counted += 1;
                }
                _ if count_all
                    || (entry.time >= self.start_offset && time_ms > entry.time + outer) =>
                {
                    counted += 1;
                }
                _ => {}
            }
        }

        if counted == 0 {
            0.0
        } else {
            credit / counted as f64 * 100.0
        }
    }

    pub fn rank(&self, judgments: &JudgmentEngine) -> Rank {
        Rank::from_accuracy(self.accuracy(judgments, f64::INFINITY, true))
    }

    pub fn state(&self, judgments: &JudgmentEngine, time_ms: f64) -> ScoreState {
        ScoreState {
            combo: self.combo,
            max_combo: self.max_combo,
            score: self.score(),
            accuracy: self.accuracy(judgments, time_ms, false),
            rank: self.rank(judgments),
            counts: self.counts,
        }
    }

    /// Back to the empty state; the chart-derived base is kept.
    pub fn reset(&mut self) {
        self.combo = 0;
        self.max_combo = 0;
        self.multiplier = 0;
        self.raw_score = 0.0;
        self.counts = TierCounts::default();
    }
}
