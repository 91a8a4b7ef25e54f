//! Matching of player input against chart points.
//!
//! Every judgable point starts pending and ends either hit with a [`Tier`] or
//! missed. Both outcomes are permanent until [`JudgmentEngine::reset`]. Input
//! that matches no pending point is ignored, so stray taps cost nothing.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{Button, Chart, Cosmetic, CosmeticSource, PointKey};

/// Timing tier assigned to a hit, tightest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[strum(serialize = "waow")]
    Waow,
    #[strum(serialize = "good")]
    Good,
    #[strum(serialize = "ok")]
    Ok,
    #[strum(serialize = "bad")]
    Bad,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Waow, Tier::Good, Tier::Ok, Tier::Bad];

    /// Factor applied to the combo-scaled score of a hit.
    pub fn score_multiplier(self) -> f64 {
        match self {
            Tier::Waow => 1.0,
            Tier::Good => 0.8,
            Tier::Ok => 0.6,
            Tier::Bad => 0.3,
        }
    }

    /// Credit a hit of this tier contributes to accuracy.
    pub fn accuracy_weight(self) -> f64 {
        match self {
            Tier::Waow => 1.0,
            Tier::Good => 0.8,
            Tier::Ok => 0.6,
            Tier::Bad => 0.3,
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Upper bounds, in milliseconds of absolute deviation, for each tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitWindow {
    pub waow_ms: f64,
    pub good_ms: f64,
    pub ok_ms: f64,
    pub bad_ms: f64,
}

impl HitWindow {
    pub const STANDARD: HitWindow = HitWindow {
        waow_ms: 50.0,
        good_ms: 100.0,
        ok_ms: 150.0,
        bad_ms: 300.0,
    };

    /// Widest deviation that still counts as a hit. Points whose deadline
    /// passes this bound are missed.
    pub fn outer_ms(&self) -> f64 {
        self.bad_ms
    }

    pub fn judge(&self, deviation_ms: f64) -> Option<Tier> {
        let deviation = deviation_ms.abs();
        if deviation <= self.waow_ms {
            Some(Tier::Waow)
        } else if deviation <= self.good_ms {
            Some(Tier::Good)
        } else if deviation <= self.ok_ms {
            Some(Tier::Ok)
        } else if deviation <= self.bad_ms {
            Some(Tier::Bad)
        } else {
            None
        }
    }
}

impl Default for HitWindow {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub tier: Tier,
    /// Chart time of the input that produced the hit.
    pub time_ms: f64,
    /// Input time minus point time; negative means early.
    pub offset_ms: f64,
    pub cosmetic: Option<Cosmetic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "tier", rename_all = "lowercase")]
pub enum JudgmentState {
    Pending,
    Hit(Tier),
    Missed,
}

impl JudgmentState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JudgmentState::Pending)
    }
}

/// Outcome produced by the engine, consumed by the score tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum JudgmentEvent {
    Hit {
        key: PointKey,
        tier: Tier,
        offset_ms: f64,
    },
    Miss {
        key: PointKey,
    },
}

impl JudgmentEvent {
    pub fn key(&self) -> PointKey {
        match self {
            JudgmentEvent::Hit { key, .. } | JudgmentEvent::Miss { key } => *key,
        }
    }
}

/// Judgable point in the time-sorted index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgeEntry {
    pub key: PointKey,
    pub time: f64,
    pub button: Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointJudgment {
    pub key: PointKey,
    pub time: f64,
    pub button: Button,
    pub state: JudgmentState,
}

pub struct JudgmentEngine {
    window: HitWindow,
    entries: Vec<JudgeEntry>,
    hits: HashMap<PointKey, Hit>,
    misses: HashSet<PointKey>,
    cosmetics: Option<Box<dyn CosmeticSource>>,
}

impl JudgmentEngine {
    pub fn new(chart: &Chart) -> Self {
        Self::with_window(chart, HitWindow::STANDARD)
    }

    /// Builds the time-sorted index of judgable points. Ties keep authoring
    /// order.
    pub fn with_window(chart: &Chart, window: HitWindow) -> Self {
        let mut entries: Vec<JudgeEntry> = chart
            .points()
            .filter(|(_, point)| point.button.is_judgable())
            .map(|(key, point)| JudgeEntry {
                key,
                time: point.time,
                button: point.button,
            })
            .collect();
        entries.sort_by(|a, b| a.time.total_cmp(&b.time));

        Self {
            window,
            entries,
            hits: HashMap::new(),
            misses: HashSet::new(),
            cosmetics: None,
        }
    }

    pub fn set_cosmetics(&mut self, source: Box<dyn CosmeticSource>) {
        self.cosmetics = Some(source);
    }

    pub fn window(&self) -> &HitWindow {
        &self.window
    }

    /// Judgable points in ascending time order.
    pub fn entries(&self) -> &[JudgeEntry] {
        &self.entries
    }

    pub fn judgable_count(&self) -> usize {
        self.entries.len()
    }

    pub fn state(&self, key: PointKey) -> JudgmentState {
        if let Some(hit) = self.hits.get(&key) {
            JudgmentState::Hit(hit.tier)
        } else if self.misses.contains(&key) {
            JudgmentState::Missed
        } else {
            JudgmentState::Pending
        }
    }

    pub fn hit(&self, key: PointKey) -> Option<&Hit> {
        self.hits.get(&key)
    }

    pub fn is_missed(&self, key: PointKey) -> bool {
        self.misses.contains(&key)
    }

    pub fn pending_count(&self) -> usize {
        self.entries.len() - self.hits.len() - self.misses.len()
    }

    fn is_pending(&self, key: &PointKey) -> bool {
        !self.hits.contains_key(key) && !self.misses.contains(key)
    }

    /// Judges the earliest pending point that asks for `button` and lies
    /// within the outer window of `time_ms`. At most one point is judged.
    pub fn process_input(&mut self, button: Button, time_ms: f64) -> Option<JudgmentEvent> {
        if !button.is_judgable() {
            return None;
        }

        let outer = self.window.outer_ms();
        let start = self.entries.partition_point(|e| time_ms - e.time > outer);
        let entry = self.entries[start..]
            .iter()
            .take_while(|e| e.time - time_ms <= outer)
            .find(|e| e.button == button && self.is_pending(&e.key))
            .copied()?;

        let offset_ms = time_ms - entry.time;
        let tier = self.window.judge(offset_ms)?;
        let cosmetic = self.cosmetics.as_mut().map(|source| source.roll());
        self.hits.insert(
            entry.key,
            Hit {
                tier,
                time_ms,
                offset_ms,
                cosmetic,
            },
        );
        tracing::debug!(point = %entry.key, %tier, offset_ms, "point hit");

        Some(JudgmentEvent::Hit {
            key: entry.key,
            tier,
            offset_ms,
        })
    }

    /// Marks every pending point whose deadline lies before `time_ms` as
    /// missed and returns the misses in time order.
    pub fn check_missed(&mut self, time_ms: f64) -> Vec<JudgmentEvent> {
        let outer = self.window.outer_ms();
        let end = self.entries.partition_point(|e| time_ms - e.time > outer);

        let mut events = Vec::new();
        for entry in &self.entries[..end] {
            if self.hits.contains_key(&entry.key) || !self.misses.insert(entry.key) {
                continue;
            }
            tracing::debug!(point = %entry.key, "point missed");
            events.push(JudgmentEvent::Miss { key: entry.key });
        }
        events
    }

    /// Per-point state in time order.
    pub fn snapshot(&self) -> Vec<PointJudgment> {
        self.entries
            .iter()
            .map(|e| PointJudgment {
                key: e.key,
                time: e.time,
                button: e.button,
                state: self.state(e.key),
            })
            .collect()
    }

    /// Clears all hits and misses; the point index is kept.
    pub fn reset(&mut self) {
        self.hits.clear();
        self.misses.clear();
    }
}

impl fmt::Debug for JudgmentEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JudgmentEngine")
            .field("window", &self.window)
            .field("entries", &self.entries.len())
            .field("hits", &self.hits.len())
            .field("misses", &self.misses.len())
            .field("cosmetics", &self.cosmetics.is_some())
            .finish()
    }
}
