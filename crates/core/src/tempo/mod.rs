//! Conversion between chart milliseconds and musical beats.
//!
//! A [`TempoMap`] is a piecewise-linear schedule: each [`TempoPoint`] sets the
//! tempo from its beat up to the next point. The first point is anchored at
//! 0 ms, the last point's tempo extends forever and the first point's tempo is
//! also used for beats before it, so both conversions are defined for every
//! finite input and are exact inverses of each other.

use serde::{Deserialize, Serialize};

use crate::{Result, VinesError};

const MS_PER_MINUTE: f64 = 60_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoPoint {
    #[serde(rename = "b", alias = "beat")]
    pub beat: f64,
    pub bpm: f64,
}

impl TempoPoint {
    pub fn new(beat: f64, bpm: f64) -> Self {
        Self { beat, bpm }
    }

    fn ms_per_beat(&self) -> f64 {
        MS_PER_MINUTE / self.bpm
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    beat: f64,
    time_ms: f64,
    ms_per_beat: f64,
}

/// Immutable tempo schedule. Editing a tempo means building a new map and
/// reprojecting dependent timestamps with [`TempoMap::reproject`].
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    points: Vec<TempoPoint>,
    anchors: Vec<Anchor>,
}

impl TempoMap {
    /// Builds a map from unsorted points.
    ///
    /// Fails with [`VinesError::InvalidTempoMap`] when `points` is empty or a
    /// point has a non-finite beat or a bpm that is not strictly positive.
    pub fn new(points: impl Into<Vec<TempoPoint>>) -> Result<Self> {
        let mut points = points.into();
        if points.is_empty() {
            return Err(VinesError::InvalidTempoMap(
                "at least one tempo point is required".to_string(),
            ));
        }

        if let Some(bad) = points
            .iter()
            .find(|p| !p.beat.is_finite() || !p.bpm.is_finite() || p.bpm <= 0.0)
        {
            return Err(VinesError::InvalidTempoMap(format!(
                "tempo point at beat {} has unusable bpm {}",
                bad.beat, bad.bpm
            )));
        }

        points.sort_by(|a, b| a.beat.total_cmp(&b.beat));

        let mut anchors = Vec::with_capacity(points.len());
        let mut time_ms = 0.0;
        for (i, point) in points.iter().enumerate() {
            if i > 0 {
                let prev = &points[i - 1];
                time_ms += (point.beat - prev.beat) * prev.ms_per_beat();
            }
            anchors.push(Anchor {
                beat: point.beat,
                time_ms,
                ms_per_beat: point.ms_per_beat(),
            });
        }

        Ok(Self { points, anchors })
    }

    /// Single-tempo map starting at beat 0.
    pub fn constant(bpm: f64) -> Result<Self> {
        Self::new(vec![TempoPoint::new(0.0, bpm)])
    }

    /// Points sorted by beat.
    pub fn points(&self) -> &[TempoPoint] {
        &self.points
    }

    pub fn beat_to_time(&self, beat: f64) -> f64 {
        let anchor = self.anchor_for(|a| a.beat <= beat);
        anchor.time_ms + (beat - anchor.beat) * anchor.ms_per_beat
    }

    pub fn time_to_beat(&self, time_ms: f64) -> f64 {
        let anchor = self.anchor_for(|a| a.time_ms <= time_ms);
        anchor.beat + (time_ms - anchor.time_ms) / anchor.ms_per_beat
    }

    /// Tempo in effect at `beat`.
    pub fn bpm_at(&self, beat: f64) -> f64 {
        MS_PER_MINUTE / self.anchor_for(|a| a.beat <= beat).ms_per_beat
    }

    /// Maps a timestamp authored against this map onto `target`, keeping its
    /// beat position.
    pub fn reproject(&self, time_ms: f64, target: &TempoMap) -> f64 {
        target.beat_to_time(self.time_to_beat(time_ms))
    }

    // Latest anchor matching `pred`, or the first one when the query lies
    // before the schedule.
    fn anchor_for(&self, pred: impl FnMut(&Anchor) -> bool) -> &Anchor {
        let idx = self.anchors.partition_point(pred);
        &self.anchors[idx.saturating_sub(1)]
    }
}
