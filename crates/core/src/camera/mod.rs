use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Shape of the transition into a camera key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    #[default]
    Linear,
    #[serde(alias = "sine-in")]
    EaseIn,
    #[serde(alias = "sine-out")]
    EaseOut,
    #[serde(alias = "sine-in-out")]
    EaseInOut,
}

impl Easing {
    /// Maps linear progress in `[0, 1]` onto eased progress in `[0, 1]`.
    pub fn apply(self, progress: f64) -> f64 {
        let p = progress.clamp(0.0, 1.0);
        match self {
            Easing::Linear => p,
            Easing::EaseIn => 1.0 - (p * PI / 2.0).cos(),
            Easing::EaseOut => (p * PI / 2.0).sin(),
            Easing::EaseInOut => -((PI * p).cos() - 1.0) / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPoint {
    #[serde(rename = "t")]
    pub time: f64,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub easing: Easing,
}

impl CameraPoint {
    pub fn new(time: f64, x: f64, y: f64) -> Self {
        Self {
            time,
            x,
            y,
            easing: Easing::Linear,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Point in the chart plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Time-keyed camera focus with per-key easing.
#[derive(Debug, Clone, Default)]
pub struct CameraTrack {
    points: Vec<CameraPoint>,
}

impl CameraTrack {
    pub fn new(points: impl Into<Vec<CameraPoint>>) -> Self {
        let mut points = points.into();
        points.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { points }
    }

    pub fn points(&self) -> &[CameraPoint] {
        &self.points
    }

    /// Camera focus at `time_ms`.
    ///
    /// Between two keys the position is blended using the later key's
    /// easing. Before the first key it snaps to that key, after the last key
    /// it holds the last one, and an empty track has no focus at all.
    pub fn offset_at(&self, time_ms: f64) -> Option<Vec2> {
        let split = self.points.partition_point(|p| p.time <= time_ms);
        let before = split.checked_sub(1).map(|i| &self.points[i]);
        let after = self.points.get(split);

        match (before, after) {
            (Some(before), Some(after)) => {
                let progress = (time_ms - before.time) / (after.time - before.time);
                let w = after.easing.apply(progress);
                Some(Vec2::new(
                    before.x + (after.x - before.x) * w,
                    before.y + (after.y - before.y) * w,
                ))
            }
            (None, Some(after)) => Some(Vec2::new(after.x, after.y)),
            (Some(before), None) => Some(Vec2::new(before.x, before.y)),
            (None, None) => None,
        }
    }
}
