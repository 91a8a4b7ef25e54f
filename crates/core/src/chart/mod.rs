//! Chart data as loaded from level files.
//!
//! Charts are plain JSON-compatible data. Points are addressed by a stable
//! [`PointKey`] (path index, point index) so judgment state can live in
//! separate tables instead of being written into the chart.

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

use crate::{CameraPoint, Result, TempoMap, TempoPoint, VinesError};

/// Button a point asks for. `None` points only shape the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    #[default]
    None,
    Left,
    Middle,
    Right,
}

impl Button {
    pub fn is_judgable(self) -> bool {
        self != Button::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Absolute chart time in milliseconds.
    #[serde(rename = "t")]
    pub time: f64,
    #[serde(default)]
    pub button: Button,
    pub x: f64,
    pub y: f64,
    /// Facing angle in radians, used only for curve tangents.
    #[serde(rename = "a", default)]
    pub angle: f64,
}

impl ChartPoint {
    pub fn new(time: f64, button: Button, x: f64, y: f64, angle: f64) -> Self {
        Self {
            time,
            button,
            x,
            y,
            angle,
        }
    }
}

/// Stable address of a point inside a [`Chart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PointKey {
    pub path: usize,
    pub index: usize,
}

impl PointKey {
    pub fn new(path: usize, index: usize) -> Self {
        Self { path, index }
    }
}

impl fmt::Display for PointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartMeta {
    /// Audio offset in milliseconds applied when positioning playback.
    pub offset: f64,
    /// Chart time a session starts at. Points before it are not counted
    /// against accuracy until the run is over.
    pub start_pos: f64,
}

fn default_tempo() -> Vec<TempoPoint> {
    vec![TempoPoint::new(0.0, 120.0)]
}

/// Full level description: paths, camera keys, tempo schedule and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    #[serde(alias = "segments")]
    pub paths: Vec<Vec<ChartPoint>>,
    #[serde(default)]
    pub camera: Vec<CameraPoint>,
    #[serde(default = "default_tempo", alias = "bpm")]
    pub tempo: Vec<TempoPoint>,
    #[serde(default)]
    pub meta: ChartMeta,
}

impl Default for Chart {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            camera: Vec::new(),
            tempo: default_tempo(),
            meta: ChartMeta::default(),
        }
    }
}

impl Chart {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects points or camera keys holding a non-finite time, position or
    /// angle.
    pub fn validate(&self) -> Result<()> {
        if let Some((key, _)) = self
            .points()
            .find(|(_, p)| {
                !(p.time.is_finite() && p.x.is_finite() && p.y.is_finite() && p.angle.is_finite())
            })
        {
            return Err(VinesError::InvalidChart(format!(
                "point {key} has a non-finite time, position or angle"
            )));
        }
        if let Some(index) = self
            .camera
            .iter()
            .position(|c| !(c.time.is_finite() && c.x.is_finite() && c.y.is_finite()))
        {
            return Err(VinesError::InvalidChart(format!(
                "camera key {index} has a non-finite time or position"
            )));
        }
        Ok(())
    }

    pub fn tempo_map(&self) -> Result<TempoMap> {
        TempoMap::new(self.tempo.clone())
    }

    pub fn point(&self, key: PointKey) -> Option<&ChartPoint> {
        self.paths.get(key.path)?.get(key.index)
    }

    /// Every point with its key, in authoring order.
    pub fn points(&self) -> impl Iterator<Item = (PointKey, &ChartPoint)> + '_ {
        self.paths.iter().enumerate().flat_map(|(path, points)| {
            points
                .iter()
                .enumerate()
                .map(move |(index, point)| (PointKey::new(path, index), point))
        })
    }

    pub fn judgable_count(&self) -> usize {
        self.points()
            .filter(|(_, point)| point.button.is_judgable())
            .count()
    }

    /// Time of the latest point on any path, or `None` for an empty chart.
    pub fn end_time(&self) -> Option<f64> {
        self.points().map(|(_, point)| point.time).reduce(f64::max)
    }

    /// Moves every point and camera key so it keeps its beat position when
    /// the tempo schedule changes from `old` to `new`.
    pub fn retime(&mut self, old: &TempoMap, new: &TempoMap) {
        for point in self.paths.iter_mut().flatten() {
            point.time = old.reproject(point.time, new);
        }
        for key in &mut self.camera {
            key.time = old.reproject(key.time, new);
        }
        self.meta.start_pos = old.reproject(self.meta.start_pos, new);
        self.tempo = new.points().to_vec();
    }
}
