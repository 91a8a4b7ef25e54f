use serde::Serialize;

use crate::{Cosmetic, JudgmentState, PointKey, ScoreState, Segment, Session, Tier, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum MarkerKind {
    Hit(Tier),
    Miss,
}

/// Hit or miss effect anchored at a chart point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
    pub key: PointKey,
    pub position: Vec2,
    pub kind: MarkerKind,
    pub cosmetic: Option<Cosmetic>,
}

/// Everything a renderer needs for one frame. Segment slices borrow the
/// session's preloaded geometry.
#[derive(Debug, Clone, Serialize)]
pub struct FrameView<'a> {
    pub time_ms: f64,
    pub camera: Vec2,
    pub paths: Vec<&'a [Segment]>,
    pub markers: Vec<Marker>,
    pub hud: ScoreState,
    pub finished: bool,
}

impl<'a> FrameView<'a> {
    pub fn capture(session: &'a Session, time_ms: f64) -> Self {
        let paths = (0..session.chart().paths.len())
            .map(|path| session.visible_segments(path, time_ms))
            .collect();

        let judgments = session.judgments();
        let markers = session
            .judgment_snapshot()
            .into_iter()
            .filter_map(|point| {
                let kind = match point.state {
                    JudgmentState::Pending => return None,
                    JudgmentState::Hit(tier) => MarkerKind::Hit(tier),
                    JudgmentState::Missed => MarkerKind::Miss,
                };
                let chart_point = session.chart().point(point.key)?;
                Some(Marker {
                    key: point.key,
                    position: Vec2::new(chart_point.x, chart_point.y),
                    kind,
                    cosmetic: judgments.hit(point.key).and_then(|hit| hit.cosmetic),
                })
            })
            .collect();

        Self {
            time_ms,
            camera: session.camera_offset(time_ms),
            paths,
            markers,
            hud: session.score_state(),
            finished: session.is_finished(),
        }
    }

    /// Number of segments drawn this frame across all paths.
    pub fn segment_count(&self) -> usize {
        self.paths.iter().map(|p| p.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppConfig, Button, Chart, ChartPoint};

    #[test]
    fn captures_markers_and_geometry() {
        let chart = Chart {
            paths: vec![
                vec![
                    ChartPoint::new(0.0, Button::None, 0.0, 0.0, 0.0),
                    ChartPoint::new(500.0, Button::Left, 50.0, 0.0, 0.0),
                    ChartPoint::new(1000.0, Button::Left, 100.0, 20.0, 0.0),
                ],
                vec![ChartPoint::new(200.0, Button::Middle, 5.0, 5.0, 0.0)],
            ],
            ..Default::default()
        };
        let mut config = AppConfig::default();
        config.gameplay.cosmetic_seed = Some(9);
        let mut session = Session::new(chart, &config).unwrap();

        session.process_input(Button::Left, 520.0);
        session.advance_time(600.0);

        let frame = FrameView::capture(&session, 600.0);
        assert_eq!(frame.paths.len(), 2);
        assert!(frame.paths[1].is_empty());
        assert!(frame.segment_count() > 0);
        assert_eq!(frame.camera, Vec2::default());
        assert_eq!(frame.markers.len(), 2);

        let miss = frame.markers.iter().find(|m| m.kind == MarkerKind::Miss).unwrap();
        assert_eq!(miss.key, PointKey::new(1, 0));
        assert_eq!(miss.position, Vec2::new(5.0, 5.0));
        assert!(miss.cosmetic.is_none());

        let hit = frame
            .markers
            .iter()
            .find(|m| m.kind == MarkerKind::Hit(Tier::Waow))
            .unwrap();
        assert_eq!(hit.position, Vec2::new(50.0, 0.0));
        assert!(hit.cosmetic.is_some());
        assert_eq!((frame.hud.combo, frame.hud.max_combo), (0, 1));
    }
}
