//! One play-through of a chart.
//!
//! The session is the boundary the driver talks to: it forwards input to the
//! judgment engine, polls for misses on every time step, feeds outcomes to
//! the score tracker and answers the renderer's queries. It is single
//! threaded and does nothing between calls.

use serde::{Deserialize, Serialize};

use crate::{
    AppConfig, Button, CameraTrack, Chart, FrameView, JudgmentEngine, JudgmentEvent, PathGeometry,
    PointJudgment, PointKey, RandomCosmetics, Result, ScoreState, ScoreTracker, Segment, TempoMap,
    Tier, Vec2,
};

/// Logical cue for the audio/visual collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    PlayHitSound(Tier),
    ShowRating(Tier),
    ShowMiss(PointKey),
}

/// Result of one [`Session::advance_time`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub time_ms: f64,
    pub finished: bool,
    pub signals: Vec<Signal>,
}

#[derive(Debug)]
pub struct Session {
    chart: Chart,
    tempo: TempoMap,
    config: AppConfig,
    geometry: Option<PathGeometry>,
    judgments: JudgmentEngine,
    score: ScoreTracker,
    camera: CameraTrack,
    time_ms: f64,
    paused: bool,
    finished: bool,
}

impl Session {
    /// Builds a session and preloads its path geometry. Fails when the chart
    /// holds non-finite values, its tempo schedule is invalid or the config
    /// carries an unusable flatness tolerance.
    pub fn new(chart: Chart, config: &AppConfig) -> Result<Self> {
        config.validate()?;
        chart.validate()?;
        let tempo = chart.tempo_map()?;
        let mut judgments = JudgmentEngine::new(&chart);
        judgments.set_cosmetics(Box::new(RandomCosmetics::new(
            config.gameplay.cosmetic_seed,
        )));
        let score = ScoreTracker::new(judgments.judgable_count())
            .with_start_offset(chart.meta.start_pos);
        let camera = CameraTrack::new(chart.camera.clone());

        tracing::info!(
            paths = chart.paths.len(),
            judgable = judgments.judgable_count(),
            camera_keys = camera.points().len(),
            "session created"
        );

        let mut session = Self {
            time_ms: chart.meta.start_pos,
            chart,
            tempo,
            config: config.clone(),
            geometry: None,
            judgments,
            score,
            camera,
            paused: false,
            finished: false,
        };
        session.preload();
        Ok(session)
    }

    /// Flattens every path. Called on creation and after [`Session::reset_full`].
    pub fn preload(&mut self) {
        self.geometry = Some(PathGeometry::build(
            &self.chart.paths,
            self.config.gameplay.flatness_tolerance,
        ));
    }

    pub fn is_preloaded(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn process_input(&mut self, button: Button, time_ms: f64) -> Vec<Signal> {
        if self.paused || self.finished {
            return Vec::new();
        }

        match self.judgments.process_input(button, time_ms) {
            Some(event) => self.record(event),
            None => Vec::new(),
        }
    }

    /// Moves the session to `time_ms`, marking overdue points as missed.
    ///
    /// The session finishes once the last point of the chart is past the hit
    /// window; by then every judgable point has been hit or missed.
    pub fn advance_time(&mut self, time_ms: f64) -> StepReport {
        if self.paused {
            return StepReport {
                time_ms: self.time_ms,
                finished: self.finished,
                signals: Vec::new(),
            };
        }

        self.time_ms = time_ms;
        let mut signals = Vec::new();
        for event in self.judgments.check_missed(time_ms) {
            signals.extend(self.record(event));
        }

        if !self.finished {
            let deadline = self.judgments.window().outer_ms();
            self.finished = self
                .chart
                .end_time()
                .map_or(true, |end| time_ms > end + deadline);
            if self.finished {
                tracing::info!(score = self.score.score(), "session finished");
            }
        }

        StepReport {
            time_ms,
            finished: self.finished,
            signals,
        }
    }

    fn record(&mut self, event: JudgmentEvent) -> Vec<Signal> {
        self.score.apply(&event);
        match event {
            JudgmentEvent::Hit { tier, .. } => {
                let mut signals = Vec::with_capacity(2);
                if self.config.audio.hit_sounds {
                    signals.push(Signal::PlayHitSound(tier));
                }
                signals.push(Signal::ShowRating(tier));
                signals
            }
            JudgmentEvent::Miss { key } => vec![Signal::ShowMiss(key)],
        }
    }

    /// Clears judgments and score and rewinds to the chart's start position.
    /// Chart data, tempo map and preloaded geometry are kept.
    pub fn restart(&mut self) {
        self.judgments.reset();
        self.score.reset();
        self.time_ms = self.chart.meta.start_pos;
        self.paused = false;
        self.finished = false;
        tracing::info!("session restarted");
    }

    /// Like [`Session::restart`], and also drops the preloaded geometry.
    pub fn reset_full(&mut self) {
        self.restart();
        self.geometry = None;
        tracing::info!("session reset, geometry released");
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Chart time of the latest step.
    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    pub fn start_time(&self) -> f64 {
        self.chart.meta.start_pos
    }

    pub fn score_state(&self) -> ScoreState {
        self.score.state(&self.judgments, self.time_ms)
    }

    pub fn judgment_snapshot(&self) -> Vec<PointJudgment> {
        self.judgments.snapshot()
    }

    /// Revealed part of a path; empty when geometry is not loaded.
    pub fn visible_segments(&self, path: usize, time_ms: f64) -> &[Segment] {
        self.geometry
            .as_ref()
            .map(|g| g.visible_segments(path, time_ms))
            .unwrap_or(&[])
    }

    /// Renderable snapshot at `time_ms`.
    pub fn frame(&self, time_ms: f64) -> FrameView<'_> {
        FrameView::capture(self, time_ms)
    }

    /// Camera focus, or the origin when the chart has no camera keys.
    pub fn camera_offset(&self, time_ms: f64) -> Vec2 {
        self.camera.offset_at(time_ms).unwrap_or_default()
    }

    /// Playback position, in seconds, the external audio should be at.
    pub fn audio_position(&self, time_ms: f64) -> f64 {
        (time_ms + self.chart.meta.offset) / 1000.0
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn tempo(&self) -> &TempoMap {
        &self.tempo
    }

    pub fn judgments(&self) -> &JudgmentEngine {
        &self.judgments
    }

    pub fn score(&self) -> &ScoreTracker {
        &self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CameraPoint, ChartPoint, JudgmentState, Rank};

    fn chart() -> Chart {
        Chart {
            paths: vec![vec![
                ChartPoint::new(0.0, Button::None, 0.0, 0.0, 0.0),
                ChartPoint::new(1000.0, Button::Left, 100.0, 0.0, 0.0),
                ChartPoint::new(2000.0, Button::Right, 200.0, 0.0, 0.0),
            ]],
            camera: vec![
                CameraPoint::new(0.0, 0.0, 0.0),
                CameraPoint::new(1000.0, 100.0, 0.0),
            ],
            ..Default::default()
        }
    }

    fn session() -> Session {
        let mut config = AppConfig::default();
        config.gameplay.cosmetic_seed = Some(1);
        Session::new(chart(), &config).unwrap()
    }

    #[test]
    fn rejects_invalid_tempo() {
        let mut chart = chart();
        chart.tempo.clear();
        assert!(Session::new(chart, &AppConfig::default()).is_err());
    }

    #[test]
    fn rejects_unusable_flatness_tolerance() {
        for tolerance in [0.0, -0.15, f64::NAN, f64::INFINITY] {
            let mut config = AppConfig::default();
            config.gameplay.flatness_tolerance = tolerance;
            assert!(
                matches!(
                    Session::new(chart(), &config),
                    Err(crate::VinesError::InvalidInput(_))
                ),
                "tolerance {tolerance}"
            );
        }
    }

    #[test]
    fn rejects_non_finite_points() {
        let mut chart = chart();
        chart.paths[0][1].time = f64::NAN;
        assert!(matches!(
            Session::new(chart, &AppConfig::default()),
            Err(crate::VinesError::InvalidChart(_))
        ));
    }

    #[test]
    fn hit_emits_sound_and_rating() {
        let mut session = session();
        let signals = session.process_input(Button::Left, 1010.0);
        assert_eq!(
            signals,
            vec![
                Signal::PlayHitSound(Tier::Waow),
                Signal::ShowRating(Tier::Waow)
            ]
        );
        assert_eq!(session.score_state().combo, 1);
    }

    #[test]
    fn hit_sounds_can_be_disabled() {
        let mut config = AppConfig::default();
        config.audio.hit_sounds = false;
        let mut session = Session::new(chart(), &config).unwrap();

        let signals = session.process_input(Button::Left, 1000.0);
        assert_eq!(signals, vec![Signal::ShowRating(Tier::Waow)]);
    }

    #[test]
    fn finishes_after_last_deadline() {
        let mut session = session();
        session.process_input(Button::Left, 1000.0);

        assert!(!session.advance_time(2300.0).finished);
        let report = session.advance_time(2301.0);
        assert!(report.finished);
        assert_eq!(report.signals, vec![Signal::ShowMiss(PointKey::new(0, 2))]);
        assert!(session.process_input(Button::Right, 2301.0).is_empty());

        let state = session.score_state();
        assert_eq!(state.combo, 0);
        assert_eq!(state.counts.miss, 1);
        assert_eq!(state.rank, Rank::C);
    }

    #[test]
    fn paused_sessions_ignore_input_and_time() {
        let mut session = session();
        session.advance_time(100.0);
        session.pause();
        assert!(session.is_paused());

        assert!(session.process_input(Button::Left, 1000.0).is_empty());
        let report = session.advance_time(5000.0);
        assert!(!report.finished && report.signals.is_empty());
        assert_eq!(session.time_ms(), 100.0);

        session.resume();
        assert!(!session.is_paused());
        assert!(session.advance_time(5000.0).finished);
    }

    #[test]
    fn restart_keeps_chart_and_geometry() {
        let mut session = session();
        session.process_input(Button::Left, 1000.0);
        session.advance_time(3000.0);
        let segments = session.visible_segments(0, 3000.0).len();

        session.restart();
        assert!(session
            .judgment_snapshot()
            .iter()
            .all(|p| p.state == JudgmentState::Pending));
        let state = session.score_state();
        assert_eq!((state.combo, state.score), (0, 0));
        assert!(!session.is_finished());
        assert_eq!(session.chart(), &chart());
        assert_eq!(session.visible_segments(0, 3000.0).len(), segments);

        session.reset_full();
        assert!(!session.is_preloaded());
        assert!(session.visible_segments(0, 3000.0).is_empty());
        session.preload();
        assert_eq!(session.visible_segments(0, 3000.0).len(), segments);
    }

    #[test]
    fn start_position_drives_rewind_and_live_accuracy() {
        let mut chart = chart();
        chart.meta.start_pos = 1500.0;
        let mut session = Session::new(chart, &AppConfig::default()).unwrap();
        assert_eq!(session.time_ms(), 1500.0);

        session.process_input(Button::Right, 2000.0);
        let report = session.advance_time(2100.0);
        assert_eq!(report.signals, vec![Signal::ShowMiss(PointKey::new(0, 1))]);

        // The skipped point at 1000 ms is left out of live accuracy but
        // still counts against the final rank.
        let state = session.score_state();
        assert_eq!(state.accuracy, 100.0);
        assert_eq!(state.rank, Rank::C);

        session.restart();
        assert_eq!(session.time_ms(), 1500.0);
        assert_eq!(session.score_state().score, 0);
    }

    #[test]
    fn camera_defaults_to_origin() {
        let session = session();
        assert_eq!(session.camera_offset(500.0), Vec2::new(50.0, 0.0));

        let mut bare = chart();
        bare.camera.clear();
        let bare = Session::new(bare, &AppConfig::default()).unwrap();
        assert_eq!(bare.camera_offset(500.0), Vec2::default());
    }

    #[test]
    fn audio_position_applies_offset() {
        let mut chart = chart();
        chart.meta.offset = 250.0;
        let session = Session::new(chart, &AppConfig::default()).unwrap();
        assert_eq!(session.audio_position(1000.0), 1.25);
    }
}
