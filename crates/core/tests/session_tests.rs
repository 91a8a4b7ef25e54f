use vines_core::{
    AppConfig, Button, CameraPoint, Chart, ChartMeta, ChartPoint, Easing, FrameView, InputEvent,
    InputQueue, JudgmentState, PlaybackClock, PointKey, Rank, Session, Signal, TempoMap,
    TempoPoint,
};

const FRAME_MS: f64 = 1000.0 / 60.0;

fn two_lane_chart() -> Chart {
    let lane = |y: f64, button: Button, offset: f64| -> Vec<ChartPoint> {
        (0..6)
            .map(|i| {
                let button = if i == 0 { Button::None } else { button };
                ChartPoint::new(offset + i as f64 * 500.0, button, i as f64 * 40.0, y, 0.3)
            })
            .collect()
    };

    Chart {
        paths: vec![
            lane(0.0, Button::Left, 0.0),
            lane(80.0, Button::Right, 250.0),
            vec![ChartPoint::new(900.0, Button::Middle, 0.0, 0.0, 0.0)],
        ],
        camera: vec![
            CameraPoint::new(0.0, 0.0, 0.0),
            CameraPoint::new(3000.0, 200.0, 40.0).with_easing(Easing::EaseInOut),
        ],
        tempo: vec![TempoPoint::new(0.0, 120.0)],
        meta: ChartMeta::default(),
    }
}

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.gameplay.cosmetic_seed = Some(11);
    config
}

/// Steps a session frame by frame, delivering queued input as it becomes due.
fn drive(session: &mut Session, inputs: Vec<InputEvent>) -> Vec<Signal> {
    let mut queue = InputQueue::new();
    queue.set_events(inputs);
    let mut clock = PlaybackClock::new();
    clock.start(session.start_time());

    let mut signals = Vec::new();
    for _ in 0..100_000 {
        let now = clock.advance(FRAME_MS);
        for event in queue.drain_until(now) {
            signals.extend(session.process_input(event.button, event.time_ms));
        }
        let report = session.advance_time(now);
        signals.extend(report.signals);
        if report.finished {
            break;
        }
    }
    signals
}

fn perfect_inputs(chart: &Chart) -> Vec<InputEvent> {
    chart
        .points()
        .filter(|(_, p)| p.button.is_judgable())
        .map(|(_, p)| InputEvent::new(p.time, p.button))
        .collect()
}

#[test]
fn perfect_run_reaches_max_score() {
    let chart = two_lane_chart();
    let inputs = perfect_inputs(&chart);
    let mut session = Session::new(chart, &config()).unwrap();

    drive(&mut session, inputs);

    assert!(session.is_finished());
    assert!(session
        .judgment_snapshot()
        .iter()
        .all(|p| p.state.is_terminal()));
    let state = session.score_state();
    assert_eq!(state.score, 1_000_000);
    assert_eq!(state.combo, 11);
    assert_eq!(state.max_combo, 11);
    assert_eq!(state.rank, Rank::S);
    assert!((state.accuracy - 100.0).abs() < 1e-9);
    assert_eq!(state.counts.waow, 11);
    assert_eq!(state.counts.hits(), 11);
}

#[test]
fn idle_run_misses_everything() {
    let mut session = Session::new(two_lane_chart(), &config()).unwrap();

    let signals = drive(&mut session, Vec::new());

    let misses = signals
        .iter()
        .filter(|s| matches!(s, Signal::ShowMiss(_)))
        .count();
    assert_eq!(misses, 11);
    assert!(session
        .judgment_snapshot()
        .iter()
        .all(|p| p.state == JudgmentState::Missed));
    let state = session.score_state();
    assert_eq!((state.score, state.combo), (0, 0));
    assert_eq!(state.accuracy, 0.0);
    assert_eq!(state.rank, Rank::F);
}

#[test]
fn duplicate_input_judges_once() {
    let mut session = Session::new(two_lane_chart(), &config()).unwrap();

    let first = session.process_input(Button::Middle, 900.0);
    let score = session.score_state();
    let second = session.process_input(Button::Middle, 900.0);

    assert!(!first.is_empty());
    assert!(second.is_empty());
    assert_eq!(session.score_state(), score);
}

#[test]
fn miss_breaks_combo_but_keeps_score() {
    let chart = two_lane_chart();
    let mut inputs = perfect_inputs(&chart);
    // Drop the middle-lane press at 900 ms.
    inputs.retain(|e| e.button != Button::Middle);
    let mut session = Session::new(chart, &config()).unwrap();

    drive(&mut session, inputs);

    let state = session.score_state();
    assert_eq!(state.counts.miss, 1);
    assert!(state.score < 1_000_000 && state.score > 0);
    assert!(state.max_combo < 11);
    assert!((state.accuracy - 1000.0 / 11.0).abs() < 1e-9);
    assert_eq!(state.rank, Rank::A);
    assert_eq!(
        session.judgments().state(PointKey::new(2, 0)),
        JudgmentState::Missed
    );
}

#[test]
fn restart_allows_a_clean_second_run() {
    let chart = two_lane_chart();
    let inputs = perfect_inputs(&chart);
    let mut session = Session::new(chart.clone(), &config()).unwrap();
    let tempo = session.tempo().clone();

    drive(&mut session, Vec::new());
    session.restart();

    assert_eq!(session.chart(), &chart);
    assert_eq!(session.tempo(), &tempo);
    assert_eq!(session.score_state().score, 0);

    drive(&mut session, inputs);
    assert_eq!(session.score_state().score, 1_000_000);
}

#[test]
fn frame_view_follows_camera_and_reveal() {
    let mut session = Session::new(two_lane_chart(), &config()).unwrap();
    session.advance_time(1500.0);

    let early = FrameView::capture(&session, 100.0).segment_count();
    let frame = session.frame(1500.0);

    assert!(frame.segment_count() > early);
    assert!((frame.camera.x - 100.0).abs() < 1e-9);
    assert!((frame.camera.y - 20.0).abs() < 1e-9);
    assert!(!frame.finished);
}

#[test]
fn tempo_edit_reprojects_chart() {
    let mut chart = two_lane_chart();
    let old = chart.tempo_map().unwrap();
    let new = TempoMap::new(vec![TempoPoint::new(0.0, 120.0), TempoPoint::new(4.0, 240.0)])
        .unwrap();

    chart.retime(&old, &new);

    // Beat 5 (2500 ms at 120 bpm) lands at 2000 + 250 ms.
    assert_eq!(chart.paths[0][5].time, 2250.0);
    assert_eq!(chart.paths[0][2].time, 1000.0);
    let session = Session::new(chart, &config()).unwrap();
    assert_eq!(session.tempo(), &new);
}
