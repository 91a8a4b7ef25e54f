use serde::{Deserialize, Serialize};

use crate::Button;

/// Chart clock advanced by frame deltas. While paused, deltas are dropped.
#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    time_ms: f64,
    paused: bool,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, at_ms: f64) {
        self.time_ms = at_ms;
        self.paused = false;
    }

    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Moves the clock forward and returns the new time. Negative deltas are
    /// ignored so chart time never runs backwards.
    pub fn advance(&mut self, delta_ms: f64) -> f64 {
        if !self.paused {
            self.time_ms += delta_ms.max(0.0);
        }
        self.time_ms
    }
}

/// Button press stamped with chart time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    #[serde(rename = "t")]
    pub time_ms: f64,
    pub button: Button,
}

impl InputEvent {
    pub fn new(time_ms: f64, button: Button) -> Self {
        Self { time_ms, button }
    }
}

/// Time-ordered input buffer drained once per step.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: Vec<InputEvent>,
    next_event: usize,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_events(&mut self, events: Vec<InputEvent>) {
        self.events = events;
        self.events
            .sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
        self.next_event = 0;
    }

    /// Queues an event. Events older than what was already drained are
    /// delivered on the next drain.
    pub fn push(&mut self, event: InputEvent) {
        let tail = &self.events[self.next_event..];
        let at = self.next_event + tail.partition_point(|e| e.time_ms <= event.time_ms);
        self.events.insert(at, event);
    }

    /// Returns the events that are due at `time_ms`, oldest first.
    pub fn drain_until(&mut self, time_ms: f64) -> &[InputEvent] {
        let start = self.next_event;
        let end = start + self.events[start..].partition_point(|e| e.time_ms <= time_ms);
        self.next_event = end;
        &self.events[start..end]
    }

    pub fn remaining(&self) -> usize {
        self.events.len() - self.next_event
    }

    /// Makes every queued event due again, for restarting a replay.
    pub fn rewind(&mut self) {
        self.events
            .sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
        self.next_event = 0;
    }
}
