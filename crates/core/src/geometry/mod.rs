//! Flattening of chart paths into timestamped polylines.
//!
//! Consecutive points of a path are joined by a cubic Bézier curve whose
//! handles follow each point's facing angle: the leading handle points along
//! the earlier point's angle, the trailing handle points against the later
//! point's angle, and both are half the distance between the two points.
//! Curves are flattened by recursive midpoint subdivision until each piece
//! passes a flatness test.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{ChartPoint, Vec2};

/// Subdivision depth cap. Bounds the output to `2^MAX_DEPTH` pieces per curve.
const MAX_DEPTH: u32 = 16;

/// Squared distance below which consecutive flattened points are merged.
const MERGE_EPSILON_SQ: f64 = 1e-18;

/// One straight piece of a flattened path, revealed at `t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub t: f64,
}

/// Bézier control polygon between `from` and `to`.
pub fn control_points(from: &ChartPoint, to: &ChartPoint) -> [Vec2; 4] {
    let handle = (to.x - from.x).hypot(to.y - from.y) / 2.0;
    [
        Vec2::new(from.x, from.y),
        Vec2::new(
            from.x + from.angle.cos() * handle,
            from.y + from.angle.sin() * handle,
        ),
        Vec2::new(
            to.x + (to.angle + std::f64::consts::PI).cos() * handle,
            to.y + (to.angle + std::f64::consts::PI).sin() * handle,
        ),
        Vec2::new(to.x, to.y),
    ]
}

/// Flattens one cubic curve into a polyline that starts at the first control
/// point and ends at the last.
pub fn flatten_cubic(curve: [Vec2; 4], tolerance: f64) -> Vec<Vec2> {
    let mut out = vec![curve[0]];
    subdivide(curve, tolerance * tolerance, 0, &mut out);
    out
}

fn subdivide(curve: [Vec2; 4], limit_sq: f64, depth: u32, out: &mut Vec<Vec2>) {
    if depth >= MAX_DEPTH || flatness_sq(&curve) <= limit_sq {
        let end = curve[3];
        let last = out[out.len() - 1];
        let (dx, dy) = (end.x - last.x, end.y - last.y);
        if dx * dx + dy * dy > MERGE_EPSILON_SQ {
            out.push(end);
        }
        return;
    }

    let [p0, p1, p2, p3] = curve;
    let q0 = midpoint(p0, p1);
    let q1 = midpoint(p1, p2);
    let q2 = midpoint(p2, p3);
    let r0 = midpoint(q0, q1);
    let r1 = midpoint(q1, q2);
    let split = midpoint(r0, r1);

    subdivide([p0, q0, r0, split], limit_sq, depth + 1, out);
    subdivide([split, r1, q2, p3], limit_sq, depth + 1, out);
}

// Squared distance of the inner control points from the chord. The curve
// lies inside the control polygon, so this bounds its deviation too.
fn flatness_sq(curve: &[Vec2; 4]) -> f64 {
    let [p0, p1, p2, p3] = curve;
    distance_to_chord_sq(*p1, *p0, *p3).max(distance_to_chord_sq(*p2, *p0, *p3))
}

fn distance_to_chord_sq(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let (px, py) = (p.x - a.x, p.y - a.y);
    if len_sq <= MERGE_EPSILON_SQ {
        return px * px + py * py;
    }
    let cross = px * dy - py * dx;
    cross * cross / len_sq
}

fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Lazy segment sequence for one path. Curves are flattened one point pair
/// at a time as the iterator is consumed. Calling [`flatten`] again restarts
/// the sequence from the first pair.
#[derive(Debug, Clone)]
pub struct Flatten<'a> {
    points: &'a [ChartPoint],
    next_pair: usize,
    tolerance: f64,
    pending: VecDeque<Segment>,
}

pub fn flatten(points: &[ChartPoint], tolerance: f64) -> Flatten<'_> {
    Flatten {
        points,
        next_pair: 1,
        tolerance,
        pending: VecDeque::new(),
    }
}

impl Flatten<'_> {
    fn refill(&mut self) {
        while self.pending.is_empty() && self.next_pair < self.points.len() {
            let from = &self.points[self.next_pair - 1];
            let to = &self.points[self.next_pair];
            self.next_pair += 1;

            let line = flatten_cubic(control_points(from, to), self.tolerance);
            let steps = (line.len() - 1) as f64;
            for (j, pair) in line.windows(2).enumerate() {
                let fraction = (j + 1) as f64 / steps;
                self.pending.push_back(Segment {
                    x1: pair[0].x,
                    y1: pair[0].y,
                    x2: pair[1].x,
                    y2: pair[1].y,
                    t: from.time + (to.time - from.time) * fraction,
                });
            }
        }
    }
}

impl Iterator for Flatten<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        self.refill();
        self.pending.pop_front()
    }
}

/// Preloaded flattened geometry for every path of a chart.
#[derive(Debug, Clone, Default)]
pub struct PathGeometry {
    paths: Vec<Vec<Segment>>,
}

impl PathGeometry {
    pub fn build(paths: &[Vec<ChartPoint>], tolerance: f64) -> Self {
        let paths = paths
            .iter()
            .enumerate()
            .map(|(index, points)| {
                if points.len() < 2 {
                    tracing::warn!(path = index, "path has fewer than two points, no geometry");
                }
                flatten(points, tolerance).collect()
            })
            .collect();
        Self { paths }
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// All segments of a path; empty for unknown paths.
    pub fn segments(&self, path: usize) -> &[Segment] {
        self.paths.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Longest prefix of a path's segments whose timestamps are all `<= t`.
    pub fn visible_segments(&self, path: usize, t: f64) -> &[Segment] {
        let segments = self.segments(path);
        let visible = segments.iter().take_while(|s| s.t <= t).count();
        &segments[..visible]
    }

    /// End of the revealed part of a path, where a moving head would be drawn.
    pub fn head(&self, path: usize, t: f64) -> Option<Vec2> {
        self.visible_segments(path, t)
            .last()
            .map(|s| Vec2::new(s.x2, s.y2))
    }
}
