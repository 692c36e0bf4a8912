//! Tracks: ordered waypoints with pen state.

use alloc::vec::Vec;

use super::Point;

/// Whether a segment marks (`Down`) or travels (`Up`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenState {
    /// Rapid, non-marking travel.
    Up,
    /// Cutting or drawing.
    Down,
}

/// One resolved waypoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    /// Absolute machine position in mm.
    pub point: Point,
    /// Pen state while travelling to `point`.
    pub pen: PenState,
}

impl Waypoint {
    /// Pen-up waypoint.
    pub const fn up(point: Point) -> Self {
        Self { point, pen: PenState::Up }
    }

    /// Pen-down waypoint.
    pub const fn down(point: Point) -> Self {
        Self { point, pen: PenState::Down }
    }
}

/// Waypoints of one input path in traversal order.
///
/// Consecutive waypoints never share both position and pen state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    waypoints: Vec<Waypoint>,
}

impl Track {
    /// Create an empty track.
    pub const fn new() -> Self {
        Self { waypoints: Vec::new() }
    }

    /// Build the canonical track for a polyline: lift, travel to the
    /// start, lower, then cut through every point.
    pub fn from_polyline(points: &[Point]) -> Self {
        let mut track = Self::new();
        if let Some(&start) = points.first() {
            track.push(Waypoint::up(start));
            for &p in points {
                track.push(Waypoint::down(p));
            }
        }
        track
    }

    /// Append a waypoint unless it repeats the last one.
    ///
    /// Returns `false` when the waypoint was dropped.
    pub fn push(&mut self, waypoint: Waypoint) -> bool {
        if self.waypoints.last() == Some(&waypoint) {
            return false;
        }
        self.waypoints.push(waypoint);
        true
    }

    /// Replace the last waypoint, or push if empty.
    pub(crate) fn replace_last(&mut self, waypoint: Waypoint) {
        match self.waypoints.last_mut() {
            Some(last) => *last = waypoint,
            None => self.waypoints.push(waypoint),
        }
    }

    /// All waypoints.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Number of waypoints.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Whether the track holds no waypoints.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Last waypoint.
    pub fn last(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    /// Whether any waypoint marks.
    pub fn has_cut(&self) -> bool {
        self.waypoints.iter().any(|w| w.pen == PenState::Down)
    }

    /// Pen-down waypoints, in order.
    pub fn cut_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.waypoints
            .iter()
            .filter(|w| w.pen == PenState::Down)
            .map(|w| w.point)
    }

    /// Whether the first and last cut points are within `tolerance`.
    pub fn is_closed(&self, tolerance: f64) -> bool {
        let mut cuts = self.cut_points();
        let (Some(first), Some(last)) = (cuts.next(), cuts.last()) else {
            return false;
        };
        first.distance(&last) <= tolerance
    }

    /// Total pen-down length.
    pub fn cut_length(&self) -> f64 {
        self.waypoints
            .windows(2)
            .filter(|w| w[1].pen == PenState::Down)
            .map(|w| w[0].point.distance(&w[1].point))
            .sum()
    }
}
