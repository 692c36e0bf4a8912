//! Recording driver.

use alloc::vec::Vec;

use crate::error::{DriverError, Error, Result};
use crate::gcode::Coords;
use crate::geometry::{PenState, Point, Track, Waypoint};

use super::{Driver, SessionState};

/// Records every move as [`Track`] waypoints.
///
/// A rapid after cutting starts a new track; a cut after travel first
/// lowers the pen at the current position. Moves are accepted before
/// homing.
#[derive(Debug, Clone)]
pub struct SimDriver {
    axes: usize,
    position: Coords,
    state: SessionState,
    feed: Option<f64>,
    units_mm: bool,
    tracks: Vec<Track>,
    moves: usize,
    dwell_ms: u64,
}

impl SimDriver {
    /// Create an open simulation sink tracking `axes` axes.
    pub fn new(axes: usize) -> Self {
        Self {
            axes,
            position: Coords::zeros(axes),
            state: SessionState::Open,
            feed: None,
            units_mm: true,
            tracks: Vec::new(),
            moves: 0,
            dwell_ms: 0,
        }
    }

    /// Recorded tracks that contain at least one cut.
    pub fn tracks(&self) -> Vec<&Track> {
        self.tracks.iter().filter(|t| t.has_cut()).collect()
    }

    /// Take the recorded tracks, leaving the recorder empty.
    pub fn take_tracks(&mut self) -> Vec<Track> {
        core::mem::take(&mut self.tracks)
            .into_iter()
            .filter(Track::has_cut)
            .collect()
    }

    /// Last programmed feed.
    pub fn feed(&self) -> Option<f64> {
        self.feed
    }

    /// Whether the last units notification was millimetres.
    pub fn units_mm(&self) -> bool {
        self.units_mm
    }

    /// Number of accepted moves.
    pub fn moves(&self) -> usize {
        self.moves
    }

    /// Total dwell time requested.
    pub fn dwell_ms(&self) -> u64 {
        self.dwell_ms
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(Error::Driver(DriverError::InvalidState {
                operation,
                state: self.state.name(),
            }));
        }
        Ok(())
    }

    fn current(&mut self) -> &mut Track {
        if self.tracks.is_empty() {
            self.tracks.push(Track::new());
        }
        let last = self.tracks.len() - 1;
        &mut self.tracks[last]
    }

    fn record(&mut self, to: Point, cutting: bool) {
        let from = Point::new(self.position.x(), self.position.y());
        let track = self.current();

        if cutting {
            if track.last().map_or(true, |w| w.pen == PenState::Up) {
                track.push(Waypoint::down(from));
            }
            track.push(Waypoint::down(to));
        } else if track.has_cut() {
            let mut fresh = Track::new();
            fresh.push(Waypoint::up(to));
            self.tracks.push(fresh);
        } else {
            track.replace_last(Waypoint::up(to));
        }
    }
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Driver for SimDriver {
    fn home(&mut self) -> Result<()> {
        self.ensure_open("home")?;
        if self.tracks.last().is_some_and(|t| !t.is_empty()) {
            self.tracks.push(Track::new());
        }
        self.position = Coords::zeros(self.axes);
        self.state = SessionState::Homed;
        debug!("sim: homed");
        Ok(())
    }

    fn set_units_mm(&mut self, mm: bool) -> Result<()> {
        self.ensure_open("set_units_mm")?;
        self.units_mm = mm;
        Ok(())
    }

    fn set_feed(&mut self, feed: f64) -> Result<()> {
        self.ensure_open("set_feed")?;
        self.feed = Some(feed);
        Ok(())
    }

    fn move_absolute(&mut self, target: &Coords, cutting: bool) -> Result<()> {
        self.ensure_open("move_absolute")?;
        self.record(Point::new(target.x(), target.y()), cutting);
        self.position = target.with_dims(self.axes);
        self.moves += 1;
        if self.state != SessionState::Open {
            self.state = SessionState::Idle;
        }
        Ok(())
    }

    fn move_feed(&self, cutting: bool) -> Option<f64> {
        self.feed.filter(|_| cutting)
    }

    fn dwell(&mut self, ms: u32) -> Result<()> {
        self.ensure_open("dwell")?;
        self.dwell_ms += u64::from(ms);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.state != SessionState::Closed {
            self.state = SessionState::Closed;
            debug!("sim: closed after {} moves", self.moves);
        }
        Ok(())
    }

    fn position(&self) -> Coords {
        self.position
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn axes(&self) -> usize {
        self.axes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rapid_cut_rapid_splits_tracks() {
        let mut sim = SimDriver::new(2);

        sim.move_absolute(&Coords::xy(1.0, 1.0), false).unwrap();
        sim.move_absolute(&Coords::xy(2.0, 1.0), true).unwrap();
        sim.move_absolute(&Coords::xy(5.0, 5.0), false).unwrap();
        sim.move_absolute(&Coords::xy(6.0, 5.0), true).unwrap();

        let tracks = sim.take_tracks();
        assert_eq!(tracks.len(), 2);
        assert_eq!(
            tracks[0].waypoints(),
            [
                Waypoint::up(Point::new(1.0, 1.0)),
                Waypoint::down(Point::new(1.0, 1.0)),
                Waypoint::down(Point::new(2.0, 1.0)),
            ]
        );
        assert!(sim.tracks().is_empty());
    }

    #[test]
    fn test_consecutive_rapids_collapse() {
        let mut sim = SimDriver::new(2);
        sim.move_absolute(&Coords::xy(1.0, 0.0), false).unwrap();
        sim.move_absolute(&Coords::xy(3.0, 0.0), false).unwrap();
        sim.move_absolute(&Coords::xy(4.0, 0.0), true).unwrap();

        let tracks = sim.tracks();
        assert_eq!(tracks[0].waypoints()[0], Waypoint::up(Point::new(3.0, 0.0)));
    }

    #[test]
    fn test_home_resets_and_breaks_track() {
        let mut sim = SimDriver::new(3);
        sim.move_absolute(&Coords::xyz(0.0, 0.0, 0.0), true).unwrap();
        sim.move_absolute(&Coords::xyz(4.0, 0.0, 0.0), true).unwrap();
        sim.home().unwrap();
        sim.move_absolute(&Coords::xyz(1.0, 0.0, 0.0), true).unwrap();

        assert_eq!(sim.state(), SessionState::Idle);
        assert_eq!(sim.tracks().len(), 2);
        assert_eq!(sim.tracks()[1].waypoints()[0], Waypoint::down(Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_closed_rejects() {
        let mut sim = SimDriver::default();
        sim.close().unwrap();
        assert!(sim.move_absolute(&Coords::xy(0.0, 0.0), false).is_err());
        assert!(sim.close().is_ok());
    }
}
