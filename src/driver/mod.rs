//! Driver abstraction and implementations.
//!
//! Every sink implements [`Driver`]. A [`DriverSession`] wraps one and is the
//! single place where targets are checked against the
//! [`SafetyEnvelope`](crate::config::SafetyEnvelope).
//!
//! - [`SimDriver`] records waypoints into [`Track`](crate::geometry::Track)s
//! - [`StageDriver`] speaks a [`StageProtocol`] over a [`Link`]

mod any;
#[cfg(feature = "std")]
mod delay;
mod link;
mod protocol;
mod pulse;
#[cfg(feature = "serial")]
mod serial;
mod session;
mod sim;
mod stage;

use alloc::boxed::Box;

use crate::error::Result;
use crate::gcode::Coords;

pub use any::AnyDriver;
#[cfg(feature = "std")]
pub use any::open_driver;
#[cfg(feature = "std")]
pub use delay::StdDelay;
pub use link::{Link, TERMINATOR};
pub use protocol::{AckPolicy, Frame, Frames, GscProtocol, QtProtocol, StageProtocol};
pub use pulse::PulseAxis;
#[cfg(feature = "serial")]
pub use serial::SerialLink;
pub use session::DriverSession;
pub use sim::SimDriver;
pub use stage::{StageDriver, StageSettings};

/// Lifecycle of a driver.
///
/// `Closed → Open → Homed → Moving ⇄ Idle → Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection.
    Closed,
    /// Connected, position not referenced.
    Open,
    /// Referenced, no move issued yet.
    Homed,
    /// A move is being executed.
    Moving,
    /// Referenced and at rest.
    Idle,
}

impl SessionState {
    /// State name for display/debugging.
    pub const fn name(self) -> &'static str {
        match self {
            SessionState::Closed => "Closed",
            SessionState::Open => "Open",
            SessionState::Homed => "Homed",
            SessionState::Moving => "Moving",
            SessionState::Idle => "Idle",
        }
    }

    /// Whether the position is referenced.
    pub const fn is_referenced(self) -> bool {
        matches!(
            self,
            SessionState::Homed | SessionState::Moving | SessionState::Idle
        )
    }
}

/// Capability set of every motion sink.
pub trait Driver {
    /// Return to the reference position and reset the tracked position.
    fn home(&mut self) -> Result<()>;

    /// Notify the sink of the program units. Targets are always millimetres.
    fn set_units_mm(&mut self, mm: bool) -> Result<()>;

    /// Set the cutting feed in mm/min.
    fn set_feed(&mut self, feed: f64) -> Result<()>;

    /// Move to an absolute target in millimetres.
    fn move_absolute(&mut self, target: &Coords, cutting: bool) -> Result<()>;

    /// Speed in mm/min the next move of this kind would run at, if the sink
    /// programs one.
    fn move_feed(&self, cutting: bool) -> Option<f64>;

    /// Pause for `ms` milliseconds.
    fn dwell(&mut self, ms: u32) -> Result<()>;

    /// Release the sink. Calling it again is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Last commanded absolute position.
    fn position(&self) -> Coords;

    /// Current lifecycle state.
    fn state(&self) -> SessionState;

    /// Number of axes the sink tracks.
    fn axes(&self) -> usize;
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn home(&mut self) -> Result<()> {
        (**self).home()
    }

    fn set_units_mm(&mut self, mm: bool) -> Result<()> {
        (**self).set_units_mm(mm)
    }

    fn set_feed(&mut self, feed: f64) -> Result<()> {
        (**self).set_feed(feed)
    }

    fn move_absolute(&mut self, target: &Coords, cutting: bool) -> Result<()> {
        (**self).move_absolute(target, cutting)
    }

    fn move_feed(&self, cutting: bool) -> Option<f64> {
        (**self).move_feed(cutting)
    }

    fn dwell(&mut self, ms: u32) -> Result<()> {
        (**self).dwell(ms)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn position(&self) -> Coords {
        (**self).position()
    }

    fn state(&self) -> SessionState {
        (**self).state()
    }

    fn axes(&self) -> usize {
        (**self).axes()
    }
}
