//! Envelope-checked driver binding.

use crate::config::SafetyEnvelope;
use crate::error::{DriverError, Error, Result};
use crate::gcode::Coords;

use super::{Driver, SessionState};

/// A driver bound to a [`SafetyEnvelope`].
///
/// Every target and feed is checked here before it reaches the driver,
/// including the configured rapid and cut speeds a driver falls back to. A
/// rejected move leaves the session usable. The driver is closed when the
/// session is dropped.
pub struct DriverSession<D: Driver> {
    driver: D,
    envelope: SafetyEnvelope,
}

impl<D: Driver> DriverSession<D> {
    /// Bind `driver` to `envelope`.
    pub fn new(driver: D, envelope: SafetyEnvelope) -> Self {
        Self { driver, envelope }
    }

    /// The bounds in force.
    pub fn envelope(&self) -> &SafetyEnvelope {
        &self.envelope
    }

    /// The wrapped driver.
    pub fn inner(&self) -> &D {
        &self.driver
    }

    /// The wrapped driver, mutably. Bypasses the envelope.
    pub fn inner_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

impl<D: Driver> Driver for DriverSession<D> {
    fn home(&mut self) -> Result<()> {
        self.driver.home()
    }

    fn set_units_mm(&mut self, mm: bool) -> Result<()> {
        self.driver.set_units_mm(mm)
    }

    fn set_feed(&mut self, feed: f64) -> Result<()> {
        self.envelope.check_feed(feed)?;
        self.driver.set_feed(feed)
    }

    fn move_absolute(&mut self, target: &Coords, cutting: bool) -> Result<()> {
        let state = self.driver.state();
        if state == SessionState::Closed {
            return Err(Error::Driver(DriverError::InvalidState {
                operation: "move_absolute",
                state: state.name(),
            }));
        }

        let axes = self.driver.axes();
        if target.dims() < axes {
            return Err(Error::Driver(DriverError::AxisMismatch {
                expected: axes,
                got: target.dims(),
            }));
        }

        let target = target.with_dims(axes);
        self.envelope.check(&target)?;
        if let Some(feed) = self.driver.move_feed(cutting) {
            self.envelope.check_feed(feed)?;
        }
        self.driver.move_absolute(&target, cutting)
    }

    fn move_feed(&self, cutting: bool) -> Option<f64> {
        self.driver.move_feed(cutting)
    }

    fn dwell(&mut self, ms: u32) -> Result<()> {
        self.driver.dwell(ms)
    }

    fn close(&mut self) -> Result<()> {
        self.driver.close()
    }

    fn position(&self) -> Coords {
        self.driver.position()
    }

    fn state(&self) -> SessionState {
        self.driver.state()
    }

    fn axes(&self) -> usize {
        self.driver.axes()
    }
}

impl<D: Driver> Drop for DriverSession<D> {
    fn drop(&mut self) {
        if self.driver.state() != SessionState::Closed {
            if let Err(_e) = self.driver.close() {
                warn!("session: close on drop failed");
            }
        }
    }
}
