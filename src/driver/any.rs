//! Driver selected at session construction.

use alloc::boxed::Box;

use crate::error::Result;
use crate::gcode::Coords;

use super::sim::SimDriver;
use super::{Driver, SessionState};

/// The simulation sink or any boxed physical driver.
pub enum AnyDriver {
    /// Recording sink.
    Sim(SimDriver),
    /// Physical stage.
    Stage(Box<dyn Driver>),
}

impl AnyDriver {
    /// The simulation sink, if selected.
    pub fn sim(&self) -> Option<&SimDriver> {
        match self {
            AnyDriver::Sim(s) => Some(s),
            AnyDriver::Stage(_) => None,
        }
    }

    /// The simulation sink, mutably, if selected.
    pub fn sim_mut(&mut self) -> Option<&mut SimDriver> {
        match self {
            AnyDriver::Sim(s) => Some(s),
            AnyDriver::Stage(_) => None,
        }
    }

    fn inner(&mut self) -> &mut dyn Driver {
        match self {
            AnyDriver::Sim(s) => s,
            AnyDriver::Stage(d) => &mut **d,
        }
    }

    fn inner_ref(&self) -> &dyn Driver {
        match self {
            AnyDriver::Sim(s) => s,
            AnyDriver::Stage(d) => &**d,
        }
    }
}

impl From<SimDriver> for AnyDriver {
    fn from(sim: SimDriver) -> Self {
        AnyDriver::Sim(sim)
    }
}

impl Driver for AnyDriver {
    fn home(&mut self) -> Result<()> {
        self.inner().home()
    }

    fn set_units_mm(&mut self, mm: bool) -> Result<()> {
        self.inner().set_units_mm(mm)
    }

    fn set_feed(&mut self, feed: f64) -> Result<()> {
        self.inner().set_feed(feed)
    }

    fn move_absolute(&mut self, target: &Coords, cutting: bool) -> Result<()> {
        self.inner().move_absolute(target, cutting)
    }

    fn move_feed(&self, cutting: bool) -> Option<f64> {
        self.inner_ref().move_feed(cutting)
    }

    fn dwell(&mut self, ms: u32) -> Result<()> {
        self.inner().dwell(ms)
    }

    fn close(&mut self) -> Result<()> {
        self.inner().close()
    }

    fn position(&self) -> Coords {
        self.inner_ref().position()
    }

    fn state(&self) -> SessionState {
        self.inner_ref().state()
    }

    fn axes(&self) -> usize {
        self.inner_ref().axes()
    }
}

/// Open the driver named by `config` for a stage with `axes` axes.
///
/// # Errors
///
/// Returns a configuration error for missing parameters or when the
/// `serial` feature is disabled, and a connection error when the port
/// cannot be opened.
#[cfg(feature = "std")]
pub fn open_driver(config: &crate::config::DriverConfig, axes: usize) -> Result<AnyDriver> {
    use crate::config::DriverKind;

    match config.kind {
        DriverKind::Sim => {
            info!("driver: sim, {} axes", axes);
            Ok(AnyDriver::Sim(SimDriver::new(axes)))
        }
        DriverKind::Gsc02 | DriverKind::Chuo => open_stage(config, axes).map(AnyDriver::Stage),
    }
}

#[cfg(feature = "serial")]
fn open_stage(config: &crate::config::DriverConfig, axes: usize) -> Result<Box<dyn Driver>> {
    use crate::config::DriverKind;
    use crate::error::ConfigError;

    use super::delay::StdDelay;
    use super::protocol::{GscProtocol, QtProtocol};
    use super::serial::SerialLink;
    use super::stage::{StageDriver, StageSettings};

    let settings = StageSettings::from_config(config, axes)?;
    let port = config.port.as_ref().ok_or(ConfigError::MissingParameter {
        section: config.kind.name(),
        parameter: "port",
    })?;

    let rtscts = config.kind == DriverKind::Gsc02;
    let link = SerialLink::open(port, config.baud, config.timeouts.open(), rtscts)?;
    info!("driver: {} on {}", config.kind.name(), port.as_str());

    let driver: Box<dyn Driver> = match config.kind {
        DriverKind::Chuo => Box::new(StageDriver::open(QtProtocol, link, StdDelay, settings)?),
        _ => Box::new(StageDriver::open(GscProtocol, link, StdDelay, settings)?),
    };
    Ok(driver)
}

#[cfg(all(feature = "std", not(feature = "serial")))]
fn open_stage(config: &crate::config::DriverConfig, _axes: usize) -> Result<Box<dyn Driver>> {
    use crate::error::{truncated, ConfigError};

    warn!("driver: {} needs the serial feature", config.kind.name());
    Err(ConfigError::Unsupported(truncated(config.kind.name())).into())
}
