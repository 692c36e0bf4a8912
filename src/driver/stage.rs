//! Physical stage driver shared by both controller families.
//!
//! Generic over the frame encoding, the transport and the delay provider.

use embedded_hal::delay::DelayNs;
use heapless::String;

use crate::config::{DriverConfig, DriverSettings, DriverTimeouts};
use crate::error::{truncated, ConfigError, ConnectionError, DriverError, Error, Result};
use crate::gcode::Coords;
use crate::motion::MoveProfile;

use super::link::Link;
use super::protocol::{AckPolicy, StageProtocol};
use super::pulse::PulseAxis;
use super::{Driver, SessionState};

/// Validated parameters for a [`StageDriver`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageSettings {
    /// Millimetres per pulse (> 0).
    pub mm_per_pulse: f64,
    /// Wait for acknowledgements where the protocol makes them optional.
    pub enable_response: bool,
    /// Accept moves before the first successful home.
    pub allow_unhomed: bool,
    /// Home direction of X and Y (`true` = positive).
    pub home_positive: [bool; 2],
    /// Timeout budgets.
    pub timeouts: DriverTimeouts,
    /// Speed defaults.
    pub speeds: DriverSettings,
    /// Axes tracked by the session (2 or 3). Only X and Y are sent.
    pub axes: usize,
}

impl StageSettings {
    /// Build settings from a driver configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `mm_per_pulse` is missing or not positive.
    pub fn from_config(config: &DriverConfig, axes: usize) -> Result<Self> {
        let mm_per_pulse = config.mm_per_pulse.ok_or(Error::Config(ConfigError::MissingParameter {
            section: config.kind.name(),
            parameter: "mm_per_pulse",
        }))?;
        if !(mm_per_pulse > 0.0) {
            return Err(Error::Config(ConfigError::InvalidMmPerPulse(mm_per_pulse)));
        }

        Ok(Self {
            mm_per_pulse,
            enable_response: config.enable_response,
            allow_unhomed: config.allow_unhomed,
            home_positive: config.home_positive(),
            timeouts: config.timeouts,
            speeds: config.settings,
            axes,
        })
    }
}

/// Stage driver speaking protocol `P` over link `L`.
///
/// Generic over:
/// - `P`: frame encoding (must implement `StageProtocol`)
/// - `L`: transport (must implement `Link`)
/// - `D`: delay provider used for pacing and home polling (must implement `DelayNs`)
pub struct StageDriver<P, L, D>
where
    P: StageProtocol,
    L: Link,
    D: DelayNs,
{
    /// Frame encoding.
    protocol: P,

    /// Transport.
    link: L,

    /// Delay provider.
    delay: D,

    /// Validated parameters.
    settings: StageSettings,

    /// Acknowledgement handling resolved at open.
    ack: AckPolicy,

    /// Pulse bookkeeping for X and Y.
    pulse_axes: [PulseAxis; 2],

    /// Last commanded absolute position in mm.
    position: Coords,

    /// Lifecycle state.
    state: SessionState,

    /// Programmed cutting feed in mm/min.
    feed: Option<f64>,

    /// Speed last written to the controller, pulses/s.
    speed_pps: Option<u32>,

    /// Speed last written to the controller, mm/min.
    speed_mm_per_min: Option<f64>,
}

impl<P, L, D> StageDriver<P, L, D>
where
    P: StageProtocol,
    L: Link,
    D: DelayNs,
{
    /// Bind to an open link and send the protocol's open frames.
    ///
    /// The driver starts in `Open`; moves are rejected until [`home`](Driver::home)
    /// succeeds unless `allow_unhomed` is set.
    ///
    /// # Errors
    ///
    /// Returns a connection error if an open frame is not acknowledged. The
    /// link is closed in that case.
    pub fn open(protocol: P, link: L, delay: D, settings: StageSettings) -> Result<Self> {
        let ack = protocol.ack_policy(settings.enable_response);
        let mut driver = Self {
            protocol,
            link,
            delay,
            ack,
            pulse_axes: [PulseAxis::new(settings.mm_per_pulse); 2],
            position: Coords::zeros(settings.axes),
            settings,
            state: SessionState::Closed,
            feed: None,
            speed_pps: None,
            speed_mm_per_min: None,
        };

        for frame in driver.protocol.open_frames().iter() {
            if let Err(e) = driver.send(frame) {
                let _ = driver.link.close();
                return Err(e);
            }
        }

        driver.state = SessionState::Open;
        info!("{}: link open", P::NAME);
        Ok(driver)
    }

    /// The transport.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// The validated settings.
    pub fn settings(&self) -> &StageSettings {
        &self.settings
    }

    /// Pulse bookkeeping for X and Y.
    pub fn pulse_axes(&self) -> &[PulseAxis; 2] {
        &self.pulse_axes
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

    /// Write a command frame and handle its acknowledgement.
    fn send(&mut self, frame: &str) -> Result<()> {
        let attempts = match self.ack {
            AckPolicy::None => {
                trace!("{} -> {}", P::NAME, frame);
                self.link.write_line(frame, self.settings.timeouts.write())?;
                return Ok(());
            }
            AckPolicy::Required => 1,
            AckPolicy::RequiredWithRetry => 2,
        };

        for attempt in 0..attempts {
            if attempt > 0 {
                warn!("{}: no reply to '{}', resending", P::NAME, frame);
            }
            trace!("{} -> {}", P::NAME, frame);
            self.link.write_line(frame, self.settings.timeouts.write())?;

            if let Some(reply) = self.link.read_line(self.settings.timeouts.read())? {
                trace!("{} <- {}", P::NAME, reply.as_str());
                if self.protocol.is_ack(&reply) {
                    return Ok(());
                }
                return Err(Error::Connection(ConnectionError::Rejected {
                    frame: truncated(frame),
                    reply: truncated(&reply),
                }));
            }
        }

        Err(Error::Connection(ConnectionError::ReadTimeout {
            frame: truncated(frame),
        }))
    }

    /// Write a query frame and read its answer, if any arrived in time.
    fn query(&mut self, frame: &str) -> Result<Option<String<64>>> {
        trace!("{} -> {}", P::NAME, frame);
        self.link.write_line(frame, self.settings.timeouts.write())?;
        let reply = self.link.read_line(self.settings.timeouts.read())?;
        if let Some(r) = &reply {
            trace!("{} <- {}", P::NAME, r.as_str());
        }
        Ok(reply)
    }

    /// Program the controller speed unless it already runs at it.
    fn apply_speed(&mut self, mm_per_min: f64) -> Result<()> {
        let pps = self.pulse_axes[0].pulses_per_sec(mm_per_min);
        if self.speed_pps == Some(pps) {
            return Ok(());
        }

        let frames = self.protocol.speed_frames(pps, self.settings.speeds.accel);
        for frame in frames.iter() {
            self.send(frame)?;
        }
        debug!("{}: speed {} pulses/s", P::NAME, pps);
        self.speed_pps = Some(pps);
        self.speed_mm_per_min = Some(mm_per_min);
        Ok(())
    }

    /// Hold back the next frame until a fire-and-forget move should be done.
    fn pace(&mut self, distance_mm: f64) {
        let ms = match self.speed_mm_per_min {
            Some(feed) => {
                let velocity = feed / 60.0;
                let ramp_secs = self.settings.speeds.accel as f64 / 1000.0;
                let acceleration = if ramp_secs > 0.0 { velocity / ramp_secs } else { 0.0 };
                MoveProfile::trapezoidal(distance_mm, velocity, acceleration).duration_ms()
            }
            None => self.settings.timeouts.poll_ms,
        };
        if ms > 0 {
            self.delay.delay_ms(ms);
        }
    }

    fn run_home(&mut self) -> Result<()> {
        let frames = self.protocol.home_frames(self.settings.home_positive);
        for frame in frames.iter() {
            self.send(frame)?;
        }

        let query = self.protocol.ready_query();
        let timeouts = self.settings.timeouts;
        let mut waited: u32 = 0;
        loop {
            match self.query(&query)? {
                Some(reply) if self.protocol.is_ready(&reply) => break,
                Some(_) => {}
                None => waited = waited.saturating_add(timeouts.read_ms),
            }
            if waited >= timeouts.home_ms {
                return Err(Error::Connection(ConnectionError::HomeTimeout { waited_ms: waited }));
            }
            self.delay.delay_ms(timeouts.poll_ms);
            waited = waited.saturating_add(timeouts.poll_ms);
        }
        Ok(())
    }
}

impl<P, L, D> Driver for StageDriver<P, L, D>
where
    P: StageProtocol,
    L: Link,
    D: DelayNs,
{
    fn home(&mut self) -> Result<()> {
        self.ensure_open("home")?;
        self.state = SessionState::Moving;

        if let Err(e) = self.run_home() {
            // Position can no longer be trusted for relative pulse math.
            self.state = SessionState::Open;
            warn!("{}: home failed", P::NAME);
            return Err(e);
        }

        for axis in self.pulse_axes.iter_mut() {
            axis.reset();
        }
        self.position = Coords::zeros(self.settings.axes);
        self.state = SessionState::Homed;
        info!("{}: homed", P::NAME);
        Ok(())
    }

    fn set_units_mm(&mut self, mm: bool) -> Result<()> {
        self.ensure_open("set_units_mm")?;
        if !mm {
            debug!("{}: inch program, targets arrive converted to mm", P::NAME);
        }
        Ok(())
    }

    fn set_feed(&mut self, feed: f64) -> Result<()> {
        self.ensure_open("set_feed")?;
        self.feed = Some(feed);
        self.apply_speed(feed)
    }

    fn move_absolute(&mut self, target: &Coords, cutting: bool) -> Result<()> {
        self.ensure_open("move_absolute")?;
        if self.state == SessionState::Open && !self.settings.allow_unhomed {
            return Err(Error::Driver(DriverError::InvalidState {
                operation: "move_absolute",
                state: self.state.name(),
            }));
        }

        if let Some(s) = self.move_feed(cutting) {
            self.apply_speed(s)?;
        }

        let delta = [target.x() - self.position.x(), target.y() - self.position.y()];
        let pulses = [
            self.pulse_axes[0].preview(delta[0]),
            self.pulse_axes[1].preview(delta[1]),
        ];

        let previous = self.state;
        self.state = SessionState::Moving;
        for (i, frame) in self.protocol.move_frames(pulses).iter().enumerate() {
            if let Err(e) = self.send(frame) {
                if i == 0 {
                    self.state = previous;
                } else {
                    // The controller may hold a partial move.
                    self.state = SessionState::Open;
                    warn!("{}: move interrupted, position untrusted", P::NAME);
                }
                return Err(e);
            }
        }

        self.pulse_axes[0].advance(delta[0]);
        self.pulse_axes[1].advance(delta[1]);
        if self.ack == AckPolicy::None && (pulses[0] != 0 || pulses[1] != 0) {
            self.pace(libm::hypot(delta[0], delta[1]));
        }

        self.position = target.with_dims(self.settings.axes);
        self.state = SessionState::Idle;
        Ok(())
    }

    fn move_feed(&self, cutting: bool) -> Option<f64> {
        let speeds = self.settings.speeds;
        if cutting {
            self.feed.or(speeds.cut_speed.map(|s| s.0))
        } else {
            speeds.rapid_speed.map(|s| s.0).or(self.feed)
        }
    }

    fn dwell(&mut self, ms: u32) -> Result<()> {
        self.ensure_open("dwell")?;
        self.delay.delay_ms(ms);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;
        self.link.close()?;
        info!("{}: link closed", P::NAME);
        Ok(())
    }

    fn position(&self) -> Coords {
        self.position
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn axes(&self) -> usize {
        self.settings.axes
    }
}
