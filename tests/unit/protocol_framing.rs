//! Unit tests for stage framing over a scripted link.

use std::collections::VecDeque;
use std::time::Duration;

use embedded_hal_mock::eh1::delay::NoopDelay;
use heapless::String;

use stage_motion::config::{AxisBounds, DriverConfig, DriverKind, SafetyEnvelope, SystemConfig};
use stage_motion::driver::{
    Driver, DriverSession, GscProtocol, Link, QtProtocol, SessionState, StageDriver, StageSettings,
};
use stage_motion::error::{ConnectionError, Error};
use stage_motion::gcode::{Interpreter, Xy};
use stage_motion::job::{Dispatcher, JobContext, SequenceStatus};

/// Records frames and replays scripted replies (`None` = timeout).
#[derive(Default)]
struct ScriptedLink {
    sent: Vec<std::string::String>,
    replies: VecDeque<Option<&'static str>>,
    closed: bool,
}

impl ScriptedLink {
    fn replying(replies: &[Option<&'static str>]) -> Self {
        Self {
            replies: replies.iter().copied().collect(),
            ..Default::default()
        }
    }
}

impl Link for ScriptedLink {
    fn write_line(&mut self, line: &str, _timeout: Duration) -> Result<(), ConnectionError> {
        if self.closed {
            return Err(ConnectionError::Closed);
        }
        self.sent.push(line.to_string());
        Ok(())
    }

    fn read_line(&mut self, _timeout: Duration) -> Result<Option<String<64>>, ConnectionError> {
        Ok(self
            .replies
            .pop_front()
            .flatten()
            .and_then(|r| String::try_from(r).ok()))
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        self.closed = true;
        Ok(())
    }
}

fn settings(kind: DriverKind, enable_response: bool) -> StageSettings {
    let mut config = DriverConfig::physical(kind, "COM1", 0.01);
    config.enable_response = enable_response;
    config.timeouts.home_ms = 300;
    StageSettings::from_config(&config, 2).expect("valid driver config")
}

/// Open, home and one G-code cut on the acknowledged protocol.
#[test]
fn test_qt_gcode_session() {
    let link = ScriptedLink::replying(&[
        Some("OK"), // X:1
        Some("OK"), // H:A B
        Some("R"),  // !:
        Some("OK"), // D:A
        Some("OK"), // D:B
        Some("OK"), // MGO
    ]);
    let mut drv = StageDriver::open(QtProtocol, link, NoopDelay::new(), settings(DriverKind::Chuo, true))
        .expect("open succeeds");
    drv.home().expect("home succeeds");

    let mut interp = Interpreter::<Xy>::new();
    interp
        .execute_line("G21 G90 G1 X1.2 Y-0.4 F600", &mut drv)
        .expect("move succeeds");

    assert_eq!(
        drv.link().sent,
        [
            "X:1",
            "H:A B",
            "!:",
            "D:A,1000,1000,100",
            "D:B,1000,1000,100",
            "MGO:A120 B-40",
        ]
    );
    assert_eq!(drv.pulse_axes()[0].position().0, 120);
    assert_eq!(drv.pulse_axes()[1].position().0, -40);
    assert_eq!(drv.state(), SessionState::Idle);
}

/// Sub-pulse moves are carried until they add up to a pulse.
#[test]
fn test_gsc_remainder_carry() {
    let link = ScriptedLink::replying(&[Some("R")]);
    let mut drv = StageDriver::open(GscProtocol, link, NoopDelay::new(), settings(DriverKind::Gsc02, false))
        .expect("open succeeds");
    drv.home().expect("home succeeds");

    let mut interp = Interpreter::<Xy>::new();
    interp.execute_line("G91", &mut drv).expect("mode switch");
    for _ in 0..3 {
        interp.execute_line("G0 X0.004", &mut drv).expect("move succeeds");
    }

    assert_eq!(drv.link().sent, ["H:W+-", "G", "!:", "M:1+P1", "G"]);
    assert_eq!(drv.pulse_axes()[0].position().0, 1);
    assert!((drv.position().x() - 0.012).abs() < 1e-12);
}

/// A missing acknowledgement is retried once before failing.
#[test]
fn test_qt_open_retry() {
    let link = ScriptedLink::replying(&[None, Some("OK")]);
    let drv = StageDriver::open(QtProtocol, link, NoopDelay::new(), settings(DriverKind::Chuo, true))
        .expect("second attempt acknowledged");
    assert_eq!(drv.link().sent, ["X:1", "X:1"]);
}

/// A home timeout is fatal to the sequence and the link is still closed.
#[test]
fn test_home_timeout_is_fatal() {
    let envelope = SafetyEnvelope::xy(AxisBounds::new(0.0, 100.0), AxisBounds::new(0.0, 100.0), 3000.0);
    let config = SystemConfig::new(envelope);
    let dispatcher = Dispatcher::new(JobContext::from_config(&config), config.sequence);

    let link = ScriptedLink::replying(&[Some("OK"), Some("OK"), Some("B"), Some("B")]);
    let drv = StageDriver::open(QtProtocol, link, NoopDelay::new(), settings(DriverKind::Chuo, true))
        .expect("open succeeds");
    let mut session = DriverSession::new(drv, envelope);

    let report = dispatcher.run(&mut session);
    assert!(matches!(
        report.status,
        SequenceStatus::Fatal(Error::Connection(ConnectionError::HomeTimeout { .. }))
    ));
    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.inner().link().closed);
}
