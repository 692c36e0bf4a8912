//! Driver selection and connection parameters from TOML.

use core::time::Duration;

use heapless::String;
use serde::Deserialize;

use super::units::MmPerMin;

/// Which sink a session is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// In-memory recording sink.
    #[default]
    Sim,
    /// Pulse-count controller with `M:`/`G` framing (variant A).
    Gsc02,
    /// Controller with `MGO:` framing and mandatory acknowledgements (variant B).
    Chuo,
}

impl DriverKind {
    /// Name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            DriverKind::Sim => "sim",
            DriverKind::Gsc02 => "gsc02",
            DriverKind::Chuo => "chuo",
        }
    }

    /// Whether this kind talks to hardware.
    pub const fn is_physical(self) -> bool {
        !matches!(self, DriverKind::Sim)
    }
}

/// Independent timeout budgets for a physical link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DriverTimeouts {
    /// Opening the port.
    pub open_ms: u32,
    /// Writing one frame.
    pub write_ms: u32,
    /// Waiting for one reply line.
    pub read_ms: u32,
    /// Waiting for home-complete.
    pub home_ms: u32,
    /// Interval between ready polls while homing.
    pub poll_ms: u32,
}

impl Default for DriverTimeouts {
    fn default() -> Self {
        Self {
            open_ms: 2000,
            write_ms: 1000,
            read_ms: 1000,
            home_ms: 60_000,
            poll_ms: 100,
        }
    }
}

impl DriverTimeouts {
    /// Write timeout as a Duration.
    pub fn write(&self) -> Duration {
        Duration::from_millis(self.write_ms as u64)
    }

    /// Read timeout as a Duration.
    pub fn read(&self) -> Duration {
        Duration::from_millis(self.read_ms as u64)
    }

    /// Open timeout as a Duration.
    pub fn open(&self) -> Duration {
        Duration::from_millis(self.open_ms as u64)
    }
}

fn default_ramp_ms() -> u32 {
    100
}

/// Speed defaults (`driver_settings`).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DriverSettings {
    /// Speed used for rapid moves.
    #[serde(default)]
    pub rapid_speed: Option<MmPerMin>,
    /// Speed used for cutting moves when no feed was programmed.
    #[serde(default)]
    pub cut_speed: Option<MmPerMin>,
    /// Controller ramp time in milliseconds.
    #[serde(default = "default_ramp_ms")]
    pub accel: u32,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            rapid_speed: None,
            cut_speed: None,
            accel: default_ramp_ms(),
        }
    }
}

fn default_baud() -> u32 {
    9600
}

fn default_true() -> bool {
    true
}

fn default_home_dirs() -> String<8> {
    let mut s = String::new();
    let _ = s.push_str("+-");
    s
}

/// Driver configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DriverConfig {
    /// Driver kind.
    #[serde(default)]
    pub kind: DriverKind,

    /// Serial port identifier (physical drivers).
    #[serde(default)]
    pub port: Option<String<64>>,

    /// Baud rate.
    #[serde(default = "default_baud")]
    pub baud: u32,

    /// Millimetres per controller pulse (physical drivers).
    #[serde(default)]
    pub mm_per_pulse: Option<f64>,

    /// Wait for an acknowledgement after each frame (variant A only; variant B always waits).
    #[serde(default = "default_true")]
    pub enable_response: bool,

    /// Accept absolute moves before the first home.
    #[serde(default)]
    pub allow_unhomed: bool,

    /// Home direction per axis, e.g. `"+-"`.
    #[serde(default = "default_home_dirs")]
    pub home_dirs: String<8>,

    /// Timeout budgets.
    #[serde(default)]
    pub timeouts: DriverTimeouts,

    /// Speed defaults.
    #[serde(default)]
    pub settings: DriverSettings,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            kind: DriverKind::Sim,
            port: None,
            baud: default_baud(),
            mm_per_pulse: None,
            enable_response: true,
            allow_unhomed: false,
            home_dirs: default_home_dirs(),
            timeouts: DriverTimeouts::default(),
            settings: DriverSettings::default(),
        }
    }
}

impl DriverConfig {
    /// A simulation driver configuration.
    pub fn sim() -> Self {
        Self::default()
    }

    /// A physical driver configuration with the required parameters filled in.
    pub fn physical(kind: DriverKind, port: &str, mm_per_pulse: f64) -> Self {
        Self {
            kind,
            port: Some(crate::error::truncated(port)),
            mm_per_pulse: Some(mm_per_pulse),
            ..Self::default()
        }
    }

    /// Home direction characters as booleans (`true` = positive).
    pub fn home_positive(&self) -> [bool; 2] {
        let mut out = [true, false];
        for (slot, c) in out.iter_mut().zip(self.home_dirs.chars()) {
            *slot = c == '+';
        }
        out
    }
}
