//! Error types for stage-motion.
//!
//! Provides unified error handling across configuration, safety checks,
//! controller links, driver state and geometry conversion.
//!
//! Malformed G-code is deliberately absent here: it is reported as a
//! [`ParseDiagnostic`](crate::gcode::ParseDiagnostic) and never aborts a job.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stage-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Move rejected by the safety envelope
    Safety(SafetyViolation),
    /// Controller link failure (open, write, read or home timeout)
    Connection(ConnectionError),
    /// Driver used in the wrong state
    Driver(DriverError),
    /// Geometry input could not be turned into tracks
    Geometry(GeometryError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// A parameter required by the selected driver is missing
    MissingParameter {
        /// Driver kind or job type that needs the parameter
        section: &'static str,
        /// Name of the missing parameter
        parameter: &'static str,
    },
    /// `mm_per_pulse` must be > 0
    InvalidMmPerPulse(f64),
    /// `px_to_mm` must be > 0
    InvalidScale(f64),
    /// `chord_mm` must be > 0
    InvalidChord(f64),
    /// Feed ceiling or feed value must be > 0
    InvalidFeed(f64),
    /// Envelope bounds with min > max
    InvalidBounds {
        /// Axis label
        axis: char,
        /// Minimum bound
        min: f64,
        /// Maximum bound
        max: f64,
    },
    /// A configured speed exceeds the envelope feed ceiling
    SpeedAboveMax {
        /// Parameter name
        parameter: &'static str,
        /// Configured speed in mm/min
        value: f64,
        /// Ceiling in mm/min
        max: f64,
    },
    /// A configured height lies outside the Z bounds
    OutsideBounds {
        /// Parameter name
        parameter: &'static str,
        /// Configured value in mm
        value: f64,
    },
    /// Home direction string must be two chars of '+' / '-'
    InvalidHomeDirs(heapless::String<8>),
    /// `y_flip` requested but no source height is known
    MissingSourceHeight,
    /// Job or driver kind recognised but not supported by this build
    Unsupported(heapless::String<32>),
    /// Two jobs share one identifier
    DuplicateJobId(heapless::String<32>),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// A move or feed request that falls outside the configured envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SafetyViolation {
    /// Axis target outside `[min, max]`
    OutOfBounds {
        /// Axis label
        axis: char,
        /// Requested absolute position in mm
        value: f64,
        /// Minimum bound
        min: f64,
        /// Maximum bound
        max: f64,
    },
    /// Feed rate above the ceiling
    FeedTooHigh {
        /// Requested feed in mm/min
        requested: f64,
        /// Ceiling in mm/min
        max: f64,
    },
    /// Non-finite coordinate
    NotFinite {
        /// Axis label
        axis: char,
    },
    /// Target on an axis the envelope has no bounds for
    Unbounded {
        /// Axis label
        axis: char,
    },
}

/// Controller link errors. All of these are fatal to the job sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionError {
    /// The port could not be opened
    OpenFailed(heapless::String<128>),
    /// Writing a frame did not complete in time
    WriteTimeout,
    /// No response line arrived in time
    ReadTimeout {
        /// Frame that was waiting for a reply
        frame: heapless::String<48>,
    },
    /// The controller answered with an error reply
    Rejected {
        /// Frame that was rejected
        frame: heapless::String<48>,
        /// Reply text
        reply: heapless::String<32>,
    },
    /// Home-complete was not reported within the home timeout
    HomeTimeout {
        /// Milliseconds waited
        waited_ms: u32,
    },
    /// The link was used after it was closed
    Closed,
    /// Low-level I/O failure
    Io(heapless::String<64>),
}

/// Driver state errors.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverError {
    /// Operation not allowed in the current session state
    InvalidState {
        /// Operation attempted
        operation: &'static str,
        /// State name at the time
        state: &'static str,
    },
    /// Coordinate vector does not match the active axis set
    AxisMismatch {
        /// Axes expected by the driver
        expected: usize,
        /// Axes supplied
        got: usize,
    },
}

/// Geometry conversion errors.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Input contained no stroke/path geometry
    NoTracks,
    /// The SVG document could not be parsed
    InvalidDocument(heapless::String<128>),
    /// Path data could not be parsed
    InvalidPathData(heapless::String<64>),
}

impl Error {
    /// Whether this error stops the whole job sequence.
    ///
    /// Safety, connection and driver-state errors lose trust in the machine
    /// position; geometry and per-job configuration errors only fail the job.
    pub fn is_fatal_for_sequence(&self) -> bool {
        matches!(
            self,
            Error::Safety(_) | Error::Connection(_) | Error::Driver(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Safety(e) => write!(f, "Safety violation: {}", e),
            Error::Connection(e) => write!(f, "Connection error: {}", e),
            Error::Driver(e) => write!(f, "Driver error: {}", e),
            Error::Geometry(e) => write!(f, "Geometry error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::MissingParameter { section, parameter } => {
                write!(f, "'{}' requires '{}'", section, parameter)
            }
            ConfigError::InvalidMmPerPulse(v) => write!(f, "Invalid mm_per_pulse: {}. Must be > 0", v),
            ConfigError::InvalidScale(v) => write!(f, "Invalid px_to_mm: {}. Must be > 0", v),
            ConfigError::InvalidChord(v) => write!(f, "Invalid chord_mm: {}. Must be > 0", v),
            ConfigError::InvalidFeed(v) => write!(f, "Invalid feed: {}. Must be > 0", v),
            ConfigError::InvalidBounds { axis, min, max } => {
                write!(f, "Invalid bounds for {}: min ({}) must be <= max ({})", axis, min, max)
            }
            ConfigError::SpeedAboveMax { parameter, value, max } => {
                write!(f, "{} {} mm/min exceeds max_feed {}", parameter, value, max)
            }
            ConfigError::OutsideBounds { parameter, value } => {
                write!(f, "{} {} lies outside the Z bounds", parameter, value)
            }
            ConfigError::InvalidHomeDirs(s) => {
                write!(f, "Invalid home_dirs '{}': expected two of '+'/'-'", s)
            }
            ConfigError::MissingSourceHeight => {
                write!(f, "y_flip requires svg_height_mm or a document height")
            }
            ConfigError::Unsupported(what) => write!(f, "Unsupported: {}", what),
            ConfigError::DuplicateJobId(id) => write!(f, "Duplicate job id: '{}'", id),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for SafetyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyViolation::OutOfBounds { axis, value, min, max } => {
                write!(f, "{} target {} outside [{}, {}]", axis, value, min, max)
            }
            SafetyViolation::FeedTooHigh { requested, max } => {
                write!(f, "feed {} mm/min exceeds maximum {}", requested, max)
            }
            SafetyViolation::NotFinite { axis } => write!(f, "{} target is not finite", axis),
            SafetyViolation::Unbounded { axis } => write!(f, "no bounds configured for {}", axis),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::OpenFailed(msg) => write!(f, "could not open port: {}", msg),
            ConnectionError::WriteTimeout => write!(f, "write timed out"),
            ConnectionError::ReadTimeout { frame } => write!(f, "no reply to '{}'", frame),
            ConnectionError::Rejected { frame, reply } => {
                write!(f, "controller rejected '{}' with '{}'", frame, reply)
            }
            ConnectionError::HomeTimeout { waited_ms } => {
                write!(f, "home not complete after {} ms", waited_ms)
            }
            ConnectionError::Closed => write!(f, "link is closed"),
            ConnectionError::Io(msg) => write!(f, "I/O failure: {}", msg),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::InvalidState { operation, state } => {
                write!(f, "'{}' not allowed in state {}", operation, state)
            }
            DriverError::AxisMismatch { expected, got } => {
                write!(f, "expected {} axes, got {}", expected, got)
            }
        }
    }
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::NoTracks => write!(f, "input contains no stroke geometry"),
            GeometryError::InvalidDocument(msg) => write!(f, "invalid SVG document: {}", msg),
            GeometryError::InvalidPathData(msg) => write!(f, "invalid path data: {}", msg),
        }
    }
}

/// Truncate a message into a fixed-capacity string.
pub(crate) fn truncated<const N: usize>(text: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<SafetyViolation> for Error {
    fn from(e: SafetyViolation) -> Self {
        Error::Safety(e)
    }
}

impl From<ConnectionError> for Error {
    fn from(e: ConnectionError) -> Self {
        Error::Connection(e)
    }
}

impl From<DriverError> for Error {
    fn from(e: DriverError) -> Self {
        Error::Driver(e)
    }
}

impl From<GeometryError> for Error {
    fn from(e: GeometryError) -> Self {
        Error::Geometry(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for SafetyViolation {}

#[cfg(feature = "std")]
impl std::error::Error for ConnectionError {}

#[cfg(feature = "std")]
impl std::error::Error for DriverError {}

#[cfg(feature = "std")]
impl std::error::Error for GeometryError {}
