//! Configuration module for stage-motion.
//!
//! Provides types for loading and validating driver, geometry, safety and
//! job configurations from TOML files (with `std` feature) or pre-built data.

mod driver;
mod geometry;
mod job;
mod limits;
mod system;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use driver::{DriverConfig, DriverKind, DriverSettings, DriverTimeouts};
pub use geometry::{GeometryConfig, GeometryOverrides, DEFAULT_CHORD_MM, DEFAULT_PX_TO_MM};
pub use job::{GcodeJobConfig, GridCirclesConfig, JobConfig, StepJobConfig, SvgJobConfig};
pub use limits::{AxisBounds, LimitPolicy, SafetyEnvelope, ViolationPolicy};
pub use system::{AxesKind, ModalDefaults, SequenceConfig, SystemConfig, MAX_JOBS};
pub use validation::{validate_config, validate_driver, validate_geometry};

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};
#[cfg(feature = "std")]
pub(crate) use loader::read_text;

// Re-export unit types at config level
pub use units::{Millimeters, MmPerMin, Pulses, UnitExt, MM_PER_INCH};
