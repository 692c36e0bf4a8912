//! # stage-motion
//!
//! G-code interpretation, geometry flattening and stage drivers for XY/XYZ
//! motion stages.
//!
//! ## Features
//!
//! - **Modal G-code interpreter**: units, absolute/incremental positioning,
//!   feed, arcs and dwell resolved into absolute millimetre moves
//! - **Geometry pipeline**: SVG documents and generated patterns sampled
//!   within a chord tolerance into pen-up/pen-down tracks
//! - **One safety gate**: every target is checked against the
//!   [`SafetyEnvelope`](config::SafetyEnvelope) before it reaches a driver
//! - **Serial stage protocols**: pulse-based GSC and QT command sets over any
//!   line-oriented [`Link`](driver::Link)
//! - **no_std compatible**: the interpreter, drivers and pipeline work with
//!   `alloc` only
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stage_motion::{load_config, run_sequence};
//!
//! let config = load_config("stage.toml")?;
//! let report = run_sequence(&config)?;
//! for job in &report.jobs {
//!     println!("{}: {} moves", job.id, job.moves);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): file I/O, TOML configuration and SVG input
//! - `serial`: host serial link for physical stages
//! - `log` (default) / `defmt`: logging backend

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

extern crate alloc;

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

// Core modules
pub mod config;
pub mod driver;
pub mod error;
pub mod gcode;
pub mod geometry;
pub mod job;
pub mod motion;

// Re-exports for ergonomic API
pub use config::{validate_config, SafetyEnvelope, SystemConfig};
pub use driver::{AnyDriver, Driver, DriverSession, SessionState, SimDriver};
pub use error::{Error, Result};
pub use gcode::{Coords, Interpreter, MotionCommand, Xy, Xyz};
pub use geometry::{Track, Waypoint};
pub use job::{Dispatcher, Job, JobReport, SequenceReport, SequenceStatus};

// Configuration loading and sequencing (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};
#[cfg(feature = "std")]
pub use job::run_sequence;

// Unit types
pub use config::units::{Millimeters, MmPerMin, Pulses};
