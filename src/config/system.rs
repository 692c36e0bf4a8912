//! System configuration - root configuration structure.

use heapless::Vec;
use serde::Deserialize;

use crate::gcode::{Positioning, Units};

use super::driver::DriverConfig;
use super::geometry::GeometryConfig;
use super::job::JobConfig;
use super::limits::{SafetyEnvelope, ViolationPolicy};
use super::units::{Millimeters, MmPerMin};

/// Maximum number of jobs in one sequence.
pub const MAX_JOBS: usize = 32;

/// Active axis set of the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxesKind {
    /// X and Y.
    #[default]
    Xy,
    /// X, Y and Z.
    Xyz,
}

impl AxesKind {
    /// Number of axes.
    pub const fn count(self) -> usize {
        match self {
            AxesKind::Xy => 2,
            AxesKind::Xyz => 3,
        }
    }
}

/// Modal values every job starts from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct ModalDefaults {
    /// Initial units.
    #[serde(default)]
    pub units: Units,
    /// Initial positioning mode.
    #[serde(default)]
    pub positioning: Positioning,
    /// Initial feed rate.
    #[serde(default)]
    pub feed: Option<MmPerMin>,
}

fn default_true() -> bool {
    true
}

/// Bracketing applied uniformly around every job.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SequenceConfig {
    /// Home once before the first job.
    #[serde(default = "default_true")]
    pub home_at_start: bool,
    /// Lift Z to this height before each job (three-axis stages only).
    #[serde(default)]
    pub safe_height: Option<Millimeters>,
    /// Rapid back to the origin after each job.
    #[serde(default)]
    pub return_to_origin: bool,
    /// Reaction to a rejected move inside a job.
    #[serde(default)]
    pub on_violation: ViolationPolicy,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            home_at_start: true,
            safe_height: None,
            return_to_origin: false,
            on_violation: ViolationPolicy::Abort,
        }
    }
}

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Active axis set.
    #[serde(default)]
    pub axes: AxesKind,

    /// Driver selection and link parameters.
    #[serde(default)]
    pub driver: DriverConfig,

    /// Geometry conversion parameters.
    #[serde(default)]
    pub geometry: GeometryConfig,

    /// Bounds and feed ceiling.
    pub safety: SafetyEnvelope,

    /// Modal defaults for every job.
    #[serde(default)]
    pub defaults: ModalDefaults,

    /// Per-job bracketing.
    #[serde(default)]
    pub sequence: SequenceConfig,

    /// Ordered job list.
    #[serde(default)]
    pub jobs: Vec<JobConfig, MAX_JOBS>,
}

impl SystemConfig {
    /// Create a configuration with defaults around an envelope and no jobs.
    pub fn new(safety: SafetyEnvelope) -> Self {
        Self {
            axes: AxesKind::Xy,
            driver: DriverConfig::default(),
            geometry: GeometryConfig::default(),
            safety,
            defaults: ModalDefaults::default(),
            sequence: SequenceConfig::default(),
            jobs: Vec::new(),
        }
    }

    /// Get a job entry by id.
    pub fn job(&self, id: &str) -> Option<&JobConfig> {
        self.jobs.iter().find(|j| j.id() == id)
    }

    /// List all job ids in order.
    pub fn job_ids(&self) -> impl Iterator<Item = &str> {
        self.jobs.iter().map(|j| j.id())
    }
}
