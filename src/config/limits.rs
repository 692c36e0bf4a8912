//! Safety envelope configuration and limit policies.

use serde::Deserialize;

use crate::error::SafetyViolation;
use crate::gcode::{Coords, AXIS_LABELS};

use super::units::{Millimeters, MmPerMin};

/// Policy for geometry that leaves the envelope before it reaches a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitPolicy {
    /// Leave waypoints as they are; the session rejects the move.
    #[default]
    Reject,
    /// Clamp waypoints to the nearest bound.
    Clamp,
}

/// What a job does when one of its moves is rejected by the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationPolicy {
    /// Stop the job and the sequence.
    #[default]
    Abort,
    /// Drop the move, record it and continue.
    Skip,
}

/// Inclusive bounds for one axis in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AxisBounds {
    /// Minimum allowed position.
    pub min: Millimeters,
    /// Maximum allowed position.
    pub max: Millimeters,
}

impl AxisBounds {
    /// Create new bounds.
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min: Millimeters(min),
            max: Millimeters(max),
        }
    }

    /// Check if bounds are valid (min <= max).
    pub fn is_valid(&self) -> bool {
        self.min.0 <= self.max.0
    }

    /// Check if a position is within bounds. Both ends are inclusive.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min.0 && value <= self.max.0
    }

    /// Clamp a position into the bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.min.0 {
            self.min.0
        } else if value > self.max.0 {
            self.max.0
        } else {
            value
        }
    }
}

/// Axis bounds and feed ceiling enforced before any move reaches a sink.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SafetyEnvelope {
    /// X axis bounds.
    pub x: AxisBounds,
    /// Y axis bounds.
    pub y: AxisBounds,
    /// Z axis bounds. Required on three-axis stages; a Z target without
    /// bounds is rejected.
    #[serde(default)]
    pub z: Option<AxisBounds>,
    /// Feed ceiling.
    pub max_feed: MmPerMin,
}

impl SafetyEnvelope {
    /// Create an envelope for an XY stage.
    pub const fn xy(x: AxisBounds, y: AxisBounds, max_feed: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            max_feed: MmPerMin(max_feed),
        }
    }

    /// Create an envelope for an XYZ stage.
    pub const fn xyz(x: AxisBounds, y: AxisBounds, z: AxisBounds, max_feed: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            max_feed: MmPerMin(max_feed),
        }
    }

    /// Bounds for the axis at `index` (0 = X, 1 = Y, 2 = Z).
    pub fn axis(&self, index: usize) -> Option<&AxisBounds> {
        match index {
            0 => Some(&self.x),
            1 => Some(&self.y),
            _ => self.z.as_ref(),
        }
    }

    /// Check an absolute target against the bounds.
    ///
    /// Only the axes present in `target` are checked.
    pub fn check(&self, target: &Coords) -> Result<(), SafetyViolation> {
        for (i, &value) in target.as_slice().iter().enumerate() {
            let axis = AXIS_LABELS[i];
            if !value.is_finite() {
                return Err(SafetyViolation::NotFinite { axis });
            }
            let bounds = self.axis(i).ok_or(SafetyViolation::Unbounded { axis })?;
            if !bounds.contains(value) {
                return Err(SafetyViolation::OutOfBounds {
                    axis,
                    value,
                    min: bounds.min.0,
                    max: bounds.max.0,
                });
            }
        }
        Ok(())
    }

    /// Check a feed request against the ceiling.
    pub fn check_feed(&self, feed: f64) -> Result<(), SafetyViolation> {
        if feed > self.max_feed.0 {
            Err(SafetyViolation::FeedTooHigh {
                requested: feed,
                max: self.max_feed.0,
            })
        } else {
            Ok(())
        }
    }

    /// Clamp every axis of `target` into the envelope.
    pub fn clamp(&self, target: &Coords) -> Coords {
        let mut out = *target;
        for i in 0..target.dims() {
            if let Some(bounds) = self.axis(i) {
                out.set(i, bounds.clamp(target.get(i)));
            }
        }
        out
    }
}
