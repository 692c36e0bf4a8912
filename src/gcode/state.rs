//! Modal interpreter state.

use core::marker::PhantomData;

use serde::Deserialize;

use crate::config::{ModalDefaults, MM_PER_INCH};

use super::axes::{AxisSet, Coords};

/// Length unit for parsed literals (G20/G21).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    /// Millimetres.
    #[default]
    #[serde(alias = "mm")]
    Millimeters,
    /// Inches.
    #[serde(alias = "inch")]
    Inches,
}

impl Units {
    /// Factor from this unit to millimetres.
    #[inline]
    pub const fn scale(self) -> f64 {
        match self {
            Units::Millimeters => 1.0,
            Units::Inches => MM_PER_INCH,
        }
    }
}

/// Positioning mode (G90/G91).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Positioning {
    /// Targets are absolute.
    #[default]
    Absolute,
    /// Targets are deltas from the current position.
    Incremental,
}

/// Active plane for arcs (G17/G18/G19).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Plane {
    /// G17
    #[default]
    Xy,
    /// G18
    Zx,
    /// G19
    Yz,
}

impl Plane {
    /// Axis indices of the plane (first, second).
    pub const fn axes(self) -> (usize, usize) {
        match self {
            Plane::Xy => (0, 1),
            Plane::Zx => (2, 0),
            Plane::Yz => (1, 2),
        }
    }
}

/// Interpreter context for one job.
///
/// Mutated only by [`Interpreter`](super::Interpreter) dispatch; discarded at
/// job end.
#[derive(Debug, Clone, Copy)]
pub struct ModalState<A: AxisSet> {
    /// Active units.
    pub units: Units,
    /// Active positioning mode.
    pub positioning: Positioning,
    /// Active arc plane.
    pub plane: Plane,
    /// Feed rate in mm/min, if one was programmed.
    pub feed_rate: Option<f64>,
    /// Current absolute position in mm.
    pub current_position: Coords,
    /// Whether the last move was a rapid.
    pub tool_lifted: bool,
    _axes: PhantomData<A>,
}

impl<A: AxisSet> Default for ModalState<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AxisSet> ModalState<A> {
    /// Fresh state at the origin: mm, absolute, default plane, no feed.
    pub fn new() -> Self {
        Self {
            units: Units::Millimeters,
            positioning: Positioning::Absolute,
            plane: A::DEFAULT_PLANE,
            feed_rate: None,
            current_position: A::origin(),
            tool_lifted: true,
            _axes: PhantomData,
        }
    }

    /// Fresh state at a known position with configured defaults.
    pub fn with_defaults(position: Coords, defaults: &ModalDefaults) -> Self {
        let mut state = Self::new();
        state.current_position = position.with_dims(A::COUNT);
        state.units = defaults.units;
        state.positioning = defaults.positioning;
        state.feed_rate = defaults.feed.map(|f| f.0);
        state
    }

    /// Scale factor applied to parsed literals.
    #[inline]
    pub fn scale(&self) -> f64 {
        self.units.scale()
    }

    /// Resolve per-axis words (already in mm) into an absolute target.
    ///
    /// Missing axes keep their current value.
    pub fn resolve_target(&self, words: &[Option<f64>; 3]) -> Coords {
        let mut target = self.current_position;
        for (i, word) in words.iter().enumerate().take(A::COUNT) {
            if let Some(v) = *word {
                let base = match self.positioning {
                    Positioning::Absolute => 0.0,
                    Positioning::Incremental => self.current_position.get(i),
                };
                target.set(i, base + v);
            }
        }
        target
    }
}
