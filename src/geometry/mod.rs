//! Geometry to motion.
//!
//! Source shapes ([`Path`]) are placed in machine space, sampled within a
//! chord tolerance and emitted as [`Track`]s, which in turn become a
//! millimetre program for the interpreter.

mod flatten;
mod path;
mod pattern;
mod pipeline;
#[cfg(feature = "std")]
mod svg;
mod track;
mod transform;

pub use flatten::flatten;
pub use path::{Path, Segment};
pub use pattern::{grid_centers, grid_circles};
pub use pipeline::{build_tracks, track_program, PenLift, ProgramOptions};
#[cfg(feature = "std")]
pub use svg::{parse_svg, SvgDocument};
pub use track::{PenState, Track, Waypoint};
pub use transform::{Affine, Placement};

/// A point in source or machine space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance.
    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        libm::hypot(other.x - self.x, other.y - self.y)
    }

    /// Dot product as vectors.
    #[inline]
    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Linear interpolation towards `other`.
    #[inline]
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }

    /// Midpoint.
    #[inline]
    pub fn midpoint(&self, other: &Point) -> Point {
        self.lerp(other, 0.5)
    }
}
