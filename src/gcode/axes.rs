//! Axis sets and coordinate vectors.
//!
//! The interpreter is generic over an [`AxisSet`] marker so two- and
//! three-axis stages share one modal implementation. The markers differ
//! only in which axis letters are legal and in the default plane.

use super::state::Plane;

/// Axis letters in index order.
pub const AXIS_LABELS: [char; 3] = ['X', 'Y', 'Z'];

/// Map an axis letter to its index.
pub fn axis_index(letter: char) -> Option<usize> {
    match letter.to_ascii_uppercase() {
        'X' => Some(0),
        'Y' => Some(1),
        'Z' => Some(2),
        _ => None,
    }
}

/// Absolute or relative position with two or three components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coords {
    values: [f64; 3],
    dims: usize,
}

impl Coords {
    /// All-zero coordinates with `dims` components (clamped to 2..=3).
    pub const fn zeros(dims: usize) -> Self {
        let dims = if dims < 2 {
            2
        } else if dims > 3 {
            3
        } else {
            dims
        };
        Self {
            values: [0.0; 3],
            dims,
        }
    }

    /// Two-axis coordinates.
    pub const fn xy(x: f64, y: f64) -> Self {
        Self {
            values: [x, y, 0.0],
            dims: 2,
        }
    }

    /// Three-axis coordinates.
    pub const fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            values: [x, y, z],
            dims: 3,
        }
    }

    /// Number of components.
    #[inline]
    pub const fn dims(&self) -> usize {
        self.dims
    }

    /// Component at `index`, 0.0 when absent.
    #[inline]
    pub fn get(&self, index: usize) -> f64 {
        if index < self.dims {
            self.values[index]
        } else {
            0.0
        }
    }

    /// Set the component at `index`. Ignored when absent.
    #[inline]
    pub fn set(&mut self, index: usize, value: f64) {
        if index < self.dims {
            self.values[index] = value;
        }
    }

    /// X component.
    #[inline]
    pub fn x(&self) -> f64 {
        self.values[0]
    }

    /// Y component.
    #[inline]
    pub fn y(&self) -> f64 {
        self.values[1]
    }

    /// Z component, if present.
    #[inline]
    pub fn z(&self) -> Option<f64> {
        if self.dims > 2 {
            Some(self.values[2])
        } else {
            None
        }
    }

    /// Components as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.dims]
    }

    /// Same position with a different component count.
    pub fn with_dims(&self, dims: usize) -> Self {
        let mut out = Self::zeros(dims);
        for i in 0..out.dims.min(self.dims) {
            out.values[i] = self.values[i];
        }
        out
    }

    /// Euclidean distance over the shared components.
    pub fn distance(&self, other: &Coords) -> f64 {
        let n = self.dims.min(other.dims);
        let mut sum = 0.0;
        for i in 0..n {
            let d = self.values[i] - other.values[i];
            sum += d * d;
        }
        libm::sqrt(sum)
    }

    /// Distance in the XY plane only.
    pub fn planar_distance(&self, other: &Coords) -> f64 {
        libm::hypot(self.values[0] - other.values[0], self.values[1] - other.values[1])
    }

    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.as_slice().iter().all(|v| v.is_finite())
    }
}

impl Default for Coords {
    fn default() -> Self {
        Self::zeros(2)
    }
}

/// The set of axes an interpreter instance accepts.
pub trait AxisSet: private::Sealed + Copy + Default + core::fmt::Debug {
    /// Number of axes.
    const COUNT: usize;
    /// Plane selected on reset.
    const DEFAULT_PLANE: Plane;
    /// Name for display/debugging.
    const NAME: &'static str;

    /// Whether an axis letter is legal for this set.
    fn accepts(letter: char) -> bool {
        matches!(axis_index(letter), Some(i) if i < Self::COUNT)
    }

    /// Origin with the right dimensionality.
    fn origin() -> Coords {
        Coords::zeros(Self::COUNT)
    }
}

/// X and Y.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xy;

/// X, Y and Z.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xyz;

impl AxisSet for Xy {
    const COUNT: usize = 2;
    const DEFAULT_PLANE: Plane = Plane::Xy;
    const NAME: &'static str = "XY";
}

impl AxisSet for Xyz {
    const COUNT: usize = 3;
    const DEFAULT_PLANE: Plane = Plane::Xy;
    const NAME: &'static str = "XYZ";
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Xy {}
    impl Sealed for super::Xyz {}
}
