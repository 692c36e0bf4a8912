//! Move timing from a trapezoidal velocity profile.
//!
//! Used to pace physical controllers when acknowledgements are disabled:
//! the next frame is held back until the previous move should have finished.

use libm::sqrt;

/// Direction of travel along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Positive pulse count.
    Positive,
    /// Negative pulse count.
    Negative,
}

impl Direction {
    /// Get direction from a signed pulse count.
    #[inline]
    pub fn from_pulses(pulses: i64) -> Self {
        if pulses >= 0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    /// Protocol sign character.
    #[inline]
    pub fn sign_char(self) -> char {
        match self {
            Direction::Positive => '+',
            Direction::Negative => '-',
        }
    }
}

/// Computed profile for one straight move (symmetric trapezoidal).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveProfile {
    /// Path length in mm.
    pub distance_mm: f64,

    /// Peak velocity actually reached, mm/s.
    pub peak_velocity: f64,

    /// Time spent accelerating (equal to decelerating), seconds.
    pub ramp_secs: f64,

    /// Time at peak velocity, seconds.
    pub cruise_secs: f64,
}

impl MoveProfile {
    /// Create a symmetric trapezoidal profile.
    ///
    /// # Arguments
    ///
    /// * `distance_mm` - Path length (sign ignored)
    /// * `max_velocity` - Cruise velocity in mm/s
    /// * `acceleration` - Acceleration and deceleration in mm/s²
    ///
    /// A non-positive acceleration means the axis jumps straight to cruise.
    pub fn trapezoidal(distance_mm: f64, max_velocity: f64, acceleration: f64) -> Self {
        let distance = libm::fabs(distance_mm);
        if distance == 0.0 || !(max_velocity > 0.0) {
            return Self::zero();
        }

        if !(acceleration > 0.0) {
            return Self {
                distance_mm: distance,
                peak_velocity: max_velocity,
                ramp_secs: 0.0,
                cruise_secs: distance / max_velocity,
            };
        }

        // Distance to reach cruise: d = v² / (2a), once up and once down
        let ramp_distance = max_velocity * max_velocity / (2.0 * acceleration);

        if 2.0 * ramp_distance >= distance {
            // Triangle profile: peak where both ramps meet
            let peak = sqrt(acceleration * distance);
            Self {
                distance_mm: distance,
                peak_velocity: peak,
                ramp_secs: peak / acceleration,
                cruise_secs: 0.0,
            }
        } else {
            Self {
                distance_mm: distance,
                peak_velocity: max_velocity,
                ramp_secs: max_velocity / acceleration,
                cruise_secs: (distance - 2.0 * ramp_distance) / max_velocity,
            }
        }
    }

    /// Create a zero-length profile (no motion).
    pub fn zero() -> Self {
        Self {
            distance_mm: 0.0,
            peak_velocity: 0.0,
            ramp_secs: 0.0,
            cruise_secs: 0.0,
        }
    }

    /// Check if this is a zero-length profile.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.distance_mm == 0.0
    }

    /// Whether cruise velocity was never reached.
    #[inline]
    pub fn is_triangle(&self) -> bool {
        !self.is_zero() && self.cruise_secs == 0.0
    }

    /// Total duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        2.0 * self.ramp_secs + self.cruise_secs
    }

    /// Total duration rounded up to whole milliseconds.
    pub fn duration_ms(&self) -> u32 {
        let ms = libm::ceil(self.duration_secs() * 1000.0);
        if ms >= u32::MAX as f64 {
            u32::MAX
        } else {
            ms as u32
        }
    }
}
