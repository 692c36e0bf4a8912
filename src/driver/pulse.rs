//! Millimetre to pulse conversion with remainder carry.

use crate::config::units::Pulses;

/// Pulse bookkeeping for one controller axis.
///
/// The fractional part of each conversion is carried into the next one, so
/// a long run of small moves dispatches the same total as one large move.
/// The remainder is signed; a reversal consumes it like any other move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseAxis {
    mm_per_pulse: f64,
    remainder: f64,
    position: Pulses,
}

impl PulseAxis {
    /// Create an axis at pulse zero.
    pub const fn new(mm_per_pulse: f64) -> Self {
        Self {
            mm_per_pulse,
            remainder: 0.0,
            position: Pulses(0),
        }
    }

    /// Millimetres per pulse.
    #[inline]
    pub fn mm_per_pulse(&self) -> f64 {
        self.mm_per_pulse
    }

    /// Fraction of a pulse not yet dispatched, at most half a pulse either way.
    #[inline]
    pub fn remainder(&self) -> f64 {
        self.remainder
    }

    /// Accumulated dispatched pulses.
    #[inline]
    pub fn position(&self) -> Pulses {
        self.position
    }

    /// Convert a millimetre delta to the pulse count to send.
    pub fn advance(&mut self, delta_mm: f64) -> i64 {
        let exact = delta_mm / self.mm_per_pulse + self.remainder;
        let pulses = libm::round(exact);
        self.remainder = exact - pulses;
        let pulses = pulses as i64;
        self.position = self.position + Pulses(pulses);
        pulses
    }

    /// Peek at the pulse count for a delta without committing it.
    pub fn preview(&self, delta_mm: f64) -> i64 {
        libm::round(delta_mm / self.mm_per_pulse + self.remainder) as i64
    }

    /// Zero the position and the remainder (after homing).
    pub fn reset(&mut self) {
        self.remainder = 0.0;
        self.position = Pulses(0);
    }

    /// Convert a feed in mm/min to pulses per second (at least 1).
    pub fn pulses_per_sec(&self, mm_per_min: f64) -> u32 {
        let pps = libm::round(mm_per_min / 60.0 / self.mm_per_pulse);
        if pps < 1.0 {
            1
        } else if pps > u32::MAX as f64 {
            u32::MAX
        } else {
            pps as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carry_forward() {
        let mut axis = PulseAxis::new(1.0);

        // 0.4 + 0.4 + 0.4 = 1.2 -> pulses 0, 1, 0
        assert_eq!(axis.advance(0.4), 0);
        assert_eq!(axis.advance(0.4), 1);
        assert_eq!(axis.advance(0.4), 0);
        assert_eq!(axis.position(), Pulses(1));
        assert!((axis.remainder() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_reversal_consumes_remainder() {
        let mut axis = PulseAxis::new(1.0);
        assert_eq!(axis.advance(0.4), 0);
        assert_eq!(axis.advance(-0.4), 0);
        assert!(axis.remainder().abs() < 1e-12);
    }

    #[test]
    fn test_preview_does_not_commit() {
        let mut axis = PulseAxis::new(0.01);
        assert_eq!(axis.preview(1.0), 100);
        assert_eq!(axis.position(), Pulses(0));
        assert_eq!(axis.advance(1.0), 100);
    }

    #[test]
    fn test_speed_conversion() {
        let axis = PulseAxis::new(0.001);
        // 1200 mm/min = 20 mm/s = 20000 pulses/s
        assert_eq!(axis.pulses_per_sec(1200.0), 20_000);
        assert_eq!(axis.pulses_per_sec(0.0), 1);
    }
}
