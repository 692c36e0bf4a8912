//! Source-to-machine coordinate mapping.

use crate::config::GeometryConfig;
use crate::error::{ConfigError, Result};

use super::Point;

/// 2D affine matrix in SVG order: `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    /// Row 1, column 1.
    pub a: f64,
    /// Row 2, column 1.
    pub b: f64,
    /// Row 1, column 2.
    pub c: f64,
    /// Row 2, column 2.
    pub d: f64,
    /// X translation.
    pub e: f64,
    /// Y translation.
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    /// The identity map.
    pub const IDENTITY: Affine = Affine::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    /// Create from the six SVG matrix entries.
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Pure translation.
    pub const fn translate(dx: f64, dy: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    /// Map a point.
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Map a direction (no translation).
    #[inline]
    pub fn apply_vector(&self, v: Point) -> Point {
        Point::new(self.a * v.x + self.c * v.y, self.b * v.x + self.d * v.y)
    }

    /// `self ∘ inner`: apply `inner` first, then `self`.
    pub fn then_after(&self, inner: &Affine) -> Affine {
        Affine::new(
            self.a * inner.a + self.c * inner.b,
            self.b * inner.a + self.d * inner.b,
            self.a * inner.c + self.c * inner.d,
            self.b * inner.c + self.d * inner.d,
            self.a * inner.e + self.c * inner.f + self.e,
            self.b * inner.e + self.d * inner.f + self.f,
        )
    }
}

/// Placement of source geometry in machine space.
///
/// Applied as scale, then optional vertical flip, then translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    scale: f64,
    flip_height: Option<f64>,
    origin: Point,
}

impl Placement {
    /// Build a placement.
    ///
    /// `flip_height` is the source height in millimetres, after scaling.
    pub const fn new(scale: f64, flip_height: Option<f64>, origin: Point) -> Self {
        Self {
            scale,
            flip_height,
            origin,
        }
    }

    /// Build from the geometry configuration.
    ///
    /// `document_height` is the source height in source units, used when
    /// `y_flip` is set without `svg_height_mm`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSourceHeight`] when `y_flip` is set and
    /// neither height is known.
    pub fn from_config(config: &GeometryConfig, document_height: Option<f64>) -> Result<Self> {
        let flip_height = if config.y_flip {
            let height = config
                .svg_height_mm
                .or(document_height.map(|h| h * config.px_to_mm))
                .ok_or(ConfigError::MissingSourceHeight)?;
            Some(height)
        } else {
            None
        };
        Ok(Self::new(
            config.px_to_mm,
            flip_height,
            Point::new(config.origin[0], config.origin[1]),
        ))
    }

    /// Source to machine.
    pub fn apply(&self, p: Point) -> Point {
        let x = p.x * self.scale;
        let mut y = p.y * self.scale;
        if let Some(h) = self.flip_height {
            y = h - y;
        }
        Point::new(x + self.origin.x, y + self.origin.y)
    }

    /// Machine to source: untranslate, unflip, unscale.
    pub fn invert(&self, p: Point) -> Point {
        let x = p.x - self.origin.x;
        let mut y = p.y - self.origin.y;
        if let Some(h) = self.flip_height {
            y = h - y;
        }
        Point::new(x / self.scale, y / self.scale)
    }

    /// The placement as an affine matrix.
    pub fn to_affine(&self) -> Affine {
        match self.flip_height {
            Some(h) => Affine::new(self.scale, 0.0, 0.0, -self.scale, self.origin.x, h + self.origin.y),
            None => Affine::new(self.scale, 0.0, 0.0, self.scale, self.origin.x, self.origin.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_scale_flip_translate() {
        let placement = Placement::new(2.0, Some(100.0), Point::new(10.0, 5.0));
        let p = placement.apply(Point::new(3.0, 4.0));
        // x: 3*2 + 10, y: (100 - 4*2) + 5
        assert_eq!(p, Point::new(16.0, 97.0));
        assert_eq!(placement.to_affine().apply(Point::new(3.0, 4.0)), p);
    }

    #[test]
    fn test_flip_needs_height() {
        let mut config = GeometryConfig::identity(0.5);
        config.y_flip = true;
        assert!(Placement::from_config(&config, None).is_err());

        let placement = Placement::from_config(&config, Some(40.0)).unwrap();
        assert_eq!(placement.apply(Point::new(0.0, 0.0)), Point::new(0.0, 40.0));
    }

    #[test]
    fn test_compose() {
        let scale = Affine::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Affine::translate(1.0, 1.0);
        // shift first, then scale
        let m = scale.then_after(&shift);
        assert_eq!(m.apply(Point::new(0.0, 0.0)), Point::new(2.0, 2.0));
    }
}
