//! Geometry conversion parameters from TOML.

use serde::Deserialize;

use super::limits::LimitPolicy;

/// Default SVG pixel size (96 dpi) in millimetres.
pub const DEFAULT_PX_TO_MM: f64 = 0.264583;

/// Default chord tolerance in millimetres.
pub const DEFAULT_CHORD_MM: f64 = 0.5;

fn default_px_to_mm() -> f64 {
    DEFAULT_PX_TO_MM
}

fn default_chord_mm() -> f64 {
    DEFAULT_CHORD_MM
}

fn default_z_up() -> f64 {
    5.0
}

/// How source geometry is sampled and placed in machine space.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeometryConfig {
    /// Source units to millimetres.
    #[serde(default = "default_px_to_mm")]
    pub px_to_mm: f64,

    /// Maximum distance between consecutive curve samples, in millimetres.
    #[serde(default = "default_chord_mm")]
    pub chord_mm: f64,

    /// Flip the vertical axis (`y' = height - y`).
    #[serde(default)]
    pub y_flip: bool,

    /// Source height in millimetres used by `y_flip`.
    #[serde(default)]
    pub svg_height_mm: Option<f64>,

    /// Machine-space offset applied last.
    #[serde(default)]
    pub origin: [f64; 2],

    /// Out-of-envelope handling before emission.
    #[serde(default)]
    pub limit_policy: LimitPolicy,

    /// Z for pen-up on three-axis stages.
    #[serde(default = "default_z_up")]
    pub z_up: f64,

    /// Z for pen-down on three-axis stages.
    #[serde(default)]
    pub z_down: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            px_to_mm: DEFAULT_PX_TO_MM,
            chord_mm: DEFAULT_CHORD_MM,
            y_flip: false,
            svg_height_mm: None,
            origin: [0.0, 0.0],
            limit_policy: LimitPolicy::Reject,
            z_up: default_z_up(),
            z_down: 0.0,
        }
    }
}

impl GeometryConfig {
    /// Unit scale, no flip, no offset.
    pub fn identity(chord_mm: f64) -> Self {
        Self {
            px_to_mm: 1.0,
            chord_mm,
            ..Self::default()
        }
    }
}

/// Per-job overrides of [`GeometryConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct GeometryOverrides {
    /// Override `px_to_mm`.
    #[serde(default)]
    pub px_to_mm: Option<f64>,
    /// Override `chord_mm`.
    #[serde(default)]
    pub chord_mm: Option<f64>,
    /// Override `y_flip`.
    #[serde(default)]
    pub y_flip: Option<bool>,
    /// Override `svg_height_mm`.
    #[serde(default)]
    pub svg_height_mm: Option<f64>,
    /// Override `origin`.
    #[serde(default)]
    pub origin: Option<[f64; 2]>,
}

impl GeometryOverrides {
    /// Apply overrides on top of a base configuration.
    pub fn apply(&self, base: &GeometryConfig) -> GeometryConfig {
        GeometryConfig {
            px_to_mm: self.px_to_mm.unwrap_or(base.px_to_mm),
            chord_mm: self.chord_mm.unwrap_or(base.chord_mm),
            y_flip: self.y_flip.unwrap_or(base.y_flip),
            svg_height_mm: self.svg_height_mm.or(base.svg_height_mm),
            origin: self.origin.unwrap_or(base.origin),
            ..*base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let base = GeometryConfig::default();
        let over = GeometryOverrides {
            chord_mm: Some(0.1),
            origin: Some([10.0, 20.0]),
            ..Default::default()
        };
        let merged = over.apply(&base);

        assert_eq!(merged.chord_mm, 0.1);
        assert_eq!(merged.origin, [10.0, 20.0]);
        assert_eq!(merged.px_to_mm, DEFAULT_PX_TO_MM);
    }
}
