//! Job entries of the ordered `[[jobs]]` list.

use alloc::string::String as AllocString;

use heapless::String;
use serde::Deserialize;

use super::geometry::GeometryOverrides;
use super::units::MmPerMin;

fn default_true() -> bool {
    true
}

fn default_area() -> [f64; 2] {
    [100.0, 100.0]
}

fn default_cell() -> f64 {
    20.0
}

/// SVG drawing job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SvgJobConfig {
    /// Job identifier.
    pub id: String<32>,
    /// Path to the SVG file.
    #[serde(default)]
    pub file: Option<String<128>>,
    /// Inline SVG document, used instead of `file`.
    #[serde(default)]
    pub source: Option<AllocString>,
    /// Cutting feed.
    #[serde(default)]
    pub feed: Option<MmPerMin>,
    /// Geometry overrides for this job.
    #[serde(flatten)]
    pub overrides: GeometryOverrides,
}

/// Raw G-code program job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GcodeJobConfig {
    /// Job identifier.
    pub id: String<32>,
    /// Path to the G-code file.
    #[serde(default)]
    pub file: Option<String<128>>,
    /// Inline program text, used instead of `file`.
    #[serde(default)]
    pub source: Option<AllocString>,
}

/// Grid of circles inside a rectangular area.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GridCirclesConfig {
    /// Job identifier.
    pub id: String<32>,
    /// Lower-left corner of the area.
    #[serde(default)]
    pub origin: [f64; 2],
    /// Width and height of the area.
    #[serde(default = "default_area")]
    pub area: [f64; 2],
    /// Cell pitch.
    #[serde(default = "default_cell")]
    pub cell: f64,
    /// Circle diameter.
    #[serde(default = "default_cell")]
    pub circle_d: f64,
    /// Cutting feed.
    #[serde(default)]
    pub feed: Option<MmPerMin>,
    /// Draw circles clockwise.
    #[serde(default)]
    pub cw: bool,
    /// Serpentine row order.
    #[serde(default = "default_true")]
    pub snake: bool,
    /// Pause after each circle.
    #[serde(default)]
    pub dwell_ms: u32,
}

/// STEP input. Recognized so the configuration parses, rejected at build time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StepJobConfig {
    /// Job identifier.
    pub id: String<32>,
    /// Path to the STEP file.
    #[serde(default)]
    pub file: Option<String<128>>,
}

/// One entry of the job list, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobConfig {
    /// `type = "svg"`
    Svg(SvgJobConfig),
    /// `type = "gcode"`
    Gcode(GcodeJobConfig),
    /// `type = "grid_circles"`
    GridCircles(GridCirclesConfig),
    /// `type = "step"`
    Step(StepJobConfig),
}

impl JobConfig {
    /// Job identifier.
    pub fn id(&self) -> &str {
        match self {
            JobConfig::Svg(j) => j.id.as_str(),
            JobConfig::Gcode(j) => j.id.as_str(),
            JobConfig::GridCircles(j) => j.id.as_str(),
            JobConfig::Step(j) => j.id.as_str(),
        }
    }

    /// The `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            JobConfig::Svg(_) => "svg",
            JobConfig::Gcode(_) => "gcode",
            JobConfig::GridCircles(_) => "grid_circles",
            JobConfig::Step(_) => "step",
        }
    }
}
