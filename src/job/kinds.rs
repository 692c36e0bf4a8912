//! Job kinds and the factory that builds them from configuration.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::config::{GcodeJobConfig, GridCirclesConfig, JobConfig};
use crate::error::{truncated, ConfigError, Error, Result};
use crate::geometry::{build_tracks, grid_circles, track_program, PenLift, Placement, Point, ProgramOptions, Track};

use super::{Job, JobContext, Program};

/// Build the job described by one configuration entry.
///
/// # Errors
///
/// Returns [`ConfigError::Unsupported`] for `step` jobs, and for `svg` jobs
/// without the `std` feature.
pub fn build_job(config: &JobConfig) -> Result<Box<dyn Job>> {
    match config {
        #[cfg(feature = "std")]
        JobConfig::Svg(c) => Ok(Box::new(SvgJob::new(c.clone()))),
        JobConfig::Gcode(c) => Ok(Box::new(GcodeJob::new(c.clone()))),
        JobConfig::GridCircles(c) => Ok(Box::new(GridCirclesJob::new(c.clone()))),
        other => Err(Error::Config(ConfigError::Unsupported(truncated(other.kind())))),
    }
}

/// Inline text, or the contents of `file`.
fn source_text(section: &'static str, source: Option<&str>, file: Option<&str>) -> Result<alloc::string::String> {
    if let Some(text) = source {
        return Ok(text.into());
    }
    match file {
        #[cfg(feature = "std")]
        Some(path) => crate::config::read_text(path),
        #[cfg(not(feature = "std"))]
        Some(_) => Err(Error::Config(ConfigError::Unsupported(truncated("file input")))),
        None => Err(Error::Config(ConfigError::MissingParameter {
            section,
            parameter: "file",
        })),
    }
}

fn program_options(ctx: &JobContext, feed: Option<f64>, dwell_ms: u32) -> ProgramOptions {
    ProgramOptions {
        lift: PenLift::for_axes(&ctx.geometry, ctx.axes.count()),
        feed: Some(feed.unwrap_or_else(|| ctx.default_feed())),
        dwell_ms,
    }
}

/// Raw G-code program.
#[derive(Debug, Clone)]
pub struct GcodeJob {
    config: GcodeJobConfig,
}

impl GcodeJob {
    /// Wrap a configuration entry.
    pub fn new(config: GcodeJobConfig) -> Self {
        Self { config }
    }
}

impl Job for GcodeJob {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn kind(&self) -> &'static str {
        "gcode"
    }

    fn program(&self, _ctx: &JobContext) -> Result<Program> {
        let text = source_text(
            "gcode",
            self.config.source.as_deref(),
            self.config.file.as_deref(),
        )?;
        Ok(Program::Gcode(text))
    }
}

/// Grid of circles.
#[derive(Debug, Clone)]
pub struct GridCirclesJob {
    config: GridCirclesConfig,
}

impl GridCirclesJob {
    /// Wrap a configuration entry.
    pub fn new(config: GridCirclesConfig) -> Self {
        Self { config }
    }

    /// Circles as tracks, already in machine millimetres.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NoTracks`](crate::error::GeometryError::NoTracks)
    /// when the area holds no full cell.
    pub fn tracks(&self, ctx: &JobContext) -> Result<Vec<Track>> {
        let identity = Placement::new(1.0, None, Point::default());
        build_tracks(&grid_circles(&self.config), &identity, &ctx.geometry, &ctx.envelope)
    }
}

impl Job for GridCirclesJob {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn kind(&self) -> &'static str {
        "grid_circles"
    }

    fn program(&self, ctx: &JobContext) -> Result<Program> {
        let tracks = self.tracks(ctx)?;
        let options = program_options(ctx, self.config.feed.map(|f| f.0), self.config.dwell_ms);
        Ok(Program::Commands(track_program(&tracks, &options)))
    }
}

#[cfg(feature = "std")]
pub use svg_job::SvgJob;

#[cfg(feature = "std")]
mod svg_job {
    use alloc::vec::Vec;

    use crate::config::SvgJobConfig;
    use crate::error::Result;
    use crate::geometry::{build_tracks, parse_svg, track_program, Placement, Track};

    use super::{program_options, source_text};
    use crate::job::{Job, JobContext, Program};

    /// SVG drawing placed by the geometry configuration and the job's overrides.
    #[derive(Debug, Clone)]
    pub struct SvgJob {
        config: SvgJobConfig,
    }

    impl SvgJob {
        /// Wrap a configuration entry.
        pub fn new(config: SvgJobConfig) -> Self {
            Self { config }
        }

        /// Stroked shapes as machine-space tracks.
        ///
        /// # Errors
        ///
        /// Returns I/O, document, placement or no-tracks errors.
        pub fn tracks(&self, ctx: &JobContext) -> Result<Vec<Track>> {
            let text = source_text("svg", self.config.source.as_deref(), self.config.file.as_deref())?;
            let doc = parse_svg(&text)?;
            let geometry = self.config.overrides.apply(&ctx.geometry);
            let placement = Placement::from_config(&geometry, doc.height)?;
            build_tracks(&doc.paths, &placement, &geometry, &ctx.envelope)
        }
    }

    impl Job for SvgJob {
        fn id(&self) -> &str {
            &self.config.id
        }

        fn kind(&self) -> &'static str {
            "svg"
        }

        fn program(&self, ctx: &JobContext) -> Result<Program> {
            let tracks = self.tracks(ctx)?;
            let options = program_options(ctx, self.config.feed.map(|f| f.0), 0);
            Ok(Program::Commands(track_program(&tracks, &options)))
        }
    }
}
