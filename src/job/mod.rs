//! Jobs and job sequencing.
//!
//! A [`Job`] turns its input into a [`Program`]; the provided
//! [`Job::execute`] runs that program through a fresh interpreter against a
//! driver. The [`Dispatcher`] brackets every job the same way and stops at
//! the first fatal error.

mod dispatch;
mod kinds;

use alloc::string::String as AllocString;
use alloc::vec::Vec;

use heapless::String;

use crate::config::{AxesKind, GeometryConfig, ModalDefaults, SafetyEnvelope, SystemConfig, ViolationPolicy};
use crate::driver::Driver;
use crate::error::{truncated, Error, Result};
use crate::gcode::{AxisSet, Interpreter, ModalState, MotionCommand, ParseDiagnostic, Xy, Xyz};

pub use dispatch::{Dispatcher, SequenceReport, SequenceStatus};
#[cfg(feature = "std")]
pub use dispatch::run_sequence;
pub use kinds::{build_job, GcodeJob, GridCirclesJob};
#[cfg(feature = "std")]
pub use kinds::SvgJob;

/// Feed used when neither the job nor the defaults set one, in mm/min.
pub const DEFAULT_FEED: f64 = 1200.0;

/// What a job feeds into the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum Program {
    /// G-code text, parsed line by line with diagnostics.
    Gcode(AllocString),
    /// Pre-built commands in absolute millimetres.
    Commands(Vec<MotionCommand>),
}

/// Settings every job reads.
#[derive(Debug, Clone, PartialEq)]
pub struct JobContext {
    /// Active axis set.
    pub axes: AxesKind,
    /// Sampling and placement.
    pub geometry: GeometryConfig,
    /// Bounds used for clamping.
    pub envelope: SafetyEnvelope,
    /// Modal defaults of every fresh interpreter.
    pub defaults: ModalDefaults,
    /// Reaction to a rejected move.
    pub on_violation: ViolationPolicy,
}

impl JobContext {
    /// Extract the job settings from a system configuration.
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            axes: config.axes,
            geometry: config.geometry,
            envelope: config.safety,
            defaults: config.defaults,
            on_violation: config.sequence.on_violation,
        }
    }

    /// Default cutting feed.
    pub fn default_feed(&self) -> f64 {
        self.defaults.feed.map_or(DEFAULT_FEED, |f| f.0)
    }
}

/// Outcome of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    /// Job identifier.
    pub id: String<32>,
    /// Moves accepted by the driver.
    pub moves: usize,
    /// Recoverable parse diagnostics.
    pub diagnostics: Vec<ParseDiagnostic>,
    /// Moves rejected and skipped under [`ViolationPolicy::Skip`].
    pub skipped: usize,
    /// Error that ended the job early.
    pub failure: Option<Error>,
}

impl JobReport {
    /// Empty report for `id`.
    pub fn new(id: &str) -> Self {
        Self {
            id: truncated(id),
            moves: 0,
            diagnostics: Vec::new(),
            skipped: 0,
            failure: None,
        }
    }

    /// Whether the job ran to completion.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// The report when the job completed, its failure otherwise.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the job early.
    pub fn into_result(self) -> Result<JobReport> {
        match self.failure {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }
}

/// A unit of work executed once against a driver.
pub trait Job {
    /// Identifier from the configuration.
    fn id(&self) -> &str;

    /// Job type name.
    fn kind(&self) -> &'static str;

    /// Build the program to run.
    ///
    /// # Errors
    ///
    /// Returns configuration or geometry errors. These fail the job only.
    fn program(&self, ctx: &JobContext) -> Result<Program>;

    /// Run the program through a fresh interpreter.
    ///
    /// The interpreter starts at the driver's position with the configured
    /// modal defaults. Parse diagnostics never stop the job; a rejected move
    /// is skipped or ends the job according to `ctx.on_violation`.
    ///
    /// A failure is carried in [`JobReport::failure`] so the moves and
    /// diagnostics gathered before it are kept; [`JobReport::into_result`]
    /// gives the plain `Result`. Jobs hold no run state, so executing one
    /// again rebuilds its program and starts over from the driver position.
    fn execute(&self, driver: &mut dyn Driver, ctx: &JobContext) -> JobReport {
        let mut report = JobReport::new(self.id());
        info!("job '{}' ({}): start", self.id(), self.kind());

        match self.program(ctx) {
            Ok(program) => match ctx.axes {
                AxesKind::Xy => run::<Xy>(&program, driver, ctx, &mut report),
                AxesKind::Xyz => run::<Xyz>(&program, driver, ctx, &mut report),
            },
            Err(e) => report.failure = Some(e),
        }

        if report.is_success() {
            info!("job '{}': {} moves, {} skipped", self.id(), report.moves, report.skipped);
        } else {
            warn!("job '{}': failed after {} moves", self.id(), report.moves);
        }
        report
    }
}

fn run<A: AxisSet>(program: &Program, driver: &mut dyn Driver, ctx: &JobContext, report: &mut JobReport) {
    let state = ModalState::<A>::with_defaults(driver.position(), &ctx.defaults);
    let mut interp = Interpreter::with_state(state).with_chord(ctx.geometry.chord_mm);

    // The driver has not seen the default feed yet.
    if let Some(feed) = interp.state().feed_rate {
        if !apply(&MotionCommand::set_feed(feed), &mut interp, driver, ctx, report) {
            return;
        }
    }

    match program {
        Program::Gcode(text) => {
            'lines: for line in text.lines() {
                for cmd in interp.feed_line(line) {
                    if !apply(&cmd, &mut interp, driver, ctx, report) {
                        break 'lines;
                    }
                }
            }
        }
        Program::Commands(commands) => {
            'commands: for command in commands {
                for cmd in interp.resolve(command) {
                    if !apply(&cmd, &mut interp, driver, ctx, report) {
                        break 'commands;
                    }
                }
            }
        }
    }

    report.diagnostics = interp.take_diagnostics();
}

/// Dispatch one resolved command. Returns `false` when the job must stop.
fn apply<A: AxisSet>(
    cmd: &MotionCommand,
    interp: &mut Interpreter<A>,
    driver: &mut dyn Driver,
    ctx: &JobContext,
    report: &mut JobReport,
) -> bool {
    match Interpreter::<A>::dispatch(cmd, driver) {
        Ok(()) => {
            if cmd.is_move() {
                report.moves += 1;
            }
            true
        }
        Err(Error::Safety(_)) if ctx.on_violation == ViolationPolicy::Skip => {
            warn!("job '{}': {} rejected, skipped", report.id.as_str(), cmd.kind.name());
            report.skipped += 1;
            interp.sync_position(driver.position());
            true
        }
        Err(e) => {
            report.failure = Some(e);
            false
        }
    }
}
