//! Job sequencing.

use alloc::boxed::Box;
use alloc::vec::Vec;

use heapless::String;

use crate::config::{AxesKind, SequenceConfig, SystemConfig};
use crate::driver::Driver;
use crate::error::{truncated, Error, Result};
use crate::gcode::Coords;
use crate::geometry::Track;

use super::kinds::build_job;
use super::{Job, JobContext, JobReport};

/// Terminal status of a job sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceStatus {
    /// Every job ran; non-fatal job failures are in the job reports.
    Success,
    /// A fatal error stopped the sequence inside or around a job.
    AbortedAt {
        /// Position of the job in the sequence.
        index: usize,
        /// Job identifier.
        id: String<32>,
        /// The fatal error.
        error: Error,
    },
    /// The sequence failed outside any job (initial home or final close).
    Fatal(Error),
}

/// Result of running a job sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceReport {
    /// Terminal status.
    pub status: SequenceStatus,
    /// One report per job started, in order.
    pub jobs: Vec<JobReport>,
    /// Tracks recorded by the simulation sink, if one was used.
    pub tracks: Vec<Track>,
}

impl SequenceReport {
    /// Whether the sequence completed.
    pub fn is_success(&self) -> bool {
        self.status == SequenceStatus::Success
    }
}

/// Runs an ordered list of jobs against one driver.
///
/// Each job is bracketed the same way: lift to the safe height (three-axis
/// stages), run, then return to the origin when configured. The driver is
/// closed on every exit path.
pub struct Dispatcher {
    context: JobContext,
    sequence: SequenceConfig,
    jobs: Vec<Box<dyn Job>>,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    pub fn new(context: JobContext, sequence: SequenceConfig) -> Self {
        Self {
            context,
            sequence,
            jobs: Vec::new(),
        }
    }

    /// Build every configured job.
    ///
    /// # Errors
    ///
    /// Returns the first job that cannot be built. No connection is opened.
    pub fn from_config(config: &SystemConfig) -> Result<Self> {
        let mut dispatcher = Self::new(JobContext::from_config(config), config.sequence);
        for job in config.jobs.iter() {
            dispatcher.push(build_job(job)?);
        }
        Ok(dispatcher)
    }

    /// Append a job.
    pub fn push(&mut self, job: Box<dyn Job>) {
        self.jobs.push(job);
    }

    /// Number of queued jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no job is queued.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Settings handed to every job.
    pub fn context(&self) -> &JobContext {
        &self.context
    }

    /// Run all jobs in order and close the driver.
    pub fn run(&self, driver: &mut dyn Driver) -> SequenceReport {
        let mut report = SequenceReport {
            status: SequenceStatus::Success,
            jobs: Vec::new(),
            tracks: Vec::new(),
        };

        if self.sequence.home_at_start {
            if let Err(e) = driver.home() {
                report.status = SequenceStatus::Fatal(e);
            }
        }

        if report.is_success() {
            report.status = self.run_jobs(driver, &mut report.jobs);
        }

        if let Err(e) = driver.close() {
            warn!("dispatcher: close failed");
            if report.is_success() {
                report.status = SequenceStatus::Fatal(e);
            }
        }

        info!(
            "dispatcher: {} of {} jobs run, success: {}",
            report.jobs.len(),
            self.jobs.len(),
            report.is_success()
        );
        report
    }

    fn run_jobs(&self, driver: &mut dyn Driver, reports: &mut Vec<JobReport>) -> SequenceStatus {
        for (index, job) in self.jobs.iter().enumerate() {
            let aborted = |error: Error| SequenceStatus::AbortedAt {
                index,
                id: truncated(job.id()),
                error,
            };

            if let Err(e) = self.lift_to_safe_height(driver) {
                return aborted(e);
            }

            let job_report = job.execute(driver, &self.context);
            let fatal = job_report.failure.clone().filter(Error::is_fatal_for_sequence);
            reports.push(job_report);
            if let Some(e) = fatal {
                return aborted(e);
            }

            if let Err(e) = self.return_to_origin(driver) {
                return aborted(e);
            }
        }
        SequenceStatus::Success
    }

    fn lift_to_safe_height(&self, driver: &mut dyn Driver) -> Result<()> {
        match (self.context.axes, self.sequence.safe_height) {
            (AxesKind::Xyz, Some(h)) => {
                let mut target = driver.position().with_dims(3);
                target.set(2, h.0);
                driver.move_absolute(&target, false)
            }
            _ => Ok(()),
        }
    }

    fn return_to_origin(&self, driver: &mut dyn Driver) -> Result<()> {
        if !self.sequence.return_to_origin {
            return Ok(());
        }
        match self.context.axes {
            AxesKind::Xy => driver.move_absolute(&Coords::xy(0.0, 0.0), false),
            AxesKind::Xyz => {
                let z = self
                    .sequence
                    .safe_height
                    .map_or(self.context.geometry.z_up, |h| h.0);
                let here = driver.position();
                driver.move_absolute(&Coords::xyz(here.x(), here.y(), z), false)?;
                driver.move_absolute(&Coords::xyz(0.0, 0.0, z), false)
            }
        }
    }
}

/// Validate a configuration, open its driver and run its jobs.
///
/// Tracks recorded by the simulation sink are returned in the report.
///
/// # Errors
///
/// Returns configuration errors and driver open failures. Errors raised
/// while running are reported in the [`SequenceReport`].
#[cfg(feature = "std")]
pub fn run_sequence(config: &SystemConfig) -> Result<SequenceReport> {
    use crate::config::validate_config;
    use crate::driver::{open_driver, DriverSession, SimDriver};

    validate_config(config)?;
    let dispatcher = Dispatcher::from_config(config)?;
    let driver = open_driver(&config.driver, config.axes.count())?;

    let mut session = DriverSession::new(driver, config.safety);
    let mut report = dispatcher.run(&mut session);
    report.tracks = session
        .inner_mut()
        .sim_mut()
        .map(SimDriver::take_tracks)
        .unwrap_or_default();
    Ok(report)
}
