//! Paths to tracks, tracks to motion commands.

use alloc::vec::Vec;

use crate::config::{GeometryConfig, LimitPolicy, SafetyEnvelope};
use crate::error::{GeometryError, Result};
use crate::gcode::{CommandKind, Coords, MotionCommand, Positioning, Units};

use super::flatten::flatten;
use super::path::Path;
use super::track::{PenState, Track};
use super::transform::Placement;
use super::Point;

/// Place, sample and clamp source paths into tracks.
///
/// Every polyline becomes one track `[Up(p0), Down(p0), Down(p1), ...]`.
/// With [`LimitPolicy::Clamp`] each point is clamped into `envelope`.
///
/// # Errors
///
/// Returns [`GeometryError::NoTracks`] when nothing cuttable remains.
pub fn build_tracks(
    paths: &[Path],
    placement: &Placement,
    geometry: &GeometryConfig,
    envelope: &SafetyEnvelope,
) -> Result<Vec<Track>> {
    let affine = placement.to_affine();
    let mut tracks = Vec::new();

    for path in paths {
        let placed = path.transformed(&affine);
        for mut polyline in flatten(&placed, geometry.chord_mm) {
            if geometry.limit_policy == LimitPolicy::Clamp {
                for p in polyline.iter_mut() {
                    let c = envelope.clamp(&Coords::xy(p.x, p.y));
                    *p = Point::new(c.x(), c.y());
                }
            }
            let track = Track::from_polyline(&polyline);
            if track.has_cut() {
                tracks.push(track);
            }
        }
    }

    if tracks.is_empty() {
        return Err(GeometryError::NoTracks.into());
    }
    debug!("pipeline: {} tracks", tracks.len());
    Ok(tracks)
}

/// Pen heights on a three-axis stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenLift {
    /// Z while travelling.
    pub up: f64,
    /// Z while cutting.
    pub down: f64,
}

impl PenLift {
    /// Lift heights from the geometry configuration when the stage has Z.
    pub fn for_axes(geometry: &GeometryConfig, axes: usize) -> Option<Self> {
        (axes >= 3).then_some(Self {
            up: geometry.z_up,
            down: geometry.z_down,
        })
    }
}

/// Options for [`track_program`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgramOptions {
    /// Pen heights, for stages with Z.
    pub lift: Option<PenLift>,
    /// Cutting feed in mm/min.
    pub feed: Option<f64>,
    /// Pause after each track.
    pub dwell_ms: u32,
}

/// Turn tracks into an absolute millimetre program.
///
/// The program selects mm and absolute positioning first. Pen-up waypoints
/// become rapids, pen-down waypoints cuts; a lower at the current position
/// emits no XY move. Every track starts with a lift, so a track beginning
/// where the previous one ended still gets an in-place rapid on XY stages. With a lift, Z is raised before travel and lowered
/// before cutting, and raised again at the end.
pub fn track_program(tracks: &[Track], options: &ProgramOptions) -> Vec<MotionCommand> {
    let lift = options.lift;
    let mut program = Vec::new();
    program.push(MotionCommand::set_units(Units::Millimeters));
    program.push(MotionCommand::bare(CommandKind::SetPositioning(Positioning::Absolute)));
    if let Some(f) = options.feed {
        program.push(MotionCommand::set_feed(f));
    }

    let mut lifted = true;
    let mut last: Option<Point> = None;
    let mut z_known = false;

    for track in tracks {
        for w in track.waypoints() {
            match w.pen {
                PenState::Up => {
                    let was_cutting = !lifted;
                    if let Some(l) = lift {
                        if !lifted || !z_known {
                            program.push(z_move(MotionCommand::bare(CommandKind::Rapid), l.up));
                            z_known = true;
                        }
                    }
                    lifted = true;
                    // Without Z the rapid is the only lift, so emit it even in place.
                    if last != Some(w.point) || (was_cutting && lift.is_none()) {
                        program.push(xy_move(CommandKind::Rapid, w.point));
                    }
                }
                PenState::Down => {
                    if lifted {
                        if let Some(l) = lift {
                            program.push(z_move(MotionCommand::bare(CommandKind::Cut), l.down));
                        }
                        lifted = false;
                    }
                    if last != Some(w.point) {
                        program.push(xy_move(CommandKind::Cut, w.point));
                    }
                }
            }
            last = Some(w.point);
        }
        if options.dwell_ms > 0 {
            program.push(MotionCommand::dwell(options.dwell_ms));
        }
    }

    if let (Some(l), false) = (lift, lifted) {
        program.push(z_move(MotionCommand::bare(CommandKind::Rapid), l.up));
    }
    program
}

fn xy_move(kind: CommandKind, p: Point) -> MotionCommand {
    let mut cmd = MotionCommand::bare(kind);
    cmd.target = [Some(p.x), Some(p.y), None];
    cmd
}

fn z_move(mut cmd: MotionCommand, z: f64) -> MotionCommand {
    cmd.target = [None, None, Some(z)];
    cmd
}
