//! Motion commands produced by the parser or the geometry pipeline.

use super::axes::Coords;
use super::state::{Plane, Positioning, Units};

/// What a [`MotionCommand`] does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandKind {
    /// Non-cutting move (G0).
    Rapid,
    /// Cutting move at the modal feed (G1).
    Cut,
    /// Circular cutting move (G2/G3); expanded into cuts by the interpreter.
    Arc {
        /// G2 when true.
        clockwise: bool,
        /// I/J/K centre offsets relative to the start point.
        center: [Option<f64>; 3],
    },
    /// Return to reference ($H, G28).
    Home,
    /// Switch units (G20/G21).
    SetUnits(Units),
    /// Switch positioning mode (G90/G91).
    SetPositioning(Positioning),
    /// Select the arc plane (G17/G18/G19).
    SetPlane(Plane),
    /// Standalone feed word.
    SetFeed(f64),
    /// Pause (G4), in milliseconds.
    Dwell(u32),
}

impl CommandKind {
    /// Short name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            CommandKind::Rapid => "rapid",
            CommandKind::Cut => "cut",
            CommandKind::Arc { .. } => "arc",
            CommandKind::Home => "home",
            CommandKind::SetUnits(_) => "units",
            CommandKind::SetPositioning(_) => "positioning",
            CommandKind::SetPlane(_) => "plane",
            CommandKind::SetFeed(_) => "feed",
            CommandKind::Dwell(_) => "dwell",
        }
    }
}

/// One instruction for the interpreter.
///
/// Before resolution `target` holds literal words in the active units and
/// positioning mode. After resolution moves carry absolute millimetres on
/// every active axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionCommand {
    /// Command kind.
    pub kind: CommandKind,
    /// Per-axis target words (X, Y, Z).
    pub target: [Option<f64>; 3],
    /// Feed override, made modal when present.
    pub feed: Option<f64>,
}

impl MotionCommand {
    /// Command without target or feed.
    pub const fn bare(kind: CommandKind) -> Self {
        Self {
            kind,
            target: [None; 3],
            feed: None,
        }
    }

    /// Rapid to every axis of `to`.
    pub fn rapid(to: &Coords) -> Self {
        Self {
            kind: CommandKind::Rapid,
            target: words_of(to),
            feed: None,
        }
    }

    /// Cut to every axis of `to`.
    pub fn cut(to: &Coords) -> Self {
        Self {
            kind: CommandKind::Cut,
            target: words_of(to),
            feed: None,
        }
    }

    /// Home.
    pub const fn home() -> Self {
        Self::bare(CommandKind::Home)
    }

    /// Units switch.
    pub const fn set_units(units: Units) -> Self {
        Self::bare(CommandKind::SetUnits(units))
    }

    /// Feed change.
    pub const fn set_feed(feed: f64) -> Self {
        Self::bare(CommandKind::SetFeed(feed))
    }

    /// Dwell.
    pub const fn dwell(ms: u32) -> Self {
        Self::bare(CommandKind::Dwell(ms))
    }

    /// Attach a feed override.
    pub fn with_feed(mut self, feed: f64) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Whether this command moves the tool.
    pub const fn is_move(&self) -> bool {
        matches!(
            self.kind,
            CommandKind::Rapid | CommandKind::Cut | CommandKind::Arc { .. }
        )
    }

    /// Resolved absolute target with `dims` axes, if every one is set.
    pub fn target_coords(&self, dims: usize) -> Option<Coords> {
        let mut out = Coords::zeros(dims);
        for i in 0..out.dims() {
            out.set(i, self.target[i]?);
        }
        Some(out)
    }
}

fn words_of(to: &Coords) -> [Option<f64>; 3] {
    let mut words = [None; 3];
    for (slot, v) in words.iter_mut().zip(to.as_slice()) {
        *slot = Some(*v);
    }
    words
}
