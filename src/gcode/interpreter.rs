//! Modal interpreter shared by two- and three-axis stages.
//!
//! Resolves parsed or generated [`MotionCommand`]s against a [`ModalState`]
//! and emits moves with absolute millimetre targets, whatever the input's
//! units and positioning mode.

use alloc::vec::Vec;
use core::f64::consts::TAU;

use crate::config::DEFAULT_CHORD_MM;
use crate::driver::Driver;
use crate::error::Result;

use super::axes::{AxisSet, Coords, AXIS_LABELS};
use super::command::{CommandKind, MotionCommand};
use super::diagnostic::{DiagnosticKind, ParseDiagnostic};
use super::parser::Parser;
use super::state::{ModalState, Units};

/// Angles closer than this count as identical arc endpoints.
const ARC_EPSILON: f64 = 1e-9;

/// G-code interpreter generic over the active axis set.
#[derive(Debug, Clone)]
pub struct Interpreter<A: AxisSet> {
    state: ModalState<A>,
    parser: Parser,
    chord_mm: f64,
    line: usize,
    diagnostics: Vec<ParseDiagnostic>,
}

impl<A: AxisSet> Default for Interpreter<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AxisSet> Interpreter<A> {
    /// Interpreter on a fresh state with the default arc chord.
    pub fn new() -> Self {
        Self::with_state(ModalState::new())
    }

    /// Interpreter on an existing state.
    pub fn with_state(state: ModalState<A>) -> Self {
        Self {
            state,
            parser: Parser::new(),
            chord_mm: DEFAULT_CHORD_MM,
            line: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Set the arc sampling tolerance.
    pub fn with_chord(mut self, chord_mm: f64) -> Self {
        self.chord_mm = chord_mm;
        self
    }

    /// Current modal state.
    pub fn state(&self) -> &ModalState<A> {
        &self.state
    }

    /// Lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Diagnostics collected so far.
    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }

    /// Take the collected diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<ParseDiagnostic> {
        core::mem::take(&mut self.diagnostics)
    }

    /// Overwrite the tracked position, e.g. after a move was rejected.
    pub fn sync_position(&mut self, position: Coords) {
        self.state.current_position = position.with_dims(A::COUNT);
    }

    /// Parse and resolve one program line.
    pub fn feed_line(&mut self, line: &str) -> Vec<MotionCommand> {
        self.line += 1;
        let parsed = self.parser.parse_line::<A>(self.line, line);
        for diag in parsed.diagnostics {
            self.report(diag);
        }

        let mut out = Vec::new();
        for cmd in &parsed.commands {
            self.resolve_into(cmd, &mut out);
        }
        out
    }

    /// Parse and resolve a whole program.
    pub fn feed_program(&mut self, program: &str) -> Vec<MotionCommand> {
        let mut out = Vec::new();
        for line in program.lines() {
            out.extend(self.feed_line(line));
        }
        out
    }

    /// Resolve one command.
    ///
    /// Position and plane changes only update state. Units, feed, home and
    /// dwell pass through. Moves come out absolute, arcs as chord-bounded cuts.
    pub fn resolve(&mut self, cmd: &MotionCommand) -> Vec<MotionCommand> {
        let mut out = Vec::new();
        self.resolve_into(cmd, &mut out);
        out
    }

    fn resolve_into(&mut self, cmd: &MotionCommand, out: &mut Vec<MotionCommand>) {
        match cmd.kind {
            CommandKind::SetUnits(units) => {
                self.state.units = units;
                debug!("units -> {}", if units == Units::Millimeters { "mm" } else { "inch" });
                out.push(*cmd);
            }
            CommandKind::SetPositioning(positioning) => self.state.positioning = positioning,
            CommandKind::SetPlane(plane) => self.state.plane = plane,
            CommandKind::SetFeed(feed) => self.apply_feed(feed, out),
            CommandKind::Home => {
                self.state.current_position = A::origin();
                self.state.tool_lifted = true;
                out.push(*cmd);
            }
            CommandKind::Dwell(_) => out.push(*cmd),
            CommandKind::Rapid | CommandKind::Cut => {
                if let Some(feed) = cmd.feed {
                    self.apply_feed(feed, out);
                }
                let words = self.scaled(&cmd.target);
                let target = self.state.resolve_target(&words);
                self.emit_move(cmd.kind == CommandKind::Rapid, target, out);
            }
            CommandKind::Arc { clockwise, center } => {
                if let Some(feed) = cmd.feed {
                    self.apply_feed(feed, out);
                }
                let words = self.scaled(&cmd.target);
                let offsets = self.scaled(&center);
                self.expand_arc(clockwise, &words, &offsets, out);
            }
        }
    }

    fn scaled(&self, words: &[Option<f64>; 3]) -> [Option<f64>; 3] {
        let scale = self.state.scale();
        let mut out = *words;
        for w in out.iter_mut() {
            *w = w.map(|v| v * scale);
        }
        out
    }

    fn apply_feed(&mut self, raw: f64, out: &mut Vec<MotionCommand>) {
        let feed = raw * self.state.scale();
        if self.state.feed_rate != Some(feed) {
            self.state.feed_rate = Some(feed);
            debug!("feed -> {} mm/min", feed);
            out.push(MotionCommand::set_feed(feed));
        }
    }

    fn emit_move(&mut self, rapid: bool, target: Coords, out: &mut Vec<MotionCommand>) {
        self.state.current_position = target;
        self.state.tool_lifted = rapid;
        let mut cmd = if rapid {
            MotionCommand::rapid(&target)
        } else {
            MotionCommand::cut(&target)
        };
        cmd.feed = self.state.feed_rate;
        trace!(
            "{} -> X{} Y{}",
            cmd.kind.name(),
            target.x(),
            target.y()
        );
        out.push(cmd);
    }

    fn expand_arc(
        &mut self,
        clockwise: bool,
        words: &[Option<f64>; 3],
        offsets: &[Option<f64>; 3],
        out: &mut Vec<MotionCommand>,
    ) {
        let (a, b) = self.state.plane.axes();
        if a >= A::COUNT || b >= A::COUNT {
            let label = AXIS_LABELS[a.max(b)];
            let mut text = heapless::String::<4>::new();
            let _ = text.push(label);
            self.report(ParseDiagnostic::new(self.line, DiagnosticKind::AxisNotInSet, &text));
            return;
        }

        let start = self.state.current_position;
        let end = self.state.resolve_target(words);
        let ca = start.get(a) + offsets[a].unwrap_or(0.0);
        let cb = start.get(b) + offsets[b].unwrap_or(0.0);

        let r0 = libm::hypot(start.get(a) - ca, start.get(b) - cb);
        let r1 = libm::hypot(end.get(a) - ca, end.get(b) - cb);
        if r0 < ARC_EPSILON {
            self.emit_move(false, end, out);
            return;
        }

        let a0 = libm::atan2(start.get(b) - cb, start.get(a) - ca);
        let a1 = libm::atan2(end.get(b) - cb, end.get(a) - ca);
        let mut sweep = a1 - a0;
        if clockwise {
            if sweep >= -ARC_EPSILON {
                sweep -= TAU;
            }
        } else if sweep <= ARC_EPSILON {
            sweep += TAU;
        }

        let length = libm::fabs(sweep) * r0.max(r1);
        let steps = libm::ceil(length / self.chord_mm).max(1.0) as usize;

        for k in 1..=steps {
            if k == steps {
                self.emit_move(false, end, out);
                break;
            }
            let t = k as f64 / steps as f64;
            let angle = a0 + sweep * t;
            let radius = r0 + (r1 - r0) * t;
            let mut p = start;
            for i in 0..A::COUNT {
                p.set(i, start.get(i) + (end.get(i) - start.get(i)) * t);
            }
            p.set(a, ca + radius * libm::cos(angle));
            p.set(b, cb + radius * libm::sin(angle));
            self.emit_move(false, p, out);
        }
    }

    fn report(&mut self, diag: ParseDiagnostic) {
        warn!("line {}: {} '{}'", diag.line, diag.kind.name(), diag.text.as_str());
        self.diagnostics.push(diag);
    }

    /// Send one resolved command to a driver.
    pub fn dispatch(cmd: &MotionCommand, driver: &mut dyn Driver) -> Result<()> {
        match cmd.kind {
            CommandKind::Rapid | CommandKind::Cut => match cmd.target_coords(A::COUNT) {
                Some(target) => driver.move_absolute(&target, cmd.kind == CommandKind::Cut),
                None => Ok(()),
            },
            CommandKind::Home => driver.home(),
            CommandKind::SetUnits(units) => driver.set_units_mm(units == Units::Millimeters),
            CommandKind::SetFeed(feed) => driver.set_feed(feed),
            CommandKind::Dwell(ms) => driver.dwell(ms),
            CommandKind::SetPositioning(_) | CommandKind::SetPlane(_) | CommandKind::Arc { .. } => Ok(()),
        }
    }

    /// Resolve a line and dispatch everything it produced.
    ///
    /// Stops at the first driver error.
    pub fn execute_line(&mut self, line: &str, driver: &mut dyn Driver) -> Result<()> {
        for cmd in self.feed_line(line) {
            Self::dispatch(&cmd, driver)?;
        }
        Ok(())
    }
}
