//! Line tokenizer and word parser.
//!
//! Words follow the `[A-Za-z][+-0-9.]*` shape. Comments in parentheses and
//! everything after `;` are stripped first. Modal words are emitted before
//! the motion on the same line so a line like `G20 G1 X1` moves in inches.

use alloc::string::String;
use alloc::vec::Vec;

use super::axes::{axis_index, AxisSet};
use super::command::{CommandKind, MotionCommand};
use super::diagnostic::{DiagnosticKind, ParseDiagnostic};
use super::state::{Plane, Positioning, Units};

/// Modal motion group (G0/G1/G2/G3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionMode {
    /// G0
    Rapid,
    /// G1
    Cut,
    /// G2
    ArcCw,
    /// G3
    ArcCcw,
}

/// Commands and diagnostics from one line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLine {
    /// Commands in execution order.
    pub commands: Vec<MotionCommand>,
    /// Non-fatal diagnostics.
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Remove `( … )` comments and anything after `;`.
///
/// An unclosed `(` comments out the rest of the line.
pub fn strip_comments(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut depth = 0usize;
    for c in line.chars() {
        match c {
            ';' if depth == 0 => break,
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Split a stripped line into `(letter, value)` words.
fn tokenize(line: &str) -> Vec<(char, &str)> {
    let mut words = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_alphabetic() {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && matches!(bytes[end], b'+' | b'-' | b'.' | b'0'..=b'9') {
                end += 1;
            }
            words.push(((c as char).to_ascii_uppercase(), &line[start..end]));
            i = end;
        } else {
            i += 1;
        }
    }
    words
}

/// Stateful line parser. Holds the modal motion group between lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    motion: Option<MotionMode>,
}

impl Parser {
    /// Create a parser with no motion mode established.
    pub const fn new() -> Self {
        Self { motion: None }
    }

    /// Active motion mode.
    pub fn motion_mode(&self) -> Option<MotionMode> {
        self.motion
    }

    /// Parse one program line (`number` is 1-based, used in diagnostics).
    ///
    /// A malformed numeric literal drops the whole line and leaves the parser
    /// unchanged. Unsupported words are reported and skipped.
    pub fn parse_line<A: AxisSet>(&mut self, number: usize, line: &str) -> ParsedLine {
        let mut parsed = ParsedLine::default();
        let text = strip_comments(line);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return parsed;
        }

        if let Some(rest) = trimmed.strip_prefix('$') {
            if rest.trim().eq_ignore_ascii_case("H") {
                parsed.commands.push(MotionCommand::home());
            } else {
                parsed
                    .diagnostics
                    .push(ParseDiagnostic::new(number, DiagnosticKind::UnsupportedWord, trimmed));
            }
            return parsed;
        }

        let mut values: Vec<(char, &str, f64)> = Vec::new();
        for (letter, raw) in tokenize(trimmed) {
            match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => values.push((letter, raw, v)),
                _ => {
                    let mut word = String::new();
                    word.push(letter);
                    word.push_str(raw);
                    parsed
                        .diagnostics
                        .push(ParseDiagnostic::new(number, DiagnosticKind::MalformedNumber, &word));
                    return parsed;
                }
            }
        }

        let mut units = None;
        let mut positioning = None;
        let mut plane = None;
        let mut motion = None;
        let mut home = false;
        let mut dwell = false;
        let mut target = [None; 3];
        let mut center = [None; 3];
        let mut feed = None;
        let mut dwell_ms = None;

        for &(letter, raw, value) in &values {
            match letter {
                'G' => match g_code(value) {
                    Some(0) => motion = Some(MotionMode::Rapid),
                    Some(1) => motion = Some(MotionMode::Cut),
                    Some(2) => motion = Some(MotionMode::ArcCw),
                    Some(3) => motion = Some(MotionMode::ArcCcw),
                    Some(4) => dwell = true,
                    Some(17) => plane = Some(Plane::Xy),
                    Some(18) => plane = Some(Plane::Zx),
                    Some(19) => plane = Some(Plane::Yz),
                    Some(20) => units = Some(Units::Inches),
                    Some(21) => units = Some(Units::Millimeters),
                    Some(28) => home = true,
                    Some(90) => positioning = Some(Positioning::Absolute),
                    Some(91) => positioning = Some(Positioning::Incremental),
                    _ => unsupported(&mut parsed, number, DiagnosticKind::UnsupportedCode, letter, raw),
                },
                'X' | 'Y' | 'Z' => {
                    if A::accepts(letter) {
                        if let Some(i) = axis_index(letter) {
                            target[i] = Some(value);
                        }
                    } else {
                        unsupported(&mut parsed, number, DiagnosticKind::AxisNotInSet, letter, raw);
                    }
                }
                'I' => center[0] = Some(value),
                'J' => center[1] = Some(value),
                'K' => center[2] = Some(value),
                'F' => feed = Some(value),
                'P' => dwell_ms = Some(value),
                _ => unsupported(&mut parsed, number, DiagnosticKind::UnsupportedWord, letter, raw),
            }
        }

        if let Some(u) = units {
            parsed.commands.push(MotionCommand::set_units(u));
        }
        if let Some(p) = plane {
            parsed.commands.push(MotionCommand::bare(CommandKind::SetPlane(p)));
        }
        if let Some(p) = positioning {
            parsed.commands.push(MotionCommand::bare(CommandKind::SetPositioning(p)));
        }
        if let Some(m) = motion {
            self.motion = Some(m);
        }

        let has_axes = target.iter().any(Option::is_some);
        let has_center = center.iter().any(Option::is_some);
        let moves = !home && !dwell && (has_axes || (has_center && motion.is_some()));

        if let Some(f) = feed {
            if !moves {
                parsed.commands.push(MotionCommand::set_feed(f));
            }
        }

        if home {
            parsed.commands.push(MotionCommand::home());
        }

        if dwell {
            match dwell_ms {
                Some(ms) if ms >= 0.0 => parsed.commands.push(MotionCommand::dwell(libm::round(ms) as u32)),
                _ => parsed
                    .diagnostics
                    .push(ParseDiagnostic::new(number, DiagnosticKind::MissingWord, "G4 P")),
            }
        }

        if !moves {
            return parsed;
        }

        let kind = match self.motion {
            Some(MotionMode::Rapid) => CommandKind::Rapid,
            Some(MotionMode::Cut) => CommandKind::Cut,
            Some(MotionMode::ArcCw) | Some(MotionMode::ArcCcw) => {
                if !has_center {
                    parsed
                        .diagnostics
                        .push(ParseDiagnostic::new(number, DiagnosticKind::MissingWord, "I/J"));
                    return parsed;
                }
                CommandKind::Arc {
                    clockwise: self.motion == Some(MotionMode::ArcCw),
                    center,
                }
            }
            None => {
                parsed
                    .diagnostics
                    .push(ParseDiagnostic::new(number, DiagnosticKind::NoMotionMode, trimmed));
                return parsed;
            }
        };

        parsed.commands.push(MotionCommand { kind, target, feed });
        parsed
    }
}

/// Integer G number, if the value is integral.
fn g_code(value: f64) -> Option<u32> {
    if value >= 0.0 && value == libm::trunc(value) && value < 1000.0 {
        Some(value as u32)
    } else {
        None
    }
}

fn unsupported(parsed: &mut ParsedLine, number: usize, kind: DiagnosticKind, letter: char, raw: &str) {
    let mut word = String::new();
    word.push(letter);
    word.push_str(raw);
    parsed.diagnostics.push(ParseDiagnostic::new(number, kind, &word));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcode::{Xy, Xyz};

    fn kinds(parsed: &ParsedLine) -> Vec<CommandKind> {
        parsed.commands.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("G0 X1 (move) Y2 ; trailing"), "G0 X1  Y2 ");
        assert_eq!(strip_comments("(whole line)"), "");
        assert_eq!(strip_comments("G1 X1 (unclosed"), "G1 X1 ");
    }

    #[test]
    fn test_tokenize_packed_words() {
        let words = tokenize("g0x1.5y-2");
        assert_eq!(words, [('G', "0"), ('X', "1.5"), ('Y', "-2")]);
    }

    #[test]
    fn test_modal_before_motion() {
        let mut parser = Parser::new();
        let parsed = parser.parse_line::<Xy>(1, "G21 G90 G0 X1 Y1");

        assert_eq!(
            kinds(&parsed),
            [
                CommandKind::SetUnits(Units::Millimeters),
                CommandKind::SetPositioning(Positioning::Absolute),
                CommandKind::Rapid,
            ]
        );
        assert_eq!(parsed.commands[2].target, [Some(1.0), Some(1.0), None]);
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_motion_mode_is_modal() {
        let mut parser = Parser::new();
        parser.parse_line::<Xy>(1, "G1 X1");
        let parsed = parser.parse_line::<Xy>(2, "X2 Y3");

        assert_eq!(kinds(&parsed), [CommandKind::Cut]);
        assert_eq!(parser.motion_mode(), Some(MotionMode::Cut));
    }

    #[test]
    fn test_axis_words_without_mode() {
        let mut parser = Parser::new();
        let parsed = parser.parse_line::<Xy>(3, "X5");

        assert!(parsed.commands.is_empty());
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::NoMotionMode);
        assert_eq!(parsed.diagnostics[0].line, 3);
    }

    #[test]
    fn test_malformed_number_skips_line() {
        let mut parser = Parser::new();
        let parsed = parser.parse_line::<Xy>(7, "G1 X1.2.3 Y4");

        assert!(parsed.commands.is_empty());
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::MalformedNumber);
        assert_eq!(parsed.diagnostics[0].text.as_str(), "X1.2.3");
        assert_eq!(parser.motion_mode(), None);
    }

    #[test]
    fn test_unsupported_words_continue() {
        let mut parser = Parser::new();
        let parsed = parser.parse_line::<Xy>(1, "N10 M3 S1000 G1 X1");

        assert_eq!(kinds(&parsed), [CommandKind::Cut]);
        assert_eq!(parsed.diagnostics.len(), 3);
        assert!(parsed
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::UnsupportedWord));
    }

    #[test]
    fn test_z_rejected_on_xy() {
        let mut parser = Parser::new();
        let parsed = parser.parse_line::<Xy>(1, "G1 X1 Z2");
        assert_eq!(parsed.commands[0].target, [Some(1.0), None, None]);
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::AxisNotInSet);

        let parsed = Parser::new().parse_line::<Xyz>(1, "G1 X1 Z2");
        assert_eq!(parsed.commands[0].target, [Some(1.0), None, Some(2.0)]);
    }

    #[test]
    fn test_home_forms() {
        let mut parser = Parser::new();
        assert_eq!(kinds(&parser.parse_line::<Xy>(1, "$H")), [CommandKind::Home]);
        assert_eq!(kinds(&parser.parse_line::<Xy>(2, "G28")), [CommandKind::Home]);
    }

    #[test]
    fn test_dwell_and_feed() {
        let mut parser = Parser::new();
        assert_eq!(kinds(&parser.parse_line::<Xy>(1, "G4 P250")), [CommandKind::Dwell(250)]);
        assert_eq!(kinds(&parser.parse_line::<Xy>(2, "F800")), [CommandKind::SetFeed(800.0)]);

        let parsed = parser.parse_line::<Xy>(3, "G1 X1 F600");
        assert_eq!(parsed.commands[0].feed, Some(600.0));
    }

    #[test]
    fn test_arc_requires_center() {
        let mut parser = Parser::new();
        let parsed = parser.parse_line::<Xy>(1, "G2 X10 Y0");
        assert!(parsed.commands.is_empty());
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::MissingWord);

        let parsed = parser.parse_line::<Xy>(2, "G3 X10 Y0 I5 J0");
        assert!(matches!(
            parsed.commands[0].kind,
            CommandKind::Arc { clockwise: false, .. }
        ));
    }
}
