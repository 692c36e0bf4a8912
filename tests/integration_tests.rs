//! Integration tests for stage-motion.
//!
//! These tests drive the public API end to end: configuration, G-code,
//! geometry, the safety gate and the job sequence.

use proptest::prelude::*;

use stage_motion::config::{AxisBounds, GeometryConfig, SafetyEnvelope};
use stage_motion::driver::{Driver, DriverSession, PulseAxis, SimDriver};
use stage_motion::error::{GeometryError, SafetyViolation};
use stage_motion::gcode::{CommandKind, Coords, Interpreter, MotionCommand, Positioning, Units, Xy};
use stage_motion::geometry::{
    build_tracks, flatten, parse_svg, track_program, Affine, Path, PenLift, PenState, Placement,
    Point, ProgramOptions,
};
use stage_motion::{parse_config, run_sequence, Error, SequenceStatus};

// =============================================================================
// Helpers
// =============================================================================

fn envelope() -> SafetyEnvelope {
    SafetyEnvelope::xy(AxisBounds::new(0.0, 100.0), AxisBounds::new(0.0, 100.0), 3000.0)
}

fn moves(cmds: &[MotionCommand]) -> Vec<(CommandKind, Coords)> {
    cmds.iter()
        .filter(|c| c.is_move())
        .filter_map(|c| Some((c.kind, c.target_coords(2)?)))
        .collect()
}

const CIRCLE_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
  <circle cx="50" cy="50" r="30" fill="none" stroke="black"/>
</svg>"#;

// =============================================================================
// G-code interpretation
// =============================================================================

#[test]
fn gcode_rapid_then_cut() {
    let mut interp = Interpreter::<Xy>::new();
    let mut out = interp.feed_line("G21 G90 G0 X1 Y1");
    assert_eq!(interp.state().units, Units::Millimeters);
    assert_eq!(interp.state().positioning, Positioning::Absolute);
    out.extend(interp.feed_line("G1 X2 Y2"));

    assert_eq!(
        moves(&out),
        [
            (CommandKind::Rapid, Coords::xy(1.0, 1.0)),
            (CommandKind::Cut, Coords::xy(2.0, 2.0)),
        ]
    );
    assert_eq!(interp.state().units, Units::Millimeters);
    assert_eq!(interp.state().positioning, Positioning::Absolute);
}

#[test]
fn gcode_inch_literal_scales_to_mm() {
    let mut interp = Interpreter::<Xy>::new();
    let out = interp.feed_line("G20 G90 G1 X10");

    let resolved = moves(&out);
    assert_eq!(resolved.len(), 1);
    assert!((resolved[0].1.x() - 254.0).abs() < 1e-9);
}

#[test]
fn gcode_incremental_after_inches() {
    let mut interp = Interpreter::<Xy>::new();
    interp.feed_line("G0 X5 Y5");
    let out = interp.feed_line("G91 G20 G1 X1");

    let resolved = moves(&out);
    assert!((resolved[0].1.x() - 30.4).abs() < 1e-9);
    assert_eq!(resolved[0].1.y(), 5.0);
}

#[test]
fn gcode_diagnostics_are_collected() {
    let mut interp = Interpreter::<Xy>::new();
    let out = interp.feed_program("G0 X1\nM3 S1000\nG1 X2");

    assert_eq!(moves(&out).len(), 2);
    assert!(!interp.diagnostics().is_empty());
}

proptest! {
    #[test]
    fn incremental_target_is_prior_plus_delta(
        start in (-50.0f64..50.0, -50.0f64..50.0),
        deltas in proptest::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 1..20),
    ) {
        let mut interp = Interpreter::<Xy>::new();
        interp.resolve(&MotionCommand::rapid(&Coords::xy(start.0, start.1)));
        interp.resolve(&MotionCommand::bare(CommandKind::SetPositioning(Positioning::Incremental)));

        for (dx, dy) in deltas {
            let prior = interp.state().current_position;
            let out = interp.resolve(&MotionCommand::cut(&Coords::xy(dx, dy)));
            let target = out[0].target_coords(2).unwrap();
            prop_assert_eq!(target.x(), prior.x() + dx);
            prop_assert_eq!(target.y(), prior.y() + dy);
        }
    }
}

// =============================================================================
// Geometry
// =============================================================================

proptest! {
    #[test]
    fn flattened_circle_respects_chord(
        cx in -100.0f64..100.0,
        cy in -100.0f64..100.0,
        r in 0.5f64..80.0,
        chord in 0.05f64..5.0,
        cw in any::<bool>(),
    ) {
        let lines = flatten(&Path::circle(Point::new(cx, cy), r, cw), chord);
        prop_assert_eq!(lines.len(), 1);
        for pair in lines[0].windows(2) {
            prop_assert!(pair[0].distance(&pair[1]) <= chord + 1e-9);
        }
    }

    #[test]
    fn flattened_cubic_respects_chord(
        pts in proptest::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 4),
        chord in 0.1f64..5.0,
    ) {
        let p: Vec<Point> = pts.iter().map(|&(x, y)| Point::new(x, y)).collect();
        let mut path = Path::new();
        path.move_to(p[0]).cubic_to(p[1], p[2], p[3]);

        for line in flatten(&path, chord) {
            for pair in line.windows(2) {
                prop_assert!(pair[0].distance(&pair[1]) <= chord + 1e-9);
            }
        }
    }

    #[test]
    fn flattened_ellipse_under_affine_respects_chord(
        m in proptest::collection::vec(-3.0f64..3.0, 4),
        r in 1.0f64..50.0,
        chord in 0.1f64..5.0,
        cw in any::<bool>(),
    ) {
        let affine = Affine::new(m[0], m[1], m[2], m[3], 10.0, -5.0);
        let path = Path::circle(Point::new(0.0, 0.0), r, cw).transformed(&affine);

        for line in flatten(&path, chord) {
            for pair in line.windows(2) {
                prop_assert!(pair[0].distance(&pair[1]) <= chord + 1e-9);
            }
        }
    }

    #[test]
    fn placement_round_trip(
        x in -500.0f64..500.0,
        y in -500.0f64..500.0,
        scale in 0.01f64..10.0,
        height in proptest::option::of(1.0f64..1000.0),
        ox in -100.0f64..100.0,
        oy in -100.0f64..100.0,
    ) {
        let placement = Placement::new(scale, height, Point::new(ox, oy));
        let p = Point::new(x, y);
        let back = placement.invert(placement.apply(p));
        prop_assert!(back.distance(&p) < 1e-6);
    }
}

#[test]
fn svg_circle_becomes_one_closed_track() {
    let doc = parse_svg(CIRCLE_SVG).unwrap();
    let geometry = GeometryConfig::identity(1.0);
    let placement = Placement::from_config(&geometry, doc.height).unwrap();

    let tracks = build_tracks(&doc.paths, &placement, &geometry, &envelope()).unwrap();
    assert_eq!(tracks.len(), 1);

    let track = &tracks[0];
    assert!(track.is_closed(1.0));
    for p in track.cut_points() {
        assert!((p.distance(&Point::new(50.0, 50.0)) - 30.0).abs() < 1e-6);
    }
    let cuts: Vec<Point> = track.cut_points().collect();
    for pair in cuts.windows(2) {
        assert!(pair[0].distance(&pair[1]) <= 1.0 + 1e-9);
    }

    // One lift, one rapid, one lower before the first cut.
    let options = ProgramOptions {
        lift: PenLift::for_axes(&geometry, 3),
        ..ProgramOptions::default()
    };
    let program = track_program(&tracks, &options);
    let motion: Vec<&MotionCommand> = program.iter().filter(|c| c.is_move()).collect();
    assert_eq!(motion[0].kind, CommandKind::Rapid);
    assert_eq!(motion[0].target, [None, None, Some(5.0)]);
    assert_eq!(motion[1].kind, CommandKind::Rapid);
    assert_eq!(motion[1].target, [Some(80.0), Some(50.0), None]);
    assert_eq!(motion[2].kind, CommandKind::Cut);
    assert_eq!(motion[2].target, [None, None, Some(0.0)]);
    assert!(motion[3..motion.len() - 1]
        .iter()
        .all(|c| c.kind == CommandKind::Cut && c.target[2].is_none()));
}

#[test]
fn touching_svg_lines_stay_separate_tracks() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
      <line x1="0" y1="0" x2="10" y2="0" stroke="black"/>
      <line x1="10" y1="0" x2="10" y2="10" stroke="black"/>
    </svg>"#;
    let doc = parse_svg(svg).unwrap();
    let geometry = GeometryConfig::identity(1.0);
    let placement = Placement::from_config(&geometry, doc.height).unwrap();
    let tracks = build_tracks(&doc.paths, &placement, &geometry, &envelope()).unwrap();
    assert_eq!(tracks.len(), 2);

    let mut sim = SimDriver::new(2);
    let mut interp = Interpreter::<Xy>::new();
    for cmd in track_program(&tracks, &ProgramOptions::default()) {
        for resolved in interp.resolve(&cmd) {
            Interpreter::<Xy>::dispatch(&resolved, &mut sim).unwrap();
        }
    }

    let recorded = sim.take_tracks();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[1].waypoints()[0].point, Point::new(10.0, 0.0));
    assert_eq!(recorded[1].waypoints()[0].pen, PenState::Up);
}

#[test]
fn fill_only_svg_has_no_tracks() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
      <rect x="10" y="10" width="20" height="20" fill="red" stroke="none"/>
    </svg>"#;
    let doc = parse_svg(svg).unwrap();
    assert!(doc.paths.is_empty());
    assert_eq!(doc.fill_only, 1);

    let geometry = GeometryConfig::identity(1.0);
    let placement = Placement::from_config(&geometry, doc.height).unwrap();
    assert!(matches!(
        build_tracks(&doc.paths, &placement, &geometry, &envelope()),
        Err(Error::Geometry(GeometryError::NoTracks))
    ));
}

// =============================================================================
// Drivers and the safety gate
// =============================================================================

proptest! {
    #[test]
    fn pulse_remainder_does_not_drift(
        mm_per_pulse in 0.0005f64..0.05,
        distance in -5.0f64..5.0,
        n in 1usize..500,
    ) {
        let mut axis = PulseAxis::new(mm_per_pulse);
        let sent: i64 = (0..n).map(|_| axis.advance(distance)).sum();
        let exact = n as f64 * distance / mm_per_pulse;
        prop_assert!((sent as f64 - exact).abs() <= 1.0);
        prop_assert_eq!(axis.position().0, sent);
    }

    #[test]
    fn envelope_gate(x in -50.0f64..150.0, y in -50.0f64..150.0) {
        let mut session = DriverSession::new(SimDriver::new(2), envelope());
        let inside = (0.0..=100.0).contains(&x) && (0.0..=100.0).contains(&y);

        let result = session.move_absolute(&Coords::xy(x, y), true);
        if inside {
            prop_assert!(result.is_ok());
            prop_assert_eq!(session.inner().moves(), 1);
        } else {
            let is_bounds_error = matches!(
                result,
                Err(Error::Safety(SafetyViolation::OutOfBounds { .. }))
            );
            prop_assert!(is_bounds_error);
            prop_assert_eq!(session.inner().moves(), 0);
        }
    }
}

#[test]
fn target_on_bound_is_accepted() {
    let mut session = DriverSession::new(SimDriver::new(2), envelope());
    session.move_absolute(&Coords::xy(100.0, 0.0), false).unwrap();
    session.move_absolute(&Coords::xy(0.0, 100.0), true).unwrap();
    assert!(session.move_absolute(&Coords::xy(100.000_001, 0.0), true).is_err());
    assert_eq!(session.inner().moves(), 2);
}

// =============================================================================
// Job sequences
// =============================================================================

#[test]
fn svg_job_records_one_track() {
    let toml = format!(
        r#"
[geometry]
px_to_mm = 1.0
chord_mm = 1.0

[safety]
max_feed = 3000.0
x = {{ min = 0.0, max = 200.0 }}
y = {{ min = 0.0, max = 200.0 }}

[[jobs]]
type = "svg"
id = "circle"
source = '''{}'''
"#,
        CIRCLE_SVG
    );
    let config = parse_config(&toml).unwrap();
    let report = run_sequence(&config).unwrap();

    assert!(report.is_success());
    assert_eq!(report.jobs.len(), 1);
    assert_eq!(report.tracks.len(), 1);

    let track = &report.tracks[0];
    assert_eq!(track.waypoints()[0].pen, PenState::Up);
    assert_eq!(track.waypoints()[0].point, Point::new(80.0, 50.0));
    assert!(track.is_closed(1.0));
}

#[test]
fn sequence_stops_at_fatal_job() {
    let config = parse_config(
        r#"
[safety]
max_feed = 3000.0
x = { min = 0.0, max = 50.0 }
y = { min = 0.0, max = 50.0 }

[[jobs]]
type = "gcode"
id = "ok"
source = "G0 X1 Y1\nG1 X10 Y10"

[[jobs]]
type = "gcode"
id = "too-far"
source = "G1 X80"

[[jobs]]
type = "gcode"
id = "never"
source = "G1 X5"
"#,
    )
    .unwrap();

    let report = run_sequence(&config).unwrap();
    match &report.status {
        SequenceStatus::AbortedAt { index, id, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(id.as_str(), "too-far");
        }
        other => panic!("unexpected status {:?}", other),
    }
    assert_eq!(report.jobs.len(), 2);
    assert_eq!(report.jobs[0].moves, 2);
    assert_eq!(report.tracks.len(), 1);
}

#[test]
fn skip_policy_keeps_going() {
    let config = parse_config(
        r#"
[safety]
max_feed = 3000.0
x = { min = 0.0, max = 50.0 }
y = { min = 0.0, max = 50.0 }

[sequence]
on_violation = "skip"

[[jobs]]
type = "gcode"
id = "partial"
source = "G0 X1 Y1\nG1 X80\nG1 X10 Y10"
"#,
    )
    .unwrap();

    let report = run_sequence(&config).unwrap();
    assert!(report.is_success());
    assert_eq!(report.jobs[0].skipped, 1);
    assert_eq!(report.jobs[0].moves, 2);
}

#[test]
fn step_job_fails_before_any_motion() {
    let config = parse_config(
        r#"
[safety]
max_feed = 3000.0
x = { min = 0.0, max = 50.0 }
y = { min = 0.0, max = 50.0 }

[[jobs]]
type = "step"
id = "part"
file = "part.step"
"#,
    )
    .unwrap();

    assert!(run_sequence(&config).is_err());
}
