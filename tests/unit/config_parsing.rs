//! Unit tests for TOML configuration parsing.

use stage_motion::config::{AxesKind, DriverKind, JobConfig, LimitPolicy, SystemConfig, ViolationPolicy};
use stage_motion::gcode::{Positioning, Units};

const SAFETY: &str = r#"
[safety]
max_feed = 3000.0
x = { min = 0.0, max = 200.0 }
y = { min = 0.0, max = 150.0 }
"#;

fn parse(extra: &str) -> SystemConfig {
    toml::from_str(&format!("{}\n{}", extra, SAFETY)).expect("Failed to parse TOML")
}

/// An envelope alone is a complete configuration.
#[test]
fn test_parse_defaults() {
    let config = parse("");

    assert_eq!(config.axes, AxesKind::Xy);
    assert_eq!(config.driver.kind, DriverKind::Sim);
    assert_eq!(config.geometry.chord_mm, 0.5);
    assert!(!config.geometry.y_flip);
    assert!(config.safety.z.is_none());
    assert!(config.sequence.home_at_start);
    assert_eq!(config.sequence.on_violation, ViolationPolicy::Abort);
    assert!(config.jobs.is_empty());
}

/// Driver section with timeouts and speed settings.
#[test]
fn test_parse_chuo_driver() {
    let config = parse(
        r#"
[driver]
kind = "chuo"
port = "COM4"
baud = 38400
mm_per_pulse = 0.001
home_dirs = "-+"

[driver.settings]
rapid_speed = 4000
cut_speed = 800

[driver.timeouts]
read_ms = 250
poll_ms = 50
"#,
    );

    assert_eq!(config.driver.kind, DriverKind::Chuo);
    assert_eq!(config.driver.port.as_deref(), Some("COM4"));
    assert_eq!(config.driver.baud, 38400);
    assert_eq!(config.driver.home_positive(), [false, true]);
    assert_eq!(config.driver.timeouts.read_ms, 250);
    assert_eq!(config.driver.timeouts.poll_ms, 50);
    assert_eq!(config.driver.timeouts.home_ms, 60_000);
}

/// Modal defaults applied to every job.
#[test]
fn test_parse_modal_defaults() {
    let config = parse(
        r#"
axes = "xyz"

[defaults]
units = "inch"
positioning = "incremental"
feed = 900.0
"#,
    );

    assert_eq!(config.axes, AxesKind::Xyz);
    assert_eq!(config.defaults.units, Units::Inches);
    assert_eq!(config.defaults.positioning, Positioning::Incremental);
    assert_eq!(config.defaults.feed.map(|f| f.0), Some(900.0));
}

/// Job list keeps its order and per-job fields.
#[test]
fn test_parse_job_list() {
    let config = parse(
        r#"
[geometry]
limit_policy = "clamp"
z_up = 3.0

[[jobs]]
type = "grid_circles"
id = "dots"
origin = [10.0, 10.0]
area = [50.0, 30.0]
cell = 10.0
circle_d = 6.0
cw = true
snake = false
dwell_ms = 200

[[jobs]]
type = "gcode"
id = "frame"
file = "frame.nc"
"#,
    );

    assert_eq!(config.geometry.limit_policy, LimitPolicy::Clamp);
    assert_eq!(config.geometry.z_up, 3.0);
    assert_eq!(config.jobs.len(), 2);

    match &config.jobs[0] {
        JobConfig::GridCircles(grid) => {
            assert_eq!(grid.origin, [10.0, 10.0]);
            assert_eq!(grid.cell, 10.0);
            assert!(grid.cw);
            assert!(!grid.snake);
            assert_eq!(grid.dwell_ms, 200);
        }
        other => panic!("unexpected job: {:?}", other),
    }
    assert_eq!(config.jobs[1].kind(), "gcode");
    assert_eq!(config.jobs[1].id(), "frame");
}

/// Unknown job types do not parse.
#[test]
fn test_unknown_job_type_rejected() {
    let result: Result<SystemConfig, _> = toml::from_str(&format!(
        "{}\n[[jobs]]\ntype = \"dxf\"\nid = \"x\"\n",
        SAFETY
    ));
    assert!(result.is_err(), "Should reject unknown job types");
}

/// Missing envelope is a parse error.
#[test]
fn test_missing_safety_rejected() {
    let result: Result<SystemConfig, _> = toml::from_str("axes = \"xy\"\n");
    assert!(result.is_err());
}
