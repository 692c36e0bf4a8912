//! Unit tests for configuration validation.

use stage_motion::config::{validate_config, SystemConfig};
use stage_motion::error::{ConfigError, Error};

fn config(body: &str) -> SystemConfig {
    toml::from_str(body).expect("Failed to parse TOML")
}

const SAFETY: &str = r#"
[safety]
max_feed = 3000.0
x = { min = 0.0, max = 200.0 }
y = { min = 0.0, max = 200.0 }
"#;

/// Test validation of a valid configuration.
#[test]
fn test_valid_config_passes_validation() {
    let config = config(&format!(
        r#"
[driver]
kind = "gsc02"
port = "/dev/ttyUSB0"
mm_per_pulse = 0.002
{}
[[jobs]]
type = "gcode"
id = "square"
source = "G0 X0 Y0"
"#,
        SAFETY
    ));
    assert!(validate_config(&config).is_ok());
}

/// Physical drivers need a port.
#[test]
fn test_physical_driver_without_port() {
    let config = config(&format!(
        "[driver]\nkind = \"gsc02\"\nmm_per_pulse = 0.002\n{}",
        SAFETY
    ));
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::MissingParameter { parameter: "port", .. }))
    ));
}

/// `mm_per_pulse` must be positive.
#[test]
fn test_non_positive_mm_per_pulse() {
    let config = config(&format!(
        "[driver]\nkind = \"chuo\"\nport = \"COM4\"\nmm_per_pulse = 0.0\n{}",
        SAFETY
    ));
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidMmPerPulse(_)))
    ));
}

/// Job ids must be unique.
#[test]
fn test_duplicate_job_ids() {
    let config = config(&format!(
        r#"{}
[[jobs]]
type = "gcode"
id = "a"
source = "G0 X1"

[[jobs]]
type = "grid_circles"
id = "a"
"#,
        SAFETY
    ));
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::DuplicateJobId(_)))
    ));
}

/// Job-level geometry overrides are validated against the merged result.
#[test]
fn test_svg_override_chord() {
    let config = config(&format!(
        r#"{}
[[jobs]]
type = "svg"
id = "logo"
file = "logo.svg"
chord_mm = -1.0
"#,
        SAFETY
    ));
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidChord(_)))
    ));
}

/// A non-positive default feed is rejected.
#[test]
fn test_invalid_default_feed() {
    let config = config(&format!("[defaults]\nfeed = 0.0\n{}", SAFETY));
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidFeed(_)))
    ));
}

/// STEP jobs pass validation; they are refused when the job is built.
#[test]
fn test_step_job_passes_validation() {
    let config = config(&format!(
        "{}\n[[jobs]]\ntype = \"step\"\nid = \"part\"\n",
        SAFETY
    ));
    assert!(validate_config(&config).is_ok());
}

/// A three-axis stage without Z bounds would fail on its first pen lift.
#[test]
fn test_xyz_without_z_bounds_rejected() {
    let grid = "[[jobs]]\ntype = \"grid_circles\"\nid = \"dots\"\n";
    let missing = config(&format!("axes = \"xyz\"\n{}\n{}", SAFETY, grid));
    assert!(matches!(
        validate_config(&missing),
        Err(Error::Config(ConfigError::MissingParameter { parameter: "z", .. }))
    ));

    let bounded = config(&format!(
        "axes = \"xyz\"\n{}z = {{ min = 0.0, max = 10.0 }}\n\n{}",
        SAFETY, grid
    ));
    assert!(validate_config(&bounded).is_ok());
}

/// Driver speeds above the feed ceiling never reach a controller.
#[test]
fn test_rapid_speed_above_max_feed() {
    let config = config(&format!(
        "[driver.settings]\nrapid_speed = 12000\n{}",
        SAFETY
    ));
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::SpeedAboveMax { parameter: "rapid_speed", .. }))
    ));
}
