//! Configuration validation.

use crate::error::{truncated, ConfigError, Error, Result};

use super::driver::{DriverConfig, DriverSettings};
use super::geometry::GeometryConfig;
use super::job::JobConfig;
use super::limits::SafetyEnvelope;
use super::{AxesKind, SystemConfig};

/// Validate a system configuration.
///
/// Checks:
/// - Physical drivers have a port and a positive `mm_per_pulse`
/// - `home_dirs` is two of `+`/`-`
/// - Geometry scale and chord tolerance are positive
/// - Envelope bounds are ordered and the feed ceiling is positive
/// - Configured rapid and cut speeds do not exceed the feed ceiling
/// - Three-axis stages have Z bounds holding every pen and safe height,
///   and use the simulation sink
/// - Job ids are unique and job-level geometry is valid
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    validate_driver(&config.driver)?;
    validate_geometry(&config.geometry)?;
    validate_envelope(&config.safety)?;
    validate_speeds(&config.driver.settings, &config.safety)?;
    if config.axes == AxesKind::Xyz {
        validate_z(config)?;
    }

    if let Some(feed) = config.defaults.feed {
        if !(feed.0 > 0.0) {
            return Err(Error::Config(ConfigError::InvalidFeed(feed.0)));
        }
    }

    for (i, job) in config.jobs.iter().enumerate() {
        if config.jobs[..i].iter().any(|other| other.id() == job.id()) {
            return Err(Error::Config(ConfigError::DuplicateJobId(truncated(job.id()))));
        }
        validate_job(job, config)?;
    }

    Ok(())
}

/// Validate driver parameters.
pub fn validate_driver(driver: &DriverConfig) -> Result<()> {
    if !driver.kind.is_physical() {
        return Ok(());
    }

    if driver.port.as_ref().map_or(true, |p| p.is_empty()) {
        return Err(Error::Config(ConfigError::MissingParameter {
            section: driver.kind.name(),
            parameter: "port",
        }));
    }

    match driver.mm_per_pulse {
        None => {
            return Err(Error::Config(ConfigError::MissingParameter {
                section: driver.kind.name(),
                parameter: "mm_per_pulse",
            }))
        }
        Some(mpp) if !(mpp > 0.0) || !mpp.is_finite() => {
            return Err(Error::Config(ConfigError::InvalidMmPerPulse(mpp)));
        }
        Some(_) => {}
    }

    let dirs = driver.home_dirs.as_str();
    if dirs.len() != 2 || !dirs.chars().all(|c| c == '+' || c == '-') {
        return Err(Error::Config(ConfigError::InvalidHomeDirs(driver.home_dirs.clone())));
    }

    Ok(())
}

/// Validate geometry parameters.
pub fn validate_geometry(geometry: &GeometryConfig) -> Result<()> {
    if !(geometry.px_to_mm > 0.0) {
        return Err(Error::Config(ConfigError::InvalidScale(geometry.px_to_mm)));
    }
    if !(geometry.chord_mm > 0.0) {
        return Err(Error::Config(ConfigError::InvalidChord(geometry.chord_mm)));
    }
    Ok(())
}

fn validate_envelope(envelope: &SafetyEnvelope) -> Result<()> {
    for (axis, bounds) in [('X', Some(&envelope.x)), ('Y', Some(&envelope.y)), ('Z', envelope.z.as_ref())] {
        let Some(bounds) = bounds else { continue };
        if !bounds.is_valid() {
            return Err(Error::Config(ConfigError::InvalidBounds {
                axis,
                min: bounds.min.0,
                max: bounds.max.0,
            }));
        }
    }

    if !(envelope.max_feed.0 > 0.0) {
        return Err(Error::Config(ConfigError::InvalidFeed(envelope.max_feed.0)));
    }

    Ok(())
}

fn validate_speeds(settings: &DriverSettings, envelope: &SafetyEnvelope) -> Result<()> {
    let max = envelope.max_feed.0;
    for (parameter, speed) in [("rapid_speed", settings.rapid_speed), ("cut_speed", settings.cut_speed)] {
        match speed {
            Some(v) if !(v.0 > 0.0) => return Err(Error::Config(ConfigError::InvalidFeed(v.0))),
            Some(v) if v.0 > max => {
                return Err(Error::Config(ConfigError::SpeedAboveMax {
                    parameter,
                    value: v.0,
                    max,
                }))
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_z(config: &SystemConfig) -> Result<()> {
    // Stage controllers only drive X and Y.
    if config.driver.kind.is_physical() {
        return Err(Error::Config(ConfigError::Unsupported(truncated(config.driver.kind.name()))));
    }

    let bounds = config.safety.z.ok_or(Error::Config(ConfigError::MissingParameter {
        section: "safety",
        parameter: "z",
    }))?;

    let heights = [
        ("z_up", Some(config.geometry.z_up)),
        ("z_down", Some(config.geometry.z_down)),
        ("safe_height", config.sequence.safe_height.map(|h| h.0)),
    ];
    for (parameter, value) in heights {
        if let Some(value) = value {
            if !bounds.contains(value) {
                return Err(Error::Config(ConfigError::OutsideBounds { parameter, value }));
            }
        }
    }
    Ok(())
}

fn validate_job(job: &JobConfig, config: &SystemConfig) -> Result<()> {
    match job {
        JobConfig::Svg(svg) => {
            let geometry = svg.overrides.apply(&config.geometry);
            validate_geometry(&geometry)?;
            if let Some(feed) = svg.feed {
                if !(feed.0 > 0.0) {
                    return Err(Error::Config(ConfigError::InvalidFeed(feed.0)));
                }
            }
            if svg.file.is_none() && svg.source.is_none() {
                return Err(Error::Config(ConfigError::MissingParameter {
                    section: "svg",
                    parameter: "file",
                }));
            }
        }
        JobConfig::Gcode(gcode) => {
            if gcode.file.is_none() && gcode.source.is_none() {
                return Err(Error::Config(ConfigError::MissingParameter {
                    section: "gcode",
                    parameter: "file",
                }));
            }
        }
        JobConfig::GridCircles(grid) => {
            if !(grid.cell > 0.0) || !(grid.circle_d > 0.0) {
                return Err(Error::Config(ConfigError::InvalidScale(grid.cell.min(grid.circle_d))));
            }
            if let Some(feed) = grid.feed {
                if !(feed.0 > 0.0) {
                    return Err(Error::Config(ConfigError::InvalidFeed(feed.0)));
                }
            }
        }
        // STEP entries parse but are rejected when the job is built.
        JobConfig::Step(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AxisBounds, DriverKind};

    fn envelope() -> SafetyEnvelope {
        SafetyEnvelope::xy(AxisBounds::new(0.0, 200.0), AxisBounds::new(0.0, 200.0), 3000.0)
    }

    #[test]
    fn test_physical_driver_needs_mm_per_pulse() {
        let mut driver = DriverConfig::physical(DriverKind::Gsc02, "COM3", 0.001);
        driver.mm_per_pulse = None;

        assert!(matches!(
            validate_driver(&driver),
            Err(Error::Config(ConfigError::MissingParameter {
                parameter: "mm_per_pulse",
                ..
            }))
        ));
    }

    #[test]
    fn test_sim_driver_needs_nothing() {
        assert!(validate_driver(&DriverConfig::sim()).is_ok());
    }

    #[test]
    fn test_inverted_bounds() {
        let mut env = envelope();
        env.y = AxisBounds::new(10.0, -10.0);

        assert!(matches!(
            validate_envelope(&env),
            Err(Error::Config(ConfigError::InvalidBounds { axis: 'Y', .. }))
        ));
    }

    #[test]
    fn test_zero_chord() {
        let geometry = GeometryConfig {
            chord_mm: 0.0,
            ..GeometryConfig::default()
        };
        assert!(matches!(
            validate_geometry(&geometry),
            Err(Error::Config(ConfigError::InvalidChord(_)))
        ));
    }

    #[test]
    fn test_bad_home_dirs() {
        let mut driver = DriverConfig::physical(DriverKind::Gsc02, "COM3", 0.001);
        driver.home_dirs = truncated("+x");

        assert!(matches!(
            validate_driver(&driver),
            Err(Error::Config(ConfigError::InvalidHomeDirs(_)))
        ));
    }

    fn xyz_system() -> SystemConfig {
        let mut config = SystemConfig::new(SafetyEnvelope::xyz(
            AxisBounds::new(0.0, 200.0),
            AxisBounds::new(0.0, 200.0),
            AxisBounds::new(0.0, 10.0),
            3000.0,
        ));
        config.axes = AxesKind::Xyz;
        config
    }

    #[test]
    fn test_xyz_needs_z_bounds() {
        let mut config = xyz_system();
        assert!(validate_config(&config).is_ok());

        config.safety.z = None;
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::MissingParameter { parameter: "z", .. }))
        ));
    }

    #[test]
    fn test_heights_inside_z_bounds() {
        let mut config = xyz_system();
        config.geometry.z_up = 12.0;
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::OutsideBounds { parameter: "z_up", .. }))
        ));

        let mut config = xyz_system();
        config.sequence.safe_height = Some(crate::config::Millimeters(-1.0));
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::OutsideBounds { parameter: "safe_height", .. }))
        ));
    }

    #[test]
    fn test_physical_driver_rejects_xyz() {
        let mut config = xyz_system();
        config.driver = DriverConfig::physical(DriverKind::Chuo, "COM3", 0.001);
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::Unsupported(_)))
        ));
    }

    #[test]
    fn test_driver_speeds_under_ceiling() {
        let mut config = SystemConfig::new(envelope());
        config.driver.settings.rapid_speed = Some(crate::config::MmPerMin(12000.0));
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::SpeedAboveMax { parameter: "rapid_speed", .. }))
        ));

        config.driver.settings.rapid_speed = Some(crate::config::MmPerMin(3000.0));
        config.driver.settings.cut_speed = Some(crate::config::MmPerMin(3500.0));
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::SpeedAboveMax { parameter: "cut_speed", .. }))
        ));
    }

    #[test]
    fn test_valid_default_system() {
        let config = SystemConfig::new(envelope());
        assert!(validate_config(&config).is_ok());
    }
}
