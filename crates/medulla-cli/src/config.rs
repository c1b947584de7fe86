//! Configuration – reads `~/.medulla/config.toml` once at startup.
//!
//! Every field has a sensible default, so a missing file (or an empty one)
//! yields a fully working simulated robot.  The file is read exactly once;
//! nothing is written back.

use std::fs;
use std::path::{Path, PathBuf};

use medulla_runtime::RobotParams;
use medulla_types::MedullaError;
use serde::{Deserialize, Serialize};

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Fixed scheduler period in milliseconds.
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    /// Autonomous routine label to run; the selector's default when absent.
    #[serde(default)]
    pub autonomous: Option<String>,

    /// Robot wiring and tuning.
    #[serde(default)]
    pub robot: RobotParams,
}

fn default_tick_period_ms() -> u64 {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            autonomous: None,
            robot: RobotParams::default(),
        }
    }
}

impl Config {
    /// Scheduler period in seconds.
    pub fn dt(&self) -> f32 {
        self.tick_period_ms as f32 / 1000.0
    }
}

/// Return the path to `~/.medulla/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".medulla").join("config.toml")
}

/// Load the configuration file if it exists.
///
/// # Errors
///
/// Returns [`MedullaError::Config`] when the file exists but cannot be read
/// or parsed; a malformed file must stop startup rather than silently run
/// with defaults.
pub fn load() -> Result<Option<Config>, MedullaError> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    load_from(&path).map(Some)
}

/// Load a configuration document from an explicit path.
pub fn load_from(path: &Path) -> Result<Config, MedullaError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| MedullaError::Config(format!("{}: {e}", path.display())))?;
    toml::from_str(&raw).map_err(|e| MedullaError::Config(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_under_the_home_directory() {
        let path = config_path_for_home("/home/operator");
        assert_eq!(
            path,
            PathBuf::from("/home/operator/.medulla/config.toml")
        );
    }

    #[test]
    fn empty_document_fills_every_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();
        let config = load_from(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
tick_period_ms = 10

[robot.elevator]
setpoints = [0.0, 5.0, 15.0]
kp = 0.8
"#,
        )
        .unwrap();
        let config = load_from(&path).unwrap();
        assert_eq!(config.tick_period_ms, 10);
        assert!((config.dt() - 0.01).abs() < 1e-6);
        assert_eq!(config.robot.elevator.setpoints, vec![0.0, 5.0, 15.0]);
        assert!((config.robot.elevator.kp - 0.8).abs() < 1e-6);
        // Untouched sections keep their defaults.
        assert_eq!(config.robot.drive, RobotParams::default().drive);
    }

    #[test]
    fn setpoint_buttons_can_be_remapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[[robot.setpoint_buttons]]
button = "y"
index = 3
"#,
        )
        .unwrap();
        let config = load_from(&path).unwrap();
        assert_eq!(config.robot.setpoint_buttons.len(), 1);
        assert_eq!(config.robot.setpoint_buttons[0].button, "y");
        assert_eq!(config.robot.setpoint_buttons[0].index, 3);
    }

    #[test]
    fn malformed_document_is_a_fatal_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "tick_period_ms = \"fast\"").unwrap();
        assert!(matches!(
            load_from(&path),
            Err(MedullaError::Config(_))
        ));
    }
}
