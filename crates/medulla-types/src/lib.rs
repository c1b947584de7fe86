use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod trajectory;

pub use trajectory::{Trajectory, TrajectorySample};

/// Stable identity of a physical mechanism (e.g., "drivetrain", "elevator").
///
/// Both the hardware registry and the scheduler's ownership table are keyed
/// by this id, so a command's declared requirements and the driver it talks
/// to always agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActuatorId(String);

impl ActuatorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActuatorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ActuatorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A 2-D field pose: translation plus heading in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

impl Pose {
    pub fn new(x: f32, y: f32, heading: f32) -> Self {
        Self { x, y, heading }
    }
}

/// Drive demand applied to an actuator.
///
/// Out-of-range magnitudes are clamped by the receiving driver, never
/// rejected; callers pre-clamp where precision matters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Signal {
    /// Single-axis duty cycle in `[-1.0, 1.0]`.
    Duty(f32),
    /// Paired roller duty cycles in `[-1.0, 1.0]` each.
    Rollers { front: f32, rear: f32 },
    /// Normalized holonomic chassis demand: `x`/`y` translation and `omega`
    /// rotation rate, each in `[-1.0, 1.0]`.
    Chassis { x: f32, y: f32, omega: f32 },
    /// Lock the current stance (drivetrain only); motion stops immediately.
    Brake,
}

/// Sensed state reported by an actuator.  Reading has no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Measurement {
    /// Linear mechanism: position and velocity in mechanism units, plus the
    /// travel-extreme flags the safety interlock keys on.
    Linear {
        position: f32,
        velocity: f32,
        at_lower: bool,
        at_upper: bool,
    },
    /// Planar mechanism (drivetrain): current pose and ground speed.
    Planar { pose: Pose, speed: f32 },
    /// Roller pair: currently applied duty cycles.
    Rollers { front: f32, rear: f32 },
}

/// Ordered table of target positions for a closed-loop mechanism.
///
/// Index arithmetic saturates at the table ends, so "advance past the top"
/// holds the top setpoint rather than wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetpointTable {
    levels: Vec<f32>,
}

impl SetpointTable {
    /// Build a table from an ordered list of positions.
    ///
    /// # Errors
    ///
    /// Returns [`MedullaError::Config`] when `levels` is empty; a mechanism
    /// with no setpoints is a wiring mistake that must fail at assembly.
    pub fn new(levels: Vec<f32>) -> Result<Self, MedullaError> {
        if levels.is_empty() {
            return Err(MedullaError::Config(
                "setpoint table must contain at least one level".to_string(),
            ));
        }
        Ok(Self { levels })
    }

    /// The target position at `index`, saturating to the last entry.
    pub fn level(&self, index: usize) -> f32 {
        self.levels[self.clamp_index(index)]
    }

    /// Clamp `index` into the valid range.
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.levels.len() - 1)
    }

    /// Index of the topmost setpoint.
    pub fn top_index(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }
}

/// One tick's worth of operator input: named boolean buttons and normalized
/// axis values in `[-1.0, 1.0]`.
///
/// Absent names read as released / centred, so bindings may reference inputs
/// that a particular operator layout does not provide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlFrame {
    buttons: BTreeMap<String, bool>,
    axes: BTreeMap<String, f32>,
}

impl ControlFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a button state.
    pub fn set_button(&mut self, name: impl Into<String>, pressed: bool) {
        self.buttons.insert(name.into(), pressed);
    }

    /// Set an axis value, clamped to `[-1.0, 1.0]`.
    pub fn set_axis(&mut self, name: impl Into<String>, value: f32) {
        self.axes.insert(name.into(), value.clamp(-1.0, 1.0));
    }

    /// Builder-style [`set_button`][Self::set_button], for tests and scripts.
    pub fn with_button(mut self, name: impl Into<String>, pressed: bool) -> Self {
        self.set_button(name, pressed);
        self
    }

    /// Builder-style [`set_axis`][Self::set_axis], for tests and scripts.
    pub fn with_axis(mut self, name: impl Into<String>, value: f32) -> Self {
        self.set_axis(name, value);
        self
    }

    /// `true` while the named button is held.  Unknown names read released.
    pub fn button(&self, name: &str) -> bool {
        self.buttons.get(name).copied().unwrap_or(false)
    }

    /// The named axis value.  Unknown names read centred (0.0).
    pub fn axis(&self, name: &str) -> f32 {
        self.axes.get(name).copied().unwrap_or(0.0)
    }
}

/// Workspace error type.
///
/// Every variant is a configuration-time fault: it is surfaced while the
/// robot is being assembled and prevents startup.  Nothing here is raised
/// mid-operation; ownership conflicts resolve via interruption and safety
/// interlocks clamp silently.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MedullaError {
    #[error("command '{command}' requires unknown actuator '{actuator}'")]
    UnknownActuator { command: String, actuator: ActuatorId },

    #[error("actuator '{0}' is already registered")]
    DuplicateActuator(ActuatorId),

    #[error("default command '{command}' must require exactly '{actuator}' and nothing else")]
    DefaultRequirements { command: String, actuator: ActuatorId },

    #[error("parallel group: children '{first}' and '{second}' both require '{actuator}'")]
    OverlappingRequirements {
        first: String,
        second: String,
        actuator: ActuatorId,
    },

    #[error("no autonomous routine named '{0}'")]
    UnknownRoutine(String),

    #[error("trajectory: {0}")]
    Trajectory(String),

    #[error("configuration: {0}")]
    Config(String),
}
