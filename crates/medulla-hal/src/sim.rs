//! Simulated mechanisms for headless tests and the demo binary.
//!
//! Each simulated device implements [`Actuator`] with a deliberately simple
//! first-order model: duty cycle maps directly to velocity, integrated on
//! [`Actuator::tick`].  That is enough for the scheduling core and the
//! closed-loop controllers to be exercised end to end without hardware.
//!
//! # Example
//!
//! ```rust
//! use medulla_hal::sim::SimRig;
//!
//! let registry = SimRig::new()
//!     .with_drivetrain()
//!     .with_elevator()
//!     .with_intake()
//!     .build()
//!     .expect("sim rig ids are distinct");
//! assert_eq!(registry.len(), 3);
//! ```

use medulla_types::{Measurement, MedullaError, Pose, Signal};
use tracing::warn;

use crate::actuator::Actuator;
use crate::registry::ActuatorRegistry;

/// Band around a travel extreme inside which the limit flag reads engaged.
const LIMIT_BAND: f32 = 1e-3;

// ────────────────────────────────────────────────────────────────────────────
// SimElevator
// ────────────────────────────────────────────────────────────────────────────

/// Simulated linear elevator.
///
/// Travel is hard-clamped to `[0, travel]`.  The lower flag models a
/// physical limit switch at the bottom of travel; the upper flag models the
/// soft encoder limit at the top.
pub struct SimElevator {
    id: String,
    position: f32,
    velocity: f32,
    duty: f32,
    travel: f32,
    max_speed: f32,
}

impl SimElevator {
    /// Create an elevator at the bottom of a `[0, travel]` range that moves
    /// at `max_speed` units/s under full duty.
    pub fn new(id: impl Into<String>, travel: f32, max_speed: f32) -> Box<Self> {
        Box::new(Self {
            id: id.into(),
            position: 0.0,
            velocity: 0.0,
            duty: 0.0,
            travel,
            max_speed,
        })
    }

    /// Current carriage position.
    pub fn position(&self) -> f32 {
        self.position
    }
}

impl Actuator for SimElevator {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, signal: Signal) {
        match signal {
            Signal::Duty(d) => self.duty = d.clamp(-1.0, 1.0),
            other => warn!(actuator = %self.id, ?other, "elevator ignores non-duty demand"),
        }
    }

    fn sense(&self) -> Measurement {
        Measurement::Linear {
            position: self.position,
            velocity: self.velocity,
            at_lower: self.position <= LIMIT_BAND,
            at_upper: self.position >= self.travel - LIMIT_BAND,
        }
    }

    fn tick(&mut self, dt: f32) {
        let commanded = self.duty * self.max_speed;
        let next = (self.position + commanded * dt).clamp(0.0, self.travel);
        self.velocity = if dt > 0.0 {
            (next - self.position) / dt
        } else {
            0.0
        };
        self.position = next;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimDrivetrain
// ────────────────────────────────────────────────────────────────────────────

/// Simulated holonomic drivetrain integrating field-relative chassis demands
/// into a [`Pose`].  A [`Signal::Brake`] locks the stance until the next
/// chassis demand arrives.
pub struct SimDrivetrain {
    id: String,
    pose: Pose,
    speed: f32,
    demand: (f32, f32, f32),
    braked: bool,
    max_speed: f32,
    max_omega: f32,
}

impl SimDrivetrain {
    /// Create a drivetrain at the origin with the given full-duty speeds.
    pub fn new(id: impl Into<String>, max_speed: f32, max_omega: f32) -> Box<Self> {
        Box::new(Self {
            id: id.into(),
            pose: Pose::default(),
            speed: 0.0,
            demand: (0.0, 0.0, 0.0),
            braked: false,
            max_speed,
            max_omega,
        })
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// `true` while the wheels are locked in the braking stance.
    pub fn is_braked(&self) -> bool {
        self.braked
    }
}

impl Actuator for SimDrivetrain {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, signal: Signal) {
        match signal {
            Signal::Chassis { x, y, omega } => {
                self.demand = (
                    x.clamp(-1.0, 1.0),
                    y.clamp(-1.0, 1.0),
                    omega.clamp(-1.0, 1.0),
                );
                self.braked = false;
            }
            Signal::Brake => {
                self.demand = (0.0, 0.0, 0.0);
                self.braked = true;
            }
            other => warn!(actuator = %self.id, ?other, "drivetrain ignores non-chassis demand"),
        }
    }

    fn sense(&self) -> Measurement {
        Measurement::Planar {
            pose: self.pose,
            speed: self.speed,
        }
    }

    fn tick(&mut self, dt: f32) {
        if self.braked {
            self.speed = 0.0;
            return;
        }
        let vx = self.demand.0 * self.max_speed;
        let vy = self.demand.1 * self.max_speed;
        self.pose.x += vx * dt;
        self.pose.y += vy * dt;
        self.pose.heading += self.demand.2 * self.max_omega * dt;
        self.speed = (vx * vx + vy * vy).sqrt();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimIntake
// ────────────────────────────────────────────────────────────────────────────

/// Simulated roller-pair intake.  Holds whatever duties were last applied.
pub struct SimIntake {
    id: String,
    front: f32,
    rear: f32,
}

impl SimIntake {
    pub fn new(id: impl Into<String>) -> Box<Self> {
        Box::new(Self {
            id: id.into(),
            front: 0.0,
            rear: 0.0,
        })
    }
}

impl Actuator for SimIntake {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, signal: Signal) {
        match signal {
            Signal::Rollers { front, rear } => {
                self.front = front.clamp(-1.0, 1.0);
                self.rear = rear.clamp(-1.0, 1.0);
            }
            other => warn!(actuator = %self.id, ?other, "intake ignores non-roller demand"),
        }
    }

    fn sense(&self) -> Measurement {
        Measurement::Rollers {
            front: self.front,
            rear: self.rear,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimRig builder
// ────────────────────────────────────────────────────────────────────────────

/// Builder that assembles an [`ActuatorRegistry`] pre-populated with the
/// standard simulated mechanisms, under the conventional ids
/// `"drivetrain"`, `"elevator"`, and `"intake"`.
#[derive(Default)]
pub struct SimRig {
    actuators: Vec<Box<dyn Actuator>>,
}

impl SimRig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a simulated drivetrain (3.0 units/s, 2.0 rad/s at full duty).
    pub fn with_drivetrain(mut self) -> Self {
        self.actuators.push(SimDrivetrain::new("drivetrain", 3.0, 2.0));
        self
    }

    /// Add a simulated elevator with 32 units of travel at 20 units/s.
    pub fn with_elevator(mut self) -> Self {
        self.actuators.push(SimElevator::new("elevator", 32.0, 20.0));
        self
    }

    /// Add a simulated roller intake.
    pub fn with_intake(mut self) -> Self {
        self.actuators.push(SimIntake::new("intake"));
        self
    }

    /// Add a custom driver, e.g. a tracking stub a test asserts against.
    pub fn with_actuator(mut self, actuator: Box<dyn Actuator>) -> Self {
        self.actuators.push(actuator);
        self
    }

    /// Consume the builder and register everything.
    ///
    /// # Errors
    ///
    /// Returns [`MedullaError::DuplicateActuator`] when two added drivers
    /// share an id.
    pub fn build(self) -> Result<ActuatorRegistry, MedullaError> {
        let mut registry = ActuatorRegistry::new();
        for actuator in self.actuators {
            registry.register(actuator)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elevator_integrates_duty_into_position() {
        let mut elevator = SimElevator::new("elevator", 32.0, 20.0);
        elevator.apply(Signal::Duty(0.5));
        elevator.tick(0.1); // 0.5 * 20 u/s * 0.1 s = 1.0 unit
        assert!((elevator.position() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn elevator_limit_flags_at_travel_extremes() {
        let mut elevator = SimElevator::new("elevator", 10.0, 20.0);
        assert!(matches!(
            elevator.sense(),
            Measurement::Linear { at_lower: true, at_upper: false, .. }
        ));

        elevator.apply(Signal::Duty(1.0));
        for _ in 0..100 {
            elevator.tick(0.02);
        }
        assert!(matches!(
            elevator.sense(),
            Measurement::Linear { at_lower: false, at_upper: true, .. }
        ));
    }

    #[test]
    fn elevator_never_leaves_its_travel_range() {
        let mut elevator = SimElevator::new("elevator", 10.0, 20.0);
        elevator.apply(Signal::Duty(-1.0));
        for _ in 0..50 {
            elevator.tick(0.02);
        }
        assert!(elevator.position() >= 0.0);
    }

    #[test]
    fn drivetrain_integrates_chassis_demand() {
        let mut drive = SimDrivetrain::new("drivetrain", 2.0, 1.0);
        drive.apply(Signal::Chassis {
            x: 1.0,
            y: 0.0,
            omega: 0.0,
        });
        for _ in 0..50 {
            drive.tick(0.02);
        }
        // 2.0 units/s for 1.0 s.
        assert!((drive.pose().x - 2.0).abs() < 1e-4);
    }

    #[test]
    fn brake_locks_the_stance_until_the_next_chassis_demand() {
        let mut drive = SimDrivetrain::new("drivetrain", 2.0, 1.0);
        drive.apply(Signal::Chassis {
            x: 1.0,
            y: 0.0,
            omega: 0.0,
        });
        drive.tick(0.5);
        drive.apply(Signal::Brake);
        drive.tick(0.5);
        assert!(drive.is_braked());
        assert!((drive.pose().x - 1.0).abs() < 1e-5);
        assert!(matches!(
            drive.sense(),
            Measurement::Planar { speed, .. } if speed == 0.0
        ));

        drive.apply(Signal::Chassis {
            x: 0.5,
            y: 0.0,
            omega: 0.0,
        });
        assert!(!drive.is_braked());
    }

    #[test]
    fn intake_holds_clamped_roller_duties() {
        let mut intake = SimIntake::new("intake");
        intake.apply(Signal::Rollers {
            front: 2.0,
            rear: -0.5,
        });
        assert_eq!(
            intake.sense(),
            Measurement::Rollers {
                front: 1.0,
                rear: -0.5
            }
        );
    }

    #[test]
    fn rig_builds_the_standard_mechanism_set() {
        let registry = SimRig::new()
            .with_drivetrain()
            .with_elevator()
            .with_intake()
            .build()
            .unwrap();
        for id in ["drivetrain", "elevator", "intake"] {
            assert!(registry.contains(&id.into()));
        }
    }

    #[test]
    fn rig_rejects_duplicate_ids() {
        let result = SimRig::new().with_elevator().with_elevator().build();
        assert!(matches!(result, Err(MedullaError::DuplicateActuator(_))));
    }
}
