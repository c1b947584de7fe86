//! Generic `Actuator` trait for the mechanisms the scheduler arbitrates
//! (drivetrain, elevator, intake, …).
//!
//! Drivers implement this trait and register themselves with an
//! [`ActuatorRegistry`][crate::registry::ActuatorRegistry].  The scheduling
//! core only ever talks to the trait, so a simulated mechanism and a real
//! motor driver are interchangeable without touching command logic.

use medulla_types::{Measurement, Signal};

/// A controllable physical mechanism behind an apply/sense contract.
///
/// `apply` never fails: a demand outside the mechanism's safe range is
/// clamped, not rejected, and a [`Signal`] variant the mechanism cannot
/// express is dropped with a warning.  Callers that need precision pre-clamp
/// their own output.
pub trait Actuator {
    /// Stable identifier, e.g. `"drivetrain"` or `"elevator"`.
    fn id(&self) -> &str;

    /// Apply a drive demand for the current tick.
    fn apply(&mut self, signal: Signal);

    /// Report the current sensed state.  No side effects.
    fn sense(&self) -> Measurement;

    /// Advance internal state by `dt` seconds.
    ///
    /// Hardware-backed drivers normally keep the default no-op; simulated
    /// mechanisms integrate their model here.
    fn tick(&mut self, dt: f32) {
        let _ = dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal single-axis actuator used only for tests.
    struct MockActuator {
        id: String,
        duty: f32,
    }

    impl Actuator for MockActuator {
        fn id(&self) -> &str {
            &self.id
        }

        fn apply(&mut self, signal: Signal) {
            if let Signal::Duty(d) = signal {
                self.duty = d.clamp(-1.0, 1.0);
            }
        }

        fn sense(&self) -> Measurement {
            Measurement::Linear {
                position: self.duty,
                velocity: 0.0,
                at_lower: false,
                at_upper: false,
            }
        }
    }

    #[test]
    fn mock_actuator_clamps_out_of_range_duty() {
        let mut act = MockActuator {
            id: "test".to_string(),
            duty: 0.0,
        };
        act.apply(Signal::Duty(3.0));
        assert!(matches!(
            act.sense(),
            Measurement::Linear { position, .. } if (position - 1.0).abs() < f32::EPSILON
        ));
    }

    #[test]
    fn default_tick_is_a_no_op() {
        let mut act = MockActuator {
            id: "test".to_string(),
            duty: 0.5,
        };
        act.tick(0.02);
        assert!(matches!(
            act.sense(),
            Measurement::Linear { position, .. } if (position - 0.5).abs() < f32::EPSILON
        ));
    }
}
