//! Intake behavior: operator-summed roller control.

use medulla_kernel::command::{Command, Cycle};
use medulla_types::{ActuatorId, Signal};

/// Default intake command.
///
/// Sums the primary and secondary operator axes (so either station can feed
/// or eject), applies the deadband to the sum, and drives both rollers with
/// the result.  Never finishes on its own.
pub struct ManualIntake {
    requirements: Vec<ActuatorId>,
    primary_axis: String,
    secondary_axis: String,
    deadband: f32,
}

impl ManualIntake {
    pub fn new(
        intake: ActuatorId,
        primary_axis: impl Into<String>,
        secondary_axis: impl Into<String>,
        deadband: f32,
    ) -> Self {
        Self {
            requirements: vec![intake],
            primary_axis: primary_axis.into(),
            secondary_axis: secondary_axis.into(),
            deadband,
        }
    }
}

impl Command for ManualIntake {
    fn name(&self) -> &str {
        "manual_intake"
    }

    fn requirements(&self) -> &[ActuatorId] {
        &self.requirements
    }

    fn execute(&mut self, cx: &mut Cycle<'_>) {
        let summed = cx.controls.axis(&self.primary_axis) + cx.controls.axis(&self.secondary_axis);
        let duty = crate::input::apply_deadband(summed.clamp(-1.0, 1.0), self.deadband);
        cx.io.apply(
            &self.requirements[0],
            Signal::Rollers {
                front: duty,
                rear: duty,
            },
        );
    }

    fn end(&mut self, cx: &mut Cycle<'_>, _interrupted: bool) {
        cx.io.apply(
            &self.requirements[0],
            Signal::Rollers {
                front: 0.0,
                rear: 0.0,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use medulla_hal::sim::SimRig;
    use medulla_types::{ControlFrame, Measurement};

    use super::*;

    #[test]
    fn axes_are_summed_then_deadbanded() {
        let mut io = SimRig::new().with_intake().build().unwrap();
        let mut cmd = ManualIntake::new("intake".into(), "primary", "secondary", 0.08);

        let controls = ControlFrame::new()
            .with_axis("primary", 0.05)
            .with_axis("secondary", 0.02);
        let mut cx = Cycle {
            io: &mut io,
            controls: &controls,
            dt: 0.02,
            tick: 0,
        };
        cmd.execute(&mut cx);
        // Sum of 0.07 is inside the 0.08 band.
        assert_eq!(
            io.sense(&"intake".into()),
            Some(Measurement::Rollers {
                front: 0.0,
                rear: 0.0
            })
        );

        let controls = ControlFrame::new()
            .with_axis("primary", 0.5)
            .with_axis("secondary", 0.3);
        let mut cx = Cycle {
            io: &mut io,
            controls: &controls,
            dt: 0.02,
            tick: 1,
        };
        cmd.execute(&mut cx);
        let Some(Measurement::Rollers { front, rear }) = io.sense(&"intake".into()) else {
            panic!("intake must sense rollers");
        };
        assert!(front > 0.7 && front < 0.8);
        assert_eq!(front, rear);
    }

    #[test]
    fn end_zeroes_the_rollers() {
        let mut io = SimRig::new().with_intake().build().unwrap();
        let mut cmd = ManualIntake::new("intake".into(), "primary", "secondary", 0.08);
        let controls = ControlFrame::new().with_axis("primary", 1.0);
        let mut cx = Cycle {
            io: &mut io,
            controls: &controls,
            dt: 0.02,
            tick: 0,
        };
        cmd.execute(&mut cx);
        cmd.end(&mut cx, true);
        assert_eq!(
            io.sense(&"intake".into()),
            Some(Measurement::Rollers {
                front: 0.0,
                rear: 0.0
            })
        );
    }
}
