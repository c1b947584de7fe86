//! Drivetrain behaviors: operator-relative manual driving, the locked
//! braking stance, and closed-loop trajectory tracking.

use medulla_hal::pid::{PidGains, PositionController};
use medulla_types::{ActuatorId, Measurement, Pose, Signal, Trajectory};
use medulla_kernel::command::{Command, Cycle};

// ─────────────────────────────────────────────────────────────────────────────
// ManualDrive
// ─────────────────────────────────────────────────────────────────────────────

/// Default drivetrain command: maps three operator axes onto a chassis
/// demand every tick.  Never finishes on its own.
pub struct ManualDrive {
    requirements: Vec<ActuatorId>,
    x_axis: String,
    y_axis: String,
    turn_axis: String,
    deadband: f32,
    scale: f32,
}

impl ManualDrive {
    pub fn new(
        drivetrain: ActuatorId,
        x_axis: impl Into<String>,
        y_axis: impl Into<String>,
        turn_axis: impl Into<String>,
        deadband: f32,
        scale: f32,
    ) -> Self {
        Self {
            requirements: vec![drivetrain],
            x_axis: x_axis.into(),
            y_axis: y_axis.into(),
            turn_axis: turn_axis.into(),
            deadband,
            scale,
        }
    }
}

impl Command for ManualDrive {
    fn name(&self) -> &str {
        "manual_drive"
    }

    fn requirements(&self) -> &[ActuatorId] {
        &self.requirements
    }

    fn execute(&mut self, cx: &mut Cycle<'_>) {
        let x = crate::input::apply_deadband(cx.controls.axis(&self.x_axis), self.deadband);
        let y = crate::input::apply_deadband(cx.controls.axis(&self.y_axis), self.deadband);
        let omega = crate::input::apply_deadband(cx.controls.axis(&self.turn_axis), self.deadband);
        let signal = Signal::Chassis {
            x: x * self.scale,
            y: y * self.scale,
            omega: omega * self.scale,
        };
        cx.io.apply(&self.requirements[0], signal);
    }

    fn end(&mut self, cx: &mut Cycle<'_>, _interrupted: bool) {
        cx.io.apply(
            &self.requirements[0],
            Signal::Chassis {
                x: 0.0,
                y: 0.0,
                omega: 0.0,
            },
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HoldStance
// ─────────────────────────────────────────────────────────────────────────────

/// Locks the drivetrain in its braking stance while active.  Intended for a
/// while-held binding; the stance releases as soon as the next chassis
/// demand arrives.
pub struct HoldStance {
    requirements: Vec<ActuatorId>,
}

impl HoldStance {
    pub fn new(drivetrain: ActuatorId) -> Self {
        Self {
            requirements: vec![drivetrain],
        }
    }
}

impl Command for HoldStance {
    fn name(&self) -> &str {
        "hold_stance"
    }

    fn requirements(&self) -> &[ActuatorId] {
        &self.requirements
    }

    fn execute(&mut self, cx: &mut Cycle<'_>) {
        cx.io.apply(&self.requirements[0], Signal::Brake);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TrackTrajectory
// ─────────────────────────────────────────────────────────────────────────────

/// Follows an immutable [`Trajectory`], sampling it by elapsed time since
/// activation.
///
/// Trajectory poses are relative to the trajectory's own origin; the pose
/// measured at activation becomes the frame origin, so no odometry reset is
/// needed before the routine starts.  Tracking uses per-axis feedback
/// controllers for x, y and heading.  Finishes once the elapsed time
/// reaches the trajectory duration and releases the drivetrain.
pub struct TrackTrajectory {
    requirements: Vec<ActuatorId>,
    trajectory: Trajectory,
    x: PositionController,
    y: PositionController,
    heading: PositionController,
    origin: Pose,
    elapsed: f32,
}

impl TrackTrajectory {
    pub fn new(
        drivetrain: ActuatorId,
        trajectory: Trajectory,
        translation: PidGains,
        rotation: PidGains,
    ) -> Self {
        Self {
            requirements: vec![drivetrain],
            trajectory,
            x: PositionController::new(translation, 0.0, 0),
            y: PositionController::new(translation, 0.0, 0),
            heading: PositionController::new(rotation, 0.0, 0),
            origin: Pose::default(),
            elapsed: 0.0,
        }
    }
}

impl Command for TrackTrajectory {
    fn name(&self) -> &str {
        "track_trajectory"
    }

    fn requirements(&self) -> &[ActuatorId] {
        &self.requirements
    }

    fn initialize(&mut self, cx: &mut Cycle<'_>) {
        self.elapsed = 0.0;
        self.x.reset();
        self.y.reset();
        self.heading.reset();
        self.origin = match cx.io.sense(&self.requirements[0]) {
            Some(Measurement::Planar { pose, .. }) => pose,
            _ => Pose::default(),
        };
    }

    fn execute(&mut self, cx: &mut Cycle<'_>) {
        self.elapsed += cx.dt;
        let sample = self.trajectory.sample(self.elapsed);
        let Some(Measurement::Planar { pose, .. }) = cx.io.sense(&self.requirements[0]) else {
            return;
        };

        self.x.set_target(self.origin.x + sample.pose.x);
        self.y.set_target(self.origin.y + sample.pose.y);
        self.heading.set_target(self.origin.heading + sample.pose.heading);

        let signal = Signal::Chassis {
            x: self.x.update(pose.x, cx.dt),
            y: self.y.update(pose.y, cx.dt),
            omega: self.heading.update(pose.heading, cx.dt),
        };
        cx.io.apply(&self.requirements[0], signal);
    }

    fn is_finished(&mut self, _cx: &mut Cycle<'_>) -> bool {
        self.elapsed + 1e-6 >= self.trajectory.duration()
    }

    fn end(&mut self, cx: &mut Cycle<'_>, _interrupted: bool) {
        cx.io.apply(
            &self.requirements[0],
            Signal::Chassis {
                x: 0.0,
                y: 0.0,
                omega: 0.0,
            },
        );
    }
}
