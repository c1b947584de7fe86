//! Robot assembly: mechanisms, default commands, trigger bindings, and
//! autonomous routines, wired together from a parameter set.
//!
//! This is where the structure of the robot is declared.  Everything is
//! explicit: the scheduler and registry are plain owned fields (no global
//! singletons), command state lives in named struct fields, and the
//! button → setpoint-index mapping comes from [`RobotParams`] rather than
//! being baked into any command.

use std::cell::RefCell;
use std::rc::Rc;

use medulla_hal::pid::PidGains;
use medulla_hal::sim::{SimDrivetrain, SimElevator, SimIntake};
use medulla_hal::ActuatorRegistry;
use medulla_kernel::command::Cycle;
use medulla_kernel::{
    ActivationId, BindMode, InstantCommand, RoutineSelector, Scheduler, Sequential, Trigger,
};
use medulla_types::{
    ControlFrame, Measurement, MedullaError, Pose, SetpointTable, Signal, Trajectory,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::drive::{HoldStance, ManualDrive, TrackTrajectory};
use crate::elevator::{ElevatorToSetpoint, ManualElevator, SelectSetpoint, SetpointCycle, SetpointStep};
use crate::intake::ManualIntake;
use crate::telemetry::Telemetry;

/// Conventional actuator ids used by the standard assembly.
pub const DRIVETRAIN: &str = "drivetrain";
pub const ELEVATOR: &str = "elevator";
pub const INTAKE: &str = "intake";

/// Conventional operator-axis names.
pub const AXIS_DRIVE_X: &str = "drive_x";
pub const AXIS_DRIVE_Y: &str = "drive_y";
pub const AXIS_TURN: &str = "turn";
pub const AXIS_ELEVATOR_JOG: &str = "elevator_jog";
pub const AXIS_INTAKE_PRIMARY: &str = "intake_primary";
pub const AXIS_INTAKE_SECONDARY: &str = "intake_secondary";

// ─────────────────────────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// One operator button mapped to one setpoint-table index.
///
/// The mapping is configuration, not a core invariant: any number of
/// buttons may target any index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetpointButton {
    pub button: String,
    pub index: usize,
}

/// Drivetrain tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveParams {
    /// Full-duty translation speed, units/s.
    #[serde(default = "default_drive_max_speed")]
    pub max_speed: f32,
    /// Full-duty rotation rate, rad/s.
    #[serde(default = "default_drive_max_omega")]
    pub max_omega: f32,
    #[serde(default = "default_drive_deadband")]
    pub deadband: f32,
    /// Operator demand scale (manual driving runs at half speed).
    #[serde(default = "default_drive_scale")]
    pub scale: f32,
    /// Trajectory-tracking proportional gain, translation axes.
    #[serde(default = "default_translation_kp")]
    pub translation_kp: f32,
    /// Trajectory-tracking proportional gain, heading.
    #[serde(default = "default_rotation_kp")]
    pub rotation_kp: f32,
    /// Button held to lock the braking stance.
    #[serde(default = "default_stance_button")]
    pub stance_button: String,
}

impl Default for DriveParams {
    fn default() -> Self {
        Self {
            max_speed: default_drive_max_speed(),
            max_omega: default_drive_max_omega(),
            deadband: default_drive_deadband(),
            scale: default_drive_scale(),
            translation_kp: default_translation_kp(),
            rotation_kp: default_rotation_kp(),
            stance_button: default_stance_button(),
        }
    }
}

/// Elevator tuning, setpoint table, and its operator buttons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevatorParams {
    /// Hard travel range `[0, travel]`, mechanism units.
    #[serde(default = "default_elevator_travel")]
    pub travel: f32,
    /// Full-duty carriage speed, units/s.
    #[serde(default = "default_elevator_max_speed")]
    pub max_speed: f32,
    #[serde(default = "default_elevator_setpoints")]
    pub setpoints: Vec<f32>,
    #[serde(default = "default_elevator_kp")]
    pub kp: f32,
    #[serde(default)]
    pub ki: f32,
    #[serde(default)]
    pub kd: f32,
    /// Tolerance band for a finished setpoint move.
    #[serde(default = "default_elevator_tolerance")]
    pub tolerance: f32,
    /// Consecutive in-band ticks required before a move reports finished.
    #[serde(default = "default_elevator_settle_ticks")]
    pub settle_ticks: u32,
    #[serde(default = "default_elevator_deadband")]
    pub deadband: f32,
    /// Manual jog runs at half power.
    #[serde(default = "default_elevator_jog_scale")]
    pub jog_scale: f32,
    #[serde(default = "default_advance_button")]
    pub advance_button: String,
    #[serde(default = "default_retreat_button")]
    pub retreat_button: String,
    #[serde(default = "default_stop_button")]
    pub stop_button: String,
}

impl Default for ElevatorParams {
    fn default() -> Self {
        Self {
            travel: default_elevator_travel(),
            max_speed: default_elevator_max_speed(),
            setpoints: default_elevator_setpoints(),
            kp: default_elevator_kp(),
            ki: 0.0,
            kd: 0.0,
            tolerance: default_elevator_tolerance(),
            settle_ticks: default_elevator_settle_ticks(),
            deadband: default_elevator_deadband(),
            jog_scale: default_elevator_jog_scale(),
            advance_button: default_advance_button(),
            retreat_button: default_retreat_button(),
            stop_button: default_stop_button(),
        }
    }
}

/// Intake tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeParams {
    #[serde(default = "default_intake_deadband")]
    pub deadband: f32,
}

impl Default for IntakeParams {
    fn default() -> Self {
        Self {
            deadband: default_intake_deadband(),
        }
    }
}

/// Complete robot parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotParams {
    #[serde(default)]
    pub drive: DriveParams,
    #[serde(default)]
    pub elevator: ElevatorParams,
    #[serde(default)]
    pub intake: IntakeParams,
    #[serde(default = "default_setpoint_buttons")]
    pub setpoint_buttons: Vec<SetpointButton>,
}

fn default_drive_max_speed() -> f32 {
    3.0
}
fn default_drive_max_omega() -> f32 {
    2.0
}
fn default_drive_deadband() -> f32 {
    0.1
}
fn default_drive_scale() -> f32 {
    0.5
}
fn default_translation_kp() -> f32 {
    2.0
}
fn default_rotation_kp() -> f32 {
    3.0
}
fn default_stance_button() -> String {
    "lock".to_string()
}
fn default_elevator_travel() -> f32 {
    32.0
}
fn default_elevator_max_speed() -> f32 {
    8.0
}
fn default_elevator_setpoints() -> Vec<f32> {
    vec![0.0, 10.0, 20.0, 30.0]
}
fn default_elevator_kp() -> f32 {
    0.4
}
fn default_elevator_tolerance() -> f32 {
    0.5
}
fn default_elevator_settle_ticks() -> u32 {
    2
}
fn default_elevator_deadband() -> f32 {
    0.1
}
fn default_elevator_jog_scale() -> f32 {
    0.5
}
fn default_advance_button() -> String {
    "rb".to_string()
}
fn default_retreat_button() -> String {
    "lb".to_string()
}
fn default_stop_button() -> String {
    "b".to_string()
}
fn default_intake_deadband() -> f32 {
    0.08
}

fn default_setpoint_buttons() -> Vec<SetpointButton> {
    vec![
        SetpointButton {
            button: "pov_down".to_string(),
            index: 0,
        },
        SetpointButton {
            button: "a".to_string(),
            index: 1,
        },
        SetpointButton {
            button: "x".to_string(),
            index: 2,
        },
        SetpointButton {
            button: "pov_up".to_string(),
            index: 3,
        },
    ]
}

impl Default for RobotParams {
    fn default() -> Self {
        Self {
            drive: DriveParams::default(),
            elevator: ElevatorParams::default(),
            intake: IntakeParams::default(),
            setpoint_buttons: default_setpoint_buttons(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Robot
// ─────────────────────────────────────────────────────────────────────────────

/// The assembled robot: simulated mechanisms, scheduler, routine selector,
/// and telemetry, advanced together by [`Robot::tick`].
pub struct Robot {
    io: ActuatorRegistry,
    scheduler: Scheduler,
    selector: RoutineSelector,
    telemetry: Telemetry,
    cycle: Rc<RefCell<SetpointCycle>>,
    dt: f32,
}

impl Robot {
    /// Build the full robot from a parameter set.
    ///
    /// Every wiring mistake (duplicate mechanism, unknown requirement, bad
    /// setpoint table, degenerate trajectory) is surfaced here as a fatal
    /// error; nothing is deferred to mid-operation.
    pub fn assemble(params: &RobotParams, dt: f32) -> Result<Self, MedullaError> {
        // Mechanisms (simulated rig).
        let mut io = ActuatorRegistry::new();
        io.register(SimDrivetrain::new(
            DRIVETRAIN,
            params.drive.max_speed,
            params.drive.max_omega,
        ))?;
        io.register(SimElevator::new(
            ELEVATOR,
            params.elevator.travel,
            params.elevator.max_speed,
        ))?;
        io.register(SimIntake::new(INTAKE))?;

        let mut scheduler = Scheduler::for_registry(&io);

        // Default commands: one per mechanism, each requiring exactly it.
        scheduler.set_default(
            DRIVETRAIN,
            Box::new(ManualDrive::new(
                DRIVETRAIN.into(),
                AXIS_DRIVE_X,
                AXIS_DRIVE_Y,
                AXIS_TURN,
                params.drive.deadband,
                params.drive.scale,
            )),
        )?;
        scheduler.set_default(
            ELEVATOR,
            Box::new(ManualElevator::new(
                ELEVATOR.into(),
                AXIS_ELEVATOR_JOG,
                params.elevator.deadband,
                params.elevator.jog_scale,
            )),
        )?;
        scheduler.set_default(
            INTAKE,
            Box::new(ManualIntake::new(
                INTAKE.into(),
                AXIS_INTAKE_PRIMARY,
                AXIS_INTAKE_SECONDARY,
                params.intake.deadband,
            )),
        )?;

        // Elevator setpoint machinery.
        let table = SetpointTable::new(params.elevator.setpoints.clone())?;
        let cycle = SetpointCycle::shared(table);
        let gains = PidGains {
            kp: params.elevator.kp,
            ki: params.elevator.ki,
            kd: params.elevator.kd,
            max_output: 1.0,
        };

        let seek_binding = |scheduler: &mut Scheduler,
                                button: &str,
                                name: String,
                                step: SetpointStep|
         -> Result<(), MedullaError> {
            let sequence = Sequential::new(
                name,
                vec![
                    Box::new(SelectSetpoint::new(Rc::clone(&cycle), step)),
                    Box::new(ElevatorToSetpoint::new(
                        ELEVATOR.into(),
                        Rc::clone(&cycle),
                        gains,
                        params.elevator.tolerance,
                        params.elevator.settle_ticks,
                    )),
                ],
            );
            scheduler.bind(
                Trigger::button(button.to_string()),
                BindMode::OnRise,
                Box::new(sequence),
            )
        };

        for binding in &params.setpoint_buttons {
            seek_binding(
                &mut scheduler,
                &binding.button,
                format!("elevator_to_{}", binding.index),
                SetpointStep::Select(binding.index),
            )?;
        }
        seek_binding(
            &mut scheduler,
            &params.elevator.advance_button,
            "elevator_advance".to_string(),
            SetpointStep::Advance,
        )?;
        seek_binding(
            &mut scheduler,
            &params.elevator.retreat_button,
            "elevator_retreat".to_string(),
            SetpointStep::Retreat,
        )?;

        // Stop: de-energise the elevator, interrupting any running move.
        let stop = InstantCommand::new("stop_elevator", |cx: &mut Cycle<'_>| {
            cx.io.apply(&ELEVATOR.into(), Signal::Duty(0.0));
        })
        .with_requirements(vec![ELEVATOR.into()]);
        scheduler.bind(
            Trigger::button(params.elevator.stop_button.clone()),
            BindMode::OnRise,
            Box::new(stop),
        )?;

        // Braking stance while held.
        scheduler.bind(
            Trigger::button(params.drive.stance_button.clone()),
            BindMode::WhileHeld,
            Box::new(HoldStance::new(DRIVETRAIN.into())),
        )?;

        // Autonomous routines.
        let mut selector = RoutineSelector::new();
        let translation = PidGains {
            kp: params.drive.translation_kp,
            ki: 0.0,
            kd: 0.0,
            max_output: 1.0,
        };
        let rotation = PidGains {
            kp: params.drive.rotation_kp,
            ki: 0.0,
            kd: 0.0,
            max_output: 1.0,
        };
        let line = Trajectory::line(Pose::default(), Pose::new(4.0, 0.0, 0.0), 4.0, 40)?;
        selector.add_default(
            "slow_forward_4m",
            Box::new(Sequential::new(
                "slow_forward_4m",
                vec![Box::new(TrackTrajectory::new(
                    DRIVETRAIN.into(),
                    line,
                    translation,
                    rotation,
                ))],
            )),
        );

        // Telemetry: fixed channel list, declared once.
        let telemetry = Telemetry::new()
            .channel("elevator/position", |_, io| match io.sense(&ELEVATOR.into()) {
                Some(Measurement::Linear { position, .. }) => position as f64,
                _ => 0.0,
            })
            .channel("drive/x", |_, io| match io.sense(&DRIVETRAIN.into()) {
                Some(Measurement::Planar { pose, .. }) => pose.x as f64,
                _ => 0.0,
            })
            .channel("drive/y", |_, io| match io.sense(&DRIVETRAIN.into()) {
                Some(Measurement::Planar { pose, .. }) => pose.y as f64,
                _ => 0.0,
            })
            .channel("drive/heading", |_, io| match io.sense(&DRIVETRAIN.into()) {
                Some(Measurement::Planar { pose, .. }) => pose.heading as f64,
                _ => 0.0,
            })
            .channel("scheduler/running", |scheduler, _| {
                scheduler.running().count() as f64
            });

        info!(
            actuators = io.len(),
            routines = selector.labels().count(),
            "robot assembled"
        );

        Ok(Self {
            io,
            scheduler,
            selector,
            telemetry,
            cycle,
            dt,
        })
    }

    /// Advance one fixed-period tick: integrate mechanism models (so this
    /// tick senses the demands applied last tick), run the scheduler, then
    /// publish telemetry.
    pub fn tick(&mut self, controls: &ControlFrame) {
        self.io.tick_all(self.dt);
        self.scheduler.tick(&mut self.io, controls, self.dt);
        self.telemetry.publish(&self.scheduler, &self.io);
    }

    /// Hand the named routine to the scheduler.  The selection is locked in:
    /// the routine is moved out of the selector and later selector changes
    /// cannot touch it.
    pub fn start_autonomous(&mut self, label: &str) -> Result<ActivationId, MedullaError> {
        let routine = self.selector.take(label)?;
        self.scheduler.schedule(routine)
    }

    /// Hand the default routine to the scheduler.
    pub fn start_default_autonomous(&mut self) -> Result<ActivationId, MedullaError> {
        let routine = self.selector.take_default()?;
        self.scheduler.schedule(routine)
    }

    /// `true` while the activation is queued or running.
    pub fn is_active(&self, activation: ActivationId) -> bool {
        self.scheduler.is_active(activation)
    }

    /// Interrupt everything (mode transition / shutdown).
    pub fn cancel_all(&mut self) {
        let controls = ControlFrame::new();
        self.scheduler.cancel_all(&mut self.io, &controls);
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn io(&self) -> &ActuatorRegistry {
        &self.io
    }

    pub fn selector(&self) -> &RoutineSelector {
        &self.selector
    }

    /// Currently selected elevator setpoint index.
    pub fn setpoint_index(&self) -> usize {
        self.cycle.borrow().index()
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
