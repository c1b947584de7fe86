//! `medulla-runtime` – Robot Behaviors & Assembly
//!
//! The concrete layer above the scheduling kernel: the commands that drive
//! the standard mechanisms, the operator-input conditioning they share, and
//! the [`Robot`][robot::Robot] assembly that wires mechanisms, default
//! commands, trigger bindings, autonomous routines, and telemetry together
//! from a declarative parameter set.
//!
//! # Modules
//!
//! - [`input`] – deadband conditioning for operator axes.
//! - [`drive`] – [`ManualDrive`][drive::ManualDrive],
//!   [`HoldStance`][drive::HoldStance],
//!   [`TrackTrajectory`][drive::TrackTrajectory].
//! - [`elevator`] – setpoint-table state plus the selection, seek, and
//!   manual-jog commands, all under the travel interlock.
//! - [`intake`] – [`ManualIntake`][intake::ManualIntake].
//! - [`robot`] – the assembly and its [`RobotParams`][robot::RobotParams].
//! - [`telemetry`] – statically-declared channels and the per-tick
//!   scheduler snapshot.

pub mod drive;
pub mod elevator;
pub mod input;
pub mod intake;
pub mod robot;
pub mod telemetry;

pub use drive::{HoldStance, ManualDrive, TrackTrajectory};
pub use elevator::{ElevatorToSetpoint, ManualElevator, SelectSetpoint, SetpointCycle, SetpointStep};
pub use intake::ManualIntake;
pub use robot::{Robot, RobotParams};
pub use telemetry::{SchedulerSnapshot, Telemetry};
