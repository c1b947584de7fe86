//! `medulla-kernel` – Scheduling & Arbitration
//!
//! The central brainstem of Medulla.  It does not decide *what* the robot
//! should do; it enforces who may drive each mechanism and when, one
//! cooperative tick at a time.
//!
//! # Modules
//!
//! - [`command`] – [`Command`][command::Command]: the atomic unit of
//!   scheduled behavior, with its declared actuator requirements and
//!   start/execute/finish/interrupt lifecycle.
//! - [`group`] – [`Sequential`][group::Sequential],
//!   [`ParallelRace`][group::ParallelRace], [`ParallelAll`][group::ParallelAll]:
//!   combinators that chain or race commands while preserving the
//!   exclusivity contract.
//! - [`scheduler`] – [`Scheduler`][scheduler::Scheduler]: the per-tick run
//!   loop owning the actuator-ownership table and the default-command table.
//! - [`trigger`] – [`Trigger`][trigger::Trigger]: edge/level detection over
//!   operator input, bound to scheduling actions.
//! - [`selector`] – [`RoutineSelector`][selector::RoutineSelector]:
//!   autonomous routine hand-off with lock-in-at-start semantics.

pub mod command;
pub mod group;
pub mod scheduler;
pub mod selector;
pub mod trigger;

pub use command::{Command, Cycle, InstantCommand, RunCommand};
pub use group::{ParallelAll, ParallelRace, Sequential};
pub use scheduler::{ActivationId, Scheduler};
pub use selector::RoutineSelector;
pub use trigger::{BindMode, Trigger};
