//! `medulla-hal` – Actuator Abstraction
//!
//! The hardware boundary of the scheduling core.  Everything above this
//! crate talks to mechanisms through the [`Actuator`][actuator::Actuator]
//! capability contract; everything below it is a driver detail.
//!
//! # Modules
//!
//! - [`actuator`] – [`Actuator`][actuator::Actuator]: apply/sense contract
//!   every mechanism driver implements.
//! - [`registry`] – [`ActuatorRegistry`][registry::ActuatorRegistry]:
//!   id-keyed driver table; the only routing path from commands to hardware.
//! - [`pid`] – [`PositionController`][pid::PositionController]: closed-loop
//!   setpoint tracking with anti-windup and a travel-extreme interlock.
//! - [`sim`] – simulated mechanisms so the full stack runs headless in tests
//!   and demos.

pub mod actuator;
pub mod pid;
pub mod registry;
pub mod sim;

pub use actuator::Actuator;
pub use pid::{travel_interlock, PidGains, PositionController};
pub use registry::ActuatorRegistry;
pub use sim::{SimDrivetrain, SimElevator, SimIntake, SimRig};
