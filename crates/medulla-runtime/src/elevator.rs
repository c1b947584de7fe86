//! Elevator behaviors: manual jogging under the travel interlock and
//! table-driven closed-loop setpoint moves.
//!
//! The setpoint table index is shared state: the instant selection commands
//! mutate it and the seek command reads it at activation.  The robot
//! assembly owns the [`SetpointCycle`]; commands hold `Rc<RefCell<_>>`
//! handles, which is safe here because the whole control core is
//! single-threaded and every lifecycle call runs synchronously inside the
//! scheduler's tick.

use std::cell::RefCell;
use std::rc::Rc;

use medulla_hal::pid::{travel_interlock, PidGains, PositionController};
use medulla_kernel::command::{Command, Cycle};
use medulla_types::{ActuatorId, Measurement, SetpointTable, Signal};

// ─────────────────────────────────────────────────────────────────────────────
// SetpointCycle
// ─────────────────────────────────────────────────────────────────────────────

/// The elevator's position in its setpoint table: the table itself plus the
/// currently selected index.  Index arithmetic saturates at the table ends.
pub struct SetpointCycle {
    table: SetpointTable,
    index: usize,
}

impl SetpointCycle {
    /// Start at the bottom of the table (index 0).
    pub fn new(table: SetpointTable) -> Self {
        Self { table, index: 0 }
    }

    /// Wrap in the shared handle the selection and seek commands take.
    pub fn shared(table: SetpointTable) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new(table)))
    }

    pub fn select(&mut self, index: usize) {
        self.index = self.table.clamp_index(index);
    }

    pub fn advance(&mut self) {
        self.index = self.table.clamp_index(self.index + 1);
    }

    pub fn retreat(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The currently selected target position.
    pub fn current(&self) -> f32 {
        self.table.level(self.index)
    }

    pub fn top_index(&self) -> usize {
        self.table.top_index()
    }
}

/// How a selection command moves the shared index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetpointStep {
    /// Jump to a specific table index (clamped).
    Select(usize),
    /// One table entry up.
    Advance,
    /// One table entry down.
    Retreat,
}

// ─────────────────────────────────────────────────────────────────────────────
// SelectSetpoint
// ─────────────────────────────────────────────────────────────────────────────

/// Instant command that moves the shared setpoint index.
///
/// Requires no actuators: selection touches bookkeeping only, so it never
/// contends with whatever currently owns the elevator.
pub struct SelectSetpoint {
    name: String,
    cycle: Rc<RefCell<SetpointCycle>>,
    step: SetpointStep,
    requirements: Vec<ActuatorId>,
}

impl SelectSetpoint {
    pub fn new(cycle: Rc<RefCell<SetpointCycle>>, step: SetpointStep) -> Self {
        let name = match step {
            SetpointStep::Select(index) => format!("select_setpoint_{index}"),
            SetpointStep::Advance => "advance_setpoint".to_string(),
            SetpointStep::Retreat => "retreat_setpoint".to_string(),
        };
        Self {
            name,
            cycle,
            step,
            requirements: Vec::new(),
        }
    }
}

impl Command for SelectSetpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[ActuatorId] {
        &self.requirements
    }

    fn execute(&mut self, _cx: &mut Cycle<'_>) {
        let mut cycle = self.cycle.borrow_mut();
        match self.step {
            SetpointStep::Select(index) => cycle.select(index),
            SetpointStep::Advance => cycle.advance(),
            SetpointStep::Retreat => cycle.retreat(),
        }
    }

    fn is_finished(&mut self, _cx: &mut Cycle<'_>) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ElevatorToSetpoint
// ─────────────────────────────────────────────────────────────────────────────

/// Closed-loop move to the currently selected setpoint.
///
/// Reads the shared cycle once at activation, then runs the position
/// controller every tick with the travel interlock layered on top of the
/// computed output.  Finishes once the controller has settled inside its
/// tolerance band and leaves the elevator de-energised.
pub struct ElevatorToSetpoint {
    requirements: Vec<ActuatorId>,
    cycle: Rc<RefCell<SetpointCycle>>,
    controller: PositionController,
}

impl ElevatorToSetpoint {
    pub fn new(
        elevator: ActuatorId,
        cycle: Rc<RefCell<SetpointCycle>>,
        gains: PidGains,
        tolerance: f32,
        settle_ticks: u32,
    ) -> Self {
        Self {
            requirements: vec![elevator],
            cycle,
            controller: PositionController::new(gains, tolerance, settle_ticks),
        }
    }

    /// The target latched at the last activation.
    pub fn target(&self) -> f32 {
        self.controller.target()
    }
}

impl Command for ElevatorToSetpoint {
    fn name(&self) -> &str {
        "elevator_to_setpoint"
    }

    fn requirements(&self) -> &[ActuatorId] {
        &self.requirements
    }

    fn initialize(&mut self, _cx: &mut Cycle<'_>) {
        // Re-enabling the loop: integral and settle state must not carry
        // over from a previous activation.
        self.controller.reset();
        self.controller.set_target(self.cycle.borrow().current());
    }

    fn execute(&mut self, cx: &mut Cycle<'_>) {
        let Some(Measurement::Linear {
            position,
            at_lower,
            at_upper,
            ..
        }) = cx.io.sense(&self.requirements[0])
        else {
            return;
        };
        let output = self.controller.update(position, cx.dt);
        let output = travel_interlock(output, at_lower, at_upper);
        cx.io.apply(&self.requirements[0], Signal::Duty(output));
    }

    fn is_finished(&mut self, _cx: &mut Cycle<'_>) -> bool {
        self.controller.at_target()
    }

    fn end(&mut self, cx: &mut Cycle<'_>, _interrupted: bool) {
        cx.io.apply(&self.requirements[0], Signal::Duty(0.0));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ManualElevator
// ─────────────────────────────────────────────────────────────────────────────

/// Default elevator command: operator jog with the travel interlock.
///
/// Power toward an engaged limit is zeroed; power away from it passes
/// through, so the operator can always back off an extreme.
pub struct ManualElevator {
    requirements: Vec<ActuatorId>,
    axis: String,
    deadband: f32,
    scale: f32,
}

impl ManualElevator {
    pub fn new(elevator: ActuatorId, axis: impl Into<String>, deadband: f32, scale: f32) -> Self {
        Self {
            requirements: vec![elevator],
            axis: axis.into(),
            deadband,
            scale,
        }
    }
}

impl Command for ManualElevator {
    fn name(&self) -> &str {
        "manual_elevator"
    }

    fn requirements(&self) -> &[ActuatorId] {
        &self.requirements
    }

    fn execute(&mut self, cx: &mut Cycle<'_>) {
        let Some(Measurement::Linear {
            at_lower, at_upper, ..
        }) = cx.io.sense(&self.requirements[0])
        else {
            return;
        };
        let power =
            crate::input::apply_deadband(cx.controls.axis(&self.axis), self.deadband) * self.scale;
        let power = travel_interlock(power, at_lower, at_upper);
        cx.io.apply(&self.requirements[0], Signal::Duty(power));
    }

    fn end(&mut self, cx: &mut Cycle<'_>, _interrupted: bool) {
        cx.io.apply(&self.requirements[0], Signal::Duty(0.0));
    }
}
