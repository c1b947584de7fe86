//! The `Command` lifecycle contract: the atomic unit of scheduled behavior.
//!
//! A command declares which actuators it needs exclusively and exposes four
//! lifecycle callbacks the [`Scheduler`][crate::scheduler::Scheduler] drives:
//!
//! | Callback       | When                                                     |
//! |----------------|----------------------------------------------------------|
//! | `initialize`   | Once, on the tick the command is activated.              |
//! | `execute`      | Every tick while active, starting on the activation tick.|
//! | `is_finished`  | Polled after each `execute`.                             |
//! | `end`          | Exactly once per activation, normal or interrupted.      |
//!
//! Commands never block: anything that takes time spans multiple ticks via
//! state carried in the command's own fields, with `is_finished` returning
//! `false` until the work is done.  Commands are reusable across
//! activations; `initialize` resets any carried state.

use medulla_hal::ActuatorRegistry;
use medulla_types::{ActuatorId, ControlFrame};

// ─────────────────────────────────────────────────────────────────────────────
// Cycle
// ─────────────────────────────────────────────────────────────────────────────

/// One tick's view of the world, handed to every lifecycle call.
///
/// Commands reach hardware only through `io`; the scheduler's ownership
/// table guarantees that a command only ever drives the actuators it
/// declared, so no further locking exists at this layer.
pub struct Cycle<'a> {
    /// Mutable hardware access for the owning command.
    pub io: &'a mut ActuatorRegistry,
    /// Operator input sampled for this tick (read-only).
    pub controls: &'a ControlFrame,
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Monotonic tick index.
    pub tick: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Command trait
// ─────────────────────────────────────────────────────────────────────────────

/// A schedulable unit of behavior with exclusive actuator requirements.
///
/// The requirement set is fixed for the command's lifetime and must name
/// only actuators known to the scheduler; that is validated once, when the
/// command is registered, and never re-checked mid-operation.
pub trait Command {
    /// Human-readable name used in logs and telemetry.
    fn name(&self) -> &str;

    /// The actuators this command owns exclusively while active.
    fn requirements(&self) -> &[ActuatorId];

    /// One-time setup on the activation tick.
    fn initialize(&mut self, cx: &mut Cycle<'_>) {
        let _ = cx;
    }

    /// Per-tick behavior while active.
    fn execute(&mut self, cx: &mut Cycle<'_>);

    /// Completion predicate, polled after each `execute`.  A command that
    /// never returns `true` runs until it is externally interrupted; the
    /// core deliberately has no timeout.
    fn is_finished(&mut self, cx: &mut Cycle<'_>) -> bool {
        let _ = cx;
        false
    }

    /// Cleanup.  Runs exactly once per activation: with `interrupted` false
    /// when `is_finished` ended the command, true when the scheduler
    /// cancelled it (ownership conflict or external cancel).
    fn end(&mut self, cx: &mut Cycle<'_>, interrupted: bool) {
        let _ = (cx, interrupted);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Function-backed adapters
// ─────────────────────────────────────────────────────────────────────────────

/// A command that runs its action once and finishes on the same tick.
///
/// For behaviors with captured state prefer an explicit struct; this adapter
/// is for simple glue (zeroing a mechanism, bumping an index).
pub struct InstantCommand {
    name: String,
    requirements: Vec<ActuatorId>,
    action: Box<dyn FnMut(&mut Cycle<'_>)>,
}

impl InstantCommand {
    pub fn new(name: impl Into<String>, action: impl FnMut(&mut Cycle<'_>) + 'static) -> Self {
        Self {
            name: name.into(),
            requirements: Vec::new(),
            action: Box::new(action),
        }
    }

    /// Declare the actuators the action drives.
    pub fn with_requirements(mut self, requirements: Vec<ActuatorId>) -> Self {
        self.requirements = requirements;
        self
    }
}

impl Command for InstantCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[ActuatorId] {
        &self.requirements
    }

    fn execute(&mut self, cx: &mut Cycle<'_>) {
        (self.action)(cx);
    }

    fn is_finished(&mut self, _cx: &mut Cycle<'_>) -> bool {
        true
    }
}

/// A command that runs its action every tick until interrupted.
pub struct RunCommand {
    name: String,
    requirements: Vec<ActuatorId>,
    action: Box<dyn FnMut(&mut Cycle<'_>)>,
}

impl RunCommand {
    pub fn new(name: impl Into<String>, action: impl FnMut(&mut Cycle<'_>) + 'static) -> Self {
        Self {
            name: name.into(),
            requirements: Vec::new(),
            action: Box::new(action),
        }
    }

    /// Declare the actuators the action drives.
    pub fn with_requirements(mut self, requirements: Vec<ActuatorId>) -> Self {
        self.requirements = requirements;
        self
    }
}

impl Command for RunCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[ActuatorId] {
        &self.requirements
    }

    fn execute(&mut self, cx: &mut Cycle<'_>) {
        (self.action)(cx);
    }
}
