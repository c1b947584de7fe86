//! [`Scheduler`] – the authoritative per-tick run loop.
//!
//! The scheduler owns three things: the set of known actuators, the
//! ownership table mapping each actuator to the activation currently driving
//! it, and the running set of active commands.  All three are mutated only
//! inside [`Scheduler::tick`], so exclusivity needs no locks: there is
//! exactly one code path that assigns ownership.
//!
//! # Tick algorithm
//!
//! 1. Poll every trigger binding.  Rising edges produce schedule requests;
//!    falling edges on while-held bindings cancel their command immediately
//!    (cleanup runs inside the same tick).
//! 2. Start requested commands in declared priority order: ad-hoc hand-offs
//!    and trigger bindings (explicit) before default commands.  Every
//!    current owner of a required actuator is interrupted, and its cleanup
//!    completes, before the new command's first tick.
//! 3. Advance every active command: `initialize` on its first tick, then
//!    `execute`, then poll `is_finished` and end normal completions.
//! 4. Queue the registered default of every ownerless actuator to start on
//!    the following tick.
//!
//! At the end of every tick each actuator has at most one owner and every
//! defaulted actuator has either a foreground owner or its default
//! pending/active; both are `debug_assert`-checked.
//!
//! Commands with overlapping requirements requested on the *same* tick by
//! two explicit sources are an ordering bug in the robot wiring, not a
//! situation the scheduler resolves silently: the earlier request wins and
//! the conflict is logged at error level and surfaced via `debug_assert`.

use std::collections::HashMap;

use medulla_hal::ActuatorRegistry;
use medulla_types::{ActuatorId, ControlFrame, MedullaError};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::command::{Command, Cycle};
use crate::trigger::{BindMode, Edge, Trigger};

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers and bookkeeping
// ─────────────────────────────────────────────────────────────────────────────

/// Handle identifying one activation of a command.
///
/// A command instance can be activated many times; each activation gets a
/// fresh id so logs and callers can correlate start and end events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivationId(Uuid);

impl ActivationId {
    fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ActivationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Where an idle command instance lives while it is not running.
///
/// Bindings and the default table own their command instances and lend them
/// to the running set; a slot is empty exactly while its command runs, which
/// is also what makes double-scheduling structurally impossible.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Home {
    Binding(usize),
    Default(ActuatorId),
    /// Ad-hoc commands (autonomous hand-offs) are dropped when they end.
    Adhoc,
}

struct Binding {
    trigger: Trigger,
    mode: BindMode,
    slot: Option<Box<dyn Command>>,
}

struct Active {
    activation: ActivationId,
    home: Home,
    command: Box<dyn Command>,
    ticks: u32,
    initialized: bool,
}

struct Request {
    activation: ActivationId,
    home: Home,
    command: Box<dyn Command>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler
// ─────────────────────────────────────────────────────────────────────────────

/// The central command arbiter.
///
/// Constructed explicitly once at startup and passed by reference; there is
/// no hidden global instance.
#[derive(Default)]
pub struct Scheduler {
    known: Vec<ActuatorId>,
    ownership: HashMap<ActuatorId, ActivationId>,
    running: Vec<Active>,
    bindings: Vec<Binding>,
    defaults: Vec<(ActuatorId, Option<Box<dyn Command>>)>,
    pending_defaults: Vec<ActuatorId>,
    pending_adhoc: Vec<(ActivationId, Box<dyn Command>)>,
    tick: u64,
}

impl Scheduler {
    /// Create a scheduler that knows no actuators yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler that knows every actuator in `registry`.
    pub fn for_registry(registry: &ActuatorRegistry) -> Self {
        let mut scheduler = Self::new();
        for id in registry.ids() {
            scheduler.known.push(id.clone());
        }
        scheduler
    }

    // ── Registration ─────────────────────────────────────────────────────────

    /// Make `id` known to the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`MedullaError::DuplicateActuator`] when `id` is already
    /// known.
    pub fn register_actuator(&mut self, id: impl Into<ActuatorId>) -> Result<(), MedullaError> {
        let id = id.into();
        if self.known.contains(&id) {
            return Err(MedullaError::DuplicateActuator(id));
        }
        self.known.push(id);
        Ok(())
    }

    /// Register the default command for `actuator`.
    ///
    /// The default starts on the next tick and is rescheduled automatically
    /// whenever the actuator has no foreground owner.
    ///
    /// # Errors
    ///
    /// - [`MedullaError::UnknownActuator`] when `actuator` is not known.
    /// - [`MedullaError::DefaultRequirements`] when the command's requirement
    ///   set is not exactly `{actuator}`: a default must never contend for
    ///   anything beyond the mechanism it idles.
    /// - [`MedullaError::Config`] when a default is already registered.
    pub fn set_default(
        &mut self,
        actuator: impl Into<ActuatorId>,
        command: Box<dyn Command>,
    ) -> Result<(), MedullaError> {
        let actuator = actuator.into();
        if !self.known.contains(&actuator) {
            return Err(MedullaError::UnknownActuator {
                command: command.name().to_string(),
                actuator,
            });
        }
        if command.requirements().len() != 1 || command.requirements()[0] != actuator {
            return Err(MedullaError::DefaultRequirements {
                command: command.name().to_string(),
                actuator,
            });
        }
        if self.defaults.iter().any(|(id, _)| *id == actuator) {
            return Err(MedullaError::Config(format!(
                "default command for '{actuator}' is already set"
            )));
        }
        debug!(actuator = %actuator, command = command.name(), "default command registered");
        self.pending_defaults.push(actuator.clone());
        self.defaults.push((actuator, Some(command)));
        Ok(())
    }

    /// Bind a trigger to a command.  The binding owns the command instance;
    /// repeated firings re-activate the same instance.
    ///
    /// # Errors
    ///
    /// Returns [`MedullaError::UnknownActuator`] when the command requires an
    /// actuator the scheduler does not know.
    pub fn bind(
        &mut self,
        trigger: Trigger,
        mode: BindMode,
        command: Box<dyn Command>,
    ) -> Result<(), MedullaError> {
        self.validate_requirements(command.as_ref())?;
        debug!(command = command.name(), ?mode, "trigger bound");
        self.bindings.push(Binding {
            trigger,
            mode,
            slot: Some(command),
        });
        Ok(())
    }

    /// Queue a one-shot command (e.g. an autonomous routine hand-off) to
    /// start on the next tick, ahead of trigger requests.  The command is
    /// dropped when it ends.
    ///
    /// # Errors
    ///
    /// Returns [`MedullaError::UnknownActuator`] when the command requires an
    /// actuator the scheduler does not know.
    pub fn schedule(&mut self, command: Box<dyn Command>) -> Result<ActivationId, MedullaError> {
        self.validate_requirements(command.as_ref())?;
        let activation = ActivationId::fresh();
        info!(command = command.name(), %activation, "ad-hoc command queued");
        self.pending_adhoc.push((activation, command));
        Ok(activation)
    }

    fn validate_requirements(&self, command: &dyn Command) -> Result<(), MedullaError> {
        for req in command.requirements() {
            if !self.known.contains(req) {
                return Err(MedullaError::UnknownActuator {
                    command: command.name().to_string(),
                    actuator: req.clone(),
                });
            }
        }
        Ok(())
    }

    // ── Cancellation ─────────────────────────────────────────────────────────

    /// Cancel one activation.  If it is running its cleanup runs now with
    /// the interrupted flag; if it is still queued it is silently dropped.
    pub fn cancel(
        &mut self,
        activation: ActivationId,
        io: &mut ActuatorRegistry,
        controls: &ControlFrame,
    ) {
        if let Some(pos) = self
            .running
            .iter()
            .position(|active| active.activation == activation)
        {
            self.finish_at(pos, io, controls, 0.0, true);
            self.queue_idle_defaults();
        } else {
            self.pending_adhoc.retain(|(id, _)| *id != activation);
        }
    }

    /// Interrupt every running command and drop everything queued.  Used on
    /// mode transitions and shutdown.
    pub fn cancel_all(&mut self, io: &mut ActuatorRegistry, controls: &ControlFrame) {
        while !self.running.is_empty() {
            self.finish_at(0, io, controls, 0.0, true);
        }
        self.pending_adhoc.clear();
        self.queue_idle_defaults();
    }

    // ── Tick ─────────────────────────────────────────────────────────────────

    /// Run one scheduler tick.  See the module documentation for the exact
    /// step order.
    pub fn tick(&mut self, io: &mut ActuatorRegistry, controls: &ControlFrame, dt: f32) {
        // 1. Poll triggers.  Sampling is done in one pass so every binding
        //    sees this tick's frame exactly once.
        let edges: Vec<(usize, Edge)> = self
            .bindings
            .iter_mut()
            .enumerate()
            .map(|(index, binding)| (index, binding.trigger.sample(controls)))
            .collect();

        let mut requests: Vec<Request> = Vec::new();
        for (activation, command) in std::mem::take(&mut self.pending_adhoc) {
            requests.push(Request {
                activation,
                home: Home::Adhoc,
                command,
            });
        }
        for (index, edge) in edges {
            match edge {
                Edge::Rising => {
                    // An empty slot means the command is already running;
                    // a repeated rising edge is then a no-op.
                    if let Some(command) = self.bindings[index].slot.take() {
                        requests.push(Request {
                            activation: ActivationId::fresh(),
                            home: Home::Binding(index),
                            command,
                        });
                    }
                }
                Edge::Falling if self.bindings[index].mode == BindMode::WhileHeld => {
                    if let Some(pos) = self
                        .running
                        .iter()
                        .position(|active| active.home == Home::Binding(index))
                    {
                        self.finish_at(pos, io, controls, dt, true);
                    }
                }
                _ => {}
            }
        }

        // 2. Start explicit requests in declared priority order.
        let mut claimed: HashMap<ActuatorId, String> = HashMap::new();
        for request in requests {
            let conflict = request
                .command
                .requirements()
                .iter()
                .find_map(|req| claimed.get(req).map(|first| (first.clone(), req.clone())));
            if let Some((first, actuator)) = conflict {
                error!(
                    first = %first,
                    second = request.command.name(),
                    actuator = %actuator,
                    "same-tick scheduling conflict; earlier request wins"
                );
                debug_assert!(false, "same-tick scheduling conflict on '{actuator}'");
                self.return_home(request.home, request.command);
                continue;
            }
            for req in request.command.requirements() {
                claimed.insert(req.clone(), request.command.name().to_string());
            }
            self.start(request, io, controls, dt);
        }

        // Defaults queued at the end of the previous tick; an actuator that
        // was claimed by an explicit request this tick no longer qualifies.
        for actuator in std::mem::take(&mut self.pending_defaults) {
            if self.ownership.contains_key(&actuator) {
                continue;
            }
            let command = self
                .defaults
                .iter_mut()
                .find(|(id, _)| *id == actuator)
                .and_then(|(_, slot)| slot.take());
            let Some(command) = command else { continue };
            self.start(
                Request {
                    activation: ActivationId::fresh(),
                    home: Home::Default(actuator),
                    command,
                },
                io,
                controls,
                dt,
            );
        }

        // 3. Advance every active command.
        let mut index = 0;
        while index < self.running.len() {
            let (ticks, finished) = {
                let active = &mut self.running[index];
                let mut cx = Cycle {
                    io: &mut *io,
                    controls,
                    dt,
                    tick: self.tick,
                };
                if !active.initialized {
                    active.command.initialize(&mut cx);
                    active.initialized = true;
                }
                active.command.execute(&mut cx);
                active.ticks += 1;
                (active.ticks, active.command.is_finished(&mut cx))
            };
            let tap_done = match &self.running[index].home {
                Home::Binding(binding) => {
                    self.bindings[*binding].mode == BindMode::Tap && ticks >= 1
                }
                _ => false,
            };
            if finished || tap_done {
                self.finish_at(index, io, controls, dt, false);
            } else {
                index += 1;
            }
        }

        // 4. Queue defaults for ownerless actuators; they start next tick.
        self.queue_idle_defaults();

        #[cfg(debug_assertions)]
        self.check_invariants();

        self.tick += 1;
    }

    /// Start one accepted request, interrupting every current owner of a
    /// required actuator first so their cleanup completes before the new
    /// command's first tick.
    fn start(
        &mut self,
        request: Request,
        io: &mut ActuatorRegistry,
        controls: &ControlFrame,
        dt: f32,
    ) {
        loop {
            let owner = request
                .command
                .requirements()
                .iter()
                .find_map(|req| self.ownership.get(req).copied());
            let Some(activation) = owner else { break };
            match self
                .running
                .iter()
                .position(|active| active.activation == activation)
            {
                Some(pos) => self.finish_at(pos, io, controls, dt, true),
                // Ownership entries always point at a running activation;
                // clear a stale one rather than spinning.
                None => self.ownership.retain(|_, o| *o != activation),
            }
        }
        info!(
            command = request.command.name(),
            activation = %request.activation,
            "command started"
        );
        for req in request.command.requirements() {
            self.ownership.insert(req.clone(), request.activation);
        }
        self.running.push(Active {
            activation: request.activation,
            home: request.home,
            command: request.command,
            ticks: 0,
            initialized: false,
        });
    }

    /// End the running command at `pos`: cleanup, ownership release, and
    /// return of the instance to its home slot.
    fn finish_at(
        &mut self,
        pos: usize,
        io: &mut ActuatorRegistry,
        controls: &ControlFrame,
        dt: f32,
        interrupted: bool,
    ) {
        let mut active = self.running.remove(pos);
        if active.initialized {
            let mut cx = Cycle {
                io,
                controls,
                dt,
                tick: self.tick,
            };
            active.command.end(&mut cx, interrupted);
        }
        self.ownership.retain(|_, owner| *owner != active.activation);
        info!(
            command = active.command.name(),
            activation = %active.activation,
            interrupted,
            "command ended"
        );
        self.return_home(active.home, active.command);
    }

    /// Rebuild the pending-default queue: every defaulted actuator without a
    /// foreground owner (and whose default is not already running) starts
    /// its default on the next tick.
    fn queue_idle_defaults(&mut self) {
        self.pending_defaults.clear();
        for (actuator, slot) in &self.defaults {
            if slot.is_some() && !self.ownership.contains_key(actuator) {
                self.pending_defaults.push(actuator.clone());
            }
        }
    }

    fn return_home(&mut self, home: Home, command: Box<dyn Command>) {
        match home {
            Home::Binding(index) => self.bindings[index].slot = Some(command),
            Home::Default(actuator) => {
                if let Some((_, slot)) = self.defaults.iter_mut().find(|(id, _)| *id == actuator) {
                    *slot = Some(command);
                }
            }
            Home::Adhoc => {}
        }
    }

    #[cfg(debug_assertions)]
    fn check_invariants(&self) {
        for (actuator, activation) in &self.ownership {
            debug_assert!(
                self.running.iter().any(|a| a.activation == *activation),
                "actuator '{actuator}' is owned by an activation that is not running"
            );
        }
        for active in &self.running {
            for req in active.command.requirements() {
                debug_assert!(
                    self.ownership.get(req) == Some(&active.activation),
                    "running command '{}' does not own its requirement '{req}'",
                    active.command.name()
                );
            }
        }
        for (actuator, slot) in &self.defaults {
            debug_assert!(
                slot.is_none()
                    || self.ownership.contains_key(actuator)
                    || self.pending_defaults.contains(actuator),
                "actuator '{actuator}' has neither a foreground owner nor a pending default"
            );
        }
    }

    // ── Introspection (read-only; telemetry must never perturb the core) ─────

    /// The name of the command currently owning `actuator`, if any.
    pub fn owner_of(&self, actuator: &ActuatorId) -> Option<&str> {
        let activation = self.ownership.get(actuator)?;
        self.running
            .iter()
            .find(|active| active.activation == *activation)
            .map(|active| active.command.name())
    }

    /// Names of every running command, in scheduling order.
    pub fn running(&self) -> impl Iterator<Item = &str> {
        self.running.iter().map(|active| active.command.name())
    }

    /// (actuator, owning command name) pairs for every owned actuator.
    pub fn owned(&self) -> impl Iterator<Item = (&ActuatorId, &str)> {
        self.ownership.keys().filter_map(|actuator| {
            self.owner_of(actuator).map(|name| (actuator, name))
        })
    }

    /// `true` while the activation is running or still queued.
    pub fn is_active(&self, activation: ActivationId) -> bool {
        self.running
            .iter()
            .any(|active| active.activation == activation)
            || self.pending_adhoc.iter().any(|(id, _)| *id == activation)
    }

    /// Monotonic tick counter (number of completed ticks).
    pub fn tick_index(&self) -> u64 {
        self.tick
    }

    /// Every actuator the scheduler knows, in registration order.
    pub fn known_actuators(&self) -> impl Iterator<Item = &ActuatorId> {
        self.known.iter()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Scripted command journaling every lifecycle event, shared between the
    /// test body and the scheduler-owned instance.
    struct Scripted {
        name: String,
        requirements: Vec<ActuatorId>,
        finish_after: Option<u32>,
        executed: u32,
        journal: Rc<RefCell<Vec<String>>>,
    }

    impl Scripted {
        fn boxed(
            name: &str,
            requirements: &[&str],
            finish_after: Option<u32>,
            journal: &Rc<RefCell<Vec<String>>>,
        ) -> Box<Self> {
            Box::new(Self {
                name: name.to_string(),
                requirements: requirements.iter().map(|r| ActuatorId::from(*r)).collect(),
                finish_after,
                executed: 0,
                journal: Rc::clone(journal),
            })
        }

        fn log(&self, event: &str) {
            self.journal
                .borrow_mut()
                .push(format!("{}:{event}", self.name));
        }
    }

    impl Command for Scripted {
        fn name(&self) -> &str {
            &self.name
        }

        fn requirements(&self) -> &[ActuatorId] {
            &self.requirements
        }

        fn initialize(&mut self, _cx: &mut Cycle<'_>) {
            self.executed = 0;
            self.log("init");
        }

        fn execute(&mut self, _cx: &mut Cycle<'_>) {
            self.executed += 1;
            self.log("exec");
        }

        fn is_finished(&mut self, _cx: &mut Cycle<'_>) -> bool {
            self.finish_after.is_some_and(|n| self.executed >= n)
        }

        fn end(&mut self, _cx: &mut Cycle<'_>, interrupted: bool) {
            self.log(if interrupted { "interrupted" } else { "done" });
        }
    }

    struct Rig {
        scheduler: Scheduler,
        io: ActuatorRegistry,
        journal: Rc<RefCell<Vec<String>>>,
    }

    impl Rig {
        fn new(actuators: &[&str]) -> Self {
            let mut scheduler = Scheduler::new();
            for id in actuators {
                scheduler.register_actuator(*id).unwrap();
            }
            Self {
                scheduler,
                io: ActuatorRegistry::new(),
                journal: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn tick(&mut self, controls: &ControlFrame) {
            self.scheduler.tick(&mut self.io, controls, 0.02);
        }

        fn tick_idle(&mut self) {
            self.tick(&ControlFrame::new());
        }

        fn events(&self) -> Vec<String> {
            self.journal.borrow().clone()
        }

        fn count(&self, event: &str) -> usize {
            self.journal.borrow().iter().filter(|e| *e == event).count()
        }
    }

    // ── Registration errors ──────────────────────────────────────────────────

    #[test]
    fn duplicate_actuator_registration_is_fatal() {
        let mut scheduler = Scheduler::new();
        scheduler.register_actuator("drivetrain").unwrap();
        assert!(matches!(
            scheduler.register_actuator("drivetrain"),
            Err(MedullaError::DuplicateActuator(_))
        ));
    }

    #[test]
    fn unknown_requirement_is_fatal_at_bind_time() {
        let mut rig = Rig::new(&["drivetrain"]);
        let cmd = Scripted::boxed("ghost", &["winch"], None, &rig.journal);
        let result = rig
            .scheduler
            .bind(Trigger::button("a"), BindMode::OnRise, cmd);
        assert!(matches!(result, Err(MedullaError::UnknownActuator { .. })));
    }

    #[test]
    fn unknown_requirement_is_fatal_at_schedule_time() {
        let mut rig = Rig::new(&["drivetrain"]);
        let cmd = Scripted::boxed("ghost", &["winch"], None, &rig.journal);
        assert!(matches!(
            rig.scheduler.schedule(cmd),
            Err(MedullaError::UnknownActuator { .. })
        ));
    }

    #[test]
    fn default_must_require_exactly_its_actuator() {
        let mut rig = Rig::new(&["drivetrain", "elevator"]);

        let greedy = Scripted::boxed("greedy", &["drivetrain", "elevator"], None, &rig.journal);
        assert!(matches!(
            rig.scheduler.set_default("drivetrain", greedy),
            Err(MedullaError::DefaultRequirements { .. })
        ));

        let empty = Scripted::boxed("empty", &[], None, &rig.journal);
        assert!(matches!(
            rig.scheduler.set_default("drivetrain", empty),
            Err(MedullaError::DefaultRequirements { .. })
        ));
    }

    #[test]
    fn second_default_for_an_actuator_is_rejected() {
        let mut rig = Rig::new(&["intake"]);
        let first = Scripted::boxed("idle", &["intake"], None, &rig.journal);
        let second = Scripted::boxed("idle2", &["intake"], None, &rig.journal);
        rig.scheduler.set_default("intake", first).unwrap();
        assert!(matches!(
            rig.scheduler.set_default("intake", second),
            Err(MedullaError::Config(_))
        ));
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    #[test]
    fn scheduled_command_initializes_and_executes_on_the_same_tick() {
        let mut rig = Rig::new(&["drivetrain"]);
        let cmd = Scripted::boxed("move", &["drivetrain"], Some(2), &rig.journal);
        rig.scheduler.schedule(cmd).unwrap();

        rig.tick_idle();
        assert_eq!(rig.events(), vec!["move:init", "move:exec"]);

        rig.tick_idle();
        assert_eq!(
            rig.events(),
            vec!["move:init", "move:exec", "move:exec", "move:done"]
        );
        assert_eq!(rig.scheduler.owner_of(&"drivetrain".into()), None);
    }

    #[test]
    fn cleanup_runs_exactly_once_per_activation() {
        let mut rig = Rig::new(&["drivetrain"]);
        let cmd = Scripted::boxed("move", &["drivetrain"], Some(1), &rig.journal);
        rig.scheduler.schedule(cmd).unwrap();
        for _ in 0..5 {
            rig.tick_idle();
        }
        assert_eq!(rig.count("move:done"), 1);
        assert_eq!(rig.count("move:interrupted"), 0);
    }

    #[test]
    fn conflicting_command_interrupts_the_owner_before_starting() {
        let mut rig = Rig::new(&["drivetrain"]);
        let hold = Scripted::boxed("hold", &["drivetrain"], None, &rig.journal);
        rig.scheduler.schedule(hold).unwrap();
        rig.tick_idle();

        let take = Scripted::boxed("take", &["drivetrain"], None, &rig.journal);
        rig.scheduler.schedule(take).unwrap();
        rig.tick_idle();

        // The owner's cleanup runs before the new command's first tick.
        assert_eq!(
            rig.events(),
            vec![
                "hold:init",
                "hold:exec",
                "hold:interrupted",
                "take:init",
                "take:exec",
            ]
        );
        assert_eq!(rig.scheduler.owner_of(&"drivetrain".into()), Some("take"));
    }

    #[test]
    fn interrupting_a_two_actuator_command_frees_both() {
        let mut rig = Rig::new(&["drivetrain", "elevator"]);
        let both = Scripted::boxed("both", &["drivetrain", "elevator"], None, &rig.journal);
        rig.scheduler.schedule(both).unwrap();
        rig.tick_idle();

        let drive = Scripted::boxed("drive", &["drivetrain"], None, &rig.journal);
        rig.scheduler.schedule(drive).unwrap();
        rig.tick_idle();

        assert_eq!(rig.count("both:interrupted"), 1);
        assert_eq!(rig.scheduler.owner_of(&"drivetrain".into()), Some("drive"));
        assert_eq!(rig.scheduler.owner_of(&"elevator".into()), None);
    }

    #[test]
    fn commands_without_requirements_coexist() {
        let mut rig = Rig::new(&["drivetrain"]);
        let a = Scripted::boxed("a", &[], None, &rig.journal);
        let b = Scripted::boxed("b", &[], None, &rig.journal);
        rig.scheduler.schedule(a).unwrap();
        rig.scheduler.schedule(b).unwrap();
        rig.tick_idle();
        assert_eq!(rig.scheduler.running().count(), 2);
    }

    // ── Defaults ─────────────────────────────────────────────────────────────

    #[test]
    fn default_starts_on_the_first_tick_after_registration() {
        let mut rig = Rig::new(&["intake"]);
        let idle = Scripted::boxed("idle", &["intake"], None, &rig.journal);
        rig.scheduler.set_default("intake", idle).unwrap();

        rig.tick_idle();
        assert_eq!(rig.scheduler.owner_of(&"intake".into()), Some("idle"));
    }

    #[test]
    fn default_resumes_on_the_tick_after_the_foreground_ends() {
        let mut rig = Rig::new(&["intake"]);
        let idle = Scripted::boxed("idle", &["intake"], None, &rig.journal);
        rig.scheduler.set_default("intake", idle).unwrap();
        rig.tick_idle();

        // Foreground command takes over, interrupting the default.
        let feed = Scripted::boxed("feed", &["intake"], Some(2), &rig.journal);
        rig.scheduler.schedule(feed).unwrap();
        rig.tick_idle();
        assert_eq!(rig.count("idle:interrupted"), 1);
        assert_eq!(rig.scheduler.owner_of(&"intake".into()), Some("feed"));

        // Foreground finishes on this tick (tick N) …
        rig.tick_idle();
        assert_eq!(rig.count("feed:done"), 1);

        // … and the default is active again on tick N+1.
        rig.tick_idle();
        assert_eq!(rig.scheduler.owner_of(&"intake".into()), Some("idle"));
        assert_eq!(rig.count("idle:init"), 2);
    }

    #[test]
    fn exclusivity_holds_at_the_end_of_every_tick() {
        // Churn foreground commands over a defaulted actuator and let the
        // debug_assert invariants in tick() do the checking.
        let mut rig = Rig::new(&["drivetrain", "elevator"]);
        let idle = Scripted::boxed("idle", &["drivetrain"], None, &rig.journal);
        rig.scheduler.set_default("drivetrain", idle).unwrap();

        for round in 0..10 {
            let cmd = Scripted::boxed(
                &format!("c{round}"),
                &["drivetrain"],
                Some(1 + round % 3),
                &rig.journal,
            );
            rig.scheduler.schedule(cmd).unwrap();
            for _ in 0..4 {
                rig.tick_idle();
            }
            assert!(rig.scheduler.owner_of(&"drivetrain".into()).is_some());
        }
    }

    // ── Triggers ─────────────────────────────────────────────────────────────

    #[test]
    fn on_rise_schedules_once_per_press() {
        let mut rig = Rig::new(&["elevator"]);
        let cmd = Scripted::boxed("lift", &["elevator"], Some(1), &rig.journal);
        rig.scheduler
            .bind(Trigger::button("a"), BindMode::OnRise, cmd)
            .unwrap();

        let held = ControlFrame::new().with_button("a", true);
        rig.tick(&held);
        rig.tick(&held);
        rig.tick(&held);
        // Held, not re-pressed: one activation only.
        assert_eq!(rig.count("lift:init"), 1);

        rig.tick_idle();
        rig.tick(&held);
        assert_eq!(rig.count("lift:init"), 2);
    }

    #[test]
    fn while_held_cancels_on_release_within_the_same_tick() {
        let mut rig = Rig::new(&["drivetrain"]);
        let cmd = Scripted::boxed("stance", &["drivetrain"], None, &rig.journal);
        rig.scheduler
            .bind(Trigger::button("x"), BindMode::WhileHeld, cmd)
            .unwrap();

        let held = ControlFrame::new().with_button("x", true);
        rig.tick(&held);
        rig.tick(&held);
        assert_eq!(rig.scheduler.owner_of(&"drivetrain".into()), Some("stance"));

        rig.tick_idle();
        assert_eq!(rig.count("stance:interrupted"), 1);
        assert_eq!(rig.scheduler.owner_of(&"drivetrain".into()), None);
    }

    #[test]
    fn released_while_held_frees_the_actuator_for_the_default() {
        let mut rig = Rig::new(&["drivetrain"]);
        let idle = Scripted::boxed("idle", &["drivetrain"], None, &rig.journal);
        rig.scheduler.set_default("drivetrain", idle).unwrap();
        let cmd = Scripted::boxed("stance", &["drivetrain"], None, &rig.journal);
        rig.scheduler
            .bind(Trigger::button("x"), BindMode::WhileHeld, cmd)
            .unwrap();

        rig.tick_idle(); // default active
        let held = ControlFrame::new().with_button("x", true);
        rig.tick(&held); // stance takes over
        assert_eq!(rig.scheduler.owner_of(&"drivetrain".into()), Some("stance"));
        rig.tick_idle(); // release: stance interrupted, default queued
        rig.tick_idle(); // default active again
        assert_eq!(rig.scheduler.owner_of(&"drivetrain".into()), Some("idle"));
    }

    #[test]
    fn tap_ends_normally_after_one_tick() {
        let mut rig = Rig::new(&["drivetrain"]);
        let cmd = Scripted::boxed("zero", &["drivetrain"], None, &rig.journal);
        rig.scheduler
            .bind(Trigger::button("start"), BindMode::Tap, cmd)
            .unwrap();

        let held = ControlFrame::new().with_button("start", true);
        rig.tick(&held);
        rig.tick(&held);
        assert_eq!(rig.count("zero:exec"), 1);
        assert_eq!(rig.count("zero:done"), 1);
        assert_eq!(rig.count("zero:interrupted"), 0);
    }

    #[test]
    #[should_panic(expected = "same-tick scheduling conflict")]
    fn same_tick_explicit_conflict_is_surfaced() {
        let mut rig = Rig::new(&["drivetrain"]);
        let a = Scripted::boxed("a", &["drivetrain"], None, &rig.journal);
        let b = Scripted::boxed("b", &["drivetrain"], None, &rig.journal);
        rig.scheduler
            .bind(Trigger::button("k"), BindMode::OnRise, a)
            .unwrap();
        rig.scheduler
            .bind(Trigger::button("k"), BindMode::OnRise, b)
            .unwrap();

        rig.tick(&ControlFrame::new().with_button("k", true));
    }

    // ── Cancellation ─────────────────────────────────────────────────────────

    #[test]
    fn cancel_interrupts_a_running_activation() {
        let mut rig = Rig::new(&["drivetrain"]);
        let cmd = Scripted::boxed("hold", &["drivetrain"], None, &rig.journal);
        let activation = rig.scheduler.schedule(cmd).unwrap();
        rig.tick_idle();
        assert!(rig.scheduler.is_active(activation));

        let controls = ControlFrame::new();
        rig.scheduler.cancel(activation, &mut rig.io, &controls);
        assert!(!rig.scheduler.is_active(activation));
        assert_eq!(rig.count("hold:interrupted"), 1);
    }

    #[test]
    fn cancel_all_interrupts_everything() {
        let mut rig = Rig::new(&["drivetrain", "elevator"]);
        let a = Scripted::boxed("a", &["drivetrain"], None, &rig.journal);
        let b = Scripted::boxed("b", &["elevator"], None, &rig.journal);
        rig.scheduler.schedule(a).unwrap();
        rig.scheduler.schedule(b).unwrap();
        rig.tick_idle();

        let controls = ControlFrame::new();
        rig.scheduler.cancel_all(&mut rig.io, &controls);
        assert_eq!(rig.count("a:interrupted"), 1);
        assert_eq!(rig.count("b:interrupted"), 1);
        assert_eq!(rig.scheduler.running().count(), 0);
    }

    #[test]
    fn tick_index_advances_once_per_tick() {
        let mut rig = Rig::new(&[]);
        assert_eq!(rig.scheduler.tick_index(), 0);
        rig.tick_idle();
        rig.tick_idle();
        assert_eq!(rig.scheduler.tick_index(), 2);
    }
}
