//! Command composition: sequential and parallel combinators.
//!
//! Groups are themselves [`Command`]s: the scheduler sees one unit whose
//! requirement set is the union of its children's, so exclusivity is
//! arbitrated once for the whole composite.  Children are owned by the group
//! and only ever receive lifecycle calls through it; the only way a child is
//! interrupted is the group itself being interrupted.
//!
//! | Group          | Semantics                                              |
//! |----------------|--------------------------------------------------------|
//! | [`Sequential`] | Children run one at a time in declared order; a normal |
//! |                | finish advances, interruption stops the whole group.   |
//! | [`ParallelRace`] | All children run together; the first normal finish    |
//! |                | interrupts the rest on the same tick.                  |
//! | [`ParallelAll`]  | All children run together; the group finishes when    |
//! |                | every child has finished normally.                     |

use medulla_types::{ActuatorId, MedullaError};

use crate::command::{Command, Cycle};

/// Union of child requirements, deduplicated, declaration order preserved.
fn union_requirements(children: &[Box<dyn Command>]) -> Vec<ActuatorId> {
    let mut union: Vec<ActuatorId> = Vec::new();
    for child in children {
        for req in child.requirements() {
            if !union.contains(req) {
                union.push(req.clone());
            }
        }
    }
    union
}

/// Parallel children must not share an actuator: both would be "active owner"
/// at once inside the group, which the scheduler could not arbitrate.
fn check_disjoint(children: &[Box<dyn Command>]) -> Result<(), MedullaError> {
    let mut seen: Vec<(&ActuatorId, &str)> = Vec::new();
    for child in children {
        for req in child.requirements() {
            if let Some((_, first)) = seen.iter().find(|(id, _)| *id == req) {
                return Err(MedullaError::OverlappingRequirements {
                    first: (*first).to_string(),
                    second: child.name().to_string(),
                    actuator: req.clone(),
                });
            }
            seen.push((req, child.name()));
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Sequential
// ─────────────────────────────────────────────────────────────────────────────

/// Runs children one at a time in declared order.
///
/// A child's normal finish advances to the next child, whose `initialize`
/// runs on the same tick and whose first `execute` runs on the next.
/// Interrupting the group interrupts the active child; children after it
/// never start.
pub struct Sequential {
    name: String,
    children: Vec<Box<dyn Command>>,
    requirements: Vec<ActuatorId>,
    current: usize,
    done: bool,
}

impl Sequential {
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Command>>) -> Self {
        let requirements = union_requirements(&children);
        Self {
            name: name.into(),
            children,
            requirements,
            current: 0,
            done: false,
        }
    }
}

impl Command for Sequential {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[ActuatorId] {
        &self.requirements
    }

    fn initialize(&mut self, cx: &mut Cycle<'_>) {
        self.current = 0;
        self.done = self.children.is_empty();
        if let Some(first) = self.children.first_mut() {
            first.initialize(cx);
        }
    }

    fn execute(&mut self, cx: &mut Cycle<'_>) {
        if self.done {
            return;
        }
        let child = &mut self.children[self.current];
        child.execute(cx);
        if child.is_finished(cx) {
            child.end(cx, false);
            self.current += 1;
            match self.children.get_mut(self.current) {
                Some(next) => next.initialize(cx),
                None => self.done = true,
            }
        }
    }

    fn is_finished(&mut self, _cx: &mut Cycle<'_>) -> bool {
        self.done
    }

    fn end(&mut self, cx: &mut Cycle<'_>, interrupted: bool) {
        if interrupted && !self.done {
            if let Some(child) = self.children.get_mut(self.current) {
                child.end(cx, true);
            }
        }
        self.done = true;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ParallelRace
// ─────────────────────────────────────────────────────────────────────────────

/// Runs all children together; the first child to finish normally wins.
///
/// On the winning tick every other child is interrupted, then the group
/// itself reports finished.  Interrupting the group interrupts every child
/// that has not yet ended.
pub struct ParallelRace {
    name: String,
    children: Vec<Box<dyn Command>>,
    requirements: Vec<ActuatorId>,
    finished: bool,
}

impl ParallelRace {
    /// # Errors
    ///
    /// Returns [`MedullaError::OverlappingRequirements`] when two children
    /// require the same actuator.
    pub fn new(
        name: impl Into<String>,
        children: Vec<Box<dyn Command>>,
    ) -> Result<Self, MedullaError> {
        check_disjoint(&children)?;
        let requirements = union_requirements(&children);
        Ok(Self {
            name: name.into(),
            children,
            requirements,
            finished: false,
        })
    }
}

impl Command for ParallelRace {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[ActuatorId] {
        &self.requirements
    }

    fn initialize(&mut self, cx: &mut Cycle<'_>) {
        self.finished = self.children.is_empty();
        for child in &mut self.children {
            child.initialize(cx);
        }
    }

    fn execute(&mut self, cx: &mut Cycle<'_>) {
        if self.finished {
            return;
        }
        for child in &mut self.children {
            child.execute(cx);
        }
        let winner = self
            .children
            .iter_mut()
            .position(|child| child.is_finished(cx));
        if let Some(winner) = winner {
            for (index, child) in self.children.iter_mut().enumerate() {
                child.end(cx, index != winner);
            }
            self.finished = true;
        }
    }

    fn is_finished(&mut self, _cx: &mut Cycle<'_>) -> bool {
        self.finished
    }

    fn end(&mut self, cx: &mut Cycle<'_>, interrupted: bool) {
        if interrupted && !self.finished {
            for child in &mut self.children {
                child.end(cx, true);
            }
        }
        self.finished = true;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ParallelAll
// ─────────────────────────────────────────────────────────────────────────────

/// Runs all children together; finishes once every child finished normally.
///
/// Interrupting the group interrupts only the children still running;
/// children that already finished ended normally and are left alone.
pub struct ParallelAll {
    name: String,
    children: Vec<Box<dyn Command>>,
    requirements: Vec<ActuatorId>,
    running: Vec<bool>,
}

impl ParallelAll {
    /// # Errors
    ///
    /// Returns [`MedullaError::OverlappingRequirements`] when two children
    /// require the same actuator.
    pub fn new(
        name: impl Into<String>,
        children: Vec<Box<dyn Command>>,
    ) -> Result<Self, MedullaError> {
        check_disjoint(&children)?;
        let requirements = union_requirements(&children);
        let running = vec![false; children.len()];
        Ok(Self {
            name: name.into(),
            children,
            requirements,
            running,
        })
    }
}

impl Command for ParallelAll {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[ActuatorId] {
        &self.requirements
    }

    fn initialize(&mut self, cx: &mut Cycle<'_>) {
        for (child, running) in self.children.iter_mut().zip(self.running.iter_mut()) {
            child.initialize(cx);
            *running = true;
        }
    }

    fn execute(&mut self, cx: &mut Cycle<'_>) {
        for (child, running) in self.children.iter_mut().zip(self.running.iter_mut()) {
            if !*running {
                continue;
            }
            child.execute(cx);
            if child.is_finished(cx) {
                child.end(cx, false);
                *running = false;
            }
        }
    }

    fn is_finished(&mut self, _cx: &mut Cycle<'_>) -> bool {
        self.running.iter().all(|r| !r)
    }

    fn end(&mut self, cx: &mut Cycle<'_>, interrupted: bool) {
        if interrupted {
            for (child, running) in self.children.iter_mut().zip(self.running.iter_mut()) {
                if *running {
                    child.end(cx, true);
                    *running = false;
                }
            }
        }
    }
}
