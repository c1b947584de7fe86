//! [`RoutineSelector`] – autonomous routine hand-off.
//!
//! Holds a set of pre-built, not-yet-started composite commands keyed by an
//! operator-facing label.  When autonomous begins, exactly one routine is
//! *moved out* of the selector and handed to the scheduler; because the
//! hand-off transfers ownership, later changes to the selector cannot affect
//! a routine that is already running.

use std::collections::BTreeMap;

use medulla_types::MedullaError;
use tracing::debug;

use crate::command::Command;

/// Label → pre-built routine mapping with an optional default option.
#[derive(Default)]
pub struct RoutineSelector {
    routines: BTreeMap<String, Box<dyn Command>>,
    default_label: Option<String>,
}

impl RoutineSelector {
    /// Create an empty selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a routine under `label`.  A routine already registered under
    /// the same label is replaced.
    pub fn add(&mut self, label: impl Into<String>, routine: Box<dyn Command>) {
        let label = label.into();
        debug!(%label, routine = routine.name(), "autonomous routine registered");
        self.routines.insert(label, routine);
    }

    /// Register a routine and make it the default option.
    pub fn add_default(&mut self, label: impl Into<String>, routine: Box<dyn Command>) {
        let label = label.into();
        self.default_label = Some(label.clone());
        self.add(label, routine);
    }

    /// Mark an already-registered routine as the default option.
    ///
    /// # Errors
    ///
    /// Returns [`MedullaError::UnknownRoutine`] when no routine is registered
    /// under `label`.
    pub fn set_default(&mut self, label: &str) -> Result<(), MedullaError> {
        if !self.routines.contains_key(label) {
            return Err(MedullaError::UnknownRoutine(label.to_string()));
        }
        self.default_label = Some(label.to_string());
        Ok(())
    }

    /// Registered labels in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.routines.keys().map(String::as_str)
    }

    /// The current default label, if any.
    pub fn default_label(&self) -> Option<&str> {
        self.default_label.as_deref()
    }

    /// Move the routine registered under `label` out of the selector.
    ///
    /// # Errors
    ///
    /// Returns [`MedullaError::UnknownRoutine`] when no routine is registered
    /// under `label` (or it was already handed off).
    pub fn take(&mut self, label: &str) -> Result<Box<dyn Command>, MedullaError> {
        self.routines
            .remove(label)
            .ok_or_else(|| MedullaError::UnknownRoutine(label.to_string()))
    }

    /// Move the default routine out of the selector.
    ///
    /// # Errors
    ///
    /// Returns [`MedullaError::UnknownRoutine`] when no default was
    /// configured or it was already handed off.
    pub fn take_default(&mut self) -> Result<Box<dyn Command>, MedullaError> {
        match self.default_label.clone() {
            Some(label) => self.take(&label),
            None => Err(MedullaError::UnknownRoutine(
                "<no default routine configured>".to_string(),
            )),
        }
    }
}
