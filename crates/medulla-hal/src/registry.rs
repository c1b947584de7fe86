//! [`ActuatorRegistry`] – central mechanism driver table.
//!
//! The registry owns every registered [`Actuator`] and routes demands and
//! sense reads by [`ActuatorId`].  It is the single path between commands
//! and hardware; the scheduler's ownership table decides *who* may call
//! [`ActuatorRegistry::apply`], this type decides *where* the demand lands.

use std::collections::HashMap;

use medulla_types::{ActuatorId, Measurement, MedullaError, Signal};
use tracing::warn;

use crate::actuator::Actuator;

/// Id-keyed driver table.
///
/// Iteration order (for [`ids`][Self::ids] and [`tick_all`][Self::tick_all])
/// is registration order, so per-tick behavior is deterministic.
#[derive(Default)]
pub struct ActuatorRegistry {
    actuators: HashMap<ActuatorId, Box<dyn Actuator>>,
    order: Vec<ActuatorId>,
}

impl ActuatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mechanism driver.
    ///
    /// # Errors
    ///
    /// Returns [`MedullaError::DuplicateActuator`] when a driver with the
    /// same id is already present.  Silently replacing a driver mid-wiring
    /// would invalidate the scheduler's ownership assumptions, so this is
    /// fatal at assembly time.
    pub fn register(&mut self, actuator: Box<dyn Actuator>) -> Result<(), MedullaError> {
        let id = ActuatorId::from(actuator.id());
        if self.actuators.contains_key(&id) {
            return Err(MedullaError::DuplicateActuator(id));
        }
        self.order.push(id.clone());
        self.actuators.insert(id, actuator);
        Ok(())
    }

    /// `true` when a driver with `id` is registered.
    pub fn contains(&self, id: &ActuatorId) -> bool {
        self.actuators.contains_key(id)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &ActuatorId> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Apply `signal` to the actuator with `id`.
    ///
    /// Commands are validated against the known actuator set when they are
    /// registered, so an unknown id here is a wiring bug: the demand is
    /// dropped with a warning rather than panicking mid-tick.
    pub fn apply(&mut self, id: &ActuatorId, signal: Signal) {
        match self.actuators.get_mut(id) {
            Some(actuator) => actuator.apply(signal),
            None => warn!(actuator = %id, ?signal, "demand for unregistered actuator dropped"),
        }
    }

    /// Read the current sensed state of the actuator with `id`.
    pub fn sense(&self, id: &ActuatorId) -> Option<Measurement> {
        self.actuators.get(id).map(|a| a.sense())
    }

    /// Advance every mechanism's internal model by `dt` seconds, in
    /// registration order.
    pub fn tick_all(&mut self, dt: f32) {
        for id in &self.order {
            if let Some(actuator) = self.actuators.get_mut(id) {
                actuator.tick(dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        id: String,
        last: Option<Signal>,
        ticks: u32,
    }

    impl Recorder {
        fn boxed(id: &str) -> Box<Self> {
            Box::new(Self {
                id: id.to_string(),
                last: None,
                ticks: 0,
            })
        }
    }

    impl Actuator for Recorder {
        fn id(&self) -> &str {
            &self.id
        }

        fn apply(&mut self, signal: Signal) {
            self.last = Some(signal);
        }

        fn sense(&self) -> Measurement {
            Measurement::Rollers {
                front: self.ticks as f32,
                rear: 0.0,
            }
        }

        fn tick(&mut self, _dt: f32) {
            self.ticks += 1;
        }
    }

    #[test]
    fn register_and_apply_routes_by_id() {
        let mut registry = ActuatorRegistry::new();
        registry.register(Recorder::boxed("intake")).unwrap();

        registry.apply(&"intake".into(), Signal::Duty(0.5));
        assert!(registry.contains(&"intake".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_registration_is_fatal() {
        let mut registry = ActuatorRegistry::new();
        registry.register(Recorder::boxed("intake")).unwrap();
        let result = registry.register(Recorder::boxed("intake"));
        assert!(matches!(result, Err(MedullaError::DuplicateActuator(_))));
    }

    #[test]
    fn unknown_actuator_demand_is_dropped() {
        let mut registry = ActuatorRegistry::new();
        // Must not panic; the demand is logged and dropped.
        registry.apply(&"ghost".into(), Signal::Duty(1.0));
        assert_eq!(registry.sense(&"ghost".into()), None);
    }

    #[test]
    fn tick_all_advances_every_mechanism() {
        let mut registry = ActuatorRegistry::new();
        registry.register(Recorder::boxed("a")).unwrap();
        registry.register(Recorder::boxed("b")).unwrap();
        registry.tick_all(0.02);
        registry.tick_all(0.02);
        for id in ["a", "b"] {
            assert!(matches!(
                registry.sense(&id.into()),
                Some(Measurement::Rollers { front, .. }) if (front - 2.0).abs() < f32::EPSILON
            ));
        }
    }

    #[test]
    fn ids_iterate_in_registration_order() {
        let mut registry = ActuatorRegistry::new();
        registry.register(Recorder::boxed("b")).unwrap();
        registry.register(Recorder::boxed("a")).unwrap();
        let ids: Vec<&str> = registry.ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
