//! Statically-declared telemetry channels.
//!
//! There is no reflective dashboard registration here: the robot assembly
//! declares a fixed list of (name, accessor) pairs once, and
//! [`Telemetry::publish`] evaluates each against the current scheduler and
//! registry state, emitting `tracing` events under the `telemetry` target.
//! Publishing is read-only and the core never blocks or branches on whether
//! anything is listening.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use medulla_hal::ActuatorRegistry;
use medulla_kernel::Scheduler;
use serde::Serialize;
use tracing::debug;

type Accessor = Box<dyn Fn(&Scheduler, &ActuatorRegistry) -> f64>;

struct Channel {
    name: &'static str,
    read: Accessor,
}

/// Fixed channel list plus a per-tick scheduler snapshot.
#[derive(Default)]
pub struct Telemetry {
    channels: Vec<Channel>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a channel.  Channels are evaluated in declaration order.
    pub fn channel(
        mut self,
        name: &'static str,
        read: impl Fn(&Scheduler, &ActuatorRegistry) -> f64 + 'static,
    ) -> Self {
        self.channels.push(Channel {
            name,
            read: Box::new(read),
        });
        self
    }

    /// Evaluate every channel and emit one event per channel plus one
    /// JSON-serialized [`SchedulerSnapshot`].
    pub fn publish(&self, scheduler: &Scheduler, registry: &ActuatorRegistry) {
        for channel in &self.channels {
            let value = (channel.read)(scheduler, registry);
            debug!(target: "telemetry", channel = channel.name, value);
        }
        let snapshot = SchedulerSnapshot::capture(scheduler);
        if let Ok(json) = serde_json::to_string(&snapshot) {
            debug!(target: "telemetry", tick = snapshot.tick, state = %json, "scheduler snapshot");
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// Read-only view of the scheduler at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerSnapshot {
    /// Wall-clock capture time, for correlating with external logs.
    pub captured_at: DateTime<Utc>,
    /// Completed-tick counter at capture.
    pub tick: u64,
    /// Names of every running command, in scheduling order.
    pub running: Vec<String>,
    /// Actuator → owning command name.
    pub owners: BTreeMap<String, String>,
}

impl SchedulerSnapshot {
    pub fn capture(scheduler: &Scheduler) -> Self {
        Self {
            captured_at: Utc::now(),
            tick: scheduler.tick_index(),
            running: scheduler.running().map(str::to_string).collect(),
            owners: scheduler
                .owned()
                .map(|(actuator, command)| (actuator.to_string(), command.to_string()))
                .collect(),
        }
    }
}
