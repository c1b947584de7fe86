//! Time-parameterized pose sequences for autonomous path following.
//!
//! A [`Trajectory`] is produced by an external generator and consumed
//! read-only by the drivetrain tracking command, which samples it by elapsed
//! time since the command started.  Once constructed a trajectory is
//! immutable.

use serde::{Deserialize, Serialize};

use crate::{MedullaError, Pose};

/// One time-indexed sample: where the robot should be at `time` seconds
/// after the trajectory starts, and how fast it should be moving.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// Seconds from the trajectory start.
    pub time: f32,
    /// Target pose, relative to the trajectory's own origin.
    pub pose: Pose,
    /// Target ground speed in mechanism units per second.
    pub velocity: f32,
}

/// An immutable, time-ordered sequence of pose/velocity samples.
///
/// # Example
///
/// ```
/// use medulla_types::{Pose, Trajectory};
///
/// let traj = Trajectory::line(Pose::default(), Pose::new(4.0, 0.0, 0.0), 4.0, 8).unwrap();
/// assert_eq!(traj.duration(), 4.0);
///
/// // Halfway through the robot should be halfway along the line.
/// let mid = traj.sample(2.0);
/// assert!((mid.pose.x - 2.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    samples: Vec<TrajectorySample>,
    duration: f32,
}

impl Trajectory {
    /// Build a trajectory from pre-generated samples.
    ///
    /// # Errors
    ///
    /// Returns [`MedullaError::Trajectory`] when `samples` is empty, when the
    /// first timestamp is negative, or when timestamps are not strictly
    /// increasing.
    pub fn from_samples(samples: Vec<TrajectorySample>) -> Result<Self, MedullaError> {
        let first = samples
            .first()
            .ok_or_else(|| MedullaError::Trajectory("no samples".to_string()))?;
        if first.time < 0.0 {
            return Err(MedullaError::Trajectory(format!(
                "first sample at negative time {}",
                first.time
            )));
        }
        for pair in samples.windows(2) {
            if pair[1].time <= pair[0].time {
                return Err(MedullaError::Trajectory(format!(
                    "samples out of order at t={} .. t={}",
                    pair[0].time, pair[1].time
                )));
            }
        }
        let duration = samples[samples.len() - 1].time;
        Ok(Self { samples, duration })
    }

    /// Generate a constant-velocity straight line from `from` to `to`.
    ///
    /// Intended for demos and tests; real routines come from an external
    /// trajectory generator.
    ///
    /// # Errors
    ///
    /// Returns [`MedullaError::Trajectory`] when `duration` is not positive
    /// or `steps < 2`.
    pub fn line(from: Pose, to: Pose, duration: f32, steps: usize) -> Result<Self, MedullaError> {
        if duration <= 0.0 {
            return Err(MedullaError::Trajectory(format!(
                "line duration must be positive, got {duration}"
            )));
        }
        if steps < 2 {
            return Err(MedullaError::Trajectory(format!(
                "line needs at least 2 samples, got {steps}"
            )));
        }
        let distance = ((to.x - from.x).powi(2) + (to.y - from.y).powi(2)).sqrt();
        let velocity = distance / duration;
        let samples = (0..steps)
            .map(|i| {
                let s = i as f32 / (steps - 1) as f32;
                TrajectorySample {
                    time: s * duration,
                    pose: Pose {
                        x: from.x + s * (to.x - from.x),
                        y: from.y + s * (to.y - from.y),
                        heading: from.heading + s * (to.heading - from.heading),
                    },
                    velocity,
                }
            })
            .collect();
        Self::from_samples(samples)
    }

    /// Total duration in seconds (the timestamp of the last sample).
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// The first sample of the trajectory.
    pub fn initial(&self) -> TrajectorySample {
        self.samples[0]
    }

    /// Sample the trajectory at `t` seconds, linearly interpolating between
    /// the bracketing samples.  `t` is clamped to the trajectory's ends.
    pub fn sample(&self, t: f32) -> TrajectorySample {
        let first = self.samples[0];
        let last = self.samples[self.samples.len() - 1];
        if t <= first.time {
            return first;
        }
        if t >= last.time {
            return last;
        }
        // Find the first sample at or after t; t is strictly inside the span.
        let after = self
            .samples
            .iter()
            .position(|s| s.time >= t)
            .unwrap_or(self.samples.len() - 1);
        let b = self.samples[after];
        let a = self.samples[after - 1];
        let s = (t - a.time) / (b.time - a.time);
        TrajectorySample {
            time: t,
            pose: Pose {
                x: a.pose.x + s * (b.pose.x - a.pose.x),
                y: a.pose.y + s * (b.pose.y - a.pose.y),
                heading: a.pose.heading + s * (b.pose.heading - a.pose.heading),
            },
            velocity: a.velocity + s * (b.velocity - a.velocity),
        }
    }
}
