//! Closed-loop position control for setpoint-driven mechanisms.
//!
//! [`PositionController`] converts a (target, measurement) pair into a
//! bounded actuation output.  The integral accumulator is cleared whenever
//! the target changes and whenever the loop is reset, so wind-up never
//! carries across setpoints or across enable/disable cycles.  The
//! [`travel_interlock`] helper layers the hardware safety override on top of
//! the computed output.
//!
//! # Example
//!
//! ```rust
//! use medulla_hal::pid::{PidGains, PositionController};
//!
//! let gains = PidGains { kp: 1.0, ki: 0.1, kd: 0.0, max_output: 1.0 };
//! let mut ctl = PositionController::new(gains, 0.5, 0);
//! ctl.set_target(10.0);
//!
//! let output = ctl.update(0.0, 0.02);
//! assert!(output > 0.0); // drives the mechanism toward the target
//! ```

// ─────────────────────────────────────────────────────────────────────────────
// Gains
// ─────────────────────────────────────────────────────────────────────────────

/// Static controller configuration: PID gains plus the symmetric output
/// magnitude limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Output is clamped to `[-max_output, max_output]`.
    pub max_output: f32,
}

// ─────────────────────────────────────────────────────────────────────────────
// PositionController
// ─────────────────────────────────────────────────────────────────────────────

/// Error-driven feedback controller with a tolerance band.
///
/// The controller reports [`at_target`][Self::at_target] once the measured
/// error has stayed inside the tolerance band for the configured number of
/// consecutive updates (`settle_ticks`); with `settle_ticks = 0` the first
/// in-band update is enough.
#[derive(Debug, Clone)]
pub struct PositionController {
    gains: PidGains,
    target: f32,
    integral: f32,
    last_error: Option<f32>,
    tolerance: f32,
    settle_ticks: u32,
    ticks_in_band: u32,
}

impl PositionController {
    /// Create a controller at target 0.0 with the given gains, tolerance
    /// band, and settle-tick requirement.
    pub fn new(gains: PidGains, tolerance: f32, settle_ticks: u32) -> Self {
        Self {
            gains,
            target: 0.0,
            integral: 0.0,
            last_error: None,
            tolerance,
            settle_ticks,
            ticks_in_band: 0,
        }
    }

    /// Change the target position.
    ///
    /// A changed target clears the integral accumulator, the derivative
    /// memory, and the settle counter; wind-up accumulated against the old
    /// setpoint must not leak into the new move.
    pub fn set_target(&mut self, target: f32) {
        if (target - self.target).abs() > f32::EPSILON {
            self.target = target;
            self.clear_state();
        }
    }

    /// Current target position.
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Compute the next bounded output.
    ///
    /// - `measurement` – current measured position.
    /// - `dt` – seconds since the previous update; non-positive values
    ///   return 0.0 without touching internal state.
    pub fn update(&mut self, measurement: f32, dt: f32) -> f32 {
        if dt <= 0.0 {
            return 0.0;
        }

        let error = self.target - measurement;

        // Settle tracking for at_target().
        if error.abs() <= self.tolerance {
            self.ticks_in_band = self.ticks_in_band.saturating_add(1);
        } else {
            self.ticks_in_band = 0;
        }

        let p = self.gains.kp * error;

        // Integral term with anti-windup clamping.
        self.integral += error * dt;
        let i_raw = self.gains.ki * self.integral;
        let i = i_raw.clamp(-self.gains.max_output, self.gains.max_output);
        // Back-calculate the accumulator so it cannot wind past the limits.
        if self.gains.ki.abs() > f32::EPSILON {
            self.integral = i / self.gains.ki;
        }

        let d = match self.last_error {
            Some(prev) => self.gains.kd * (error - prev) / dt,
            None => 0.0,
        };
        self.last_error = Some(error);

        (p + i + d).clamp(-self.gains.max_output, self.gains.max_output)
    }

    /// `true` once the error has stayed inside the tolerance band for more
    /// than `settle_ticks` consecutive updates.
    pub fn at_target(&self) -> bool {
        self.ticks_in_band > self.settle_ticks
    }

    /// Reset internal state (integral, derivative memory, settle counter).
    ///
    /// Call when the loop is disabled or re-enabled.
    pub fn reset(&mut self) {
        self.clear_state();
    }

    fn clear_state(&mut self) {
        self.integral = 0.0;
        self.last_error = None;
        self.ticks_in_band = 0;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Travel interlock
// ─────────────────────────────────────────────────────────────────────────────

/// Hardware-state safety override.
///
/// Forces `output` to zero when it would drive the mechanism further past an
/// engaged travel extreme.  This takes precedence over whatever the
/// controller computed; motion *away* from the extreme passes through.
pub fn travel_interlock(output: f32, at_lower: bool, at_upper: bool) -> f32 {
    if (at_lower && output < 0.0) || (at_upper && output > 0.0) {
        0.0
    } else {
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p_only(kp: f32) -> PositionController {
        PositionController::new(
            PidGains {
                kp,
                ki: 0.0,
                kd: 0.0,
                max_output: 1.0,
            },
            0.5,
            0,
        )
    }

    #[test]
    fn proportional_drives_toward_target() {
        let mut ctl = p_only(2.0);
        ctl.set_target(10.0);
        let output = ctl.update(0.0, 0.02);
        // error = 10 → raw p = 20.0, clamped to max_output.
        assert!((output - 1.0).abs() < 1e-6);
    }

    #[test]
    fn output_near_zero_at_target() {
        let mut ctl = p_only(1.0);
        ctl.set_target(5.0);
        let output = ctl.update(5.0, 0.02);
        assert!(output.abs() < 1e-6);
        assert!(ctl.at_target());
    }

    #[test]
    fn target_change_clears_integral() {
        let mut ctl = PositionController::new(
            PidGains {
                kp: 0.0,
                ki: 1.0,
                kd: 0.0,
                max_output: 1.0,
            },
            0.1,
            0,
        );
        ctl.set_target(10.0);
        // Accumulate integral against the first setpoint.
        ctl.update(0.0, 0.5);
        ctl.update(0.0, 0.5);

        // New target: accumulator must restart from zero.
        ctl.set_target(20.0);
        let out = ctl.update(19.0, 0.5);
        // integral = 1.0 * 0.5 → output = ki * 0.5 = 0.5; any carried wind-up
        // from the first setpoint would push this higher.
        assert!((out - 0.5).abs() < 1e-4);
    }

    #[test]
    fn reset_matches_fresh_controller() {
        let gains = PidGains {
            kp: 1.0,
            ki: 1.0,
            kd: 1.0,
            max_output: 5.0,
        };
        let mut ctl = PositionController::new(gains, 0.1, 0);
        ctl.set_target(5.0);
        ctl.update(0.0, 0.1);
        ctl.reset();

        let mut fresh = PositionController::new(gains, 0.1, 0);
        fresh.set_target(5.0);
        assert!((ctl.update(0.0, 0.1) - fresh.update(0.0, 0.1)).abs() < 1e-6);
    }

    #[test]
    fn non_positive_dt_returns_zero() {
        let mut ctl = p_only(1.0);
        ctl.set_target(5.0);
        assert_eq!(ctl.update(0.0, 0.0), 0.0);
        assert_eq!(ctl.update(0.0, -0.1), 0.0);
    }

    #[test]
    fn settle_ticks_delay_at_target() {
        let mut ctl = PositionController::new(
            PidGains {
                kp: 1.0,
                ki: 0.0,
                kd: 0.0,
                max_output: 1.0,
            },
            0.5,
            2,
        );
        ctl.set_target(10.0);
        ctl.update(9.8, 0.02);
        assert!(!ctl.at_target());
        ctl.update(9.9, 0.02);
        assert!(!ctl.at_target());
        ctl.update(10.0, 0.02);
        assert!(ctl.at_target());
    }

    #[test]
    fn leaving_the_band_restarts_the_settle_count() {
        let mut ctl = PositionController::new(
            PidGains {
                kp: 0.1,
                ki: 0.0,
                kd: 0.0,
                max_output: 1.0,
            },
            0.5,
            1,
        );
        ctl.set_target(10.0);
        ctl.update(9.8, 0.02);
        ctl.update(8.0, 0.02); // overshoot out of the band
        ctl.update(9.9, 0.02);
        assert!(!ctl.at_target());
        ctl.update(9.9, 0.02);
        assert!(ctl.at_target());
    }

    // ── travel interlock ─────────────────────────────────────────────────────

    #[test]
    fn interlock_blocks_motion_into_lower_extreme() {
        assert_eq!(travel_interlock(-0.8, true, false), 0.0);
    }

    #[test]
    fn interlock_blocks_motion_into_upper_extreme() {
        assert_eq!(travel_interlock(0.8, false, true), 0.0);
    }

    #[test]
    fn interlock_passes_motion_away_from_extremes() {
        assert_eq!(travel_interlock(0.8, true, false), 0.8);
        assert_eq!(travel_interlock(-0.8, false, true), -0.8);
        assert_eq!(travel_interlock(0.3, false, false), 0.3);
    }
}
