//! Operator-input triggers: edge/level detection over a [`ControlFrame`].
//!
//! A [`Trigger`] wraps a boolean condition on the operator input.  Edge
//! detection compares against the value sampled on the *previous* tick, not
//! against an instantaneous re-poll, so a press that spans a tick boundary
//! is seen exactly once.

use medulla_types::ControlFrame;

/// What the trigger's condition did across the last tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// False last tick, true this tick.
    Rising,
    /// True last tick, false this tick.
    Falling,
    /// True both ticks.
    High,
    /// False both ticks.
    Low,
}

/// A boolean condition over the operator input with per-tick edge detection.
///
/// A trigger starts with a "previously false" history, so a condition that
/// is already true on the first sampled tick reads as a rising edge.
pub struct Trigger {
    read: Box<dyn Fn(&ControlFrame) -> bool>,
    previous: bool,
}

impl Trigger {
    /// Wrap an arbitrary condition.
    pub fn new(read: impl Fn(&ControlFrame) -> bool + 'static) -> Self {
        Self {
            read: Box::new(read),
            previous: false,
        }
    }

    /// True while the named button is held.
    pub fn button(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(move |frame| frame.button(&name))
    }

    /// True while the named axis magnitude exceeds `threshold`.
    pub fn axis_above(name: impl Into<String>, threshold: f32) -> Self {
        let name = name.into();
        Self::new(move |frame| frame.axis(&name).abs() > threshold)
    }

    /// Sample the condition for this tick and classify the edge.
    pub(crate) fn sample(&mut self, frame: &ControlFrame) -> Edge {
        let now = (self.read)(frame);
        let edge = match (self.previous, now) {
            (false, true) => Edge::Rising,
            (true, false) => Edge::Falling,
            (true, true) => Edge::High,
            (false, false) => Edge::Low,
        };
        self.previous = now;
        edge
    }
}

/// How a trigger's edges map onto scheduling actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    /// Schedule the bound command on each rising edge; it then runs to its
    /// own completion or interruption.
    OnRise,
    /// Schedule on the rising edge and cancel on the falling edge.  A bound
    /// command that finishes by itself while the condition stays true is not
    /// rescheduled until the next rising edge.
    WhileHeld,
    /// Rising edge schedules the command for a single tick: unless it
    /// finished by itself, it is ended normally after its first `execute`.
    Tap,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressed(name: &str) -> ControlFrame {
        ControlFrame::new().with_button(name, true)
    }

    #[test]
    fn edges_follow_the_previous_tick_value() {
        let mut trigger = Trigger::button("a");
        let down = pressed("a");
        let up = ControlFrame::new();

        assert_eq!(trigger.sample(&up), Edge::Low);
        assert_eq!(trigger.sample(&down), Edge::Rising);
        assert_eq!(trigger.sample(&down), Edge::High);
        assert_eq!(trigger.sample(&up), Edge::Falling);
        assert_eq!(trigger.sample(&up), Edge::Low);
    }

    #[test]
    fn initially_true_condition_reads_as_rising() {
        let mut trigger = Trigger::button("a");
        assert_eq!(trigger.sample(&pressed("a")), Edge::Rising);
    }

    #[test]
    fn axis_threshold_is_symmetric() {
        let mut trigger = Trigger::axis_above("left_y", 0.5);
        let positive = ControlFrame::new().with_axis("left_y", 0.8);
        let negative = ControlFrame::new().with_axis("left_y", -0.8);
        let centred = ControlFrame::new().with_axis("left_y", 0.2);

        assert_eq!(trigger.sample(&positive), Edge::Rising);
        assert_eq!(trigger.sample(&negative), Edge::High);
        assert_eq!(trigger.sample(&centred), Edge::Falling);
    }
}
