//! Operator-input conditioning helpers.

/// Scaled deadband.
///
/// Values inside the band read zero; values outside are rescaled so the
/// output still spans the full `[-1, 1]` range instead of jumping at the
/// band edge.  A band of 1.0 or more silences the axis entirely.
pub fn apply_deadband(value: f32, deadband: f32) -> f32 {
    if deadband >= 1.0 || value.abs() <= deadband {
        return 0.0;
    }
    value.signum() * (value.abs() - deadband) / (1.0 - deadband)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_the_band_reads_zero() {
        assert_eq!(apply_deadband(0.05, 0.1), 0.0);
        assert_eq!(apply_deadband(-0.1, 0.1), 0.0);
    }

    #[test]
    fn full_deflection_is_preserved() {
        assert!((apply_deadband(1.0, 0.1) - 1.0).abs() < 1e-6);
        assert!((apply_deadband(-1.0, 0.1) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn output_is_continuous_at_the_band_edge() {
        // Just outside the band the output is barely above zero, not a jump
        // to the raw axis value.
        let out = apply_deadband(0.11, 0.1);
        assert!(out > 0.0 && out < 0.02);
    }

    #[test]
    fn degenerate_band_silences_the_axis() {
        assert_eq!(apply_deadband(0.9, 1.0), 0.0);
    }
}
