/// Timing curves used by the animation stages
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    /// Starts fast and slows toward the end; the factor sharpens the curve
    Decelerate(f32),
}

impl Easing {
    /// Plain deceleration with factor 1
    pub const DECELERATE: Easing = Easing::Decelerate(1.0);

    pub fn apply(self, t: f32) -> f32 {
        ease(self, t)
    }
}

/// Maps linear progress `t` in [0, 1] onto the curve
pub fn ease(curve: Easing, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match curve {
        Easing::Linear => t,
        Easing::Decelerate(factor) if factor == 1.0 => 1.0 - (1.0 - t) * (1.0 - t),
        Easing::Decelerate(factor) => 1.0 - (1.0 - t).powf(2.0 * factor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn endpoints_are_fixed() {
        for curve in [
            Easing::Linear,
            Easing::DECELERATE,
            Easing::Decelerate(2.0),
            Easing::Decelerate(4.0),
        ] {
            assert_close(ease(curve, 0.0), 0.0);
            assert_close(ease(curve, 1.0), 1.0);
        }
    }

    #[test]
    fn decelerate_runs_ahead_of_linear() {
        assert_close(ease(Easing::DECELERATE, 0.5), 0.75);
        assert_close(ease(Easing::Decelerate(2.0), 0.5), 0.9375);
        assert!(ease(Easing::Decelerate(4.0), 0.5) > ease(Easing::Decelerate(2.0), 0.5));
    }

    #[test]
    fn progress_outside_unit_range_is_clamped() {
        assert_close(Easing::Linear.apply(-0.5), 0.0);
        assert_close(Easing::Decelerate(2.0).apply(3.0), 1.0);
    }
}
