//! Easing curves for camera transitions.

use serde::{Deserialize, Serialize};

/// Maps linear progress in [0, 1] to eased progress in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseInOutCubic,
    #[default]
    EaseOutCubic,
    EaseOutQuint,
}

impl Easing {
    /// Applies the curve. Input is clamped to [0, 1]; NaN counts as 0.
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseOutQuint => 1.0 - (1.0 - t).powi(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 4] = [
        Easing::Linear,
        Easing::EaseInOutCubic,
        Easing::EaseOutCubic,
        Easing::EaseOutQuint,
    ];

    #[test]
    fn test_endpoints() {
        for easing in ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{:?}", easing);
            assert_eq!(easing.apply(1.0), 1.0, "{:?}", easing);
        }
    }

    #[test]
    fn test_monotonic() {
        for easing in ALL {
            let mut last = 0.0;
            for i in 0..=100 {
                let v = easing.apply(i as f32 / 100.0);
                assert!(v >= last - 1e-6, "{:?} decreases at {}", easing, i);
                last = v;
            }
        }
    }

    #[test]
    fn test_clamps_input() {
        assert_eq!(Easing::EaseOutCubic.apply(-3.0), 0.0);
        assert_eq!(Easing::EaseOutCubic.apply(7.0), 1.0);
        assert_eq!(Easing::Linear.apply(f32::NAN), 0.0);
    }

    #[test]
    fn test_ease_out_is_ahead_of_linear() {
        assert!(Easing::EaseOutCubic.apply(0.4) > 0.4);
        assert!((Easing::EaseOutCubic.apply(0.5) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Easing::EaseOutCubic).unwrap();
        assert_eq!(json, "\"ease_out_cubic\"");
        let parsed: Easing = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(parsed, Easing::Linear);
    }
}
