//! Target energy shapes for a set

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed-form map from normalized set position (0..1) to target energy (0..1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyCurve {
    Build,
    Decline,
    #[default]
    Wave,
    Steady,
    DoublePeak,
    LatePeak,
    Rollercoaster,
    PlateauPeak,
}

impl EnergyCurve {
    pub fn all() -> [EnergyCurve; 8] {
        [
            EnergyCurve::Build,
            EnergyCurve::Decline,
            EnergyCurve::Wave,
            EnergyCurve::Steady,
            EnergyCurve::DoublePeak,
            EnergyCurve::LatePeak,
            EnergyCurve::Rollercoaster,
            EnergyCurve::PlateauPeak,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            EnergyCurve::Build => "build",
            EnergyCurve::Decline => "decline",
            EnergyCurve::Wave => "wave",
            EnergyCurve::Steady => "steady",
            EnergyCurve::DoublePeak => "double_peak",
            EnergyCurve::LatePeak => "late_peak",
            EnergyCurve::Rollercoaster => "rollercoaster",
            EnergyCurve::PlateauPeak => "plateau_peak",
        }
    }

    /// Target energy at position `x` (clamped to 0..1)
    pub fn target(&self, x: f64) -> f64 {
        use std::f64::consts::PI;
        let x = x.clamp(0.0, 1.0);
        let value = match self {
            EnergyCurve::Build => 0.3 + 0.7 * x,
            EnergyCurve::Decline => 1.0 - 0.7 * x,
            EnergyCurve::Wave => 0.5 + 0.25 * (4.0 * PI * x).sin(),
            EnergyCurve::Steady => 0.6,
            EnergyCurve::DoublePeak => {
                let bump = |center: f64| (-((x - center) / 0.1).powi(2)).exp();
                0.35 + 0.6 * bump(0.3) + 0.6 * bump(0.75)
            }
            EnergyCurve::LatePeak => {
                if x <= 0.85 {
                    0.3 + 0.65 * (x / 0.85).powi(2)
                } else {
                    0.95 - 0.35 * (x - 0.85) / 0.15
                }
            }
            EnergyCurve::Rollercoaster => 0.55 + 0.35 * (6.0 * PI * x).sin(),
            EnergyCurve::PlateauPeak => {
                if x < 0.3 {
                    0.4 + 0.5 * x / 0.3
                } else if x < 0.7 {
                    0.9 - 0.1 * (x - 0.3) / 0.4
                } else {
                    0.8 - 0.2 * (x - 0.7) / 0.3
                }
            }
        };
        value.clamp(0.0, 1.0)
    }

    /// Target for slot `index` of `count`
    pub fn at_slot(&self, index: usize, count: usize) -> f64 {
        if count <= 1 {
            return self.target(0.0);
        }
        self.target(index as f64 / (count - 1) as f64)
    }

    /// Targets for every slot of a set of `count` tracks
    pub fn sample(&self, count: usize) -> Vec<f32> {
        (0..count).map(|i| self.at_slot(i, count) as f32).collect()
    }
}

impl fmt::Display for EnergyCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnergyCurve {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        EnergyCurve::all()
            .into_iter()
            .find(|c| c.name() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown energy curve '{}' (expected one of: {})",
                    s,
                    EnergyCurve::all().map(|c| c.name()).join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curves_stay_in_range() {
        for curve in EnergyCurve::all() {
            for i in 0..=100 {
                let v = curve.target(i as f64 / 100.0);
                assert!((0.0..=1.0).contains(&v), "{} at {}", curve, i);
            }
        }
    }

    #[test]
    fn test_shapes() {
        assert!(EnergyCurve::Build.target(1.0) > EnergyCurve::Build.target(0.0));
        assert!(EnergyCurve::Decline.target(1.0) < EnergyCurve::Decline.target(0.0));
        assert_eq!(EnergyCurve::Steady.target(0.3), EnergyCurve::Steady.target(0.9));
        assert!((EnergyCurve::LatePeak.target(0.85) - 0.95).abs() < 1e-9);
        assert!(EnergyCurve::DoublePeak.target(0.3) > EnergyCurve::DoublePeak.target(0.5));
        assert!(EnergyCurve::DoublePeak.target(0.75) > EnergyCurve::DoublePeak.target(0.5));
    }

    #[test]
    fn test_parse() {
        assert_eq!("build".parse::<EnergyCurve>(), Ok(EnergyCurve::Build));
        assert_eq!("Double-Peak".parse::<EnergyCurve>(), Ok(EnergyCurve::DoublePeak));
        assert!("zigzag".parse::<EnergyCurve>().is_err());
        assert_eq!(EnergyCurve::default(), EnergyCurve::Wave);
    }

    #[test]
    fn test_sample() {
        let values = EnergyCurve::Build.sample(3);
        assert_eq!(values.len(), 3);
        assert!((values[0] - 0.3).abs() < 1e-6);
        assert!((values[2] - 1.0).abs() < 1e-6);
        assert_eq!(EnergyCurve::Build.sample(1).len(), 1);
    }
}
