//! Camelot wheel distance and key compatibility classes

use crate::model::CamelotKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wheel distance between two keys
///
/// Circular difference of the wheel numbers, plus 1 when the letters differ
/// on different numbers. Relative major/minor (same number) is distance 0.
pub fn distance(a: &CamelotKey, b: &CamelotKey) -> u8 {
    let diff = (a.number() as i16 - b.number() as i16).unsigned_abs() as u8;
    let circular = diff.min(12 - diff);
    let mode_penalty = u8::from(a.letter() != b.letter() && a.number() != b.number());
    circular + mode_penalty
}

/// Compatibility class of a key pair, in descending preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyClass {
    Same,
    Relative,
    Adjacent,
    EnergyBoost,
    Modal,
    Clash,
    /// One or both keys missing; neutral
    Unknown,
}

impl KeyClass {
    /// Fixed score on a 0..100 scale
    pub fn score(&self) -> f64 {
        match self {
            KeyClass::Same => 100.0,
            KeyClass::Relative => 90.0,
            KeyClass::Adjacent => 80.0,
            KeyClass::EnergyBoost => 70.0,
            KeyClass::Modal => 60.0,
            KeyClass::Clash => 0.0,
            KeyClass::Unknown => 80.0,
        }
    }

    /// Same, relative or adjacent; missing keys count as compatible
    pub fn is_compatible(&self) -> bool {
        matches!(
            self,
            KeyClass::Same | KeyClass::Relative | KeyClass::Adjacent | KeyClass::Unknown
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            KeyClass::Same => "same",
            KeyClass::Relative => "relative",
            KeyClass::Adjacent => "adjacent",
            KeyClass::EnergyBoost => "energy_boost",
            KeyClass::Modal => "modal",
            KeyClass::Clash => "clash",
            KeyClass::Unknown => "unknown",
        }
    }
}

impl fmt::Display for KeyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a key pair; symmetric in its arguments
pub fn classify(a: Option<CamelotKey>, b: Option<CamelotKey>) -> KeyClass {
    let (Some(a), Some(b)) = (a, b) else {
        return KeyClass::Unknown;
    };
    if a == b {
        return KeyClass::Same;
    }
    let steps = a.steps_to(&b);
    if a.letter() == b.letter() {
        return match steps {
            1 | 11 => KeyClass::Adjacent,
            5 | 7 => KeyClass::EnergyBoost,
            _ => KeyClass::Clash,
        };
    }
    if steps == 0 {
        return KeyClass::Relative;
    }
    // parallel major/minor: the major sits three positions clockwise of the minor
    let (minor, major) = if a.is_minor() { (a, b) } else { (b, a) };
    if minor.steps_to(&major) == 3 {
        KeyClass::Modal
    } else {
        KeyClass::Clash
    }
}

/// Number of keys in the pool each key is compatible with, used to seed
/// library-driven sequencing
pub fn compatible_neighbours(key: Option<CamelotKey>, pool: &[Option<CamelotKey>]) -> usize {
    pool.iter()
        .filter(|other| classify(key, **other).is_compatible())
        .count()
}
