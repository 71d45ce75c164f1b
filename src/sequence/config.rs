use super::curve::EnergyCurve;
use serde::{Deserialize, Serialize};

/// How the first track is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedStrategy {
    /// Energy closest to the curve's starting value
    #[default]
    EnergyCurve,
    /// Most Camelot-compatible neighbours in the pool
    MostCompatible,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Points for matching the curve's target energy at a slot
    pub energy_weight: f64,
    /// Points per unit of danceability
    pub preference_weight: f64,
    /// Subtracted from a pair's score when both tracks share an artist
    pub same_artist_penalty: f64,
    /// 2-opt pass cap
    pub max_passes: usize,
    /// Curve used when no constraint names one
    pub default_curve: EnergyCurve,
    pub seed: SeedStrategy,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            energy_weight: 20.0,
            preference_weight: 5.0,
            same_artist_penalty: 60.0,
            max_passes: 50,
            default_curve: EnergyCurve::Wave,
            seed: SeedStrategy::EnergyCurve,
        }
    }
}

impl SequencerConfig {
    pub fn with_seed(mut self, seed: SeedStrategy) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes;
        self
    }
}
