use super::track::MixTrack;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transition technique between two adjacent tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    Crossfade,
    EqSwap,
    FilterSweep,
    EchoOut,
    Drop,
    HarmonicBlend,
}

impl TransitionType {
    pub fn name(&self) -> &'static str {
        match self {
            TransitionType::Crossfade => "crossfade",
            TransitionType::EqSwap => "eq_swap",
            TransitionType::FilterSweep => "filter_sweep",
            TransitionType::EchoOut => "echo_out",
            TransitionType::Drop => "drop",
            TransitionType::HarmonicBlend => "harmonic_blend",
        }
    }

    pub fn all() -> [TransitionType; 6] {
        [
            TransitionType::Crossfade,
            TransitionType::EqSwap,
            TransitionType::FilterSweep,
            TransitionType::EchoOut,
            TransitionType::Drop,
            TransitionType::HarmonicBlend,
        ]
    }
}

impl fmt::Display for TransitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransitionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransitionType::all()
            .into_iter()
            .find(|t| t.name() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown transition type: {:?}", s))
    }
}

/// How one track hands over to the next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from_track_id: String,
    pub to_track_id: String,
    #[serde(rename = "type")]
    pub kind: TransitionType,
    /// Transition length in seconds
    pub duration: f64,
    /// Seconds into the outgoing track
    pub mix_out_point: f64,
    /// Seconds into the incoming track
    pub mix_in_point: f64,
    /// Tempo change applied to the incoming track, in percent
    pub bpm_adjustment: f64,
    /// Score (0..100) of the pair this transition joins
    pub score: f64,
    /// Whether the key pair is harmonically compatible
    pub harmonic: bool,
    pub notes: String,
}

impl Transition {
    /// Playback-rate multiplier for the incoming track
    pub fn tempo_ratio(&self) -> f64 {
        1.0 + self.bpm_adjustment / 100.0
    }
}

/// Ordered tracks plus the transitions between them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixPlan {
    pub id: String,
    pub tracks: Vec<MixTrack>,
    /// `tracks.len() - 1` entries, `transitions[i]` joins `tracks[i]` and `tracks[i + 1]`
    pub transitions: Vec<Transition>,
    /// Estimated length of the rendered mix in seconds
    pub total_duration: f64,
    /// Energy (0..1) of each track in play order
    pub energy_arc: Vec<f32>,
}

impl MixPlan {
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Fraction (0..1) of transitions joining harmonically compatible keys
    pub fn harmonic_mix_percentage(&self) -> f64 {
        if self.transitions.is_empty() {
            return 0.0;
        }
        let harmonic = self.transitions.iter().filter(|t| t.harmonic).count();
        harmonic as f64 / self.transitions.len() as f64
    }

    pub fn average_transition_score(&self) -> f64 {
        if self.transitions.is_empty() {
            return 0.0;
        }
        self.transitions.iter().map(|t| t.score).sum::<f64>() / self.transitions.len() as f64
    }

    /// Transition joining the given pair, if the plan has one
    pub fn transition_between(&self, from_id: &str, to_id: &str) -> Option<&Transition> {
        self.transitions
            .iter()
            .find(|t| t.from_track_id == from_id && t.to_track_id == to_id)
    }
}
