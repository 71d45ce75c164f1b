//! Analysis trait definitions and data structures

use crate::error::AnalysisError;
use crate::model::{MixTrack, SegmentKind, TrackAnalysis};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Audio analyzer trait - allows swapping the extractor in tests and callers
pub trait AudioAnalyzer: Send + Sync {
    /// Analyze an audio file and return all analysis data
    /// Takes hints to honour existing metadata (e.g., BPM from tags)
    fn analyze(
        &self,
        audio_path: &Path,
        hints: &AnalysisHints,
    ) -> Result<TrackAnalysis, AnalysisError>;

    /// Identifies the analyzer configuration in cache keys
    fn fingerprint(&self) -> String;
}

/// Metadata known before analysis
#[derive(Debug, Clone, Default)]
pub struct AnalysisHints {
    /// Trusted BPM (tags, catalog); used as-is with confidence 1.0
    pub trusted_bpm: Option<f64>,
}

impl AnalysisHints {
    pub fn with_bpm(bpm: Option<f64>) -> Self {
        Self {
            trusted_bpm: bpm.filter(|b| b.is_finite() && *b > 0.0),
        }
    }
}

/// Section reported by a richer analysis source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalSection {
    pub start: f64,
    pub end: f64,
    /// Known role, when the provider labels sections
    pub kind: Option<SegmentKind>,
    /// Provider loudness/energy for the section, 0..1
    pub energy: Option<f32>,
}

/// Bar/beat/section grid from an optional third-party analysis source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalAnalysis {
    pub tempo: Option<f64>,
    pub beats: Vec<f64>,
    /// Bar start times
    pub bars: Vec<f64>,
    pub sections: Vec<ExternalSection>,
}

/// Optional source of richer analysis; takes priority over the extractor
/// for mix points and bar grids when it answers
pub trait AnalysisProvider: Send + Sync {
    fn fetch(&self, track: &MixTrack) -> Option<ExternalAnalysis>;
}
