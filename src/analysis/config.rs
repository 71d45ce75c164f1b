//! Named thresholds for the heuristic classifiers
//!
//! Every detector takes its thresholds from here; nothing is read from
//! globals. The defaults are a starting calibration.

use serde::{Deserialize, Serialize};

/// Krumhansl-Kessler major profile, index 0 = tonic
pub const KK_MAJOR: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor profile, index 0 = tonic
pub const KK_MINOR: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Decode target rate (Hz)
    pub sample_rate: u32,
    /// RMS window for the energy curve (seconds)
    pub energy_window: f64,
    /// Files shorter than this fail with `TooShort` (seconds)
    pub min_duration: f64,
    pub tempo: TempoConfig,
    pub key: KeyConfig,
    pub segments: SegmentThresholds,
    pub mix_points: MixPointConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    /// Hop of the onset envelope used for autocorrelation (seconds)
    pub hop: f64,
    /// Autocorrelation search range
    pub min_bpm: f64,
    pub max_bpm: f64,
    /// DJ-usable band results are folded into
    pub fold_min: f64,
    pub fold_max: f64,
    /// Fraction skipped at each end of the track before autocorrelating
    pub edge_skip: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Samples per resonator block
    pub frame_len: usize,
    /// Number of blocks spread over the track
    pub frames: usize,
    /// MIDI octave of the lowest resonated note (C of this octave)
    pub lowest_octave: i32,
    pub octaves: i32,
    pub major_profile: [f32; 12],
    pub minor_profile: [f32; 12],
    /// Below this best correlation the key is reported as unknown
    pub min_correlation: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentThresholds {
    /// Classification window (seconds)
    pub window: f64,
    /// Leading fraction of the track labelled intro
    pub intro_fraction: f64,
    /// Trailing fraction of the track labelled outro
    pub outro_fraction: f64,
    /// Minimum window-to-window energy rise for a drop
    pub drop_delta: f32,
    /// Minimum window energy, relative to the loudest window, for a drop
    pub drop_level: f32,
    /// Minimum rise for the window before a drop to count as buildup
    pub buildup_delta: f32,
    /// Minimum fall after a drop to count as breakdown
    pub breakdown_delta: f32,
    /// Mid-track windows below this fraction of the loudest window are breakdowns
    pub breakdown_level: f32,
    /// Window averages spanning less than this range mean a flat track: one segment
    pub flat_range: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixPointConfig {
    /// Mix-out searches breakdown/outro segments starting after this fraction
    pub out_search_start: f64,
    /// Tail fraction searched for a local energy minimum
    pub out_min_tail: f64,
    /// Mix-out fallback as a fraction of duration
    pub out_fallback: f64,
    /// Head fraction searched for a local energy maximum
    pub in_max_head: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22_050,
            energy_window: 0.05,
            min_duration: 10.0,
            tempo: TempoConfig::default(),
            key: KeyConfig::default(),
            segments: SegmentThresholds::default(),
            mix_points: MixPointConfig::default(),
        }
    }
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            hop: 0.01,
            min_bpm: 60.0,
            max_bpm: 180.0,
            fold_min: 85.0,
            fold_max: 175.0,
            edge_skip: 0.30,
        }
    }
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            frame_len: 4096,
            frames: 96,
            lowest_octave: 3,
            octaves: 4,
            major_profile: KK_MAJOR,
            minor_profile: KK_MINOR,
            min_correlation: 0.1,
        }
    }
}

impl Default for SegmentThresholds {
    fn default() -> Self {
        Self {
            window: 4.0,
            intro_fraction: 0.10,
            outro_fraction: 0.10,
            drop_delta: 0.15,
            drop_level: 0.85,
            buildup_delta: 0.02,
            breakdown_delta: 0.15,
            breakdown_level: 0.45,
            flat_range: 0.05,
        }
    }
}

impl Default for MixPointConfig {
    fn default() -> Self {
        Self {
            out_search_start: 0.70,
            out_min_tail: 0.25,
            out_fallback: 0.97,
            in_max_head: 0.40,
        }
    }
}

impl AnalysisConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_segment_window(mut self, seconds: f64) -> Self {
        self.segments.window = seconds;
        self
    }

    /// Stable digest of every threshold, part of the analysis cache key
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("{:x}", md5::compute(json.as_bytes()))
    }
}
