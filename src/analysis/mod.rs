//! Audio analysis layer
//!
//! Turns an audio file into a `TrackAnalysis`: energy curve, tempo and beat
//! grid, key, structural segments and default mix points. Each detector is a
//! pure function taking its thresholds from `AnalysisConfig`.

mod cache;
mod config;
mod decode;
mod energy;
mod external;
mod extractor;
mod key;
mod mix_points;
mod segments;
mod tempo;
mod traits;

pub use cache::{AnalysisCache, CacheKey, JsonFileCache, MemoryCache};
pub use config::{
    AnalysisConfig, KeyConfig, MixPointConfig, SegmentThresholds, TempoConfig, KK_MAJOR, KK_MINOR,
};
pub use decode::{decode_to_mono, MonoBuffer};
pub use external::merge_external;
pub use extractor::FeatureExtractor;
pub use key::KeyEstimate;
pub use mix_points::select_mix_points;
pub use segments::detect_segments;
pub use tempo::{fold_bpm, TempoEstimate};
pub use traits::{AnalysisHints, AnalysisProvider, AudioAnalyzer, ExternalAnalysis, ExternalSection};
