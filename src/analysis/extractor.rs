//! Feature extractor: tempo, key, energy, segments and mix points
//!
//! Audio is decoded once to mono PCM at a reduced rate and every feature is
//! derived from that buffer. The result is a pure function of the file
//! contents and the configured thresholds.

use super::config::AnalysisConfig;
use super::decode::{decode_to_mono, MonoBuffer};
use super::energy::{normalize, overall_energy, rms_envelope};
use super::key::{chroma, estimate_key};
use super::mix_points::select_mix_points;
use super::segments::{detect_segments, first_breakdown, first_drop};
use super::tempo::{beat_grid, estimate_tempo, onset_envelope};
use super::traits::{AnalysisHints, AudioAnalyzer};
use crate::error::AnalysisError;
use crate::model::TrackAnalysis;
use std::path::Path;

/// Tempo used when neither metadata nor autocorrelation yields one
const FALLBACK_BPM: f64 = 120.0;

/// Real audio analyzer backed by symphonia decoding
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: AnalysisConfig,
}

impl FeatureExtractor {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze already-decoded mono audio; `path` is only used in errors
    pub fn analyze_buffer(
        &self,
        buffer: &MonoBuffer,
        hints: &AnalysisHints,
        path: &Path,
    ) -> Result<TrackAnalysis, AnalysisError> {
        let config = &self.config;
        let duration = buffer.duration();
        if duration < config.min_duration {
            return Err(AnalysisError::TooShort {
                path: path.to_path_buf(),
                duration,
            });
        }
        let sr = buffer.sample_rate;
        let samples = &buffer.samples;

        // Energy
        let window = ((sr as f64 * config.energy_window).round() as usize).max(1);
        let raw_envelope = rms_envelope(samples, window);
        let energy_curve = normalize(&raw_envelope);
        let energy_rate = sr as f64 / window as f64;
        let energy = overall_energy(&raw_envelope);

        // Tempo
        let (onset, onset_rate) = onset_envelope(samples, sr, config.tempo.hop);
        let (bpm, bpm_confidence) = match hints.trusted_bpm {
            Some(bpm) => {
                log::debug!("Using trusted BPM {:.1} from metadata", bpm);
                (bpm, 1.0)
            }
            None => match estimate_tempo(&onset, onset_rate, &config.tempo) {
                Some(estimate) => (estimate.bpm, estimate.confidence),
                None => {
                    log::warn!(
                        "No tempo found in {:?}, assuming {} BPM",
                        path,
                        FALLBACK_BPM
                    );
                    (FALLBACK_BPM, 0.0)
                }
            },
        };
        let (beats, downbeats) = beat_grid(&onset, onset_rate, bpm, duration);

        // Key
        let key_estimate = estimate_key(&chroma(samples, sr, &config.key), &config.key);

        // Structure
        let segments = detect_segments(
            &energy_curve,
            energy_rate,
            duration,
            &beats,
            &config.segments,
        );
        let (mix_in_point, mix_out_point) = select_mix_points(
            &segments,
            &energy_curve,
            energy_rate,
            duration,
            &config.mix_points,
        );

        let analysis = TrackAnalysis {
            duration,
            bpm,
            bpm_confidence,
            key: key_estimate.map(|k| k.camelot),
            key_label: key_estimate.map(|k| k.key.name()),
            key_confidence: key_estimate.map(|k| k.confidence).unwrap_or(0.0),
            energy,
            energy_curve,
            energy_rate,
            beats,
            downbeats,
            drop_point: first_drop(&segments),
            breakdown_point: first_breakdown(&segments),
            segments,
            mix_in_point,
            mix_out_point,
        };

        log::info!(
            "Analysis complete: BPM={:.1} (confidence {:.2}), Key={}, Energy={}, {} segments, mix {:.1}s -> {:.1}s",
            analysis.bpm,
            analysis.bpm_confidence,
            analysis
                .key
                .map(|k| k.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            analysis.energy,
            analysis.segments.len(),
            analysis.mix_in_point,
            analysis.mix_out_point
        );

        Ok(analysis)
    }
}

impl AudioAnalyzer for FeatureExtractor {
    fn analyze(
        &self,
        audio_path: &Path,
        hints: &AnalysisHints,
    ) -> Result<TrackAnalysis, AnalysisError> {
        log::debug!("Analyzing: {:?}", audio_path);
        let buffer = decode_to_mono(audio_path, self.config.sample_rate)?;
        self.analyze_buffer(&buffer, hints, audio_path)
    }

    fn fingerprint(&self) -> String {
        self.config.fingerprint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SegmentKind;
    use std::path::PathBuf;

    fn pulse_buffer(bpm: f64, seconds: f64) -> MonoBuffer {
        let sr = 22_050u32;
        let period = (60.0 / bpm * sr as f64) as usize;
        let total = (seconds * sr as f64) as usize;
        let samples = (0..total)
            .map(|i| {
                let t = i as f32 / sr as f32;
                let tone = 0.2 * (2.0 * std::f32::consts::PI * 220.0 * t).sin();
                let pos = i % period;
                let kick = if pos < 600 {
                    (1.0 - pos as f32 / 600.0) * (2.0 * std::f32::consts::PI * 60.0 * t).sin()
                } else {
                    0.0
                };
                tone + 0.6 * kick
            })
            .collect();
        MonoBuffer {
            samples,
            sample_rate: sr,
        }
    }

    #[test]
    fn test_too_short() {
        let extractor = FeatureExtractor::default();
        let buffer = MonoBuffer {
            samples: vec![0.1; 22_050 * 5],
            sample_rate: 22_050,
        };
        let result = extractor.analyze_buffer(&buffer, &AnalysisHints::default(), Path::new("x"));
        assert!(matches!(result, Err(AnalysisError::TooShort { .. })));
    }

    #[test]
    fn test_pulse_track() {
        let extractor = FeatureExtractor::default();
        let buffer = pulse_buffer(125.0, 40.0);
        let analysis = extractor
            .analyze_buffer(&buffer, &AnalysisHints::default(), Path::new("pulse.wav"))
            .unwrap();
        assert!((analysis.bpm - 125.0).abs() < 2.5, "bpm {}", analysis.bpm);
        assert!(analysis.segments_are_partition());
        assert!(analysis.mix_in_point < analysis.mix_out_point);
        assert!(analysis.energy_curve.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!((1..=10).contains(&analysis.energy));
        assert!(!analysis.beats.is_empty());
        assert!(analysis
            .segments
            .iter()
            .all(|s| s.kind != SegmentKind::Drop));
    }

    #[test]
    fn test_trusted_bpm_wins() {
        let extractor = FeatureExtractor::default();
        let buffer = pulse_buffer(125.0, 20.0);
        let analysis = extractor
            .analyze_buffer(&buffer, &AnalysisHints::with_bpm(Some(126.0)), Path::new("x"))
            .unwrap();
        assert_eq!(analysis.bpm, 126.0);
        assert_eq!(analysis.bpm_confidence, 1.0);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let extractor = FeatureExtractor::default();
        let buffer = pulse_buffer(128.0, 30.0);
        let path = PathBuf::from("same.wav");
        let a = extractor
            .analyze_buffer(&buffer, &AnalysisHints::default(), &path)
            .unwrap();
        let b = extractor
            .analyze_buffer(&buffer, &AnalysisHints::default(), &path)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cached_analysis_equals_fresh() {
        use crate::analysis::{AnalysisCache, CacheKey, JsonFileCache};

        let extractor = FeatureExtractor::default();
        let buffer = pulse_buffer(126.0, 40.0);
        let fresh = extractor
            .analyze_buffer(&buffer, &AnalysisHints::default(), Path::new("gated.wav"))
            .unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let cache = JsonFileCache::new(dir.path()).unwrap();
        let key = CacheKey::new(Path::new("gated.wav"), 7, &extractor.fingerprint());
        cache.put(&key, &fresh);
        let cached = cache.get(&key).unwrap();

        assert_eq!(cached, fresh);
        for (a, b) in cached.beats.iter().zip(&fresh.beats) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        assert_eq!(cached.mix_out_point.to_bits(), fresh.mix_out_point.to_bits());
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let extractor = FeatureExtractor::default();
        let result = extractor.analyze(Path::new("/nonexistent/file.mp3"), &AnalysisHints::default());
        assert!(matches!(result, Err(AnalysisError::Unreadable { .. })));
    }
}
