use super::key::CamelotKey;
use serde::{Deserialize, Serialize};

/// Structural role of a section of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Intro,
    Verse,
    Buildup,
    Drop,
    Breakdown,
    Outro,
    Unknown,
}

impl SegmentKind {
    pub fn name(&self) -> &'static str {
        match self {
            SegmentKind::Intro => "intro",
            SegmentKind::Verse => "verse",
            SegmentKind::Buildup => "buildup",
            SegmentKind::Drop => "drop",
            SegmentKind::Breakdown => "breakdown",
            SegmentKind::Outro => "outro",
            SegmentKind::Unknown => "unknown",
        }
    }
}

/// A contiguous structural section `[start_time, end_time)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start_time: f64,
    pub end_time: f64,
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    /// Mean normalized energy over the segment (0..1)
    pub avg_energy: f32,
    pub beat_count: u32,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time
    }
}

/// Complete feature-extraction result for one audio file
///
/// Immutable once produced; overrides go through the `with_*` helpers which
/// return a modified copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAnalysis {
    /// Duration in seconds
    pub duration: f64,

    pub bpm: f64,
    /// 0..1, 1.0 when the tempo came from trusted metadata
    pub bpm_confidence: f32,

    /// Camelot key, `None` when the chroma was too flat to decide
    pub key: Option<CamelotKey>,
    /// Raw musical key, e.g. "A Minor"
    pub key_label: Option<String>,
    pub key_confidence: f32,

    /// Overall energy, 1..=10
    pub energy: u8,
    /// Normalized (0..1) RMS envelope sampled at `energy_rate` Hz
    pub energy_curve: Vec<f32>,
    pub energy_rate: f64,

    /// Beat positions in seconds
    pub beats: Vec<f64>,
    /// Every 4th beat
    pub downbeats: Vec<f64>,

    /// Partition of `[0, duration)` in time order
    pub segments: Vec<Segment>,

    pub mix_in_point: f64,
    pub mix_out_point: f64,
    pub drop_point: Option<f64>,
    pub breakdown_point: Option<f64>,
}

impl TrackAnalysis {
    /// Copy with explicit mix points (manual override)
    pub fn with_mix_points(&self, mix_in: Option<f64>, mix_out: Option<f64>) -> Self {
        let mut copy = self.clone();
        if let Some(mix_in) = mix_in {
            copy.mix_in_point = mix_in.clamp(0.0, self.duration);
        }
        if let Some(mix_out) = mix_out {
            copy.mix_out_point = mix_out.clamp(copy.mix_in_point, self.duration);
        }
        copy
    }

    /// Seconds per bar, from the downbeat grid when it is regular, else from BPM
    pub fn bar_duration(&self) -> f64 {
        if self.downbeats.len() >= 3 {
            let span = self.downbeats[self.downbeats.len() - 1] - self.downbeats[0];
            let bars = (self.downbeats.len() - 1) as f64;
            if span > 0.0 {
                return span / bars;
            }
        }
        if self.bpm > 0.0 {
            4.0 * 60.0 / self.bpm
        } else {
            2.0
        }
    }

    /// Mean of the normalized energy curve
    pub fn average_energy(&self) -> f32 {
        if self.energy_curve.is_empty() {
            return 0.0;
        }
        self.energy_curve.iter().sum::<f32>() / self.energy_curve.len() as f32
    }

    /// Segment covering `time`, if any
    pub fn segment_at(&self, time: f64) -> Option<&Segment> {
        self.segments.iter().find(|s| s.contains(time))
    }

    /// True when segments are time-ordered, non-empty and cover `[0, duration)`
    pub fn segments_are_partition(&self) -> bool {
        const EPS: f64 = 1e-6;
        let Some(first) = self.segments.first() else {
            return false;
        };
        if first.start_time.abs() > EPS {
            return false;
        }
        for pair in self.segments.windows(2) {
            if (pair[0].end_time - pair[1].start_time).abs() > EPS {
                return false;
            }
        }
        self.segments.iter().all(|s| s.end_time > s.start_time)
            && self
                .segments
                .last()
                .map(|s| (s.end_time - self.duration).abs() <= EPS)
                .unwrap_or(false)
    }

    /// Build a minimal analysis from known metadata, used when only tags are available
    pub fn from_metadata(duration: f64, bpm: f64, key: Option<CamelotKey>, energy: u8) -> Self {
        let beat = if bpm > 0.0 { 60.0 / bpm } else { 0.5 };
        let beats: Vec<f64> = (0..)
            .map(|i| i as f64 * beat)
            .take_while(|t| *t < duration)
            .collect();
        let downbeats = beats.iter().step_by(4).copied().collect();
        let avg = (energy.clamp(1, 10) as f32) / 10.0;
        let segments = vec![Segment {
            start_time: 0.0,
            end_time: duration,
            kind: SegmentKind::Unknown,
            avg_energy: avg,
            beat_count: beats.len() as u32,
        }];
        Self {
            duration,
            bpm,
            bpm_confidence: 1.0,
            key,
            key_label: None,
            key_confidence: if key.is_some() { 1.0 } else { 0.0 },
            energy: energy.clamp(1, 10),
            energy_curve: Vec::new(),
            energy_rate: 0.0,
            beats,
            downbeats,
            segments,
            mix_in_point: 0.0,
            mix_out_point: duration * 0.97,
            drop_point: None,
            breakdown_point: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_metadata_is_partition() {
        let analysis = TrackAnalysis::from_metadata(180.0, 120.0, None, 6);
        assert!(analysis.segments_are_partition());
        assert_eq!(analysis.beats.len(), 360);
        assert_eq!(analysis.downbeats.len(), 90);
        assert!((analysis.bar_duration() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_with_mix_points_copies() {
        let analysis = TrackAnalysis::from_metadata(200.0, 128.0, None, 5);
        let overridden = analysis.with_mix_points(Some(10.0), Some(500.0));
        assert_eq!(overridden.mix_in_point, 10.0);
        assert_eq!(overridden.mix_out_point, 200.0);
        assert_eq!(analysis.mix_in_point, 0.0);
    }

    #[test]
    fn test_partition_detects_gap() {
        let mut analysis = TrackAnalysis::from_metadata(100.0, 120.0, None, 5);
        analysis.segments = vec![
            Segment {
                start_time: 0.0,
                end_time: 40.0,
                kind: SegmentKind::Intro,
                avg_energy: 0.2,
                beat_count: 80,
            },
            Segment {
                start_time: 45.0,
                end_time: 100.0,
                kind: SegmentKind::Verse,
                avg_energy: 0.5,
                beat_count: 110,
            },
        ];
        assert!(!analysis.segments_are_partition());
    }
}
