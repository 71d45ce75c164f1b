//! Merge a richer third-party analysis into an extractor result

use super::config::MixPointConfig;
use super::mix_points::select_mix_points;
use super::segments::{first_breakdown, first_drop};
use super::traits::{ExternalAnalysis, ExternalSection};
use crate::model::{Segment, SegmentKind, TrackAnalysis};

/// Sections louder than this fraction of the loudest are unlabelled drops
const DROP_LEVEL: f32 = 0.8;
/// Sections quieter than this fraction of the loudest are unlabelled breakdowns
const BREAKDOWN_LEVEL: f32 = 0.45;

/// Return a copy of `analysis` with the provider's grids and sections applied
///
/// Provider data wins wherever it is present: tempo, beats, bars (as
/// downbeats) and sections. Mix points are recomputed from the merged
/// sections. The original analysis is never modified.
pub fn merge_external(
    analysis: &TrackAnalysis,
    external: &ExternalAnalysis,
    config: &MixPointConfig,
) -> TrackAnalysis {
    let mut merged = analysis.clone();

    if let Some(tempo) = external.tempo.filter(|t| t.is_finite() && *t > 0.0) {
        merged.bpm = tempo;
        merged.bpm_confidence = 1.0;
    }
    if !external.beats.is_empty() {
        merged.beats = sorted_within(&external.beats, merged.duration);
    }
    if !external.bars.is_empty() {
        merged.downbeats = sorted_within(&external.bars, merged.duration);
    }

    let segments = sections_to_segments(&external.sections, &merged);
    if !segments.is_empty() {
        merged.segments = segments;
        let (mix_in, mix_out) = select_mix_points(
            &merged.segments,
            &merged.energy_curve,
            merged.energy_rate,
            merged.duration,
            config,
        );
        merged.mix_in_point = mix_in;
        merged.mix_out_point = mix_out;
        merged.drop_point = first_drop(&merged.segments);
        merged.breakdown_point = first_breakdown(&merged.segments);
    }

    merged
}

fn sorted_within(times: &[f64], duration: f64) -> Vec<f64> {
    let mut out: Vec<f64> = times
        .iter()
        .copied()
        .filter(|t| t.is_finite() && *t >= 0.0 && *t < duration)
        .collect();
    out.sort_by(|a, b| a.total_cmp(b));
    out.dedup();
    out
}

/// Turn provider sections into a gap-free partition of `[0, duration)`
fn sections_to_segments(sections: &[ExternalSection], analysis: &TrackAnalysis) -> Vec<Segment> {
    let duration = analysis.duration;
    let mut sorted: Vec<&ExternalSection> = sections
        .iter()
        .filter(|s| s.start.is_finite() && s.start < duration)
        .collect();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));
    if sorted.is_empty() {
        return Vec::new();
    }

    let levels: Vec<f32> = sorted
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let end = sorted.get(i + 1).map(|n| n.start).unwrap_or(duration);
            s.energy
                .unwrap_or_else(|| curve_average(analysis, s.start.max(0.0), end))
        })
        .collect();
    let loudest = levels.iter().copied().fold(0.0f32, f32::max);
    let last = sorted.len() - 1;

    let mut segments: Vec<Segment> = Vec::with_capacity(sorted.len());
    for (i, section) in sorted.iter().enumerate() {
        let start = if i == 0 { 0.0 } else { section.start.max(0.0) };
        let end = sorted.get(i + 1).map(|n| n.start).unwrap_or(duration);
        if end <= start {
            continue;
        }
        let kind = section.kind.unwrap_or_else(|| {
            if i == 0 && last > 0 {
                SegmentKind::Intro
            } else if i == last && last > 0 {
                SegmentKind::Outro
            } else if loudest > 0.0 && levels[i] >= DROP_LEVEL * loudest {
                SegmentKind::Drop
            } else if loudest > 0.0 && levels[i] < BREAKDOWN_LEVEL * loudest {
                SegmentKind::Breakdown
            } else {
                SegmentKind::Verse
            }
        });
        let beat_count = analysis
            .beats
            .iter()
            .filter(|b| **b >= start && **b < end)
            .count() as u32;
        segments.push(Segment {
            start_time: start,
            end_time: end,
            kind,
            avg_energy: levels[i],
            beat_count,
        });
    }
    if let Some(last) = segments.last_mut() {
        last.end_time = duration;
    }
    segments
}

fn curve_average(analysis: &TrackAnalysis, start: f64, end: f64) -> f32 {
    let rate = analysis.energy_rate;
    if rate <= 0.0 || analysis.energy_curve.is_empty() {
        return 0.0;
    }
    let len = analysis.energy_curve.len();
    let from = ((start * rate).floor() as usize).min(len);
    let to = ((end * rate).ceil() as usize).min(len);
    if to <= from {
        return 0.0;
    }
    let slice = &analysis.energy_curve[from..to];
    slice.iter().sum::<f32>() / slice.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> TrackAnalysis {
        let mut analysis = TrackAnalysis::from_metadata(200.0, 126.0, None, 6);
        analysis.energy_rate = 1.0;
        analysis.energy_curve = (0..200)
            .map(|i| if (150..170).contains(&i) { 0.2 } else { 0.8 })
            .collect();
        analysis
    }

    #[test]
    fn test_merge_is_copy_on_write() {
        let original = base();
        let external = ExternalAnalysis {
            tempo: Some(125.0),
            ..Default::default()
        };
        let merged = merge_external(&original, &external, &MixPointConfig::default());
        assert_eq!(merged.bpm, 125.0);
        assert_eq!(merged.bpm_confidence, 1.0);
        assert_eq!(original.bpm, 126.0);
    }

    #[test]
    fn test_labelled_sections_drive_mix_points() {
        let external = ExternalAnalysis {
            tempo: None,
            beats: vec![],
            bars: vec![0.0, 1.92, 3.84],
            sections: vec![
                ExternalSection {
                    start: 0.0,
                    end: 16.0,
                    kind: Some(SegmentKind::Intro),
                    energy: None,
                },
                ExternalSection {
                    start: 16.0,
                    end: 150.0,
                    kind: Some(SegmentKind::Drop),
                    energy: None,
                },
                ExternalSection {
                    start: 150.0,
                    end: 200.0,
                    kind: Some(SegmentKind::Outro),
                    energy: None,
                },
            ],
        };
        let merged = merge_external(&base(), &external, &MixPointConfig::default());
        assert_eq!(merged.segments.len(), 3);
        assert!(merged.segments_are_partition());
        assert_eq!(merged.mix_in_point, 16.0);
        assert_eq!(merged.mix_out_point, 150.0);
        assert_eq!(merged.downbeats, vec![0.0, 1.92, 3.84]);
        assert_eq!(merged.drop_point, Some(16.0));
    }

    #[test]
    fn test_unlabelled_sections_use_energy() {
        let section = |start: f64, end: f64| ExternalSection {
            start,
            end,
            kind: None,
            energy: None,
        };
        let external = ExternalAnalysis {
            sections: vec![
                section(0.0, 20.0),
                section(20.0, 150.0),
                section(150.0, 170.0),
                section(170.0, 185.0),
                section(185.0, 200.0),
            ],
            ..Default::default()
        };
        let merged = merge_external(&base(), &external, &MixPointConfig::default());
        let kinds: Vec<SegmentKind> = merged.segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Intro,
                SegmentKind::Drop,
                SegmentKind::Breakdown,
                SegmentKind::Drop,
                SegmentKind::Outro
            ]
        );
        assert_eq!(merged.mix_out_point, 185.0);
    }

    #[test]
    fn test_empty_external_changes_nothing() {
        let original = base();
        let merged = merge_external(&original, &ExternalAnalysis::default(), &MixPointConfig::default());
        assert_eq!(merged, original);
    }
}
