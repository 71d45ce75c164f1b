//! Threshold-based structural segmentation of the energy curve
//!
//! Windows are labelled intro/outro by position, drop by a sharp rise to
//! near-peak level, buildup/breakdown by their neighbourhood of a drop,
//! and breakdown by low absolute level mid-track. Equal neighbouring
//! labels are merged so the result partitions `[0, duration)`.

use super::config::SegmentThresholds;
use crate::model::{Segment, SegmentKind};

struct Window {
    start: f64,
    end: f64,
    avg: f32,
    delta: f32,
    kind: SegmentKind,
}

/// Segment a normalized energy curve sampled at `rate` Hz
pub fn detect_segments(
    curve: &[f32],
    rate: f64,
    duration: f64,
    beats: &[f64],
    thresholds: &SegmentThresholds,
) -> Vec<Segment> {
    if duration <= 0.0 {
        return Vec::new();
    }
    let whole = |kind: SegmentKind, avg: f32| {
        vec![Segment {
            start_time: 0.0,
            end_time: duration,
            kind,
            avg_energy: avg,
            beat_count: count_beats(beats, 0.0, duration),
        }]
    };
    if curve.is_empty() || rate <= 0.0 {
        return whole(SegmentKind::Unknown, 0.0);
    }

    let frames_per_window = ((thresholds.window * rate).round() as usize).max(1);
    let mut windows: Vec<Window> = Vec::new();
    let mut prev_avg: Option<f32> = None;
    for (i, chunk) in curve.chunks(frames_per_window).enumerate() {
        let start = (i * frames_per_window) as f64 / rate;
        if start >= duration {
            break;
        }
        let end = (((i + 1) * frames_per_window) as f64 / rate).min(duration);
        let avg = chunk.iter().sum::<f32>() / chunk.len() as f32;
        windows.push(Window {
            start,
            end,
            avg,
            delta: prev_avg.map(|p| avg - p).unwrap_or(0.0),
            kind: SegmentKind::Verse,
        });
        prev_avg = Some(avg);
    }
    if let Some(last) = windows.last_mut() {
        last.end = duration;
    }

    let max_avg = windows.iter().map(|w| w.avg).fold(0.0f32, f32::max);
    let min_avg = windows.iter().map(|w| w.avg).fold(f32::MAX, f32::min);
    if max_avg - min_avg < thresholds.flat_range {
        let mean = windows.iter().map(|w| w.avg).sum::<f32>() / windows.len() as f32;
        return whole(SegmentKind::Verse, mean);
    }

    let intro_end = duration * thresholds.intro_fraction;
    let outro_start = duration * (1.0 - thresholds.outro_fraction);
    let drop_floor = thresholds.drop_level * max_avg;

    // positional labels and drops
    for i in 0..windows.len() {
        let center = 0.5 * (windows[i].start + windows[i].end);
        windows[i].kind = if center < intro_end {
            SegmentKind::Intro
        } else if center >= outro_start {
            SegmentKind::Outro
        } else if windows[i].avg >= drop_floor
            && (windows[i].delta >= thresholds.drop_delta
                || (i > 0
                    && windows[i - 1].kind == SegmentKind::Drop
                    && windows[i].delta > -thresholds.breakdown_delta))
        {
            SegmentKind::Drop
        } else {
            SegmentKind::Verse
        };
    }

    // neighbourhood of drops
    for i in 0..windows.len() {
        if windows[i].kind != SegmentKind::Drop {
            continue;
        }
        if i > 0
            && windows[i - 1].kind == SegmentKind::Verse
            && windows[i - 1].delta >= thresholds.buildup_delta
        {
            windows[i - 1].kind = SegmentKind::Buildup;
        }
        if i + 1 < windows.len()
            && windows[i + 1].kind == SegmentKind::Verse
            && windows[i + 1].delta <= -thresholds.breakdown_delta
        {
            windows[i + 1].kind = SegmentKind::Breakdown;
        }
    }

    // quiet passages mid-track
    let low_floor = thresholds.breakdown_level * max_avg;
    for window in windows.iter_mut() {
        if window.kind == SegmentKind::Verse && window.avg < low_floor {
            window.kind = SegmentKind::Breakdown;
        }
    }

    merge(&windows, beats)
}

fn merge(windows: &[Window], beats: &[f64]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut weight = 0.0f64;
    for window in windows {
        let len = window.end - window.start;
        match segments.last_mut() {
            Some(seg) if seg.kind == window.kind => {
                let total = weight + len;
                seg.avg_energy =
                    ((seg.avg_energy as f64 * weight + window.avg as f64 * len) / total) as f32;
                seg.end_time = window.end;
                weight = total;
            }
            _ => {
                segments.push(Segment {
                    start_time: window.start,
                    end_time: window.end,
                    kind: window.kind,
                    avg_energy: window.avg,
                    beat_count: 0,
                });
                weight = len;
            }
        }
    }
    for seg in segments.iter_mut() {
        seg.beat_count = count_beats(beats, seg.start_time, seg.end_time);
    }
    segments
}

fn count_beats(beats: &[f64], start: f64, end: f64) -> u32 {
    beats.iter().filter(|b| **b >= start && **b < end).count() as u32
}

/// Start of the first drop segment
pub fn first_drop(segments: &[Segment]) -> Option<f64> {
    segments
        .iter()
        .find(|s| s.kind == SegmentKind::Drop)
        .map(|s| s.start_time)
}

/// Start of the first breakdown, preferring one that follows a drop
pub fn first_breakdown(segments: &[Segment]) -> Option<f64> {
    let after_drop = first_drop(segments).and_then(|drop| {
        segments
            .iter()
            .find(|s| s.kind == SegmentKind::Breakdown && s.start_time > drop)
    });
    after_drop
        .or_else(|| segments.iter().find(|s| s.kind == SegmentKind::Breakdown))
        .map(|s| s.start_time)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 200 s curve at 20 Hz built from per-4s-window levels
    pub(crate) fn structured_curve() -> Vec<f32> {
        let mut levels = Vec::new();
        levels.extend(std::iter::repeat(0.3).take(5)); // intro 0-20
        levels.extend(std::iter::repeat(0.6).take(5)); // verse 20-40
        levels.push(0.65); // buildup 40-44
        levels.extend(std::iter::repeat(1.0).take(5)); // drop 44-64
        levels.extend(std::iter::repeat(0.3).take(5)); // breakdown 64-84
        levels.extend(std::iter::repeat(0.6).take(5)); // verse 84-104
        levels.push(0.7); // buildup 104-108
        levels.extend(std::iter::repeat(0.95).take(9)); // drop 108-144
        levels.extend(std::iter::repeat(0.6).take(9)); // 144-180
        levels.extend(std::iter::repeat(0.3).take(5)); // outro 180-200
        levels
            .into_iter()
            .flat_map(|l| std::iter::repeat(l).take(80))
            .collect()
    }

    fn kinds(segments: &[Segment]) -> Vec<(SegmentKind, f64)> {
        segments.iter().map(|s| (s.kind, s.start_time)).collect()
    }

    #[test]
    fn test_structured_track() {
        let curve = structured_curve();
        assert_eq!(curve.len(), 4000);
        let segments = detect_segments(&curve, 20.0, 200.0, &[], &SegmentThresholds::default());
        use SegmentKind::*;
        assert_eq!(
            kinds(&segments),
            vec![
                (Intro, 0.0),
                (Verse, 20.0),
                (Buildup, 40.0),
                (Drop, 44.0),
                (Breakdown, 64.0),
                (Verse, 84.0),
                (Buildup, 104.0),
                (Drop, 108.0),
                (Breakdown, 144.0),
                (Verse, 148.0),
                (Outro, 180.0),
            ]
        );
        assert_eq!(segments.last().unwrap().end_time, 200.0);
        assert_eq!(first_drop(&segments), Some(44.0));
        assert_eq!(first_breakdown(&segments), Some(64.0));
    }

    #[test]
    fn test_flat_curve_is_one_segment() {
        let curve = vec![0.7f32; 3000];
        let segments = detect_segments(&curve, 20.0, 150.0, &[], &SegmentThresholds::default());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Verse);
        assert_eq!(segments[0].start_time, 0.0);
        assert_eq!(segments[0].end_time, 150.0);
        assert!(segments
            .iter()
            .all(|s| s.kind != SegmentKind::Drop && s.kind != SegmentKind::Breakdown));
    }

    #[test]
    fn test_segments_partition_with_partial_window() {
        // 101.3 s: last window is partial
        let curve: Vec<f32> = (0..2026).map(|i| ((i as f32) * 0.01).sin().abs()).collect();
        let segments = detect_segments(&curve, 20.0, 101.3, &[], &SegmentThresholds::default());
        assert_eq!(segments[0].start_time, 0.0);
        assert_eq!(segments.last().unwrap().end_time, 101.3);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time);
            assert_ne!(pair[0].kind, pair[1].kind);
        }
        assert!(segments.iter().all(|s| s.end_time > s.start_time));
    }

    #[test]
    fn test_beat_counts() {
        let curve = vec![0.5f32; 400];
        let beats: Vec<f64> = (0..40).map(|i| i as f64 * 0.5).collect();
        let segments = detect_segments(&curve, 20.0, 20.0, &beats, &SegmentThresholds::default());
        assert_eq!(segments[0].beat_count, 40);
    }
}
