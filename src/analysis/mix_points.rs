//! Default mix-in / mix-out point selection

use super::config::MixPointConfig;
use super::energy::{argmax, argmin, smooth};
use crate::model::{Segment, SegmentKind};

/// Pick `(mix_in, mix_out)` in seconds
///
/// Mix-out: start of the last breakdown/outro after `out_search_start`,
/// else the energy minimum of the tail, else `out_fallback` of duration.
/// Mix-in: end of the intro, else the energy maximum of the head, else 0.
pub fn select_mix_points(
    segments: &[Segment],
    curve: &[f32],
    rate: f64,
    duration: f64,
    config: &MixPointConfig,
) -> (f64, f64) {
    if duration <= 0.0 {
        return (0.0, 0.0);
    }
    let smoothed = if rate > 0.0 {
        smooth(curve, rate.round() as usize)
    } else {
        Vec::new()
    };

    let fallback_out = duration * config.out_fallback;
    let mix_out = segments
        .iter()
        .rev()
        .find(|s| {
            matches!(s.kind, SegmentKind::Breakdown | SegmentKind::Outro)
                && s.start_time >= duration * config.out_search_start
        })
        .map(|s| s.start_time)
        .or_else(|| {
            let start = ((1.0 - config.out_min_tail) * duration * rate).floor() as usize;
            local_extreme(&smoothed, start, smoothed.len(), rate, false)
        })
        .unwrap_or(fallback_out);

    let mix_in = segments
        .iter()
        .find(|s| s.kind == SegmentKind::Intro)
        .map(|s| s.end_time)
        .or_else(|| {
            let end = (config.in_max_head * duration * rate).ceil() as usize;
            local_extreme(&smoothed, 0, end, rate, true)
        })
        .unwrap_or(0.0);

    if mix_in >= mix_out {
        log::debug!(
            "Mix points collapsed (in {:.1}s >= out {:.1}s), using defaults",
            mix_in,
            mix_out
        );
        return (0.0, fallback_out);
    }
    (mix_in, mix_out)
}

/// Time of the min/max of `values[start..end]`, `None` when that range is flat
fn local_extreme(values: &[f32], start: usize, end: usize, rate: f64, max: bool) -> Option<f64> {
    let end = end.min(values.len());
    if start >= end || rate <= 0.0 {
        return None;
    }
    let slice = &values[start..end];
    let hi = slice.iter().copied().fold(f32::MIN, f32::max);
    let lo = slice.iter().copied().fold(f32::MAX, f32::min);
    if hi - lo < 1e-3 {
        return None;
    }
    let idx = if max {
        argmax(values, start, end)
    } else {
        argmin(values, start, end)
    }?;
    Some(idx as f64 / rate)
}
