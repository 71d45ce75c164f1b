//! Beat and phrase alignment of mix points, crossfade fitting

/// Move `time` onto the nearest downbeat, else the nearest beat, when one
/// lies within `tolerance`. Unchanged otherwise.
pub fn snap_to_beat(time: f64, beats: &[f64], downbeats: &[f64], tolerance: f64) -> f64 {
    nearest_within(time, downbeats, tolerance)
        .or_else(|| nearest_within(time, beats, tolerance))
        .unwrap_or(time)
}

fn nearest_within(time: f64, grid: &[f64], tolerance: f64) -> Option<f64> {
    let mut best: Option<f64> = None;
    for &point in grid {
        let gap = (point - time).abs();
        if gap <= tolerance && best.map_or(true, |b| gap < (b - time).abs()) {
            best = Some(point);
        }
    }
    best
}

/// Phrase boundaries of a track: every `phrase_bars`-th downbeat when the
/// grid covers enough bars, else an arithmetic grid from the first downbeat
pub fn phrase_boundaries(
    downbeats: &[f64],
    bar_len: f64,
    phrase_bars: u32,
    duration: f64,
) -> Vec<f64> {
    let phrase_bars = phrase_bars.max(1) as usize;
    if downbeats.len() > phrase_bars {
        return downbeats.iter().step_by(phrase_bars).copied().collect();
    }
    let phrase = bar_len * phrase_bars as f64;
    if phrase <= 0.0 || duration <= 0.0 {
        return Vec::new();
    }
    let anchor = downbeats.first().copied().unwrap_or(0.0);
    (0..)
        .map(|k| anchor + k as f64 * phrase)
        .take_while(|t| *t <= duration)
        .collect()
}

/// Nearest boundary to `time` inside `[lo, hi]`, if any
pub fn snap_to_phrase(time: f64, boundaries: &[f64], lo: f64, hi: f64) -> Option<f64> {
    let mut best: Option<f64> = None;
    for &b in boundaries.iter().filter(|b| **b >= lo && **b <= hi) {
        if best.map_or(true, |cur| (b - time).abs() < (cur - time).abs()) {
            best = Some(b);
        }
    }
    best
}

/// Shrink `crossfade` to the lead time available on both tracks, never
/// below `floor` (itself capped by the requested length)
pub fn fit_to_leads(crossfade: f64, lead_in: f64, lead_out: f64, floor: f64) -> f64 {
    let available = lead_in.min(lead_out).max(0.0);
    if crossfade <= available {
        return crossfade;
    }
    available.max(floor.min(crossfade))
}
