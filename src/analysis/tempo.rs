//! Tempo estimation by envelope autocorrelation
//!
//! 1. Build an onset envelope (half-wave rectified RMS difference)
//! 2. Autocorrelate the mid-track part over lags covering the search range
//! 3. Fold the winning tempo into the DJ band by doubling/halving

use super::config::TempoConfig;
use super::energy::rms_envelope;

/// Tempo estimate with its normalized correlation peak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEstimate {
    pub bpm: f64,
    /// 0..1
    pub confidence: f32,
}

/// Onset strength envelope and its frame rate (Hz)
pub fn onset_envelope(samples: &[f32], sample_rate: u32, hop_seconds: f64) -> (Vec<f32>, f64) {
    let hop = ((sample_rate as f64 * hop_seconds).round() as usize).max(1);
    let rate = sample_rate as f64 / hop as f64;
    let rms = rms_envelope(samples, hop);

    let mut onset = Vec::with_capacity(rms.len());
    let mut prev = rms.first().copied().unwrap_or(0.0);
    for value in rms {
        onset.push((value - prev).max(0.0));
        prev = value;
    }
    (onset, rate)
}

/// Double or halve until the tempo lies in `[min, max]`
pub fn fold_bpm(bpm: f64, min: f64, max: f64) -> f64 {
    if !bpm.is_finite() || bpm <= 0.0 || min <= 0.0 || max <= min {
        return bpm;
    }
    let mut folded = bpm;
    while folded < min {
        folded *= 2.0;
    }
    while folded > max {
        folded /= 2.0;
    }
    folded
}

/// Estimate the tempo of an onset envelope sampled at `rate` Hz
///
/// Returns `None` when the envelope is too short or has no periodicity.
pub fn estimate_tempo(onset: &[f32], rate: f64, config: &TempoConfig) -> Option<TempoEstimate> {
    if rate <= 0.0 || config.min_bpm <= 0.0 || config.max_bpm <= config.min_bpm {
        return None;
    }
    let min_lag = ((60.0 * rate / config.max_bpm).floor() as usize).max(1);
    let max_lag = (60.0 * rate / config.min_bpm).ceil() as usize;

    // intros/outros are tempo-unstable
    let skip = (onset.len() as f64 * config.edge_skip.clamp(0.0, 0.45)) as usize;
    let middle = &onset[skip..onset.len() - skip];
    let window = if middle.len() >= 2 * max_lag {
        middle
    } else {
        onset
    };
    if window.len() < max_lag + 2 {
        return None;
    }

    let mean = window.iter().sum::<f32>() / window.len() as f32;
    let centered: Vec<f32> = window.iter().map(|v| v - mean).collect();

    let correlations: Vec<f32> = (min_lag..=max_lag)
        .map(|lag| normalized_correlation(&centered, lag))
        .collect();

    let (best_idx, best) = correlations
        .iter()
        .copied()
        .enumerate()
        .fold((0usize, f32::MIN), |(bi, bv), (i, v)| {
            if v > bv {
                (i, v)
            } else {
                (bi, bv)
            }
        });
    if best <= 0.0 || !best.is_finite() {
        return None;
    }

    let mut lag = (min_lag + best_idx) as f64;
    if best_idx > 0 && best_idx + 1 < correlations.len() {
        let (a, b, c) = (
            correlations[best_idx - 1],
            correlations[best_idx],
            correlations[best_idx + 1],
        );
        let denom = a - 2.0 * b + c;
        if denom < 0.0 {
            lag += (0.5 * (a - c) / denom).clamp(-0.5, 0.5) as f64;
        }
    }

    let raw = 60.0 * rate / lag;
    let bpm = fold_bpm(raw, config.fold_min, config.fold_max);
    log::debug!(
        "Tempo: raw {:.2} BPM (lag {:.2}), folded {:.2}, r={:.3}",
        raw,
        lag,
        bpm,
        best
    );

    Some(TempoEstimate {
        bpm,
        confidence: best.clamp(0.0, 1.0),
    })
}

fn normalized_correlation(x: &[f32], lag: usize) -> f32 {
    if lag >= x.len() {
        return 0.0;
    }
    let n = x.len() - lag;
    let (mut num, mut e0, mut e1) = (0.0f64, 0.0f64, 0.0f64);
    for t in 0..n {
        let a = x[t] as f64;
        let b = x[t + lag] as f64;
        num += a * b;
        e0 += a * a;
        e1 += b * b;
    }
    let denom = (e0 * e1).sqrt();
    if denom <= f64::EPSILON {
        0.0
    } else {
        (num / denom) as f32
    }
}

/// Regular beat grid aligned to the strongest onset phase
///
/// Returns `(beats, downbeats)`; downbeats are every 4th beat starting at
/// the offset whose beats carry the most onset strength.
pub fn beat_grid(onset: &[f32], rate: f64, bpm: f64, duration: f64) -> (Vec<f64>, Vec<f64>) {
    if bpm <= 0.0 || duration <= 0.0 || rate <= 0.0 {
        return (Vec::new(), Vec::new());
    }
    let period = 60.0 / bpm;
    let strength_at = |t: f64| -> f32 {
        let idx = (t * rate).round() as usize;
        onset.get(idx).copied().unwrap_or(0.0)
    };

    let steps = (period * rate).ceil().max(1.0) as usize;
    let mut best_phase = 0.0;
    let mut best_score = f32::MIN;
    for k in 0..steps {
        let phase = k as f64 / rate;
        let mut score = 0.0f32;
        let mut t = phase;
        while t < duration {
            score += strength_at(t);
            t += period;
        }
        if score > best_score {
            best_score = score;
            best_phase = phase;
        }
    }

    let beats: Vec<f64> = (0..)
        .map(|i| best_phase + i as f64 * period)
        .take_while(|t| *t < duration)
        .collect();

    let best_offset = (0..4usize)
        .map(|offset| {
            let score: f32 = beats.iter().skip(offset).step_by(4).map(|t| strength_at(*t)).sum();
            (offset, score)
        })
        .fold((0usize, f32::MIN), |(bo, bs), (o, s)| if s > bs { (o, s) } else { (bo, bs) })
        .0;

    let downbeats = beats.iter().skip(best_offset).step_by(4).copied().collect();
    (beats, downbeats)
}
