//! Key estimation from a 12-bin chroma vector
//!
//! Each pitch class is measured with a Goertzel resonator per octave, the
//! chroma is correlated against major/minor reference profiles rotated
//! through all 12 roots, and the best (root, mode) wins.

use super::config::KeyConfig;
use crate::model::{CamelotKey, Mode, MusicalKey};
use std::f32::consts::PI;

/// Detected key with its profile correlation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEstimate {
    pub key: MusicalKey,
    pub camelot: CamelotKey,
    /// Pearson correlation of the winning profile, clamped to 0..1
    pub confidence: f32,
}

/// Power of a single frequency in `block` (Goertzel)
pub fn goertzel_power(block: &[f32], frequency: f32, sample_rate: u32) -> f32 {
    let omega = 2.0 * PI * frequency / sample_rate as f32;
    let coeff = 2.0 * omega.cos();
    let (mut s1, mut s2) = (0.0f32, 0.0f32);
    for &x in block {
        let s0 = x + coeff * s1 - s2;
        s2 = s1;
        s1 = s0;
    }
    (s1 * s1 + s2 * s2 - coeff * s1 * s2).max(0.0)
}

fn midi_to_hz(midi: i32) -> f32 {
    440.0 * 2f32.powf((midi - 69) as f32 / 12.0)
}

/// Chroma energy, normalized so the strongest class is 1.0
pub fn chroma(samples: &[f32], sample_rate: u32, config: &KeyConfig) -> [f32; 12] {
    let mut bins = [0.0f32; 12];
    if samples.is_empty() || config.frame_len == 0 {
        return bins;
    }

    let frame_len = config.frame_len.min(samples.len());
    let window: Vec<f32> = (0..frame_len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / frame_len.max(2) as f32).cos())
        .collect();

    // skip the outer 10% where intros/outros are often atonal
    let usable_start = samples.len() / 10;
    let usable_end = samples.len() - samples.len() / 10;
    let span = usable_end.saturating_sub(usable_start + frame_len);
    let frames = config.frames.max(1);

    let nyquist = sample_rate as f32 / 2.0;
    let mut block = vec![0.0f32; frame_len];

    for f in 0..frames {
        let start = if frames == 1 || span == 0 {
            usable_start.min(samples.len() - frame_len)
        } else {
            usable_start + span * f / (frames - 1)
        };
        for (i, slot) in block.iter_mut().enumerate() {
            *slot = samples[start + i] * window[i];
        }

        for octave in config.lowest_octave..config.lowest_octave + config.octaves {
            for (pc, bin) in bins.iter_mut().enumerate() {
                let freq = midi_to_hz(12 * (octave + 1) + pc as i32);
                if freq >= nyquist {
                    continue;
                }
                *bin += goertzel_power(&block, freq, sample_rate).sqrt();
            }
        }

        if frames == 1 || span == 0 {
            break;
        }
    }

    let max = bins.iter().copied().fold(0.0f32, f32::max);
    if max > 0.0 {
        for bin in bins.iter_mut() {
            *bin /= max;
        }
    }
    bins
}

fn pearson(a: &[f32; 12], b: &[f32; 12]) -> f32 {
    let mean_a = a.iter().sum::<f32>() / 12.0;
    let mean_b = b.iter().sum::<f32>() / 12.0;
    let (mut num, mut da, mut db) = (0.0f32, 0.0f32, 0.0f32);
    for i in 0..12 {
        let x = a[i] - mean_a;
        let y = b[i] - mean_b;
        num += x * y;
        da += x * x;
        db += y * y;
    }
    let denom = (da * db).sqrt();
    if denom <= f32::EPSILON {
        0.0
    } else {
        num / denom
    }
}

fn rotate(profile: &[f32; 12], root: usize) -> [f32; 12] {
    let mut out = [0.0f32; 12];
    for (pc, slot) in out.iter_mut().enumerate() {
        *slot = profile[(pc + 12 - root) % 12];
    }
    out
}

/// Best-correlating key for a chroma vector; `None` for flat or silent chroma
pub fn estimate_key(chroma: &[f32; 12], config: &KeyConfig) -> Option<KeyEstimate> {
    if chroma.iter().all(|v| *v <= 0.0) {
        return None;
    }

    let mut best: Option<(MusicalKey, f32)> = None;
    for root in 0..12usize {
        for (mode, profile) in [
            (Mode::Major, &config.major_profile),
            (Mode::Minor, &config.minor_profile),
        ] {
            let r = pearson(chroma, &rotate(profile, root));
            if best.map(|(_, b)| r > b).unwrap_or(true) {
                best = Some((MusicalKey::new(root as u8, mode), r));
            }
        }
    }

    let (key, r) = best?;
    if !r.is_finite() || r < config.min_correlation {
        log::debug!("Key undecided (best r={:.3})", r);
        return None;
    }
    Some(KeyEstimate {
        key,
        camelot: key.to_camelot(),
        confidence: r.clamp(0.0, 1.0),
    })
}
