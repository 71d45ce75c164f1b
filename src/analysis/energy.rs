//! RMS energy envelope

/// RMS over consecutive non-overlapping windows of `window` samples
pub fn rms_envelope(samples: &[f32], window: usize) -> Vec<f32> {
    if window == 0 {
        return Vec::new();
    }
    samples
        .chunks(window)
        .map(|chunk| (chunk.iter().map(|s| s * s).sum::<f32>() / chunk.len() as f32).sqrt())
        .collect()
}

/// Scale so the maximum is 1.0; an all-silent envelope stays at zero
pub fn normalize(values: &[f32]) -> Vec<f32> {
    let max = values.iter().copied().fold(0.0f32, f32::max);
    if max <= f32::EPSILON {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v / max).clamp(0.0, 1.0)).collect()
}

/// Overall energy on the 1..=10 scale
///
/// Combines absolute loudness (mean RMS in dBFS mapped from -36..-6 dB)
/// with density (share of windows above half the peak). A quiet, sparse
/// track rates low even after its curve has been normalized.
pub fn overall_energy(raw_envelope: &[f32]) -> u8 {
    if raw_envelope.is_empty() {
        return 1;
    }
    let mean_sq = raw_envelope.iter().map(|v| v * v).sum::<f32>() / raw_envelope.len() as f32;
    let rms = mean_sq.sqrt();
    let db = if rms > 1e-9 { 20.0 * rms.log10() } else { -120.0 };
    let loudness = ((db + 36.0) / 30.0).clamp(0.0, 1.0);

    let peak = raw_envelope.iter().copied().fold(0.0f32, f32::max);
    let density = if peak > 0.0 {
        raw_envelope.iter().filter(|v| **v >= peak * 0.5).count() as f32
            / raw_envelope.len() as f32
    } else {
        0.0
    };

    let score = 0.7 * loudness + 0.3 * density;
    (1.0 + score * 9.0).round().clamp(1.0, 10.0) as u8
}

/// Index of the smallest value in `values[start..end]`, first wins on ties
pub fn argmin(values: &[f32], start: usize, end: usize) -> Option<usize> {
    let end = end.min(values.len());
    (start..end).fold(None, |best: Option<usize>, i| match best {
        Some(b) if values[b] <= values[i] => Some(b),
        _ => Some(i),
    })
}

/// Index of the largest value in `values[start..end]`, first wins on ties
pub fn argmax(values: &[f32], start: usize, end: usize) -> Option<usize> {
    let end = end.min(values.len());
    (start..end).fold(None, |best: Option<usize>, i| match best {
        Some(b) if values[b] >= values[i] => Some(b),
        _ => Some(i),
    })
}

/// Centered moving average, used before searching for local extrema
pub fn smooth(values: &[f32], radius: usize) -> Vec<f32> {
    if radius == 0 || values.is_empty() {
        return values.to_vec();
    }
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(radius);
            let end = (i + radius + 1).min(values.len());
            values[start..end].iter().sum::<f32>() / (end - start) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_of_constant() {
        let env = rms_envelope(&[0.5; 1000], 100);
        assert_eq!(env.len(), 10);
        assert!(env.iter().all(|v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_normalize_peak_is_one() {
        let norm = normalize(&[0.1, 0.4, 0.2]);
        assert!((norm[1] - 1.0).abs() < 1e-6);
        assert!((norm[0] - 0.25).abs() < 1e-6);
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_overall_energy_orders_loudness() {
        let quiet = overall_energy(&[0.01; 100]);
        let loud = overall_energy(&[0.4; 100]);
        assert!(quiet < loud);
        assert!((1..=10).contains(&quiet));
        assert!((1..=10).contains(&loud));
        assert_eq!(overall_energy(&[]), 1);
    }

    #[test]
    fn test_argmin_argmax_ties_first() {
        let v = [3.0, 1.0, 1.0, 5.0, 5.0];
        assert_eq!(argmin(&v, 0, 5), Some(1));
        assert_eq!(argmax(&v, 0, 5), Some(3));
        assert_eq!(argmax(&v, 4, 10), Some(4));
        assert_eq!(argmin(&v, 5, 5), None);
    }
}
