//! Weighted transition score: harmonic + tempo + energy

use super::bpm::{bpm_points, effective_bpm_diff, is_bpm_compatible, pair_tolerance};
use super::camelot::{classify, KeyClass};
use crate::model::{CamelotKey, MixTrack};
use serde::Serialize;

/// Harmonic class points cap
pub const HARMONIC_WEIGHT: f64 = 40.0;
/// Energy smoothness points cap
pub const ENERGY_WEIGHT: f64 = 20.0;
/// Energy gap at which smoothness points reach zero
const ENERGY_GAP_LIMIT: f64 = 0.5;
/// Multiplier applied to energy points when the energy falls
const ENERGY_DROP_FACTOR: f64 = 0.8;

/// The `(key, bpm, energy)` view of a track the scoring functions need
#[derive(Debug, Clone, Copy)]
pub struct TrackProfile<'a> {
    pub key: Option<CamelotKey>,
    pub bpm: f64,
    /// 0..1
    pub energy: f32,
    pub genre: Option<&'a str>,
}

impl<'a> TrackProfile<'a> {
    pub fn new(key: Option<CamelotKey>, bpm: f64, energy: f32) -> Self {
        Self {
            key,
            bpm,
            energy,
            genre: None,
        }
    }

    pub fn with_genre(mut self, genre: Option<&'a str>) -> Self {
        self.genre = genre;
        self
    }
}

impl<'a> From<&'a MixTrack> for TrackProfile<'a> {
    fn from(track: &'a MixTrack) -> Self {
        Self {
            key: track.camelot_key,
            bpm: track.bpm,
            energy: track.energy,
            genre: track.genre.as_deref(),
        }
    }
}

/// Transition score with its sub-scores for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransitionScore {
    pub harmonic: f64,
    pub bpm: f64,
    pub energy: f64,
    /// 0..100
    pub total: f64,
    pub key_class: KeyClass,
    /// Effective BPM difference (half/double-time aware)
    pub bpm_diff: f64,
    pub bpm_compatible: bool,
}

/// Energy smoothness points for a gap `to - from`; rises beat falls
pub fn energy_points(gap: f64) -> f64 {
    let closeness = 1.0 - (gap.abs() / ENERGY_GAP_LIMIT).min(1.0);
    let points = ENERGY_WEIGHT * closeness;
    if gap < 0.0 {
        points * ENERGY_DROP_FACTOR
    } else {
        points
    }
}

/// Score the transition `from -> to`
pub fn score_transition(from: &TrackProfile<'_>, to: &TrackProfile<'_>) -> TransitionScore {
    let key_class = classify(from.key, to.key);
    let harmonic = key_class.score() / 100.0 * HARMONIC_WEIGHT;

    let tolerance = pair_tolerance(from.genre, to.genre);
    let bpm_diff = effective_bpm_diff(from.bpm, to.bpm);
    let bpm = bpm_points(bpm_diff, tolerance);

    let energy = energy_points(to.energy as f64 - from.energy as f64);

    TransitionScore {
        harmonic,
        bpm,
        energy,
        total: (harmonic + bpm + energy).clamp(0.0, 100.0),
        key_class,
        bpm_diff,
        bpm_compatible: is_bpm_compatible(bpm_diff, tolerance),
    }
}

/// Convenience wrapper over two tracks
pub fn score_tracks(from: &MixTrack, to: &MixTrack) -> TransitionScore {
    score_transition(&TrackProfile::from(from), &TrackProfile::from(to))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Option<CamelotKey> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn test_perfect_pair_scores_100() {
        let a = TrackProfile::new(key("8A"), 128.0, 0.5);
        let score = score_transition(&a, &a);
        assert_eq!(score.total, 100.0);
        assert_eq!(score.key_class, KeyClass::Same);
        assert!(score.bpm_compatible);
    }

    #[test]
    fn test_monotone_in_bpm_gap() {
        let from = TrackProfile::new(key("8A"), 128.0, 0.5);
        let mut last = f64::MAX;
        // stays below 1.5x so half/double time never applies
        for step in 0..120 {
            let to = TrackProfile::new(key("9A"), 128.0 + step as f64 * 0.5, 0.5);
            let score = score_transition(&from, &to).total;
            assert!(score <= last, "bpm step {}", step);
            last = score;
        }
        let mut last = f64::MAX;
        for step in 0..60 {
            let to = TrackProfile::new(key("9A"), 128.0 - step as f64 * 0.5, 0.5);
            let score = score_transition(&from, &to).total;
            assert!(score <= last);
            last = score;
        }
    }

    #[test]
    fn test_monotone_in_energy_gap() {
        let from = TrackProfile::new(key("8A"), 128.0, 0.3);
        for sign in [1.0f32, -1.0] {
            let mut last = f64::MAX;
            for step in 0..30 {
                let energy = (0.3 + sign * step as f32 * 0.01).clamp(0.0, 1.0);
                let to = TrackProfile::new(key("8A"), 128.0, energy);
                let score = score_transition(&from, &to).total;
                assert!(score <= last);
                last = score;
            }
        }
    }

    #[test]
    fn test_rise_preferred_over_fall() {
        assert!(energy_points(0.1) > energy_points(-0.1));
        assert_eq!(energy_points(0.0), ENERGY_WEIGHT);
        assert_eq!(energy_points(0.8), 0.0);
    }

    #[test]
    fn test_clash_and_genre() {
        let from = TrackProfile::new(key("8A"), 90.0, 0.5).with_genre(Some("hip-hop"));
        let to = TrackProfile::new(key("2A"), 96.0, 0.5).with_genre(Some("hip-hop"));
        let score = score_transition(&from, &to);
        assert_eq!(score.key_class, KeyClass::Clash);
        assert_eq!(score.harmonic, 0.0);
        assert!(score.bpm_compatible);

        let boost = TrackProfile::new(key("3A"), 96.0, 0.5).with_genre(Some("hip-hop"));
        let score = score_transition(&from, &boost);
        assert_eq!(score.key_class, KeyClass::EnergyBoost);
        assert!((score.harmonic - 28.0).abs() < 1e-9);

        let strict_from = TrackProfile::new(key("8A"), 124.0, 0.5).with_genre(Some("house"));
        let strict_to = TrackProfile::new(key("8A"), 127.0, 0.5).with_genre(Some("house"));
        assert!(!score_transition(&strict_from, &strict_to).bpm_compatible);
    }
}
