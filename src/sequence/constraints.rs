//! Optional shaping input for the sequencer

use super::curve::EnergyCurve;
use crate::model::MixTrack;
use serde::{Deserialize, Serialize};

/// Constraints supplied by an upstream provider (e.g. a natural-language
/// front end). Every field is optional; an empty value means no filtering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixConstraints {
    /// Artists whose tracks are always kept
    pub include_artists: Vec<String>,
    /// Artists whose tracks rank higher when the pool is trimmed
    pub reference_artists: Vec<String>,
    pub bpm_range: Option<(f64, f64)>,
    /// Track energy range, 0..1
    pub energy_range: Option<(f32, f32)>,
    pub target_count: Option<usize>,
    pub energy_curve: Option<EnergyCurve>,
    pub moods: Vec<String>,
    pub genres: Vec<String>,
}

impl MixConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bpm_range(mut self, min: f64, max: f64) -> Self {
        self.bpm_range = Some((min.min(max), min.max(max)));
        self
    }

    pub fn with_energy_range(mut self, min: f32, max: f32) -> Self {
        self.energy_range = Some((min.min(max), min.max(max)));
        self
    }

    pub fn with_target_count(mut self, count: usize) -> Self {
        self.target_count = Some(count);
        self
    }

    pub fn with_curve(mut self, curve: EnergyCurve) -> Self {
        self.energy_curve = Some(curve);
        self
    }

    pub fn with_include_artists(mut self, artists: Vec<String>) -> Self {
        self.include_artists = artists;
        self
    }

    pub fn with_reference_artists(mut self, artists: Vec<String>) -> Self {
        self.reference_artists = artists;
        self
    }

    pub fn with_genres(mut self, genres: Vec<String>) -> Self {
        self.genres = genres;
        self
    }

    /// Curve to sequence against; `wave` when none was requested
    pub fn curve(&self) -> EnergyCurve {
        self.energy_curve.unwrap_or_default()
    }

    fn is_included(&self, track: &MixTrack) -> bool {
        contains_name(&self.include_artists, &track.artist)
    }

    fn in_ranges(&self, track: &MixTrack) -> bool {
        let bpm_ok = self
            .bpm_range
            .map(|(lo, hi)| track.bpm >= lo && track.bpm <= hi)
            .unwrap_or(true);
        let energy_ok = self
            .energy_range
            .map(|(lo, hi)| track.energy >= lo && track.energy <= hi)
            .unwrap_or(true);
        bpm_ok && energy_ok
    }

    /// Relevance used to choose which tracks survive a target count
    fn relevance(&self, track: &MixTrack) -> u32 {
        let mut score = 0;
        if self.is_included(track) {
            score += 100;
        }
        if contains_name(&self.reference_artists, &track.artist) {
            score += 10;
        }
        let genre = track.genre.as_deref().unwrap_or("").to_lowercase();
        if self
            .genres
            .iter()
            .any(|g| !g.trim().is_empty() && genre.contains(&g.trim().to_lowercase()))
        {
            score += 5;
        }
        let text = format!("{} {}", track.title, genre).to_lowercase();
        if self
            .moods
            .iter()
            .any(|m| !m.trim().is_empty() && text.contains(&m.trim().to_lowercase()))
        {
            score += 1;
        }
        score
    }

    /// Filter and trim the pool, preserving input order
    ///
    /// Tracks outside the BPM/energy ranges are dropped unless their artist
    /// is included. If fewer than two tracks survive, the unfiltered pool is
    /// used instead. A target count keeps the most relevant tracks.
    pub fn apply(&self, tracks: Vec<MixTrack>) -> Vec<MixTrack> {
        let total = tracks.len();
        let keep: Vec<bool> = tracks
            .iter()
            .map(|t| self.is_included(t) || self.in_ranges(t))
            .collect();
        let kept = keep.iter().filter(|k| **k).count();

        let pool: Vec<MixTrack> = if kept >= 2 {
            tracks
                .into_iter()
                .zip(keep)
                .filter_map(|(t, k)| k.then_some(t))
                .collect()
        } else {
            log::warn!(
                "Constraints leave {} of {} tracks, ignoring range filters",
                kept,
                total
            );
            tracks
        };

        match self.target_count {
            Some(count) if count < pool.len() => self.trim(pool, count.max(2)),
            _ => pool,
        }
    }

    fn trim(&self, pool: Vec<MixTrack>, count: usize) -> Vec<MixTrack> {
        let mut ranked: Vec<(usize, u32)> = pool
            .iter()
            .enumerate()
            .map(|(i, t)| (i, self.relevance(t)))
            .collect();
        // stable: equal relevance keeps input order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let mut chosen: Vec<usize> = ranked.into_iter().take(count).map(|(i, _)| i).collect();
        chosen.sort_unstable();

        log::debug!("Trimmed pool from {} to {} tracks", pool.len(), chosen.len());
        pool.into_iter()
            .enumerate()
            .filter(|(i, _)| chosen.binary_search(i).is_ok())
            .map(|(_, t)| t)
            .collect()
    }
}

fn contains_name(names: &[String], artist: &str) -> bool {
    let artist = artist.trim().to_lowercase();
    !artist.is_empty() && names.iter().any(|n| n.trim().to_lowercase() == artist)
}
