//! Track ordering: seeded greedy path, 2-opt refinement, artist repair
//!
//! Greedy and 2-opt optimise the same objective: the sum of link scores
//! along the path plus each track's energy-target bonus at its slot. The
//! seed keeps slot 0; refinement only rearranges the tracks after it.
//!
//! Everything here is deterministic. Candidates are always scanned in input
//! order and only a strictly better score replaces the current best, so ties
//! resolve to the earlier input track.

use super::config::{SeedStrategy, SequencerConfig};
use super::curve::EnergyCurve;
use crate::error::SequenceError;
use crate::harmonic::{compatible_neighbours, score_tracks};
use crate::model::MixTrack;

/// Minimum gain for a 2-opt move, keeps float noise from cycling
const IMPROVEMENT_EPSILON: f64 = 1e-9;

pub struct Sequencer {
    config: SequencerConfig,
}

impl Sequencer {
    pub fn new(config: SequencerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Order `tracks`, returning indices into the input (a permutation)
    pub fn order(
        &self,
        tracks: &[MixTrack],
        curve: Option<EnergyCurve>,
    ) -> Result<Vec<usize>, SequenceError> {
        let n = tracks.len();
        if n < 2 {
            return Err(SequenceError::InsufficientTracks { found: n });
        }
        let curve = curve.unwrap_or(self.config.default_curve);
        let links = self.link_matrix(tracks);
        let bonus = self.bonus_matrix(tracks, curve);

        let seed = self.seed(tracks, curve);
        let mut order = greedy(&links, &bonus, seed);
        let passes = self.two_opt(&mut order, &links, &bonus);
        let repaired = repair_artists(&mut order, tracks);

        log::info!(
            "Sequenced {} tracks with '{}' curve (seed: {}, score {:.1}, 2-opt passes: {}, artist swaps: {})",
            n,
            curve,
            tracks[seed].display_name(),
            path_score(&order, &links, &bonus),
            passes,
            repaired
        );
        Ok(order)
    }

    /// Order and move the tracks themselves
    pub fn arrange(
        &self,
        tracks: Vec<MixTrack>,
        curve: Option<EnergyCurve>,
    ) -> Result<Vec<MixTrack>, SequenceError> {
        let order = self.order(&tracks, curve)?;
        let mut slots: Vec<Option<MixTrack>> = tracks.into_iter().map(Some).collect();
        Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
    }

    /// `links[i][j]`: score of playing `j` right after `i`
    fn link_matrix(&self, tracks: &[MixTrack]) -> Vec<Vec<f64>> {
        tracks
            .iter()
            .map(|from| {
                tracks
                    .iter()
                    .map(|to| {
                        let mut score = score_tracks(from, to).total
                            + to.danceability.unwrap_or(0.0) as f64 * self.config.preference_weight;
                        if from.same_artist(to) {
                            score -= self.config.same_artist_penalty;
                        }
                        score
                    })
                    .collect()
            })
            .collect()
    }

    /// `bonus[t][slot]`: points for track `t` matching the curve at `slot`
    fn bonus_matrix(&self, tracks: &[MixTrack], curve: EnergyCurve) -> Vec<Vec<f64>> {
        let n = tracks.len();
        tracks
            .iter()
            .map(|track| {
                (0..n)
                    .map(|slot| {
                        let target = curve.at_slot(slot, n);
                        self.config.energy_weight * (1.0 - (track.energy as f64 - target).abs())
                    })
                    .collect()
            })
            .collect()
    }

    fn seed(&self, tracks: &[MixTrack], curve: EnergyCurve) -> usize {
        match self.config.seed {
            SeedStrategy::EnergyCurve => {
                let start = curve.target(0.0);
                let mut best = 0;
                let mut best_gap = f64::MAX;
                for (i, track) in tracks.iter().enumerate() {
                    let gap = (track.energy as f64 - start).abs();
                    if gap < best_gap {
                        best = i;
                        best_gap = gap;
                    }
                }
                best
            }
            SeedStrategy::MostCompatible => {
                let keys: Vec<_> = tracks.iter().map(|t| t.camelot_key).collect();
                let mut best = 0;
                let mut best_count = 0;
                for (i, track) in tracks.iter().enumerate() {
                    let count = compatible_neighbours(track.camelot_key, &keys);
                    if count > best_count {
                        best = i;
                        best_count = count;
                    }
                }
                best
            }
        }
    }

    /// Reverse `order[i..=j]` whenever that raises the path objective.
    /// Returns the number of passes run.
    fn two_opt(&self, order: &mut [usize], links: &[Vec<f64>], bonus: &[Vec<f64>]) -> usize {
        let n = order.len();
        let mut passes = 0;
        while passes < self.config.max_passes {
            passes += 1;
            let mut improved = false;
            for i in 1..n.saturating_sub(1) {
                for j in (i + 1)..n {
                    if reversal_gain(order, i, j, links, bonus) > IMPROVEMENT_EPSILON {
                        order[i..=j].reverse();
                        improved = true;
                    }
                }
            }
            if !improved {
                break;
            }
        }
        passes
    }
}

fn greedy(links: &[Vec<f64>], bonus: &[Vec<f64>], seed: usize) -> Vec<usize> {
    let n = links.len();
    let mut used = vec![false; n];
    let mut order = Vec::with_capacity(n);
    used[seed] = true;
    order.push(seed);

    for slot in 1..n {
        let last = order[slot - 1];
        let mut best: Option<(usize, f64)> = None;
        for j in 0..n {
            if used[j] {
                continue;
            }
            let score = links[last][j] + bonus[j][slot];
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((j, score));
            }
        }
        if let Some((j, _)) = best {
            used[j] = true;
            order.push(j);
        }
    }
    order
}

/// Objective change from reversing `order[i..=j]` (`i >= 1`). Links are
/// directional, so the links inside the segment are counted too.
fn reversal_gain(order: &[usize], i: usize, j: usize, links: &[Vec<f64>], bonus: &[Vec<f64>]) -> f64 {
    let mut before = links[order[i - 1]][order[i]];
    let mut after = links[order[i - 1]][order[j]];
    if let Some(&right) = order.get(j + 1) {
        before += links[order[j]][right];
        after += links[order[i]][right];
    }
    for k in i..j {
        before += links[order[k]][order[k + 1]];
        after += links[order[k + 1]][order[k]];
    }
    for slot in i..=j {
        before += bonus[order[slot]][slot];
        after += bonus[order[i + j - slot]][slot];
    }
    after - before
}

/// Sum of links along `order` plus every track's bonus at its slot
fn path_score(order: &[usize], links: &[Vec<f64>], bonus: &[Vec<f64>]) -> f64 {
    let linked: f64 = order.windows(2).map(|w| links[w[0]][w[1]]).sum();
    let placed: f64 = order.iter().enumerate().map(|(slot, &t)| bonus[t][slot]).sum();
    linked + placed
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(SequencerConfig::default())
    }
}

fn conflicts_at(order: &[usize], tracks: &[MixTrack], pos: usize) -> bool {
    let clash = |a: usize, b: usize| tracks[order[a]].same_artist(&tracks[order[b]]);
    (pos > 0 && clash(pos - 1, pos)) || (pos + 1 < order.len() && clash(pos, pos + 1))
}

/// Swap away remaining same-artist neighbours; returns the number of swaps
fn repair_artists(order: &mut [usize], tracks: &[MixTrack]) -> usize {
    let mut swaps = 0;
    for k in 1..order.len() {
        if !tracks[order[k - 1]].same_artist(&tracks[order[k]]) {
            continue;
        }
        let mut fixed = false;
        for m in (k + 1)..order.len() {
            order.swap(k, m);
            if !conflicts_at(order, tracks, k) && !conflicts_at(order, tracks, m) {
                fixed = true;
                swaps += 1;
                break;
            }
            order.swap(k, m);
        }
        if !fixed {
            log::debug!(
                "Could not separate back-to-back tracks by {}",
                tracks[order[k]].artist
            );
        }
    }
    swaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrackAnalysis;
    use std::path::PathBuf;

    fn track(name: &str, artist: &str, bpm: f64, key: &str, energy: f32) -> MixTrack {
        let analysis = TrackAnalysis::from_metadata(240.0, bpm, Some(key.parse().unwrap()), 5);
        let mut track = MixTrack::new(
            PathBuf::from(format!("/music/{}.flac", name)),
            artist,
            name,
            analysis,
        );
        track.energy = energy;
        track
    }

    /// Small deterministic generator for pool fixtures
    fn pool(size: usize, seed: u64) -> Vec<MixTrack> {
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) as u32
        };
        (0..size)
            .map(|i| {
                let number = next() % 12 + 1;
                let letter = if next() % 2 == 0 { "A" } else { "B" };
                let bpm = 90.0 + (next() % 80) as f64;
                let energy = (next() % 100) as f32 / 100.0;
                let artist = format!("artist{}", next() % 4);
                track(&format!("t{}", i), &artist, bpm, &format!("{}{}", number, letter), energy)
            })
            .collect()
    }

    #[test]
    fn test_order_is_permutation() {
        let sequencer = Sequencer::default();
        for size in 2..14 {
            for seed in 0..5u64 {
                let tracks = pool(size, seed * 31 + size as u64);
                for curve in EnergyCurve::all() {
                    let mut order = sequencer.order(&tracks, Some(curve)).unwrap();
                    order.sort_unstable();
                    assert_eq!(order, (0..size).collect::<Vec<_>>());
                }
            }
        }
    }

    #[test]
    fn test_insufficient_tracks() {
        let sequencer = Sequencer::default();
        let one = vec![track("a", "x", 128.0, "8A", 0.5)];
        assert!(matches!(
            sequencer.order(&one, None),
            Err(SequenceError::InsufficientTracks { found: 1 })
        ));
        assert!(sequencer.order(&[], None).is_err());
    }

    #[test]
    fn test_harmonic_pair_adjacent_and_intense_track_last() {
        let tracks = vec![
            track("a", "one", 128.0, "8A", 0.5),
            track("b", "two", 129.0, "8B", 0.55),
            track("c", "three", 140.0, "3A", 0.9),
        ];
        let order = Sequencer::default()
            .order(&tracks, Some(EnergyCurve::Build))
            .unwrap();
        assert_eq!(order[2], 2);
        let first_two = [order[0], order[1]];
        assert!(first_two.contains(&0) && first_two.contains(&1));
    }

    #[test]
    fn test_same_artist_not_back_to_back() {
        let tracks = vec![
            track("x1", "X", 128.0, "8A", 0.5),
            track("x2", "x ", 128.0, "8A", 0.5),
            track("y1", "Y", 140.0, "3A", 0.9),
            track("z1", "Z", 100.0, "5A", 0.2),
        ];
        let arranged = Sequencer::default().arrange(tracks, None).unwrap();
        for pair in arranged.windows(2) {
            assert!(!pair[0].same_artist(&pair[1]), "{:?}", pair[0].artist);
        }
    }

    #[test]
    fn test_deterministic() {
        let tracks = pool(12, 7);
        let sequencer = Sequencer::default();
        assert_eq!(
            sequencer.order(&tracks, None).unwrap(),
            sequencer.order(&tracks, None).unwrap()
        );
    }

    #[test]
    fn test_refinement_never_lowers_objective() {
        let sequencer = Sequencer::default();
        for seed in 0..8u64 {
            let tracks = pool(10, seed * 17 + 3);
            for curve in EnergyCurve::all() {
                let links = sequencer.link_matrix(&tracks);
                let bonus = sequencer.bonus_matrix(&tracks, curve);
                let start = sequencer.seed(&tracks, curve);
                let mut order = greedy(&links, &bonus, start);
                let before = path_score(&order, &links, &bonus);

                sequencer.two_opt(&mut order, &links, &bonus);
                assert_eq!(order[0], start);
                assert!(path_score(&order, &links, &bonus) >= before - 1e-9);
            }
        }
    }

    #[test]
    fn test_reversal_gain_matches_rescoring() {
        let sequencer = Sequencer::default();
        let tracks = pool(7, 42);
        let links = sequencer.link_matrix(&tracks);
        let bonus = sequencer.bonus_matrix(&tracks, EnergyCurve::Build);
        let order: Vec<usize> = (0..7).collect();
        for i in 1..6 {
            for j in (i + 1)..7 {
                let mut reversed = order.clone();
                reversed[i..=j].reverse();
                let expected = path_score(&reversed, &links, &bonus) - path_score(&order, &links, &bonus);
                let gain = reversal_gain(&order, i, j, &links, &bonus);
                assert!((gain - expected).abs() < 1e-9, "{} {}", i, j);
            }
        }
    }

    #[test]
    fn test_most_compatible_seed() {
        let tracks = vec![
            track("lonely", "a", 128.0, "3A", 0.3),
            track("hub", "b", 128.0, "8A", 0.9),
            track("n1", "c", 128.0, "8B", 0.9),
            track("n2", "d", 128.0, "9A", 0.9),
        ];
        let sequencer =
            Sequencer::new(SequencerConfig::default().with_seed(SeedStrategy::MostCompatible));
        let order = sequencer.order(&tracks, Some(EnergyCurve::Build)).unwrap();
        assert_eq!(order[0], 1);
    }
}
