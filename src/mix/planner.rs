//! Building and editing mix plans

use crate::error::{PlanError, SequenceError};
use crate::model::{MixPlan, MixTrack, Transition};
use crate::render::{estimate_total, LayoutParams};
use crate::sequence::{MixConstraints, Sequencer};
use crate::transition::TransitionSelector;

impl MixPlan {
    /// Shape the pool with `constraints`, sequence it and pick transitions
    pub fn build(
        id: &str,
        tracks: Vec<MixTrack>,
        constraints: Option<&MixConstraints>,
        sequencer: &Sequencer,
        selector: &TransitionSelector,
    ) -> Result<MixPlan, SequenceError> {
        let (pool, curve) = match constraints {
            Some(constraints) => (constraints.apply(tracks), constraints.energy_curve),
            None => (tracks, None),
        };
        let ordered = sequencer.arrange(pool, curve)?;
        let transitions = selector.select_all(&ordered);
        let plan = Self::assemble(id, ordered, transitions, selector);
        log::info!(
            "Plan {}: {} tracks, ~{:.0}s, avg score {:.1}, {:.0}% harmonic",
            plan.id,
            plan.tracks.len(),
            plan.total_duration,
            plan.average_transition_score(),
            plan.harmonic_mix_percentage() * 100.0
        );
        Ok(plan)
    }

    /// Plan for tracks already in play order
    pub fn from_ordered(id: &str, tracks: Vec<MixTrack>, selector: &TransitionSelector) -> MixPlan {
        let transitions = selector.select_all(&tracks);
        Self::assemble(id, tracks, transitions, selector)
    }

    /// Move the track at `from` to position `to`; transitions of pairs that
    /// changed are selected again, the others are kept
    pub fn reorder(
        &mut self,
        from: usize,
        to: usize,
        selector: &TransitionSelector,
    ) -> Result<(), PlanError> {
        let len = self.tracks.len();
        for index in [from, to] {
            if index >= len {
                return Err(PlanError::OutOfRange { index, len });
            }
        }
        if from == to {
            return Ok(());
        }
        let track = self.tracks.remove(from);
        log::info!("Moving {} from {} to {}", track.display_name(), from, to);
        self.tracks.insert(to, track);
        self.refresh(selector);
        Ok(())
    }

    /// Replace the mix points of the track at `index` and reselect the two
    /// transitions around it
    pub fn override_mix_points(
        &mut self,
        index: usize,
        mix_in: Option<f64>,
        mix_out: Option<f64>,
        selector: &TransitionSelector,
    ) -> Result<(), PlanError> {
        let len = self.tracks.len();
        let track = self
            .tracks
            .get(index)
            .ok_or(PlanError::OutOfRange { index, len })?;
        let updated = track.with_mix_points(mix_in, mix_out);
        self.tracks[index] = updated;

        // drop the stale neighbours so refresh selects them again
        let id = self.tracks[index].id.clone();
        self.transitions
            .retain(|t| t.from_track_id != id && t.to_track_id != id);
        self.refresh(selector);
        Ok(())
    }

    fn refresh(&mut self, selector: &TransitionSelector) {
        let transitions: Vec<Transition> = self
            .tracks
            .windows(2)
            .map(|pair| {
                self.transition_between(&pair[0].id, &pair[1].id)
                    .cloned()
                    .unwrap_or_else(|| selector.select(&pair[0], &pair[1]))
            })
            .collect();
        let id = self.id.clone();
        let tracks = std::mem::take(&mut self.tracks);
        *self = Self::assemble(&id, tracks, transitions, selector);
    }

    fn assemble(
        id: &str,
        tracks: Vec<MixTrack>,
        transitions: Vec<Transition>,
        selector: &TransitionSelector,
    ) -> MixPlan {
        let durations: Vec<f64> = tracks.iter().map(|t| t.duration()).collect();
        let total_duration = estimate_total(
            &durations,
            &transitions,
            &LayoutParams::from(selector.config()),
        );
        let energy_arc = tracks.iter().map(|t| t.energy).collect();
        MixPlan {
            id: id.to_string(),
            tracks,
            transitions,
            total_duration,
            energy_arc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CamelotKey, TrackAnalysis};
    use crate::sequence::{EnergyCurve, SequencerConfig};
    use std::path::PathBuf;

    fn track(name: &str, bpm: f64, key: &str, energy: u8) -> MixTrack {
        let key: CamelotKey = key.parse().unwrap();
        MixTrack::new(
            PathBuf::from(format!("/music/{}.mp3", name)),
            name,
            name,
            TrackAnalysis::from_metadata(240.0, bpm, Some(key), energy),
        )
    }

    fn pool() -> Vec<MixTrack> {
        vec![
            track("a", 128.0, "8A", 5),
            track("b", 129.0, "8B", 6),
            track("c", 126.0, "9A", 4),
            track("d", 140.0, "3A", 9),
        ]
    }

    fn plan() -> MixPlan {
        MixPlan::build(
            "plan",
            pool(),
            None,
            &Sequencer::new(SequencerConfig::default()),
            &TransitionSelector::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_links_every_pair() {
        let plan = plan();
        assert_eq!(plan.tracks.len(), 4);
        assert_eq!(plan.transitions.len(), 3);
        for (t, pair) in plan.transitions.iter().zip(plan.tracks.windows(2)) {
            assert_eq!(t.from_track_id, pair[0].id);
            assert_eq!(t.to_track_id, pair[1].id);
        }
        assert_eq!(plan.energy_arc.len(), 4);
        assert!(plan.total_duration > 240.0);
        assert!(plan.total_duration < 4.0 * 240.0);
    }

    #[test]
    fn test_build_with_constraints() {
        let constraints = MixConstraints::new()
            .with_bpm_range(120.0, 132.0)
            .with_curve(EnergyCurve::Build);
        let plan = MixPlan::build(
            "plan",
            pool(),
            Some(&constraints),
            &Sequencer::new(SequencerConfig::default()),
            &TransitionSelector::default(),
        )
        .unwrap();
        assert_eq!(plan.tracks.len(), 3);
        assert!(plan.tracks.iter().all(|t| t.bpm < 132.0));
    }

    #[test]
    fn test_build_needs_two_tracks() {
        let result = MixPlan::build(
            "plan",
            vec![track("a", 128.0, "8A", 5)],
            None,
            &Sequencer::new(SequencerConfig::default()),
            &TransitionSelector::default(),
        );
        assert!(matches!(result, Err(SequenceError::InsufficientTracks { found: 1 })));
    }

    #[test]
    fn test_reorder_keeps_unchanged_pairs() {
        let mut plan = plan();
        let selector = TransitionSelector::default();
        let moved = plan.tracks[3].id.clone();
        let untouched = plan.transitions[0].clone();

        plan.reorder(3, 2, &selector).unwrap();
        assert_eq!(plan.tracks[2].id, moved);
        assert_eq!(plan.transitions.len(), 3);
        assert_eq!(plan.transitions[0], untouched);
        for (t, pair) in plan.transitions.iter().zip(plan.tracks.windows(2)) {
            assert_eq!(t.from_track_id, pair[0].id);
            assert_eq!(t.to_track_id, pair[1].id);
        }
        assert!(matches!(
            plan.reorder(0, 9, &selector),
            Err(PlanError::OutOfRange { index: 9, len: 4 })
        ));
    }

    #[test]
    fn test_override_mix_points_is_copy_on_write() {
        let mut plan = plan();
        let selector = TransitionSelector::default();
        let original = plan.tracks[1].clone();

        plan.override_mix_points(1, Some(32.0), Some(200.0), &selector)
            .unwrap();
        assert_eq!(plan.tracks[1].analysis.mix_in_point, 32.0);
        assert_eq!(plan.tracks[1].analysis.mix_out_point, 200.0);
        assert_eq!(original.analysis.mix_in_point, 0.0);
        assert_eq!(plan.transitions.len(), 3);
        assert_eq!(plan.transitions[0].to_track_id, original.id);
        assert_eq!(plan.transitions[1].from_track_id, original.id);
    }
}
