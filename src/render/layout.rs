//! Timeline arithmetic of one pairwise mix step
//!
//! Shared by the renderer (trim points of each step) and the planner
//! (estimated total duration), so both agree on where every track lands.
//!
//! The outgoing side is the running mix; its last track was placed with its
//! source time 0 at `offset` and played at `prev_ratio`. The incoming track
//! is time-stretched by the transition's tempo ratio, so one source second
//! lasts `1 / ratio` output seconds.

use crate::model::{Transition, TransitionType};
use crate::transition::TransitionConfig;

/// Below this the two sides are concatenated instead of crossfaded
pub const MIN_OVERLAP: f64 = 0.01;

/// Where a step cuts, overlaps and resumes, in output seconds unless noted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLayout {
    /// Running mix is cut here
    pub head_end: f64,
    /// Seconds both sides sound together
    pub overlap: f64,
    /// Source seconds of the incoming track where playback starts
    pub incoming_start: f64,
    /// Silence inserted between the two sides
    pub gap: f64,
    /// Length of the incoming side after stretching
    pub tail: f64,
    pub tempo_ratio: f64,
    /// Start of the outgoing effect region (fade, echo, filter stages)
    pub effect_start: f64,
    pub effect_len: f64,
}

/// Knobs of the layout that come from transition configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    /// Crossfade after an echo tail
    pub echo_crossfade: f64,
    /// Silence between the sides of a drop
    pub drop_gap: f64,
}

impl From<&TransitionConfig> for LayoutParams {
    fn from(config: &TransitionConfig) -> Self {
        Self {
            echo_crossfade: config.echo_crossfade,
            drop_gap: config.drop_gap,
        }
    }
}

impl StepLayout {
    pub fn compute(
        current_len: f64,
        offset: f64,
        prev_ratio: f64,
        transition: &Transition,
        incoming_len: f64,
        params: &LayoutParams,
    ) -> Self {
        let ratio = sane_ratio(transition.tempo_ratio());
        let prev_ratio = sane_ratio(prev_ratio);
        let duration = transition.duration.max(0.0);

        let mix_out_at = offset + transition.mix_out_point / prev_ratio;
        let head_end = (mix_out_at + duration).clamp(0.0, current_len.max(0.0));

        let wanted = match transition.kind {
            TransitionType::Drop => 0.0,
            TransitionType::EchoOut => duration.min(params.echo_crossfade),
            _ => duration,
        };
        let incoming_start = (transition.mix_in_point - wanted * ratio).clamp(0.0, incoming_len.max(0.0));
        let tail = ((incoming_len - incoming_start) / ratio).max(0.0);
        let overlap = wanted.min(head_end).min(tail);

        let gap = match transition.kind {
            TransitionType::Drop => params.drop_gap.max(0.0),
            _ => 0.0,
        };
        let effect_len = match transition.kind {
            TransitionType::Drop | TransitionType::EchoOut => duration.min(head_end),
            _ => overlap,
        };

        Self {
            head_end,
            overlap,
            incoming_start,
            gap,
            tail,
            tempo_ratio: ratio,
            effect_start: head_end - effect_len,
            effect_len,
        }
    }

    /// Length of the running mix after this step
    pub fn expected_duration(&self) -> f64 {
        self.head_end + self.gap + self.tail - self.overlap
    }

    /// Output time at which the incoming track's source time 0 sits
    pub fn next_offset(&self) -> f64 {
        self.head_end + self.gap - self.overlap - self.incoming_start / self.tempo_ratio
    }

    pub fn crossfades(&self) -> bool {
        self.overlap >= MIN_OVERLAP
    }
}

fn sane_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.1 {
        ratio
    } else {
        1.0
    }
}

/// Estimated mix length for tracks of `durations` joined by `transitions`
pub fn estimate_total(durations: &[f64], transitions: &[Transition], params: &LayoutParams) -> f64 {
    let Some(first) = durations.first() else {
        return 0.0;
    };
    let mut length = *first;
    let mut offset = 0.0;
    let mut ratio = 1.0;
    for (transition, incoming) in transitions.iter().zip(&durations[1..]) {
        let layout = StepLayout::compute(length, offset, ratio, transition, *incoming, params);
        length = layout.expected_duration();
        offset = layout.next_offset();
        ratio = layout.tempo_ratio;
    }
    length
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> LayoutParams {
        LayoutParams {
            echo_crossfade: 2.0,
            drop_gap: 0.5,
        }
    }

    fn transition(kind: TransitionType, out: f64, into: f64, duration: f64) -> Transition {
        Transition {
            from_track_id: "a".into(),
            to_track_id: "b".into(),
            kind,
            duration,
            mix_out_point: out,
            mix_in_point: into,
            bpm_adjustment: 0.0,
            score: 90.0,
            harmonic: true,
            notes: String::new(),
        }
    }

    #[test]
    fn test_two_track_crossfade_length() {
        let t = transition(TransitionType::Crossfade, 170.0, 10.0, 8.0);
        let layout = StepLayout::compute(180.0, 0.0, 1.0, &t, 200.0, &params());
        assert_eq!(layout.head_end, 178.0);
        assert_eq!(layout.overlap, 8.0);
        assert_eq!(layout.incoming_start, 2.0);
        assert!((layout.expected_duration() - 368.0).abs() < 1e-9);
        // incoming mix-in lands where the crossfade ends
        assert!((layout.next_offset() + 10.0 - 178.0).abs() < 1e-9);
    }

    #[test]
    fn test_drop_has_gap_and_no_overlap() {
        let t = transition(TransitionType::Drop, 170.0, 10.0, 2.0);
        let layout = StepLayout::compute(180.0, 0.0, 1.0, &t, 200.0, &params());
        assert_eq!(layout.overlap, 0.0);
        assert!(!layout.crossfades());
        assert_eq!(layout.incoming_start, 10.0);
        assert_eq!(layout.effect_start, 170.0);
        assert!((layout.expected_duration() - (172.0 + 0.5 + 190.0)).abs() < 1e-9);
    }

    #[test]
    fn test_echo_uses_short_crossfade() {
        let t = transition(TransitionType::EchoOut, 170.0, 10.0, 8.0);
        let layout = StepLayout::compute(180.0, 0.0, 1.0, &t, 200.0, &params());
        assert_eq!(layout.overlap, 2.0);
        assert_eq!(layout.effect_len, 8.0);
        assert_eq!(layout.incoming_start, 8.0);
    }

    #[test]
    fn test_stretched_incoming() {
        let mut t = transition(TransitionType::Crossfade, 170.0, 10.0, 8.0);
        t.bpm_adjustment = 25.0;
        let layout = StepLayout::compute(180.0, 0.0, 1.0, &t, 200.0, &params());
        assert_eq!(layout.tempo_ratio, 1.25);
        assert_eq!(layout.incoming_start, 0.0);
        assert!((layout.tail - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_to_running_mix() {
        let t = transition(TransitionType::Crossfade, 178.0, 0.0, 8.0);
        let layout = StepLayout::compute(180.0, 0.0, 1.0, &t, 200.0, &params());
        assert_eq!(layout.head_end, 180.0);
        assert_eq!(layout.overlap, 8.0);
        assert_eq!(layout.incoming_start, 0.0);
    }

    #[test]
    fn test_estimate_total_chains_offsets() {
        let a = transition(TransitionType::Crossfade, 170.0, 10.0, 8.0);
        let b = transition(TransitionType::Crossfade, 180.0, 10.0, 8.0);
        let total = estimate_total(&[180.0, 200.0, 200.0], &[a, b], &params());
        // second mix-out sits at offset 168 + 180 = 348
        assert!((total - (356.0 + 198.0 - 8.0)).abs() < 1e-9);
    }
}
