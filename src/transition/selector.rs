//! Transition type selection and mix-point/crossfade calculation

use super::config::TransitionConfig;
use super::snap::{fit_to_leads, phrase_boundaries, snap_to_beat, snap_to_phrase};
use crate::harmonic::{score_tracks, TransitionScore};
use crate::model::{MixTrack, Transition, TransitionType};

#[derive(Debug, Clone, Default)]
pub struct TransitionSelector {
    config: TransitionConfig,
}

impl TransitionSelector {
    pub fn new(config: TransitionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    /// First matching rule wins
    pub fn select_type(&self, score: &TransitionScore, energy_gap: f32) -> TransitionType {
        let harmonic = score.key_class.is_compatible();
        let diff = score.bpm_diff;
        let c = &self.config;
        if harmonic && diff <= c.blend_bpm_diff {
            TransitionType::HarmonicBlend
        } else if harmonic && diff <= c.eq_swap_bpm_diff {
            TransitionType::EqSwap
        } else if energy_gap.abs() > c.drop_energy_gap {
            TransitionType::Drop
        } else if diff > c.eq_swap_bpm_diff {
            TransitionType::EchoOut
        } else if !harmonic && diff > c.blend_bpm_diff {
            TransitionType::FilterSweep
        } else {
            TransitionType::Crossfade
        }
    }

    /// Build the transition from `from` into `to`
    pub fn select(&self, from: &MixTrack, to: &MixTrack) -> Transition {
        let score = score_tracks(from, to);
        let energy_gap = to.energy - from.energy;
        let kind = self.select_type(&score, energy_gap);
        let genre = from.genre.as_deref().or(to.genre.as_deref());

        let mix_out_point = self.align_mix_out(from, genre);
        let mix_in_point = self.align_mix_in(to, genre);

        let requested = self.crossfade_length(from, to, kind, genre);
        let lead_out = (from.duration() - mix_out_point).max(0.0);
        let duration = match kind {
            TransitionType::Drop => requested.min(lead_out),
            _ => fit_to_leads(requested, mix_in_point, lead_out, self.config.min_crossfade),
        };
        if duration < requested {
            log::debug!(
                "Crossfade {} -> {} shrunk from {:.1}s to {:.1}s",
                from.title,
                to.title,
                requested,
                duration
            );
        }

        let bpm_adjustment = self.stretch_percent(from.bpm, to.bpm);
        let notes = format!(
            "{} keys, {:.1} BPM apart{}, energy {:+.2}",
            score.key_class,
            score.bpm_diff,
            if bpm_adjustment != 0.0 {
                format!(" (stretch {:+.2}%)", bpm_adjustment)
            } else {
                String::new()
            },
            energy_gap
        );

        log::info!(
            "Transition {} -> {}: {} over {:.1}s at {:.1}s/{:.1}s (score {:.0})",
            from.display_name(),
            to.display_name(),
            kind,
            duration,
            mix_out_point,
            mix_in_point,
            score.total
        );

        Transition {
            from_track_id: from.id.clone(),
            to_track_id: to.id.clone(),
            kind,
            duration,
            mix_out_point,
            mix_in_point,
            bpm_adjustment,
            score: score.total,
            harmonic: score.key_class.is_compatible(),
            notes,
        }
    }

    /// One transition per adjacent pair
    pub fn select_all(&self, tracks: &[MixTrack]) -> Vec<Transition> {
        tracks
            .windows(2)
            .map(|pair| self.select(&pair[0], &pair[1]))
            .collect()
    }

    fn align_mix_out(&self, track: &MixTrack, genre: Option<&str>) -> f64 {
        let a = &track.analysis;
        let beat = snap_to_beat(
            a.mix_out_point,
            &a.beats,
            &a.downbeats,
            self.config.beat_snap_tolerance,
        );
        let bounds = phrase_boundaries(
            &a.downbeats,
            a.bar_duration(),
            self.config.phrase_bars_for(genre),
            a.duration,
        );
        // must stay after the track's own entry point
        let lo = a.mix_in_point + 1e-3;
        snap_to_phrase(beat, &bounds, lo, a.duration)
            .unwrap_or(beat)
            .clamp(0.0, a.duration)
    }

    fn align_mix_in(&self, track: &MixTrack, genre: Option<&str>) -> f64 {
        let a = &track.analysis;
        let beat = snap_to_beat(
            a.mix_in_point,
            &a.beats,
            &a.downbeats,
            self.config.beat_snap_tolerance,
        );
        let bounds = phrase_boundaries(
            &a.downbeats,
            a.bar_duration(),
            self.config.phrase_bars_for(genre),
            a.duration,
        );
        let hi = a.mix_out_point - 1e-3;
        snap_to_phrase(beat, &bounds, 0.0, hi)
            .unwrap_or(beat)
            .clamp(0.0, a.duration)
    }

    /// Requested crossfade in seconds, before fitting to the tracks
    fn crossfade_length(
        &self,
        from: &MixTrack,
        to: &MixTrack,
        kind: TransitionType,
        genre: Option<&str>,
    ) -> f64 {
        let c = &self.config;
        let bar_len = 0.5 * (from.analysis.bar_duration() + to.analysis.bar_duration());
        let bars = match kind {
            TransitionType::Drop => c.drop_bars as f64,
            _ => {
                let mut bars = c.crossfade_bars_for(genre) as f64;
                match kind {
                    TransitionType::HarmonicBlend => bars *= c.blend_scale,
                    TransitionType::EchoOut => bars *= c.echo_scale,
                    _ => {}
                }
                if 0.5 * (from.energy + to.energy) < c.low_energy_threshold {
                    bars *= c.low_energy_scale;
                }
                bars
            }
        };
        (bars * bar_len).min(c.max_crossfade)
    }

    /// Tempo change for the incoming track in percent, towards the outgoing
    /// tempo (half/double-time aware) and bounded by the configured maximum
    fn stretch_percent(&self, from_bpm: f64, to_bpm: f64) -> f64 {
        if !self.config.time_stretch || from_bpm <= 0.0 || to_bpm <= 0.0 {
            return 0.0;
        }
        let target = [to_bpm, to_bpm * 2.0, to_bpm / 2.0]
            .into_iter()
            .fold(to_bpm, |best, c| {
                if (from_bpm - c).abs() < (from_bpm - best).abs() {
                    c
                } else {
                    best
                }
            });
        let max = self.config.max_stretch_percent.abs();
        let percent = ((from_bpm / target - 1.0) * 100.0).clamp(-max, max);
        (percent * 100.0).round() / 100.0
    }
}
