use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Max distance for snapping a mix point onto a beat/downbeat (seconds)
    pub beat_snap_tolerance: f64,
    /// Phrase length in bars when the genre is unknown
    pub phrase_bars: u32,
    /// Genre keyword → phrase length in bars
    pub genre_phrase_bars: BTreeMap<String, u32>,
    /// Crossfade length in bars when the genre is unknown
    pub crossfade_bars: u32,
    /// Genre keyword → crossfade length in bars
    pub genre_crossfade_bars: BTreeMap<String, u32>,
    /// Crossfade length in bars for `drop` transitions
    pub drop_bars: u32,
    /// Multiplier on the bar count for `harmonic_blend`
    pub blend_scale: f64,
    /// Multiplier on the bar count for `echo_out`
    pub echo_scale: f64,
    /// Pairs whose mean energy is below this get longer transitions
    pub low_energy_threshold: f32,
    pub low_energy_scale: f64,
    /// Hard ceiling on a crossfade (seconds)
    pub max_crossfade: f64,
    /// Floor when shrinking to the available lead-in/lead-out (seconds)
    pub min_crossfade: f64,
    /// Time-stretch the incoming track towards the outgoing tempo
    pub time_stretch: bool,
    /// Largest tempo change applied, in percent
    pub max_stretch_percent: f64,
    /// BPM difference up to which compatible keys blend
    pub blend_bpm_diff: f64,
    /// BPM difference up to which compatible keys swap bass
    pub eq_swap_bpm_diff: f64,
    /// Energy gap above which the transition is a cut
    pub drop_energy_gap: f32,
    /// Short crossfade after the echo tail (seconds)
    pub echo_crossfade: f64,
    /// Silence between the two tracks of a `drop` (seconds)
    pub drop_gap: f64,
}

fn keyword_table(entries: &[(&str, u32)]) -> BTreeMap<String, u32> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            beat_snap_tolerance: 0.5,
            phrase_bars: 16,
            genre_phrase_bars: keyword_table(&[
                ("hip", 8),
                ("rap", 8),
                ("pop", 8),
                ("house", 16),
                ("techno", 16),
                ("trance", 16),
            ]),
            crossfade_bars: 8,
            genre_crossfade_bars: keyword_table(&[
                ("hip", 4),
                ("rap", 4),
                ("pop", 4),
                ("house", 16),
                ("techno", 16),
                ("trance", 16),
            ]),
            drop_bars: 1,
            blend_scale: 1.5,
            echo_scale: 0.5,
            low_energy_threshold: 0.4,
            low_energy_scale: 1.5,
            max_crossfade: 55.0,
            min_crossfade: 8.0,
            time_stretch: true,
            max_stretch_percent: 8.0,
            blend_bpm_diff: 5.0,
            eq_swap_bpm_diff: 15.0,
            drop_energy_gap: 0.3,
            echo_crossfade: 2.0,
            drop_gap: 0.5,
        }
    }
}

impl TransitionConfig {
    pub fn with_time_stretch(mut self, enabled: bool) -> Self {
        self.time_stretch = enabled;
        self
    }

    pub fn with_max_crossfade(mut self, seconds: f64) -> Self {
        self.max_crossfade = seconds;
        self
    }

    /// Phrase length for a genre; the longest matching keyword wins
    pub fn phrase_bars_for(&self, genre: Option<&str>) -> u32 {
        lookup(&self.genre_phrase_bars, genre).unwrap_or(self.phrase_bars)
    }

    /// Base crossfade length in bars for a genre
    pub fn crossfade_bars_for(&self, genre: Option<&str>) -> u32 {
        lookup(&self.genre_crossfade_bars, genre).unwrap_or(self.crossfade_bars)
    }
}

fn lookup(table: &BTreeMap<String, u32>, genre: Option<&str>) -> Option<u32> {
    let genre = genre?.to_lowercase();
    table
        .iter()
        .filter(|(keyword, _)| genre.contains(keyword.as_str()))
        .max_by_key(|(keyword, _)| keyword.len())
        .map(|(_, bars)| *bars)
}
