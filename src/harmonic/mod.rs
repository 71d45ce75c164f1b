//! Harmonic model
//!
//! Stateless scoring over `(key, bpm, energy)` pairs, shared by the
//! sequencer and the transition selector.

mod bpm;
mod camelot;
mod score;

pub use bpm::{
    bpm_points, effective_bpm_diff, genre_tolerance, is_bpm_compatible, pair_tolerance,
    DEFAULT_TOLERANCE,
};
pub use camelot::{classify, compatible_neighbours, distance, KeyClass};
pub use score::{energy_points, score_tracks, score_transition, TrackProfile, TransitionScore};
