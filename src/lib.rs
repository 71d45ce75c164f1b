//! Mixwright - offline DJ mix engine
//!
//! Analyzes a pool of audio files (tempo, key, energy, structure), orders
//! them along an energy curve with harmonic and tempo compatibility, picks a
//! transition technique for every pair and renders the continuous mix
//! through ffmpeg.

pub mod analysis;
pub mod error;
pub mod harmonic;
pub mod library;
pub mod mix;
pub mod model;
pub mod render;
pub mod sequence;
pub mod transition;

pub use mix::{load_config, MixConfig, MixPipeline};
pub use model::{MixJob, MixPlan, MixResult, MixTrack, Transition, TransitionType};
