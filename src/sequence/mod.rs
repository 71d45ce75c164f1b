//! Track sequencing
//!
//! Orders an analyzed pool into a single path that follows a target energy
//! curve while keeping neighbours harmonically and rhythmically compatible.

mod config;
mod constraints;
mod curve;
mod sequencer;

pub use config::{SeedStrategy, SequencerConfig};
pub use constraints::MixConstraints;
pub use curve::EnergyCurve;
pub use sequencer::Sequencer;
