//! Transition selection
//!
//! Picks a technique for every adjacent pair and aligns its mix points to
//! beats and phrases.

mod config;
mod selector;
mod snap;

pub use config::TransitionConfig;
pub use selector::TransitionSelector;
pub use snap::{fit_to_leads, phrase_boundaries, snap_to_beat, snap_to_phrase};
