//! Orchestration of the whole mixing flow
//!
//! Configuration, plan building and editing, and the pipeline tying the
//! track pool, analysis, sequencing and rendering together.

mod config;
mod pipeline;
mod planner;

pub use config::{load_config, MixConfig};
pub use pipeline::MixPipeline;
