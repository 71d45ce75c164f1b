//! Mix rendering over an external audio engine
//!
//! Transitions become declarative filter graphs; an [`AudioEngine`] does the
//! decoding, mixing and encoding.

mod config;
mod effects;
mod engine;
mod ffmpeg;
mod filters;
mod layout;
mod progress;
mod renderer;

pub use config::{LoudnessTarget, RenderConfig, ThrottleConfig};
pub use effects::{fallback_concat, first_track, transition_graph, OUTPUT_LABEL};
pub use engine::{intermediate_codec, output_codec, AudioEngine, CancelToken, EngineInvocation};
pub use ffmpeg::FfmpegEngine;
pub use filters::{Chain, FadeCurve, Filter, FilterGraph, Timeline};
pub use layout::{estimate_total, LayoutParams, StepLayout, MIN_OVERLAP};
pub use progress::{JobStatusTracker, NoProgress, ProgressReporter, ProgressUpdate};
pub use renderer::{MixRenderer, RenderedSegment};
