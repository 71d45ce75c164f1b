//! Unified data model for mix planning and rendering
//!
//! These types flow from the feature extractor through sequencing and
//! transition selection to the renderer.

mod analysis;
mod job;
mod key;
mod plan;
mod track;

pub use analysis::{Segment, SegmentKind, TrackAnalysis};
pub use job::{JobStage, MixJob, MixJobStatus, MixResult, OutputFormat, Quality};
pub use key::{CamelotKey, CamelotLetter, Mode, MusicalKey};
pub use plan::{MixPlan, Transition, TransitionType};
pub use track::MixTrack;
