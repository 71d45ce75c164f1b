use super::plan::{MixPlan, Transition};
use super::track::MixTrack;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Output container/codec of the final mix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mp3,
    Wav,
    Flac,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
            OutputFormat::Flac => "flac",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mp3" => Ok(OutputFormat::Mp3),
            "wav" => Ok(OutputFormat::Wav),
            "flac" => Ok(OutputFormat::Flac),
            other => Err(format!("unsupported output format: {:?}", other)),
        }
    }
}

/// Encoding quality of the final transcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    High,
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Quality::Low),
            "medium" => Ok(Quality::Medium),
            "high" => Ok(Quality::High),
            other => Err(format!("unknown quality: {:?}", other)),
        }
    }
}

/// One render request
#[derive(Debug, Clone)]
pub struct MixJob {
    pub id: String,
    /// Tracks in play order
    pub tracks: Vec<MixTrack>,
    /// Precomputed transitions; pairs without one are selected at render time
    pub transitions: Vec<Transition>,
    pub output_path: PathBuf,
    pub format: OutputFormat,
    pub quality: Quality,
}

impl MixJob {
    pub fn new(id: &str, tracks: Vec<MixTrack>, output_path: PathBuf) -> Self {
        let format = output_path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
            .unwrap_or(OutputFormat::Mp3);
        Self {
            id: id.to_string(),
            tracks,
            transitions: Vec::new(),
            output_path,
            format,
            quality: Quality::High,
        }
    }

    /// Job rendering an existing plan
    pub fn from_plan(plan: &MixPlan, output_path: PathBuf) -> Self {
        let mut job = Self::new(&plan.id, plan.tracks.clone(), output_path);
        job.transitions = plan.transitions.clone();
        job
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }
}

/// Outcome of a render job
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MixResult {
    pub success: bool,
    pub output_path: Option<PathBuf>,
    /// Measured from the output file
    pub duration: Option<f64>,
    pub transition_count: usize,
    pub avg_transition_score: f64,
    /// Fraction (0..1) of harmonically compatible transitions
    pub harmonic_mix_percentage: f64,
    /// Tracks dropped during validation, as "path: reason"
    pub skipped_tracks: Vec<String>,
    /// Quality degradations, e.g. transitions rendered as plain cuts
    pub degradations: Vec<String>,
    pub error_message: Option<String>,
}

impl MixResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Render job state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStage {
    Pending,
    Analyzing,
    Processing,
    Rendering,
    Complete,
    Failed,
}

impl JobStage {
    /// Whether the state machine allows `self -> next`
    pub fn can_advance_to(&self, next: JobStage) -> bool {
        use JobStage::*;
        match (self, next) {
            (Pending, Analyzing) => true,
            (Analyzing, Processing) => true,
            (Processing, Rendering) => true,
            (Rendering, Complete) => true,
            (Complete, _) | (Failed, _) => false,
            (_, Failed) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Complete | JobStage::Failed)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::Pending => "pending",
            JobStage::Analyzing => "analyzing",
            JobStage::Processing => "processing",
            JobStage::Rendering => "rendering",
            JobStage::Complete => "complete",
            JobStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Snapshot pushed to the job status sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixJobStatus {
    pub id: String,
    pub status: JobStage,
    /// 0..=100
    pub progress: u8,
    pub progress_message: String,
    pub result: Option<MixResult>,
    pub error: Option<String>,
}
