//! Error taxonomy
//!
//! Per-track and per-transition failures are recovered by the caller;
//! only whole-job-blocking conditions surface as a failed job.

use std::path::PathBuf;
use thiserror::Error;

/// Feature extraction failure for a single file. The track is skipped.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("unreadable audio file {path:?}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("unsupported audio format {path:?}: {reason}")]
    Unsupported { path: PathBuf, reason: String },

    #[error("audio too short for analysis {path:?}: {duration:.1}s")]
    TooShort { path: PathBuf, duration: f64 },
}

impl AnalysisError {
    pub fn path(&self) -> &PathBuf {
        match self {
            AnalysisError::Unreadable { path, .. }
            | AnalysisError::Unsupported { path, .. }
            | AnalysisError::TooShort { path, .. } => path,
        }
    }
}

/// Sequencing cannot start
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("need at least 2 tracks to build a mix, found {found}")]
    InsufficientTracks { found: usize },
}

/// Plan editing failure
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error("track position {index} out of range for a plan of {len} tracks")]
    OutOfRange { index: usize, len: usize },
}

/// Failure of the external audio-processing engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} timed out after {seconds:.0}s")]
    TimedOut { program: String, seconds: f64 },

    #[error("probe failed for {path:?}: {reason}")]
    Probe { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render job failure
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("need at least 2 playable tracks, {found} remained after validation")]
    InsufficientTracks { found: usize },

    /// One pairwise step failed; recovered with an un-mixed concatenation
    #[error("transition {index} ({from} -> {to}) failed: {source}")]
    Step {
        index: usize,
        from: String,
        to: String,
        #[source]
        source: EngineError,
    },

    #[error("render failed: {0}")]
    Fatal(String),

    #[error("render cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SequenceError> for RenderError {
    fn from(err: SequenceError) -> Self {
        match err {
            SequenceError::InsufficientTracks { found } => RenderError::InsufficientTracks { found },
        }
    }
}

/// Configuration file problem
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
