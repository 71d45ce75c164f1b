//! Seam to the external audio-processing engine

use super::filters::FilterGraph;
use crate::error::EngineError;
use crate::model::{OutputFormat, Quality};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One engine run: decode inputs, apply a graph, encode one output
#[derive(Debug, Clone)]
pub struct EngineInvocation {
    pub inputs: Vec<PathBuf>,
    /// `None` for a plain transcode
    pub filter: Option<FilterGraph>,
    pub codec_args: Vec<String>,
    pub output: PathBuf,
    /// Length the output should have, when known
    pub expected_duration: Option<f64>,
    /// Short description for logs
    pub label: String,
}

/// Decodes, mixes and encodes audio on behalf of the renderer
pub trait AudioEngine: Send + Sync {
    /// Duration in seconds of a decodable file
    fn probe_duration(&self, path: &Path) -> Result<f64, EngineError>;

    /// Run one invocation to completion or until `timeout` elapses
    fn run(&self, invocation: &EngineInvocation, timeout: Duration) -> Result<(), EngineError>;
}

/// Cooperative cancellation, checked between render steps
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Codec arguments for lossless intermediates between steps
pub fn intermediate_codec(sample_rate: u32, channels: u32) -> Vec<String> {
    vec![
        "-c:a".into(),
        "pcm_s24le".into(),
        "-ar".into(),
        sample_rate.to_string(),
        "-ac".into(),
        channels.to_string(),
    ]
}

/// Codec arguments for the final output
pub fn output_codec(format: OutputFormat, quality: Quality, sample_rate: u32, channels: u32) -> Vec<String> {
    let mut args: Vec<String> = match format {
        OutputFormat::Mp3 => {
            let bitrate = match quality {
                Quality::Low => "128k",
                Quality::Medium => "192k",
                Quality::High => "320k",
            };
            vec!["-c:a".into(), "libmp3lame".into(), "-b:a".into(), bitrate.into()]
        }
        OutputFormat::Flac => {
            let level = match quality {
                Quality::Low => "0",
                Quality::Medium => "5",
                Quality::High => "8",
            };
            vec!["-c:a".into(), "flac".into(), "-compression_level".into(), level.into()]
        }
        OutputFormat::Wav => vec!["-c:a".into(), "pcm_s16le".into()],
    };
    args.extend([
        "-ar".to_string(),
        sample_rate.to_string(),
        "-ac".to_string(),
        channels.to_string(),
    ]);
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_output_codec() {
        let args = output_codec(OutputFormat::Mp3, Quality::Medium, 44100, 2);
        assert_eq!(args[..4], ["-c:a", "libmp3lame", "-b:a", "192k"]);
        let args = output_codec(OutputFormat::Wav, Quality::High, 48000, 2);
        assert!(args.contains(&"48000".to_string()));
    }
}
