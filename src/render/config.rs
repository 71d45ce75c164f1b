use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Integrated loudness target applied to every track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoudnessTarget {
    /// LUFS
    pub integrated: f64,
    /// dBTP
    pub true_peak: f64,
    pub range: f64,
}

impl Default for LoudnessTarget {
    fn default() -> Self {
        Self {
            integrated: -14.0,
            true_peak: -1.0,
            range: 11.0,
        }
    }
}

/// Resource caps for each engine invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// ffmpeg `-threads`
    pub threads: u32,
    /// Run under `nice -n <value>` when set
    pub niceness: Option<i32>,
    /// Run under `cpulimit -l <percent>` when set
    pub cpu_limit_percent: Option<u32>,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            niceness: Some(10),
            cpu_limit_percent: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub loudness: LoudnessTarget,
    /// Sample rate of intermediates and output
    pub sample_rate: u32,
    pub channels: u32,
    /// Wall-clock limit per engine invocation (seconds)
    pub step_timeout: f64,
    /// Parent directory for per-job scratch space; system temp when unset
    pub work_dir: Option<PathBuf>,
    pub throttle: ThrottleConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            loudness: LoudnessTarget::default(),
            sample_rate: 44_100,
            channels: 2,
            step_timeout: 300.0,
            work_dir: None,
            throttle: ThrottleConfig::default(),
        }
    }
}

impl RenderConfig {
    pub fn with_step_timeout(mut self, seconds: f64) -> Self {
        self.step_timeout = seconds;
        self
    }

    pub fn with_work_dir(mut self, dir: PathBuf) -> Self {
        self.work_dir = Some(dir);
        self
    }

    pub fn with_cpu_limit(mut self, percent: Option<u32>) -> Self {
        self.throttle.cpu_limit_percent = percent;
        self
    }
}
