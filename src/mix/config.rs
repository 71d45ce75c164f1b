//! Top-level configuration, loadable from TOML

use crate::analysis::AnalysisConfig;
use crate::error::ConfigError;
use crate::render::RenderConfig;
use crate::sequence::SequencerConfig;
use crate::transition::TransitionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every section is optional; missing keys keep their defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    pub analysis: AnalysisConfig,
    pub sequencing: SequencerConfig,
    pub transitions: TransitionConfig,
    pub render: RenderConfig,
    /// Analysis worker threads; 0 uses one per CPU core
    pub workers: usize,
}

impl MixConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    pub fn with_transitions(mut self, transitions: TransitionConfig) -> Self {
        self.transitions = transitions;
        self
    }

    /// Resolved size of the analysis pool
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

pub fn load_config(path: &Path) -> Result<MixConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Loaded config from {:?}", path);
    Ok(config)
}
