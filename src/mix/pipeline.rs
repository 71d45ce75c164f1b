//! End-to-end orchestration: pool analysis, planning, rendering

use super::config::MixConfig;
use crate::analysis::{merge_external, AnalysisCache, AnalysisHints, AnalysisProvider, AudioAnalyzer, CacheKey};
use crate::error::{AnalysisError, SequenceError};
use crate::library::PoolEntry;
use crate::model::{MixPlan, MixTrack, TrackAnalysis};
use crate::render::{AudioEngine, MixRenderer};
use crate::sequence::{MixConstraints, Sequencer};
use crate::transition::TransitionSelector;
use rayon::prelude::*;

/// Analysis, sequencing and transition selection over one configuration
pub struct MixPipeline<A: AudioAnalyzer> {
    config: MixConfig,
    analyzer: A,
    cache: Option<Box<dyn AnalysisCache>>,
    provider: Option<Box<dyn AnalysisProvider>>,
}

impl<A: AudioAnalyzer> MixPipeline<A> {
    pub fn new(config: MixConfig, analyzer: A) -> Self {
        Self {
            config,
            analyzer,
            cache: None,
            provider: None,
        }
    }

    pub fn with_cache(mut self, cache: Box<dyn AnalysisCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_provider(mut self, provider: Box<dyn AnalysisProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &MixConfig {
        &self.config
    }

    pub fn sequencer(&self) -> Sequencer {
        Sequencer::new(self.config.sequencing.clone())
    }

    pub fn selector(&self) -> TransitionSelector {
        TransitionSelector::new(self.config.transitions.clone())
    }

    /// Analyze the pool on a bounded worker pool. Files that fail analysis
    /// are logged and left out; input order is kept.
    pub fn analyze_pool(&self, entries: &[PoolEntry]) -> Vec<MixTrack> {
        let workers = self.config.worker_count();
        log::info!("Analyzing {} tracks on {} workers", entries.len(), workers);

        let analyze = || -> Vec<Option<MixTrack>> {
            entries.par_iter().map(|entry| self.analyze_entry(entry)).collect()
        };
        let results = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(analyze),
            Err(e) => {
                log::warn!("Could not build analysis pool ({}), using the global one", e);
                analyze()
            }
        };

        let tracks: Vec<MixTrack> = results.into_iter().flatten().collect();
        if tracks.len() < entries.len() {
            log::warn!(
                "{} of {} tracks could not be analyzed",
                entries.len() - tracks.len(),
                entries.len()
            );
        }
        tracks
    }

    /// Analyze one file, going through the cache and the external provider
    pub fn analyze_entry(&self, entry: &PoolEntry) -> Option<MixTrack> {
        match self.analysis_for(entry) {
            Ok(analysis) => {
                let track = MixTrack::new(
                    entry.path.clone(),
                    &entry.tags.artist,
                    &entry.tags.title,
                    analysis,
                )
                .with_genre(entry.tags.genre.clone());
                Some(self.enrich(track))
            }
            Err(e) => {
                log::warn!("Skipping {:?}: {}", e.path(), e);
                None
            }
        }
    }

    fn analysis_for(&self, entry: &PoolEntry) -> Result<TrackAnalysis, AnalysisError> {
        let key = self
            .cache
            .as_ref()
            .and_then(|_| CacheKey::for_file(&entry.path, &self.analyzer.fingerprint()));

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(analysis) = cache.get(key) {
                log::debug!("Cache hit for {:?}", entry.path);
                return Ok(analysis);
            }
        }

        let hints = AnalysisHints::with_bpm(entry.tags.bpm);
        let analysis = self.analyzer.analyze(&entry.path, &hints)?;
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            cache.put(key, &analysis);
        }
        Ok(analysis)
    }

    /// Let the external provider's grid take priority when it answers
    fn enrich(&self, mut track: MixTrack) -> MixTrack {
        let Some(provider) = &self.provider else {
            return track;
        };
        match provider.fetch(&track) {
            Some(external) => {
                log::debug!("Using external analysis for {}", track.display_name());
                track.analysis =
                    merge_external(&track.analysis, &external, &self.config.analysis.mix_points);
                track.bpm = track.analysis.bpm;
                track
            }
            None => track,
        }
    }

    pub fn plan(
        &self,
        id: &str,
        tracks: Vec<MixTrack>,
        constraints: Option<&MixConstraints>,
    ) -> Result<MixPlan, SequenceError> {
        MixPlan::build(id, tracks, constraints, &self.sequencer(), &self.selector())
    }

    /// Renderer sharing this pipeline's render and transition settings
    pub fn renderer<E: AudioEngine>(&self, engine: E) -> MixRenderer<E> {
        MixRenderer::new(engine, self.config.render.clone()).with_selector(self.selector())
    }
}
