//! Sequential pairwise mix renderer
//!
//! A job walks `Pending -> Analyzing -> Processing -> Rendering -> Complete`,
//! or ends in `Failed`. Processing is a fold over the ordered tracks: the
//! accumulator is the running mix, written as a lossless intermediate into a
//! per-job scratch directory that is removed however the job ends.

use super::config::RenderConfig;
use super::effects::{fallback_concat, first_track, transition_graph};
use super::engine::{intermediate_codec, output_codec, AudioEngine, CancelToken, EngineInvocation};
use super::layout::{LayoutParams, StepLayout};
use super::progress::{ProgressReporter, ProgressUpdate};
use crate::error::RenderError;
use crate::model::{JobStage, MixJob, MixResult, MixTrack, Transition};
use crate::transition::TransitionSelector;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const VALIDATE_PERCENT: u8 = 20;
const PROCESS_PERCENT: u8 = 90;

/// The running mix after a step
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSegment {
    pub path: PathBuf,
    /// Length in output seconds
    pub duration: f64,
    /// Output time at which the last track's source time 0 sits
    pub offset: f64,
    /// Playback rate of the last track
    pub tempo_ratio: f64,
}

/// A track that passed validation, with its probed length
#[derive(Debug, Clone, Copy)]
struct PlayableTrack<'a> {
    track: &'a MixTrack,
    duration: f64,
}

pub struct MixRenderer<E> {
    engine: E,
    config: RenderConfig,
    selector: TransitionSelector,
}

impl<E: AudioEngine> MixRenderer<E> {
    pub fn new(engine: E, config: RenderConfig) -> Self {
        Self {
            engine,
            config,
            selector: TransitionSelector::default(),
        }
    }

    /// Selector used for pairs the job has no transition for
    pub fn with_selector(mut self, selector: TransitionSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render a job to its output file. Never panics or returns an error:
    /// failures are reported in the result and through `progress`.
    pub fn render(
        &self,
        job: &MixJob,
        progress: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> MixResult {
        log::info!(
            "Rendering job {} ({} tracks) to {:?}",
            job.id,
            job.tracks.len(),
            job.output_path
        );
        progress.report(ProgressUpdate::new(JobStage::Analyzing, 0, "validating tracks"));

        let mut result = MixResult::default();
        match self.run(job, &mut result, progress, cancel) {
            Ok(()) => {
                result.success = true;
                log::info!(
                    "Job {} complete: {:.1}s, {} transitions, avg score {:.1}, {:.0}% harmonic",
                    job.id,
                    result.duration.unwrap_or(0.0),
                    result.transition_count,
                    result.avg_transition_score,
                    result.harmonic_mix_percentage * 100.0
                );
                progress.report(ProgressUpdate::new(JobStage::Complete, 100, "mix complete"));
            }
            Err(err) => {
                log::error!("Job {} failed: {}", job.id, err);
                result.success = false;
                result.output_path = None;
                result.duration = None;
                result.error_message = Some(err.to_string());
                progress.report(ProgressUpdate::new(JobStage::Failed, 100, err.to_string()));
            }
        }
        result
    }

    fn run(
        &self,
        job: &MixJob,
        result: &mut MixResult,
        progress: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<(), RenderError> {
        let playable = self.validate(&job.tracks, result, progress);
        if playable.len() < 2 {
            return Err(RenderError::InsufficientTracks {
                found: playable.len(),
            });
        }
        check_cancel(cancel)?;

        let transitions = self.resolve_transitions(job, &playable);
        let work_dir = self.work_dir()?;
        progress.report(ProgressUpdate::new(
            JobStage::Processing,
            VALIDATE_PERCENT,
            format!("mixing {} tracks", playable.len()),
        ));

        let first = self.render_first(&playable[0], work_dir.path(), result)?;
        let steps = transitions.len();
        let mut applied: Vec<&Transition> = Vec::with_capacity(steps);

        let mix = transitions
            .iter()
            .zip(playable.windows(2))
            .enumerate()
            .try_fold(first, |current, (index, (transition, pair))| {
                check_cancel(cancel)?;
                let step = self.render_step(
                    index,
                    &current,
                    transition,
                    &pair[0],
                    &pair[1],
                    work_dir.path(),
                );
                let next = match step {
                    Ok(next) => {
                        applied.push(transition);
                        next
                    }
                    Err(err @ RenderError::Step { .. }) => {
                        log::warn!("{}; concatenating instead", err);
                        result
                            .degradations
                            .push(format!("{}; rendered as a plain cut", err));
                        self.render_fallback(index, &current, &pair[1], work_dir.path())?
                    }
                    Err(err) => return Err(err),
                };
                discard(&current.path);
                progress.report(ProgressUpdate::new(
                    JobStage::Processing,
                    scaled(index + 1, steps, VALIDATE_PERCENT, PROCESS_PERCENT),
                    format!(
                        "transition {}/{}: {}",
                        index + 1,
                        steps,
                        pair[1].track.display_name()
                    ),
                ));
                Ok(next)
            })?;

        check_cancel(cancel)?;
        progress.report(ProgressUpdate::new(
            JobStage::Rendering,
            PROCESS_PERCENT,
            format!("encoding {}", job.format.extension()),
        ));
        let duration = self.transcode(&mix, job)?;

        result.output_path = Some(job.output_path.clone());
        result.duration = Some(duration);
        result.transition_count = applied.len();
        if !applied.is_empty() {
            let count = applied.len() as f64;
            result.avg_transition_score = applied.iter().map(|t| t.score).sum::<f64>() / count;
            result.harmonic_mix_percentage =
                applied.iter().filter(|t| t.harmonic).count() as f64 / count;
        }

        let scratch = work_dir.path().to_path_buf();
        if let Err(e) = work_dir.close() {
            log::warn!("Failed to remove scratch directory {:?}: {}", scratch, e);
        }
        Ok(())
    }

    /// Probe every track; unreadable ones are dropped from the job
    fn validate<'a>(
        &self,
        tracks: &'a [MixTrack],
        result: &mut MixResult,
        progress: &dyn ProgressReporter,
    ) -> Vec<PlayableTrack<'a>> {
        let total = tracks.len();
        tracks
            .iter()
            .enumerate()
            .filter_map(|(i, track)| {
                progress.report(ProgressUpdate::new(
                    JobStage::Analyzing,
                    scaled(i, total, 0, VALIDATE_PERCENT),
                    format!("checking {}", track.display_name()),
                ));
                match self.engine.probe_duration(&track.file_path) {
                    Ok(duration) => Some(PlayableTrack { track, duration }),
                    Err(e) => {
                        log::warn!("Skipping {:?}: {}", track.file_path, e);
                        result
                            .skipped_tracks
                            .push(format!("{}: {}", track.file_path.display(), e));
                        None
                    }
                }
            })
            .collect()
    }

    /// The job's transition for each playable pair, selected afresh where the
    /// job has none (e.g. a skipped track joined its neighbours)
    fn resolve_transitions(&self, job: &MixJob, playable: &[PlayableTrack<'_>]) -> Vec<Transition> {
        playable
            .windows(2)
            .map(|pair| {
                let (from, to) = (pair[0].track, pair[1].track);
                job.transitions
                    .iter()
                    .find(|t| t.from_track_id == from.id && t.to_track_id == to.id)
                    .cloned()
                    .unwrap_or_else(|| {
                        log::debug!(
                            "No planned transition {} -> {}, selecting one",
                            from.display_name(),
                            to.display_name()
                        );
                        self.selector.select(from, to)
                    })
            })
            .collect()
    }

    fn work_dir(&self) -> Result<TempDir, RenderError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("mixwright-");
        let dir = match &self.config.work_dir {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        log::debug!("Scratch directory {:?}", dir.path());
        Ok(dir)
    }

    fn render_first(
        &self,
        first: &PlayableTrack<'_>,
        work: &Path,
        result: &mut MixResult,
    ) -> Result<RenderedSegment, RenderError> {
        let output = work.join("mix_000.wav");
        let invocation = EngineInvocation {
            inputs: vec![first.track.file_path.clone()],
            filter: Some(first_track(&self.config)),
            codec_args: intermediate_codec(self.config.sample_rate, self.config.channels),
            output: output.clone(),
            expected_duration: Some(first.duration),
            label: format!("normalize {}", first.track.display_name()),
        };
        if let Err(err) = self.engine.run(&invocation, self.timeout()) {
            log::warn!(
                "Normalizing {} failed ({}), decoding it as is",
                first.track.display_name(),
                err
            );
            result.degradations.push(format!(
                "{}: loudness normalization skipped ({})",
                first.track.display_name(),
                err
            ));
            // a killed run may still hold its output, so the retry writes elsewhere
            let plain = EngineInvocation {
                filter: None,
                output: work.join("mix_000_plain.wav"),
                ..invocation
            };
            self.engine.run(&plain, self.timeout()).map_err(|e| {
                RenderError::Fatal(format!(
                    "cannot decode first track {}: {}",
                    first.track.display_name(),
                    e
                ))
            })?;
            return Ok(RenderedSegment {
                duration: self.measure(&plain.output, first.duration),
                path: plain.output,
                offset: 0.0,
                tempo_ratio: 1.0,
            });
        }
        Ok(RenderedSegment {
            duration: self.measure(&output, first.duration),
            path: output,
            offset: 0.0,
            tempo_ratio: 1.0,
        })
    }

    fn render_step(
        &self,
        index: usize,
        current: &RenderedSegment,
        transition: &Transition,
        from: &PlayableTrack<'_>,
        to: &PlayableTrack<'_>,
        work: &Path,
    ) -> Result<RenderedSegment, RenderError> {
        let params = LayoutParams::from(self.selector.config());
        let layout = StepLayout::compute(
            current.duration,
            current.offset,
            current.tempo_ratio,
            transition,
            to.duration,
            &params,
        );
        let beat_seconds = if from.track.bpm > 0.0 {
            60.0 / from.track.bpm
        } else {
            0.5
        };
        log::info!(
            "Step {}: {} -> {} ({}, cut at {:.1}s, {:.1}s overlap)",
            index + 1,
            from.track.display_name(),
            to.track.display_name(),
            transition.kind,
            layout.head_end,
            layout.overlap
        );

        let output = work.join(format!("mix_{:03}.wav", index + 1));
        let expected = layout.expected_duration();
        let invocation = EngineInvocation {
            inputs: vec![current.path.clone(), to.track.file_path.clone()],
            filter: Some(transition_graph(transition.kind, &layout, &self.config, beat_seconds)),
            codec_args: intermediate_codec(self.config.sample_rate, self.config.channels),
            output: output.clone(),
            expected_duration: Some(expected),
            label: format!("transition {}", index + 1),
        };
        self.engine
            .run(&invocation, self.timeout())
            .map_err(|source| RenderError::Step {
                index: index + 1,
                from: from.track.display_name(),
                to: to.track.display_name(),
                source,
            })?;

        Ok(RenderedSegment {
            duration: self.measure(&output, expected),
            path: output,
            offset: layout.next_offset(),
            tempo_ratio: layout.tempo_ratio,
        })
    }

    /// Running mix followed by the whole incoming track, un-mixed
    fn render_fallback(
        &self,
        index: usize,
        current: &RenderedSegment,
        to: &PlayableTrack<'_>,
        work: &Path,
    ) -> Result<RenderedSegment, RenderError> {
        let output = work.join(format!("mix_{:03}_cut.wav", index + 1));
        let expected = current.duration + to.duration;
        let invocation = EngineInvocation {
            inputs: vec![current.path.clone(), to.track.file_path.clone()],
            filter: Some(fallback_concat(&self.config)),
            codec_args: intermediate_codec(self.config.sample_rate, self.config.channels),
            output: output.clone(),
            expected_duration: Some(expected),
            label: format!("concat {}", index + 1),
        };
        self.engine.run(&invocation, self.timeout()).map_err(|e| {
            RenderError::Fatal(format!(
                "fallback concatenation of {} failed: {}",
                to.track.display_name(),
                e
            ))
        })?;
        Ok(RenderedSegment {
            duration: self.measure(&output, expected),
            path: output,
            offset: current.duration,
            tempo_ratio: 1.0,
        })
    }

    /// Final encode; the returned duration is measured from the output file
    fn transcode(&self, mix: &RenderedSegment, job: &MixJob) -> Result<f64, RenderError> {
        if let Some(parent) = job.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let invocation = EngineInvocation {
            inputs: vec![mix.path.clone()],
            filter: None,
            codec_args: output_codec(
                job.format,
                job.quality,
                self.config.sample_rate,
                self.config.channels,
            ),
            output: job.output_path.clone(),
            expected_duration: Some(mix.duration),
            label: format!("encode {}", job.format.extension()),
        };
        if let Err(e) = self.engine.run(&invocation, self.timeout()) {
            discard(&job.output_path);
            return Err(RenderError::Fatal(format!("final transcode failed: {}", e)));
        }
        self.engine.probe_duration(&job.output_path).map_err(|e| {
            discard(&job.output_path);
            RenderError::Fatal(format!("cannot measure rendered mix: {}", e))
        })
    }

    /// Probed length of an intermediate, or the layout's estimate
    fn measure(&self, path: &Path, expected: f64) -> f64 {
        match self.engine.probe_duration(path) {
            Ok(duration) => {
                if (duration - expected).abs() > 1.0 {
                    log::debug!(
                        "{:?}: expected {:.2}s, measured {:.2}s",
                        path,
                        expected,
                        duration
                    );
                }
                duration
            }
            Err(e) => {
                log::debug!("Could not probe {:?} ({}), assuming {:.2}s", path, e, expected);
                expected
            }
        }
    }

    fn timeout(&self) -> Duration {
        let seconds = self.config.step_timeout;
        if seconds.is_finite() && seconds > 0.0 {
            Duration::from_secs_f64(seconds.min(86_400.0))
        } else {
            Duration::from_secs(300)
        }
    }
}

fn check_cancel(cancel: &CancelToken) -> Result<(), RenderError> {
    if cancel.is_cancelled() {
        Err(RenderError::Cancelled)
    } else {
        Ok(())
    }
}

fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::debug!("Could not remove {:?}: {}", path, e);
        }
    }
}

/// `done / total` mapped onto `from..=to`
fn scaled(done: usize, total: usize, from: u8, to: u8) -> u8 {
    if total == 0 {
        return to;
    }
    let span = (to - from) as usize;
    from + (span * done.min(total) / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::model::{TrackAnalysis, TransitionType};
    use crate::render::progress::{JobStatusTracker, NoProgress};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Writes each output as a text file holding its expected duration
    #[derive(Default)]
    struct FakeEngine {
        sources: HashMap<PathBuf, f64>,
        failing: Vec<String>,
        runs: Mutex<Vec<EngineInvocation>>,
    }

    impl FakeEngine {
        fn with_source(mut self, path: &str, duration: f64) -> Self {
            self.sources.insert(PathBuf::from(path), duration);
            self
        }

        fn failing(mut self, label: &str) -> Self {
            self.failing.push(label.to_string());
            self
        }
    }

    impl AudioEngine for FakeEngine {
        fn probe_duration(&self, path: &Path) -> Result<f64, EngineError> {
            if let Some(duration) = self.sources.get(path) {
                return Ok(*duration);
            }
            std::fs::read_to_string(path)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| EngineError::Probe {
                    path: path.to_path_buf(),
                    reason: "not audio".into(),
                })
        }

        fn run(&self, invocation: &EngineInvocation, _timeout: Duration) -> Result<(), EngineError> {
            self.runs.lock().unwrap().push(invocation.clone());
            if self.failing.iter().any(|l| invocation.label.starts_with(l.as_str())) {
                return Err(EngineError::Failed {
                    program: "fake".into(),
                    status: "exit status: 1".into(),
                    stderr: "boom".into(),
                });
            }
            std::fs::write(
                &invocation.output,
                invocation.expected_duration.unwrap_or(0.0).to_string(),
            )?;
            Ok(())
        }
    }

    fn track(path: &str, duration: f64) -> MixTrack {
        MixTrack::new(
            PathBuf::from(path),
            "Artist",
            path,
            TrackAnalysis::from_metadata(duration, 128.0, None, 5),
        )
    }

    fn crossfade(from: &MixTrack, to: &MixTrack) -> Transition {
        Transition {
            from_track_id: from.id.clone(),
            to_track_id: to.id.clone(),
            kind: TransitionType::Crossfade,
            duration: 8.0,
            mix_out_point: 170.0,
            mix_in_point: 10.0,
            bpm_adjustment: 0.0,
            score: 90.0,
            harmonic: true,
            notes: String::new(),
        }
    }

    fn setup(engine: FakeEngine) -> (TempDir, MixRenderer<FakeEngine>) {
        let temp = TempDir::new().unwrap();
        let config = RenderConfig::default().with_work_dir(temp.path().join("work"));
        (temp, MixRenderer::new(engine, config))
    }

    fn scratch_is_empty(temp: &TempDir) -> bool {
        std::fs::read_dir(temp.path().join("work"))
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }

    #[test]
    fn test_two_track_mix_duration() {
        let engine = FakeEngine::default()
            .with_source("/music/a.mp3", 180.0)
            .with_source("/music/b.mp3", 200.0);
        let (temp, renderer) = setup(engine);
        let a = track("/music/a.mp3", 180.0);
        let b = track("/music/b.mp3", 200.0);
        let mut job = MixJob::new("job", vec![a.clone(), b.clone()], temp.path().join("mix.mp3"));
        job.transitions = vec![crossfade(&a, &b)];

        let result = renderer.render(&job, &NoProgress, &CancelToken::new());
        assert!(result.success, "{:?}", result.error_message);
        let duration = result.duration.unwrap();
        assert!((duration - 368.0).abs() <= 1.0, "{}", duration);
        assert_eq!(result.transition_count, 1);
        assert_eq!(result.avg_transition_score, 90.0);
        assert_eq!(result.harmonic_mix_percentage, 1.0);
        assert!(temp.path().join("mix.mp3").exists());
        assert!(scratch_is_empty(&temp));

        let runs = renderer.engine().runs.lock().unwrap();
        assert_eq!(runs.len(), 3);
        let graph = runs[1].filter.as_ref().unwrap().to_string();
        assert!(graph.contains("atrim=end=178.000"));
        assert!(graph.contains("acrossfade=d=8.000"));
        assert!(runs[2].filter.is_none());
    }

    #[test]
    fn test_failed_step_falls_back_to_concat() {
        let engine = FakeEngine::default()
            .with_source("/music/a.mp3", 180.0)
            .with_source("/music/b.mp3", 200.0)
            .failing("transition 1");
        let (temp, renderer) = setup(engine);
        let a = track("/music/a.mp3", 180.0);
        let b = track("/music/b.mp3", 200.0);
        let mut job = MixJob::new("job", vec![a.clone(), b.clone()], temp.path().join("mix.wav"));
        job.transitions = vec![crossfade(&a, &b)];

        let result = renderer.render(&job, &NoProgress, &CancelToken::new());
        assert!(result.success);
        assert!(result.error_message.is_none());
        assert_eq!(result.degradations.len(), 1);
        assert_eq!(result.transition_count, 0);
        assert_eq!(result.duration, Some(380.0));
        assert!(scratch_is_empty(&temp));

        // the fallback never shares a path with the step it replaces
        let runs = renderer.engine().runs.lock().unwrap();
        let step = runs.iter().find(|r| r.label == "transition 1").unwrap();
        let cut = runs.iter().find(|r| r.label == "concat 1").unwrap();
        assert_ne!(step.output, cut.output);
        assert_eq!(runs.last().unwrap().inputs, vec![cut.output.clone()]);
    }

    #[test]
    fn test_unreadable_track_is_skipped() {
        let engine = FakeEngine::default()
            .with_source("/music/a.mp3", 180.0)
            .with_source("/music/c.mp3", 200.0);
        let (temp, renderer) = setup(engine);
        let tracks = vec![
            track("/music/a.mp3", 180.0),
            track("/music/b.mp3", 190.0),
            track("/music/c.mp3", 200.0),
        ];
        let job = MixJob::new("job", tracks, temp.path().join("mix.flac"));

        let result = renderer.render(&job, &NoProgress, &CancelToken::new());
        assert!(result.success, "{:?}", result.error_message);
        assert_eq!(result.skipped_tracks.len(), 1);
        assert!(result.skipped_tracks[0].contains("b.mp3"));
        assert_eq!(result.transition_count, 1);
    }

    #[test]
    fn test_too_few_tracks_fails() {
        let engine = FakeEngine::default().with_source("/music/a.mp3", 180.0);
        let (temp, renderer) = setup(engine);
        let tracks = vec![track("/music/a.mp3", 180.0), track("/music/b.mp3", 190.0)];
        let job = MixJob::new("job", tracks, temp.path().join("mix.mp3"));
        let tracker = JobStatusTracker::new("job");

        let result = renderer.render(&job, &tracker, &CancelToken::new());
        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("at least 2"));
        assert!(!temp.path().join("mix.mp3").exists());
        assert_eq!(tracker.snapshot().status, JobStage::Failed);
    }

    #[test]
    fn test_cancelled_job_cleans_up() {
        let engine = FakeEngine::default()
            .with_source("/music/a.mp3", 180.0)
            .with_source("/music/b.mp3", 200.0);
        let (temp, renderer) = setup(engine);
        let tracks = vec![track("/music/a.mp3", 180.0), track("/music/b.mp3", 200.0)];
        let job = MixJob::new("job", tracks, temp.path().join("mix.mp3"));
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = renderer.render(&job, &NoProgress, &cancel);
        assert_eq!(result.error_message.as_deref(), Some("render cancelled"));
        assert!(scratch_is_empty(&temp));
    }

    #[test]
    fn test_transcode_failure_is_fatal() {
        let engine = FakeEngine::default()
            .with_source("/music/a.mp3", 180.0)
            .with_source("/music/b.mp3", 200.0)
            .failing("encode");
        let (temp, renderer) = setup(engine);
        let tracks = vec![track("/music/a.mp3", 180.0), track("/music/b.mp3", 200.0)];
        let job = MixJob::new("job", tracks, temp.path().join("mix.mp3"));

        let result = renderer.render(&job, &NoProgress, &CancelToken::new());
        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("final transcode failed"));
        assert!(!temp.path().join("mix.mp3").exists());
        assert!(scratch_is_empty(&temp));
    }

    #[test]
    fn test_progress_walks_every_stage() {
        let engine = FakeEngine::default()
            .with_source("/music/a.mp3", 180.0)
            .with_source("/music/b.mp3", 200.0);
        let (temp, renderer) = setup(engine);
        let tracks = vec![track("/music/a.mp3", 180.0), track("/music/b.mp3", 200.0)];
        let job = MixJob::new("job", tracks, temp.path().join("mix.mp3"));

        let stages = Mutex::new(Vec::new());
        let reporter = |u: ProgressUpdate| {
            let mut stages = stages.lock().unwrap();
            if stages.last() != Some(&u.stage) {
                stages.push(u.stage);
            }
        };
        let result = renderer.render(&job, &reporter, &CancelToken::new());
        assert!(result.success);
        assert_eq!(
            stages.into_inner().unwrap(),
            vec![
                JobStage::Analyzing,
                JobStage::Processing,
                JobStage::Rendering,
                JobStage::Complete
            ]
        );
    }

    #[test]
    fn test_scaled_progress() {
        assert_eq!(scaled(0, 4, 20, 90), 20);
        assert_eq!(scaled(2, 4, 20, 90), 55);
        assert_eq!(scaled(4, 4, 20, 90), 90);
        assert_eq!(scaled(0, 0, 0, 20), 20);
    }
}
