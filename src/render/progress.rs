//! Job progress reporting

use crate::model::{JobStage, MixJobStatus, MixResult};
use serde::Serialize;
use std::sync::mpsc::Sender;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub stage: JobStage,
    /// 0..=100
    pub percent: u8,
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: JobStage, percent: u8, message: impl Into<String>) -> Self {
        Self {
            stage,
            percent: percent.min(100),
            message: message.into(),
        }
    }
}

/// Receives stage changes and progress of a render job
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        self(update)
    }
}

/// Reporter that drops every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

/// A hung-up receiver is ignored
impl ProgressReporter for Sender<ProgressUpdate> {
    fn report(&self, update: ProgressUpdate) {
        let _ = self.send(update);
    }
}

/// Keeps the latest `MixJobStatus` of a job, enforcing legal stage changes
pub struct JobStatusTracker {
    status: Mutex<MixJobStatus>,
}

impl JobStatusTracker {
    pub fn new(job_id: &str) -> Self {
        Self {
            status: Mutex::new(MixJobStatus {
                id: job_id.to_string(),
                status: JobStage::Pending,
                progress: 0,
                progress_message: "queued".to_string(),
                result: None,
                error: None,
            }),
        }
    }

    pub fn snapshot(&self) -> MixJobStatus {
        match self.status.lock() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Attach the final result once the job is over
    pub fn finish(&self, result: &MixResult) {
        if let Ok(mut status) = self.status.lock() {
            if !result.success && status.status != JobStage::Failed {
                status.status = JobStage::Failed;
            }
            status.error = result.error_message.clone();
            status.result = Some(result.clone());
        }
    }
}

impl ProgressReporter for JobStatusTracker {
    fn report(&self, update: ProgressUpdate) {
        let Ok(mut status) = self.status.lock() else {
            return;
        };
        if update.stage != status.status {
            if !status.status.can_advance_to(update.stage) {
                log::warn!(
                    "Job {}: ignoring stage change {} -> {}",
                    status.id,
                    status.status,
                    update.stage
                );
                return;
            }
            status.status = update.stage;
        }
        // progress never moves backwards within a job
        status.progress = status.progress.max(update.percent);
        if update.stage == JobStage::Failed {
            status.error = Some(update.message.clone());
        }
        status.progress_message = update.message;
    }
}
