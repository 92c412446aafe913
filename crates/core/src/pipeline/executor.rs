//! Sequential execution of a job plan.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, PoisonError};
use std::time::Instant;
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use super::error::{PipelineError, StageError};
use super::types::{PipelineProgress, PipelineState, ProgressPhase, ProgressTable};
use crate::config::PipelineConfig;
use crate::engine::{Transcoder, TranscoderError};
use crate::plan::{Job, JobKind, JobPlan, ProbeJob};

/// One lock per absolute temp directory, shared by every executor in the process.
static NAMESPACES: OnceLock<std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

fn namespace_lock(temp_dir: &Path) -> Arc<Mutex<()>> {
    let key = std::path::absolute(temp_dir).unwrap_or_else(|_| temp_dir.to_path_buf());
    let mut registry = NAMESPACES
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::clone(registry.entry(key).or_default())
}

/// Exclusive ownership of a temp namespace.
///
/// Held for the whole composition; dropping it lets the next run start.
/// Executors sharing a temp directory share the namespace.
pub struct RunPermit {
    namespace: Arc<Mutex<()>>,
    _guard: OwnedMutexGuard<()>,
}

/// Requests that a run stop before its next job.
///
/// A job already handed to the engine always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Written by a probe job so the measurement survives until cleanup.
#[derive(Debug, Serialize)]
struct ProbeRecord<'a> {
    input: &'a Path,
    expected_duration_secs: f64,
    measured_duration_secs: f64,
    probed_at: DateTime<Utc>,
}

/// Sends progress without ever waiting on the receiver.
struct ProgressReporter {
    tx: Option<mpsc::Sender<PipelineProgress>>,
    job_count: usize,
}

impl ProgressReporter {
    fn report(&self, job_index: usize, kind: JobKind, phase: ProgressPhase, fraction: f64) {
        let Some(tx) = &self.tx else {
            return;
        };
        let status = match phase {
            ProgressPhase::Finished if job_index + 1 == self.job_count => "Done".to_string(),
            _ => kind.status().to_string(),
        };
        let update = PipelineProgress {
            job_index,
            job_count: self.job_count,
            kind,
            phase,
            fraction,
            status,
        };
        if let Err(e) = tx.try_send(update) {
            debug!(error = %e, "Dropped progress update");
        }
    }
}

/// Runs job plans one job at a time against a transcoder.
pub struct PipelineExecutor<T: Transcoder> {
    transcoder: Arc<T>,
    config: PipelineConfig,
    /// Allowed probe drift: one frame.
    frame_secs: f64,
    namespace: Arc<Mutex<()>>,
}

impl<T: Transcoder> PipelineExecutor<T> {
    pub fn new(transcoder: Arc<T>, config: PipelineConfig) -> Self {
        Self {
            transcoder,
            frame_secs: 1.0 / 30.0,
            namespace: namespace_lock(&config.temp_dir),
            config,
        }
    }

    /// Sets the frame rate the probe drift tolerance is derived from.
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_secs = 1.0 / f64::from(frame_rate.max(1));
        self
    }

    pub fn temp_dir(&self) -> &Path {
        &self.config.temp_dir
    }

    /// Claims the temp namespace, failing fast when a run is in flight.
    pub fn try_acquire(&self) -> Result<RunPermit, PipelineError> {
        let guard = Arc::clone(&self.namespace)
            .try_lock_owned()
            .map_err(|_| PipelineError::Busy)?;
        Ok(RunPermit {
            namespace: Arc::clone(&self.namespace),
            _guard: guard,
        })
    }

    /// Runs every job of `plan` in order and returns the output path.
    ///
    /// On failure or cancellation every intermediate written so far and
    /// any partial final output are removed before the error is returned.
    /// On success the intermediates and the plan's scratch input are removed.
    pub async fn run(
        &self,
        permit: &RunPermit,
        plan: &JobPlan,
        progress: Option<mpsc::Sender<PipelineProgress>>,
        cancel: &CancelHandle,
    ) -> Result<PathBuf, PipelineError> {
        if !Arc::ptr_eq(&permit.namespace, &self.namespace) {
            return Err(PipelineError::Busy);
        }

        let temp_dir = &self.config.temp_dir;
        tokio::fs::create_dir_all(temp_dir)
            .await
            .map_err(|source| PipelineError::TempDir {
                path: temp_dir.clone(),
                source,
            })?;

        let start = Instant::now();
        let table = ProgressTable::for_kinds(&plan.kinds());
        let reporter = ProgressReporter {
            tx: progress,
            job_count: plan.len(),
        };
        let mut state = PipelineState::new();

        for (job_index, job) in plan.jobs().iter().enumerate() {
            let kind = job.kind();

            if cancel.is_cancelled() {
                warn!(job_index, "Composition cancelled");
                state.fail("cancelled");
                self.discard(&state, plan).await;
                return Err(PipelineError::Cancelled { job_index });
            }

            if job.output() != plan.output() {
                state.track(job.output());
            }

            let fraction = state.advance(table.start(job_index));
            reporter.report(job_index, kind, ProgressPhase::Started, fraction);
            info!(job_index, %kind, output = %job.output().display(), "Starting job");

            if let Err(cause) = self.execute(job, plan).await {
                error!(
                    job_index,
                    %kind,
                    error = %cause,
                    diagnostic = cause.diagnostic().unwrap_or_default(),
                    "Job failed"
                );
                state.fail(cause.to_string());
                self.discard(&state, plan).await;
                return Err(PipelineError::JobFailed {
                    job_index,
                    kind,
                    cause,
                });
            }

            let fraction = state.advance(table.end(job_index));
            reporter.report(job_index, kind, ProgressPhase::Finished, fraction);
        }

        for path in state.created_temp_paths() {
            remove_if_present(path).await;
        }
        if self.config.consume_narration {
            if let Some(narration) = plan.scratch_input() {
                remove_if_present(narration).await;
            }
        }

        info!(
            output = %plan.output().display(),
            jobs = plan.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Composition finished"
        );
        Ok(plan.output().to_path_buf())
    }

    async fn execute(&self, job: &Job, plan: &JobPlan) -> Result<(), StageError> {
        let intermediates = plan.temp_outputs();
        for input in job.inputs() {
            if !tokio::fs::try_exists(input).await.unwrap_or(false) {
                let path = input.to_path_buf();
                return Err(if intermediates.contains(&input) {
                    StageError::MissingIntermediate { path }
                } else {
                    StageError::MediaNotFound { path }
                });
            }
        }

        match job {
            Job::ProbeDuration(probe) => self.run_probe(probe).await,
            _ => self
                .transcoder
                .run(job)
                .await
                .map_err(StageError::from_transcoder),
        }
    }

    /// Re-measures a clip and writes the probe record.
    async fn run_probe(&self, job: &ProbeJob) -> Result<(), StageError> {
        let info = self.transcoder.probe(&job.input).await.map_err(|e| match e {
            TranscoderError::InputNotFound { path } => StageError::MediaNotFound { path },
            TranscoderError::ProbeFailed { reason } | TranscoderError::ParseError { reason } => {
                StageError::Probe {
                    path: job.input.clone(),
                    reason,
                }
            }
            other => StageError::from_transcoder(other),
        })?;

        let drift = (info.duration_secs - job.expected_duration_secs).abs();
        if !drift.is_finite() || drift > self.frame_secs {
            return Err(StageError::Probe {
                path: job.input.clone(),
                reason: format!(
                    "duration changed from {:.3}s to {:.3}s since planning",
                    job.expected_duration_secs, info.duration_secs
                ),
            });
        }

        let record = ProbeRecord {
            input: &job.input,
            expected_duration_secs: job.expected_duration_secs,
            measured_duration_secs: info.duration_secs,
            probed_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&record).map_err(std::io::Error::from)?;
        tokio::fs::write(&job.output, json).await?;
        Ok(())
    }

    /// Failure cleanup: intermediates and the destination file.
    async fn discard(&self, state: &PipelineState, plan: &JobPlan) {
        for path in state.created_temp_paths() {
            remove_if_present(path).await;
        }
        remove_if_present(plan.output()).await;
    }
}

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::CompositionRequest;
    use crate::media::{MediaAsset, MediaKind};
    use crate::plan::{CompositionAssets, JobBuilder};
    use crate::testing::MockTranscoder;
    use tempfile::TempDir;

    struct Fixture {
        root: TempDir,
        transcoder: Arc<MockTranscoder>,
        executor: PipelineExecutor<MockTranscoder>,
    }

    impl Fixture {
        fn new() -> Self {
            let root = TempDir::new().unwrap();
            let transcoder = Arc::new(MockTranscoder::new());
            let config = PipelineConfig {
                temp_dir: root.path().join("scratch"),
                consume_narration: true,
            };
            let executor = PipelineExecutor::new(transcoder.clone(), config).with_frame_rate(30);
            std::fs::create_dir_all(root.path().join("out")).unwrap();
            Self {
                root,
                transcoder,
                executor,
            }
        }

        fn file(&self, name: &str, kind: MediaKind, secs: f64) -> MediaAsset {
            let path = self.root.path().join(name);
            std::fs::write(&path, b"media").unwrap();
            MediaAsset {
                path,
                kind,
                duration_secs: secs,
                exists: true,
                has_audio: true,
            }
        }

        fn plan(&self, intro: bool) -> JobPlan {
            let request = CompositionRequest {
                video_name: Some("city".into()),
                audio_name: Some("lofi".into()),
                narration_path: self.root.path().join("narration.wav"),
                output_directory: self.root.path().join("out"),
                include_intro: intro,
            };
            let assets = CompositionAssets {
                narration: self.file("narration.wav", MediaKind::Audio, 20.0),
                video: self.file("city.mp4", MediaKind::Video, 15.0),
                music: self.file("lofi.mp3", MediaKind::Audio, 25.0),
                intro: intro.then(|| self.file("intro.mp4", MediaKind::Video, 8.0)),
            };
            JobBuilder::new(self.executor.temp_dir(), "composition.mp4")
                .build_jobs(&request, &assets)
                .unwrap()
        }

        fn scratch_files(&self) -> Vec<PathBuf> {
            match std::fs::read_dir(self.executor.temp_dir()) {
                Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
                Err(_) => Vec::new(),
            }
        }
    }

    #[tokio::test]
    async fn test_success_cleans_scratch_and_consumes_narration() {
        let f = Fixture::new();
        let plan = f.plan(true);
        f.transcoder
            .set_duration(f.root.path().join("intro.mp4"), 8.01)
            .await;

        let permit = f.executor.try_acquire().unwrap();
        let output = f
            .executor
            .run(&permit, &plan, None, &CancelHandle::new())
            .await
            .unwrap();

        assert_eq!(output, plan.output());
        assert!(output.exists());
        assert!(f.scratch_files().is_empty());
        assert!(!f.root.path().join("narration.wav").exists());
        assert_eq!(f.transcoder.recorded_jobs().await.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_removes_earlier_outputs_and_destination() {
        let f = Fixture::new();
        let plan = f.plan(true);
        f.transcoder
            .set_duration(f.root.path().join("intro.mp4"), 8.0)
            .await;
        f.transcoder
            .fail_on(JobKind::MixAudio, "amix: invalid argument")
            .await;

        let permit = f.executor.try_acquire().unwrap();
        let err = f
            .executor
            .run(&permit, &plan, None, &CancelHandle::new())
            .await
            .unwrap_err();

        match &err {
            PipelineError::JobFailed {
                job_index: 1,
                kind: JobKind::MixAudio,
                cause: StageError::ExternalToolFailure { diagnostic, .. },
            } => assert_eq!(diagnostic, "amix: invalid argument"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(f.scratch_files().is_empty());
        assert!(!plan.output().exists());
        // Narration is only consumed on success.
        assert!(f.root.path().join("narration.wav").exists());
    }

    #[tokio::test]
    async fn test_partial_final_output_removed() {
        let f = Fixture::new();
        let plan = f.plan(false);
        f.transcoder
            .fail_on(JobKind::AssembleSegment, "disk full")
            .await;

        let permit = f.executor.try_acquire().unwrap();
        let err = f
            .executor
            .run(&permit, &plan, None, &CancelHandle::new())
            .await
            .unwrap_err();

        assert_eq!(err.job_index(), Some(0));
        assert!(!plan.output().exists());
    }

    #[tokio::test]
    async fn test_probe_drift_beyond_one_frame_fails() {
        let f = Fixture::new();
        let plan = f.plan(true);
        f.transcoder
            .set_duration(f.root.path().join("intro.mp4"), 8.5)
            .await;

        let permit = f.executor.try_acquire().unwrap();
        let err = f
            .executor
            .run(&permit, &plan, None, &CancelHandle::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::JobFailed {
                job_index: 0,
                cause: StageError::Probe { .. },
                ..
            }
        ));
        assert!(f.transcoder.recorded_jobs().await.is_empty());
        assert!(f.scratch_files().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_first_job() {
        let f = Fixture::new();
        let plan = f.plan(false);
        let cancel = CancelHandle::new();
        cancel.cancel();

        let permit = f.executor.try_acquire().unwrap();
        let err = f.executor.run(&permit, &plan, None, &cancel).await.unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled { job_index: 0 }));
        assert!(f.transcoder.recorded_jobs().await.is_empty());
        assert!(!plan.output().exists());
    }

    #[tokio::test]
    async fn test_second_permit_is_refused() {
        let f = Fixture::new();
        let permit = f.executor.try_acquire().unwrap();
        assert!(matches!(f.executor.try_acquire(), Err(PipelineError::Busy)));
        drop(permit);
        assert!(f.executor.try_acquire().is_ok());
    }

    #[tokio::test]
    async fn test_executors_sharing_temp_dir_share_the_permit() {
        let f = Fixture::new();
        let twin = PipelineExecutor::new(
            f.transcoder.clone(),
            PipelineConfig {
                temp_dir: f.root.path().join("scratch"),
                consume_narration: true,
            },
        );

        let permit = f.executor.try_acquire().unwrap();
        assert!(matches!(twin.try_acquire(), Err(PipelineError::Busy)));
        drop(permit);

        let twin_permit = twin.try_acquire().unwrap();
        assert!(matches!(f.executor.try_acquire(), Err(PipelineError::Busy)));
        drop(twin_permit);
    }

    #[tokio::test]
    async fn test_foreign_permit_is_refused() {
        let f = Fixture::new();
        let other = Fixture::new();
        let plan = f.plan(false);
        let permit = other.executor.try_acquire().unwrap();

        let err = f
            .executor
            .run(&permit, &plan, None, &CancelHandle::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Busy));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_complete() {
        let f = Fixture::new();
        let plan = f.plan(true);
        f.transcoder
            .set_duration(f.root.path().join("intro.mp4"), 8.0)
            .await;
        let (tx, mut rx) = mpsc::channel(16);

        let permit = f.executor.try_acquire().unwrap();
        f.executor
            .run(&permit, &plan, Some(tx), &CancelHandle::new())
            .await
            .unwrap();

        let mut updates = Vec::new();
        while let Some(update) = rx.recv().await {
            updates.push(update);
        }
        assert_eq!(updates.len(), 6);
        assert!(updates.windows(2).all(|w| w[0].fraction <= w[1].fraction));
        let last = updates.last().unwrap();
        assert_eq!(last.fraction, 1.0);
        assert_eq!(last.status, "Done");
        assert_eq!(updates[2].status, JobKind::MixAudio.status());
    }

    #[tokio::test]
    async fn test_full_progress_channel_does_not_block() {
        let f = Fixture::new();
        let plan = f.plan(false);
        let (tx, _rx) = mpsc::channel(1);

        let permit = f.executor.try_acquire().unwrap();
        let result = f
            .executor
            .run(&permit, &plan, Some(tx), &CancelHandle::new())
            .await;
        assert!(result.is_ok());
    }
}
