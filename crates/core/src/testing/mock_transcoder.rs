//! Mock transcoder for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::engine::{PitchShift, Transcoder, TranscoderError};
use crate::media::MediaInfo;
use crate::plan::{Job, JobKind};

/// Bytes written to every output the mock "encodes".
pub const PLACEHOLDER_OUTPUT: &[u8] = b"mock media";

/// Mock implementation of the Transcoder trait.
///
/// Provides controllable behavior for testing:
/// - Record every job handed to `run`
/// - Script probe results per path
/// - Fail jobs of a given kind with an engine diagnostic
/// - Write placeholder outputs so cleanup can be observed
///
/// # Example
///
/// ```rust,ignore
/// use narrate_core::testing::MockTranscoder;
///
/// let transcoder = MockTranscoder::new();
/// transcoder.set_duration("/stock/city.mp4", 15.0).await;
/// transcoder.fail_on(JobKind::MixAudio, "amix: invalid argument").await;
///
/// // ... run a composition ...
///
/// let jobs = transcoder.recorded_jobs().await;
/// assert_eq!(jobs.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockTranscoder {
    jobs: Arc<RwLock<Vec<Job>>>,
    probe_results: Arc<RwLock<HashMap<PathBuf, MediaInfo>>>,
    probe_count: Arc<RwLock<usize>>,
    /// Job kinds that fail, with the stderr they report.
    failures: Arc<RwLock<HashMap<JobKind, String>>>,
    next_probe_error: Arc<RwLock<Option<TranscoderError>>>,
    pitch_shifts: Arc<RwLock<Vec<PitchShift>>>,
    run_delay: Arc<RwLock<Duration>>,
}

impl MockTranscoder {
    /// Create a new mock transcoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the probed duration of `path`.
    pub async fn set_duration(&self, path: impl AsRef<Path>, duration_secs: f64) {
        let mut info = Self::default_info(path.as_ref());
        info.duration_secs = duration_secs;
        self.set_media_info(info).await;
    }

    /// Script the full probe result for `info.path`.
    pub async fn set_media_info(&self, info: MediaInfo) {
        self.probe_results
            .write()
            .await
            .insert(info.path.clone(), info);
    }

    /// Make every job of `kind` fail with `stderr` as its diagnostic.
    ///
    /// A partial output is written first, as an interrupted encode would.
    pub async fn fail_on(&self, kind: JobKind, stderr: impl Into<String>) {
        self.failures.write().await.insert(kind, stderr.into());
    }

    /// Configure the next probe to fail with the given error.
    pub async fn set_next_probe_error(&self, error: TranscoderError) {
        *self.next_probe_error.write().await = Some(error);
    }

    /// Simulated time each job takes.
    pub async fn set_run_delay(&self, delay: Duration) {
        *self.run_delay.write().await = delay;
    }

    /// Jobs handed to `run`, in order, including failed ones.
    pub async fn recorded_jobs(&self) -> Vec<Job> {
        self.jobs.read().await.clone()
    }

    pub async fn recorded_kinds(&self) -> Vec<JobKind> {
        self.jobs.read().await.iter().map(Job::kind).collect()
    }

    pub async fn clear_recorded(&self) {
        self.jobs.write().await.clear();
        self.pitch_shifts.write().await.clear();
        *self.probe_count.write().await = 0;
    }

    pub async fn probe_count(&self) -> usize {
        *self.probe_count.read().await
    }

    pub async fn pitch_shifts(&self) -> Vec<PitchShift> {
        self.pitch_shifts.read().await.clone()
    }

    fn default_info(path: &Path) -> MediaInfo {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown");
        let is_video = matches!(extension, "mp4" | "mkv" | "mov" | "webm");

        MediaInfo {
            path: path.to_path_buf(),
            duration_secs: if is_video { 60.0 } else { 30.0 },
            format: extension.to_string(),
            has_audio: true,
            has_video: is_video,
        }
    }

    async fn write_output(path: &Path, bytes: &[u8]) -> Result<(), TranscoderError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, TranscoderError> {
        *self.probe_count.write().await += 1;

        if let Some(err) = self.next_probe_error.write().await.take() {
            return Err(err);
        }

        if !path.exists() {
            return Err(TranscoderError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        if let Some(info) = self.probe_results.read().await.get(path) {
            return Ok(info.clone());
        }

        Ok(Self::default_info(path))
    }

    async fn run(&self, job: &Job) -> Result<(), TranscoderError> {
        if matches!(job, Job::ProbeDuration(_)) {
            return Err(TranscoderError::UnsupportedJob {
                kind: job.kind().to_string(),
            });
        }

        self.jobs.write().await.push(job.clone());

        let delay = *self.run_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.read().await.get(&job.kind()).cloned();
        if let Some(stderr) = failure {
            Self::write_output(job.output(), b"partial").await?;
            return Err(TranscoderError::tool_failed(
                "FFmpeg exited with code: Some(1)",
                stderr,
            ));
        }

        Self::write_output(job.output(), PLACEHOLDER_OUTPUT).await
    }

    async fn shift_pitch(&self, shift: &PitchShift) -> Result<(), TranscoderError> {
        if !shift.input.exists() {
            return Err(TranscoderError::InputNotFound {
                path: shift.input.clone(),
            });
        }
        self.pitch_shifts.write().await.push(shift.clone());
        Self::write_output(&shift.output, PLACEHOLDER_OUTPUT).await
    }

    async fn validate(&self) -> Result<(), TranscoderError> {
        Ok(())
    }
}
