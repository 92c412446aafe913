//! The composition entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::error::CompositionError;
use super::request::CompositionRequest;
use crate::config::{validate_config, Config};
use crate::engine::Transcoder;
use crate::media::{AssetResolver, MediaKind, MediaProber};
use crate::narration::{prepare_narration, NarrationRequest, SpeechSynthesizer};
use crate::pipeline::{CancelHandle, PipelineExecutor, PipelineProgress, RunPermit};
use crate::plan::{CompositionAssets, JobBuilder, JobPlan};

/// Written and removed again to prove the output directory is writable.
const WRITE_TEST_FILE: &str = ".narrate-write-test";

/// Validates composition requests and runs them.
///
/// Everything up to and including planning happens before any job runs, so
/// a rejected request never touches the temp namespace or the destination.
pub struct Composer<T: Transcoder> {
    config: Config,
    transcoder: Arc<T>,
    resolver: AssetResolver,
    prober: MediaProber<T>,
    builder: JobBuilder,
    executor: PipelineExecutor<T>,
}

impl<T: Transcoder> Composer<T> {
    pub fn new(config: Config, transcoder: Arc<T>) -> Result<Self, CompositionError> {
        validate_config(&config)?;

        let resolver = AssetResolver::new(&config.assets);
        let prober = MediaProber::new(Arc::clone(&transcoder));
        let builder = JobBuilder::new(&config.pipeline.temp_dir, config.output.filename.clone())
            .with_min_duration(config.assets.min_duration_secs);
        let executor = PipelineExecutor::new(Arc::clone(&transcoder), config.pipeline.clone())
            .with_frame_rate(config.transcoder.frame_rate);

        Ok(Self {
            config,
            transcoder,
            resolver,
            prober,
            builder,
            executor,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &AssetResolver {
        &self.resolver
    }

    pub fn transcoder(&self) -> &Arc<T> {
        &self.transcoder
    }

    /// Where a request's output lands.
    pub fn output_path(&self, request: &CompositionRequest) -> PathBuf {
        self.builder.output_path(request)
    }

    /// Composes `request` and returns the output file path.
    ///
    /// Fails with `Busy` when another composition is in flight.
    pub async fn compose(
        &self,
        request: &CompositionRequest,
        progress: Option<mpsc::Sender<PipelineProgress>>,
        cancel: &CancelHandle,
    ) -> Result<PathBuf, CompositionError> {
        let permit = self.executor.try_acquire()?;
        self.compose_with(&permit, request, progress, cancel).await
    }

    /// Synthesizes `narration`, then composes `request` over it.
    ///
    /// The request's narration path is replaced by the synthesized file. The
    /// narration is removed if the composition fails.
    pub async fn compose_script<S>(
        &self,
        synthesizer: &S,
        narration: &NarrationRequest,
        mut request: CompositionRequest,
        progress: Option<mpsc::Sender<PipelineProgress>>,
        cancel: &CancelHandle,
    ) -> Result<PathBuf, CompositionError>
    where
        S: SpeechSynthesizer + ?Sized,
    {
        let permit = self.executor.try_acquire()?;

        request.narration_path = prepare_narration(
            synthesizer,
            self.transcoder.as_ref(),
            narration,
            &self.config.synthesizer.work_dir,
            self.config.transcoder.sample_rate_hz,
        )
        .await?;

        let result = self.compose_with(&permit, &request, progress, cancel).await;
        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(&request.narration_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %request.narration_path.display(), error = %e, "Failed to remove narration");
                }
            }
        }
        result
    }

    /// Validates and plans `request` without running anything.
    pub async fn plan(&self, request: &CompositionRequest) -> Result<JobPlan, CompositionError> {
        let narration = self
            .prober
            .probe_asset(&request.narration_path, MediaKind::Audio)
            .await?;

        check_output_dir(&request.output_directory).await?;

        let video_path = self
            .resolver
            .resolve(MediaKind::Video, request.video_name.as_deref())
            .await?;
        let music_path = self
            .resolver
            .resolve(MediaKind::Audio, request.audio_name.as_deref())
            .await?;

        let video = self.prober.probe_asset(&video_path, MediaKind::Video).await?;
        let music = self.prober.probe_asset(&music_path, MediaKind::Audio).await?;
        let intro = if request.include_intro {
            Some(
                self.prober
                    .probe_asset(&self.config.assets.intro_path, MediaKind::Video)
                    .await?,
            )
        } else {
            None
        };

        let assets = CompositionAssets {
            narration,
            video,
            music,
            intro,
        };
        Ok(self.builder.build_jobs(request, &assets)?)
    }

    async fn compose_with(
        &self,
        permit: &RunPermit,
        request: &CompositionRequest,
        progress: Option<mpsc::Sender<PipelineProgress>>,
        cancel: &CancelHandle,
    ) -> Result<PathBuf, CompositionError> {
        info!(
            narration = %request.narration_path.display(),
            video = request.video_name.as_deref().unwrap_or("<default>"),
            music = request.audio_name.as_deref().unwrap_or("<default>"),
            include_intro = request.include_intro,
            "Starting composition"
        );

        let plan = self.plan(request).await?;
        let output = self.executor.run(permit, &plan, progress, cancel).await?;

        info!(output = %output.display(), "Composition written");
        Ok(output)
    }
}

async fn check_output_dir(dir: &Path) -> Result<(), CompositionError> {
    let metadata = tokio::fs::metadata(dir)
        .await
        .map_err(|e| CompositionError::invalid_output(dir, e.to_string()))?;
    if !metadata.is_dir() {
        return Err(CompositionError::invalid_output(dir, "not a directory"));
    }

    let probe = dir.join(WRITE_TEST_FILE);
    tokio::fs::write(&probe, b"")
        .await
        .map_err(|e| CompositionError::invalid_output(dir, format!("not writable: {e}")))?;
    tokio::fs::remove_file(&probe)
        .await
        .map_err(|e| CompositionError::invalid_output(dir, format!("not writable: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::ErrorKind;
    use crate::testing::fixtures::{config_in, create_layout, touch};
    use crate::testing::MockTranscoder;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.settings.narration_rate = 0;
        let err = Composer::new(config, Arc::new(MockTranscoder::new()))
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_missing_output_directory() {
        let root = TempDir::new().unwrap();
        let config = config_in(root.path());
        create_layout(&config, root.path()).unwrap();
        let narration = touch(&root.path().join("narration.wav")).unwrap();

        let composer = Composer::new(config, Arc::new(MockTranscoder::new())).unwrap();
        let request = CompositionRequest::new(narration, root.path().join("missing"));
        let err = composer
            .compose(&request, None, &CancelHandle::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOutputPath);
    }

    #[tokio::test]
    async fn test_output_path_that_is_a_file() {
        let root = TempDir::new().unwrap();
        let config = config_in(root.path());
        create_layout(&config, root.path()).unwrap();
        let narration = touch(&root.path().join("narration.wav")).unwrap();
        let file = touch(&root.path().join("not-a-dir")).unwrap();

        let composer = Composer::new(config, Arc::new(MockTranscoder::new())).unwrap();
        let err = composer
            .compose(&CompositionRequest::new(narration, file), None, &CancelHandle::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOutputPath);
    }

    #[tokio::test]
    async fn test_write_test_file_not_left_behind() {
        let root = TempDir::new().unwrap();
        let config = config_in(root.path());
        let out = create_layout(&config, root.path()).unwrap();
        check_output_dir(&out).await.unwrap();
        assert!(!out.join(WRITE_TEST_FILE).exists());
    }

    #[tokio::test]
    async fn test_plan_uses_default_music() {
        let root = TempDir::new().unwrap();
        let mut config = config_in(root.path());
        config.assets.default_music = Some("lofi".to_string());
        let out = create_layout(&config, root.path()).unwrap();
        let narration = touch(&root.path().join("narration.wav")).unwrap();
        touch(&config.assets.video_dir.join("city.mp4")).unwrap();
        touch(&config.assets.audio_dir.join("lofi.mp3")).unwrap();

        let composer = Composer::new(config, Arc::new(MockTranscoder::new())).unwrap();
        let request = CompositionRequest::new(narration, &out).with_video("city");
        let plan = composer.plan(&request).await.unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.output(), out.join("composition.mp4"));
    }
}
