//! Turns a composition request and its probed assets into a job chain.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::PlanError;
use super::job::{ConcatJob, Job, JobPlan, MixJob, ProbeJob, SegmentJob};
use super::loop_spec::plan_loop;
use super::mix::MixSpec;
use crate::compose::CompositionRequest;
use crate::media::MediaAsset;

/// File name of the intro probe record inside the temp namespace.
pub const PROBE_RECORD_FILE: &str = "intro_probe.json";

/// File name of the pre-mixed narration+music track inside the temp namespace.
pub const MIXED_AUDIO_FILE: &str = "mixed_audio.m4a";

/// Probed inputs of one composition.
#[derive(Debug, Clone)]
pub struct CompositionAssets {
    pub narration: MediaAsset,
    pub video: MediaAsset,
    pub music: MediaAsset,
    pub intro: Option<MediaAsset>,
}

/// Builds the job chain for a composition.
#[derive(Debug, Clone)]
pub struct JobBuilder {
    temp_dir: PathBuf,
    output_filename: String,
    min_duration_secs: f64,
}

impl JobBuilder {
    /// Creates a builder writing intermediates under `temp_dir`.
    pub fn new(temp_dir: impl Into<PathBuf>, output_filename: impl Into<String>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            output_filename: output_filename.into(),
            min_duration_secs: 0.0,
        }
    }

    /// Rejects assets shorter than `secs`.
    pub fn with_min_duration(mut self, secs: f64) -> Self {
        self.min_duration_secs = secs;
        self
    }

    /// Where the final file of `request` is written.
    pub fn output_path(&self, request: &CompositionRequest) -> PathBuf {
        request.output_directory.join(&self.output_filename)
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Builds the ordered job chain.
    ///
    /// Without an intro this is a single [`Job::AssembleSegment`]. With one it
    /// is probe, mix with the narration delayed by the intro, then the final
    /// concatenation capped at intro plus narration.
    pub fn build_jobs(
        &self,
        request: &CompositionRequest,
        assets: &CompositionAssets,
    ) -> Result<JobPlan, PlanError> {
        let intro = self.check_assets(request, assets)?;
        let output = self.output_path(request);
        check_output_is_new(&output, assets, intro)?;

        let plan = match intro {
            None => self.build_plain(assets, output)?,
            Some(intro) => self.build_with_intro(assets, intro, output)?,
        }
        .with_scratch_input(assets.narration.path.clone());

        let mut asset_paths = vec![
            assets.narration.path(),
            assets.video.path(),
            assets.music.path(),
        ];
        if let Some(intro) = intro {
            asset_paths.push(intro.path());
        }
        plan.check(&asset_paths)?;

        debug!(
            jobs = ?plan.kinds(),
            output = %plan.output().display(),
            "Built composition plan"
        );
        Ok(plan)
    }

    fn build_plain(&self, assets: &CompositionAssets, output: PathBuf) -> Result<JobPlan, PlanError> {
        let target = assets.narration.duration_secs;
        let job = SegmentJob {
            video: assets.video.path.clone(),
            video_loop: plan_loop(assets.video.duration_secs, target),
            mix: MixSpec::new(vec![assets.narration.clone(), assets.music.clone()])?,
            music_loop: plan_loop(assets.music.duration_secs, target),
            duration_secs: target,
            output: output.clone(),
        };
        Ok(JobPlan::new(vec![Job::AssembleSegment(job)], output))
    }

    fn build_with_intro(
        &self,
        assets: &CompositionAssets,
        intro: &MediaAsset,
        output: PathBuf,
    ) -> Result<JobPlan, PlanError> {
        let narration_secs = assets.narration.duration_secs;
        let intro_secs = intro.duration_secs;
        let mix = MixSpec::new(vec![assets.narration.clone(), assets.music.clone()])?;
        // Capped at the exact sum so nothing trails past the narration's end.
        let total_secs = mix.output_duration_with_delay(intro_secs);
        let mixed_audio = self.temp_dir.join(MIXED_AUDIO_FILE);

        let probe = ProbeJob {
            input: intro.path.clone(),
            expected_duration_secs: intro_secs,
            output: self.temp_dir.join(PROBE_RECORD_FILE),
        };

        let mix_job = MixJob {
            mix,
            music_loop: plan_loop(assets.music.duration_secs, total_secs),
            narration_delay_secs: intro_secs,
            duration_secs: total_secs,
            output: mixed_audio.clone(),
        };

        let concat = ConcatJob {
            intro: intro.path.clone(),
            intro_duration_secs: intro_secs,
            intro_has_audio: intro.has_audio,
            video: assets.video.path.clone(),
            video_loop: plan_loop(assets.video.duration_secs, narration_secs),
            audio: mixed_audio,
            duration_secs: total_secs,
            output: output.clone(),
        };

        Ok(JobPlan::new(
            vec![
                Job::ProbeDuration(probe),
                Job::MixAudio(mix_job),
                Job::ConcatenateWithIntro(concat),
            ],
            output,
        ))
    }

    /// Validates assets and returns the intro when one is requested.
    fn check_assets<'a>(
        &self,
        request: &CompositionRequest,
        assets: &'a CompositionAssets,
    ) -> Result<Option<&'a MediaAsset>, PlanError> {
        let mut required = vec![
            ("narration", &assets.narration),
            ("video", &assets.video),
            ("music", &assets.music),
        ];

        let intro = if request.include_intro {
            match &assets.intro {
                Some(intro) => {
                    required.push(("intro", intro));
                    Some(intro)
                }
                None => return Err(PlanError::missing("intro", PathBuf::new())),
            }
        } else {
            None
        };

        for (role, asset) in &required {
            if !asset.exists {
                return Err(PlanError::missing(*role, asset.path.clone()));
            }
        }

        let narration_secs = assets.narration.duration_secs;
        if !narration_secs.is_finite() || narration_secs <= 0.0 {
            return Err(PlanError::EmptyNarration {
                path: assets.narration.path.clone(),
            });
        }

        for (role, asset) in &required {
            if asset.duration_secs < self.min_duration_secs {
                return Err(PlanError::AssetTooShort {
                    role: role.to_string(),
                    path: asset.path.clone(),
                    duration_secs: asset.duration_secs,
                    min_secs: self.min_duration_secs,
                });
            }
        }

        Ok(intro)
    }
}

/// Rejects a destination that resolves to one of the inputs, which failure
/// cleanup would otherwise delete.
fn check_output_is_new(
    output: &Path,
    assets: &CompositionAssets,
    intro: Option<&MediaAsset>,
) -> Result<(), PlanError> {
    let target = comparable(output);
    let inputs = [
        ("narration", Some(&assets.narration)),
        ("video", Some(&assets.video)),
        ("music", Some(&assets.music)),
        ("intro", intro),
    ];

    for (role, asset) in inputs {
        if let Some(asset) = asset {
            if comparable(&asset.path) == target {
                return Err(PlanError::OutputIsInput {
                    role: role.to_string(),
                    path: output.to_path_buf(),
                });
            }
        }
    }
    Ok(())
}

/// Absolute form of `path` with symlinks resolved as far as the filesystem allows.
fn comparable(path: &Path) -> PathBuf {
    if let Ok(resolved) = std::fs::canonicalize(path) {
        return resolved;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let Some(name) = absolute.file_name().map(ToOwned::to_owned) else {
        return absolute;
    };
    match absolute.parent().map(std::fs::canonicalize) {
        Some(Ok(dir)) => dir.join(name),
        _ => absolute,
    }
}
