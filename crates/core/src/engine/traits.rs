//! Trait definitions for the engine module.

use async_trait::async_trait;
use std::path::Path;

use super::error::TranscoderError;
use super::types::PitchShift;
use crate::media::MediaInfo;
use crate::plan::Job;

/// An external engine that can measure and transcode media.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Probes a media file to get its information.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, TranscoderError>;

    /// Runs one encoding job to completion.
    ///
    /// The call is not interruptible once started.
    async fn run(&self, job: &Job) -> Result<(), TranscoderError>;

    /// Applies a pitch shift to a narration file.
    async fn shift_pitch(&self, shift: &PitchShift) -> Result<(), TranscoderError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscoderError>;
}
