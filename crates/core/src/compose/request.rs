use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One composition as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionRequest {
    /// Stock video name; `None` selects the configured default.
    pub video_name: Option<String>,
    /// Stock music name; `None` selects the configured default.
    pub audio_name: Option<String>,
    pub narration_path: PathBuf,
    pub output_directory: PathBuf,
    pub include_intro: bool,
}

impl CompositionRequest {
    pub fn new(narration_path: impl Into<PathBuf>, output_directory: impl Into<PathBuf>) -> Self {
        Self {
            video_name: None,
            audio_name: None,
            narration_path: narration_path.into(),
            output_directory: output_directory.into(),
            include_intro: false,
        }
    }

    pub fn with_video(mut self, name: impl Into<String>) -> Self {
        self.video_name = Some(name.into());
        self
    }

    pub fn with_music(mut self, name: impl Into<String>) -> Self {
        self.audio_name = Some(name.into());
        self
    }

    pub fn with_intro(mut self, include_intro: bool) -> Self {
        self.include_intro = include_intro;
        self
    }
}
