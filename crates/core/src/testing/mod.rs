//! Testing utilities and mock implementations.
//!
//! The mocks stand in for the external engine and the speech synthesizer so
//! whole compositions can run against temp directories.
//!
//! # Example
//!
//! ```rust,ignore
//! use narrate_core::testing::{MockSynthesizer, MockTranscoder};
//!
//! let transcoder = Arc::new(MockTranscoder::new());
//! transcoder.set_duration(&narration, 30.0).await;
//!
//! let composer = Composer::new(config, transcoder.clone());
//! composer.compose(request, None, &CancelHandle::new()).await?;
//! ```

mod mock_synthesizer;
mod mock_transcoder;

pub use mock_synthesizer::MockSynthesizer;
pub use mock_transcoder::{MockTranscoder, PLACEHOLDER_OUTPUT};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::config::Config;

    /// Stock layout inside a scratch root: primary dirs, fallback dir, intro
    /// and output directory.
    pub fn config_in(root: &Path) -> Config {
        let mut config = Config::default();
        config.assets.video_dir = root.join("assets/videos");
        config.assets.audio_dir = root.join("assets/audio");
        config.assets.fallback_dir = root.join("resources");
        config.assets.intro_path = root.join("assets/videos/intro/intro.mp4");
        config.pipeline.temp_dir = root.join("scratch");
        config.synthesizer.work_dir = root.join("narration");
        config
    }

    /// Creates the directories of [`config_in`] plus `out/`.
    pub fn create_layout(config: &Config, root: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&config.assets.video_dir)?;
        std::fs::create_dir_all(&config.assets.audio_dir)?;
        std::fs::create_dir_all(&config.assets.fallback_dir)?;
        if let Some(intro_dir) = config.assets.intro_path.parent() {
            std::fs::create_dir_all(intro_dir)?;
        }
        let out = root.join("out");
        std::fs::create_dir_all(&out)?;
        Ok(out)
    }

    /// Writes a placeholder media file.
    pub fn touch(path: &Path) -> std::io::Result<PathBuf> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, b"media")?;
        Ok(path.to_path_buf())
    }
}
