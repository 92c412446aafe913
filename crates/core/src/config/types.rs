use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::TranscoderConfig;
use crate::narration::SynthesizerConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    #[serde(default)]
    pub synthesizer: SynthesizerConfig,
}

/// User preferences persisted between runs.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    /// Speech rate handed to the synthesizer (words per minute).
    #[serde(default = "default_narration_rate")]
    pub narration_rate: u32,
    /// Pitch-shift ratio applied to the synthesized narration.
    #[serde(default = "default_pitch_factor")]
    pub pitch_factor: f64,
    /// Output directory used by the last successful run.
    #[serde(default)]
    pub last_output_path: String,
    /// Index of the synthesizer voice.
    #[serde(default)]
    pub voice_id: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            narration_rate: default_narration_rate(),
            pitch_factor: default_pitch_factor(),
            last_output_path: String::new(),
            voice_id: 0,
        }
    }
}

fn default_narration_rate() -> u32 {
    195
}

fn default_pitch_factor() -> f64 {
    0.35
}

/// Where stock assets and the intro clip live.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetConfig {
    /// Primary stock directory for background videos.
    #[serde(default = "default_video_dir")]
    pub video_dir: PathBuf,
    /// Primary stock directory for background music.
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,
    /// Secondary resource directory searched after the primary ones.
    #[serde(default = "default_fallback_dir")]
    pub fallback_dir: PathBuf,
    /// Fixed intro clip, required only when an intro is requested.
    #[serde(default = "default_intro_path")]
    pub intro_path: PathBuf,
    /// Video name used when the caller selects none.
    #[serde(default)]
    pub default_video: Option<String>,
    /// Music name used when the caller selects none.
    #[serde(default)]
    pub default_music: Option<String>,
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
    #[serde(default = "default_audio_extensions")]
    pub audio_extensions: Vec<String>,
    /// Assets shorter than this are rejected before any job runs.
    #[serde(default = "default_min_duration")]
    pub min_duration_secs: f64,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            video_dir: default_video_dir(),
            audio_dir: default_audio_dir(),
            fallback_dir: default_fallback_dir(),
            intro_path: default_intro_path(),
            default_video: None,
            default_music: None,
            video_extensions: default_video_extensions(),
            audio_extensions: default_audio_extensions(),
            min_duration_secs: default_min_duration(),
        }
    }
}

fn default_video_dir() -> PathBuf {
    PathBuf::from("assets/videos")
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("assets/audio")
}

fn default_fallback_dir() -> PathBuf {
    PathBuf::from("resources")
}

fn default_intro_path() -> PathBuf {
    PathBuf::from("assets/videos/intro/intro.mp4")
}

fn default_video_extensions() -> Vec<String> {
    vec!["mp4".to_string()]
}

fn default_audio_extensions() -> Vec<String> {
    vec!["mp3".to_string()]
}

fn default_min_duration() -> f64 {
    0.1
}

/// Output file naming.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_filename")]
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            filename: default_output_filename(),
        }
    }
}

fn default_output_filename() -> String {
    "composition.mp4".to_string()
}

/// Pipeline execution settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Temp namespace owned by one composition run at a time.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Delete the narration asset after a successful run.
    #[serde(default = "default_consume_narration")]
    pub consume_narration: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            consume_narration: default_consume_narration(),
        }
    }
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("narrate-pipeline")
}

fn default_consume_narration() -> bool {
    true
}
