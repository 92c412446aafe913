//! Configuration for the transcoding engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based transcoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Timeout for a single job in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Additional ffmpeg arguments placed before the output path.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,

    /// Video encoder used whenever frames must be re-encoded.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Audio encoder for every mixed track.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,

    /// Constant rate factor for re-encoded video.
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Frame size both sides of an intro join are normalized to.
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,

    #[serde(default = "default_frame_height")]
    pub frame_height: u32,

    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Sample rate the pitch shift resamples back to.
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: u32,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

fn default_log_level() -> String {
    "warning".to_string()
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> u32 {
    192
}

fn default_crf() -> u8 {
    23
}

fn default_frame_width() -> u32 {
    1920
}

fn default_frame_height() -> u32 {
    1080
}

fn default_frame_rate() -> u32 {
    30
}

fn default_sample_rate() -> u32 {
    44100
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_timeout(),
            ffmpeg_log_level: default_log_level(),
            extra_ffmpeg_args: Vec::new(),
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            audio_bitrate_kbps: default_audio_bitrate(),
            crf: default_crf(),
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
            frame_rate: default_frame_rate(),
            sample_rate_hz: default_sample_rate(),
        }
    }
}

impl TranscoderConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the frame geometry used when joining clips.
    pub fn with_frame(mut self, width: u32, height: u32, rate: u32) -> Self {
        self.frame_width = width;
        self.frame_height = height;
        self.frame_rate = rate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TranscoderConfig::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.ffprobe_path, PathBuf::from("ffprobe"));
        assert_eq!(config.timeout_secs, 3600);
        assert_eq!(config.audio_codec, "aac");
        assert_eq!((config.frame_width, config.frame_height), (1920, 1080));
    }

    #[test]
    fn test_config_builder() {
        let config = TranscoderConfig::with_paths(
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffprobe"),
        )
        .with_timeout(600)
        .with_frame(1280, 720, 25);

        assert_eq!(config.ffmpeg_path, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(config.timeout_secs, 600);
        assert_eq!(config.frame_rate, 25);
        assert_eq!(config.frame_width, 1280);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TranscoderConfig = toml::from_str("crf = 18").unwrap();
        assert_eq!(config.crf, 18);
        assert_eq!(config.video_codec, "libx264");
    }
}
