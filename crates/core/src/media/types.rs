//! Media data model shared by the prober, the planner and the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of media an asset is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// Stream-level facts reported by the transcoding engine for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Path that was probed.
    pub path: PathBuf,
    /// Container duration in seconds.
    pub duration_secs: f64,
    /// Container format name (first entry when the engine reports several).
    pub format: String,
    /// Whether the file carries at least one audio stream.
    pub has_audio: bool,
    /// Whether the file carries at least one video stream.
    pub has_video: bool,
}

/// A probed media file. Immutable once built; re-probe to refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub duration_secs: f64,
    pub exists: bool,
    /// Whether the file carries audio; intros without audio contribute silence.
    #[serde(default)]
    pub has_audio: bool,
}

impl MediaAsset {
    /// Builds an asset from probe output.
    pub fn from_info(kind: MediaKind, info: &MediaInfo) -> Self {
        Self {
            path: info.path.clone(),
            kind,
            duration_secs: info.duration_secs,
            exists: true,
            has_audio: info.has_audio,
        }
    }

    /// Placeholder for a path that did not resolve to a file.
    pub fn missing(path: impl Into<PathBuf>, kind: MediaKind) -> Self {
        Self {
            path: path.into(),
            kind,
            duration_secs: 0.0,
            exists: false,
            has_audio: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_from_info() {
        let info = MediaInfo {
            path: PathBuf::from("/stock/city.mp4"),
            duration_secs: 12.5,
            format: "mov".to_string(),
            has_audio: false,
            has_video: true,
        };
        let asset = MediaAsset::from_info(MediaKind::Video, &info);
        assert!(asset.exists);
        assert_eq!(asset.duration_secs, 12.5);
        assert_eq!(asset.kind, MediaKind::Video);
        assert!(!asset.has_audio);
    }

    #[test]
    fn test_missing_asset() {
        let asset = MediaAsset::missing("/nowhere.mp3", MediaKind::Audio);
        assert!(!asset.exists);
        assert_eq!(asset.duration_secs, 0.0);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(MediaKind::Video.to_string(), "video");
        assert_eq!(MediaKind::Audio.to_string(), "audio");
    }
}
