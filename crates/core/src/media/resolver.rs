//! Resolution of logical asset names to files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::MediaError;
use super::types::MediaKind;
use crate::config::AssetConfig;

/// Resolves stock asset names against the primary directory of their kind,
/// then the shared fallback directory.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    video_dir: PathBuf,
    audio_dir: PathBuf,
    fallback_dir: PathBuf,
    video_extensions: Vec<String>,
    audio_extensions: Vec<String>,
    default_video: Option<String>,
    default_music: Option<String>,
}

impl AssetResolver {
    pub fn new(config: &AssetConfig) -> Self {
        Self {
            video_dir: config.video_dir.clone(),
            audio_dir: config.audio_dir.clone(),
            fallback_dir: config.fallback_dir.clone(),
            video_extensions: config.video_extensions.clone(),
            audio_extensions: config.audio_extensions.clone(),
            default_video: config.default_video.clone(),
            default_music: config.default_music.clone(),
        }
    }

    /// Directories searched for `kind`, in order.
    pub fn search_dirs(&self, kind: MediaKind) -> [&Path; 2] {
        match kind {
            MediaKind::Video => [self.video_dir.as_path(), self.fallback_dir.as_path()],
            MediaKind::Audio => [self.audio_dir.as_path(), self.fallback_dir.as_path()],
        }
    }

    fn extensions(&self, kind: MediaKind) -> &[String] {
        match kind {
            MediaKind::Video => &self.video_extensions,
            MediaKind::Audio => &self.audio_extensions,
        }
    }

    fn default_name(&self, kind: MediaKind) -> Option<&str> {
        match kind {
            MediaKind::Video => self.default_video.as_deref(),
            MediaKind::Audio => self.default_music.as_deref(),
        }
    }

    fn has_extension(&self, kind: MediaKind, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions(kind)
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }

    /// Candidate file names for `name`, with and without a known extension.
    fn file_names(&self, kind: MediaKind, name: &str) -> Vec<String> {
        if self.has_extension(kind, name) {
            vec![name.to_string()]
        } else {
            self.extensions(kind)
                .iter()
                .map(|ext| format!("{name}.{ext}"))
                .collect()
        }
    }

    /// Resolves `name` (or the configured default when absent) to an
    /// existing file.
    pub async fn resolve(&self, kind: MediaKind, name: Option<&str>) -> Result<PathBuf, MediaError> {
        let selected = name.map(str::trim).filter(|n| !n.is_empty());
        let name = match selected {
            Some(name) => name,
            None => {
                let default = self
                    .default_name(kind)
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or(MediaError::NoAssetSelected { kind })?;
                info!(%kind, name = default, "No asset selected, using default");
                default
            }
        };

        // Names are file stems, never paths into other directories.
        let plain = Path::new(name)
            .file_name()
            .is_some_and(|f| f == std::ffi::OsStr::new(name));
        let dirs = self.search_dirs(kind);

        if plain {
            for (i, dir) in dirs.iter().enumerate() {
                for file_name in self.file_names(kind, name) {
                    let candidate = dir.join(file_name);
                    if tokio::fs::metadata(&candidate)
                        .await
                        .is_ok_and(|m| m.is_file())
                    {
                        if i > 0 {
                            debug!(%kind, name, path = %candidate.display(), "Resolved from fallback directory");
                        }
                        return Ok(candidate);
                    }
                }
            }
        }

        Err(MediaError::AssetNotFound {
            name: name.to_string(),
            kind,
            searched: dirs.iter().map(|d| d.to_path_buf()).collect(),
        })
    }

    /// Lists selectable names of `kind` across both directories, sorted and
    /// de-duplicated.
    pub async fn list(&self, kind: MediaKind) -> Result<Vec<String>, MediaError> {
        let mut names = BTreeSet::new();

        for dir in self.search_dirs(kind) {
            let mut entries = match tokio::fs::read_dir(dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(MediaError::Io(e)),
            };

            while let Some(entry) = entries.next_entry().await? {
                if !entry.file_type().await?.is_file() {
                    continue;
                }
                let path = entry.path();
                let name = entry.file_name();
                let Some(name) = name.to_str() else {
                    continue;
                };
                if !self.has_extension(kind, name) {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.insert(stem.to_string());
                }
            }
        }

        Ok(names.into_iter().collect())
    }
}
