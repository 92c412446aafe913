//! Duration probing with a per-path cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;
use tracing::debug;

use super::error::MediaError;
use super::types::{MediaAsset, MediaKind};
use crate::engine::Transcoder;

/// File identity a cached probe was taken against.
#[derive(Debug, Clone, PartialEq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    fingerprint: Fingerprint,
    asset: MediaAsset,
}

/// Measures media durations through the transcoding engine.
///
/// Results are cached by absolute path and re-probed once the file's
/// modification time or length changes.
pub struct MediaProber<T: Transcoder> {
    transcoder: Arc<T>,
    cache: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl<T: Transcoder> MediaProber<T> {
    pub fn new(transcoder: Arc<T>) -> Self {
        Self {
            transcoder,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the duration of `path` in seconds, unrounded.
    pub async fn probe_duration(&self, path: &Path) -> Result<f64, MediaError> {
        let asset = self.probe_asset(path, MediaKind::Audio).await?;
        Ok(asset.duration_secs)
    }

    /// Probes `path` and returns it as an asset of `kind`.
    pub async fn probe_asset(&self, path: &Path, kind: MediaKind) -> Result<MediaAsset, MediaError> {
        let path = std::path::absolute(path)?;

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(MediaError::MediaNotFound { path }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MediaError::MediaNotFound { path })
            }
            Err(e) => return Err(MediaError::Io(e)),
        };
        let fingerprint = Fingerprint {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        };

        if let Some(entry) = self.cache.read().await.get(&path) {
            if entry.fingerprint == fingerprint {
                let mut asset = entry.asset.clone();
                asset.kind = kind;
                return Ok(asset);
            }
        }

        let info = self
            .transcoder
            .probe(&path)
            .await
            .map_err(|e| MediaError::from_transcoder(&path, e))?;

        if !info.duration_secs.is_finite() || info.duration_secs < 0.0 {
            return Err(MediaError::probe(
                &path,
                format!("invalid duration {}", info.duration_secs),
            ));
        }

        let mut asset = MediaAsset::from_info(kind, &info);
        asset.path = path.clone();
        debug!(
            path = %path.display(),
            duration_secs = asset.duration_secs,
            has_audio = asset.has_audio,
            "Probed media"
        );

        self.cache.write().await.insert(
            path,
            CacheEntry {
                fingerprint,
                asset: asset.clone(),
            },
        );
        Ok(asset)
    }

    /// Drops every cached probe.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTranscoder;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_media_not_found() {
        let prober = MediaProber::new(Arc::new(MockTranscoder::new()));
        let err = prober
            .probe_duration(Path::new("/definitely/not/here.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::MediaNotFound { .. }));
    }

    #[tokio::test]
    async fn test_relative_path_resolved_to_absolute() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("narration.wav");
        std::fs::write(&file, b"riff").unwrap();

        let transcoder = Arc::new(MockTranscoder::new());
        transcoder.set_duration(&file, 12.5).await;
        let prober = MediaProber::new(transcoder.clone());

        let asset = prober.probe_asset(&file, MediaKind::Audio).await.unwrap();
        assert!(asset.path.is_absolute());
        assert_eq!(asset.duration_secs, 12.5);
        assert!(asset.exists);
    }

    #[tokio::test]
    async fn test_cache_hit_and_invalidation() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("music.mp3");
        std::fs::write(&file, b"abc").unwrap();

        let transcoder = Arc::new(MockTranscoder::new());
        transcoder.set_duration(&file, 45.0).await;
        let prober = MediaProber::new(transcoder.clone());

        prober.probe_duration(&file).await.unwrap();
        prober.probe_duration(&file).await.unwrap();
        assert_eq!(transcoder.probe_count().await, 1);
        assert_eq!(prober.cached_len().await, 1);

        // A different length changes the fingerprint.
        std::fs::write(&file, b"abcdef").unwrap();
        transcoder.set_duration(&file, 50.0).await;
        let secs = prober.probe_duration(&file).await.unwrap();
        assert_eq!(secs, 50.0);
        assert_eq!(transcoder.probe_count().await, 2);
    }

    #[tokio::test]
    async fn test_non_numeric_duration_is_probe_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("broken.mp3");
        std::fs::write(&file, b"x").unwrap();

        let transcoder = Arc::new(MockTranscoder::new());
        transcoder.set_duration(&file, f64::NAN).await;
        let prober = MediaProber::new(transcoder);

        let err = prober.probe_duration(&file).await.unwrap_err();
        assert!(matches!(err, MediaError::ProbeError { .. }));
    }
}
