//! Error types for the media module.

use std::path::PathBuf;
use thiserror::Error;

use super::types::MediaKind;
use crate::engine::TranscoderError;

/// Errors raised while locating or probing media.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The file to probe does not exist.
    #[error("Media not found: {path}")]
    MediaNotFound { path: PathBuf },

    /// The engine answered, but not with a usable duration.
    #[error("Failed to probe {path}: {reason}")]
    ProbeError { path: PathBuf, reason: String },

    /// A logical asset name matched nothing in any asset directory.
    #[error("No {kind} asset named {name:?} in {searched:?}")]
    AssetNotFound {
        name: String,
        kind: MediaKind,
        searched: Vec<PathBuf>,
    },

    /// No name was selected and no default is configured.
    #[error("No {kind} asset selected and no default configured")]
    NoAssetSelected { kind: MediaKind },

    /// I/O error while inspecting the file system.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Creates a new probe error.
    pub fn probe(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ProbeError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Maps an engine failure during probing onto a media error for `path`.
    pub fn from_transcoder(path: impl Into<PathBuf>, err: TranscoderError) -> Self {
        let path = path.into();
        match err {
            TranscoderError::InputNotFound { path } => Self::MediaNotFound { path },
            other => Self::ProbeError {
                path,
                reason: other.to_string(),
            },
        }
    }
}
