//! Error types for job planning.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning probed assets into a job sequence.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A required asset did not resolve to an existing file.
    #[error("Missing {role} asset: {path}")]
    MissingAsset { role: String, path: PathBuf },

    /// The narration has no measurable length.
    #[error("Narration is empty: {path}")]
    EmptyNarration { path: PathBuf },

    /// An asset is below the configured minimum duration.
    #[error("{role} asset {path} is {duration_secs:.3}s, shorter than the {min_secs:.3}s minimum")]
    AssetTooShort {
        role: String,
        path: PathBuf,
        duration_secs: f64,
        min_secs: f64,
    },

    /// The destination file is one of the composition's own inputs.
    #[error("Output {path} would overwrite the {role} asset")]
    OutputIsInput { role: String, path: PathBuf },

    /// A mix was described with unusable inputs.
    #[error("Invalid mix: {reason}")]
    InvalidMix { reason: String },

    /// A job reads a file no earlier job produces and no asset provides.
    #[error("Job {job_index} reads {path}, which is not available at that point")]
    ForwardReference { job_index: usize, path: PathBuf },
}

impl PlanError {
    pub fn missing(role: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::MissingAsset {
            role: role.into(),
            path: path.into(),
        }
    }

    pub fn invalid_mix(reason: impl Into<String>) -> Self {
        Self::InvalidMix {
            reason: reason.into(),
        }
    }
}
