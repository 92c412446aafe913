//! Terminal errors of a composition and their machine-readable kinds.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::media::MediaError;
use crate::narration::NarrationError;
use crate::pipeline::{PipelineError, StageError};
use crate::plan::{JobKind, PlanError};

/// Machine-readable failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MediaNotFound,
    ProbeError,
    AssetNotFound,
    EmptyNarration,
    NoAssetSelected,
    MissingAsset,
    AssetTooShort,
    InvalidOutputPath,
    ExternalToolFailure,
    MissingIntermediate,
    PipelineError,
    InvalidPlan,
    Busy,
    Cancelled,
    Narration,
    Config,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Same spelling as the serialized form.
        let s = match self {
            ErrorKind::MediaNotFound => "media_not_found",
            ErrorKind::ProbeError => "probe_error",
            ErrorKind::AssetNotFound => "asset_not_found",
            ErrorKind::EmptyNarration => "empty_narration",
            ErrorKind::NoAssetSelected => "no_asset_selected",
            ErrorKind::MissingAsset => "missing_asset",
            ErrorKind::AssetTooShort => "asset_too_short",
            ErrorKind::InvalidOutputPath => "invalid_output_path",
            ErrorKind::ExternalToolFailure => "external_tool_failure",
            ErrorKind::MissingIntermediate => "missing_intermediate",
            ErrorKind::PipelineError => "pipeline_error",
            ErrorKind::InvalidPlan => "invalid_plan",
            ErrorKind::Busy => "busy",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Narration => "narration",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        };
        f.write_str(s)
    }
}

impl From<&StageError> for ErrorKind {
    fn from(err: &StageError) -> Self {
        match err {
            StageError::ExternalToolFailure { .. } => ErrorKind::ExternalToolFailure,
            StageError::Probe { .. } => ErrorKind::ProbeError,
            StageError::MediaNotFound { .. } => ErrorKind::MediaNotFound,
            StageError::MissingIntermediate { .. } => ErrorKind::MissingIntermediate,
            StageError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Errors returned by [`Composer`](super::Composer).
#[derive(Debug, Error)]
pub enum CompositionError {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Narration(#[from] NarrationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The output directory is missing or not writable.
    #[error("Invalid output path {path}: {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },
}

impl CompositionError {
    pub fn invalid_output(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidOutputPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Media(e) => match e {
                MediaError::MediaNotFound { .. } => ErrorKind::MediaNotFound,
                MediaError::ProbeError { .. } => ErrorKind::ProbeError,
                MediaError::AssetNotFound { .. } => ErrorKind::AssetNotFound,
                MediaError::NoAssetSelected { .. } => ErrorKind::NoAssetSelected,
                MediaError::Io(_) => ErrorKind::Io,
            },
            Self::Plan(e) => match e {
                PlanError::MissingAsset { .. } => ErrorKind::MissingAsset,
                PlanError::EmptyNarration { .. } => ErrorKind::EmptyNarration,
                PlanError::AssetTooShort { .. } => ErrorKind::AssetTooShort,
                PlanError::OutputIsInput { .. } => ErrorKind::InvalidOutputPath,
                PlanError::InvalidMix { .. } | PlanError::ForwardReference { .. } => {
                    ErrorKind::InvalidPlan
                }
            },
            Self::Pipeline(e) => match e {
                PipelineError::Busy => ErrorKind::Busy,
                PipelineError::Cancelled { .. } => ErrorKind::Cancelled,
                PipelineError::JobFailed { .. } => ErrorKind::PipelineError,
                PipelineError::TempDir { .. } => ErrorKind::Io,
            },
            Self::Narration(e) => match e {
                NarrationError::EmptyNarration => ErrorKind::EmptyNarration,
                _ => ErrorKind::Narration,
            },
            Self::Config(_) => ErrorKind::Config,
            Self::InvalidOutputPath { .. } => ErrorKind::InvalidOutputPath,
        }
    }

    /// Structured form for non-interactive callers.
    pub fn report(&self) -> ErrorReport {
        let mut report = ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
            job_index: None,
            job_kind: None,
            cause: None,
            diagnostic: None,
        };
        if let Self::Pipeline(PipelineError::JobFailed {
            job_index,
            kind,
            cause,
        }) = self
        {
            report.job_index = Some(*job_index);
            report.job_kind = Some(*kind);
            report.cause = Some(ErrorKind::from(cause));
            report.diagnostic = cause.diagnostic().map(str::to_string);
        }
        report
    }
}

/// Serializable failure: kind, message and, for failed jobs, which one and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_kind: Option<JobKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}
