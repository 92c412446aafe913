//! Error types for the pipeline module.

use std::path::PathBuf;
use thiserror::Error;

use crate::engine::TranscoderError;
use crate::plan::JobKind;

/// Why a single job failed.
#[derive(Debug, Error)]
pub enum StageError {
    /// The engine ran and reported failure.
    #[error("External tool failed: {reason}")]
    ExternalToolFailure { reason: String, diagnostic: String },

    /// A clip could not be measured, or measured differently than planned.
    #[error("Failed to probe {path}: {reason}")]
    Probe { path: PathBuf, reason: String },

    /// An original asset vanished after planning.
    #[error("Media not found: {path}")]
    MediaNotFound { path: PathBuf },

    /// An earlier job's output is not where the plan expects it.
    #[error("Intermediate file missing: {path}")]
    MissingIntermediate { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StageError {
    /// Maps an engine error raised while running a job.
    pub fn from_transcoder(err: TranscoderError) -> Self {
        match err {
            TranscoderError::ToolFailed { reason, stderr } => Self::ExternalToolFailure {
                reason,
                diagnostic: stderr,
            },
            TranscoderError::InputNotFound { path } => Self::MediaNotFound { path },
            TranscoderError::OutputMissing { path } => Self::MissingIntermediate { path },
            TranscoderError::Io(e) => Self::Io(e),
            other => Self::ExternalToolFailure {
                reason: other.to_string(),
                diagnostic: String::new(),
            },
        }
    }

    /// Engine diagnostic text, verbatim.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::ExternalToolFailure { diagnostic, .. } if !diagnostic.is_empty() => {
                Some(diagnostic.as_str())
            }
            _ => None,
        }
    }
}

/// Errors returned by [`PipelineExecutor`](super::PipelineExecutor).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Another run holds the temp namespace.
    #[error("Another composition is already running")]
    Busy,

    /// A job failed; everything it and earlier jobs wrote has been removed.
    #[error("Job {job_index} ({kind}) failed: {cause}")]
    JobFailed {
        job_index: usize,
        kind: JobKind,
        #[source]
        cause: StageError,
    },

    /// The run was cancelled before `job_index` started.
    #[error("Composition cancelled before job {job_index}")]
    Cancelled { job_index: usize },

    /// The temp namespace could not be prepared.
    #[error("Failed to prepare temp directory {path}: {source}")]
    TempDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Index of the job the run stopped at, when it got that far.
    pub fn job_index(&self) -> Option<usize> {
        match self {
            Self::JobFailed { job_index, .. } | Self::Cancelled { job_index } => Some(*job_index),
            _ => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::JobFailed { cause, .. } => cause.diagnostic(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failure_keeps_stderr_verbatim() {
        let stderr = "[aac @ 0x1] Too many bits\nConversion failed!";
        let stage = StageError::from_transcoder(TranscoderError::tool_failed("exit 1", stderr));
        assert_eq!(stage.diagnostic(), Some(stderr));

        let err = PipelineError::JobFailed {
            job_index: 1,
            kind: JobKind::MixAudio,
            cause: stage,
        };
        assert_eq!(err.job_index(), Some(1));
        assert_eq!(err.diagnostic(), Some(stderr));
        assert!(err.to_string().contains("mix_audio"));
    }

    #[test]
    fn test_missing_output_is_missing_intermediate() {
        let stage = StageError::from_transcoder(TranscoderError::OutputMissing {
            path: PathBuf::from("/scratch/mixed_audio.m4a"),
        });
        assert!(matches!(stage, StageError::MissingIntermediate { .. }));
    }

    #[test]
    fn test_timeout_is_tool_failure() {
        let stage = StageError::from_transcoder(TranscoderError::Timeout { timeout_secs: 5 });
        assert!(matches!(stage, StageError::ExternalToolFailure { .. }));
        assert!(stage.diagnostic().is_none());
    }
}
