//! Error types for the transcoding engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while driving the external engine.
#[derive(Debug, Error)]
pub enum TranscoderError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The engine ran and exited unsuccessfully.
    #[error("{reason}")]
    ToolFailed { reason: String, stderr: String },

    /// Job timed out.
    #[error("Job timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Failed to probe media file.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// Failed to parse FFprobe output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// The engine reported success but the output file is absent.
    #[error("Output file not created: {path}")]
    OutputMissing { path: PathBuf },

    /// The job is not something this engine executes.
    #[error("Unsupported job: {kind}")]
    UnsupportedJob { kind: String },

    /// I/O error while running the engine.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscoderError {
    /// Creates a tool failure carrying the engine's stderr.
    pub fn tool_failed(reason: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::ToolFailed {
            reason: reason.into(),
            stderr: stderr.into(),
        }
    }

    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// The engine's own diagnostic output, when it produced any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::ToolFailed { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}
