use std::path::PathBuf;
use thiserror::Error;

use crate::engine::TranscoderError;

/// Errors raised while producing a narration track.
#[derive(Debug, Error)]
pub enum NarrationError {
    /// The script is empty or whitespace.
    #[error("Narration script is empty")]
    EmptyNarration,

    #[error("Speech synthesizer not found: {program}")]
    SynthesizerNotFound { program: PathBuf },

    #[error("Unknown voice id {voice_id}")]
    UnknownVoice { voice_id: u32 },

    /// The synthesizer exited unsuccessfully.
    #[error("Speech synthesis failed: {reason}")]
    SynthesisFailed { reason: String, stderr: String },

    #[error("Speech synthesis timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The synthesizer reported success without writing audio.
    #[error("Synthesizer produced no audio at {path}")]
    OutputMissing { path: PathBuf },

    #[error("Pitch shift failed: {0}")]
    PitchShift(#[from] TranscoderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
