//! Engine requests that sit outside the composition job chain.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resample-based pitch shift of a narration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchShift {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Ratio applied to the sample rate; below 1.0 lowers the voice.
    pub factor: f64,
    /// Rate the audio is declared at before shifting and resampled back to.
    pub sample_rate_hz: u32,
}

impl PitchShift {
    /// Sample rate the input is reinterpreted at.
    pub fn shifted_rate_hz(&self) -> u32 {
        (f64::from(self.sample_rate_hz) * self.factor).round().max(1.0) as u32
    }
}
