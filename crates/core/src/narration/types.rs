use serde::{Deserialize, Serialize};

use crate::config::Settings;

/// What to say and how, for one composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationRequest {
    pub text: String,
    /// Words per minute.
    pub rate: u32,
    pub voice_id: u32,
    /// Resample ratio; 1.0 leaves the voice untouched.
    pub pitch_factor: f64,
}

impl NarrationRequest {
    /// Builds a request from the user's persisted settings.
    pub fn from_settings(text: impl Into<String>, settings: &Settings) -> Self {
        Self {
            text: text.into(),
            rate: settings.narration_rate,
            voice_id: settings.voice_id,
            pitch_factor: settings.pitch_factor,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Whether the pitch shift would change anything.
    pub fn needs_pitch_shift(&self) -> bool {
        (self.pitch_factor - 1.0).abs() > f64::EPSILON
    }
}
