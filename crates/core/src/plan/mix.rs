//! Declarative audio mix description.

use serde::{Deserialize, Serialize};

use super::error::PlanError;
use crate::media::MediaAsset;

/// How long a mix runs relative to its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationPolicy {
    /// The mix ends when the first listed input (the narration) ends.
    FirstInput,
}

/// Sources to mix, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixSpec {
    inputs: Vec<MediaAsset>,
    policy: DurationPolicy,
}

impl MixSpec {
    /// Builds a mix where the first input governs the duration.
    pub fn new(inputs: Vec<MediaAsset>) -> Result<Self, PlanError> {
        if inputs.len() < 2 {
            return Err(PlanError::invalid_mix(format!(
                "a mix needs at least two inputs, got {}",
                inputs.len()
            )));
        }
        Ok(Self {
            inputs,
            policy: DurationPolicy::FirstInput,
        })
    }

    pub fn inputs(&self) -> &[MediaAsset] {
        &self.inputs
    }

    pub fn policy(&self) -> DurationPolicy {
        self.policy
    }

    /// Duration of the mixed track.
    pub fn output_duration_secs(&self) -> f64 {
        match self.policy {
            DurationPolicy::FirstInput => self.inputs[0].duration_secs,
        }
    }

    /// Duration of the mixed track when the governing input starts late.
    pub fn output_duration_with_delay(&self, delay_secs: f64) -> f64 {
        delay_secs + self.output_duration_secs()
    }
}
