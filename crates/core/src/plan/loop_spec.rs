//! Loop-then-trim planning for clips shorter than their slot.

use serde::{Deserialize, Serialize};

/// How a source clip covers a target duration.
///
/// When `loop_needed` is set the consumer repeats the source indefinitely and
/// caps the result at `target_duration_secs`; otherwise it only trims.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopSpec {
    pub source_duration_secs: f64,
    pub target_duration_secs: f64,
    pub loop_needed: bool,
}

impl LoopSpec {
    /// Smallest number of plays of the source that reaches the target.
    ///
    /// Informational only; the engine loops without a count and trims.
    pub fn min_plays(&self) -> u32 {
        if !self.loop_needed || self.source_duration_secs <= 0.0 {
            return 1;
        }
        (self.target_duration_secs / self.source_duration_secs).ceil() as u32
    }
}

/// Plans how `source_duration` covers `target_duration`.
///
/// A source exactly as long as the target is trimmed, not looped.
pub fn plan_loop(source_duration: f64, target_duration: f64) -> LoopSpec {
    LoopSpec {
        source_duration_secs: source_duration,
        target_duration_secs: target_duration,
        loop_needed: source_duration < target_duration,
    }
}
