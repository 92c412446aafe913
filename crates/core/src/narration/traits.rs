use async_trait::async_trait;
use std::path::Path;

use super::error::NarrationError;
use super::types::NarrationRequest;

/// Turns text into a speech audio file.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn name(&self) -> &str;

    /// Writes speech for `request` to `output`.
    async fn synthesize(&self, request: &NarrationRequest, output: &Path) -> Result<(), NarrationError>;
}
