//! Mock speech synthesizer for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::narration::{NarrationError, NarrationRequest, SpeechSynthesizer};

/// Mock implementation of the SpeechSynthesizer trait.
///
/// Records requests and writes a placeholder audio file. An injected failure
/// leaves a truncated file behind.
#[derive(Debug, Default)]
pub struct MockSynthesizer {
    requests: Arc<RwLock<Vec<NarrationRequest>>>,
    next_error: Arc<RwLock<Option<NarrationError>>>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests received so far.
    pub async fn requests(&self) -> Vec<NarrationRequest> {
        self.requests.read().await.clone()
    }

    /// Configure the next synthesis to fail with the given error.
    pub async fn set_next_error(&self, error: NarrationError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn synthesize(&self, request: &NarrationRequest, output: &Path) -> Result<(), NarrationError> {
        self.requests.write().await.push(request.clone());

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // A failing run still leaves a truncated file, like a killed synthesizer.
        if let Some(err) = self.next_error.write().await.take() {
            tokio::fs::write(output, b"RIFF").await?;
            return Err(err);
        }

        tokio::fs::write(output, b"RIFF mock speech").await?;
        Ok(())
    }
}
