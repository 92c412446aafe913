//! Speech synthesis through an external command.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::SynthesizerConfig;
use super::error::NarrationError;
use super::traits::SpeechSynthesizer;
use super::types::NarrationRequest;

/// Drives an espeak-compatible synthesizer.
///
/// The script is fed on stdin so it is never parsed as a flag.
pub struct CommandSynthesizer {
    config: SynthesizerConfig,
}

impl CommandSynthesizer {
    pub fn new(config: SynthesizerConfig) -> Self {
        Self { config }
    }

    pub fn build_args(&self, request: &NarrationRequest, output: &Path) -> Result<Vec<OsString>, NarrationError> {
        let voice = self
            .config
            .voice(request.voice_id)
            .ok_or(NarrationError::UnknownVoice {
                voice_id: request.voice_id,
            })?;

        let mut args: Vec<OsString> = self.config.extra_args.iter().map(OsString::from).collect();
        args.push("-s".into());
        args.push(request.rate.to_string().into());
        args.push("-v".into());
        args.push(voice.into());
        args.push("-w".into());
        args.push(output.as_os_str().to_owned());
        args.push("--stdin".into());
        Ok(args)
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    fn name(&self) -> &str {
        "command"
    }

    async fn synthesize(&self, request: &NarrationRequest, output: &Path) -> Result<(), NarrationError> {
        let args = self.build_args(request, output)?;
        debug!(program = %self.config.program.display(), args = ?args, "Running synthesizer");

        let mut child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    NarrationError::SynthesizerNotFound {
                        program: self.config.program.clone(),
                    }
                } else {
                    NarrationError::Io(e)
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(request.text.as_bytes()).await?;
            // Closing stdin ends the input.
            drop(stdin);
        }

        let result = timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| NarrationError::Timeout {
            timeout_secs: self.config.timeout_secs,
        })??;

        if !result.status.success() {
            return Err(NarrationError::SynthesisFailed {
                reason: format!("synthesizer exited with code: {:?}", result.status.code()),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(NarrationError::OutputMissing {
                path: output.to_path_buf(),
            });
        }
        Ok(())
    }
}
