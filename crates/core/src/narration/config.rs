//! Configuration for the speech synthesizer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the command-line speech synthesizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizerConfig {
    /// Synthesis executable.
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Voice names, indexed by the `voice_id` setting.
    #[serde(default = "default_voices")]
    pub voices: Vec<String>,

    /// Extra arguments passed before the synthesizer's own flags.
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Directory the narration is written to.
    ///
    /// Kept apart from the pipeline temp namespace; the narration is an
    /// input of the run, not one of its intermediates.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Maximum time for one synthesis call.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_program() -> PathBuf {
    PathBuf::from("espeak-ng")
}

fn default_voices() -> Vec<String> {
    vec!["en-us".to_string(), "en-us+f3".to_string()]
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("narrate-narration")
}

fn default_timeout() -> u64 {
    300
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            voices: default_voices(),
            extra_args: Vec::new(),
            work_dir: default_work_dir(),
            timeout_secs: default_timeout(),
        }
    }
}

impl SynthesizerConfig {
    /// Voice name for `voice_id`, if configured.
    pub fn voice(&self, voice_id: u32) -> Option<&str> {
        self.voices.get(voice_id as usize).map(String::as_str)
    }
}
