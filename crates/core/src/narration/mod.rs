//! Narration module: text to a pitch-adjusted speech track.
//!
//! Every call builds its own [`NarrationRequest`] from the current settings;
//! no synthesizer state is shared between compositions.

mod command;
mod config;
mod error;
mod prepare;
mod traits;
mod types;

pub use command::CommandSynthesizer;
pub use config::SynthesizerConfig;
pub use error::NarrationError;
pub use prepare::{prepare_narration, NARRATION_FILE, RAW_NARRATION_FILE};
pub use traits::SpeechSynthesizer;
pub use types::NarrationRequest;
