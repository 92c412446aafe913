use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::error::NarrationError;
use super::traits::SpeechSynthesizer;
use super::types::NarrationRequest;
use crate::engine::{PitchShift, Transcoder};

/// Raw synthesizer output, removed once shifted.
pub const RAW_NARRATION_FILE: &str = "narration_raw.wav";

/// Narration handed to the composition.
pub const NARRATION_FILE: &str = "narration.wav";

/// Synthesizes `request` into `work_dir` and applies its pitch shift.
///
/// Returns the path of the finished narration. Blank scripts are rejected
/// before the synthesizer runs.
pub async fn prepare_narration<S, T>(
    synthesizer: &S,
    transcoder: &T,
    request: &NarrationRequest,
    work_dir: &Path,
    sample_rate_hz: u32,
) -> Result<PathBuf, NarrationError>
where
    S: SpeechSynthesizer + ?Sized,
    T: Transcoder + ?Sized,
{
    if request.is_blank() {
        return Err(NarrationError::EmptyNarration);
    }

    tokio::fs::create_dir_all(work_dir).await?;
    let raw = work_dir.join(RAW_NARRATION_FILE);
    let narration = work_dir.join(NARRATION_FILE);

    info!(
        synthesizer = synthesizer.name(),
        chars = request.text.chars().count(),
        rate = request.rate,
        voice_id = request.voice_id,
        "Synthesizing narration"
    );
    if let Err(e) = synthesizer.synthesize(request, &raw).await {
        remove_if_present(&raw).await;
        return Err(e);
    }

    if request.needs_pitch_shift() {
        let shift = PitchShift {
            input: raw.clone(),
            output: narration.clone(),
            factor: request.pitch_factor,
            sample_rate_hz,
        };
        let shifted = transcoder.shift_pitch(&shift).await;
        remove_if_present(&raw).await;
        if let Err(e) = shifted {
            remove_if_present(&narration).await;
            return Err(e.into());
        }
        debug!(factor = request.pitch_factor, "Pitch shifted narration");
    } else {
        tokio::fs::rename(&raw, &narration).await?;
    }

    Ok(narration)
}

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed narration scratch file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove narration scratch file"),
    }
}
