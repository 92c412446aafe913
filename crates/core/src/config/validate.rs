use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Narration rate and pitch factor are positive
/// - Minimum asset duration is not negative
/// - Frame geometry is usable for yuv420p output
/// - Sample rate and tool timeouts are non-zero
/// - Selected voice exists
/// - Output filename is a bare file name
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.settings.narration_rate == 0 {
        return Err(ConfigError::ValidationError(
            "settings.narration_rate cannot be 0".to_string(),
        ));
    }

    let pitch = config.settings.pitch_factor;
    if !pitch.is_finite() || pitch <= 0.0 {
        return Err(ConfigError::ValidationError(
            "settings.pitch_factor must be greater than 0".to_string(),
        ));
    }

    let min_duration = config.assets.min_duration_secs;
    if !min_duration.is_finite() || min_duration < 0.0 {
        return Err(ConfigError::ValidationError(
            "assets.min_duration_secs cannot be negative".to_string(),
        ));
    }

    let transcoder = &config.transcoder;
    if transcoder.frame_width == 0 || transcoder.frame_height == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder frame size cannot be 0".to_string(),
        ));
    }
    if transcoder.frame_width % 2 != 0 || transcoder.frame_height % 2 != 0 {
        return Err(ConfigError::ValidationError(
            "transcoder frame size must be even".to_string(),
        ));
    }
    if transcoder.frame_rate == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder.frame_rate cannot be 0".to_string(),
        ));
    }
    if transcoder.sample_rate_hz == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder.sample_rate_hz cannot be 0".to_string(),
        ));
    }
    if transcoder.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder.timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.synthesizer.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "synthesizer.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config
        .synthesizer
        .voice(config.settings.voice_id)
        .is_none()
    {
        return Err(ConfigError::ValidationError(format!(
            "settings.voice_id {} has no entry in synthesizer.voices",
            config.settings.voice_id
        )));
    }

    let filename = config.output.filename.trim();
    if filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains('/')
        || filename.contains('\\')
    {
        return Err(ConfigError::ValidationError(format!(
            "output.filename must be a bare file name, got {:?}",
            config.output.filename
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_rate_fails() {
        let mut config = Config::default();
        config.settings.narration_rate = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_non_positive_pitch_fails() {
        let mut config = Config::default();
        config.settings.pitch_factor = 0.0;
        assert!(validate_config(&config).is_err());

        config.settings.pitch_factor = f64::NAN;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_odd_frame_fails() {
        let mut config = Config::default();
        config.transcoder.frame_width = 1921;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_output_filename_with_directory_fails() {
        let mut config = Config::default();
        config.output.filename = "nested/out.mp4".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_unknown_voice_fails() {
        let mut config = Config::default();
        config.settings.voice_id = 5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_sample_rate_fails() {
        let mut config = Config::default();
        config.transcoder.sample_rate_hz = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(ref m) if m.contains("sample_rate_hz")));
    }

    #[test]
    fn test_validate_zero_timeouts_fail() {
        let mut config = Config::default();
        config.transcoder.timeout_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.synthesizer.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_dot_filenames_fail() {
        for name in [".", "..", " .. "] {
            let mut config = Config::default();
            config.output.filename = name.to_string();
            assert!(validate_config(&config).is_err(), "{name:?} accepted");
        }
    }
}
