use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration, merging the file (if any) and environment over defaults.
///
/// A missing file is not an error: the defaults stand in for it.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NARRATE_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Persist configuration as TOML, creating the parent directory if needed.
pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let text =
        toml::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))?;
    write_file(path, &text)
}

/// Records `output_dir` as `[settings].last_output_path` in the file at `path`.
///
/// Only that key changes; everything else in the file is kept as written and
/// values coming from defaults or the environment are not persisted.
pub fn save_last_output_path(path: &Path, output_dir: &str) -> Result<(), ConfigError> {
    let mut doc = match std::fs::read_to_string(path) {
        Ok(text) => text
            .parse::<toml::Table>()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
        Err(e) => return Err(ConfigError::WriteError(e.to_string())),
    };

    let settings = doc
        .entry("settings")
        .or_insert(toml::Value::Table(toml::Table::new()))
        .as_table_mut()
        .ok_or_else(|| ConfigError::ParseError("[settings] is not a table".to_string()))?;
    settings.insert(
        "last_output_path".to_string(),
        toml::Value::String(output_dir.to_string()),
    );

    let text = toml::to_string_pretty(&doc).map_err(|e| ConfigError::WriteError(e.to_string()))?;
    write_file(path, &text)
}

fn write_file(path: &Path, text: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
    }
    std::fs::write(path, text).map_err(|e| ConfigError::WriteError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[settings]
narration_rate = 150
voice_id = 2
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.settings.narration_rate, 150);
        assert_eq!(config.settings.voice_id, 2);
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[settings]
narration_rate = "fast"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/narrate.toml")).unwrap();
        assert_eq!(config.settings.narration_rate, 195);
        assert_eq!(config.output.filename, "composition.mp4");
    }

    #[test]
    fn test_load_config_merges_partial_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[settings]
last_output_path = "/videos"

[output]
filename = "final.mp4"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.settings.last_output_path, "/videos");
        assert_eq!(config.settings.pitch_factor, 0.35);
        assert_eq!(config.output.filename, "final.mp4");
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("narrate.toml");

        let mut config = Config::default();
        config.settings.last_output_path = "/out".to_string();
        config.settings.voice_id = 3;
        save_config(&path, &config).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.settings.last_output_path, "/out");
        assert_eq!(loaded.settings.voice_id, 3);
    }

    #[test]
    fn test_save_last_output_path_keeps_rest_of_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("narrate.toml");
        std::fs::write(
            &path,
            r#"
[settings]
voice_id = 1

[output]
filename = "final.mp4"
"#,
        )
        .unwrap();

        save_last_output_path(&path, "/videos").unwrap();

        let doc: toml::Table = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        let settings = doc["settings"].as_table().unwrap();
        assert_eq!(settings["last_output_path"].as_str(), Some("/videos"));
        assert_eq!(settings["voice_id"].as_integer(), Some(1));
        assert!(!settings.contains_key("narration_rate"));
        assert_eq!(doc["output"]["filename"].as_str(), Some("final.mp4"));
        assert!(!doc.contains_key("transcoder"));
    }

    #[test]
    fn test_save_last_output_path_creates_minimal_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("narrate.toml");

        save_last_output_path(&path, "/out").unwrap();

        let doc: toml::Table = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(load_config(&path).unwrap().settings.last_output_path, "/out");
    }

    #[test]
    fn test_save_last_output_path_rejects_malformed_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "settings = 3").unwrap();

        let result = save_last_output_path(temp_file.path(), "/out");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
