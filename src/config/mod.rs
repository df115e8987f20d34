mod init;
mod schema;

pub use init::{write_starter_config, STARTER_CONFIG};
pub use schema::{RawConfig, Section};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::batch::ConfigSource;

/// Get the config directory path (~/.config/gradebook/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("gradebook"))
}

/// Get the default config file path (~/.config/gradebook/grading.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("grading.yaml"))
}

/// Load a raw grading configuration from a YAML file
///
/// # Errors
///
/// Returns an error if:
/// - The config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
///
/// Semantic checks (sections, key sets, thresholds) happen later in
/// [`crate::grading::ConfigModel::from_raw`].
pub fn load_config(path: &Path) -> Result<RawConfig> {
    if !path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Run `gradebook init` to create one",
            path.display()
        );
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: RawConfig = serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", path.display()))?;

    Ok(config)
}

/// Load a config file as a named source; the name is the path as given
pub fn load_config_source(path: &Path) -> Result<ConfigSource> {
    Ok(ConfigSource {
        name: path.display().to_string(),
        raw: load_config(path)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "TotalMarks: [unclosed").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid YAML"));
    }

    #[test]
    fn test_duplicate_grade_label_rejected_at_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "TotalMarks:\n  hw1: 40\nWeights:\n  hw1: 100\nGradeThresholds:\n  A: 85\n  A: 70\n  F: 0\nReportSettings: {{}}"
        )
        .unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid YAML"));
    }

    #[test]
    fn test_load_config_source_named_by_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "TotalMarks:\n  hw1: 40\nWeights:\n  hw1: 100").unwrap();
        let source = load_config_source(file.path()).unwrap();
        assert_eq!(source.name, file.path().display().to_string());
        assert!(source.raw.total_marks.is_some());
        assert!(source.raw.grade_thresholds.is_none());
    }

    #[test]
    fn test_default_path_ends_with_file_name() {
        if let Ok(path) = get_config_path() {
            assert!(path.ends_with(".config/gradebook/grading.yaml"));
        }
    }
}
