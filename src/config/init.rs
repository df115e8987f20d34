use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Annotated starting configuration written by `gradebook init`.
pub const STARTER_CONFIG: &str = r##"# Maximum marks per component. Keys must match dataset column names exactly.
TotalMarks:
  hw1: 40
  hw2: 40
  midterm: 100
  final: 100

# Weight of each component in percentage points (expected to sum to 100).
Weights:
  hw1: 10
  hw2: 10
  midterm: 30
  final: 50

# Grade label -> minimum percentage. Keep a catch-all floor such as F: 0.
GradeThresholds:
  A+: 95
  A: 85
  B: 70
  C: 55
  D: 40
  F: 0

ReportSettings:
  coloumns: ID, Name
  _primary_key: ID
  _secondary_key: Name
  _treat_missing_as_zero: false
  _include_total_marks: true
  _include_overall_grade: true
  _failing_grade: F
  _decimal_places: 2
  _report_title: Grade Report
  _header_bg_color: "#4F81BD"
  _header_text_color: "#FFFFFF"
  _table_bg_color: "#FFFFFF"
  _table_text_color: "#000000"
"##;

/// Write the starter config to `path`.
///
/// Refuses to overwrite an existing file. Parent directories are created and
/// the file is written atomically.
pub fn write_starter_config(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory at {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(STARTER_CONFIG.as_bytes())
        .context("Failed to write starter config")?;
    file.commit().context("Failed to save starter config")?;

    Ok(())
}
