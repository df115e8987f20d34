use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::batch::Dataset;
use crate::grading::{RawRow, RawValue};

/// Read a headered CSV file into a dataset named after its path.
pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open dataset at {}", path.display()))?;
    read_dataset_from(&path.display().to_string(), file)
}

/// Read headered CSV from any reader. Every cell becomes trimmed text; the
/// header row supplies the (case-sensitive) column names.
pub fn read_dataset_from<R: Read>(name: &str, reader: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .with_context(|| format!("{}: failed to read CSV header", name))?
        .clone();

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("{}: CSV parse error at row {}", name, row_idx + 1))?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| (column, RawValue::from(cell)))
            .collect();
        rows.push(row);
    }

    debug!(dataset = name, rows = rows.len(), "read dataset");

    Ok(Dataset {
        name: name.to_string(),
        rows,
    })
}

/// Expand dataset arguments. Arguments containing glob metacharacters are
/// expanded (sorted); plain paths are kept as given, in argument order.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        if !pattern.contains(&['*', '?', '['][..]) {
            paths.push(PathBuf::from(pattern));
            continue;
        }

        let mut matched: Vec<PathBuf> = glob::glob(pattern)
            .with_context(|| format!("Invalid glob pattern `{}`", pattern))?
            .collect::<Result<_, _>>()
            .with_context(|| format!("Failed to expand `{}`", pattern))?;
        if matched.is_empty() {
            anyhow::bail!("No files match `{}`", pattern);
        }
        matched.sort();
        paths.extend(matched);
    }
    Ok(paths)
}
