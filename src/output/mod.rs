pub mod formatter;
pub mod render;

pub use formatter::{format_summary, should_use_colors};
pub use render::{format_number, render_csv, render_json};

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::batch::{run_batch, BatchOptions, ConfigSource, Dataset};
use crate::report::{Report, ReportModel};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }

    fn render(&self, report: &Report, generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
        match self {
            OutputFormat::Csv => render_csv(report),
            OutputFormat::Json => render_json(report, generated_at),
        }
    }
}

/// Write a finished report model to an explicit destination.
///
/// A combined report is written to `destination` itself. Per-student reports
/// are written as `<destination>/<key>.<ext>`, creating the directory.
/// Every file is rendered before anything is written, and each file is
/// written atomically. Returns the paths written, in report order.
pub fn write_report(
    model: &ReportModel,
    format: OutputFormat,
    destination: &Path,
    generated_at: DateTime<Utc>,
) -> Result<Vec<PathBuf>> {
    let files: Vec<(PathBuf, Vec<u8>)> = match model {
        ReportModel::Combined(report) => {
            vec![(destination.to_path_buf(), format.render(report, generated_at)?)]
        }
        ReportModel::PerStudent(reports) => {
            let mut used = HashSet::new();
            reports
                .iter()
                .map(|student| {
                    let stem = unique_stem(&mut used, &student.primary_key);
                    let path = destination.join(format!("{}.{}", stem, format.extension()));
                    Ok((path, format.render(&student.report, generated_at)?))
                })
                .collect::<Result<_>>()?
        }
    };

    if let ReportModel::PerStudent(_) = model {
        fs::create_dir_all(destination).with_context(|| {
            format!("Failed to create output directory at {}", destination.display())
        })?;
    }

    let mut written: Vec<PathBuf> = Vec::with_capacity(files.len());
    for (path, bytes) in files {
        if let Err(e) = write_atomic(&path, &bytes) {
            // Leave no partial report set behind
            for done in &written {
                if let Err(remove_err) = fs::remove_file(done) {
                    warn!(
                        path = %done.display(),
                        error = %remove_err,
                        "failed to remove partial report"
                    );
                }
            }
            return Err(e);
        }
        debug!(path = %path.display(), bytes = bytes.len(), "wrote report");
        written.push(path);
    }
    Ok(written)
}

/// Run a batch and write its report. A failed batch leaves `destination`
/// untouched; the `BatchError` can be recovered with `downcast_ref`.
pub fn run_and_write(
    datasets: &[Dataset],
    configs: &[ConfigSource],
    options: &BatchOptions,
    format: OutputFormat,
    destination: &Path,
    generated_at: DateTime<Utc>,
) -> Result<(ReportModel, Vec<PathBuf>)> {
    let model = run_batch(datasets, configs, options)?;
    let written = write_report(&model, format, destination, generated_at)?;
    Ok((model, written))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save report to {}", path.display()))?;
    Ok(())
}

/// File stem for a primary key: anything outside `[A-Za-z0-9._-]` becomes
/// `_`, and stems that collide after that get a numeric suffix.
fn unique_stem(used: &mut HashSet<String>, key: &str) -> String {
    let mut stem: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        stem = "student".to_string();
    }

    let mut candidate = stem.clone();
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{}-{}", stem, n);
        n += 1;
    }
    candidate
}
