use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

use crate::config::RawConfig;
use crate::error::{BatchError, ConfigError};
use crate::grading::{
    calculate_row, primary_key_of, validate_row, ConfigModel, RawRow, ScoredRow,
    StudentAggregator, SubjectRow,
};
use crate::report::{Report, ReportModel, StudentReport};

/// A named sequence of raw rows. The name identifies the dataset in errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub rows: Vec<RawRow>,
}

/// A named raw configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSource {
    pub name: String,
    pub raw: RawConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportMode {
    /// One combined report for every student
    #[default]
    ForAll,
    /// One isolated report per primary key
    PerStudent,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub mode: ReportMode,
    /// Score datasets on separate threads. Output order is unaffected.
    pub parallel: bool,
}

/// Index of the configuration governing each dataset.
///
/// One configuration governs every dataset; otherwise there must be exactly
/// one configuration per dataset, paired by position.
pub fn pair_configs(configs: usize, datasets: usize) -> Result<Vec<usize>, BatchError> {
    match (configs, datasets) {
        (_, 0) | (0, _) => Err(BatchError::InvalidMapping { configs, datasets }),
        (1, n) => Ok(vec![0; n]),
        (m, n) if m == n => Ok((0..n).collect()),
        _ => Err(BatchError::InvalidMapping { configs, datasets }),
    }
}

/// Validate, score and aggregate every dataset against its paired
/// configuration, then assemble the report model.
///
/// Pairing and all configurations are checked before any row is touched. The
/// first failing row, in input order, aborts the batch; no partial report is
/// produced.
pub fn run_batch(
    datasets: &[Dataset],
    configs: &[ConfigSource],
    options: &BatchOptions,
) -> Result<ReportModel, BatchError> {
    let pairing = pair_configs(configs.len(), datasets.len())?;

    let models: Vec<Arc<ConfigModel>> = configs
        .iter()
        .map(|source| ConfigModel::from_raw(&source.name, &source.raw).map(Arc::new))
        .collect::<Result<_, _>>()?;
    check_report_layout(&models)?;

    info!(
        datasets = datasets.len(),
        configs = models.len(),
        parallel = options.parallel,
        "grading batch"
    );

    let scored: Vec<Result<Vec<ScoredRow>, BatchError>> = if options.parallel {
        thread::scope(|scope| {
            let handles: Vec<_> = datasets
                .iter()
                .zip(&pairing)
                .map(|(dataset, &c)| {
                    let config = &models[c];
                    scope.spawn(move || score_dataset(dataset, config))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        })
    } else {
        datasets
            .iter()
            .zip(&pairing)
            .map(|(dataset, &c)| score_dataset(dataset, &models[c]))
            .collect()
    };

    // Merge point: datasets are absorbed strictly in input order
    let mut aggregator = StudentAggregator::new();
    for (result, &c) in scored.into_iter().zip(&pairing) {
        aggregator.absorb(&models[c], result?);
    }
    let students = aggregator.finish()?;

    let settings = models[0].settings().clone();
    let model = match options.mode {
        ReportMode::ForAll => ReportModel::Combined(Report::new(settings, students)),
        ReportMode::PerStudent => ReportModel::PerStudent(
            students
                .into_iter()
                .map(|student| StudentReport {
                    primary_key: student.primary_key.clone(),
                    report: Report::new(settings.clone(), vec![student]),
                })
                .collect(),
        ),
    };

    info!(students = model.student_count(), "batch complete");
    Ok(model)
}

/// The report takes its columns and toggles from the first config, so every
/// other config must agree with it on those.
fn check_report_layout(models: &[Arc<ConfigModel>]) -> Result<(), ConfigError> {
    let Some((first, rest)) = models.split_first() else {
        return Ok(());
    };
    let expected = first.settings();

    for model in rest {
        let found = model.settings();
        let checks = [
            ("_primary_key", expected.primary_key.clone(), found.primary_key.clone()),
            ("_secondary_key", expected.secondary_key.clone(), found.secondary_key.clone()),
            ("coloumns", expected.columns.join(", "), found.columns.join(", ")),
            (
                "_include_total_marks",
                expected.include_total_marks.to_string(),
                found.include_total_marks.to_string(),
            ),
            (
                "_include_overall_grade",
                expected.include_overall_grade.to_string(),
                found.include_overall_grade.to_string(),
            ),
        ];

        if let Some((key, expected, found)) = checks.into_iter().find(|(_, e, f)| e != f) {
            return Err(ConfigError::LayoutMismatch {
                config: model.name().to_string(),
                first: first.name().to_string(),
                key,
                expected,
                found,
            });
        }
    }
    Ok(())
}

/// Validate, score and grade every row of one dataset
pub fn score_dataset(dataset: &Dataset, config: &ConfigModel) -> Result<Vec<ScoredRow>, BatchError> {
    debug!(
        dataset = %dataset.name,
        config = config.name(),
        rows = dataset.rows.len(),
        "scoring dataset"
    );

    dataset
        .rows
        .iter()
        .enumerate()
        .map(|(i, raw)| score_row(&dataset.name, i + 1, raw, config))
        .collect()
}

fn score_row(
    dataset: &str,
    row: usize,
    raw: &RawRow,
    config: &ConfigModel,
) -> Result<ScoredRow, BatchError> {
    let validated = validate_row(raw, config).map_err(|source| BatchError::Row {
        dataset: dataset.to_string(),
        row,
        primary_key: primary_key_of(raw, config),
        source,
    })?;

    let score = calculate_row(&validated, config);

    let grade = config
        .scale()
        .assign(score.total)
        .map_err(|source| BatchError::Grade {
            dataset: dataset.to_string(),
            row,
            primary_key: validated.primary_key.clone(),
            source,
        })?;

    Ok(ScoredRow {
        subject: SubjectRow {
            dataset: dataset.to_string(),
            row,
            columns: validated.columns,
            components: score.components,
            total: score.total,
            grade: grade.label.clone(),
            passing: config.scale().is_passing(&grade.label),
        },
        primary_key: validated.primary_key,
        secondary_key: validated.secondary_key,
    })
}
