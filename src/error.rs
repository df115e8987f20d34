//! Error and warning taxonomy for the grading engine.
//!
//! Configuration, row and grade errors are fatal and propagate to the batch
//! boundary with enough context to act on. Only aggregation warnings are
//! recovered locally and attached to the affected student record.

use serde::Serialize;
use thiserror::Error;

/// Malformed or inconsistent grading configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("config `{config}`: missing required section [{section}]")]
    MissingSection {
        config: String,
        section: &'static str,
    },

    #[error("config `{config}`: section [{section}] has no entries")]
    EmptySection {
        config: String,
        section: &'static str,
    },

    #[error(
        "config `{config}`: components in [TotalMarks] and [Weights] differ \
         (only in TotalMarks: {}; only in Weights: {})",
        list_or_none(.only_in_totals),
        list_or_none(.only_in_weights)
    )]
    KeySetMismatch {
        config: String,
        only_in_totals: Vec<String>,
        only_in_weights: Vec<String>,
    },

    #[error("config `{config}`: [GradeThresholds] {detail}")]
    ThresholdOrder { config: String, detail: String },

    #[error("config `{config}`: [{section}] {key} = `{value}`: {reason}")]
    InvalidSetting {
        config: String,
        section: &'static str,
        key: String,
        value: String,
        reason: String,
    },

    /// Configs in one batch disagree on a setting that shapes the shared report
    #[error(
        "config `{config}`: [ReportSettings] {key} is `{found}` but `{first}` uses `{expected}`; \
         configs graded together must share the report layout"
    )]
    LayoutMismatch {
        config: String,
        first: String,
        key: &'static str,
        expected: String,
        found: String,
    },
}

/// Non-fatal findings raised while building a configuration.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigWarning {
    #[error("config `{config}`: weights sum to {sum}, not 100")]
    WeightSum { config: String, sum: f64 },
}

/// A data row that cannot be scored. Row position is added by the batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("missing column `{column}`")]
    MissingColumn { column: String },

    #[error("missing key column `{column}`")]
    MissingKeyColumn { column: String },

    #[error("column `{column}`: `{value}` is not a number")]
    InvalidMarks { column: String, value: String },

    #[error("column `{column}`: negative marks {value}")]
    NegativeMarks { column: String, value: f64 },

    #[error("column `{column}`: marks {value} exceed the maximum of {total}")]
    MarksExceedTotal {
        column: String,
        value: f64,
        total: f64,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradeError {
    #[error(
        "percentage {percentage} is below every grade threshold \
         (lowest is `{lowest_label}` at {lowest_minimum})"
    )]
    NoMatchingGrade {
        percentage: f64,
        lowest_label: String,
        lowest_minimum: f64,
    },
}

/// Recoverable inconsistencies found while merging rows of one student.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregationWarning {
    #[error(
        "student `{primary_key}`: {dataset} row {row} has secondary key `{found}`, \
         expected `{expected}`"
    )]
    InconsistentSecondaryKey {
        primary_key: String,
        expected: String,
        found: String,
        dataset: String,
        row: usize,
    },
}

/// Everything that can abort a batch run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    #[error(
        "{configs} configuration(s) cannot be paired with {datasets} dataset(s); \
         provide one configuration for all datasets or exactly one per dataset"
    )]
    InvalidMapping { configs: usize, datasets: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{dataset} row {row}{}: {source}", key_suffix(.primary_key.as_deref()))]
    Row {
        dataset: String,
        row: usize,
        primary_key: Option<String>,
        source: RowError,
    },

    #[error("{dataset} row {row} (key `{primary_key}`): {source}")]
    Grade {
        dataset: String,
        row: usize,
        primary_key: String,
        source: GradeError,
    },

    #[error("student `{primary_key}`: overall grade: {source}")]
    Student {
        primary_key: String,
        source: GradeError,
    },
}

fn key_suffix(primary_key: Option<&str>) -> String {
    primary_key
        .map(|key| format!(" (key `{}`)", key))
        .unwrap_or_default()
}

fn list_or_none(keys: &[String]) -> String {
    if keys.is_empty() {
        "none".to_string()
    } else {
        keys.join(", ")
    }
}
