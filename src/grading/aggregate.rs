use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use super::engine::ScoredComponent;
use super::model::ConfigModel;
use crate::error::{AggregationWarning, BatchError};

/// One scored input row inside a student record (typically one subject).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectRow {
    pub dataset: String,
    /// 1-based data row number within the dataset
    pub row: usize,
    pub columns: Vec<(String, String)>,
    pub components: Vec<ScoredComponent>,
    pub total: f64,
    pub grade: String,
    pub passing: bool,
}

/// A scored row waiting to be grouped by student.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRow {
    pub primary_key: String,
    pub secondary_key: String,
    pub subject: SubjectRow,
}

/// All rows of one student plus the derived totals.
///
/// `grand_total` is present only with `_include_total_marks`; `overall_grade`
/// and `passing` only with `_include_overall_grade`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub primary_key: String,
    pub secondary_key: String,
    pub rows: Vec<SubjectRow>,
    pub grand_total: Option<f64>,
    /// Mean of the row totals
    pub overall_percentage: f64,
    pub overall_grade: Option<String>,
    pub passing: Option<bool>,
    pub warnings: Vec<AggregationWarning>,
}

struct PendingStudent {
    primary_key: String,
    secondary_key: String,
    config: Arc<ConfigModel>,
    rows: Vec<SubjectRow>,
    warnings: Vec<AggregationWarning>,
}

/// Groups scored rows by primary key in first-seen order.
///
/// Datasets must be absorbed in input order; that order alone decides the
/// order of students and of their rows.
#[derive(Default)]
pub struct StudentAggregator {
    students: Vec<PendingStudent>,
    index: HashMap<String, usize>,
}

impl StudentAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every row of one dataset, scored against `config`
    pub fn absorb(&mut self, config: &Arc<ConfigModel>, rows: Vec<ScoredRow>) {
        for row in rows {
            self.push(config, row);
        }
    }

    pub fn push(&mut self, config: &Arc<ConfigModel>, row: ScoredRow) {
        match self.index.get(&row.primary_key) {
            Some(&i) => {
                let student = &mut self.students[i];
                if student.secondary_key != row.secondary_key {
                    let warning = AggregationWarning::InconsistentSecondaryKey {
                        primary_key: row.primary_key.clone(),
                        expected: student.secondary_key.clone(),
                        found: row.secondary_key.clone(),
                        dataset: row.subject.dataset.clone(),
                        row: row.subject.row,
                    };
                    warn!("{}", warning);
                    student.warnings.push(warning);
                }
                student.rows.push(row.subject);
            }
            None => {
                self.index.insert(row.primary_key.clone(), self.students.len());
                self.students.push(PendingStudent {
                    primary_key: row.primary_key,
                    secondary_key: row.secondary_key,
                    config: Arc::clone(config),
                    rows: vec![row.subject],
                    warnings: Vec::new(),
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Derive totals and overall grades. Each student is finalised with the
    /// configuration that governed their first row.
    pub fn finish(self) -> Result<Vec<StudentRecord>, BatchError> {
        self.students.into_iter().map(finalize).collect()
    }
}

fn finalize(student: PendingStudent) -> Result<StudentRecord, BatchError> {
    let settings = student.config.settings();
    let grand_total: f64 = student.rows.iter().map(|r| r.total).sum();
    let overall_percentage = grand_total / student.rows.len() as f64;

    let (overall_grade, passing) = if settings.include_overall_grade {
        let scale = student.config.scale();
        let grade = scale
            .assign(overall_percentage)
            .map_err(|source| BatchError::Student {
                primary_key: student.primary_key.clone(),
                source,
            })?;
        (
            Some(grade.label.clone()),
            Some(scale.is_passing(&grade.label)),
        )
    } else {
        (None, None)
    };

    Ok(StudentRecord {
        primary_key: student.primary_key,
        secondary_key: student.secondary_key,
        grand_total: settings.include_total_marks.then_some(grand_total),
        overall_percentage,
        overall_grade,
        passing,
        rows: student.rows,
        warnings: student.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RawConfig, Section};

    fn config(settings: Section) -> Arc<ConfigModel> {
        let raw = RawConfig {
            total_marks: Some([("hw", 100)].into_iter().collect()),
            weights: Some([("hw", 100)].into_iter().collect()),
            grade_thresholds: Some([("A", 85), ("B", 70), ("F", 0)].into_iter().collect()),
            report_settings: Some(settings),
        };
        Arc::new(ConfigModel::from_raw("test", &raw).unwrap())
    }

    fn scored(key: &str, name: &str, dataset: &str, row: usize, total: f64) -> ScoredRow {
        ScoredRow {
            primary_key: key.to_string(),
            secondary_key: name.to_string(),
            subject: SubjectRow {
                dataset: dataset.to_string(),
                row,
                columns: vec![],
                components: vec![],
                total,
                grade: String::new(),
                passing: true,
            },
        }
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let config = config(Section::new());
        let mut aggregator = StudentAggregator::new();
        aggregator.absorb(
            &config,
            vec![
                scored("2", "Bo", "maths.csv", 1, 60.0),
                scored("1", "Ada", "maths.csv", 2, 90.0),
                scored("2", "Bo", "maths.csv", 3, 80.0),
            ],
        );
        assert_eq!(aggregator.len(), 2);

        let records = aggregator.finish().unwrap();
        let keys: Vec<_> = records.iter().map(|r| r.primary_key.as_str()).collect();
        assert_eq!(keys, vec!["2", "1"]);

        let bo = &records[0];
        assert_eq!(bo.rows.len(), 2);
        assert_eq!(bo.rows[0].row, 1);
        assert_eq!(bo.rows[1].row, 3);
        assert_eq!(bo.grand_total, Some(140.0));
        assert_eq!(bo.overall_percentage, 70.0);
        assert_eq!(bo.overall_grade.as_deref(), Some("B"));
        assert_eq!(bo.passing, Some(true));
    }

    #[test]
    fn test_rows_accumulate_across_datasets() {
        let config = config(Section::new());
        let mut aggregator = StudentAggregator::new();
        aggregator.absorb(&config, vec![scored("1", "Ada", "maths.csv", 1, 90.0)]);
        aggregator.absorb(&config, vec![scored("1", "Ada", "physics.csv", 1, 50.0)]);

        let records = aggregator.finish().unwrap();
        assert_eq!(records.len(), 1);
        let datasets: Vec<_> = records[0].rows.iter().map(|r| r.dataset.as_str()).collect();
        assert_eq!(datasets, vec!["maths.csv", "physics.csv"]);
        assert_eq!(records[0].grand_total, Some(140.0));
    }

    #[test]
    fn test_inconsistent_secondary_key_is_a_warning() {
        let config = config(Section::new());
        let mut aggregator = StudentAggregator::new();
        aggregator.absorb(
            &config,
            vec![
                scored("1", "Ada", "maths.csv", 1, 90.0),
                scored("1", "Ada L.", "maths.csv", 2, 80.0),
            ],
        );

        let records = aggregator.finish().unwrap();
        assert_eq!(records[0].secondary_key, "Ada");
        assert_eq!(records[0].rows.len(), 2);
        assert_eq!(
            records[0].warnings,
            vec![AggregationWarning::InconsistentSecondaryKey {
                primary_key: "1".to_string(),
                expected: "Ada".to_string(),
                found: "Ada L.".to_string(),
                dataset: "maths.csv".to_string(),
                row: 2,
            }]
        );
    }

    #[test]
    fn test_totals_and_grade_toggles() {
        let config = config(
            [
                ("_include_total_marks", false),
                ("_include_overall_grade", false),
            ]
            .into_iter()
            .collect(),
        );
        let mut aggregator = StudentAggregator::new();
        aggregator.absorb(&config, vec![scored("1", "Ada", "maths.csv", 1, 90.0)]);

        let record = &aggregator.finish().unwrap()[0];
        assert_eq!(record.grand_total, None);
        assert_eq!(record.overall_grade, None);
        assert_eq!(record.passing, None);
        assert_eq!(record.overall_percentage, 90.0);
    }

    #[test]
    fn test_failing_overall_grade() {
        let config = config(Section::new());
        let mut aggregator = StudentAggregator::new();
        aggregator.absorb(&config, vec![scored("1", "Ada", "maths.csv", 1, 12.0)]);
        let record = &aggregator.finish().unwrap()[0];
        assert_eq!(record.overall_grade.as_deref(), Some("F"));
        assert_eq!(record.passing, Some(false));
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let config = config(Section::new());
        let rows = vec![
            scored("3", "Cy", "a.csv", 1, 71.5),
            scored("1", "Ada", "a.csv", 2, 88.0),
            scored("3", "Cy", "a.csv", 3, 64.25),
        ];

        let run = || {
            let mut aggregator = StudentAggregator::new();
            aggregator.absorb(&config, rows.clone());
            aggregator.finish().unwrap()
        };
        assert_eq!(run(), run());
    }
}
