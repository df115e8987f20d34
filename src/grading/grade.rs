use serde::Serialize;

use crate::error::{ConfigError, GradeError};

/// One grade label and the minimum percentage needed to earn it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeThreshold {
    pub label: String,
    pub minimum: f64,
}

impl GradeThreshold {
    pub fn new(label: impl Into<String>, minimum: f64) -> Self {
        Self {
            label: label.into(),
            minimum,
        }
    }
}

/// Grade thresholds sorted from highest minimum to lowest.
///
/// The failing label marks the pass/fail line: a grade passes only when its
/// minimum is strictly above the failing label's minimum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeScale {
    thresholds: Vec<GradeThreshold>,
    failing: usize,
}

impl GradeScale {
    /// Sort thresholds descending and reject duplicate labels or minimums.
    /// The failing label defaults to the lowest threshold.
    pub fn new(config: &str, mut thresholds: Vec<GradeThreshold>) -> Result<Self, ConfigError> {
        if thresholds.is_empty() {
            return Err(ConfigError::EmptySection {
                config: config.to_string(),
                section: "GradeThresholds",
            });
        }

        thresholds.sort_by(|a, b| b.minimum.total_cmp(&a.minimum));

        for (i, threshold) in thresholds.iter().enumerate() {
            for other in &thresholds[i + 1..] {
                if other.label == threshold.label {
                    return Err(ConfigError::ThresholdOrder {
                        config: config.to_string(),
                        detail: format!("label `{}` is defined twice", threshold.label),
                    });
                }
                if other.minimum == threshold.minimum {
                    return Err(ConfigError::ThresholdOrder {
                        config: config.to_string(),
                        detail: format!(
                            "`{}` and `{}` share the minimum {}",
                            threshold.label, other.label, threshold.minimum
                        ),
                    });
                }
            }
        }

        let failing = thresholds.len() - 1;
        Ok(Self {
            thresholds,
            failing,
        })
    }

    /// Set the label at or below which a grade counts as failing
    pub fn set_failing(&mut self, config: &str, label: &str) -> Result<(), ConfigError> {
        match self.thresholds.iter().position(|t| t.label == label) {
            Some(index) => {
                self.failing = index;
                Ok(())
            }
            None => Err(ConfigError::InvalidSetting {
                config: config.to_string(),
                section: "ReportSettings",
                key: "_failing_grade".to_string(),
                value: label.to_string(),
                reason: "not a label in [GradeThresholds]".to_string(),
            }),
        }
    }

    /// Thresholds from highest minimum to lowest
    pub fn thresholds(&self) -> &[GradeThreshold] {
        &self.thresholds
    }

    pub fn failing_label(&self) -> &str {
        &self.thresholds[self.failing].label
    }

    /// Return the first threshold, walking down from the highest minimum,
    /// whose minimum is at or below `percentage`.
    pub fn assign(&self, percentage: f64) -> Result<&GradeThreshold, GradeError> {
        self.thresholds
            .iter()
            .find(|t| t.minimum <= percentage)
            .ok_or_else(|| {
                let lowest = &self.thresholds[self.thresholds.len() - 1];
                GradeError::NoMatchingGrade {
                    percentage,
                    lowest_label: lowest.label.clone(),
                    lowest_minimum: lowest.minimum,
                }
            })
    }

    pub fn is_passing(&self, label: &str) -> bool {
        let floor = self.thresholds[self.failing].minimum;
        self.thresholds
            .iter()
            .find(|t| t.label == label)
            .is_some_and(|t| t.minimum > floor)
    }
}
