use serde::Serialize;
use tracing::{debug, warn};

use super::grade::{GradeScale, GradeThreshold};
use super::raw::RawValue;
use super::settings::ReportSettings;
use crate::config::{RawConfig, Section};
use crate::error::{ConfigError, ConfigWarning};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// One gradable component: its maximum marks and its weight in percentage points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentSpec {
    pub name: String,
    pub total_marks: f64,
    pub weight: f64,
}

/// Validated grading configuration.
///
/// Built once per configuration source via [`ConfigModel::from_raw`] and
/// never mutated afterwards; every row it governs reads it through a shared
/// reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigModel {
    name: String,
    components: Vec<ComponentSpec>,
    scale: GradeScale,
    settings: ReportSettings,
    warnings: Vec<ConfigWarning>,
}

impl ConfigModel {
    /// Validate a raw configuration.
    ///
    /// Sections are checked in order: TotalMarks, Weights, GradeThresholds,
    /// ReportSettings. A weight sum other than 100 is recorded as a warning,
    /// never rejected.
    pub fn from_raw(name: &str, raw: &RawConfig) -> Result<Self, ConfigError> {
        let totals = require(name, raw.total_marks.as_ref(), "TotalMarks")?;
        let weights = require(name, raw.weights.as_ref(), "Weights")?;
        let thresholds = require(name, raw.grade_thresholds.as_ref(), "GradeThresholds")?;
        let settings = require(name, raw.report_settings.as_ref(), "ReportSettings")?;

        if totals.is_empty() {
            return Err(ConfigError::EmptySection {
                config: name.to_string(),
                section: "TotalMarks",
            });
        }

        let mut parsed_totals = Vec::with_capacity(totals.len());
        for (key, value) in totals.iter() {
            let total = parse_number(name, "TotalMarks", key, value)?;
            if total <= 0.0 {
                return Err(invalid(name, "TotalMarks", key, value, "maximum marks must be greater than zero"));
            }
            parsed_totals.push((key, total));
        }

        let mut parsed_weights = Vec::with_capacity(weights.len());
        for (key, value) in weights.iter() {
            let weight = parse_number(name, "Weights", key, value)?;
            if weight < 0.0 {
                return Err(invalid(name, "Weights", key, value, "weight must not be negative"));
            }
            parsed_weights.push((key, weight));
        }

        // Component keys must match exactly (case-sensitive) in both sections
        let only_in_totals: Vec<String> = totals
            .keys()
            .filter(|k| !weights.contains_key(k))
            .map(str::to_string)
            .collect();
        let only_in_weights: Vec<String> = weights
            .keys()
            .filter(|k| !totals.contains_key(k))
            .map(str::to_string)
            .collect();
        if !only_in_totals.is_empty() || !only_in_weights.is_empty() {
            return Err(ConfigError::KeySetMismatch {
                config: name.to_string(),
                only_in_totals,
                only_in_weights,
            });
        }

        let components: Vec<ComponentSpec> = parsed_totals
            .into_iter()
            .map(|(key, total_marks)| {
                let weight = parsed_weights
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, w)| *w)
                    .unwrap_or_default();
                ComponentSpec {
                    name: key.to_string(),
                    total_marks,
                    weight,
                }
            })
            .collect();

        let mut warnings = Vec::new();
        let weight_sum: f64 = components.iter().map(|c| c.weight).sum();
        if (weight_sum - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
            warn!(config = name, sum = weight_sum, "weights do not sum to 100");
            warnings.push(ConfigWarning::WeightSum {
                config: name.to_string(),
                sum: weight_sum,
            });
        }

        let mut parsed_thresholds = Vec::with_capacity(thresholds.len());
        for (label, value) in thresholds.iter() {
            let minimum = parse_number(name, "GradeThresholds", label, value)?;
            parsed_thresholds.push(GradeThreshold::new(label, minimum));
        }
        let mut scale = GradeScale::new(name, parsed_thresholds)?;

        let settings = ReportSettings::from_section(name, settings)?;
        if let Some(ref label) = settings.failing_grade {
            scale.set_failing(name, label)?;
        }

        debug!(
            config = name,
            components = components.len(),
            thresholds = scale.thresholds().len(),
            "loaded grading config"
        );

        Ok(Self {
            name: name.to_string(),
            components,
            scale,
            settings,
            warnings,
        })
    }

    /// Identifier of the configuration source (usually its file path)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Components in the order they appear in TotalMarks
    pub fn components(&self) -> &[ComponentSpec] {
        &self.components
    }

    pub fn scale(&self) -> &GradeScale {
        &self.scale
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    pub fn warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }

    pub fn weight_sum(&self) -> f64 {
        self.components.iter().map(|c| c.weight).sum()
    }
}

fn require<'a>(
    config: &str,
    section: Option<&'a Section>,
    name: &'static str,
) -> Result<&'a Section, ConfigError> {
    section.ok_or_else(|| ConfigError::MissingSection {
        config: config.to_string(),
        section: name,
    })
}

fn parse_number(
    config: &str,
    section: &'static str,
    key: &str,
    value: &RawValue,
) -> Result<f64, ConfigError> {
    match value.as_number() {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(invalid(config, section, key, value, "expected a number")),
    }
}

fn invalid(
    config: &str,
    section: &'static str,
    key: &str,
    value: &RawValue,
    reason: &str,
) -> ConfigError {
    ConfigError::InvalidSetting {
        config: config.to_string(),
        section,
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
