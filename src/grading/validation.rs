use super::model::ConfigModel;
use super::raw::{RawRow, RawValue};
use crate::error::RowError;

/// Numeric marks for one component after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentMark {
    pub name: String,
    pub obtained: f64,
    /// True when 0 was substituted for a missing value
    pub substituted: bool,
}

/// A raw row checked against a configuration.
///
/// `marks` is aligned with [`ConfigModel::components`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRow {
    pub primary_key: String,
    pub secondary_key: String,
    /// Selected passthrough columns, in settings order
    pub columns: Vec<(String, String)>,
    pub marks: Vec<ComponentMark>,
}

/// Validate one raw row. Marks are never clamped: out-of-range values fail.
pub fn validate_row(row: &RawRow, config: &ConfigModel) -> Result<ValidatedRow, RowError> {
    let settings = config.settings();

    let primary_key = key_value(row, &settings.primary_key)?;
    let secondary_key = key_value(row, &settings.secondary_key)?;

    let columns = settings
        .columns
        .iter()
        .map(|column| {
            row.get(column)
                .map(|value| (column.clone(), value.to_string()))
                .ok_or_else(|| RowError::MissingColumn {
                    column: column.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut marks = Vec::with_capacity(config.components().len());
    for component in config.components() {
        let (obtained, substituted) = match row.present(&component.name) {
            Some(value) => (parse_marks(&component.name, value)?, false),
            None if settings.treat_missing_as_zero => (0.0, true),
            None => {
                return Err(RowError::MissingColumn {
                    column: component.name.clone(),
                })
            }
        };

        if obtained < 0.0 {
            return Err(RowError::NegativeMarks {
                column: component.name.clone(),
                value: obtained,
            });
        }
        if obtained > component.total_marks {
            return Err(RowError::MarksExceedTotal {
                column: component.name.clone(),
                value: obtained,
                total: component.total_marks,
            });
        }

        marks.push(ComponentMark {
            name: component.name.clone(),
            obtained,
            substituted,
        });
    }

    Ok(ValidatedRow {
        primary_key,
        secondary_key,
        columns,
        marks,
    })
}

/// Best-effort primary key of a row, for error context
pub fn primary_key_of(row: &RawRow, config: &ConfigModel) -> Option<String> {
    row.present(&config.settings().primary_key)
        .map(|v| v.to_string())
}

fn key_value(row: &RawRow, column: &str) -> Result<String, RowError> {
    row.present(column)
        .map(|v| v.to_string())
        .ok_or_else(|| RowError::MissingKeyColumn {
            column: column.to_string(),
        })
}

fn parse_marks(column: &str, value: &RawValue) -> Result<f64, RowError> {
    match value.as_number() {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(RowError::InvalidMarks {
            column: column.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RawConfig, Section};

    fn config_with(settings: Section) -> ConfigModel {
        let raw = RawConfig {
            total_marks: Some([("hw1", 40), ("viva", 20)].into_iter().collect()),
            weights: Some([("hw1", 60), ("viva", 40)].into_iter().collect()),
            grade_thresholds: Some([("A", 85), ("F", 0)].into_iter().collect()),
            report_settings: Some(settings),
        };
        ConfigModel::from_raw("test", &raw).unwrap()
    }

    fn config() -> ConfigModel {
        config_with(Section::new())
    }

    #[test]
    fn test_valid_row() {
        let row: RawRow = [("ID", "7"), ("Name", "Ada"), ("hw1", "36"), ("viva", "15")]
            .into_iter()
            .collect();
        let validated = validate_row(&row, &config()).unwrap();
        assert_eq!(validated.primary_key, "7");
        assert_eq!(validated.secondary_key, "Ada");
        assert_eq!(
            validated.columns,
            vec![
                ("ID".to_string(), "7".to_string()),
                ("Name".to_string(), "Ada".to_string()),
            ]
        );
        assert_eq!(validated.marks[0].obtained, 36.0);
        assert_eq!(validated.marks[1].obtained, 15.0);
        assert!(!validated.marks[1].substituted);
    }

    #[test]
    fn test_missing_component_fails_without_policy() {
        let row: RawRow = [("ID", "7"), ("Name", "Ada"), ("hw1", "36")].into_iter().collect();
        let err = validate_row(&row, &config()).unwrap_err();
        assert_eq!(
            err,
            RowError::MissingColumn {
                column: "viva".to_string()
            }
        );
    }

    #[test]
    fn test_blank_component_counts_as_missing() {
        let row: RawRow = [("ID", "7"), ("Name", "Ada"), ("hw1", "36"), ("viva", " ")]
            .into_iter()
            .collect();
        let err = validate_row(&row, &config()).unwrap_err();
        assert!(matches!(err, RowError::MissingColumn { .. }));
    }

    #[test]
    fn test_missing_component_zero_with_policy() {
        let config = config_with([("_treat_missing_as_zero", true)].into_iter().collect());
        let row: RawRow = [("ID", "7"), ("Name", "Ada"), ("hw1", "36")].into_iter().collect();
        let validated = validate_row(&row, &config).unwrap();
        assert_eq!(validated.marks[1].obtained, 0.0);
        assert!(validated.marks[1].substituted);
    }

    #[test]
    fn test_negative_marks_rejected() {
        let row: RawRow = [("ID", "7"), ("Name", "Ada"), ("hw1", "-1"), ("viva", "10")]
            .into_iter()
            .collect();
        let err = validate_row(&row, &config()).unwrap_err();
        assert_eq!(
            err,
            RowError::NegativeMarks {
                column: "hw1".to_string(),
                value: -1.0
            }
        );
    }

    #[test]
    fn test_marks_above_total_not_clamped() {
        let row: RawRow = [("ID", "7"), ("Name", "Ada"), ("hw1", "40.5"), ("viva", "10")]
            .into_iter()
            .collect();
        let err = validate_row(&row, &config()).unwrap_err();
        assert_eq!(
            err,
            RowError::MarksExceedTotal {
                column: "hw1".to_string(),
                value: 40.5,
                total: 40.0
            }
        );
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let row: RawRow = [("ID", "7"), ("Name", "Ada"), ("hw1", "40"), ("viva", "0")]
            .into_iter()
            .collect();
        assert!(validate_row(&row, &config()).is_ok());
    }

    #[test]
    fn test_non_numeric_marks_rejected() {
        let row: RawRow = [("ID", "7"), ("Name", "Ada"), ("hw1", "absent"), ("viva", "10")]
            .into_iter()
            .collect();
        let err = validate_row(&row, &config()).unwrap_err();
        assert!(matches!(err, RowError::InvalidMarks { .. }));
    }

    #[test]
    fn test_missing_key_columns() {
        let row: RawRow = [("Name", "Ada"), ("hw1", "36"), ("viva", "15")].into_iter().collect();
        let err = validate_row(&row, &config()).unwrap_err();
        assert_eq!(
            err,
            RowError::MissingKeyColumn {
                column: "ID".to_string()
            }
        );

        let row: RawRow = [("ID", "7"), ("hw1", "36"), ("viva", "15")].into_iter().collect();
        let err = validate_row(&row, &config()).unwrap_err();
        assert_eq!(
            err,
            RowError::MissingKeyColumn {
                column: "Name".to_string()
            }
        );
        assert_eq!(primary_key_of(&row, &config()).as_deref(), Some("7"));
    }

    #[test]
    fn test_missing_selected_column() {
        let config = config_with([("coloumns", "ID, Name, Section")].into_iter().collect());
        let row: RawRow = [("ID", "7"), ("Name", "Ada"), ("hw1", "36"), ("viva", "15")]
            .into_iter()
            .collect();
        let err = validate_row(&row, &config).unwrap_err();
        assert_eq!(
            err,
            RowError::MissingColumn {
                column: "Section".to_string()
            }
        );
    }

    #[test]
    fn test_component_names_are_case_sensitive() {
        let row: RawRow = [("ID", "7"), ("Name", "Ada"), ("HW1", "36"), ("viva", "15")]
            .into_iter()
            .collect();
        let err = validate_row(&row, &config()).unwrap_err();
        assert_eq!(
            err,
            RowError::MissingColumn {
                column: "hw1".to_string()
            }
        );
    }
}
