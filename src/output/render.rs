use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::report::Report;

/// Render a report as CSV.
///
/// Header: selected columns, one weighted-score column per component, then
/// `Total` and `Grade` when enabled. One line per subject row, in the order
/// the engine produced them. Numbers are rounded to `_decimal_places` here
/// and nowhere else.
pub fn render_csv(report: &Report) -> Result<Vec<u8>> {
    let settings = &report.settings;
    let places = settings.decimal_places;

    let mut header: Vec<&str> = settings.columns.iter().map(String::as_str).collect();
    header.extend(report.components.iter().map(String::as_str));
    if settings.include_total_marks {
        header.push("Total");
    }
    if settings.include_overall_grade {
        header.push("Grade");
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header).context("Failed to write CSV header")?;

    for student in &report.students {
        for row in &student.rows {
            let mut record: Vec<String> = settings
                .columns
                .iter()
                .map(|column| {
                    row.columns
                        .iter()
                        .find(|(name, _)| name == column)
                        .map(|(_, value)| value.clone())
                        .unwrap_or_default()
                })
                .collect();

            for name in &report.components {
                let cell = row
                    .components
                    .iter()
                    .find(|c| &c.name == name)
                    .map(|c| format_number(c.weighted, places))
                    .unwrap_or_default();
                record.push(cell);
            }

            if settings.include_total_marks {
                record.push(format_number(row.total, places));
            }
            if settings.include_overall_grade {
                record.push(row.grade.clone());
            }

            writer
                .write_record(&record)
                .with_context(|| format!("Failed to write CSV row for `{}`", student.primary_key))?;
        }
    }

    writer.into_inner().context("Failed to flush CSV output")
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    report: &'a Report,
}

/// Render a report as pretty-printed JSON, stamped with `generated_at`.
/// Values are kept at full precision.
pub fn render_json(report: &Report, generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
    let document = JsonDocument {
        generated_at,
        report,
    };
    serde_json::to_vec_pretty(&document).context("Failed to serialize report")
}

pub fn format_number(value: f64, places: usize) -> String {
    format!("{:.*}", places, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::{ReportSettings, ScoredComponent, StudentRecord, SubjectRow};

    fn component(name: &str, weighted: f64) -> ScoredComponent {
        ScoredComponent {
            name: name.to_string(),
            obtained: 0.0,
            total_marks: 1.0,
            weight: 1.0,
            weighted,
            substituted: false,
        }
    }

    fn student(key: &str, name: &str, rows: Vec<(Vec<ScoredComponent>, f64, &str)>) -> StudentRecord {
        StudentRecord {
            primary_key: key.to_string(),
            secondary_key: name.to_string(),
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(i, (components, total, grade))| SubjectRow {
                    dataset: "scores.csv".to_string(),
                    row: i + 1,
                    columns: vec![
                        ("ID".to_string(), key.to_string()),
                        ("Name".to_string(), name.to_string()),
                    ],
                    components,
                    total,
                    grade: grade.to_string(),
                    passing: true,
                })
                .collect(),
            grand_total: None,
            overall_percentage: 0.0,
            overall_grade: None,
            passing: None,
            warnings: vec![],
        }
    }

    fn report(settings: ReportSettings) -> Report {
        Report::new(
            settings,
            vec![
                student(
                    "1",
                    "Ada",
                    vec![(vec![component("hw1", 9.0), component("exam", 81.0)], 90.0, "A")],
                ),
                student(
                    "2",
                    "Bo, Jr.",
                    vec![(vec![component("hw1", 100.0 / 3.0)], 100.0 / 3.0, "F")],
                ),
            ],
        )
    }

    #[test]
    fn test_render_csv() {
        let output = String::from_utf8(render_csv(&report(ReportSettings::default())).unwrap()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "ID,Name,hw1,exam,Total,Grade");
        assert_eq!(lines[1], "1,Ada,9.00,81.00,90.00,A");
        // Missing component left blank, names with commas quoted
        assert_eq!(lines[2], "2,\"Bo, Jr.\",33.33,,33.33,F");
    }

    #[test]
    fn test_render_csv_without_total_and_grade() {
        let settings = ReportSettings {
            include_total_marks: false,
            include_overall_grade: false,
            decimal_places: 1,
            columns: vec!["Name".to_string()],
            ..ReportSettings::default()
        };
        let output = String::from_utf8(render_csv(&report(settings)).unwrap()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Name,hw1,exam");
        assert_eq!(lines[1], "Ada,9.0,81.0");
    }

    #[test]
    fn test_render_json_keeps_precision() {
        let generated_at = DateTime::parse_from_rfc3339("2026-01-05T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let output = render_json(&report(ReportSettings::default()), generated_at).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();

        assert_eq!(value["generated_at"], "2026-01-05T10:00:00Z");
        assert_eq!(value["components"], serde_json::json!(["hw1", "exam"]));
        assert_eq!(value["settings"]["header_bg_color"], "#4F81BD");
        let total = value["students"][1]["rows"][0]["total"].as_f64().unwrap();
        assert!((total - 100.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(9.0, 2), "9.00");
        assert_eq!(format_number(84.996, 2), "85.00");
        assert_eq!(format_number(84.4, 0), "84");
    }
}
