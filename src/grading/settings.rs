use serde::Serialize;
use tracing::warn;

use super::raw::RawValue;
use crate::config::Section;
use crate::error::ConfigError;

const SECTION: &str = "ReportSettings";

/// An RGB colour used as a styling hint by report renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`, `#RGB` or a basic CSS colour name
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            let digits: Vec<u8> = hex
                .chars()
                .map(|c| c.to_digit(16).map(|d| d as u8))
                .collect::<Option<_>>()
                .ok_or_else(|| format!("invalid hex digits in `{}`", s))?;
            return match digits.as_slice() {
                [r, g, b] => Ok(Color::rgb(r * 17, g * 17, b * 17)),
                [r1, r2, g1, g2, b1, b2] => Ok(Color::rgb(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2)),
                _ => Err(format!("expected #RGB or #RRGGBB, got `{}`", s)),
            };
        }

        let named = match s.to_ascii_lowercase().as_str() {
            "black" => Color::rgb(0, 0, 0),
            "white" => Color::rgb(255, 255, 255),
            "red" => Color::rgb(255, 0, 0),
            "lime" => Color::rgb(0, 255, 0),
            "green" => Color::rgb(0, 128, 0),
            "blue" => Color::rgb(0, 0, 255),
            "yellow" => Color::rgb(255, 255, 0),
            "orange" => Color::rgb(255, 165, 0),
            "gray" | "grey" => Color::rgb(128, 128, 128),
            "silver" => Color::rgb(192, 192, 192),
            "navy" => Color::rgb(0, 0, 128),
            "maroon" => Color::rgb(128, 0, 0),
            "olive" => Color::rgb(128, 128, 0),
            "purple" => Color::rgb(128, 0, 128),
            "teal" => Color::rgb(0, 128, 128),
            "aqua" | "cyan" => Color::rgb(0, 255, 255),
            "fuchsia" | "magenta" => Color::rgb(255, 0, 255),
            _ => return Err(format!("unknown colour `{}`", s)),
        };
        Ok(named)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Typed report settings.
///
/// Booleans accept `true/false/yes/no/on/off/1/0`. The column selection is
/// not checked against data here; rows are checked when validated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSettings {
    /// Input columns carried through to the report, in order
    pub columns: Vec<String>,
    pub primary_key: String,
    pub secondary_key: String,
    pub treat_missing_as_zero: bool,
    pub include_total_marks: bool,
    pub include_overall_grade: bool,
    /// Label at or below which a grade fails (defaults to the lowest threshold)
    pub failing_grade: Option<String>,
    /// Rounding applied by renderers only
    pub decimal_places: usize,
    pub title: String,
    pub header_bg_color: Color,
    pub header_text_color: Color,
    pub table_bg_color: Color,
    pub table_text_color: Color,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            columns: vec!["ID".to_string(), "Name".to_string()],
            primary_key: "ID".to_string(),
            secondary_key: "Name".to_string(),
            treat_missing_as_zero: false,
            include_total_marks: true,
            include_overall_grade: true,
            failing_grade: None,
            decimal_places: 2,
            title: "Grade Report".to_string(),
            header_bg_color: Color::rgb(0x4F, 0x81, 0xBD),
            header_text_color: Color::rgb(0xFF, 0xFF, 0xFF),
            table_bg_color: Color::rgb(0xFF, 0xFF, 0xFF),
            table_text_color: Color::rgb(0x00, 0x00, 0x00),
        }
    }
}

impl ReportSettings {
    pub fn from_section(config: &str, section: &Section) -> Result<Self, ConfigError> {
        let mut settings = ReportSettings::default();
        let mut columns: Option<Vec<String>> = None;

        for (key, value) in section.iter() {
            let invalid = |reason: String| ConfigError::InvalidSetting {
                config: config.to_string(),
                section: SECTION,
                key: key.to_string(),
                value: value.to_string(),
                reason,
            };

            match key {
                "coloumns" | "columns" => {
                    columns = Some(
                        value
                            .to_string()
                            .split(',')
                            .map(str::trim)
                            .filter(|c| !c.is_empty())
                            .map(str::to_string)
                            .collect(),
                    );
                }
                "_primary_key" => settings.primary_key = parse_name(value).map_err(invalid)?,
                "_secondary_key" => settings.secondary_key = parse_name(value).map_err(invalid)?,
                "_treat_missing_as_zero" => {
                    settings.treat_missing_as_zero = parse_bool(value).map_err(invalid)?
                }
                "_include_total_marks" => {
                    settings.include_total_marks = parse_bool(value).map_err(invalid)?
                }
                "_include_overall_grade" => {
                    settings.include_overall_grade = parse_bool(value).map_err(invalid)?
                }
                "_failing_grade" => settings.failing_grade = Some(parse_name(value).map_err(invalid)?),
                "_decimal_places" => {
                    settings.decimal_places = parse_decimal_places(value).map_err(invalid)?
                }
                "_report_title" => settings.title = value.to_string(),
                "_header_bg_color" => settings.header_bg_color = parse_color(value).map_err(invalid)?,
                "_header_text_color" => {
                    settings.header_text_color = parse_color(value).map_err(invalid)?
                }
                "_table_bg_color" => settings.table_bg_color = parse_color(value).map_err(invalid)?,
                "_table_text_color" => {
                    settings.table_text_color = parse_color(value).map_err(invalid)?
                }
                other => warn!(config, key = other, "ignoring unknown report setting"),
            }
        }

        settings.columns = match columns {
            Some(columns) if !columns.is_empty() => columns,
            _ => vec![settings.primary_key.clone(), settings.secondary_key.clone()],
        };

        Ok(settings)
    }
}

fn parse_bool(value: &RawValue) -> Result<bool, String> {
    match value {
        RawValue::Bool(b) => Ok(*b),
        RawValue::Number(n) if *n == 0.0 => Ok(false),
        RawValue::Number(n) if *n == 1.0 => Ok(true),
        RawValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err("expected a boolean (true/false, yes/no, on/off, 1/0)".to_string()),
        },
        RawValue::Number(_) => Err("expected a boolean (true/false, yes/no, on/off, 1/0)".to_string()),
    }
}

fn parse_name(value: &RawValue) -> Result<String, String> {
    let name = value.to_string();
    if name.is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(name)
    }
}

fn parse_decimal_places(value: &RawValue) -> Result<usize, String> {
    match value.as_number() {
        Some(n) if n.fract() == 0.0 && (0.0..=10.0).contains(&n) => Ok(n as usize),
        _ => Err("expected a whole number between 0 and 10".to_string()),
    }
}

fn parse_color(value: &RawValue) -> Result<Color, String> {
    match value {
        RawValue::Text(s) => Color::parse(s),
        _ => Err("expected a colour such as #4F81BD or navy".to_string()),
    }
}
