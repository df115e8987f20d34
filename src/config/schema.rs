use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;

use crate::grading::RawValue;

/// Raw grading configuration as read from a config file.
///
/// Sections are optional here so that a missing one can be reported by the
/// validating constructor with the config's name attached.
///
/// Example YAML:
/// ```yaml
/// TotalMarks:
///   hw1: 40
///   exam: 100
/// Weights:
///   hw1: 10
///   exam: 90
/// GradeThresholds:
///   A: 85
///   F: 0
/// ReportSettings:
///   coloumns: ID, Name
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    #[serde(rename = "TotalMarks", default)]
    pub total_marks: Option<Section>,

    #[serde(rename = "Weights", default)]
    pub weights: Option<Section>,

    #[serde(rename = "GradeThresholds", default)]
    pub grade_thresholds: Option<Section>,

    #[serde(rename = "ReportSettings", default)]
    pub report_settings: Option<Section>,
}

/// Ordered key/value section. Keys keep their source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    entries: Vec<(String, RawValue)>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry, replacing the value of an existing key in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for Section {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut section = Section::new();
        for (key, value) in iter {
            section.insert(key, value);
        }
        section
    }
}

impl<'de> Deserialize<'de> for Section {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SectionVisitor;

        impl<'de> Visitor<'de> for SectionVisitor {
            type Value = Section;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of keys to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Section, A::Error> {
                let mut section = Section::new();
                while let Some((key, value)) = map.next_entry::<String, RawValue>()? {
                    if section.contains_key(&key) {
                        return Err(de::Error::custom(format!("duplicate key `{}`", key)));
                    }
                    section.entries.push((key, value));
                }
                Ok(section)
            }
        }

        deserializer.deserialize_map(SectionVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parse_keeps_order() {
        let yaml = r#"
TotalMarks:
  quiz: 20
  hw1: 40
  exam: 100
Weights:
  quiz: 5
  hw1: 10
  exam: 85
GradeThresholds:
  A: 85
  F: 0
ReportSettings:
  coloumns: ID, Name
  _treat_missing_as_zero: true
"#;
        let config: RawConfig = serde_saphyr::from_str(yaml).unwrap();
        let totals = config.total_marks.unwrap();
        assert_eq!(totals.keys().collect::<Vec<_>>(), vec!["quiz", "hw1", "exam"]);
        assert_eq!(totals.get("hw1"), Some(&RawValue::Number(40.0)));

        let settings = config.report_settings.unwrap();
        assert_eq!(settings.get("coloumns"), Some(&RawValue::from("ID, Name")));
        assert_eq!(settings.get("_treat_missing_as_zero"), Some(&RawValue::Bool(true)));
    }

    #[test]
    fn test_missing_sections_are_none() {
        let yaml = r#"
TotalMarks:
  hw1: 40
"#;
        let config: RawConfig = serde_saphyr::from_str(yaml).unwrap();
        assert!(config.total_marks.is_some());
        assert!(config.weights.is_none());
        assert!(config.grade_thresholds.is_none());
        assert!(config.report_settings.is_none());
    }

    #[test]
    fn test_unknown_section_rejected() {
        let yaml = r#"
Totals:
  hw1: 40
"#;
        let result: Result<RawConfig, _> = serde_saphyr::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let yaml = r#"
TotalMarks:
  hw1: 40
  hw1: 50
"#;
        let result: Result<RawConfig, _> = serde_saphyr::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_section_insert_replaces_in_place() {
        let mut section: Section = [("a", 1), ("b", 2)].into_iter().collect();
        section.insert("a", 3);
        assert_eq!(section.len(), 2);
        assert_eq!(section.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(section.get("a"), Some(&RawValue::Number(3.0)));
    }
}
