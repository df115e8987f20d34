use serde::de::{self, Deserialize, Deserializer, Visitor};
use std::collections::HashMap;
use std::fmt;

/// A scalar exactly as it came out of a dataset or config source.
///
/// CSV cells always arrive as `Text`; YAML scalars keep their native type.
/// Numbers and booleans are only interpreted by the validating constructors.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl RawValue {
    /// Interpret the value as a number. Text is trimmed before parsing.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Text(s) => s.trim().parse().ok(),
            RawValue::Bool(_) => None,
        }
    }

    /// True for text cells that are empty after trimming
    pub fn is_blank(&self) -> bool {
        matches!(self, RawValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(s) => f.write_str(s.trim()),
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<i32> for RawValue {
    fn from(n: i32) -> Self {
        RawValue::Number(n as f64)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawValueVisitor;

        impl Visitor<'_> for RawValueVisitor {
            type Value = RawValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string, number or boolean")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<RawValue, E> {
                Ok(RawValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawValue, E> {
                Ok(RawValue::Number(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawValue, E> {
                Ok(RawValue::Number(v as f64))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<RawValue, E> {
                Ok(RawValue::Number(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RawValue, E> {
                Ok(RawValue::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<RawValue, E> {
                Ok(RawValue::Text(v))
            }

            fn visit_unit<E: de::Error>(self) -> Result<RawValue, E> {
                Ok(RawValue::Text(String::new()))
            }
        }

        deserializer.deserialize_any(RawValueVisitor)
    }
}

/// One input line: column name to raw cell value. Column names are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: HashMap<String, RawValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<RawValue>) {
        self.cells.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.cells.get(column)
    }

    /// Value of a column unless it is absent or blank
    pub fn present(&self, column: &str) -> Option<&RawValue> {
        self.get(column).filter(|v| !v.is_blank())
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_parses_as_number() {
        assert_eq!(RawValue::from(" 36 ").as_number(), Some(36.0));
        assert_eq!(RawValue::from("36.5").as_number(), Some(36.5));
        assert_eq!(RawValue::from("abc").as_number(), None);
        assert_eq!(RawValue::Bool(true).as_number(), None);
    }

    #[test]
    fn test_blank_detection() {
        assert!(RawValue::from("   ").is_blank());
        assert!(!RawValue::from("0").is_blank());
        assert!(!RawValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_display_trims_text() {
        assert_eq!(RawValue::from("  Ada ").to_string(), "Ada");
        assert_eq!(RawValue::Number(40.0).to_string(), "40");
    }

    #[test]
    fn test_row_present_skips_blank_cells() {
        let row: RawRow = [("ID", "1"), ("viva", "")].into_iter().collect();
        assert!(row.present("ID").is_some());
        assert!(row.get("viva").is_some());
        assert!(row.present("viva").is_none());
        assert!(row.present("missing").is_none());
    }

    #[test]
    fn test_deserialize_yaml_scalars() {
        let values: Vec<RawValue> = serde_saphyr::from_str("[40, 2.5, true, \"text\"]").unwrap();
        assert_eq!(
            values,
            vec![
                RawValue::Number(40.0),
                RawValue::Number(2.5),
                RawValue::Bool(true),
                RawValue::Text("text".to_string()),
            ]
        );
    }
}
