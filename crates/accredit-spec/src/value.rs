use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifier of a wizard step.
pub type StepId = u32;

/// Field values keyed by field id. Iteration follows field-name order.
pub type Record = BTreeMap<String, FieldValue>;

/// A single form value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Reference to an uploaded document.
    Document(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// True for text and document references that are empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(text) | FieldValue::Document(text) => text.trim().is_empty(),
            FieldValue::Number(_) | FieldValue::Boolean(_) => false,
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, FieldValue::Document(_))
    }

    /// Numeric view of the value; text is parsed after trimming.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            FieldValue::Text(text) => text.trim().parse::<f64>().ok(),
            FieldValue::Boolean(_) | FieldValue::Document(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) | FieldValue::Document(text) => Some(text),
            _ => None,
        }
    }

    /// Display form used by renderers and identifier collection.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(text) | FieldValue::Document(text) => text.clone(),
            FieldValue::Number(value) => format_number(*value),
            FieldValue::Boolean(flag) => flag.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_detection_trims_text() {
        assert!(FieldValue::text("   ").is_blank());
        assert!(FieldValue::Document(String::new()).is_blank());
        assert!(!FieldValue::Number(0.0).is_blank());
        assert!(!FieldValue::Boolean(false).is_blank());
    }

    #[test]
    fn numbers_render_without_trailing_fraction() {
        assert_eq!(FieldValue::Number(12.0).as_text(), "12");
        assert_eq!(FieldValue::Number(2.5).as_text(), "2.5");
    }

    #[test]
    fn text_parses_as_number() {
        assert_eq!(FieldValue::text(" 42 ").as_number(), Some(42.0));
        assert_eq!(FieldValue::text("abc").as_number(), None);
    }

    #[test]
    fn serializes_as_tagged_value() {
        let value = serde_json::to_value(FieldValue::Document("doc-7".into())).unwrap();
        assert_eq!(value, json!({ "type": "document", "value": "doc-7" }));
    }
}
