use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value::{FieldValue, Record};

/// Maps a value to `None` when valid, or to a human-readable error.
pub type Validator = Arc<dyn Fn(&FieldValue) -> Option<String> + Send + Sync>;

/// Validators registered per field id.
pub type ValidatorMap = BTreeMap<String, Validator>;

/// Error messages keyed by failing field id.
pub type FieldErrors = BTreeMap<String, String>;

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("digits pattern is valid"));

/// Outcome of validating a whole record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FormValidation {
    pub is_valid: bool,
    pub errors: FieldErrors,
}

/// Declarative rule attached to a field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    Required,
    MinLength {
        value: usize,
    },
    Integer,
    Min {
        value: f64,
    },
    Max {
        value: f64,
    },
    Pattern {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl FieldRule {
    pub fn to_validator(&self) -> Validator {
        match self {
            FieldRule::Required => required(),
            FieldRule::MinLength { value } => min_length(*value),
            FieldRule::Integer => integer(),
            FieldRule::Min { value } => min_value(*value),
            FieldRule::Max { value } => max_value(*value),
            FieldRule::Pattern { value, message } => pattern(
                value,
                message.as_deref().unwrap_or("Value has an invalid format"),
            ),
        }
    }
}

/// Runs each validator in order and returns the first error.
pub fn compose_validators(validators: Vec<Validator>) -> Validator {
    Arc::new(move |value| validators.iter().find_map(|validator| validator(value)))
}

/// Value must be present and non-empty after trimming.
pub fn required() -> Validator {
    Arc::new(|value| value.is_blank().then(|| "This field is required".to_string()))
}

/// Text must contain at least `min` characters. Blank values pass.
pub fn min_length(min: usize) -> Validator {
    Arc::new(move |value| {
        let text = value.as_str()?;
        if text.is_empty() || text.chars().count() >= min {
            None
        } else {
            Some(format!("Must be at least {} characters", min))
        }
    })
}

/// Text must consist of digits only. Numbers must be whole and not negative.
pub fn integer() -> Validator {
    Arc::new(|value| match value {
        FieldValue::Text(text) if text.is_empty() || DIGITS.is_match(text) => None,
        FieldValue::Number(number) if number.fract() == 0.0 && *number >= 0.0 => None,
        FieldValue::Boolean(_) | FieldValue::Document(_) => None,
        _ => Some("Must be a whole number".to_string()),
    })
}

/// Numeric value must be `>= min`. Blank values pass.
pub fn min_value(min: f64) -> Validator {
    Arc::new(move |value| {
        if value.is_blank() {
            return None;
        }
        match value.as_number() {
            Some(number) if number >= min => None,
            Some(_) => Some(format!("Must be at least {}", FieldValue::Number(min))),
            None => Some("Must be a number".to_string()),
        }
    })
}

/// Numeric value must be `<= max`. Blank values pass.
pub fn max_value(max: f64) -> Validator {
    Arc::new(move |value| {
        if value.is_blank() {
            return None;
        }
        match value.as_number() {
            Some(number) if number <= max => None,
            Some(_) => Some(format!("Must be at most {}", FieldValue::Number(max))),
            None => Some("Must be a number".to_string()),
        }
    })
}

/// Text must match `expr`. Blank values pass; an invalid expression never fails.
pub fn pattern(expr: &str, message: &str) -> Validator {
    let regex = Regex::new(expr).ok();
    let message = message.to_string();
    Arc::new(move |value| {
        let text = value.as_str()?;
        let regex = regex.as_ref()?;
        if text.is_empty() || regex.is_match(text) {
            None
        } else {
            Some(message.clone())
        }
    })
}

/// Unregistered fields are implicitly valid.
pub fn validate_field(name: &str, value: &FieldValue, validators: &ValidatorMap) -> Option<String> {
    validators.get(name).and_then(|validator| validator(value))
}

pub fn validate_form(data: &Record, validators: &ValidatorMap) -> FormValidation {
    let errors: FieldErrors = data
        .iter()
        .filter_map(|(name, value)| {
            validate_field(name, value, validators).map(|message| (name.clone(), message))
        })
        .collect();

    FormValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

impl fmt::Display for FormValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid {
            return f.write_str("valid");
        }
        let entries = self
            .errors
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect::<Vec<_>>();
        f.write_str(&entries.join("; "))
    }
}
