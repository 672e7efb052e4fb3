use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validate::{FieldRule, ValidatorMap, compose_validators};
use crate::value::{FieldValue, Record, StepId};

/// Assessment area a dynamic step belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AreaRef {
    pub id: String,
    pub name: String,
}

/// Input kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    Boolean,
    Choice,
    Document,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Choice => "choice",
            FieldKind::Document => "document",
        }
    }

    /// Value a field of this kind starts with before the user touches it.
    pub fn blank_value(&self) -> FieldValue {
        match self {
            FieldKind::Boolean => FieldValue::Boolean(false),
            FieldKind::Document => FieldValue::Document(String::new()),
            FieldKind::Text | FieldKind::Number | FieldKind::Choice => {
                FieldValue::Text(String::new())
            }
        }
    }
}

/// Selectable option; for assessment steps the `id` is the option identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OptionChoice {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSpec {
    pub id: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<FieldRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,
}

impl FieldSpec {
    pub fn is_required(&self) -> bool {
        self.rules.contains(&FieldRule::Required)
    }
}

/// One page of the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepSpec {
    pub id: StepId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set on dynamic assessment steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<AreaRef>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl StepSpec {
    pub fn is_dynamic(&self) -> bool {
        self.area.is_some()
    }

    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.id == id)
    }

    /// Composed validators for fields carrying rules; `None` when no field has any.
    pub fn validators(&self) -> Option<ValidatorMap> {
        let map: ValidatorMap = self
            .fields
            .iter()
            .filter(|field| !field.rules.is_empty())
            .map(|field| {
                let validators = field.rules.iter().map(FieldRule::to_validator).collect();
                (field.id.clone(), compose_validators(validators))
            })
            .collect();
        if map.is_empty() { None } else { Some(map) }
    }

    /// Blank values for every declared field.
    pub fn blank_record(&self) -> Record {
        self.fields
            .iter()
            .map(|field| (field.id.clone(), field.kind.blank_value()))
            .collect()
    }
}
