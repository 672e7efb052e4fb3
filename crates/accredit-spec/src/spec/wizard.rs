use std::collections::BTreeSet;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::step::StepSpec;
use crate::value::StepId;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read wizard spec {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse wizard spec: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("wizard '{0}' defines no steps")]
    Empty(String),
    #[error("step id {0} is defined more than once")]
    DuplicateStep(StepId),
    #[error("step {step} defines field '{field}' more than once")]
    DuplicateField { step: StepId, field: String },
}

/// Top-level wizard definition, loaded once and immutable for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WizardSpec {
    pub id: String,
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub steps: Vec<StepSpec>,
}

impl WizardSpec {
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let spec: WizardSpec = serde_json::from_str(json)?;
        spec.check()?;
        Ok(spec)
    }

    pub fn from_path(path: &Path) -> Result<Self, SpecError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SpecError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Rejects empty wizards and duplicate step or field identifiers.
    pub fn check(&self) -> Result<(), SpecError> {
        if self.steps.is_empty() {
            return Err(SpecError::Empty(self.id.clone()));
        }
        let mut step_ids = BTreeSet::new();
        for step in &self.steps {
            if !step_ids.insert(step.id) {
                return Err(SpecError::DuplicateStep(step.id));
            }
            let mut field_ids = BTreeSet::new();
            for field in &step.fields {
                if !field_ids.insert(field.id.as_str()) {
                    return Err(SpecError::DuplicateField {
                        step: step.id,
                        field: field.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn step(&self, id: StepId) -> Option<&StepSpec> {
        self.steps.iter().find(|step| step.id == id)
    }

    pub fn dynamic_steps(&self) -> impl Iterator<Item = &StepSpec> {
        self.steps.iter().filter(|step| step.is_dynamic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_duplicate_step_ids() {
        let json = json!({
            "id": "dup",
            "title": "Dup",
            "version": "1.0",
            "steps": [
                { "id": 1, "title": "a" },
                { "id": 1, "title": "b" }
            ]
        });
        let err = WizardSpec::from_json(&json.to_string()).unwrap_err();
        assert!(matches!(err, SpecError::DuplicateStep(1)));
    }

    #[test]
    fn rejects_duplicate_field_ids() {
        let json = json!({
            "id": "dup",
            "title": "Dup",
            "version": "1.0",
            "steps": [{
                "id": 0,
                "title": "a",
                "fields": [
                    { "id": "name", "title": "Name" },
                    { "id": "name", "title": "Again" }
                ]
            }]
        });
        let err = WizardSpec::from_json(&json.to_string()).unwrap_err();
        assert!(matches!(err, SpecError::DuplicateField { step: 0, .. }));
    }

    #[test]
    fn rejects_empty_wizard() {
        let json = json!({ "id": "none", "title": "None", "version": "1.0", "steps": [] });
        assert!(matches!(
            WizardSpec::from_json(&json.to_string()),
            Err(SpecError::Empty(_))
        ));
    }
}
