use serde_json::{Map, Value, json};

use crate::sequencer::StepView;
use crate::spec::step::{FieldKind, OptionChoice};
use crate::value::FieldValue;

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The step is being filled in.
    Editing,
    /// The last attempt to advance failed validation.
    Invalid,
    /// Last step; advancing submits the wizard.
    Review,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::Editing => "editing",
            RenderStatus::Invalid => "invalid",
            RenderStatus::Review => "review",
        }
    }
}

/// Progress counters exposed to renderers.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    /// 1-based position of the active step.
    pub position: usize,
    pub total: usize,
}

/// Describes a single field for render outputs.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub kind: FieldKind,
    pub required: bool,
    pub current_value: Option<FieldValue>,
    pub choices: Vec<OptionChoice>,
    pub error: Option<String>,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct StepPayload {
    pub step_id: u32,
    pub title: String,
    pub description: Option<String>,
    pub area: Option<String>,
    pub status: RenderStatus,
    pub progress: RenderProgress,
    pub fields: Vec<RenderField>,
}

pub fn build_step_payload(view: &StepView<'_>) -> StepPayload {
    let fields = view
        .step
        .fields
        .iter()
        .map(|field| RenderField {
            id: field.id.clone(),
            title: field.title.clone(),
            description: field.description.clone(),
            kind: field.kind,
            required: field.is_required(),
            current_value: view.data.get(&field.id).cloned(),
            choices: field.choices.clone(),
            error: view.error(&field.id).map(str::to_string),
        })
        .collect();

    let status = if !view.errors.is_empty() {
        RenderStatus::Invalid
    } else if view.is_last() {
        RenderStatus::Review
    } else {
        RenderStatus::Editing
    };

    StepPayload {
        step_id: view.step.id,
        title: view.step.title.clone(),
        description: view.step.description.clone(),
        area: view.step.area.as_ref().map(|area| area.name.clone()),
        status,
        progress: RenderProgress {
            position: view.index + 1,
            total: view.total,
        },
        fields,
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &StepPayload) -> Value {
    let fields = payload
        .fields
        .iter()
        .map(|field| {
            let mut map = Map::new();
            map.insert("id".into(), Value::String(field.id.clone()));
            map.insert("title".into(), Value::String(field.title.clone()));
            map.insert(
                "description".into(),
                field
                    .description
                    .clone()
                    .map(Value::String)
                    .unwrap_or(Value::Null),
            );
            map.insert("type".into(), Value::String(field.kind.as_str().into()));
            map.insert("required".into(), Value::Bool(field.required));
            if let Some(value) = &field.current_value {
                map.insert("current_value".into(), value_to_json(value));
            }
            if !field.choices.is_empty() {
                map.insert(
                    "choices".into(),
                    Value::Array(
                        field
                            .choices
                            .iter()
                            .map(|choice| json!({ "id": choice.id, "label": choice.label }))
                            .collect(),
                    ),
                );
            }
            if let Some(error) = &field.error {
                map.insert("error".into(), Value::String(error.clone()));
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "step_id": payload.step_id,
        "title": payload.title,
        "description": payload.description,
        "area": payload.area,
        "status": payload.status.as_str(),
        "progress": {
            "position": payload.progress.position,
            "total": payload.progress.total,
        },
        "fields": fields,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &StepPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Step {}/{}: {}",
        payload.progress.position, payload.progress.total, payload.title
    ));
    if let Some(area) = &payload.area {
        lines.push(format!("Area: {}", area));
    }
    if let Some(description) = &payload.description {
        lines.push(description.clone());
    }
    if payload.status == RenderStatus::Invalid {
        lines.push("Please fix the highlighted fields.".to_string());
    }

    for field in &payload.fields {
        let mut entry = format!(" - {} ({})", field.id, field.title);
        if field.required {
            entry.push_str(" [required]");
        }
        if let Some(value) = field.current_value.as_ref().filter(|value| !value.is_blank()) {
            entry.push_str(&format!(" = {}", value));
        }
        lines.push(entry);
        if !field.choices.is_empty() {
            let choices = field
                .choices
                .iter()
                .map(|choice| format!("{}={}", choice.id, choice.label))
                .collect::<Vec<_>>();
            lines.push(format!("     choices: {}", choices.join(", ")));
        }
        if let Some(error) = &field.error {
            lines.push(format!("     ! {}", error));
        }
    }

    if payload.status == RenderStatus::Review {
        lines.push("Last step: continuing will finish the wizard.".to_string());
    }

    lines.join("\n")
}

fn value_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(text) | FieldValue::Document(text) => Value::String(text.clone()),
        FieldValue::Boolean(flag) => Value::Bool(*flag),
        FieldValue::Number(number) => serde_json::Number::from_f64(*number)
            .map(Value::Number)
            .unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::step::StepSpec;
    use crate::validate::FieldErrors;
    use crate::value::Record;

    fn step() -> StepSpec {
        serde_json::from_value(json!({
            "id": 3,
            "title": "Teaching and learning",
            "area": { "id": "TL", "name": "Teaching" },
            "fields": [
                {
                    "id": "lesson_plans",
                    "title": "Lesson plans",
                    "type": "choice",
                    "rules": [{ "rule": "required" }],
                    "choices": [{ "id": "opt-1", "label": "Available" }, { "id": "opt-2", "label": "Missing" }]
                }
            ]
        }))
        .expect("step")
    }

    #[test]
    fn invalid_status_carries_field_errors() {
        let step = step();
        let data = step.blank_record();
        let errors = FieldErrors::from([(
            "lesson_plans".to_string(),
            "This field is required".to_string(),
        )]);
        let view = StepView {
            index: 0,
            total: 2,
            step: &step,
            data: &data,
            errors: &errors,
        };

        let payload = build_step_payload(&view);
        assert_eq!(payload.status, RenderStatus::Invalid);
        let text = render_text(&payload);
        assert!(text.contains("Step 1/2: Teaching and learning"));
        assert!(text.contains("! This field is required"));
        assert!(text.contains("opt-1=Available"));
    }

    #[test]
    fn json_ui_exposes_values_and_choices() {
        let step = step();
        let data = Record::from([("lesson_plans".to_string(), FieldValue::text("opt-2"))]);
        let errors = FieldErrors::new();
        let view = StepView {
            index: 1,
            total: 2,
            step: &step,
            data: &data,
            errors: &errors,
        };

        let ui = render_json_ui(&build_step_payload(&view));
        assert_eq!(ui["status"], "review");
        assert_eq!(ui["area"], "Teaching");
        assert_eq!(ui["fields"][0]["current_value"], "opt-2");
        assert_eq!(ui["fields"][0]["choices"][1]["id"], "opt-2");
        assert!(ui["fields"][0].get("error").is_none());
    }
}
