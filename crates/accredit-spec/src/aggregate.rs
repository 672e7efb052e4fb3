use crate::draft::Draft;
use crate::spec::step::StepSpec;
use crate::value::FieldValue;

/// Field-name suffix marking supporting-document uploads on assessment steps.
pub const DOCUMENT_SUFFIX: &str = "_document";

/// Collects selected option identifiers across all dynamic (area) steps.
///
/// Steps are visited in definition order and each step's fields in field-name
/// order. Document fields, flags, and blank values are skipped; duplicates
/// are kept.
pub fn collect_option_ids(steps: &[StepSpec], draft: &Draft) -> Vec<String> {
    steps
        .iter()
        .filter(|step| step.is_dynamic())
        .filter_map(|step| draft.step(step.id))
        .flat_map(|record| record.iter())
        .filter(|(key, _)| !key.ends_with(DOCUMENT_SUFFIX))
        .filter_map(|(_, value)| match value {
            FieldValue::Text(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            FieldValue::Number(_) => Some(value.as_text()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{DraftRepository, DraftStore};
    use crate::storage::MemoryBackend;
    use crate::value::Record;
    use serde_json::json;

    fn steps() -> Vec<StepSpec> {
        serde_json::from_value(json!([
            { "id": 0, "title": "School" },
            { "id": 1, "title": "Governance", "area": { "id": "A1", "name": "Governance" } },
            { "id": 2, "title": "Facilities", "area": { "id": "A2", "name": "Facilities" } }
        ]))
        .expect("steps")
    }

    fn record(entries: Vec<(&str, FieldValue)>) -> Record {
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }

    #[test]
    fn collects_in_step_then_field_name_order() {
        let store = DraftStore::new(MemoryBackend::new());
        store.save(
            0,
            &record(vec![("school_option", FieldValue::text("not-collected"))]),
        );
        store.save(
            2,
            &record(vec![
                ("indicator_b", FieldValue::text("opt-9")),
                ("indicator_a", FieldValue::text("opt-8")),
            ]),
        );
        store.save(
            1,
            &record(vec![
                ("indicator_z", FieldValue::text("opt-2")),
                ("indicator_c", FieldValue::text("opt-1")),
                ("indicator_c_document", FieldValue::text("upload-1")),
                ("evidence", FieldValue::Document("upload-2".into())),
                ("skipped", FieldValue::text("  ")),
            ]),
        );

        let ids = collect_option_ids(&steps(), &store.load());
        assert_eq!(ids, vec!["opt-1", "opt-2", "opt-8", "opt-9"]);
    }

    #[test]
    fn duplicates_are_kept() {
        let store = DraftStore::new(MemoryBackend::new());
        store.save(1, &record(vec![("a", FieldValue::text("opt-1"))]));
        store.save(2, &record(vec![("a", FieldValue::text("opt-1"))]));
        assert_eq!(
            collect_option_ids(&steps(), &store.load()),
            vec!["opt-1", "opt-1"]
        );
    }

    #[test]
    fn empty_draft_yields_nothing() {
        assert!(collect_option_ids(&steps(), &Draft::default()).is_empty());
    }
}
