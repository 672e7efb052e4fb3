//! Active-step tracking for a multi-step wizard.
//!
//! Advancing is gated by the current step's validators and persists the step
//! through the draft repository; retreating is always allowed; jumping is only
//! allowed back to steps that were already reached.

use thiserror::Error;
use tracing::debug;

use crate::draft::{Draft, DraftRepository};
use crate::spec::step::StepSpec;
use crate::validate::{FieldErrors, validate_form};
use crate::value::{FieldValue, Record};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("a wizard needs at least one step")]
    NoSteps,
    #[error("step index {index} is out of range (wizard has {total} steps)")]
    OutOfRange { index: usize, total: usize },
    #[error("step {index} has not been reached yet (furthest step is {highest})")]
    NotReached { index: usize, highest: usize },
    #[error("step '{step}' has no field '{field}'")]
    UnknownField { step: String, field: String },
    #[error("the wizard is on step {index}, not the last step")]
    NotAtLastStep { index: usize },
    #[error("the current step has invalid fields: {}", .0.keys().cloned().collect::<Vec<_>>().join(", "))]
    Invalid(FieldErrors),
}

/// Result of [`StepSequencer::next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Step saved and the wizard moved to this index.
    Moved(usize),
    /// Last step saved; nothing left to advance to.
    Completed,
    /// Validation failed; nothing was saved.
    Blocked(FieldErrors),
}

/// Render contract handed to presentation code.
#[derive(Debug, Clone, Copy)]
pub struct StepView<'a> {
    pub index: usize,
    pub total: usize,
    pub step: &'a StepSpec,
    pub data: &'a Record,
    pub errors: &'a FieldErrors,
}

impl StepView<'_> {
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }
}

pub struct StepSequencer<R> {
    steps: Vec<StepSpec>,
    repository: R,
    index: usize,
    highest_reached: usize,
    data: Vec<Record>,
    errors: FieldErrors,
}

impl<R: DraftRepository> StepSequencer<R> {
    /// Starts at step 0 with each step's data seeded from the stored draft.
    pub fn new(steps: Vec<StepSpec>, repository: R) -> Result<Self, SequenceError> {
        if steps.is_empty() {
            return Err(SequenceError::NoSteps);
        }
        let draft = repository.load();
        let data = seed_data(&steps, &draft);
        let highest_reached = reached_from(&steps, &draft);
        Ok(Self {
            steps,
            repository,
            index: 0,
            highest_reached,
            data,
            errors: FieldErrors::new(),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn highest_reached(&self) -> usize {
        self.highest_reached
    }

    pub fn total(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[StepSpec] {
        &self.steps
    }

    pub fn current_step(&self) -> &StepSpec {
        &self.steps[self.index]
    }

    pub fn current_data(&self) -> &Record {
        &self.data[self.index]
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn view(&self) -> StepView<'_> {
        StepView {
            index: self.index,
            total: self.steps.len(),
            step: &self.steps[self.index],
            data: &self.data[self.index],
            errors: &self.errors,
        }
    }

    /// Sets a field on the current step and clears its error.
    pub fn update(&mut self, field: &str, value: FieldValue) -> Result<(), SequenceError> {
        let step = &self.steps[self.index];
        if !step.fields.is_empty() && step.field(field).is_none() {
            return Err(SequenceError::UnknownField {
                step: step.title.clone(),
                field: field.to_string(),
            });
        }
        self.data[self.index].insert(field.to_string(), value);
        self.errors.remove(field);
        Ok(())
    }

    pub fn next(&mut self) -> Advance {
        let step = &self.steps[self.index];
        if let Some(validators) = step.validators() {
            let result = validate_form(&self.data[self.index], &validators);
            if !result.is_valid {
                debug!(step = step.id, errors = result.errors.len(), "step blocked");
                self.errors = result.errors.clone();
                return Advance::Blocked(result.errors);
            }
        }

        self.errors.clear();
        self.repository.save(step.id, &self.data[self.index]);

        if self.index + 1 < self.steps.len() {
            self.index += 1;
            self.highest_reached = self.highest_reached.max(self.index);
            debug!(index = self.index, "advanced step");
            Advance::Moved(self.index)
        } else {
            Advance::Completed
        }
    }

    pub fn previous(&mut self) -> usize {
        self.index = self.index.saturating_sub(1);
        self.errors.clear();
        self.index
    }

    pub fn jump_to(&mut self, index: usize) -> Result<(), SequenceError> {
        if index >= self.steps.len() {
            return Err(SequenceError::OutOfRange {
                index,
                total: self.steps.len(),
            });
        }
        if index > self.highest_reached {
            return Err(SequenceError::NotReached {
                index,
                highest: self.highest_reached,
            });
        }
        self.index = index;
        self.errors.clear();
        Ok(())
    }

    /// Data of every reached step, later steps overlaying earlier ones.
    ///
    /// Built from memory, so it holds the answers even when the repository
    /// failed to persist them.
    pub fn draft(&self) -> Draft {
        let mut draft = Draft::default();
        for (step, data) in self
            .steps
            .iter()
            .zip(&self.data)
            .take(self.highest_reached + 1)
        {
            draft.apply(step.id, data);
        }
        draft
    }

    /// Validates and saves the last step, then returns the merged answers.
    pub fn finish(&mut self) -> Result<Record, SequenceError> {
        if self.index + 1 != self.steps.len() {
            return Err(SequenceError::NotAtLastStep { index: self.index });
        }
        match self.next() {
            Advance::Blocked(errors) => Err(SequenceError::Invalid(errors)),
            Advance::Moved(_) | Advance::Completed => Ok(self.draft().merged().clone()),
        }
    }

    /// Drops the stored draft and returns to the first step with blank data.
    pub fn reset(&mut self) {
        self.repository.clear();
        self.data = seed_data(&self.steps, &Draft::default());
        self.index = 0;
        self.highest_reached = 0;
        self.errors.clear();
    }
}

/// A saved step means the user advanced past it, so the step after the
/// saved prefix was reached.
fn reached_from(steps: &[StepSpec], draft: &Draft) -> usize {
    let saved = steps
        .iter()
        .take_while(|step| draft.step(step.id).is_some())
        .count();
    saved.min(steps.len().saturating_sub(1))
}

fn seed_data(steps: &[StepSpec], draft: &Draft) -> Vec<Record> {
    steps
        .iter()
        .map(|step| {
            let mut record = step.blank_record();
            if let Some(saved) = draft.step(step.id) {
                record.extend(saved.iter().map(|(key, value)| (key.clone(), value.clone())));
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{DraftStore, MockDraftRepository};
    use crate::storage::MemoryBackend;
    use serde_json::json;

    fn steps() -> Vec<StepSpec> {
        serde_json::from_value(json!([
            {
                "id": 10,
                "title": "Applicant",
                "fields": [
                    { "id": "applicant_name", "title": "Name", "rules": [{ "rule": "required" }, { "rule": "min_length", "value": 3 }] }
                ]
            },
            { "id": 11, "title": "School", "fields": [{ "id": "school_code", "title": "Code" }] },
            { "id": 12, "title": "Review" }
        ]))
        .expect("steps")
    }

    fn empty_repository() -> MockDraftRepository {
        let mut repository = MockDraftRepository::new();
        repository.expect_load().returning(Draft::default);
        repository
    }

    #[test]
    fn failing_validator_blocks_without_saving() {
        let mut repository = empty_repository();
        repository.expect_save().times(0);
        let mut sequencer = StepSequencer::new(steps(), repository).unwrap();

        let advance = sequencer.next();
        assert!(matches!(advance, Advance::Blocked(ref errors) if errors.contains_key("applicant_name")));
        assert_eq!(sequencer.index(), 0);
        assert_eq!(
            sequencer.errors().get("applicant_name").map(String::as_str),
            Some("This field is required")
        );
    }

    #[test]
    fn passing_validator_saves_and_advances() {
        let mut repository = empty_repository();
        repository
            .expect_save()
            .withf(|step, data| {
                *step == 10 && data.get("applicant_name") == Some(&FieldValue::text("Uwase"))
            })
            .times(1)
            .return_const(());
        let mut sequencer = StepSequencer::new(steps(), repository).unwrap();

        sequencer
            .update("applicant_name", FieldValue::text("Uwase"))
            .unwrap();
        assert_eq!(sequencer.next(), Advance::Moved(1));
        assert_eq!(sequencer.index(), 1);
        assert_eq!(sequencer.highest_reached(), 1);
    }

    #[test]
    fn update_clears_field_error() {
        let mut sequencer = StepSequencer::new(steps(), empty_repository()).unwrap();
        sequencer.next();
        assert!(!sequencer.errors().is_empty());

        sequencer
            .update("applicant_name", FieldValue::text("ab"))
            .unwrap();
        assert!(sequencer.errors().is_empty());
    }

    #[test]
    fn update_rejects_undeclared_field() {
        let mut sequencer = StepSequencer::new(steps(), empty_repository()).unwrap();
        let err = sequencer
            .update("nickname", FieldValue::text("x"))
            .unwrap_err();
        assert!(matches!(err, SequenceError::UnknownField { .. }));
    }

    #[test]
    fn previous_is_clamped_at_zero() {
        let mut sequencer = StepSequencer::new(steps(), empty_repository()).unwrap();
        assert_eq!(sequencer.previous(), 0);
    }

    #[test]
    fn last_step_completes_without_moving() {
        let mut repository = empty_repository();
        repository.expect_save().times(3).return_const(());
        let mut sequencer = StepSequencer::new(steps(), repository).unwrap();
        sequencer
            .update("applicant_name", FieldValue::text("Mugisha"))
            .unwrap();

        assert_eq!(sequencer.next(), Advance::Moved(1));
        assert_eq!(sequencer.next(), Advance::Moved(2));
        assert_eq!(sequencer.next(), Advance::Completed);
        assert_eq!(sequencer.index(), 2);
    }

    #[test]
    fn finish_requires_last_step() {
        let mut sequencer = StepSequencer::new(steps(), empty_repository()).unwrap();
        assert_eq!(
            sequencer.finish().unwrap_err(),
            SequenceError::NotAtLastStep { index: 0 }
        );
    }

    #[test]
    fn finish_keeps_answers_when_storage_fails() {
        let store = DraftStore::new(MemoryBackend::new());
        store.backend().set_fail_writes(true);
        let mut sequencer = StepSequencer::new(steps(), &store).unwrap();
        sequencer
            .update("applicant_name", FieldValue::text("Aline"))
            .unwrap();
        assert_eq!(sequencer.next(), Advance::Moved(1));
        sequencer
            .update("school_code", FieldValue::text("120"))
            .unwrap();
        assert_eq!(sequencer.next(), Advance::Moved(2));

        let merged = sequencer.finish().unwrap();
        assert_eq!(
            merged.get("applicant_name"),
            Some(&FieldValue::text("Aline"))
        );
        assert_eq!(merged.get("school_code"), Some(&FieldValue::text("120")));
        assert!(store.load().is_empty());
        assert_eq!(
            sequencer
                .draft()
                .step(10)
                .and_then(|data| data.get("applicant_name")),
            Some(&FieldValue::text("Aline"))
        );
    }

    #[test]
    fn reopened_sequencer_can_jump_to_steps_reached_before() {
        let store = DraftStore::new(MemoryBackend::new());
        store.save(
            10,
            &Record::from([("applicant_name".into(), FieldValue::text("Aline"))]),
        );
        store.save(11, &Record::new());

        let mut sequencer = StepSequencer::new(steps(), &store).unwrap();
        assert_eq!(sequencer.index(), 0);
        assert_eq!(sequencer.highest_reached(), 2);
        assert_eq!(sequencer.jump_to(2), Ok(()));
        assert_eq!(sequencer.index(), 2);
    }

    #[test]
    fn saved_steps_after_a_gap_are_not_reachable() {
        let store = DraftStore::new(MemoryBackend::new());
        store.save(11, &Record::new());

        let mut sequencer = StepSequencer::new(steps(), &store).unwrap();
        assert_eq!(sequencer.highest_reached(), 0);
        assert_eq!(
            sequencer.jump_to(1),
            Err(SequenceError::NotReached {
                index: 1,
                highest: 0
            })
        );
    }

    #[test]
    fn reset_clears_repository() {
        let mut repository = empty_repository();
        repository.expect_clear().times(1).return_const(());
        let mut sequencer = StepSequencer::new(steps(), repository).unwrap();
        sequencer
            .update("applicant_name", FieldValue::text("Keza"))
            .unwrap();
        sequencer.reset();
        assert_eq!(
            sequencer.current_data().get("applicant_name"),
            Some(&FieldValue::text(""))
        );
    }

    #[test]
    fn empty_step_list_is_rejected() {
        assert_eq!(
            StepSequencer::new(Vec::new(), empty_repository()).err(),
            Some(SequenceError::NoSteps)
        );
    }
}
