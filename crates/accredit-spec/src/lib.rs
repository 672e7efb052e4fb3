#![allow(missing_docs)]

pub mod aggregate;
pub mod draft;
pub mod pagination;
pub mod render;
pub mod sequencer;
pub mod spec;
pub mod storage;
pub mod submission;
pub mod validate;
pub mod value;

pub use aggregate::{DOCUMENT_SUFFIX, collect_option_ids};
pub use draft::{DEFAULT_DRAFT_KEY, Draft, DraftRepository, DraftStore};
pub use pagination::Pagination;
pub use render::{
    RenderField, RenderProgress, RenderStatus, StepPayload, build_step_payload, render_json_ui,
    render_text,
};
pub use sequencer::{Advance, SequenceError, StepSequencer, StepView};
pub use spec::{AreaRef, FieldKind, FieldSpec, OptionChoice, SpecError, StepSpec, WizardSpec};
pub use storage::{FileBackend, MemoryBackend, StorageBackend, StorageError};
pub use submission::{Applicant, SubmissionError, SubmissionRecord};
pub use validate::{
    FieldErrors, FieldRule, FormValidation, Validator, ValidatorMap, compose_validators, integer,
    max_value, min_length, min_value, pattern, required, validate_field, validate_form,
};
pub use value::{FieldValue, Record, StepId};
