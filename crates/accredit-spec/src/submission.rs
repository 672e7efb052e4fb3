use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::collect_option_ids;
use crate::draft::Draft;
use crate::spec::step::StepSpec;
use crate::value::Record;

const APPLICANT_NAME: &str = "applicant_name";
const APPLICANT_EMAIL: &str = "applicant_email";
const APPLICANT_PHONE: &str = "applicant_phone";
const COMBINATION_PREFIX: &str = "combination";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("the draft is missing '{0}'")]
    MissingField(&'static str),
    #[error("no school is selected for this request")]
    MissingSchool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Payload sent to the remote API once the wizard is complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub school_id: String,
    pub request_type: String,
    pub applicant: Applicant,
    #[serde(default)]
    pub combination_ids: Vec<String>,
    #[serde(default)]
    pub option_ids: Vec<String>,
}

impl SubmissionRecord {
    /// Builds the record from the merged draft and the dynamic steps' options.
    pub fn from_draft(
        steps: &[StepSpec],
        draft: &Draft,
        school_id: &str,
        request_type: &str,
    ) -> Result<Self, SubmissionError> {
        let school_id = school_id.trim();
        if school_id.is_empty() {
            return Err(SubmissionError::MissingSchool);
        }
        let merged = draft.merged();
        let applicant = Applicant {
            full_name: required_text(merged, APPLICANT_NAME)?,
            email: required_text(merged, APPLICANT_EMAIL)?,
            phone: optional_text(merged, APPLICANT_PHONE),
        };
        let combination_ids = merged
            .iter()
            .filter(|(key, _)| key.starts_with(COMBINATION_PREFIX))
            .filter(|(_, value)| !value.is_blank())
            .map(|(_, value)| value.as_text().trim().to_string())
            .collect();

        Ok(Self {
            school_id: school_id.to_string(),
            request_type: request_type.to_string(),
            applicant,
            combination_ids,
            option_ids: collect_option_ids(steps, draft),
        })
    }
}

fn optional_text(record: &Record, key: &str) -> Option<String> {
    record
        .get(key)
        .filter(|value| !value.is_blank())
        .map(|value| value.as_text().trim().to_string())
}

fn required_text(record: &Record, key: &'static str) -> Result<String, SubmissionError> {
    optional_text(record, key).ok_or(SubmissionError::MissingField(key))
}
