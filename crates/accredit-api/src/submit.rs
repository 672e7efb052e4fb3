use accredit_spec::{DraftRepository, StepSpec, SubmissionError, SubmissionRecord};
use thiserror::Error;
use tracing::warn;

use crate::client::AccreditationApi;
use crate::error::ApiError;
use crate::model::SubmissionReceipt;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("the draft is incomplete: {0}")]
    Incomplete(#[from] SubmissionError),
    #[error("submission failed: {0}")]
    Remote(#[from] ApiError),
}

impl SubmitError {
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Incomplete(err) => format!("Please complete the form first: {}.", err),
            SubmitError::Remote(err) => err.user_message(),
        }
    }
}

/// Builds the submission from the stored draft and sends it once.
///
/// The draft is cleared only after the API accepts the request, so a failed
/// submission can be retried by the user.
pub fn submit_draft(
    api: &impl AccreditationApi,
    repository: &impl DraftRepository,
    steps: &[StepSpec],
    school_id: &str,
    request_type: &str,
) -> Result<SubmissionReceipt, SubmitError> {
    let draft = repository.load();
    let record = SubmissionRecord::from_draft(steps, &draft, school_id, request_type)?;
    match api.submit_request(&record) {
        Ok(receipt) => {
            repository.clear();
            Ok(receipt)
        }
        Err(err) => {
            warn!(error = %err, "submission rejected; keeping draft");
            Err(err.into())
        }
    }
}
