//! Persisted, partially completed wizard data.
//!
//! The whole draft lives under a single storage key as
//! `{ "<stepId>": record, ..., "merged": record }`, so clearing it removes the
//! per-step data and the merged view together.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::StorageBackend;
use crate::value::{Record, StepId};

pub const DEFAULT_DRAFT_KEY: &str = "accreditation-draft";

const MERGED_KEY: &str = "merged";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawDraft", into = "RawDraft")]
pub struct Draft {
    steps: BTreeMap<StepId, Record>,
    merged: Record,
}

impl Draft {
    pub fn step(&self, id: StepId) -> Option<&Record> {
        self.steps.get(&id)
    }

    pub fn steps(&self) -> &BTreeMap<StepId, Record> {
        &self.steps
    }

    /// All saved fields; on collision the most recently saved step wins.
    pub fn merged(&self) -> &Record {
        &self.merged
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.merged.is_empty()
    }

    pub(crate) fn apply(&mut self, step: StepId, data: &Record) {
        self.steps.insert(step, data.clone());
        self.merged
            .extend(data.iter().map(|(key, value)| (key.clone(), value.clone())));
    }
}

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct RawDraft(BTreeMap<String, Record>);

impl TryFrom<RawDraft> for Draft {
    type Error = String;

    fn try_from(raw: RawDraft) -> Result<Self, Self::Error> {
        let mut draft = Draft::default();
        for (key, record) in raw.0 {
            if key == MERGED_KEY {
                draft.merged = record;
            } else {
                let step = key
                    .parse::<StepId>()
                    .map_err(|_| format!("invalid step key '{}'", key))?;
                draft.steps.insert(step, record);
            }
        }
        Ok(draft)
    }
}

impl From<Draft> for RawDraft {
    fn from(draft: Draft) -> Self {
        let mut map: BTreeMap<String, Record> = draft
            .steps
            .into_iter()
            .map(|(step, record)| (step.to_string(), record))
            .collect();
        map.insert(MERGED_KEY.to_string(), draft.merged);
        RawDraft(map)
    }
}

/// Best-effort persistence of one wizard's draft. None of these operations fail.
#[cfg_attr(test, mockall::automock)]
pub trait DraftRepository {
    fn save(&self, step: StepId, data: &Record);
    /// Stored data for `step`, or an empty record.
    fn load_step(&self, step: StepId) -> Record;
    /// Whole draft, or an empty draft when absent or unreadable.
    fn load(&self) -> Draft;
    fn clear(&self);
}

impl<R: DraftRepository + ?Sized> DraftRepository for &R {
    fn save(&self, step: StepId, data: &Record) {
        (**self).save(step, data)
    }

    fn load_step(&self, step: StepId) -> Record {
        (**self).load_step(step)
    }

    fn load(&self) -> Draft {
        (**self).load()
    }

    fn clear(&self) {
        (**self).clear()
    }
}

/// Draft repository over a key-value backend, scoped to one storage key.
#[derive(Debug)]
pub struct DraftStore<B> {
    backend: B,
    key: String,
}

impl<B: StorageBackend> DraftStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, DEFAULT_DRAFT_KEY)
    }

    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: StorageBackend> DraftRepository for DraftStore<B> {
    fn save(&self, step: StepId, data: &Record) {
        let mut draft = self.load();
        draft.apply(step, data);

        let serialized = match serde_json::to_string(&draft) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to serialize draft");
                return;
            }
        };
        match self.backend.set(&self.key, &serialized) {
            Ok(()) => debug!(key = %self.key, step, "saved draft step"),
            Err(err) => warn!(key = %self.key, step, error = %err, "failed to persist draft"),
        }
    }

    fn load_step(&self, step: StepId) -> Record {
        self.load().steps.remove(&step).unwrap_or_default()
    }

    fn load(&self) -> Draft {
        let contents = match self.backend.get(&self.key) {
            Ok(Some(contents)) => contents,
            Ok(None) => return Draft::default(),
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read draft");
                return Draft::default();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(key = %self.key, error = %err, "discarding unreadable draft");
            Draft::default()
        })
    }

    fn clear(&self) {
        match self.backend.remove(&self.key) {
            Ok(()) => debug!(key = %self.key, "cleared draft"),
            Err(err) => warn!(key = %self.key, error = %err, "failed to clear draft"),
        }
    }
}
