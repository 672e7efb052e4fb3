use accredit_spec::{StorageBackend, StorageError};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const SESSION_KEY: &str = "session";

/// Signed-in user and the school currently selected for requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
}

impl Session {
    /// Stored session, or `None` when absent or unreadable.
    pub fn load(backend: &impl StorageBackend) -> Option<Self> {
        let contents = match backend.get(SESSION_KEY) {
            Ok(contents) => contents?,
            Err(err) => {
                warn!(error = %err, "failed to read session");
                return None;
            }
        };
        serde_json::from_str(&contents)
            .map_err(|err| warn!(error = %err, "discarding unreadable session"))
            .ok()
    }

    pub fn save(&self, backend: &impl StorageBackend) -> Result<(), StorageError> {
        let contents = serde_json::to_string(self)?;
        backend.set(SESSION_KEY, &contents)
    }

    pub fn clear(backend: &impl StorageBackend) -> Result<(), StorageError> {
        backend.remove(SESSION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accredit_spec::MemoryBackend;

    #[test]
    fn round_trips_through_backend() {
        let backend = MemoryBackend::new();
        let session = Session {
            token: "tok".into(),
            user_name: Some("Inspector Mukamana".into()),
            school_id: Some("SCH-1".into()),
        };
        session.save(&backend).unwrap();
        assert_eq!(Session::load(&backend), Some(session));

        Session::clear(&backend).unwrap();
        assert_eq!(Session::load(&backend), None);
    }

    #[test]
    fn failed_save_is_reported_and_writes_nothing() {
        let backend = MemoryBackend::new();
        backend.set_fail_writes(true);
        let session = Session {
            token: "tok".into(),
            user_name: None,
            school_id: None,
        };
        assert!(matches!(
            session.save(&backend),
            Err(StorageError::Unavailable)
        ));
        assert_eq!(backend.raw(SESSION_KEY), None);
    }

    #[test]
    fn saved_session_is_compact_json() {
        let backend = MemoryBackend::new();
        Session {
            token: "tok".into(),
            user_name: None,
            school_id: Some("SCH-1".into()),
        }
        .save(&backend)
        .unwrap();
        assert_eq!(
            backend.raw(SESSION_KEY).as_deref(),
            Some(r#"{"token":"tok","school_id":"SCH-1"}"#)
        );
    }

    #[test]
    fn garbage_session_is_ignored() {
        let backend = MemoryBackend::new();
        backend.set(SESSION_KEY, "[]").unwrap();
        assert_eq!(Session::load(&backend), None);
    }
}
