use thiserror::Error;

/// Failures talking to the accreditation API. No variant is retried automatically.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("accreditation API is not configured: {0}")]
    NotConfigured(String),
    #[error("unauthorized: the session token was rejected")]
    Unauthorized,
    #[error("forbidden: the account cannot perform this action")]
    Forbidden,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn not_configured(what: impl Into<String>) -> Self {
        ApiError::NotConfigured(what.into())
    }

    /// Maps a non-success status and its body to an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(extract_message(body).unwrap_or_else(|| "resource".into())),
            _ => ApiError::Http {
                status,
                message: extract_message(body).unwrap_or_else(|| body.trim().to_string()),
            },
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Forbidden)
    }

    /// Text shown to the user next to a retry option.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotConfigured(_) => {
                "The accreditation service is not configured on this machine.".into()
            }
            ApiError::Unauthorized => "Your session has expired. Please sign in again.".into(),
            ApiError::Forbidden => "You do not have permission to do this.".into(),
            ApiError::NotFound(what) => format!("Not found: {}.", what),
            ApiError::Http { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Http { .. } | ApiError::Decode(_) => {
                "The accreditation service returned an unexpected response.".into()
            }
            ApiError::Network(_) => {
                "Could not reach the accreditation service. Check your connection and retry."
                    .into()
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Pulls `message` (or `error`) out of a JSON error body.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}
