use std::env;

use crate::error::ApiError;

pub const API_URL_ENV: &str = "ACCREDIT_API_URL";
pub const SERVICE_KEY_ENV: &str = "ACCREDIT_SERVICE_KEY";
pub const TOKEN_ENV: &str = "ACCREDIT_TOKEN";

/// Connection settings for the accreditation API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub service_key: Option<String>,
    pub token: Option<String>,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: None,
            token: None,
        }
    }

    /// Reads `ACCREDIT_API_URL`, `ACCREDIT_SERVICE_KEY`, and `ACCREDIT_TOKEN`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let base_url = non_empty(API_URL_ENV)
            .ok_or_else(|| ApiError::not_configured(format!("{} is not set", API_URL_ENV)))?;
        Ok(Self {
            service_key: non_empty(SERVICE_KEY_ENV),
            token: non_empty(TOKEN_ENV),
            ..Self::new(base_url)
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        if token.is_some() {
            self.token = token;
        }
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
