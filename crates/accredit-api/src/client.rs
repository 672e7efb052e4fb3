//! Accreditation API contract and its HTTP implementation.

use accredit_spec::SubmissionRecord;
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::model::{Certificate, Page, School, SchoolQuery, SubmissionReceipt};

pub const SERVICE_KEY_HEADER: &str = "x-service-request-key";

/// Remote operations the wizard depends on.
#[cfg_attr(test, mockall::automock)]
pub trait AccreditationApi {
    fn submit_request(&self, record: &SubmissionRecord) -> Result<SubmissionReceipt, ApiError>;
    fn search_schools(&self, query: &SchoolQuery) -> Result<Page<School>, ApiError>;
    fn verify_certificate(&self, number: &str) -> Result<Certificate, ApiError>;
}

/// JSON-over-HTTPS client. Every request carries the bearer token and the
/// static service request key when configured.
pub struct HttpApi {
    config: ApiConfig,
    client: Client,
}

impl HttpApi {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        match &self.config.service_key {
            Some(key) => builder.header(SERVICE_KEY_HEADER, key),
            None => builder,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(self.config.endpoint(path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(self.config.endpoint(path)))
    }

    /// `certificates/verify/<number>` with the number as a single encoded segment.
    fn certificate_url(&self, number: &str) -> Result<Url, ApiError> {
        if number == "." || number == ".." {
            return Err(ApiError::NotFound(format!("certificate '{}'", number)));
        }
        let mut url = Url::parse(&self.config.endpoint("certificates/verify")).map_err(|err| {
            ApiError::not_configured(format!("invalid API URL '{}': {}", self.config.base_url, err))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::not_configured(format!(
                    "API URL '{}' cannot carry a path",
                    self.config.base_url
                ))
            })?
            .push(number);
        Ok(url)
    }

    fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response: Response = builder.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        response.json().map_err(|err| ApiError::Decode(err.to_string()))
    }
}

impl AccreditationApi for HttpApi {
    fn submit_request(&self, record: &SubmissionRecord) -> Result<SubmissionReceipt, ApiError> {
        info!(
            school = %record.school_id,
            kind = %record.request_type,
            "submitting accreditation request"
        );
        let receipt: SubmissionReceipt =
            self.execute(self.post("accreditation-requests").json(record))?;
        info!(id = %receipt.id, "accreditation request accepted");
        Ok(receipt)
    }

    fn search_schools(&self, query: &SchoolQuery) -> Result<Page<School>, ApiError> {
        let pairs = query.query_pairs();
        debug!(?pairs, "searching schools");
        self.execute(self.get("schools").query(&pairs))
    }

    fn verify_certificate(&self, number: &str) -> Result<Certificate, ApiError> {
        let number = number.trim();
        if number.is_empty() {
            return Err(ApiError::NotFound("certificate number is empty".into()));
        }
        let url = self.certificate_url(number)?;
        debug!(number, %url, "verifying certificate");
        self.execute(self.authorize(self.client.get(url)))
    }
}
