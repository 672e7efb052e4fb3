#![allow(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod submit;

pub use client::{AccreditationApi, HttpApi};
pub use config::ApiConfig;
pub use error::ApiError;
pub use model::{Certificate, Page, School, SchoolQuery, SubmissionReceipt};
pub use session::{SESSION_KEY, Session};
pub use submit::{SubmitError, submit_draft};
