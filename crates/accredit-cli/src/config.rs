use std::env;
use std::path::PathBuf;

use accredit_api::{ApiConfig, Session};
use accredit_spec::FileBackend;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::CliResult;

pub const DATA_DIR_ENV: &str = "ACCREDIT_DATA_DIR";
const DEFAULT_DATA_DIR: &str = ".accredit";

/// Logs go to stderr so stdout stays clean for JSON output.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Flag, then `ACCREDIT_DATA_DIR`, then `./.accredit`.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> CliResult<PathBuf> {
    let candidate = match flag {
        Some(path) => path,
        None => env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
    };
    if candidate.as_os_str().is_empty() {
        return Err("data directory cannot be empty".into());
    }
    Ok(candidate)
}

pub fn backend(data_dir: Option<PathBuf>) -> CliResult<FileBackend> {
    Ok(FileBackend::new(resolve_data_dir(data_dir)?))
}

/// Environment settings, with the URL flag taking precedence and the stored
/// session supplying the token when `ACCREDIT_TOKEN` is unset.
pub fn api_config(api_url: Option<String>, backend: &FileBackend) -> CliResult<ApiConfig> {
    let config = match api_url {
        Some(url) => {
            let from_env = ApiConfig::from_env().ok();
            ApiConfig {
                service_key: from_env.as_ref().and_then(|cfg| cfg.service_key.clone()),
                token: from_env.and_then(|cfg| cfg.token),
                ..ApiConfig::new(url)
            }
        }
        None => ApiConfig::from_env().map_err(|err| err.to_string())?,
    };
    if config.token.is_some() {
        return Ok(config);
    }
    let session_token = Session::load(backend).map(|session| session.token);
    Ok(config.with_token(session_token))
}

/// Draft storage key for a wizard.
pub fn draft_key(form_id: &str) -> String {
    let slug: String = form_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("{}-draft", slug.trim_matches('-'))
}
