use std::str::FromStr;
use std::time::Duration;

use accountdesk_core::errors::{Error, Result, ValidationError};
use accountdesk_core::EngineConfig;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Client settings read from `ACCOUNTDESK_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub engine: EngineConfig,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            engine: EngineConfig::default(),
        }
    }
}

impl ConnectConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let timeout_ms = parse_var(&var, "ACCOUNTDESK_REQUEST_TIMEOUT_MS")?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        let engine = EngineConfig {
            search_debounce_ms: parse_var(&var, "ACCOUNTDESK_SEARCH_DEBOUNCE_MS")?
                .unwrap_or(defaults.engine.search_debounce_ms),
            search_page_size: parse_var(&var, "ACCOUNTDESK_SEARCH_PAGE_SIZE")?
                .unwrap_or(defaults.engine.search_page_size),
            deliberation_delay_ms: parse_var(&var, "ACCOUNTDESK_DELIBERATION_DELAY_MS")?
                .unwrap_or(defaults.engine.deliberation_delay_ms),
        };
        if engine.search_page_size == 0 {
            return Err(invalid("ACCOUNTDESK_SEARCH_PAGE_SIZE", "0"));
        }

        Ok(Self {
            api_url: var("ACCOUNTDESK_API_URL")
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            api_token: var("ACCOUNTDESK_API_TOKEN").map(|t| t.trim().to_string()),
            request_timeout: Duration::from_millis(timeout_ms),
            engine,
        })
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>> {
    match var(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(name, &raw)),
    }
}

fn invalid(name: &str, raw: &str) -> Error {
    Error::Validation(ValidationError::InvalidInput(format!(
        "{} has an invalid value '{}'",
        name, raw
    )))
}
