use std::env;
use std::time::Duration;

use crate::scores::Year;

pub const DEFAULT_API_URL: &str =
    "https://us-central1-frc-scorigami.cloudfunctions.net/function-get";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Extra attempts after the first failure. Zero disables retrying.
    pub retries: u32,
    pub retry_backoff: Duration,
    pub initial_year: Year,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            retries: 0,
            retry_backoff: Duration::from_millis(500),
            initial_year: Year::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = env::var("SCORIGAMI_API_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.base_url);
        let timeout = env::var("SCORIGAMI_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or(defaults.timeout);
        let retries = env::var("SCORIGAMI_RETRIES")
            .ok()
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(defaults.retries)
            .min(5);
        let retry_backoff = env::var("SCORIGAMI_RETRY_BACKOFF_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_backoff);
        let initial_year = env::var("SCORIGAMI_YEAR")
            .ok()
            .and_then(|val| val.parse::<Year>().ok())
            .unwrap_or(defaults.initial_year);

        Self {
            base_url,
            timeout,
            retries,
            retry_backoff,
            initial_year,
        }
    }

    pub fn year_url(&self, year: Year) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), year)
    }
}
