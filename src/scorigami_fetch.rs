use std::thread;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::http_client::http_client;
use crate::scores::{Dataset, DatasetError, ParseError, Year, parse_scores_json};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http client unavailable: {0}")]
    Client(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("response not ok: {0}")]
    Http(StatusCode),
    #[error("malformed response: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("inconsistent dataset: {0}")]
    Invalid(#[source] DatasetError),
    #[error("superseded by a newer request")]
    Superseded,
}

impl FetchError {
    /// Transport failures and 5xx responses may succeed on another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Http(status) => status.is_server_error(),
            FetchError::Client(_)
            | FetchError::Parse(_)
            | FetchError::Invalid(_)
            | FetchError::Superseded => false,
        }
    }
}

impl From<ParseError> for FetchError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Json(err) => FetchError::Parse(err),
            ParseError::Invalid(err) => FetchError::Invalid(err),
        }
    }
}

const SUPERSEDE_POLL: Duration = Duration::from_millis(25);

/// GET `<base>/<year>` under the configured retry policy.
///
/// `on_retry` is told about each failed attempt that will be retried. `superseded` is polled
/// before and during every backoff; once it returns true the remaining attempts are abandoned.
pub fn fetch_year_with_retry(
    config: &ClientConfig,
    year: Year,
    mut on_retry: impl FnMut(u32, &FetchError),
    mut superseded: impl FnMut() -> bool,
) -> Result<Dataset, FetchError> {
    let mut attempt = 0;
    loop {
        match fetch_year(config, year) {
            Ok(dataset) => return Ok(dataset),
            Err(err) if err.is_retryable() && attempt < config.retries => {
                if superseded() {
                    return Err(FetchError::Superseded);
                }
                attempt += 1;
                on_retry(attempt, &err);
                if !backoff(config.retry_backoff * attempt, &mut superseded) {
                    return Err(FetchError::Superseded);
                }
            }
            Err(err) => return Err(err),
        }
    }
}

/// Sleeps for `wait` in short slices. Returns false if interrupted by supersession.
fn backoff(wait: Duration, superseded: &mut impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + wait;
    loop {
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(SUPERSEDE_POLL.min(deadline - now));
        if superseded() {
            return false;
        }
    }
}

/// Single GET `<base>/<year>`, no retry.
pub fn fetch_year(config: &ClientConfig, year: Year) -> Result<Dataset, FetchError> {
    let client = http_client(config.timeout).map_err(|err| FetchError::Client(format!("{err:#}")))?;
    let url = config.year_url(year);
    let resp = client.get(&url).send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Http(status));
    }
    let body = resp.text()?;
    Ok(parse_scores_json(&body)?)
}
