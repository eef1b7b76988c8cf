// HTTP client for the Fantasy Premier League API.
//
// Holds one cookie-carrying `reqwest::Client` for the whole run: the login
// request stores the session cookie and every later GET sends it back.
// Responses are gzip-decoded transparently. Transient failures are retried
// according to an explicit `RetryPolicy`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use fantasypl_core::{FetchError, HistorySource};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{self, BootstrapStatic, LeagueStandings};
use crate::config::HttpConfig;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// The API rejects requests that do not look like they come from a browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_6) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/76.0.3809.100 Safari/537.36";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build HTTP client")]
    Build(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login request failed")]
    Transport(#[source] reqwest::Error),

    #[error("login rejected with HTTP status {status}")]
    Rejected { status: u16 },
}

// ---------------------------------------------------------------------------
// API seam used by the pipeline
// ---------------------------------------------------------------------------

/// Everything the pipeline needs from the remote service.
#[async_trait]
pub trait FantasyApi: HistorySource {
    /// The active game week.
    async fn current_week(&self) -> Result<u32, FetchError>;

    /// One page of a classic league's standings.
    async fn standings_page(
        &self,
        league_id: &str,
        page: u32,
    ) -> Result<LeagueStandings, FetchError>;
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Retry-with-backoff for transient fetch failures.
///
/// The delay before retry `n` (0-based) is `initial_backoff * 2^n`, capped at
/// `max_backoff`. Only errors for which [`FetchError::is_transient`] holds
/// are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    pub fn from_config(config: &HttpConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Delay before the `retry`-th retry (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out.
    /// Returns the last error in the latter two cases.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut retry = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && retry < self.max_retries => {
                    let delay = self.backoff(retry);
                    warn!(
                        "{what}: {err}; retrying in {delay:?} ({}/{})",
                        retry + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FplClient
// ---------------------------------------------------------------------------

/// Session-carrying client for the FPL web service.
pub struct FplClient {
    http: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl FplClient {
    pub fn new(config: &HttpConfig) -> Result<Self, ClientError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .gzip(true)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            timeout,
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Log in and keep the session cookie for later requests.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), AuthError> {
        debug!("Logging in as {username}");
        let form = [
            ("login", username),
            ("password", password),
            ("app", api::LOGIN_APP),
            ("redirect_uri", api::LOGIN_REDIRECT_URI),
        ];
        let response = self
            .http
            .post(api::LOGIN_URL)
            .form(&form)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }
        info!("Logged in as {username}");
        Ok(())
    }

    /// GET `url` and return the (decompressed) body, retrying transient
    /// failures.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.retry.run(url, move || self.get_once(url)).await
    }

    async fn get_once(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("Fetch {url}");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(body.to_vec())
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl HistorySource for FplClient {
    async fn fetch_history(&self, entry_num: u64) -> Result<Vec<u8>, FetchError> {
        self.get_bytes(&api::history_url(entry_num)).await
    }
}

#[async_trait]
impl FantasyApi for FplClient {
    async fn current_week(&self) -> Result<u32, FetchError> {
        let body = self.get_bytes(&api::bootstrap_url()).await?;
        let game: BootstrapStatic = serde_json::from_slice(&body)?;
        Ok(game.current_week())
    }

    async fn standings_page(
        &self,
        league_id: &str,
        page: u32,
    ) -> Result<LeagueStandings, FetchError> {
        let body = self.get_bytes(&api::standings_url(league_id, page)).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
