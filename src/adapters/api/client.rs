//! Bot API HTTP Client - Rate-limited REST Client
//!
//! Wraps reqwest with a governor rate limiter for all Telegram Bot API
//! calls. Each call is a single attempt: retry policy belongs to the
//! caller, since repeating a `sendGift` blindly could buy a gift twice.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::ApiConfig;

use super::types::ApiResponse;

/// Failure of a single Bot API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiCallError {
    /// Request never produced a response (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),
    /// Flood control (HTTP 429).
    #[error("rate limited (retry after {retry_after:?}s): {description}")]
    RateLimited {
        retry_after: Option<u64>,
        description: String,
    },
    /// Bot API server error (5xx).
    #[error("server error {code}: {description}")]
    Server { code: i64, description: String },
    /// Request refused (4xx other than 429).
    #[error("request refused {code}: {description}")]
    Refused { code: i64, description: String },
    /// Response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiCallError {
    /// Whether repeating the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::RateLimited { .. } | Self::Server { .. }
        )
    }
}

/// Rate-limited HTTP client for the Telegram Bot API.
pub struct BotApiClient {
    /// Underlying HTTP client.
    http: Client,
    /// `{base_url}/bot{token}`; never logged.
    endpoint: String,
    /// Outgoing request budget.
    limiter: DefaultDirectRateLimiter,
}

impl BotApiClient {
    /// Create a new Bot API client.
    pub fn new(config: &ApiConfig, token: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .pool_max_idle_per_host(5)
            .build()
            .context("Failed to build HTTP client")?;

        let per_second = NonZeroU32::new(config.max_requests_per_second)
            .context("max_requests_per_second must be positive")?;

        Ok(Self {
            http,
            endpoint: format!("{}/bot{token}", config.base_url.trim_end_matches('/')),
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    /// Call a Bot API method with a JSON body and decode its result.
    #[instrument(skip(self, params), fields(method = %method))]
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, ApiCallError>
    where
        P: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        self.limiter.until_ready().await;

        let url = format!("{}/{method}", self.endpoint);
        let response = self
            .http
            .post(&url)
            .json(params)
            .send()
            .await
            .map_err(|e| ApiCallError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiCallError::Transport(e.without_url().to_string()))?;

        debug!(status = status.as_u16(), bytes = body.len(), "Bot API response");
        let result = decode(status, &body);
        if let Err(e) = &result {
            warn!(error = %e, "Bot API call failed");
        }
        result
    }
}

/// Classify a raw Bot API response.
fn decode<R: DeserializeOwned>(status: StatusCode, body: &str) -> Result<R, ApiCallError> {
    let envelope: ApiResponse<R> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if status.is_server_error() => {
            return Err(ApiCallError::Server {
                code: i64::from(status.as_u16()),
                description: status.to_string(),
            });
        }
        Err(e) => return Err(ApiCallError::Decode(e.to_string())),
    };

    if envelope.ok {
        return envelope
            .result
            .ok_or_else(|| ApiCallError::Decode("ok response without result".to_string()));
    }

    let code = envelope.error_code.unwrap_or_else(|| i64::from(status.as_u16()));
    let description = envelope.description.unwrap_or_default();
    let retry_after = envelope.parameters.and_then(|p| p.retry_after);

    Err(match code {
        429 => ApiCallError::RateLimited {
            retry_after,
            description,
        },
        c if c >= 500 => ApiCallError::Server {
            code: c,
            description,
        },
        c => ApiCallError::Refused {
            code: c,
            description,
        },
    })
}
