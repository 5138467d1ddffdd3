//! Outbound HTTP with response caching and retry.

use std::{sync::Arc, time::Duration};

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::ServiceError;

pub mod cache;
pub mod retry;

pub use cache::ResponseCache;
pub use retry::RetryPolicy;

use retry::{is_retryable_error, is_retryable_status};

const USER_AGENT: &str = concat!("starfish/", env!("CARGO_PKG_VERSION"));

/// Shared session used by every provider.
///
/// Cheap to clone; clones share the connection pool and the cache.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    cache: ResponseCache,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(http: Client, cache: ResponseCache, retry: RetryPolicy) -> Self {
        Self { http, cache, retry }
    }

    /// Build a transport with its own client and the given request timeout.
    pub fn with_timeout(
        timeout: Duration,
        cache: ResponseCache,
        retry: RetryPolicy,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?;
        Ok(Self::new(http, cache, retry))
    }

    /// Same client and cache, different retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// GET `url`, serving from cache when fresh and retrying transient failures.
    ///
    /// Only successful bodies are cached.
    pub async fn get_text(&self, provider: &'static str, url: &Url) -> Result<Arc<str>, ServiceError> {
        let key = url.as_str();
        if let Some(body) = self.cache.get(key) {
            tracing::debug!(provider, url = key, "cache hit");
            return Ok(body);
        }
        tracing::debug!(provider, url = key, "cache miss");

        let mut attempt = 1;
        loop {
            match self.http.get(url.clone()).send().await {
                Ok(res) => {
                    let status = res.status();
                    if is_retryable_status(status) && self.retry.allows_retry_after(attempt) {
                        tracing::warn!(provider, %status, attempt, "retryable status from upstream");
                        self.back_off(attempt).await;
                        attempt += 1;
                        continue;
                    }

                    let body = res
                        .text()
                        .await
                        .map_err(|source| ServiceError::Network { provider, source })?;

                    if !status.is_success() {
                        return Err(ServiceError::Upstream {
                            provider,
                            status: status.as_u16(),
                            body: truncate_body(&body),
                        });
                    }

                    if attempt > 1 {
                        tracing::info!(provider, attempt, "request succeeded after retry");
                    }
                    let body: Arc<str> = Arc::from(body);
                    self.cache.insert(key, Arc::clone(&body));
                    return Ok(body);
                }
                Err(err) => {
                    if is_retryable_error(&err) && self.retry.allows_retry_after(attempt) {
                        tracing::warn!(provider, attempt, error = %err, "retryable transport error");
                        self.back_off(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(ServiceError::Network { provider, source: err });
                }
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        provider: &'static str,
        url: &Url,
    ) -> Result<T, ServiceError> {
        let body = self.get_text(provider, url).await?;
        serde_json::from_str(&body).map_err(|source| ServiceError::Parse { provider, source })
    }

    async fn back_off(&self, attempt: u32) {
        tokio::time::sleep(self.retry.backoff_for(attempt)).await;
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
