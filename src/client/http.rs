//! Retry-aware HTTP transport.
//!
//! All client operations go through one [`HttpTransport`], which owns the
//! connection-pooling `reqwest::Client` and re-issues requests that hit a
//! transient server condition. The policy is a named value rather than a
//! session default so its schedule can be tested on its own.

use std::time::Duration;

use log::warn;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tokio::time::sleep;

use crate::error::Result;

/// Retry behavior for requests issued through [`HttpTransport`].
///
/// A request is retried when the response status is in
/// `retryable_statuses` (server busy/unavailable) or the failure was a
/// connect/timeout error, provided its method is in `retryable_methods`.
/// Delays double per completed attempt starting from `base_delay`, capped
/// at `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single backoff delay.
    pub max_delay: Duration,
    /// Statuses that warrant another attempt.
    pub retryable_statuses: Vec<StatusCode>,
    /// Methods safe to re-issue against this service.
    pub retryable_methods: Vec<Method>,
    /// Whether connect/timeout failures are retried too.
    pub retry_network_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            retryable_statuses: vec![
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::SERVICE_UNAVAILABLE,
            ],
            retryable_methods: vec![Method::GET, Method::POST, Method::DELETE],
            retry_network_errors: true,
        }
    }
}

impl RetryPolicy {
    /// Disables retries entirely.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        self.retryable_statuses.contains(&status)
    }

    pub fn is_retryable_method(&self, method: &Method) -> bool {
        self.retryable_methods.contains(method)
    }

    /// Backoff delay after `completed_attempts` attempts have failed:
    /// `base_delay * 2^(completed_attempts - 1)`, capped at `max_delay`.
    pub fn backoff_delay(&self, completed_attempts: u32) -> Duration {
        let exp = completed_attempts.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(2u32.saturating_pow(exp))
            .min(self.max_delay)
    }
}

/// Shared HTTP session with retry handling.
pub(crate) struct HttpTransport {
    client: Client,
    policy: RetryPolicy,
}

impl HttpTransport {
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gpg-keyctl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, policy })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.client.delete(url)
    }

    /// Sends the request, re-issuing it per the retry policy. Returns the
    /// final response regardless of status; mapping non-2xx to errors is
    /// the caller's concern.
    pub async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        self.execute_inner(builder, true).await
    }

    /// Sends the request retrying only network failures; any response
    /// that arrives is final, whatever its status. Health probes use
    /// this: a 503 there is a degraded report, not a transient
    /// condition.
    pub async fn execute_accepting_any_status(&self, builder: RequestBuilder) -> Result<Response> {
        self.execute_inner(builder, false).await
    }

    async fn execute_inner(&self, builder: RequestBuilder, retry_statuses: bool) -> Result<Response> {
        let request = builder.build()?;

        if !self.policy.is_retryable_method(request.method()) {
            return Ok(self.client.execute(request).await?);
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let last = attempt >= self.policy.max_attempts;

            let attempt_request = match request.try_clone() {
                Some(cloned) => cloned,
                // Streaming bodies cannot be replayed; send once.
                None => return Ok(self.client.execute(request).await?),
            };

            match self.client.execute(attempt_request).await {
                Ok(response)
                    if !last
                        && retry_statuses
                        && self.policy.is_retryable_status(response.status()) =>
                {
                    let delay = self.policy.backoff_delay(attempt);
                    warn!(
                        "service returned {} for {} {}, retrying in {:?} (attempt {}/{})",
                        response.status(),
                        request.method(),
                        request.url().path(),
                        delay,
                        attempt,
                        self.policy.max_attempts
                    );
                    sleep(delay).await;
                }
                Ok(response) => return Ok(response),
                Err(err) => {
                    let transient = err.is_timeout() || err.is_connect();
                    if last || !transient || !self.policy.retry_network_errors {
                        return Err(err.into());
                    }
                    let delay = self.policy.backoff_delay(attempt);
                    warn!(
                        "request to {} failed ({err}), retrying in {:?} (attempt {}/{})",
                        request.url().path(),
                        delay,
                        attempt,
                        self.policy.max_attempts
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_service_contract() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert!(policy.is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(policy.is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!policy.is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!policy.is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn retryable_methods_are_get_post_delete() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable_method(&Method::GET));
        assert!(policy.is_retryable_method(&Method::POST));
        assert!(policy.is_retryable_method(&Method::DELETE));
        assert!(!policy.is_retryable_method(&Method::PUT));
        assert!(!policy.is_retryable_method(&Method::PATCH));
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(4), Duration::from_secs(8));
    }

    #[test]
    fn backoff_is_capped_at_max_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(10), Duration::from_secs(30));
        // Large attempt counts must not overflow
        assert_eq!(policy.backoff_delay(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn none_policy_allows_a_single_attempt() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_attempts, 1);
    }
}
