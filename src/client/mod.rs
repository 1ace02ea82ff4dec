//! Client for the GPG Signing Service administrative API.
//!
//! [`SigningKeyClient`] wraps the service's key-management endpoints:
//! upload, list, fetch public key, delete, audit queries, and a composite
//! rotate operation. Every call is a single stateless request/response
//! exchange over one shared connection pool; transient server errors are
//! retried by the transport per [`RetryPolicy`].

pub mod http;
pub mod types;
pub mod validate;

use std::time::Duration;

use log::{info, warn};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::{KeyServiceError, Result};
use http::{HttpTransport, RetryPolicy};
use types::{
    AuditFilter, AuditLogsResponse, ErrorBody, HealthStatus, KeyDeletionResult, KeyListItem,
    KeyListResponse, KeyUploadResult, RotationOutcome,
};
use validate::validate_key_id;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated client for the signing service admin endpoints.
///
/// Holds an immutable base URL and bearer credential plus one
/// connection-pooling HTTP session; safe to reuse across sequential
/// calls. The credential is an explicit constructor argument: reading it
/// from the process environment is the binary's job, not the client's.
pub struct SigningKeyClient {
    base_url: String,
    admin_token: Option<String>,
    transport: HttpTransport,
}

/// Builder for [`SigningKeyClient`] with explicit timeout and retry
/// configuration.
pub struct SigningKeyClientBuilder {
    base_url: String,
    admin_token: Option<String>,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl SigningKeyClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            admin_token: None,
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Bearer credential for admin operations.
    pub fn admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn build(self) -> Result<SigningKeyClient> {
        let transport = HttpTransport::new(self.timeout, self.retry_policy)?;
        Ok(SigningKeyClient {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            admin_token: self.admin_token,
            transport,
        })
    }
}

impl SigningKeyClient {
    /// Creates a client with default timeout and retry policy. `token` is
    /// required for every operation except [`Self::health`]; passing
    /// `None` defers the failure to call time.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let mut builder = SigningKeyClientBuilder::new(base_url);
        if let Some(token) = token {
            builder = builder.admin_token(token);
        }
        builder.build()
    }

    pub fn builder(base_url: impl Into<String>) -> SigningKeyClientBuilder {
        SigningKeyClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn admin_token(&self) -> Result<&str> {
        self.admin_token.as_deref().ok_or_else(|| {
            KeyServiceError::InvalidArgument("admin token not configured".to_string())
        })
    }

    fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        Ok(builder.bearer_auth(self.admin_token()?))
    }

    /// Uploads a new signing key. The armored private key passes through
    /// verbatim; the service parses and stores it.
    pub async fn upload_key(
        &self,
        key_id: &str,
        armored_private_key: &str,
    ) -> Result<KeyUploadResult> {
        validate_key_id(key_id)?;
        let url = format!("{}/admin/keys", self.base_url);
        let payload = json!({
            "keyId": key_id,
            "armoredPrivateKey": armored_private_key,
        });
        let request = self.authed(self.transport.post(&url))?.json(&payload);
        let response = self.transport.execute(request).await?;
        Self::expect_json(response, "key upload result").await
    }

    /// Lists all stored signing keys. A response without a `keys` field
    /// yields an empty vec.
    pub async fn list_keys(&self) -> Result<Vec<KeyListItem>> {
        let url = format!("{}/admin/keys", self.base_url);
        let request = self.authed(self.transport.get(&url))?;
        let response = self.transport.execute(request).await?;
        let parsed: KeyListResponse = Self::expect_json(response, "key list").await?;
        Ok(parsed.keys)
    }

    /// Fetches the armored public key block for `key_id`, returned
    /// verbatim as text.
    pub async fn get_public_key(&self, key_id: &str) -> Result<String> {
        validate_key_id(key_id)?;
        let url = format!("{}/admin/keys/{}/public", self.base_url, key_id);
        let request = self.authed(self.transport.get(&url))?;
        let response = self.transport.execute(request).await?;
        Self::expect_text(response).await
    }

    /// Deletes a signing key. Irreversible: the service revokes the key
    /// permanently.
    pub async fn delete_key(&self, key_id: &str) -> Result<KeyDeletionResult> {
        validate_key_id(key_id)?;
        let url = format!("{}/admin/keys/{}", self.base_url, key_id);
        let request = self.authed(self.transport.delete(&url))?;
        let response = self.transport.execute(request).await?;
        Self::expect_json(response, "key deletion result").await
    }

    /// Queries the audit log. Read-only; unset filters are omitted from
    /// the query string, `limit` and `offset` are always sent.
    pub async fn query_audit_logs(&self, filter: &AuditFilter) -> Result<AuditLogsResponse> {
        let url = format!("{}/admin/audit", self.base_url);
        let request = self
            .authed(self.transport.get(&url))?
            .query(&filter.to_query());
        let response = self.transport.execute(request).await?;
        Self::expect_json(response, "audit logs").await
    }

    /// Rotates signing keys: uploads the new key, then deletes the old
    /// one when `old_key_id` is given.
    ///
    /// The grace period is intent, not mechanism: the deletion runs
    /// immediately and `grace_period_hours` is only logged, so operators
    /// wanting a real delay must schedule the delete themselves. If the
    /// deletion fails the new key stays active and the error surfaces;
    /// there is no rollback.
    pub async fn rotate_keys(
        &self,
        new_key_id: &str,
        armored_private_key: &str,
        old_key_id: Option<&str>,
        grace_period_hours: u32,
    ) -> Result<RotationOutcome> {
        info!("uploading new signing key {new_key_id}");
        let uploaded = self.upload_key(new_key_id, armored_private_key).await?;

        let deleted = match old_key_id {
            Some(old_key_id) => {
                warn!(
                    "grace period of {grace_period_hours}h is not enforced; \
                     deleting old key {old_key_id} immediately"
                );
                Some(self.delete_key(old_key_id).await?)
            }
            None => None,
        };

        Ok(RotationOutcome { uploaded, deleted })
    }

    /// Checks service health. Unauthenticated. A degraded service
    /// answers 503 with the same body shape; that surfaces as
    /// [`KeyServiceError::Degraded`] carrying the parsed report so the
    /// caller can inspect the failing checks. The probe retries only
    /// network failures: a 503 here is the answer, not a transient
    /// condition to back off from.
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .transport
            .execute_accepting_any_status(self.transport.get(&url))
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|err| {
                KeyServiceError::MalformedResponse {
                    context: format!("health report: {err}"),
                }
            });
        }
        if status == StatusCode::SERVICE_UNAVAILABLE {
            if let Ok(report) = serde_json::from_str::<HealthStatus>(&text) {
                return Err(KeyServiceError::Degraded { report });
            }
        }
        Err(Self::remote_error(status, &text))
    }

    async fn expect_json<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Self::remote_error(status, &text));
        }
        serde_json::from_str(&text).map_err(|err| KeyServiceError::MalformedResponse {
            context: format!("{context}: {err}"),
        })
    }

    async fn expect_text(response: Response) -> Result<String> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Self::remote_error(status, &text));
        }
        Ok(text)
    }

    /// Maps a non-2xx response to [`KeyServiceError::Remote`], pulling
    /// out the service's `{code, error, requestId}` body when present.
    fn remote_error(status: StatusCode, body: &str) -> KeyServiceError {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => KeyServiceError::Remote {
                status: status.as_u16(),
                code: parsed.code,
                message: parsed.error,
                request_id: parsed.request_id,
            },
            Err(_) => KeyServiceError::Remote {
                status: status.as_u16(),
                code: None,
                message: if body.is_empty() {
                    None
                } else {
                    Some(body.to_string())
                },
                request_id: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = SigningKeyClient::new("https://gpg.example.com/", None).unwrap();
        assert_eq!(client.base_url(), "https://gpg.example.com");
    }

    #[test]
    fn missing_token_is_reported_at_call_time() {
        let client = SigningKeyClient::new("https://gpg.example.com", None).unwrap();
        let err = client.admin_token().unwrap_err();
        assert!(matches!(err, KeyServiceError::InvalidArgument(_)));
    }

    #[test]
    fn remote_error_parses_service_body() {
        let err = SigningKeyClient::remote_error(
            StatusCode::NOT_FOUND,
            r#"{"code":"KEY_NOT_FOUND","error":"no such key","requestId":"req-1"}"#,
        );
        match err {
            KeyServiceError::Remote {
                status,
                code,
                message,
                request_id,
            } => {
                assert_eq!(status, 404);
                assert_eq!(code.as_deref(), Some("KEY_NOT_FOUND"));
                assert_eq!(message.as_deref(), Some("no such key"));
                assert_eq!(request_id.as_deref(), Some("req-1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn remote_error_falls_back_to_raw_body() {
        let err = SigningKeyClient::remote_error(StatusCode::BAD_GATEWAY, "upstream exploded");
        match err {
            KeyServiceError::Remote {
                status,
                code,
                message,
                ..
            } => {
                assert_eq!(status, 502);
                assert!(code.is_none());
                assert_eq!(message.as_deref(), Some("upstream exploded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
