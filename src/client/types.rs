//! Wire types exchanged with the signing service.
//!
//! These are transient DTOs mirroring the service's camelCase JSON. The
//! client never mutates them; lifecycle is entirely server-side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of uploading a signing key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyUploadResult {
    pub success: bool,
    pub key_id: String,
    pub fingerprint: String,
    pub algorithm: String,
    pub user_id: String,
}

/// One stored key, as returned by the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyListItem {
    pub key_id: String,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub algorithm: String,
}

/// Wire shape of `GET /admin/keys`. A body without a `keys` field means
/// an empty key store, not an error.
#[derive(Debug, Deserialize)]
pub(crate) struct KeyListResponse {
    #[serde(default)]
    pub keys: Vec<KeyListItem>,
}

/// Confirmation of a key deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyDeletionResult {
    pub success: bool,
    pub deleted: bool,
}

/// One server-recorded audit event. Append-only and server-owned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub action: String,
    pub issuer: String,
    pub subject: String,
    pub key_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

/// Paginated audit log view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogsResponse {
    pub logs: Vec<AuditLogEntry>,
    pub count: u64,
}

/// Filters for an audit log query. Unset fields produce no query
/// parameter; `limit` and `offset` are always sent.
#[derive(Debug, Clone)]
pub struct AuditFilter {
    pub action: Option<String>,
    pub subject: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self {
            action: None,
            subject: None,
            start_date: None,
            end_date: None,
            limit: 100,
            offset: 0,
        }
    }
}

impl AuditFilter {
    /// Query parameters in wire order: limit and offset first, then any
    /// set filters.
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];
        if let Some(action) = &self.action {
            params.push(("action", action.clone()));
        }
        if let Some(subject) = &self.subject {
            params.push(("subject", subject.clone()));
        }
        if let Some(start) = &self.start_date {
            params.push(("startDate", start.to_rfc3339()));
        }
        if let Some(end) = &self.end_date {
            params.push(("endDate", end.to_rfc3339()));
        }
        params
    }
}

/// Combined result of a key rotation: the upload always runs, the
/// deletion only when an old key id was supplied.
#[derive(Debug, Clone, Serialize)]
pub struct RotationOutcome {
    pub uploaded: KeyUploadResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<KeyDeletionResult>,
}

/// Service health report from `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecks {
    pub key_storage: bool,
    pub database: bool,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Error body the service attaches to non-2xx responses. All fields are
/// optional; an unparseable body falls back to raw text.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    pub code: Option<String>,
    pub error: Option<String>,
    pub request_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_list_response_defaults_to_empty() {
        let parsed: KeyListResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.keys.is_empty());
    }

    #[test]
    fn audit_entry_tolerates_missing_optionals() {
        let body = r#"{
            "id": "9f6a2c1e-0d4b-4f0e-a8a3-1c2d3e4f5a6b",
            "timestamp": "2024-03-01T12:00:00Z",
            "requestId": "11111111-2222-3333-4444-555555555555",
            "action": "sign",
            "issuer": "ci@example.com",
            "subject": "repo:example/app",
            "keyId": "0123456789ABCDEF",
            "success": true
        }"#;
        let entry: AuditLogEntry = serde_json::from_str(body).unwrap();
        assert!(entry.success);
        assert!(entry.error_code.is_none());
        assert!(entry.metadata.is_none());
        assert_eq!(entry.key_id, "0123456789ABCDEF");
    }

    #[test]
    fn default_filter_sends_only_limit_and_offset() {
        let params = AuditFilter::default().to_query();
        assert_eq!(
            params,
            vec![("limit", "100".to_string()), ("offset", "0".to_string())]
        );
    }

    #[test]
    fn filter_includes_set_fields_in_wire_order() {
        let filter = AuditFilter {
            action: Some("key_upload".to_string()),
            subject: Some("repo:example/app".to_string()),
            limit: 25,
            ..AuditFilter::default()
        };
        let params = filter.to_query();
        let names: Vec<&str> = params.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["limit", "offset", "action", "subject"]);
        assert_eq!(params[0].1, "25");
    }

    #[test]
    fn rotation_outcome_omits_absent_deletion() {
        let outcome = RotationOutcome {
            uploaded: KeyUploadResult {
                success: true,
                key_id: "0123456789ABCDEF".to_string(),
                fingerprint: "ABCD".to_string(),
                algorithm: "EdDSA".to_string(),
                user_id: "ci@example.com".to_string(),
            },
            deleted: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("deleted").is_none());
        assert_eq!(json["uploaded"]["keyId"], "0123456789ABCDEF");
    }

    #[test]
    fn error_body_parses_partial_payloads() {
        let body: ErrorBody = serde_json::from_str(r#"{"code": "KEY_NOT_FOUND"}"#).unwrap();
        assert_eq!(body.code.as_deref(), Some("KEY_NOT_FOUND"));
        assert!(body.error.is_none());
        assert!(body.request_id.is_none());
    }
}
