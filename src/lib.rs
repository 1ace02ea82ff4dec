//! Client library for the GPG Signing Service key-management API.
//!
//! The service stores GPG signing keys and signs commit data on behalf of
//! CI workflows; this crate talks to its administrative endpoints. It
//! performs no cryptographic operations itself; key material passes
//! through as opaque armored text.
//!
//! The main entry point is [`SigningKeyClient`], which wraps a single
//! connection-pooling HTTP client with bounded retry on transient server
//! errors. A separate [`armor`] module estimates the textual size of
//! armored key blocks from closed-form arithmetic.

pub mod armor;
pub mod cli;
pub mod client;
pub mod error;

pub use client::http::RetryPolicy;
pub use client::types::{
    AuditFilter, AuditLogEntry, AuditLogsResponse, HealthChecks, HealthStatus, KeyDeletionResult,
    KeyListItem, KeyUploadResult, RotationOutcome,
};
pub use client::{SigningKeyClient, SigningKeyClientBuilder};
pub use error::{KeyServiceError, Result};
