//! Command-line interface definitions.
//!
//! Presentation layer only: argument parsing here, rendering in
//! [`commands`]. The process environment is read once at this boundary
//! (via clap's `env` attributes) and injected into the client, which
//! itself never touches global state.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default service endpoint, overridable per invocation.
pub const DEFAULT_SERVICE_URL: &str = "https://gpg.kajkowalski.nl";

/// Manage GPG signing keys via the GPG Signing Service API.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base URL of the signing service
    #[arg(long, env = "GPG_SERVICE_URL", default_value = DEFAULT_SERVICE_URL, global = true)]
    pub url: String,

    /// Admin bearer token for authenticated operations
    #[arg(long, env = "GPG_ADMIN_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all signing keys
    List,
    /// Upload a new signing key
    Upload {
        /// Key identifier (16 hex characters)
        key_id: String,
        /// Path to the armored private key file
        key_file: PathBuf,
    },
    /// Print the armored public key for a key
    PublicKey {
        /// Key identifier
        key_id: String,
    },
    /// Delete a signing key (irreversible)
    Delete {
        /// Key identifier to delete
        key_id: String,
    },
    /// Query audit logs
    Audit {
        /// Filter by action (sign, key_upload, key_rotate, key_delete)
        #[arg(long)]
        action: Option<String>,
        /// Filter by subject
        #[arg(long)]
        subject: Option<String>,
        /// Days of history to include
        #[arg(long, default_value_t = 7)]
        days: i64,
        /// Maximum entries to return
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Rotate signing keys: upload a new key, then delete the old one
    Rotate {
        /// New key identifier
        new_key_id: String,
        /// Path to the armored private key file
        key_file: PathBuf,
        /// Old key to delete after rotation
        #[arg(long)]
        old_key_id: Option<String>,
        /// Intended grace period before deleting the old key (logged,
        /// not enforced; deletion runs immediately)
        #[arg(long, default_value_t = 24)]
        grace_hours: u32,
    },
    /// Check service health
    Health,
    /// Print armored key size estimates for common algorithms
    KeySize,
}
