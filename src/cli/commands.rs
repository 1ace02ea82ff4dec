//! Subcommand handlers and output rendering.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;

use crate::armor::KeyProfile;
use crate::cli::{Cli, Commands};
use crate::client::types::{AuditFilter, HealthStatus};
use crate::client::SigningKeyClient;
use crate::error::{KeyServiceError, Result};

/// Dispatches the parsed CLI invocation.
pub async fn run(cli: Cli) -> Result<()> {
    // Pure arithmetic, no client needed
    if matches!(&cli.command, Commands::KeySize) {
        print_key_size_table();
        return Ok(());
    }

    let mut builder =
        SigningKeyClient::builder(&cli.url).timeout(Duration::from_secs(cli.timeout_secs));
    if let Some(token) = &cli.token {
        builder = builder.admin_token(token);
    }
    let client = builder.build()?;

    match cli.command {
        Commands::List => list_keys(&client).await,
        Commands::Upload { key_id, key_file } => upload_key(&client, &key_id, &key_file).await,
        Commands::PublicKey { key_id } => {
            let public_key = client.get_public_key(&key_id).await?;
            print!("{public_key}");
            Ok(())
        }
        Commands::Delete { key_id } => {
            println!("Deleting key: {key_id}");
            let result = client.delete_key(&key_id).await?;
            println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
            Ok(())
        }
        Commands::Audit {
            action,
            subject,
            days,
            limit,
        } => audit_logs(&client, action, subject, days, limit).await,
        Commands::Rotate {
            new_key_id,
            key_file,
            old_key_id,
            grace_hours,
        } => {
            let armored_key = read_key_file(&key_file)?;
            let outcome = client
                .rotate_keys(&new_key_id, &armored_key, old_key_id.as_deref(), grace_hours)
                .await?;
            println!("{}", serde_json::to_string_pretty(&outcome).unwrap_or_default());
            Ok(())
        }
        Commands::Health => match client.health().await {
            Ok(report) => {
                print_health_report(&report);
                Ok(())
            }
            // Degraded still prints the report before the error exit
            Err(KeyServiceError::Degraded { report }) => {
                print_health_report(&report);
                Err(KeyServiceError::Degraded { report })
            }
            Err(err) => Err(err),
        },
        Commands::KeySize => unreachable!("handled above"),
    }
}

async fn list_keys(client: &SigningKeyClient) -> Result<()> {
    let keys = client.list_keys().await?;
    if keys.is_empty() {
        println!("No keys found");
        return Ok(());
    }

    println!("Signing Keys:");
    println!("{}", "-".repeat(80));
    for key in keys {
        println!("ID: {}", key.key_id);
        println!("   Fingerprint: {}", key.fingerprint);
        println!("   Algorithm: {}", key.algorithm);
        println!("   Created: {}", key.created_at);
        println!();
    }
    Ok(())
}

async fn upload_key(client: &SigningKeyClient, key_id: &str, key_file: &Path) -> Result<()> {
    let armored_key = read_key_file(key_file)?;

    println!("Uploading key: {key_id}");
    let result = client.upload_key(key_id, &armored_key).await?;
    println!("Key uploaded successfully");
    println!("  Key ID: {}", result.key_id);
    println!("  Fingerprint: {}", result.fingerprint);
    println!("  Algorithm: {}", result.algorithm);
    println!("  User ID: {}", result.user_id);
    Ok(())
}

async fn audit_logs(
    client: &SigningKeyClient,
    action: Option<String>,
    subject: Option<String>,
    days: i64,
    limit: u32,
) -> Result<()> {
    let filter = AuditFilter {
        action,
        subject,
        start_date: Some(Utc::now() - chrono::Duration::days(days)),
        limit,
        ..AuditFilter::default()
    };
    let result = client.query_audit_logs(&filter).await?;

    println!("Audit logs (last {days} days):");
    println!("{}", "-".repeat(80));
    for entry in &result.logs {
        let status = if entry.success {
            "ok".to_string()
        } else {
            format!(
                "failed ({})",
                entry.error_code.as_deref().unwrap_or("unknown")
            )
        };
        println!(
            "{} | {:12} | {:20} | {}",
            entry.timestamp, entry.action, entry.subject, status
        );
        println!(
            "  ID: {} | Request: {} | Key: {}",
            entry.id, entry.request_id, entry.key_id
        );
        if let Some(metadata) = &entry.metadata {
            println!("  Metadata: {metadata}");
        }
        println!();
    }
    println!("Total: {} entries", result.count);
    Ok(())
}

fn print_health_report(report: &HealthStatus) {
    println!("Status:      {}", report.status);
    println!("Version:     {}", report.version);
    println!("Timestamp:   {}", report.timestamp);
    println!(
        "Key storage: {}",
        if report.checks.key_storage { "ok" } else { "failing" }
    );
    println!(
        "Database:    {}",
        if report.checks.database { "ok" } else { "failing" }
    );
}

fn print_key_size_table() {
    println!("Armored PGP key size estimates");
    println!("{}", "-".repeat(80));
    for profile in KeyProfile::ALL {
        let estimate = profile.estimate();
        println!("{}:", profile.name());
        println!("  Binary size (approx): {} bytes", estimate.binary_bytes);
        println!("  Base64 encoded: {} characters", estimate.base64_chars);
        println!("  Armored lines (64 chars/line): ~{}", estimate.body_lines);
        println!("  Total armored lines: ~{}", estimate.total_lines);
        println!("  Total armored size: ~{} characters", estimate.total_chars);
        println!();
    }
    println!("(Actual sizes vary with subkeys, metadata, and implementation)");
}

fn read_key_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| {
        KeyServiceError::InvalidArgument(format!("cannot read key file {}: {err}", path.display()))
    })
}

/// Renders an error for stderr. The binary maps any `Err` to exit code 1.
pub fn render_error(err: &KeyServiceError) {
    match err {
        KeyServiceError::Remote {
            code,
            message,
            request_id,
            status,
        } => {
            eprintln!(
                "API Error [{}]: {}",
                code.as_deref().unwrap_or("UNKNOWN"),
                message.as_deref().unwrap_or(&format!("HTTP {status}"))
            );
            if let Some(request_id) = request_id {
                eprintln!("Request ID: {request_id}");
            }
        }
        KeyServiceError::Transport(err) => eprintln!("Network Error: {err}"),
        other => eprintln!("Error: {other}"),
    }
}
