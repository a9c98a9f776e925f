//! Inline service-account credential materialization
//!
//! Hosted environments often can only hand the process a blob of JSON in an
//! environment variable. Application-default tooling wants a file path, so
//! the blob is written to a kept temp file and the path variable pointed at
//! it before the first token request.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

/// Inline service-account JSON, if the deployment provides one.
pub const CREDENTIALS_JSON_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS_JSON";

/// Where application-default credential lookups expect a file path.
pub const CREDENTIALS_PATH_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Write the inline credential (when present and valid JSON) to a temp file
/// and point [`CREDENTIALS_PATH_ENV`] at it. Returns the file path, or
/// `None` when there was nothing usable to materialize.
pub fn materialize_inline_credentials() -> Result<Option<PathBuf>> {
    let raw = match std::env::var(CREDENTIALS_JSON_ENV) {
        Ok(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(None),
    };

    let parsed: Value = match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Ignoring {}: not valid JSON ({})", CREDENTIALS_JSON_ENV, e);
            return Ok(None);
        }
    };

    let mut file = tempfile::Builder::new()
        .prefix("adk-chat-creds-")
        .suffix(".json")
        .tempfile()
        .context("creating credentials temp file")?;
    serde_json::to_writer(&mut file, &parsed).context("writing credentials temp file")?;

    // Keep the file for the lifetime of the process; token requests read it
    // through the path variable.
    let (_file, path) = file.keep().context("persisting credentials temp file")?;
    std::env::set_var(CREDENTIALS_PATH_ENV, &path);
    info!("Materialized inline credentials to {}", path.display());

    Ok(Some(path))
}
