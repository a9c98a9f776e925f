//! Error taxonomy for engine queries
//!
//! Upstream HTTP failures stay distinguishable from transport and
//! credential failures so front ends can render them differently.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine endpoint answered with a non-success status.
    #[error("upstream returned HTTP {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    /// Connection, timeout, or mid-stream body failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token source could not produce a bearer token.
    #[error("failed to obtain access token: {0}")]
    Token(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl EngineError {
    /// True for upstream HTTP-status failures (as opposed to transport or
    /// credential problems).
    pub fn is_upstream(&self) -> bool {
        matches!(self, EngineError::Upstream { .. })
    }
}
