// Error types shared across the bot.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to build a catalog from the puzzle data source.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("failed to read puzzle data '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed puzzle data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid move count key '{0}' (expected a positive odd number)")]
    InvalidKey(String),
    #[error("move count {0} appears more than once in the puzzle data")]
    DuplicateKey(u32),
}

/// Invalid or incomplete startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
    #[error("move count range {min}..={max} is empty")]
    EmptyRange { min: u32, max: u32 },
}

/// Failure while delivering messages to the messaging platform.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to messaging API failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("messaging API returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Webhook request whose signature could not be verified.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,
    #[error("signature header is not valid base64")]
    Malformed,
    #[error("signature does not match request body")]
    Mismatch,
}
