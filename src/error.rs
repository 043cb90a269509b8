// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the exporter.
//! Each variant tells the story of what went wrong and where, and
//! [`AppError::kind`] folds them into the coarse taxonomy the pipeline
//! uses to decide whether a failure ends the run or just one page.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::constants::ERROR_BODY_PREVIEW_LENGTH;

/// Coarse classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure or timeout
    Network,
    /// Non-2xx response
    Http,
    /// Malformed JSON envelope
    Decode,
    /// Malformed storage-format markup
    Conversion,
    /// Filesystem or embedded store write failure
    Io,
    /// Missing or invalid configuration
    Configuration,
    /// A bug or an unexpected runtime condition
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Http => "http",
            Self::Decode => "decode",
            Self::Conversion => "conversion",
            Self::Io => "io",
            Self::Configuration => "configuration",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Confluence returned HTTP {status} for {url}: {detail}")]
    Http {
        status: reqwest::StatusCode,
        url: String,
        detail: String,
    },

    #[error("Malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed markup: {0}")]
    Conversion(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Embedded store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Failed to download {failed} of {total} attachment(s): {}", .details.join("; "))]
    AttachmentDownload {
        failed: usize,
        total: usize,
        details: Vec<String>,
    },

    #[error("Failed to read config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error for {path}: {source}")]
    JsonParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),
}

impl AppError {
    /// Builds an HTTP error, truncating the body to a readable preview.
    pub fn http(status: reqwest::StatusCode, url: impl Into<String>, body: &str) -> Self {
        AppError::Http {
            status,
            url: url.into(),
            detail: preview_body(body),
        }
    }

    /// Classifies this error into the coarse taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Network(_) => ErrorKind::Network,
            AppError::Http { .. } => ErrorKind::Http,
            AppError::Decode { .. } => ErrorKind::Decode,
            AppError::Conversion(_) => ErrorKind::Conversion,
            AppError::Io(_) | AppError::Store(_) | AppError::AttachmentDownload { .. } => {
                ErrorKind::Io
            }
            AppError::MissingConfiguration(_)
            | AppError::InvalidConfiguration(_)
            | AppError::ConfigFile { .. }
            | AppError::JsonParseError { .. }
            | AppError::ValidationError(_) => ErrorKind::Configuration,
            AppError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// The HTTP status behind this error, if it came from a response.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            AppError::Network(e) => e.status(),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError {
            message: err.to_string(),
            source: None,
        }
    }
}

impl From<tokio::sync::AcquireError> for AppError {
    fn from(err: tokio::sync::AcquireError) -> Self {
        AppError::InternalError {
            message: "Request limiter was closed".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Shortens a response body for error messages.
fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_PREVIEW_LENGTH {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
    format!("{}...", cut)
}
