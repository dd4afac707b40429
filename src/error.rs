//! Error types for definition loading, extraction and conformance checks.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while extracting an endpoint from its definitions.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("schema '{schema}' nests deeper than {limit} levels (self-referential?)")]
    SchemaTooDeep { schema: String, limit: usize },

    #[error("route '{route}' is bound to unknown view '{view}'")]
    UnknownView { route: String, view: String },
}

impl ExtractError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading definitions or settings.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

/// Errors while checking a payload against an endpoint's field tree.
#[derive(Debug, Error)]
pub enum ConformanceError {
    #[error("generated schema is invalid: {message}")]
    InvalidSchema { message: String },

    #[error("payload does not conform: {} error(s)", errors.len())]
    Invalid { errors: Vec<PayloadError> },
}

impl ConformanceError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConformanceError::InvalidSchema { .. } => 2,
            ConformanceError::Invalid { .. } => 1,
        }
    }
}

/// Single payload mismatch with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PayloadError {
    /// JSON Pointer (RFC 6901) to the offending value.
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
