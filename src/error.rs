//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout pgprobe.
//! Every failure is fatal: the binary prints the message and exits non-zero.
//!
//! # Error Categories
//! - Format: unsupported suffix, malformed content, non-object document
//! - Capability: an optional decoder or prompt backend was compiled out
//! - Schema: a required config key is absent after filtering, or a config
//!   value the driver cannot use (port range, sslmode)
//! - Credential: empty or disallowed-character username
//! - Connection: connect or diagnostic query failed
//! - Environment: config file not found, I/O, terminal, logging and runtime failures

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for pgprobe operations
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Config file suffix is not one of the supported formats
    #[error("Unsupported config format '{0}': expected .json, .yaml/.yml or .toml")]
    UnsupportedFormat(String),

    /// Config content could not be decoded
    #[error("Malformed {format} document: {detail}")]
    MalformedDocument { format: &'static str, detail: String },

    /// Decoded document is an array or scalar
    #[error("Config document must be an object")]
    NotAnObject,

    /// An optional capability was not compiled into this build
    #[error("Missing capability: {capability} support is not available in this build")]
    CapabilityMissing { capability: &'static str },

    /// A required key is absent (or had the wrong type and was dropped)
    #[error("Missing required key: `{0}`")]
    MissingRequiredKey(&'static str),

    /// Username failed sanitization. The rejected value is never included.
    #[error("Invalid username (spaces, quotes, slashes, ';' and '=' are not allowed)")]
    InvalidUsername,

    /// None of the candidate config files exists
    #[error("No config file found in {}: place one of {} there", .dir.display(), .candidates.join(", "))]
    ConfigNotFound { dir: PathBuf, candidates: Vec<&'static str> },

    /// File system failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Interactive prompt failed (no terminal, closed stdin, ...)
    #[error("Prompt failed: {0}")]
    Prompt(String),

    /// Process environment cannot support the run (logging, runtime, ...)
    #[error("Environment error: {0}")]
    Environment(String),

    /// Parameter cannot be handed to the driver
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Diagnostic query failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),
}

/// Coarse error taxonomy used for exit status selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Format,
    Capability,
    Schema,
    Credential,
    Connection,
    Environment,
}

impl ProbeError {
    /// Stable error code string
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::MalformedDocument { .. } => "MALFORMED_DOCUMENT",
            Self::NotAnObject => "NOT_AN_OBJECT",
            Self::CapabilityMissing { .. } => "CAPABILITY_MISSING",
            Self::MissingRequiredKey(_) => "MISSING_REQUIRED_KEY",
            Self::InvalidUsername => "INVALID_USERNAME",
            Self::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            Self::Io { .. } => "IO_ERROR",
            Self::Prompt(_) => "PROMPT_FAILED",
            Self::Environment(_) => "ENVIRONMENT_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::QueryFailed(_) => "QUERY_FAILED",
        }
    }

    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedFormat(_) | Self::MalformedDocument { .. } | Self::NotAnObject => {
                ErrorCategory::Format
            }
            Self::CapabilityMissing { .. } => ErrorCategory::Capability,
            Self::MissingRequiredKey(_) | Self::InvalidInput(_) => ErrorCategory::Schema,
            Self::InvalidUsername => ErrorCategory::Credential,
            Self::ConnectionFailed(_) | Self::QueryFailed(_) => ErrorCategory::Connection,
            Self::ConfigNotFound { .. } | Self::Io { .. } | Self::Prompt(_) | Self::Environment(_) => {
                ErrorCategory::Environment
            }
        }
    }

    /// Process exit status for this error (always non-zero)
    ///
    /// - 2: the input or environment needs fixing before a retry can succeed
    /// - 3: the database refused the connection or the query
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::Connection => 3,
            _ => 2,
        }
    }

    /// Create a malformed document error
    pub fn malformed(format: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::MalformedDocument { format, detail: detail.to_string() }
    }

    /// Create a missing capability error
    #[must_use]
    pub const fn capability_missing(capability: &'static str) -> Self {
        Self::CapabilityMissing { capability }
    }

    /// Create an I/O error bound to a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Create a prompt error
    pub fn prompt(message: impl Into<String>) -> Self {
        Self::Prompt(message.into())
    }

    /// Create an environment error
    pub fn environment(message: impl Into<String>) -> Self {
        Self::Environment(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed(message.into())
    }
}

/// Result type alias for pgprobe operations
pub type Result<T> = std::result::Result<T, ProbeError>;
