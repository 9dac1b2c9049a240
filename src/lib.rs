//! pgprobe - PostgreSQL Connection Probe
//!
//! pgprobe reads connection settings from a config file next to the
//! executable, resolves credentials, opens one connection and reports the
//! server version.
//!
//! # Core Principles
//! - Allow-list config: unknown keys never reach the driver
//! - No coercion: a value of the wrong type is treated as absent
//! - Fatal validation: bad input aborts before any network activity
//! - Single-shot: one connection, one fixed query, no retries
//!
//! # Module Organization
//! - [`error`] - Error types and exit codes
//! - [`logging`] - stderr tracing subscriber
//! - [`config`] - Config discovery, format decoding and allow-list validation
//! - [`credentials`] - Direct, graphical and console credential resolution
//! - [`session`] - Parameter assembly and the diagnostic round-trip

pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod session;

// Re-export commonly used types for convenience
pub use config::{
    discover, load_config, load_from_dir, validate, ConfigFormat, ConnectionConfig, RawDocument,
    CONFIG_CANDIDATES,
};
pub use credentials::{resolve, validate_username, CredentialMode, Credentials};
pub use error::{ErrorCategory, ProbeError, Result};
pub use session::{
    assemble, probe, run_diagnostic, DiagnosticEngine, PostgresEngine, SessionParameters,
    DIAGNOSTIC_QUERY,
};
