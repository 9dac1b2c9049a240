//! Session Assembly and the Diagnostic Round-Trip
//!
//! Merges the validated config with the validated credentials and hands the
//! result to a [`DiagnosticEngine`] exactly once.
//!
//! # Single-Shot
//! One connection, one fixed query ([`DIAGNOSTIC_QUERY`]), no retries and no
//! pooling. The engine future is driven on a current-thread runtime, so the
//! whole run stays on one thread.

pub mod postgres;

use std::fmt;
use std::future::Future;
use std::path::Path;

use zeroize::Zeroizing;

pub use postgres::PostgresEngine;

use crate::config::{self, ConnectionConfig};
use crate::credentials::Credentials;
use crate::error::{ProbeError, Result};

/// The only statement pgprobe ever runs
pub const DIAGNOSTIC_QUERY: &str = "SELECT version()";

/// Everything needed to open one connection
///
/// Config keys and credential keys are disjoint, so the merge cannot collide.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionParameters {
    host: String,
    port: i64,
    dbname: String,
    connect_timeout: Option<i64>,
    sslmode: Option<String>,
    user: String,
    password: Zeroizing<String>,
}

impl SessionParameters {
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub const fn port(&self) -> i64 {
        self.port
    }

    #[must_use]
    pub fn dbname(&self) -> &str {
        &self.dbname
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Option<i64> {
        self.connect_timeout
    }

    #[must_use]
    pub fn sslmode(&self) -> Option<&str> {
        self.sslmode.as_deref()
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// WARNING: Sensitive data, do not log or include in error messages
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Names of the parameters that are set, in connection-string order
    #[must_use]
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = vec!["host", "port", "dbname"];
        if self.connect_timeout.is_some() {
            keys.push("connect_timeout");
        }
        if self.sslmode.is_some() {
            keys.push("sslmode");
        }
        keys.extend(["user", "password"]);
        keys
    }
}

impl fmt::Debug for SessionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionParameters")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("connect_timeout", &self.connect_timeout)
            .field("sslmode", &self.sslmode)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Merge config and credentials (pure)
#[must_use]
pub fn assemble(config: &ConnectionConfig, credentials: &Credentials) -> SessionParameters {
    SessionParameters {
        host: config.host().to_string(),
        port: config.port(),
        dbname: config.dbname().to_string(),
        connect_timeout: config.connect_timeout(),
        sslmode: config.sslmode().map(str::to_string),
        user: credentials.username().to_string(),
        password: Zeroizing::new(credentials.password().to_string()),
    }
}

/// The external connect-and-query capability
///
/// Implementations open one connection, run [`DIAGNOSTIC_QUERY`], close the
/// connection on every path and return the single scalar result.
pub trait DiagnosticEngine {
    fn server_version(params: &SessionParameters) -> impl Future<Output = Result<String>> + Send;
}

/// Run the diagnostic query once, blocking the calling thread
pub fn run_diagnostic<E: DiagnosticEngine>(params: SessionParameters) -> Result<String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ProbeError::environment(format!("Failed to start I/O runtime: {e}")))?;

    tracing::debug!(host = params.host(), port = params.port(), dbname = params.dbname(), "connecting");
    runtime.block_on(E::server_version(&params))
}

/// Load config, then resolve credentials, then run the diagnostic
///
/// Config problems surface before any credential prompt is shown.
pub fn probe<E, F>(config_dir: &Path, resolve_credentials: F) -> Result<String>
where
    E: DiagnosticEngine,
    F: FnOnce() -> Result<Credentials>,
{
    let config = config::load_from_dir(config_dir)?;
    let credentials = resolve_credentials()?;
    let params = assemble(&config, &credentials);
    drop(credentials);
    run_diagnostic::<E>(params)
}
