//! `PostgreSQL` Diagnostic Engine
//!
//! Implements [`DiagnosticEngine`] on top of `tokio-postgres`.
//!
//! # Implementation Notes
//! - Plain TCP (`NoTls`); `sslmode` values that demand TLS (`require`,
//!   `verify-ca`, `verify-full`) are rejected before any network I/O
//! - Driver errors carry their whole cause chain (I/O error, server
//!   SQLSTATE and message) into the reported message
//! - `connect_timeout` is the transport connect timeout in seconds; zero or
//!   negative means no timeout
//! - The connection task is joined after the client is dropped, so the
//!   connection is closed before returning on success and on query failure

use crate::error::{ProbeError, Result};
use crate::session::{DiagnosticEngine, SessionParameters};

/// `PostgreSQL` engine (requires the `postgres` feature)
pub struct PostgresEngine;

#[cfg(feature = "postgres")]
mod driver {
    use std::error::Error as _;
    use std::time::Duration;

    use tokio_postgres::config::SslMode;
    use tokio_postgres::{Config, NoTls};

    use super::{DiagnosticEngine, PostgresEngine, ProbeError, Result, SessionParameters};
    use crate::session::DIAGNOSTIC_QUERY;

    impl DiagnosticEngine for PostgresEngine {
        async fn server_version(params: &SessionParameters) -> Result<String> {
            let pg_config = build_pg_config(params)?;

            let (client, connection) = pg_config.connect(NoTls).await.map_err(|e| {
                ProbeError::connection_failed(format!(
                    "Failed to connect to PostgreSQL: {}",
                    describe(&e)
                ))
            })?;

            // Connection errors are not logged to prevent credential leakage
            let driver = tokio::spawn(async move {
                let _ = connection.await;
            });

            let version = client
                .query_one(DIAGNOSTIC_QUERY, &[])
                .await
                .map_err(|e| {
                    ProbeError::query_failed(format!(
                        "Failed to query PostgreSQL version: {}",
                        describe(&e)
                    ))
                })
                .and_then(|row| {
                    row.try_get::<_, String>(0).map_err(|e| {
                        ProbeError::query_failed(format!("Unexpected version column: {e}"))
                    })
                });

            // Dropping the last client handle ends the connection task
            drop(client);
            let _ = driver.await;

            version
        }
    }

    /// Build `PostgreSQL` connection config from session parameters
    pub(super) fn build_pg_config(params: &SessionParameters) -> Result<Config> {
        let port = u16::try_from(params.port()).map_err(|_| {
            ProbeError::invalid_input(format!("Port {} is outside 0..=65535", params.port()))
        })?;

        let mut pg_config = Config::new();
        pg_config
            .host(params.host())
            .port(port)
            .user(params.user())
            .password(params.password())
            .dbname(params.dbname());

        if let Some(seconds) = params.connect_timeout() {
            // Same as libpq: zero or negative waits indefinitely
            match u64::try_from(seconds) {
                Ok(seconds) if seconds > 0 => {
                    pg_config.connect_timeout(Duration::from_secs(seconds));
                }
                _ => {}
            }
        }

        if let Some(mode) = params.sslmode() {
            pg_config.ssl_mode(parse_ssl_mode(mode)?);
        }

        Ok(pg_config)
    }

    /// Render a driver error with its full cause chain
    ///
    /// tokio-postgres only prints the error kind in `Display`; the I/O error or
    /// server response lives in `source()`.
    pub(super) fn describe(err: &tokio_postgres::Error) -> String {
        let mut message = err.to_string();

        let mut source = err.source();
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }

        if let Some(db) = err.as_db_error() {
            let code = db.code().code();
            if !message.contains(code) {
                message.push_str(&format!(" (SQLSTATE {code})"));
            }
        }

        message
    }

    /// Map `sslmode` onto what a plain-TCP connection can honour
    fn parse_ssl_mode(mode: &str) -> Result<SslMode> {
        match mode {
            "disable" => Ok(SslMode::Disable),
            "allow" | "prefer" => Ok(SslMode::Prefer),
            "require" | "verify-ca" | "verify-full" => Err(ProbeError::invalid_input(format!(
                "sslmode '{mode}' requires TLS, which pgprobe does not support; \
                 use 'disable', 'allow' or 'prefer'"
            ))),
            other => Err(ProbeError::invalid_input(format!("Unknown sslmode '{other}'"))),
        }
    }

}

#[cfg(not(feature = "postgres"))]
impl DiagnosticEngine for PostgresEngine {
    async fn server_version(_params: &SessionParameters) -> Result<String> {
        Err(ProbeError::capability_missing("PostgreSQL driver"))
    }
}
