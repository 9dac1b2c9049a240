//! Logging setup for the pgprobe binary.
//!
//! Events go to stderr so stdout only ever carries the version string.

use std::ffi::OsString;
use std::io::IsTerminal;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::{ProbeError, Result};

/// Map `-v`/`-q` flags to a level (0=WARN, 1=INFO, 2=DEBUG, 3+=TRACE)
#[must_use]
pub const fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::INFO,
        (false, 2) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    }
}

/// Colour only on a terminal, and never when `NO_COLOR` is set to a non-empty value
#[must_use]
pub fn ansi_enabled(stderr_is_terminal: bool, no_color: Option<OsString>) -> bool {
    stderr_is_terminal && no_color.map_or(true, |v| v.is_empty())
}

/// Install the stderr subscriber. `RUST_LOG` wins over the flags when set.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level_for(verbose, quiet).into()));

    let ansi = ansi_enabled(std::io::stderr().is_terminal(), std::env::var_os("NO_COLOR"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .try_init()
        .map_err(|e| ProbeError::environment(format!("Failed to initialize logging: {e}")))
}
