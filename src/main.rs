//! pgprobe CLI Entry Point
//!
//! Loads the config next to the executable, resolves credentials and prints
//! the PostgreSQL server version. Logs and errors go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};

use pgprobe::credentials::{self, CredentialMode};
use pgprobe::{config, logging, session, PostgresEngine, Result};

/// pgprobe - check that a PostgreSQL config and credentials work
#[derive(Parser)]
#[command(name = "pgprobe")]
#[command(about = "Validate a PostgreSQL connection config, resolve credentials, and report the server version")]
#[command(version)]
struct Cli {
    /// Check that the program starts, without loading config or connecting
    #[arg(long)]
    dry_run: bool,

    /// Ask for username and password in dialog windows
    #[arg(long)]
    gui: bool,

    /// Database user (unsafe: kept in shell history; needs --password too)
    #[arg(long, value_name = "USER")]
    user: Option<String>,

    /// Database password (unsafe: kept in shell history; needs --user too)
    #[arg(long, value_name = "PASSWORD")]
    password: Option<String>,

    /// Directory holding config.{json,yaml,yml,toml} [default: executable's directory]
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// More log output on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // A second subscriber cannot be installed; nothing else to do about it
    let _ = logging::init_logging(cli.verbose, cli.quiet);

    if cli.dry_run {
        println!("Dry-run OK: pgprobe starts.");
        return ExitCode::SUCCESS;
    }

    let mode = CredentialMode::select(cli.user, cli.password, cli.gui);
    // Shown regardless of log level
    if let Some(caveat) = mode.caveat() {
        eprintln!("Warning: {caveat}");
    }

    match run(cli.config_dir, &mode) {
        Ok(version) => {
            println!("PostgreSQL version:\n{version}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(code = err.error_code(), "probe failed");
            mode.report_failure(&err.to_string());
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(config_dir: Option<PathBuf>, mode: &CredentialMode) -> Result<String> {
    let dir = match config_dir {
        Some(dir) => dir,
        None => config::default_config_dir()?,
    };

    session::probe::<PostgresEngine, _>(&dir, || credentials::resolve(mode))
}
