//! Configuration Management
//!
//! This module locates the connection config file and turns it into a
//! validated [`ConnectionConfig`].
//!
//! # Configuration Location
//! The config lives next to the executable (or in `--config-dir`). Candidates
//! are tried in order and the first existing file wins:
//! 1. `config.json`
//! 2. `config.yaml`
//! 3. `config.yml`
//! 4. `config.toml`
//!
//! # Pipeline
//! bytes → [`ConfigFormat::decode`] → [`schema::validate`] → [`ConnectionConfig`]

pub mod format;
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

pub use format::{ConfigFormat, Decoder, JsonDecoder, RawDocument, TomlDecoder, YamlDecoder};
pub use schema::{validate, ConnectionConfig, ValueKind, ALLOWED_KEYS, REQUIRED_KEYS};

use crate::error::{ProbeError, Result};

/// Config file names, in discovery order
pub const CONFIG_CANDIDATES: [&str; 4] = ["config.json", "config.yaml", "config.yml", "config.toml"];

/// Directory the config is read from by default: the one holding the executable
pub fn default_config_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| ProbeError::io("<current executable>", e))?;

    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        ProbeError::invalid_input(format!("Executable path {} has no parent", exe.display()))
    })
}

/// Find the first config candidate that exists in `dir`
///
/// The format is selected here, once, from the file suffix.
pub fn discover(dir: &Path) -> Result<(PathBuf, ConfigFormat)> {
    for name in CONFIG_CANDIDATES {
        let candidate = dir.join(name);
        if candidate.is_file() {
            let format = ConfigFormat::from_path(&candidate)?;
            tracing::debug!(path = %candidate.display(), %format, "found config file");
            return Ok((candidate, format));
        }
    }

    Err(ProbeError::ConfigNotFound { dir: dir.to_path_buf(), candidates: CONFIG_CANDIDATES.to_vec() })
}

/// Read, decode and validate a config file
pub fn load_config(path: &Path) -> Result<ConnectionConfig> {
    let format = ConfigFormat::from_path(path)?;
    load_config_as(path, format)
}

/// Read, decode and validate a config file with a known format
pub fn load_config_as(path: &Path, format: ConfigFormat) -> Result<ConnectionConfig> {
    let bytes = fs::read(path).map_err(|e| ProbeError::io(path, e))?;
    let raw = format.decode(&bytes)?;
    tracing::debug!(keys = raw.len(), %format, "decoded config document");
    validate(raw)
}

/// Discover and load the config in `dir`
pub fn load_from_dir(dir: &Path) -> Result<ConnectionConfig> {
    let (path, format) = discover(dir)?;
    load_config_as(&path, format)
}
