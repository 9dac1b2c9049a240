//! Config Format Decoding
//!
//! Turns config file bytes into an untyped key/value document. The format is
//! chosen once from the file suffix and carried as a [`ConfigFormat`] value.
//!
//! # Optional Decoders
//! JSON is always compiled in. YAML and TOML sit behind the `yaml` and `toml`
//! features; when a feature is off, [`YamlDecoder::new`] / [`TomlDecoder::new`]
//! return [`ProbeError::CapabilityMissing`] instead of a decoder.

use std::path::Path;

use serde_json::Value;

use crate::error::{ProbeError, Result};

/// Untyped decoded config document (top-level object only)
pub type RawDocument = serde_json::Map<String, Value>;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Supported config file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Select the format from a file suffix, case-insensitively
    ///
    /// `.json` → JSON, `.yaml`/`.yml` → YAML, `.toml` → TOML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            _ => Err(ProbeError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Format name as used in messages
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
        }
    }

    /// Decode raw file bytes into a top-level object
    ///
    /// A leading UTF-8 byte-order mark is stripped before parsing.
    pub fn decode(self, bytes: &[u8]) -> Result<RawDocument> {
        let text = decode_text(self, bytes)?;

        let value = match self {
            Self::Json => JsonDecoder.decode(text)?,
            Self::Yaml => YamlDecoder::new()?.decode(text)?,
            Self::Toml => TomlDecoder::new()?.decode(text)?,
        };

        match value {
            Value::Object(map) => Ok(map),
            _ => Err(ProbeError::NotAnObject),
        }
    }
}

impl std::fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// BOM-tolerant UTF-8 decoding
fn decode_text(format: ConfigFormat, bytes: &[u8]) -> Result<&str> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    std::str::from_utf8(body).map_err(|e| ProbeError::malformed(format.as_str(), e))
}

/// A text-to-value decoder for one config format
pub trait Decoder {
    /// Parse `text` into a generic value (any shape)
    fn decode(&self, text: &str) -> Result<Value>;
}

/// JSON decoder (always available)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, text: &str) -> Result<Value> {
        serde_json::from_str(text).map_err(|e| ProbeError::malformed("JSON", e))
    }
}

/// YAML decoder, available with the `yaml` feature
#[derive(Debug, Clone, Copy)]
pub struct YamlDecoder {
    _private: (),
}

impl YamlDecoder {
    /// Obtain the YAML decoder, or `CapabilityMissing` if it was compiled out
    pub fn new() -> Result<Self> {
        if cfg!(feature = "yaml") {
            Ok(Self { _private: () })
        } else {
            Err(ProbeError::capability_missing("YAML"))
        }
    }
}

#[cfg(feature = "yaml")]
impl Decoder for YamlDecoder {
    fn decode(&self, text: &str) -> Result<Value> {
        // serde_yaml only builds plain data (no arbitrary object construction)
        serde_yaml::from_str(text).map_err(|e| ProbeError::malformed("YAML", e))
    }
}

#[cfg(not(feature = "yaml"))]
impl Decoder for YamlDecoder {
    fn decode(&self, _text: &str) -> Result<Value> {
        Err(ProbeError::capability_missing("YAML"))
    }
}

/// TOML decoder, available with the `toml` feature
#[derive(Debug, Clone, Copy)]
pub struct TomlDecoder {
    _private: (),
}

impl TomlDecoder {
    /// Obtain the TOML decoder, or `CapabilityMissing` if it was compiled out
    pub fn new() -> Result<Self> {
        if cfg!(feature = "toml") {
            Ok(Self { _private: () })
        } else {
            Err(ProbeError::capability_missing("TOML"))
        }
    }
}

#[cfg(feature = "toml")]
impl Decoder for TomlDecoder {
    fn decode(&self, text: &str) -> Result<Value> {
        toml::from_str(text).map_err(|e| ProbeError::malformed("TOML", e))
    }
}

#[cfg(not(feature = "toml"))]
impl Decoder for TomlDecoder {
    fn decode(&self, _text: &str) -> Result<Value> {
        Err(ProbeError::capability_missing("TOML"))
    }
}
