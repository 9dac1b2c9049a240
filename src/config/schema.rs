//! Allow-List Config Validation
//!
//! Filters a decoded [`RawDocument`] down to the five connection keys pgprobe
//! understands and checks that the required ones are present.
//!
//! # Filtering Rules
//! - Keys outside [`ALLOWED_KEYS`] are dropped silently, so unsupported
//!   connection options can never reach the driver.
//! - Allowed keys whose value has the wrong type are dropped too. There is no
//!   coercion: `"5432"` is not a port.
//! - After filtering, `host`, `port`, `dbname` must be present; the first
//!   missing one (in that order) is reported.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::config::format::RawDocument;
use crate::error::{ProbeError, Result};

/// Value type accepted for an allowed key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// UTF-8 string
    String,
    /// Integer representable as `i64` (booleans and floats do not qualify)
    Integer,
}

impl ValueKind {
    /// Exact runtime type check, no coercion
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64(),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
        }
    }
}

/// Every key a config file may contribute, with its type
pub const ALLOWED_KEYS: [(&str, ValueKind); 5] = [
    ("host", ValueKind::String),
    ("port", ValueKind::Integer),
    ("dbname", ValueKind::String),
    ("connect_timeout", ValueKind::Integer),
    ("sslmode", ValueKind::String),
];

/// Required keys, in reporting order
pub const REQUIRED_KEYS: [&str; 3] = ["host", "port", "dbname"];

fn allowed_kind(key: &str) -> Option<(&'static str, ValueKind)> {
    ALLOWED_KEYS.iter().copied().find(|(name, _)| *name == key)
}

/// Validated connection settings from the config file
///
/// Fields are private; the value cannot change after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionConfig {
    host: String,
    port: i64,
    dbname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    connect_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sslmode: Option<String>,
}

impl ConnectionConfig {
    /// Build a config from the required fields
    pub fn new(host: impl Into<String>, port: i64, dbname: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            dbname: dbname.into(),
            connect_timeout: None,
            sslmode: None,
        }
    }

    /// Set the connect timeout (seconds)
    #[must_use]
    pub fn with_connect_timeout(mut self, seconds: i64) -> Self {
        self.connect_timeout = Some(seconds);
        self
    }

    /// Set the SSL mode
    #[must_use]
    pub fn with_sslmode(mut self, mode: impl Into<String>) -> Self {
        self.sslmode = Some(mode.into());
        self
    }

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
}

/// Filter a raw document through the allow-list and check required keys
pub fn validate(raw: RawDocument) -> Result<ConnectionConfig> {
    let mut retained: HashMap<&'static str, Value> = HashMap::with_capacity(ALLOWED_KEYS.len());

    for (key, value) in raw {
        match allowed_kind(&key) {
            Some((name, kind)) if kind.matches(&value) => {
                retained.insert(name, value);
            }
            Some((name, kind)) => {
                tracing::debug!(key = name, expected = kind.as_str(), "dropping config key with wrong type");
            }
            None => {
                tracing::debug!(key = %key, "dropping config key outside the allow-list");
            }
        }
    }

    let host = take_string(&mut retained, "host").ok_or(ProbeError::MissingRequiredKey("host"))?;
    let port = take_integer(&mut retained, "port").ok_or(ProbeError::MissingRequiredKey("port"))?;
    let dbname =
        take_string(&mut retained, "dbname").ok_or(ProbeError::MissingRequiredKey("dbname"))?;

    Ok(ConnectionConfig {
        host,
        port,
        dbname,
        connect_timeout: take_integer(&mut retained, "connect_timeout"),
        sslmode: take_string(&mut retained, "sslmode"),
    })
}

fn take_string(retained: &mut HashMap<&'static str, Value>, key: &str) -> Option<String> {
    match retained.remove(key)? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn take_integer(retained: &mut HashMap<&'static str, Value>, key: &str) -> Option<i64> {
    retained.remove(key)?.as_i64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(value: Value) -> RawDocument {
        match value {
            Value::Object(map) => map,
            other => panic!("test document must be an object, got {other}"),
        }
    }

    #[test]
    fn test_minimal_config() {
        let cfg = validate(raw(json!({"host": "db.local", "port": 5432, "dbname": "app"}))).unwrap();
        assert_eq!(cfg, ConnectionConfig::new("db.local", 5432, "app"));
        assert_eq!(cfg.connect_timeout(), None);
        assert_eq!(cfg.sslmode(), None);
    }

    #[test]
    fn test_full_config() {
        let cfg = validate(raw(json!({
            "host": "db.local",
            "port": 5432,
            "dbname": "app",
            "connect_timeout": 10,
            "sslmode": "require"
        })))
        .unwrap();
        assert_eq!(
            cfg,
            ConnectionConfig::new("db.local", 5432, "app")
                .with_connect_timeout(10)
                .with_sslmode("require")
        );
    }

    #[test]
    fn test_unknown_keys_dropped() {
        let cfg = validate(raw(json!({
            "host": "db.local",
            "port": 5432,
            "dbname": "app",
            "admin": true,
            "options": "-c search_path=evil",
            "user": "root"
        })))
        .unwrap();
        let serialized = serde_json::to_value(&cfg).unwrap();
        assert_eq!(serialized, json!({"host": "db.local", "port": 5432, "dbname": "app"}));
    }

    #[test]
    fn test_missing_key_order() {
        let err = validate(raw(json!({}))).unwrap_err();
        assert!(matches!(err, ProbeError::MissingRequiredKey("host")));

        let err = validate(raw(json!({"dbname": "app"}))).unwrap_err();
        assert!(matches!(err, ProbeError::MissingRequiredKey("host")));

        let err = validate(raw(json!({"host": "db.local", "dbname": "app"}))).unwrap_err();
        assert!(matches!(err, ProbeError::MissingRequiredKey("port")));

        let err = validate(raw(json!({"host": "db.local", "port": 5432}))).unwrap_err();
        assert!(matches!(err, ProbeError::MissingRequiredKey("dbname")));
    }

    #[test]
    fn test_wrong_type_port_is_dropped() {
        for port in [json!("5432"), json!(5432.0), json!(true), json!(null), json!([5432])] {
            let err = validate(raw(json!({"host": "db.local", "port": port, "dbname": "app"})))
                .unwrap_err();
            assert!(matches!(err, ProbeError::MissingRequiredKey("port")));
        }
    }

    #[test]
    fn test_wrong_type_optional_keys_dropped() {
        let cfg = validate(raw(json!({
            "host": "db.local",
            "port": 5432,
            "dbname": "app",
            "connect_timeout": "10",
            "sslmode": 1
        })))
        .unwrap();
        assert_eq!(cfg.connect_timeout(), None);
        assert_eq!(cfg.sslmode(), None);
    }

    #[test]
    fn test_wrong_type_host_reports_host() {
        let err = validate(raw(json!({"host": 127, "port": 5432, "dbname": "app"}))).unwrap_err();
        assert!(matches!(err, ProbeError::MissingRequiredKey("host")));
    }

    #[test]
    fn test_negative_integers_are_integers() {
        let cfg = validate(raw(json!({
            "host": "db.local",
            "port": 5432,
            "dbname": "app",
            "connect_timeout": -1
        })))
        .unwrap();
        assert_eq!(cfg.connect_timeout(), Some(-1));
    }

    #[test]
    fn test_value_kind_matches() {
        assert!(ValueKind::String.matches(&json!("x")));
        assert!(!ValueKind::String.matches(&json!(1)));
        assert!(ValueKind::Integer.matches(&json!(1)));
        assert!(ValueKind::Integer.matches(&json!(-1)));
        assert!(!ValueKind::Integer.matches(&json!(1.5)));
        assert!(!ValueKind::Integer.matches(&json!(false)));
        assert!(!ValueKind::Integer.matches(&json!(u64::MAX)));
    }
}
