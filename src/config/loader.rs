//! Configuration loading from disk.
//!
//! # Responsibilities
//! - Detect the input format from the file extension
//! - Parse TOML/JSON/YAML bytes into the canonical `Value` tree
//! - Surface structural failures as errors the bootstrap can treat as fatal
//!
//! # Design Decisions
//! - TOML is the default for unknown or missing extensions
//! - Keys are folded to lowercase while the tree is normalized, so every
//!   later layer sees one canonical spelling
//! - A parse failure at bootstrap is non-recoverable at this layer: no relay
//!   may run against a config that failed to parse

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use crate::config::document::{DocumentStore, Value};
use crate::config::schema::ProjectionError;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Detect the format from a filename extension. JSON and YAML are
    /// recognized explicitly; everything else defaults to TOML.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Error raised when the input bytes cannot be decoded into a document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("configuration is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("top-level configuration must be a table")]
    RootNotTable,
}

/// Error type for configuration loading and reloading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error("configuration was not loaded from a file and cannot be reloaded")]
    NotFileBacked,
}

/// Parse raw bytes in the given format into a document store.
pub fn parse_bytes(input: &[u8], format: ConfigFormat) -> Result<DocumentStore, ParseError> {
    let root = match format {
        ConfigFormat::Toml => {
            let text = std::str::from_utf8(input)?;
            let value: toml::Value = toml::from_str(text)?;
            from_toml(value)
        }
        ConfigFormat::Json => {
            let value: serde_json::Value = serde_json::from_slice(input)?;
            from_json(value)
        }
        ConfigFormat::Yaml => {
            let value: serde_yaml::Value = serde_yaml::from_slice(input)?;
            from_yaml(value)
        }
    };
    match root {
        Some(root @ Value::Table(_)) => Ok(DocumentStore::new(root)),
        _ => Err(ParseError::RootNotTable),
    }
}

fn from_toml(value: toml::Value) -> Option<Value> {
    Some(match value {
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Integer(i) => Value::Int(i),
        toml::Value::Float(f) => Value::Float(f),
        toml::Value::String(s) => Value::String(s),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => {
            Value::List(items.into_iter().filter_map(from_toml).collect())
        }
        toml::Value::Table(entries) => Value::Table(fold_table(
            entries.into_iter().filter_map(|(k, v)| Some((k, from_toml(v)?))),
        )),
    })
}

fn from_json(value: serde_json::Value) -> Option<Value> {
    Some(match value {
        serde_json::Value::Null => return None,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => number_value(n.as_i64(), n.as_f64())?,
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::List(items.into_iter().filter_map(from_json).collect())
        }
        serde_json::Value::Object(entries) => Value::Table(fold_table(
            entries.into_iter().filter_map(|(k, v)| Some((k, from_json(v)?))),
        )),
    })
}

fn from_yaml(value: serde_yaml::Value) -> Option<Value> {
    Some(match value {
        serde_yaml::Value::Null => return None,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => number_value(n.as_i64(), n.as_f64())?,
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::List(items.into_iter().filter_map(from_yaml).collect())
        }
        serde_yaml::Value::Mapping(entries) => Value::Table(fold_table(
            entries
                .into_iter()
                .filter_map(|(k, v)| Some((yaml_key(k)?, from_yaml(v)?))),
        )),
        serde_yaml::Value::Tagged(tagged) => return from_yaml(tagged.value),
    })
}

/// YAML mapping keys may be any scalar; render the non-string ones.
fn yaml_key(key: serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number_value(int: Option<i64>, float: Option<f64>) -> Option<Value> {
    if let Some(i) = int {
        return Some(Value::Int(i));
    }
    float.map(Value::Float)
}

/// Build a table with keys folded to their canonical lowercase form.
fn fold_table(entries: impl Iterator<Item = (String, Value)>) -> BTreeMap<String, Value> {
    entries.map(|(k, v)| (k.to_lowercase(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn format_detection_by_extension() {
        assert_eq!(
            ConfigFormat::detect(&PathBuf::from("relay.json")),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::detect(&PathBuf::from("relay.yaml")),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::detect(&PathBuf::from("relay.yml")),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::detect(&PathBuf::from("relay.toml")),
            ConfigFormat::Toml
        );
        // Unknown and missing extensions default to TOML.
        assert_eq!(
            ConfigFormat::detect(&PathBuf::from("relay.conf")),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::detect(&PathBuf::from("relay")),
            ConfigFormat::Toml
        );
    }

    #[test]
    fn toml_keys_are_folded() {
        let input = br#"
[general]
MediaDownloadSize = 1000
"#;
        let store = parse_bytes(input, ConfigFormat::Toml).unwrap();
        assert_eq!(
            store.get_int("general.mediadownloadsize").unwrap(),
            Some(1000)
        );
    }

    #[test]
    fn json_root_must_be_an_object() {
        let err = parse_bytes(b"[1, 2, 3]", ConfigFormat::Json).unwrap_err();
        assert!(matches!(err, ParseError::RootNotTable));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = parse_bytes(b"this is { not toml", ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ParseError::Toml(_)));
    }

    #[test]
    fn yaml_nested_tables_decode() {
        let input = br#"
irc:
  libera:
    Nick: relaybot
    UseTLS: true
"#;
        let store = parse_bytes(input, ConfigFormat::Yaml).unwrap();
        assert_eq!(
            store.get_string("irc.libera.Nick").unwrap(),
            Some("relaybot".to_string())
        );
        assert_eq!(store.get_bool("irc.libera.UseTLS").unwrap(), Some(true));
    }

    #[test]
    fn json_null_values_read_as_unset() {
        let input = br#"{"general": {"Nick": null}}"#;
        let store = parse_bytes(input, ConfigFormat::Json).unwrap();
        assert!(!store.is_set("general.Nick"));
    }
}
