//! Test-time value shadowing over a real configuration.
//!
//! # Responsibilities
//! - Intercept a fixed map of path → value ahead of the wrapped config
//! - Forward every other lookup unchanged
//!
//! # Design Decisions
//! - Explicit composition: the shadow holds a reference to a real
//!   [`Config`], it does not subclass or embed one
//! - Overrides are immutable after construction
//! - Override values go through the same typed-conversion rules as
//!   document values, so a shadowed lookup fails the same way a real one
//!   would

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::accessor::Config;
use crate::config::document::{fold_path, LookupError, Value};
use crate::config::schema::RelayValues;

/// Wraps any [`Config`] with a fixed override map, for deterministic test
/// doubles.
pub struct OverrideConfig {
    inner: Arc<dyn Config>,
    overrides: HashMap<String, Value>,
}

impl OverrideConfig {
    /// Build a shadow over `inner`. Override keys are folded the same way
    /// lookup paths are, so `"general.MediaDownloadSize"` and
    /// `"general.mediadownloadsize"` name the same override.
    pub fn new(inner: Arc<dyn Config>, overrides: HashMap<String, Value>) -> Self {
        let overrides = overrides
            .into_iter()
            .map(|(path, value)| (fold_path(&path), value))
            .collect();
        Self { inner, overrides }
    }

    fn overridden(&self, path: &str) -> Option<&Value> {
        self.overrides.get(&fold_path(path))
    }
}

impl Config for OverrideConfig {
    fn is_set(&self, path: &str) -> bool {
        self.overridden(path).is_some() || self.inner.is_set(path)
    }

    fn get_bool(&self, path: &str) -> Result<Option<bool>, LookupError> {
        match self.overridden(path) {
            Some(value) => value.expect_bool(path).map(Some),
            None => self.inner.get_bool(path),
        }
    }

    fn get_int(&self, path: &str) -> Result<Option<i64>, LookupError> {
        match self.overridden(path) {
            Some(value) => value.expect_int(path).map(Some),
            None => self.inner.get_int(path),
        }
    }

    fn get_string(&self, path: &str) -> Result<Option<String>, LookupError> {
        match self.overridden(path) {
            Some(value) => value.expect_string(path).map(Some),
            None => self.inner.get_string(path),
        }
    }

    fn get_string_list(&self, path: &str) -> Result<Option<Vec<String>>, LookupError> {
        match self.overridden(path) {
            Some(value) => value.expect_string_list(path).map(Some),
            None => self.inner.get_string_list(path),
        }
    }

    fn get_string_list_2d(&self, path: &str) -> Option<Vec<Vec<String>>> {
        match self.overridden(path) {
            Some(value) => value.as_string_list_2d(),
            None => self.inner.get_string_list_2d(path),
        }
    }

    fn is_filename_blacklisted(&self, filename: &str) -> bool {
        self.inner.is_filename_blacklisted(filename)
    }

    fn values(&self) -> Arc<RelayValues> {
        self.inner.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::accessor::RelayConfig;
    use crate::config::loader::ConfigFormat;

    fn wrapped() -> Arc<dyn Config> {
        let input = r#"
[general]
MediaDownloadSize = 1000
Nick = "real-nick"
"#;
        Arc::new(RelayConfig::from_bytes(input.as_bytes(), ConfigFormat::Toml, None).unwrap())
    }

    fn shadow(entries: Vec<(&str, Value)>) -> OverrideConfig {
        OverrideConfig::new(
            wrapped(),
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn override_shadows_the_document_value() {
        let config = shadow(vec![("general.MediaDownloadSize", Value::Int(42))]);
        assert_eq!(
            config.get_int("general.MediaDownloadSize").unwrap(),
            Some(42)
        );
        assert!(config.is_set("general.MediaDownloadSize"));
    }

    #[test]
    fn non_overridden_paths_match_the_wrapped_config() {
        let config = shadow(vec![("general.MediaDownloadSize", Value::Int(42))]);
        assert_eq!(
            config.get_string("general.Nick").unwrap(),
            Some("real-nick".to_string())
        );
        assert!(!config.is_set("general.Label"));
        assert_eq!(config.get_string("general.Label").unwrap(), None);
    }

    #[test]
    fn override_makes_unset_paths_report_set() {
        let config = shadow(vec![("general.Label", Value::String("shadowed".into()))]);
        assert!(config.is_set("general.Label"));
        assert_eq!(
            config.get_string("general.Label").unwrap(),
            Some("shadowed".to_string())
        );
    }

    #[test]
    fn override_keys_are_case_insensitive() {
        let config = shadow(vec![("General.MediaDownloadSize", Value::Int(7))]);
        assert_eq!(
            config.get_int("general.mediadownloadsize").unwrap(),
            Some(7)
        );
    }

    #[test]
    fn override_of_wrong_type_is_a_lookup_error() {
        let config = shadow(vec![(
            "general.MediaDownloadSize",
            Value::String("huge".into()),
        )]);
        assert!(config.get_int("general.MediaDownloadSize").is_err());
    }

    #[test]
    fn list_of_lists_override() {
        let config = shadow(vec![(
            "general.ReplaceNicks",
            Value::List(vec![Value::List(vec![
                Value::String("old".into()),
                Value::String("new".into()),
            ])]),
        )]);
        assert_eq!(
            config.get_string_list_2d("general.ReplaceNicks"),
            Some(vec![vec!["old".to_string(), "new".to_string()]])
        );
    }
}
