//! Generic key/value document store backing all dynamic lookups.
//!
//! # Responsibilities
//! - Hold the decoded configuration tree as a tagged `Value` union
//! - Answer presence-aware lookups over case-insensitive dotted paths
//! - Apply environment-variable overrides ahead of document values
//!
//! # Design Decisions
//! - Keys are folded to lowercase per segment at build time; lookup paths
//!   are folded the same way, which makes addressing case-insensitive
//! - Presence (`is_set`) is independent of the resolved value: an explicit
//!   `false`/`0`/`""` in the document still reports as set
//! - Typed getters never coerce between stored types; a mismatch is a
//!   `LookupError`, not a silent cast

use std::collections::BTreeMap;
use std::env;

use thiserror::Error;

/// Environment prefix for configuration overrides.
///
/// A document key `general.mediadownloadsize` can be overridden by setting
/// `RELAY_GENERAL_MEDIADOWNLOADSIZE`.
pub const ENV_PREFIX: &str = "RELAY";

/// A single decoded configuration value.
///
/// All three input formats (TOML, JSON, YAML) normalize into this one tree,
/// so lookups and projection never need to know where the bytes came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Table(BTreeMap<String, Value>),
}

impl Value {
    /// Human-readable name of the stored type, used in lookup diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Table(_) => "table",
        }
    }

    /// Convert into a `serde_json::Value` for structural decoding.
    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Table(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    pub(crate) fn expect_bool(&self, path: &str) -> Result<bool, LookupError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(LookupError::type_mismatch(path, "boolean", other)),
        }
    }

    pub(crate) fn expect_int(&self, path: &str) -> Result<i64, LookupError> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(LookupError::type_mismatch(path, "integer", other)),
        }
    }

    pub(crate) fn expect_string(&self, path: &str) -> Result<String, LookupError> {
        match self {
            Value::String(s) => Ok(s.clone()),
            other => Err(LookupError::type_mismatch(path, "string", other)),
        }
    }

    pub(crate) fn expect_string_list(&self, path: &str) -> Result<Vec<String>, LookupError> {
        let items = match self {
            Value::List(items) => items,
            other => return Err(LookupError::type_mismatch(path, "string list", other)),
        };
        let mut result = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::String(s) => result.push(s.clone()),
                other => return Err(LookupError::type_mismatch(path, "string list", other)),
            }
        }
        Ok(result)
    }

    /// Interpret the value as a list of string lists.
    ///
    /// A mismatched shape yields `None` rather than an error: callers treat
    /// it the same as an absent key.
    pub(crate) fn as_string_list_2d(&self) -> Option<Vec<Vec<String>>> {
        let rows = match self {
            Value::List(rows) => rows,
            _ => return None,
        };
        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let items = match row {
                Value::List(items) => items,
                _ => return None,
            };
            let mut entry = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => entry.push(s.clone()),
                    _ => return None,
                }
            }
            result.push(entry);
        }
        Some(result)
    }
}

/// Error raised when a typed getter finds a value of the wrong type, or an
/// environment override cannot be coerced to the requested type.
///
/// Callers must treat this as "value unavailable", never as a reason to
/// panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("config key `{path}` is not a {expected} (found {found})")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("environment override {var} for `{path}` is not a valid {expected}")]
    EnvCoercion {
        var: String,
        path: String,
        expected: &'static str,
    },
}

impl LookupError {
    fn type_mismatch(path: &str, expected: &'static str, found: &Value) -> Self {
        LookupError::TypeMismatch {
            path: path.to_string(),
            expected,
            found: found.type_name(),
        }
    }

    fn env_coercion(var: &str, path: &str, expected: &'static str) -> Self {
        LookupError::EnvCoercion {
            var: var.to_string(),
            path: path.to_string(),
            expected,
        }
    }
}

/// Fold a dotted lookup path to its canonical (lowercase) form.
pub(crate) fn fold_path(path: &str) -> String {
    path.to_lowercase()
}

/// The decoded configuration document.
///
/// Built once from file bytes at bootstrap and replaced wholesale on each
/// reload; never mutated in place. This is the single source of truth for
/// all dynamic lookups.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    /// Canonical tree with folded keys; input for the typed projection.
    root: Value,
    /// Flattened dotted-path index over every table node and leaf.
    index: BTreeMap<String, Value>,
    /// Prefix for environment overrides, `ENV_PREFIX` outside tests.
    env_prefix: String,
}

impl DocumentStore {
    /// Build a store from an already-normalized value tree.
    ///
    /// The root must be a table; scalar or list roots are rejected by the
    /// loader before this point.
    pub(crate) fn new(root: Value) -> Self {
        let mut index = BTreeMap::new();
        flatten_into(&mut index, "", &root);
        Self {
            root,
            index,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Replace the environment prefix. Tests use unique prefixes so they can
    /// set process environment variables without colliding.
    #[doc(hidden)]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// The canonical tree, as consumed by the typed projection.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// True if the path is present in the document or overridden by the
    /// environment, regardless of the value it resolves to.
    pub fn is_set(&self, path: &str) -> bool {
        let folded = fold_path(path);
        self.env_var(&folded).is_some() || self.index.contains_key(&folded)
    }

    /// Raw lookup: the stored value, if any. An environment override is
    /// surfaced as a string value.
    pub fn get(&self, path: &str) -> Option<Value> {
        let folded = fold_path(path);
        if let Some((_, raw)) = self.env_var(&folded) {
            return Some(Value::String(raw));
        }
        self.index.get(&folded).cloned()
    }

    pub fn get_bool(&self, path: &str) -> Result<Option<bool>, LookupError> {
        let folded = fold_path(path);
        if let Some((var, raw)) = self.env_var(&folded) {
            return parse_env_bool(&raw)
                .map(Some)
                .ok_or_else(|| LookupError::env_coercion(&var, path, "boolean"));
        }
        match self.index.get(&folded) {
            None => Ok(None),
            Some(value) => value.expect_bool(path).map(Some),
        }
    }

    pub fn get_int(&self, path: &str) -> Result<Option<i64>, LookupError> {
        let folded = fold_path(path);
        if let Some((var, raw)) = self.env_var(&folded) {
            return raw
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| LookupError::env_coercion(&var, path, "integer"));
        }
        match self.index.get(&folded) {
            None => Ok(None),
            Some(value) => value.expect_int(path).map(Some),
        }
    }

    pub fn get_string(&self, path: &str) -> Result<Option<String>, LookupError> {
        let folded = fold_path(path);
        if let Some((_, raw)) = self.env_var(&folded) {
            return Ok(Some(raw));
        }
        match self.index.get(&folded) {
            None => Ok(None),
            Some(value) => value.expect_string(path).map(Some),
        }
    }

    /// Environment overrides for string lists split on whitespace.
    pub fn get_string_list(&self, path: &str) -> Result<Option<Vec<String>>, LookupError> {
        let folded = fold_path(path);
        if let Some((_, raw)) = self.env_var(&folded) {
            return Ok(Some(
                raw.split_whitespace().map(str::to_string).collect(),
            ));
        }
        match self.index.get(&folded) {
            None => Ok(None),
            Some(value) => value.expect_string_list(path).map(Some),
        }
    }

    /// Lists of string lists are document-only (no environment overlay);
    /// a mismatched shape reports as absent.
    pub fn get_string_list_2d(&self, path: &str) -> Option<Vec<Vec<String>>> {
        let folded = fold_path(path);
        self.index
            .get(&folded)
            .and_then(Value::as_string_list_2d)
    }

    /// Look up the environment override for a folded path. Returns the
    /// variable name alongside its value so coercion errors can name it.
    fn env_var(&self, folded_path: &str) -> Option<(String, String)> {
        let var = env_var_name(&self.env_prefix, folded_path);
        env::var(&var).ok().map(|raw| (var, raw))
    }
}

/// Translate a folded dotted path into its override variable name:
/// prefix + path with `.` and `-` replaced by `_`, upper-cased.
fn env_var_name(prefix: &str, folded_path: &str) -> String {
    let mapped: String = folded_path
        .chars()
        .map(|c| match c {
            '.' | '-' => '_',
            other => other,
        })
        .collect();
    format!("{}_{}", prefix, mapped.to_uppercase())
}

fn parse_env_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Index every table node and leaf under its dotted path. List elements are
/// not individually addressable; a list is a leaf from the index's point of
/// view.
fn flatten_into(index: &mut BTreeMap<String, Value>, prefix: &str, value: &Value) {
    if let Value::Table(entries) = value {
        for (key, child) in entries {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            flatten_into(index, &path, child);
            index.insert(path, child.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: Vec<(&str, Value)>) -> Value {
        Value::Table(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    fn sample_store() -> DocumentStore {
        DocumentStore::new(table(vec![(
            "general",
            table(vec![
                ("mediadownloadsize", Value::Int(1000)),
                ("showjoinpart", Value::Bool(false)),
                ("nick", Value::String("relay".into())),
                (
                    "mediadownloadblacklist",
                    Value::List(vec![
                        Value::String(".*\\.exe$".into()),
                        Value::String(".*\\.html$".into()),
                    ]),
                ),
                (
                    "replacemessages",
                    Value::List(vec![
                        Value::List(vec![
                            Value::String("cat".into()),
                            Value::String("dog".into()),
                        ]),
                        Value::List(vec![
                            Value::String("foo".into()),
                            Value::String("bar".into()),
                        ]),
                    ]),
                ),
            ]),
        )]))
    }

    #[test]
    fn is_set_distinguishes_absence_from_zero_values() {
        let store = sample_store();
        // Explicit false still reports as set.
        assert!(store.is_set("general.ShowJoinPart"));
        assert_eq!(store.get_bool("general.ShowJoinPart").unwrap(), Some(false));
        // Never-present key is unset.
        assert!(!store.is_set("general.StripNick"));
        assert_eq!(store.get_bool("general.StripNick").unwrap(), None);
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let store = sample_store();
        assert_eq!(
            store.get_int("GENERAL.MediaDownloadSize").unwrap(),
            Some(1000)
        );
        assert_eq!(
            store.get_string("general.NICK").unwrap(),
            Some("relay".to_string())
        );
    }

    #[test]
    fn section_nodes_report_as_set() {
        let store = sample_store();
        assert!(store.is_set("general"));
        assert!(matches!(store.get("general"), Some(Value::Table(_))));
    }

    #[test]
    fn type_mismatch_is_an_error_not_a_crash() {
        let store = sample_store();
        let err = store.get_string("general.MediaDownloadSize").unwrap_err();
        assert_eq!(
            err,
            LookupError::TypeMismatch {
                path: "general.MediaDownloadSize".to_string(),
                expected: "string",
                found: "integer",
            }
        );
    }

    #[test]
    fn string_list_lookup() {
        let store = sample_store();
        let list = store
            .get_string_list("general.MediaDownloadBlackList")
            .unwrap()
            .unwrap();
        assert_eq!(list, vec![".*\\.exe$", ".*\\.html$"]);
    }

    #[test]
    fn string_list_2d_lookup_preserves_order() {
        let store = sample_store();
        let rows = store.get_string_list_2d("general.ReplaceMessages").unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["cat".to_string(), "dog".to_string()],
                vec!["foo".to_string(), "bar".to_string()],
            ]
        );
    }

    #[test]
    fn string_list_2d_shape_mismatch_reports_absent() {
        let store = sample_store();
        // A plain string list is not a list of string lists.
        assert_eq!(
            store.get_string_list_2d("general.MediaDownloadBlackList"),
            None
        );
        assert_eq!(store.get_string_list_2d("general.Missing"), None);
    }

    #[test]
    fn env_override_takes_precedence_and_reports_set() {
        let store = sample_store().with_env_prefix("RELAYTEST_PRECEDENCE");
        env::set_var("RELAYTEST_PRECEDENCE_GENERAL_MEDIADOWNLOADSIZE", "42");
        assert!(store.is_set("general.MediaDownloadSize"));
        assert_eq!(
            store.get_int("general.MediaDownloadSize").unwrap(),
            Some(42)
        );
        env::remove_var("RELAYTEST_PRECEDENCE_GENERAL_MEDIADOWNLOADSIZE");
    }

    #[test]
    fn env_override_makes_unset_keys_visible() {
        let store = sample_store().with_env_prefix("RELAYTEST_VISIBLE");
        assert!(!store.is_set("general.Label"));
        env::set_var("RELAYTEST_VISIBLE_GENERAL_LABEL", "bridge-a");
        assert!(store.is_set("general.Label"));
        assert_eq!(
            store.get_string("general.Label").unwrap(),
            Some("bridge-a".to_string())
        );
        env::remove_var("RELAYTEST_VISIBLE_GENERAL_LABEL");
    }

    #[test]
    fn env_override_coercion_failure_is_typed() {
        let store = sample_store().with_env_prefix("RELAYTEST_COERCE");
        env::set_var("RELAYTEST_COERCE_GENERAL_MEDIADOWNLOADSIZE", "not-a-number");
        let err = store.get_int("general.MediaDownloadSize").unwrap_err();
        assert!(matches!(err, LookupError::EnvCoercion { .. }));
        env::remove_var("RELAYTEST_COERCE_GENERAL_MEDIADOWNLOADSIZE");
    }

    #[test]
    fn env_override_splits_string_lists_on_whitespace() {
        let store = sample_store().with_env_prefix("RELAYTEST_SPLIT");
        env::set_var(
            "RELAYTEST_SPLIT_GENERAL_MEDIADOWNLOADBLACKLIST",
            ".*\\.exe$ .*\\.bat$",
        );
        let list = store
            .get_string_list("general.MediaDownloadBlackList")
            .unwrap()
            .unwrap();
        assert_eq!(list, vec![".*\\.exe$", ".*\\.bat$"]);
        env::remove_var("RELAYTEST_SPLIT_GENERAL_MEDIADOWNLOADBLACKLIST");
    }

    #[test]
    fn env_var_name_folds_separators() {
        assert_eq!(
            env_var_name("RELAY", "general.media-download-size"),
            "RELAY_GENERAL_MEDIA_DOWNLOAD_SIZE"
        );
    }
}
