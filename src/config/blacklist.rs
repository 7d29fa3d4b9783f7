//! Media filename blacklist compilation.
//!
//! # Responsibilities
//! - Read the blacklist patterns from the live document store
//! - Compile them into regex matchers once, so matching a filename never
//!   pays compilation cost
//! - Match candidate filenames against the compiled set
//!
//! # Design Decisions
//! - Patterns come from the document store, not the typed snapshot: the
//!   snapshot is not rebuilt on reload, the store is
//! - A pattern that fails to compile is logged and skipped; it never
//!   invalidates the rest of the set
//! - A set is replaced wholesale on recompilation, never mutated

use regex::Regex;

use crate::config::document::DocumentStore;

/// Document key holding the blacklist patterns.
pub const MEDIA_DOWNLOAD_BLACKLIST_KEY: &str = "general.mediadownloadblacklist";

/// An ordered set of compiled filename matchers.
#[derive(Debug, Clone, Default)]
pub struct MatcherSet {
    matchers: Vec<Regex>,
}

impl MatcherSet {
    /// A set that matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile the blacklist from the current document store.
    ///
    /// Invalid patterns are dropped with a diagnostic; valid patterns keep
    /// their input order.
    pub fn compile(document: &DocumentStore) -> Self {
        let patterns = match document.get_string_list(MEDIA_DOWNLOAD_BLACKLIST_KEY) {
            Ok(Some(patterns)) => patterns,
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::error!(%err, "media download blacklist is not a string list");
                Vec::new()
            }
        };

        let mut matchers = Vec::with_capacity(patterns.len());
        for pattern in &patterns {
            match Regex::new(pattern) {
                Ok(re) => {
                    tracing::debug!(%pattern, "compiled media download blacklist pattern");
                    matchers.push(re);
                }
                Err(err) => {
                    tracing::error!(
                        %pattern,
                        %err,
                        "skipping invalid media download blacklist pattern"
                    );
                }
            }
        }
        Self { matchers }
    }

    /// True iff the filename matches at least one compiled pattern.
    pub fn is_match(&self, filename: &str) -> bool {
        self.matchers.iter().any(|re| re.is_match(filename))
    }

    /// Number of patterns that compiled successfully.
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::{parse_bytes, ConfigFormat};

    fn store_with_blacklist(patterns: &str) -> DocumentStore {
        let input = format!("[general]\nMediaDownloadBlackList = {}\n", patterns);
        parse_bytes(input.as_bytes(), ConfigFormat::Toml).unwrap()
    }

    #[test]
    fn matches_any_pattern_in_order() {
        let set = MatcherSet::compile(&store_with_blacklist(
            r#"[".*\\.exe$", ".*\\.html$"]"#,
        ));
        assert_eq!(set.len(), 2);
        assert!(set.is_match("setup.exe"));
        assert!(set.is_match("index.html"));
        assert!(!set.is_match("notes.txt"));
    }

    #[test]
    fn invalid_pattern_is_skipped_not_fatal() {
        let set = MatcherSet::compile(&store_with_blacklist(r#"[".*\\.exe$", "("]"#));
        // The broken `(` is dropped; the valid pattern still matches.
        assert_eq!(set.len(), 1);
        assert!(set.is_match("a.exe"));
        assert!(!set.is_match("a.txt"));
    }

    #[test]
    fn missing_key_compiles_an_empty_set() {
        let store = parse_bytes(b"[general]\n", ConfigFormat::Toml).unwrap();
        let set = MatcherSet::compile(&store);
        assert!(set.is_empty());
        assert!(!set.is_match("anything.exe"));
    }

    #[test]
    fn wrongly_typed_key_compiles_an_empty_set() {
        let store =
            parse_bytes(b"[general]\nMediaDownloadBlackList = 5\n", ConfigFormat::Toml).unwrap();
        let set = MatcherSet::compile(&store);
        assert!(set.is_empty());
    }

    #[test]
    fn empty_set_matches_nothing() {
        let set = MatcherSet::empty();
        assert!(!set.is_match("file.exe"));
        assert!(set.is_empty());
    }
}
