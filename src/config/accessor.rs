//! Thread-safe configuration façade.
//!
//! # Data Flow
//! ```text
//! bootstrap:
//!     RelayConfig::from_file
//!         → loader (parse into DocumentStore)
//!         → RelayValues::project (typed snapshot, taken once)
//!         → log-file redirect (best effort)
//!         → MatcherSet::compile
//!         → (document, blacklist) stored behind one atomic swap
//!
//! runtime:
//!     readers call the Config trait → load the current (document,
//!     blacklist) pair → answer from it
//!     the reload watcher calls reload() → parse outside the swap →
//!     store the new pair in one swap
//! ```
//!
//! # Design Decisions
//! - The (document, blacklist) pair swaps together, so the blacklist is
//!   always derived from the document readers currently see
//! - The typed snapshot is deliberately NOT part of the swap: it is taken
//!   once at load time and callers are told so; live values go through
//!   the dynamic getters
//! - Readers never block: each call loads a point-in-time pair, the
//!   writer's critical section is one pointer swap

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::blacklist::MatcherSet;
use crate::config::document::{DocumentStore, LookupError};
use crate::config::loader::{self, ConfigError, ConfigFormat};
use crate::config::schema::RelayValues;
use crate::observability::logging::LogSink;

/// The read-only surface external collaborators consume.
///
/// Typed getters answer `Ok(None)` for "unset" and `Err` for "set but the
/// wrong type"; callers must treat both as "value unavailable" and never
/// infer unset from a zero value.
pub trait Config: Send + Sync {
    /// True if the path is present in the document or the environment,
    /// regardless of the value it resolves to.
    fn is_set(&self, path: &str) -> bool;
    fn get_bool(&self, path: &str) -> Result<Option<bool>, LookupError>;
    fn get_int(&self, path: &str) -> Result<Option<i64>, LookupError>;
    fn get_string(&self, path: &str) -> Result<Option<String>, LookupError>;
    fn get_string_list(&self, path: &str) -> Result<Option<Vec<String>>, LookupError>;
    /// A mismatched shape (an element that is not a list of strings)
    /// reports as absent rather than as an error.
    fn get_string_list_2d(&self, path: &str) -> Option<Vec<Vec<String>>>;
    /// True iff the filename matches the currently compiled blacklist.
    fn is_filename_blacklisted(&self, filename: &str) -> bool;
    /// The typed snapshot taken when the configuration was first loaded.
    ///
    /// NOT refreshed on reload; callers needing live values must use the
    /// dynamic getters.
    fn values(&self) -> Arc<RelayValues>;
}

/// The (document, blacklist) pair visible to readers at one point in time.
struct LiveState {
    document: DocumentStore,
    blacklist: MatcherSet,
}

impl LiveState {
    fn build(document: DocumentStore) -> Self {
        let blacklist = MatcherSet::compile(&document);
        Self {
            document,
            blacklist,
        }
    }
}

/// Where the configuration came from, kept for reloads.
struct Source {
    path: PathBuf,
    format: ConfigFormat,
}

/// Production implementation of [`Config`], owned by bootstrap and shared
/// by reference with every component that needs it.
pub struct RelayConfig {
    state: ArcSwap<LiveState>,
    snapshot: Arc<RelayValues>,
    source: Option<Source>,
}

impl RelayConfig {
    /// Load the configuration file, detecting the format from its
    /// extension.
    ///
    /// Failure here is fatal to the caller: no relay may run against a
    /// config that failed to read or parse. When a sink is given and the
    /// document configures `general.logfile`, diagnostics are redirected
    /// there (open failure is a warning, never fatal).
    pub fn from_file(
        path: impl AsRef<Path>,
        sink: Option<&LogSink>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::detect(path);
        let input = fs::read(path)?;
        let document = loader::parse_bytes(&input, format)?;
        Self::build(
            document,
            Some(Source {
                path: path.to_path_buf(),
                format,
            }),
            sink,
        )
    }

    /// Build a configuration from raw bytes. The result is not file-backed
    /// and therefore cannot be reloaded or watched.
    pub fn from_bytes(
        input: &[u8],
        format: ConfigFormat,
        sink: Option<&LogSink>,
    ) -> Result<Self, ConfigError> {
        let document = loader::parse_bytes(input, format)?;
        Self::build(document, None, sink)
    }

    fn build(
        document: DocumentStore,
        source: Option<Source>,
        sink: Option<&LogSink>,
    ) -> Result<Self, ConfigError> {
        let snapshot = RelayValues::project(&document)?;

        if let Some(sink) = sink {
            let log_file = &snapshot.general.log_file;
            if !log_file.is_empty() {
                match sink.redirect_to_file(Path::new(log_file)) {
                    Ok(()) => {
                        tracing::info!(path = %log_file, "redirecting diagnostics to log file")
                    }
                    Err(err) => tracing::warn!(
                        path = %log_file,
                        %err,
                        "failed to open log file, keeping current sink"
                    ),
                }
            }
        }

        Ok(Self {
            state: ArcSwap::from_pointee(LiveState::build(document)),
            snapshot: Arc::new(snapshot),
            source,
        })
    }

    /// Re-read and re-parse the source file, then swap the (document,
    /// blacklist) pair in one store.
    ///
    /// Parsing happens outside the swap on a fresh, unshared document; on
    /// any failure the previous state stays in place and readers are
    /// unaffected. The typed snapshot is not rebuilt (see
    /// [`Config::values`]).
    pub fn reload(&self) -> Result<(), ConfigError> {
        let source = self.source.as_ref().ok_or(ConfigError::NotFileBacked)?;
        let input = fs::read(&source.path)?;
        let document = loader::parse_bytes(&input, source.format)?;
        self.state.store(Arc::new(LiveState::build(document)));
        Ok(())
    }

    /// The watched file path, if this configuration is file-backed.
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_ref().map(|source| source.path.as_path())
    }
}

impl Config for RelayConfig {
    fn is_set(&self, path: &str) -> bool {
        self.state.load().document.is_set(path)
    }

    fn get_bool(&self, path: &str) -> Result<Option<bool>, LookupError> {
        self.state.load().document.get_bool(path)
    }

    fn get_int(&self, path: &str) -> Result<Option<i64>, LookupError> {
        self.state.load().document.get_int(path)
    }

    fn get_string(&self, path: &str) -> Result<Option<String>, LookupError> {
        self.state.load().document.get_string(path)
    }

    fn get_string_list(&self, path: &str) -> Result<Option<Vec<String>>, LookupError> {
        self.state.load().document.get_string_list(path)
    }

    fn get_string_list_2d(&self, path: &str) -> Option<Vec<Vec<String>>> {
        self.state.load().document.get_string_list_2d(path)
    }

    fn is_filename_blacklisted(&self, filename: &str) -> bool {
        self.state.load().blacklist.is_match(filename)
    }

    fn values(&self) -> Arc<RelayValues> {
        Arc::clone(&self.snapshot)
    }
}
