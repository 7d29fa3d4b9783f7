//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON/YAML)
//!     → loader.rs (detect format, parse into the canonical Value tree)
//!     → document.rs (DocumentStore: dotted-path lookups + env overlay)
//!     → schema.rs (RelayValues: typed snapshot, projected once)
//!     → blacklist.rs (MatcherSet compiled from the live document)
//!     → accessor.rs (RelayConfig: the Config trait readers consume)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs parses a fresh DocumentStore (outside any lock)
//!     → blacklist recompiled from the new document
//!     → atomic swap of the (document, blacklist) pair
//!     → readers observe the new values; a failed parse keeps the old pair
//!
//! In tests:
//!     overrides.rs (OverrideConfig) shadows chosen paths ahead of any
//!     Config implementation
//! ```
//!
//! # Design Decisions
//! - The document store is the single source of truth; the typed snapshot
//!   is a point-in-time view and is not rebuilt on reload
//! - Presence and value always travel together: explicit zero values
//!   report as set
//! - Semantic validation of per-protocol fields is out of scope; the
//!   schema is a best-effort projection

pub mod accessor;
pub mod blacklist;
pub mod document;
pub mod loader;
pub mod overrides;
pub mod schema;
pub mod watcher;

pub use accessor::{Config, RelayConfig};
pub use blacklist::MatcherSet;
pub use document::{DocumentStore, LookupError, Value, ENV_PREFIX};
pub use loader::{ConfigError, ConfigFormat, ParseError};
pub use overrides::OverrideConfig;
pub use schema::{
    BridgeEndpoint, ChannelOptions, GatewayConfig, ProjectionError, ProtocolSettings,
    RelayValues, SameChannelGatewayConfig, ScriptHooksConfig, DEFAULT_MEDIA_DOWNLOAD_SIZE,
};
pub use watcher::ConfigWatcher;
