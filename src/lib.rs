//! Layered configuration subsystem for a multi-protocol chat relay.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │              relay-config                     │
//!                    │                                               │
//!   config file ─────┼─▶ loader ──▶ DocumentStore ──▶ RelayValues    │
//!   (TOML/JSON/YAML) │                  │                (snapshot,  │
//!                    │                  │                 taken once)│
//!                    │                  ▼                            │
//!                    │             MatcherSet                        │
//!                    │         (media blacklist)                     │
//!                    │                  │                            │
//!   connectors ──────┼─▶ Config trait ◀─┘  (presence-aware lookups,  │
//!   gateway router   │   (RelayConfig)      blacklist predicate)     │
//!                    │         ▲                                     │
//!   file change ─────┼─▶ ConfigWatcher (re-parse, atomic swap)       │
//!                    │                                               │
//!   tests ───────────┼─▶ OverrideConfig (fixed path → value shadow)  │
//!                    └──────────────────────────────────────────────┘
//! ```
//!
//! The document store is the single source of truth. The typed snapshot is
//! projected once at load time and deliberately not refreshed on reload;
//! the blacklist, by contrast, is recompiled from the live document on
//! every reload. Callers that need live or presence-aware values use the
//! [`Config`] trait getters.

// Core subsystem
pub mod config;

// Shared vocabulary between connectors and the gateway router
pub mod message;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::{
    Config, ConfigError, ConfigFormat, ConfigWatcher, DocumentStore, LookupError, MatcherSet,
    OverrideConfig, ProtocolSettings, RelayConfig, RelayValues, Value,
};
pub use lifecycle::Shutdown;
pub use message::{FileInfo, Message};
pub use observability::LogSink;
