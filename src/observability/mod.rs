//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All modules emit structured events through `tracing`:
//!     → logging.rs (subscriber init, default sink: stderr)
//!     → LogSink (hot-swappable writer; redirected to the configured
//!       log file when `general.logfile` is set)
//! ```
//!
//! # Design Decisions
//! - Structured logging via the tracing crate, env-filter controlled
//! - The sink is swappable at runtime so the log-file redirect never
//!   requires re-initializing the subscriber
//! - A failed redirect is a warning; output stays on the previous sink

pub mod logging;

pub use logging::LogSink;
