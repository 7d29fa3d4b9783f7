//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → project snapshot → compile blacklist → start watcher
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast to subscribers → watcher drops its
//!     subscription → tasks drain and exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; every long-running task subscribes
//! - Ctrl-C translates to the same internal shutdown event
//! - No in-flight reader call is interrupted by shutdown

pub mod shutdown;

pub use shutdown::Shutdown;
