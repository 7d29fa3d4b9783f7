//! Configuration file watcher for hot reload.
//!
//! # Responsibilities
//! - Subscribe to file-change notifications for the config path
//! - Re-parse on change and swap the new state in atomically
//! - Keep the previous configuration when a reload fails
//!
//! # Design Decisions
//! - The watcher is the sole writer; readers are never blocked or
//!   interrupted by a reload
//! - Parsing happens in the notification callback, outside the swap, so a
//!   slow parse never starves readers
//! - The subscription is dropped on shutdown; nothing else is torn down

use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::broadcast;

use crate::config::accessor::RelayConfig;

/// Watches the configuration file behind a [`RelayConfig`] and reloads it
/// on change.
pub struct ConfigWatcher {
    config: Arc<RelayConfig>,
}

impl ConfigWatcher {
    pub fn new(config: Arc<RelayConfig>) -> Self {
        Self { config }
    }

    /// Start watching in a background thread.
    ///
    /// Returns the underlying watcher; dropping it cancels the
    /// subscription. Fails if the configuration is not file-backed.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self
            .config
            .source_path()
            .ok_or_else(|| {
                notify::Error::generic("configuration is not file-backed, nothing to watch")
            })?
            .to_path_buf();
        let config = self.config;

        let watch_path = path.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        match config.reload() {
                            Ok(()) => {
                                tracing::info!("Configuration reloaded");
                            }
                            Err(err) => {
                                tracing::error!(
                                    %err,
                                    "Failed to reload config. Keeping current configuration."
                                );
                            }
                        }
                    }
                }
                Err(err) => tracing::error!(?err, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?watch_path, "Config watcher started");
        Ok(watcher)
    }
}

/// Run the watcher until the shutdown signal fires, then drop the
/// subscription. In-flight reader calls are never interrupted.
pub async fn watch_until_shutdown(
    config: Arc<RelayConfig>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), notify::Error> {
    let watcher = ConfigWatcher::new(config).run()?;
    let _ = shutdown.recv().await;
    drop(watcher);
    tracing::info!("Config watcher stopped");
    Ok(())
}
