//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Provide a hot-swappable log sink so diagnostics can be redirected to
//!   the configured log file after the configuration is projected

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug)]
enum SinkTarget {
    Stderr,
    File(File),
}

/// A log writer that starts on stderr and can be redirected to an appended
/// file at runtime.
///
/// Cloning is cheap; all clones share the same target.
#[derive(Clone)]
pub struct LogSink {
    target: Arc<ArcSwap<SinkTarget>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self {
            target: Arc::new(ArcSwap::from_pointee(SinkTarget::Stderr)),
        }
    }

    /// Open `path` for append (creating it if absent) and direct all
    /// subsequent output there. On failure the current sink stays in
    /// place and the error is returned to the caller for a warning.
    pub fn redirect_to_file(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.target.store(Arc::new(SinkTarget::File(file)));
        Ok(())
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SinkWriter {
    target: Arc<SinkTarget>,
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.target.as_ref() {
            SinkTarget::Stderr => io::stderr().write(buf),
            SinkTarget::File(file) => {
                let mut file = file;
                file.write(buf)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.target.as_ref() {
            SinkTarget::Stderr => io::stderr().flush(),
            SinkTarget::File(file) => {
                let mut file = file;
                file.flush()
            }
        }
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter {
            target: self.target.load_full(),
        }
    }
}

/// Initialize the global tracing subscriber writing to `sink`.
pub fn init(sink: &LogSink) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_config=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(sink.clone()))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_appends_to_the_target_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.log");
        std::fs::write(&path, "existing\n").unwrap();

        let sink = LogSink::new();
        sink.redirect_to_file(&path).unwrap();
        let mut writer = sink.make_writer();
        writer.write_all(b"appended\n").unwrap();
        writer.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "existing\nappended\n");
    }

    #[test]
    fn failed_redirect_keeps_the_current_sink() {
        let sink = LogSink::new();
        let err = sink.redirect_to_file(Path::new("/nonexistent-dir/relay.log"));
        assert!(err.is_err());
        // The sink still hands out a usable writer.
        let mut writer = sink.make_writer();
        writer.flush().unwrap();
    }

    #[test]
    fn clones_share_the_redirect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.log");

        let sink = LogSink::new();
        let clone = sink.clone();
        sink.redirect_to_file(&path).unwrap();

        let mut writer = clone.make_writer();
        writer.write_all(b"via clone\n").unwrap();
        writer.flush().unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("via clone"));
    }
}
