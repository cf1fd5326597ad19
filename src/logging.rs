// src/logging.rs
//
// Logging and telemetry sinks.
// - init_tracing: stderr diagnostics via tracing-subscriber
// - EventSink:    trait the harness driver feeds per-trial records into
// - NoopSink:     discards all records
// - JsonlSink:    one JSON object per trial, one per line

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::harness::TrialRecord;

/// Environment variable holding the tracing filter directives.
pub const LOG_ENV: &str = "BAYES_SEARCH_LOG";

static INIT: Once = Once::new();

/// Initialise diagnostics.
///
/// Reads `BAYES_SEARCH_LOG` (e.g. `bayes_search=debug`), falling back to
/// `default_filter`. Safe to call more than once.
pub fn init_tracing(default_filter: &str) {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}

/// Abstract sink for per-trial telemetry.
pub trait EventSink {
    fn log_trial(&mut self, record: &TrialRecord) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that discards all records.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn log_trial(&mut self, _record: &TrialRecord) -> io::Result<()> {
        Ok(())
    }
}

/// JSONL sink over any writer.
pub struct JsonlSink<W: Write> {
    writer: W,
}

impl JsonlSink<BufWriter<File>> {
    /// Create (truncate) a JSONL file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonlSink<W> {
    fn log_trial(&mut self, record: &TrialRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Build a sink as a trait object: JSONL when a path is given, no-op otherwise.
pub fn build_sink(path: Option<&Path>) -> io::Result<Box<dyn EventSink>> {
    match path {
        Some(p) => Ok(Box::new(JsonlSink::create(p)?)),
        None => Ok(Box::new(NoopSink)),
    }
}
