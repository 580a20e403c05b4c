use camino::Utf8PathBuf;
use std::time::Duration;

pub mod cycle;
pub mod engine;
pub mod plan;
pub mod remote;

/// Per-run tunables for the batch.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// The single file-type tag this tool exports; everything else is
    /// silently ignored.
    pub format: String,
    /// Leave non-empty targets alone so re-runs are resumable.
    pub skip_existing: bool,
    /// Settling time applied after open, after activate, and after close.
    /// Empirical workaround for asynchronous session binding in the
    /// external service; tune it, do not remove it.
    pub stabilization_delay: Duration,
}

impl ExportOptions {
    /// The format with any operator-typed leading dot removed, so the filter
    /// and the target path agree on whether `.f3d` and `f3d` mean the same
    /// thing.
    pub fn format_tag(&self) -> &str {
        self.format.trim_start_matches('.')
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: "f3d".to_string(),
            skip_existing: true,
            stabilization_delay: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub export_root: Utf8PathBuf,
    pub options: ExportOptions,
}

/// How a single leaf item ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Exported { bytes: u64 },
    Skipped,
    Filtered,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct ExportStats {
    pub exported: u64,
    pub skipped: u64,
    pub filtered: u64,
    pub failed: u64,
    pub bytes_exported: u64,
}

impl ExportStats {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Exported { bytes } => {
                self.exported += 1;
                self.bytes_exported += bytes;
            }
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Filtered => self.filtered += 1,
            ItemOutcome::Failed => self.failed += 1,
        }
    }

    pub fn absorb(&mut self, other: ExportStats) {
        self.exported += other.exported;
        self.skipped += other.skipped;
        self.filtered += other.filtered;
        self.failed += other.failed;
        self.bytes_exported += other.bytes_exported;
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub hubs: u64,
    pub projects: u64,
    pub stats: ExportStats,
}

/// Failures talking to the external data service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("service request failed: {0}")]
    Request(String),
    #[error("unexpected service payload: {0}")]
    Protocol(String),
    #[error("export landing failed: {0}")]
    Landing(#[from] drydock_infra::net::NetError),
}

/// Errors that escape the per-item recovery in the export cycle. These abort
/// the batch and surface once at the driver.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("data service error: {0}")]
    Service(#[from] ServiceError),
    #[error("local filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

pub use engine::ExportEngine;
pub use remote::{DataService, ExportOutcome, HttpDataService};

/// Convenience constructor for the HTTP-backed engine.
pub fn default_engine(client: reqwest::Client, service_url: &str) -> Result<ExportEngine, ExportError> {
    ExportEngine::new(client, service_url)
}
