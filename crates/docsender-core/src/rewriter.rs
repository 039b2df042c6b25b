//! Streaming ledger rewrite with atomic replacement.
//!
//! Every row flows through the processor into a temp file created next
//! to the ledger (same filesystem, so the final rename is atomic).
//! The original path is replaced only after the whole pass has been
//! written and flushed; any abort before that point leaves the
//! original untouched and drops the temp file.

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::ledger::Row;
use crate::processor::{Action, RowProcessor};
use crate::transport::Mailer;

/// Counts for one completed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Rows read (and written).
    pub total: usize,
    /// Rows delivered and marked `SENT`.
    pub sent: usize,
    /// Rows that failed delivery and were marked `ERROR`.
    pub errored: usize,
    /// Rows passed through untouched.
    pub skipped: usize,
}

impl PassSummary {
    fn count(&mut self, action: Action) {
        self.total += 1;
        match action {
            Action::Sent => self.sent += 1,
            Action::Failed => self.errored += 1,
            Action::Skipped => self.skipped += 1,
        }
    }
}

/// Runs one full pass over the ledger and atomically replaces it.
///
/// # Errors
///
/// Propagates structural errors (malformed rows, bad code columns,
/// filesystem and CSV failures). On any error the original ledger
/// file is left exactly as it was.
pub async fn rewrite_ledger<M: Mailer>(
    path: &Path,
    config: &Config,
    mailer: &mut M,
) -> Result<PassSummary> {
    let schema = config.templates.schema();
    let mut reader = ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let dir = match path.parent() {
        Some(parent) if parent != Path::new("") => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    debug!(tmp = %tmp.path().display(), "writing pass output");

    let mut summary = PassSummary::default();
    {
        let mut writer = WriterBuilder::new()
            .delimiter(config.delimiter)
            .has_headers(false)
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(tmp.as_file_mut());

        let mut processor = RowProcessor::new(config, mailer);
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            let line = idx as u64 + 1;
            let row = Row::parse(&record, schema, line)?;
            let outcome = processor.process(row, line).await?;
            summary.count(outcome.action);
            writer.write_record(&outcome.row.record())?;
        }
        writer.flush()?;
    }

    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    info!(
        total = summary.total,
        sent = summary.sent,
        errored = summary.errored,
        skipped = summary.skipped,
        "ledger rewritten in place"
    );
    Ok(summary)
}
