//! Per-row state machine.
//!
//! The mode column is the sole eligibility authority. The transition
//! table, implemented literally by the `match` in
//! [`RowProcessor::process`]:
//!
//! | mode       | action | recipients     | timepoint | output mode      |
//! |------------|--------|----------------|-----------|------------------|
//! | `NO_SENT`  | send   | row's own      | now       | `SENT` / `ERROR` |
//! | `TEST`     | send   | test recipient | now       | `SENT` / `ERROR` |
//! | `SENT`     | skip   | —              | unchanged | `SENT`           |
//! | other      | skip   | —              | unchanged | unchanged        |

use chrono::Local;
use docsender_mime::Envelope;
use tracing::{error, info};

use crate::compose::content_for;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::ledger::{Mode, Row};
use crate::transport::Mailer;

/// Timepoint column format, the operators' spreadsheet convention.
const TIMEPOINT_FORMAT: &str = "%d.%m.%Y %H:%M";

/// What happened to a row; feeds the pass summary and the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Delivery attempted and accepted.
    Sent,
    /// Delivery attempted and failed; row recorded as `ERROR`.
    Failed,
    /// Not eligible; row passed through.
    Skipped,
}

/// A processed row and its classification.
#[derive(Debug)]
pub struct Outcome {
    /// The row to write back.
    pub row: Row,
    /// Classification for the summary.
    pub action: Action,
}

/// Drives the state machine over one row at a time.
#[derive(Debug)]
pub struct RowProcessor<'a, M> {
    config: &'a Config,
    mailer: &'a mut M,
}

impl<'a, M: Mailer> RowProcessor<'a, M> {
    /// Creates a processor borrowing the shared session for the pass.
    pub fn new(config: &'a Config, mailer: &'a mut M) -> Self {
        Self { config, mailer }
    }

    /// Processes one row.
    ///
    /// Exactly one delivery is attempted for an eligible row, never
    /// more. Delivery and attachment failures are converted into
    /// `ERROR` ledger state with every business field preserved.
    ///
    /// # Errors
    ///
    /// Returns an error only for structural problems (the code column
    /// failing to compose a subject/body); these abort the pass.
    pub async fn process(&mut self, row: Row, line: u64) -> Result<Outcome> {
        match row.mode {
            Mode::NotSent => {
                let recipients = row.recipients();
                self.attempt(row, line, recipients).await
            }
            Mode::Test => {
                let recipients = vec![self.config.test_recipient.clone()];
                self.attempt(row, line, recipients).await
            }
            Mode::Sent => {
                info!(line, "skipping row, already sent");
                Ok(Outcome {
                    row,
                    action: Action::Skipped,
                })
            }
            Mode::Error | Mode::Other(_) => {
                info!(line, mode = row.mode.as_str(), "skipping row, mode not actionable");
                Ok(Outcome {
                    row,
                    action: Action::Skipped,
                })
            }
        }
    }

    async fn attempt(&mut self, mut row: Row, line: u64, recipients: Vec<String>) -> Result<Outcome> {
        let content =
            content_for(&row, &self.config.templates).map_err(|source| Error::Compose {
                line,
                source,
            })?;

        let mut envelope = Envelope::new(self.config.from.clone(), content.subject, content.body);
        for recipient in recipients {
            envelope = envelope.to(recipient);
        }
        for path in row.attachment_paths() {
            envelope = envelope.attach(path);
        }

        // The attempt is recorded in the timepoint whether or not the
        // delivery goes through.
        row.timepoint = Local::now().format(TIMEPOINT_FORMAT).to_string();

        match self.mailer.deliver(&envelope).await {
            Ok(()) => {
                info!(line, "sent message");
                row.mode = Mode::Sent;
                Ok(Outcome {
                    row,
                    action: Action::Sent,
                })
            }
            Err(err) => {
                error!(line, %err, "delivery failed, recording ERROR");
                row.mode = Mode::Error;
                Ok(Outcome {
                    row,
                    action: Action::Failed,
                })
            }
        }
    }
}
