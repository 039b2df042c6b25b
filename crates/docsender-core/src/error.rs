//! Error types for the core library.
//!
//! Only failures of a running pass live here: anything that must abort
//! the rewrite and leave the ledger untouched. Per-row delivery
//! failures are [`crate::transport::DeliveryError`] and never reach
//! this type; the row processor converts them into ledger state.
//! Failures before a pass starts keep their own types:
//! [`crate::config::ConfigError`] from loading and
//! [`docsender_smtp::Error`] from session establishment.

use thiserror::Error;

/// Errors that abort a pass.
#[derive(Debug, Error)]
pub enum Error {
    /// A ledger row is structurally malformed.
    #[error(transparent)]
    Ledger(#[from] crate::ledger::LedgerError),

    /// A row's code field could not produce subject/body content.
    #[error("row {line}: {source}")]
    Compose {
        /// 1-based ledger line of the offending row.
        line: u64,
        /// Underlying composition failure.
        #[source]
        source: crate::compose::ComposeError,
    },

    /// Reading or writing the delimited ledger failed.
    #[error("ledger I/O error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem error (temp file creation, atomic replace).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
