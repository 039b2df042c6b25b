//! Error types for envelope generation.

use std::io;
use std::path::PathBuf;

/// Result type alias for envelope operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Envelope generation errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An attachment could not be read from disk.
    ///
    /// This includes the file-not-found case; callers classify it as a
    /// per-message delivery failure, not a fatal condition.
    #[error("cannot read attachment {path}: {source}")]
    Attachment {
        /// Path the caller asked to attach.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// The envelope has no recipients.
    #[error("envelope has no recipients")]
    NoRecipients,
}
