//! Multipart envelope construction.

use crate::encoding::{encode_base64_folded, encode_header_value};
use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// An outbound email before serialization: headers, a plain-text body
/// and zero or more file attachments.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Sender address.
    pub from: String,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// Paths of files to attach.
    pub attachments: Vec<PathBuf>,
}

impl Envelope {
    /// Creates a new envelope with no recipients or attachments.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: Vec::new(),
            subject: subject.into(),
            body: body.into(),
            attachments: Vec::new(),
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Adds a file attachment by path.
    #[must_use]
    pub fn attach(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }

    /// Serializes the envelope to an RFC 5322 multipart/mixed message
    /// dated now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRecipients`] when the recipient list is
    /// empty, or [`Error::Attachment`] when an attachment cannot be
    /// read (including file-not-found).
    pub fn build(&self) -> Result<Vec<u8>> {
        self.build_at(Local::now())
    }

    /// Serializes the envelope with an explicit `Date` header value.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Envelope::build`].
    pub fn build_at(&self, date: DateTime<Local>) -> Result<Vec<u8>> {
        if self.to.is_empty() {
            return Err(Error::NoRecipients);
        }

        let boundary = boundary_for(&date);
        let mut message = String::new();

        let _ = write!(message, "From: {}\r\n", self.from);
        let _ = write!(message, "To: {}\r\n", self.to.join(", "));
        let _ = write!(message, "Date: {}\r\n", date.to_rfc2822());
        let _ = write!(message, "Subject: {}\r\n", encode_header_value(&self.subject));
        message.push_str("MIME-Version: 1.0\r\n");
        let _ = write!(
            message,
            "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n"
        );
        message.push_str("\r\n");

        // Text part.
        let _ = write!(message, "--{boundary}\r\n");
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        message.push_str("Content-Transfer-Encoding: 8bit\r\n");
        message.push_str("\r\n");
        message.push_str(&self.body);
        message.push_str("\r\n");

        // One part per attachment, read fully into memory.
        for path in &self.attachments {
            let data = fs::read(path).map_err(|source| Error::Attachment {
                path: path.clone(),
                source,
            })?;
            let name = file_name(path);

            let _ = write!(message, "--{boundary}\r\n");
            let _ = write!(
                message,
                "Content-Type: application/octet-stream; name=\"{name}\"\r\n"
            );
            message.push_str("Content-Transfer-Encoding: base64\r\n");
            let _ = write!(
                message,
                "Content-Disposition: attachment; filename=\"{name}\"\r\n"
            );
            message.push_str("\r\n");
            message.push_str(&encode_base64_folded(&data));
        }

        let _ = write!(message, "--{boundary}--\r\n");
        Ok(message.into_bytes())
    }
}

/// Final path segment used as the attachment filename; directory
/// components are stripped.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Boundary derived from the send instant and pid. Not guessable-proof,
/// just unique enough to never collide with base64 or plain text.
fn boundary_for(date: &DateTime<Local>) -> String {
    format!(
        "=_docsender_{:x}_{:x}",
        date.timestamp_micros(),
        std::process::id()
    )
}
