//! # docsender-mime
//!
//! Envelope generation for the docsender batch mailer: builds
//! `multipart/mixed` RFC 5322 messages with a plain-text body and file
//! attachments read from disk.
//!
//! Attachments carry `Content-Disposition: attachment` with the path's
//! final segment as the filename. A missing attachment surfaces as
//! [`Error::Attachment`] so the caller can classify it per-message.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod encoding;
mod envelope;
mod error;

pub use envelope::Envelope;
pub use error::{Error, Result};
