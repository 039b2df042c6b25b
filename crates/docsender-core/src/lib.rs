//! # docsender-core
//!
//! The batch pass at the heart of docsender:
//!
//! - Typed configuration loaded from the operator's `key = value` file
//! - The ledger row model (two observed column layouts)
//! - The per-row state machine deciding send / skip / error
//! - Subject and body generation from the row's code column
//! - The streaming rewrite with atomic in-place replacement
//!
//! The SMTP transport is only known through the [`Mailer`] capability
//! so tests can drive whole passes with stubs.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod compose;
pub mod config;
mod error;
pub mod ledger;
pub mod processor;
pub mod rewriter;
pub mod transport;

pub use compose::{ComposeError, Content};
pub use config::{Config, ConfigError, FieldError, Templates};
pub use error::{Error, Result};
pub use ledger::{LedgerError, Mode, Row, Schema};
pub use processor::{Action, Outcome, RowProcessor};
pub use rewriter::{PassSummary, rewrite_ledger};
pub use transport::{DeliveryError, Mailer, SmtpMailer};
