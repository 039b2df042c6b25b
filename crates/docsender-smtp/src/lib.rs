//! # docsender-smtp
//!
//! Minimal SMTP submission client for the docsender batch mailer.
//!
//! Supports exactly the shape of session the batch pass needs:
//!
//! - Implicit TLS (port-465 style), via `rustls` with webpki roots
//! - EHLO + AUTH PLAIN
//! - Sequential MAIL FROM / RCPT TO / DATA transactions with
//!   dot-stuffing and CRLF normalization
//!
//! ```ignore
//! use docsender_smtp::{Address, Session};
//!
//! # async fn run() -> docsender_smtp::Result<()> {
//! let mut session = Session::connect("smtp.example.com", 465, "user", "secret").await?;
//! let from = Address::new("sender@example.com")?;
//! let to = [Address::new("recipient@example.com")?];
//! session.deliver(&from, &to, b"Subject: hi\r\n\r\nhello\r\n").await?;
//! session.quit().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod reply;
mod session;
mod stream;
mod types;

pub use error::{Error, Result};
pub use reply::Reply;
pub use session::Session;
pub use types::Address;
