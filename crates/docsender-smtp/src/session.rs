//! Authenticated SMTP submission session.

use crate::error::{Error, Result};
use crate::reply::Reply;
use crate::stream::Wire;
use crate::types::Address;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

/// An authenticated session against an SMTP server over implicit TLS.
///
/// The session is opened once with [`Session::connect`] and reused for
/// every delivery in a run; [`Session::quit`] releases it. All commands
/// run strictly sequentially.
#[derive(Debug)]
pub struct Session {
    wire: Wire,
}

impl Session {
    /// Connects, reads the greeting, sends EHLO and authenticates with
    /// AUTH PLAIN.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, TLS handshake, greeting,
    /// EHLO, or authentication fails.
    pub async fn connect(hostname: &str, port: u16, login: &str, password: &str) -> Result<Self> {
        let mut wire = Wire::open(hostname, port).await?;

        let greeting = wire.read_reply().await?.expect(Reply::is_success)?;
        debug!(code = greeting.code, "server greeting");

        wire.write_line("EHLO localhost").await?;
        wire.read_reply().await?.expect(Reply::is_success)?;

        // RFC 4616 initial response: \0login\0password
        let token = STANDARD.encode(format!("\0{login}\0{password}"));
        wire.write_line(&format!("AUTH PLAIN {token}")).await?;
        let auth = wire.read_reply().await?;
        if auth.code != 235 {
            return Err(Error::smtp(auth.code, auth.text()));
        }
        debug!(hostname, port, login, "authenticated");

        Ok(Self { wire })
    }

    /// Delivers one message: MAIL FROM, RCPT TO per recipient, DATA.
    ///
    /// `message` is the full RFC 5322 byte stream; line endings are
    /// normalized to CRLF and leading dots are stuffed on the way out.
    ///
    /// # Errors
    ///
    /// Returns an error if any command is refused or the socket fails.
    /// The transaction is reset with RSET on refusal so the session
    /// stays usable for the next delivery.
    pub async fn deliver(
        &mut self,
        from: &Address,
        recipients: &[Address],
        message: &[u8],
    ) -> Result<()> {
        if recipients.is_empty() {
            return Err(Error::InvalidAddress("no recipients".into()));
        }

        match self.transaction(from, recipients, message).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // Clear server-side transaction state for the next row.
                if matches!(err, Error::Smtp { .. }) {
                    let _ = self.reset().await;
                }
                Err(err)
            }
        }
    }

    async fn transaction(
        &mut self,
        from: &Address,
        recipients: &[Address],
        message: &[u8],
    ) -> Result<()> {
        self.wire
            .write_line(&format!("MAIL FROM:<{from}>"))
            .await?;
        self.wire.read_reply().await?.expect(Reply::is_success)?;

        for rcpt in recipients {
            self.wire.write_line(&format!("RCPT TO:<{rcpt}>")).await?;
            self.wire.read_reply().await?.expect(Reply::is_success)?;
            debug!(recipient = %rcpt, "recipient accepted");
        }

        self.wire.write_line("DATA").await?;
        self.wire
            .read_reply()
            .await?
            .expect(Reply::is_intermediate)?;

        self.wire.write_raw(&stuff_message(message)).await?;
        self.wire.read_reply().await?.expect(Reply::is_success)?;
        Ok(())
    }

    async fn reset(&mut self) -> Result<()> {
        self.wire.write_line("RSET").await?;
        self.wire.read_reply().await?.expect(Reply::is_success)?;
        Ok(())
    }

    /// Sends QUIT and closes the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket fails; the connection is torn
    /// down regardless.
    pub async fn quit(mut self) -> Result<()> {
        self.wire.write_line("QUIT").await?;
        let _ = self.wire.read_reply().await;
        self.wire.shutdown().await
    }
}

/// Normalizes line endings to CRLF, stuffs leading dots, and appends
/// the `CRLF.CRLF` terminator.
fn stuff_message(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + 8);
    for line in message.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.first() == Some(&b'.') {
            out.push(b'.');
        }
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
    // split() yields a trailing empty slice when the message ends with
    // a newline; drop the CRLF it produced.
    if message.last() == Some(&b'\n') {
        out.truncate(out.len() - 2);
    }
    out.extend_from_slice(b".\r\n");
    out
}
