//! TLS stream plumbing for the SMTP session.

use crate::error::{Error, Result};
use crate::reply::{Reply, ReplyLine};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    client::TlsStream,
    rustls::{ClientConfig, RootCertStore},
};

/// Buffered, TLS-wrapped connection to the server.
///
/// The session uses implicit TLS only (the handshake happens before
/// any SMTP traffic, port-465 style).
#[derive(Debug)]
pub(crate) struct Wire {
    inner: BufReader<TlsStream<TcpStream>>,
}

impl Wire {
    /// Connects and completes the TLS handshake.
    pub async fn open(hostname: &str, port: u16) -> Result<Self> {
        let tcp = TcpStream::connect((hostname, port)).await?;
        let server_name = ServerName::try_from(hostname.to_string())
            .map_err(|_| Error::Protocol(format!("invalid hostname: {hostname}")))?;
        let tls = tls_connector().connect(server_name, tcp).await?;
        Ok(Self {
            inner: BufReader::new(tls),
        })
    }

    /// Reads one complete reply, accumulating continuation lines.
    pub async fn read_reply(&mut self) -> Result<Reply> {
        let mut code = None;
        let mut lines = Vec::new();
        loop {
            let mut raw = String::new();
            let n = self.inner.read_line(&mut raw).await?;
            if n == 0 {
                return Err(Error::Protocol("connection closed mid-reply".into()));
            }
            let line = ReplyLine::parse(raw.trim_end_matches(['\r', '\n']))?;
            let expected = *code.get_or_insert(line.code);
            if line.code != expected {
                return Err(Error::Protocol("mixed codes in multi-line reply".into()));
            }
            lines.push(line.text);
            if line.last {
                return Ok(Reply {
                    code: expected,
                    lines,
                });
            }
        }
    }

    /// Writes one command line, appending CRLF, and flushes.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        let stream = self.inner.get_mut();
        stream.write_all(line.as_bytes()).await?;
        stream.write_all(b"\r\n").await?;
        stream.flush().await?;
        Ok(())
    }

    /// Writes raw bytes and flushes.
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.inner.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Initiates the TLS close-notify and shuts the stream down.
    pub async fn shutdown(mut self) -> Result<()> {
        self.inner.get_mut().shutdown().await?;
        Ok(())
    }
}

/// Builds a TLS connector over the webpki root set.
fn tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}
