//! The mail delivery capability.
//!
//! The row processor only knows [`Mailer`]: one operation, deliver an
//! envelope or fail. Production runs use [`SmtpMailer`]; tests drive
//! the pass with scripted stubs.

use docsender_mime::Envelope;
use docsender_smtp::{Address, Session};
use tracing::debug;

use crate::config::Config;

/// A failed delivery attempt. Always row-local: the processor records
/// it as `ERROR` ledger state and the pass continues.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The envelope could not be built (missing attachment, no
    /// recipients).
    #[error("envelope: {0}")]
    Envelope(#[from] docsender_mime::Error),

    /// An envelope address was not acceptable to the transport.
    #[error("address: {0}")]
    Address(String),

    /// The transport refused or failed the delivery.
    #[error("transport: {0}")]
    Transport(String),
}

/// The opaque mail-sending capability.
pub trait Mailer {
    /// Attempts exactly one delivery of the envelope.
    fn deliver(
        &mut self,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Production [`Mailer`] over an authenticated SMTP session.
///
/// The session is opened once before the pass and shared by every
/// delivery in it.
#[derive(Debug)]
pub struct SmtpMailer {
    session: Session,
}

impl SmtpMailer {
    /// Opens and authenticates the session described by the config.
    ///
    /// # Errors
    ///
    /// Returns the SMTP error if connection or authentication fails;
    /// this is a structural failure, no row has been touched yet.
    pub async fn connect(config: &Config) -> docsender_smtp::Result<Self> {
        let session = Session::connect(
            &config.host,
            config.port,
            &config.login,
            &config.password,
        )
        .await?;
        Ok(Self { session })
    }

    /// Closes the session. Called on every exit path of a run.
    ///
    /// # Errors
    ///
    /// Returns the SMTP error if the QUIT exchange fails.
    pub async fn quit(self) -> docsender_smtp::Result<()> {
        self.session.quit().await
    }
}

impl Mailer for SmtpMailer {
    async fn deliver(&mut self, envelope: &Envelope) -> Result<(), DeliveryError> {
        let message = envelope.build()?;

        let from = Address::new(envelope.from.clone())
            .map_err(|e| DeliveryError::Address(e.to_string()))?;
        let recipients = envelope
            .to
            .iter()
            .map(|addr| Address::new(addr.clone()).map_err(|e| DeliveryError::Address(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        self.session
            .deliver(&from, &recipients, &message)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        debug!(from = %envelope.from, recipients = envelope.to.len(), "delivered");
        Ok(())
    }
}
