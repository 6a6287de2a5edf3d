use std::time::Duration;

use async_trait::async_trait;
use derive_more::Display;
use lettre::{
    message::{
        header::{Header, HeaderName, HeaderValue},
        Mailbox, MultiPart,
    },
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    email_template::{HEADER_CONTACT_MARKER, HEADER_SENDER_EMAIL},
    entities::contact_me::{ComposedEmail, Sender},
    settings::EmailConfig,
};

use super::TransportFailure;

#[derive(Debug, Display)]
pub enum MailError {
    #[display("Invalid email address: {_0}")]
    InvalidAddress(String),

    #[display("Failed to build message: {_0}")]
    Build(String),

    #[display("SMTP transport error: {_0}")]
    Transport(TransportFailure),
}

/// Delivers a composed notification to one recipient.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, to: &str, email: &ComposedEmail) -> Result<(), MailError>;
}

/// lettre-backed SMTP relay client.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// `secure` selects implicit TLS; otherwise STARTTLS is used when the
    /// relay offers it.
    pub fn from_config(config: &EmailConfig, timeout: Duration) -> Result<Self, MailError> {
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Transport(TransportFailure::from(&e)))?
        } else {
            let tls = TlsParameters::new(config.host.clone())
                .map_err(|e| MailError::Transport(TransportFailure::from(&e)))?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .tls(Tls::Opportunistic(tls))
        };

        let transport = builder
            .port(config.port)
            .timeout(Some(timeout))
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.as_str().to_owned(),
            ))
            .build();

        Ok(Self { transport })
    }

    fn build_message(&self, to: &str, email: &ComposedEmail) -> Result<Message, MailError> {
        let to: Mailbox = to
            .parse()
            .map_err(|_| MailError::InvalidAddress(to.to_string()))?;

        let mut builder = Message::builder()
            .from(mailbox(&email.from)?)
            .to(to)
            .subject(email.subject.clone());

        // The submitter's address only has to match the form's loose pattern,
        // so an unparseable one drops Reply-To but keeps X-Portfolio-Sender.
        match mailbox(&email.reply_to) {
            Ok(reply_to) => builder = builder.reply_to(reply_to),
            Err(e) => tracing::warn!(error = %e, "Sending without Reply-To"),
        }

        if let Some(marker) = email.headers.get(HEADER_CONTACT_MARKER) {
            builder = builder.header(PortfolioContact(marker.clone()));
        }
        if let Some(sender) = email.headers.get(HEADER_SENDER_EMAIL) {
            builder = builder.header(PortfolioSender(sender.clone()));
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

fn mailbox(sender: &Sender) -> Result<Mailbox, MailError> {
    let address: Address = sender
        .address
        .parse()
        .map_err(|_| MailError::InvalidAddress(sender.address.clone()))?;
    Ok(Mailbox::new(Some(sender.name.clone()), address))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, email: &ComposedEmail) -> Result<(), MailError> {
        let message = self.build_message(to, email)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(TransportFailure::from(&e)))?;

        tracing::debug!(code = %response.code(), "SMTP relay accepted message");
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct PortfolioContact(String);

impl Header for PortfolioContact {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str(HEADER_CONTACT_MARKER)
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

#[derive(Debug, Clone)]
struct PortfolioSender(String);

impl Header for PortfolioSender {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str(HEADER_SENDER_EMAIL)
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}
