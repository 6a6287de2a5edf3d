use std::time::Duration;

use crate::{
    email_template::compose_contact_email,
    entities::contact_me::ContactForm,
    errors::ContactError,
    limiter::rate_limiter::FixedWindowLimiter,
    mail::{MailError, Mailer, TransportFailure},
    settings::{EmailConfig, MissingSettings},
};

/// Mail delivery as resolved at start-up.
pub enum MailSetup<M> {
    Ready { config: EmailConfig, mailer: M },
    Unconfigured(MissingSettings),
}

impl<M> MailSetup<M> {
    pub fn is_ready(&self) -> bool {
        matches!(self, MailSetup::Ready { .. })
    }
}

/// Runs one contact submission from rate limiting to SMTP dispatch.
pub struct ContactHandler<M>
where
    M: Mailer,
{
    pub limiter: FixedWindowLimiter,
    pub mail: MailSetup<M>,
    pub send_timeout: Duration,
}

impl<M> ContactHandler<M>
where
    M: Mailer,
{
    pub fn new(limiter: FixedWindowLimiter, mail: MailSetup<M>, send_timeout: Duration) -> Self {
        ContactHandler {
            limiter,
            mail,
            send_timeout,
        }
    }

    /// Handles a raw request body from `client_ip`.
    ///
    /// Steps short-circuit in order: rate limit, JSON decode, honeypot and
    /// field rules, mail configuration, template, send. At most one SMTP
    /// submission happens per call and nothing is retried.
    pub async fn submit(&self, client_ip: &str, payload: &[u8]) -> Result<(), ContactError> {
        let result = self.process(client_ip, payload).await;

        match &result {
            Ok(()) => tracing::info!(client_ip, "Contact message delivered"),
            Err(e @ ContactError::RateLimited) => {
                tracing::warn!(client_ip, code = e.code(), "Contact submission rate limited")
            }
            Err(e) if e.is_client_error() => {
                tracing::warn!(client_ip, code = e.code(), detail = %e, "Contact submission rejected")
            }
            Err(e) => {
                tracing::error!(client_ip, code = e.code(), detail = %e, "Contact submission failed")
            }
        }

        result
    }

    async fn process(&self, client_ip: &str, payload: &[u8]) -> Result<(), ContactError> {
        if !self.limiter.allow(client_ip) {
            return Err(ContactError::RateLimited);
        }

        let form: ContactForm = serde_json::from_slice(payload)?;
        let submission = form.into_submission()?;

        let (config, mailer) = match &self.mail {
            MailSetup::Ready { config, mailer } => (config, mailer),
            MailSetup::Unconfigured(missing) => return Err(missing.clone().into()),
        };

        let email = compose_contact_email(&submission, config, client_ip);

        tokio::time::timeout(self.send_timeout, mailer.send(&config.to, &email))
            .await
            .map_err(|_| MailError::Transport(TransportFailure::timeout(self.send_timeout)))??;

        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.mail.is_ready()
    }
}
