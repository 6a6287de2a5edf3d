mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{email_template, entities, use_cases};
pub use interfaces::{handlers, routes};
pub use infrastructure::{limiter, mail, utils};

use limiter::rate_limiter::FixedWindowLimiter;
use mail::{Mailer, SmtpMailer};
use use_cases::contact::{ContactHandler, MailSetup};

pub struct AppState<M: Mailer = SmtpMailer> {
    pub name: String,
    pub contact_handler: ContactHandler<M>,
    pub trust_forwarded_for: bool,
}

impl<M: Mailer> AppState<M> {
    pub fn new(config: &settings::AppConfig, limiter: FixedWindowLimiter, mail: MailSetup<M>) -> Self {
        let contact_handler = ContactHandler::new(limiter, mail, config.smtp_timeout());

        AppState {
            name: config.name.clone(),
            contact_handler,
            trust_forwarded_for: config.trust_forwarded_for,
        }
    }
}
