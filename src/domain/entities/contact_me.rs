use std::{collections::BTreeMap, fmt};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::ContactError;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Raw contact form body as posted by the browser.
///
/// Every field is optional; absent fields behave like empty strings.
/// `company` is a decoy input hidden from humans.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub company: Option<String>,
}

/// Trimmed submission that passed every field rule.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct ContactSubmission {
    #[validate(length(min = 2, message = "name must be at least 2 characters"))]
    pub name: String,

    #[validate(regex(path = *EMAIL_PATTERN, message = "email must look like local@domain.tld"))]
    pub email: String,

    #[validate(length(min = 3, message = "subject must be at least 3 characters"))]
    pub subject: String,

    #[validate(length(min = 10, message = "message must be at least 10 characters"))]
    pub message: String,
}

impl ContactForm {
    /// Trims the form and applies the honeypot and field rules, in that order.
    ///
    /// A filled decoy short-circuits with [`ContactError::Invalid`] before any
    /// other rule is looked at; every other failure is [`ContactError::Validation`].
    pub fn into_submission(self) -> Result<ContactSubmission, ContactError> {
        if !trimmed(self.company).is_empty() {
            return Err(ContactError::Invalid);
        }

        let submission = ContactSubmission {
            name: trimmed(self.name),
            email: trimmed(self.email),
            subject: trimmed(self.subject),
            message: trimmed(self.message),
        };
        submission.validate()?;

        Ok(submission)
    }
}

fn trimmed(field: Option<String>) -> String {
    field.map(|s| s.trim().to_string()).unwrap_or_default()
}

/// A display name plus address, rendered as `Name <address>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub address: String,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.address)
    }
}

/// Fully rendered notification, ready for a [`Mailer`](crate::mail::Mailer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
    pub from: Sender,
    pub reply_to: Sender,
    pub headers: BTreeMap<&'static str, String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactAck {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, subject: &str, message: &str, company: &str) -> ContactForm {
        ContactForm {
            name: Some(name.into()),
            email: Some(email.into()),
            subject: Some(subject.into()),
            message: Some(message.into()),
            company: Some(company.into()),
        }
    }

    fn valid() -> ContactForm {
        form("Jane Doe", "jane@example.com", "Hello there", "This is a long enough message.", "")
    }

    fn code(form: ContactForm) -> &'static str {
        match form.into_submission() {
            Ok(_) => "ok",
            Err(e) => e.code(),
        }
    }

    #[test]
    fn accepts_and_trims_valid_form() {
        let mut raw = valid();
        raw.name = Some("  Jane Doe \n".into());
        raw.email = Some(" jane@example.com ".into());

        let submission = raw.into_submission().unwrap();
        assert_eq!(submission.name, "Jane Doe");
        assert_eq!(submission.email, "jane@example.com");
        assert_eq!(submission.subject, "Hello there");
    }

    #[test]
    fn honeypot_wins_over_every_other_rule() {
        assert_eq!(code(form("Jane Doe", "jane@example.com", "Hello", "Long enough body", "bot")), "invalid");
        assert_eq!(code(form("", "nope", "", "", "Acme Inc")), "invalid");
    }

    #[test]
    fn whitespace_only_honeypot_counts_as_empty() {
        let mut raw = valid();
        raw.company = Some("   ".into());
        assert_eq!(code(raw), "ok");
    }

    #[test]
    fn short_name_is_rejected() {
        let mut raw = valid();
        raw.name = Some(" J ".into());
        assert_eq!(code(raw), "validation");
    }

    #[test]
    fn short_subject_is_rejected() {
        let mut raw = valid();
        raw.subject = Some("Hi".into());
        assert_eq!(code(raw), "validation");
    }

    #[test]
    fn short_message_is_rejected() {
        let mut raw = valid();
        raw.message = Some("too short".into());
        assert_eq!(code(raw), "validation");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for email in ["jane", "jane@example", "jane doe@example.com", "@example.com", "jane@@example.com", ""] {
            let mut raw = valid();
            raw.email = Some(email.into());
            assert_eq!(code(raw), "validation", "accepted {email:?}");
        }
    }

    #[test]
    fn boundary_lengths_are_accepted() {
        assert_eq!(code(form("Jo", "a@b.co", "Hey", "0123456789", "")), "ok");
    }

    #[test]
    fn missing_fields_count_as_empty() {
        assert_eq!(code(ContactForm::default()), "validation");
    }

    #[test]
    fn sender_renders_as_mailbox() {
        let sender = Sender {
            name: "Jane Doe".into(),
            address: "jane@example.com".into(),
        };
        assert_eq!(sender.to_string(), "Jane Doe <jane@example.com>");
    }
}
