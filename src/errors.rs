use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

use crate::{
    mail::{classify_transport_failure, MailError, SmtpFailureKind},
    settings::MissingSettings,
};

/// Every way a contact submission can end without a sent email.
///
/// The `Display` text carries operator detail for logs; clients only ever see
/// [`code`](ContactError::code).
#[derive(Debug, Display)]
pub enum ContactError {
    #[display("Rate limit exceeded")]
    RateLimited,

    #[display("Honeypot field was filled")]
    Invalid,

    #[display("Validation failed: {_0}")]
    Validation(String),

    #[display("Malformed JSON body: {_0}")]
    InvalidJson(String),

    #[display("Server not configured, missing: {}", _0.join(", "))]
    ServerNotConfigured(Vec<String>),

    #[display("SMTP TLS handshake failed: {_0}")]
    SmtpTlsFailed(String),

    #[display("SMTP authentication failed: {_0}")]
    SmtpAuthFailed(String),

    #[display("SMTP connection failed: {_0}")]
    SmtpConnectionFailed(String),

    #[display("Sending email failed: {_0}")]
    SendFailed(String),
}

impl ContactError {
    /// Stable machine-readable code returned to the client.
    pub fn code(&self) -> &'static str {
        match self {
            ContactError::RateLimited => "rate_limited",
            ContactError::Invalid => "invalid",
            ContactError::Validation(_) => "validation",
            ContactError::InvalidJson(_) => "invalid_json",
            ContactError::ServerNotConfigured(_) => "server_not_configured",
            ContactError::SmtpTlsFailed(_) => "smtp_tls_failed",
            ContactError::SmtpAuthFailed(_) => "smtp_auth_failed",
            ContactError::SmtpConnectionFailed(_) => "smtp_connection_failed",
            ContactError::SendFailed(_) => "send_failed",
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    ok: bool,
    error: &'static str,
}

impl ResponseError for ContactError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(ErrorBody {
                ok: false,
                error: self.code(),
            })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ContactError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ContactError::Invalid
            | ContactError::Validation(_)
            | ContactError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ContactError::ServerNotConfigured(_)
            | ContactError::SmtpTlsFailed(_)
            | ContactError::SmtpAuthFailed(_)
            | ContactError::SmtpConnectionFailed(_)
            | ContactError::SendFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for ContactError {
    fn from(errors: ValidationErrors) -> Self {
        let messages = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "invalid value".to_string());
                    format!("{}: {}", field, message)
                })
            })
            .collect::<Vec<_>>()
            .join(", ");

        ContactError::Validation(messages)
    }
}

impl From<serde_json::Error> for ContactError {
    fn from(err: serde_json::Error) -> Self {
        ContactError::InvalidJson(err.to_string())
    }
}

impl From<MissingSettings> for ContactError {
    fn from(missing: MissingSettings) -> Self {
        ContactError::ServerNotConfigured(missing.0)
    }
}

impl From<MailError> for ContactError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::InvalidAddress(_) | MailError::Build(_) => {
                ContactError::SendFailed(err.to_string())
            }
            MailError::Transport(failure) => {
                let detail = failure.to_string();
                match classify_transport_failure(&failure) {
                    SmtpFailureKind::Tls => ContactError::SmtpTlsFailed(detail),
                    SmtpFailureKind::Auth => ContactError::SmtpAuthFailed(detail),
                    SmtpFailureKind::Connection => ContactError::SmtpConnectionFailed(detail),
                    SmtpFailureKind::Other => ContactError::SendFailed(detail),
                }
            }
        }
    }
}
