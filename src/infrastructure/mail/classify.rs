use std::{error::Error as StdError, fmt, time::Duration};

use lettre::transport::smtp::Error as SmtpError;

/// Transport-neutral view of a failed SMTP submission.
///
/// `message` holds the lower-cased error text including its source chain,
/// which is where rustls and io errors put the useful part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub message: String,
    pub status: Option<u16>,
    pub timed_out: bool,
    pub tls: bool,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into().to_lowercase(),
            status: None,
            timed_out: false,
            tls: false,
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self {
            timed_out: true,
            ..Self::new(format!("smtp submission timed out after {}s", after.as_secs()))
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "{} (status {})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

impl From<&SmtpError> for TransportFailure {
    fn from(err: &SmtpError) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        TransportFailure {
            message: message.to_lowercase(),
            status: err
                .status()
                .and_then(|code| code.to_string().parse::<u16>().ok()),
            timed_out: err.is_timeout(),
            tls: err.is_tls(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpFailureKind {
    Tls,
    Auth,
    Connection,
    Other,
}

/// SMTP reply codes that mean the relay refused our credentials.
const AUTH_STATUS_CODES: &[u16] = &[530, 534, 535, 538];

const AUTH_MARKERS: &[&str] = &["authentication", "credentials"];

const CONNECTION_MARKERS: &[&str] = &[
    "connection refused",
    "connection reset",
    "connection error",
    "connection closed",
    "network error",
    "timed out",
    "broken pipe",
    "failed to lookup address",
    "dns error",
    "unreachable",
];

type Matcher = fn(&TransportFailure) -> bool;

/// Ordered matcher table; the first hit decides the kind.
///
/// These rules are written against lettre's error shapes and must be
/// re-checked whenever the mail crate is upgraded or replaced.
const RULES: &[(Matcher, SmtpFailureKind)] = &[
    (is_tls_failure, SmtpFailureKind::Tls),
    (is_auth_failure, SmtpFailureKind::Auth),
    (is_connection_failure, SmtpFailureKind::Connection),
];

fn is_tls_failure(failure: &TransportFailure) -> bool {
    failure.tls || failure.message.contains("certificate")
}

fn is_auth_failure(failure: &TransportFailure) -> bool {
    failure.status.is_some_and(|code| AUTH_STATUS_CODES.contains(&code))
        || AUTH_MARKERS.iter().any(|m| failure.message.contains(m))
}

fn is_connection_failure(failure: &TransportFailure) -> bool {
    failure.timed_out || CONNECTION_MARKERS.iter().any(|m| failure.message.contains(m))
}

pub fn classify_transport_failure(failure: &TransportFailure) -> SmtpFailureKind {
    RULES
        .iter()
        .find(|(matches, _)| matches(failure))
        .map(|(_, kind)| *kind)
        .unwrap_or(SmtpFailureKind::Other)
}
