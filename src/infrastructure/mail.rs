//! Outbound notification delivery.
//!
//! [`Mailer`] is the seam the contact pipeline talks to; [`SmtpMailer`] is the
//! lettre implementation. Transport failures are reduced to a
//! [`TransportFailure`] and sorted by [`classify_transport_failure`].

mod classify;
mod smtp;

pub use classify::{classify_transport_failure, SmtpFailureKind, TransportFailure};
pub use smtp::{MailError, Mailer, SmtpMailer};
