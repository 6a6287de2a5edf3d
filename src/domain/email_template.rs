use std::collections::BTreeMap;

use crate::{
    entities::contact_me::{ComposedEmail, ContactSubmission, Sender},
    settings::EmailConfig,
};

/// Marks a message as coming from the portfolio contact form.
pub const HEADER_CONTACT_MARKER: &str = "X-Portfolio-Contact";
/// Echoes the submitter's address for mailbox filters.
pub const HEADER_SENDER_EMAIL: &str = "X-Portfolio-Sender";

/// Escapes text for interpolation into HTML element content or attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes a multi-line message and turns its line breaks into `<br />`.
fn escape_multiline(input: &str) -> String {
    escape_html(input)
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "<br />")
}

/// Renders the notification for one accepted submission. Pure.
pub fn compose_contact_email(
    submission: &ContactSubmission,
    config: &EmailConfig,
    client_ip: &str,
) -> ComposedEmail {
    let ContactSubmission { name, email, subject, .. } = submission;

    let mut headers = BTreeMap::new();
    headers.insert(HEADER_CONTACT_MARKER, "true".to_string());
    headers.insert(HEADER_SENDER_EMAIL, email.clone());

    ComposedEmail {
        subject: format!("New Portfolio Message — {subject} — {name}"),
        text: render_text(submission, client_ip),
        html: render_html(submission, config, client_ip),
        from: Sender {
            name: format!("{} — Portfolio", config.brand_name),
            address: config.from.clone(),
        },
        reply_to: Sender {
            name: name.clone(),
            address: email.clone(),
        },
        headers,
    }
}

fn render_text(submission: &ContactSubmission, client_ip: &str) -> String {
    format!(
        "Name: {}\nEmail: {}\nSubject: {}\n\nMessage:\n{}\n\nIP: {}\n",
        submission.name, submission.email, submission.subject, submission.message, client_ip
    )
}

fn render_html(submission: &ContactSubmission, config: &EmailConfig, client_ip: &str) -> String {
    let brand = escape_html(&config.brand_name);
    let name = escape_html(&submission.name);
    let email = escape_html(&submission.email);
    let subject = escape_html(&submission.subject);
    let message = escape_multiline(&submission.message);
    let ip = escape_html(client_ip);

    let logo = if config.logo_url.is_empty() {
        String::new()
    } else {
        format!(
            r#"<img src="{}" alt="{brand}" width="40" height="40" style="border-radius:8px;vertical-align:middle;margin-right:12px;" />"#,
            escape_html(&config.logo_url)
        )
    };

    let footer = if config.site_url.is_empty() {
        format!("Sent from the {brand} contact form.")
    } else {
        let site = escape_html(&config.site_url);
        format!(r#"Sent from the contact form on <a href="{site}" style="color:#6366f1;">{site}</a>."#)
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1" />
<title>{subject}</title>
</head>
<body style="margin:0;padding:24px;background:#f4f4f7;font-family:-apple-system,Segoe UI,Roboto,Helvetica,Arial,sans-serif;color:#1f2937;">
<table role="presentation" width="100%" cellpadding="0" cellspacing="0" style="max-width:600px;margin:0 auto;background:#ffffff;border-radius:12px;overflow:hidden;">
<tr><td style="padding:20px 24px;background:#111827;color:#ffffff;font-size:18px;font-weight:600;">{logo}{brand} — New contact message</td></tr>
<tr><td style="padding:24px;">
<table role="presentation" width="100%" cellpadding="0" cellspacing="0" style="font-size:14px;">
<tr><td style="padding:6px 0;width:90px;color:#6b7280;">Name</td><td style="padding:6px 0;">{name}</td></tr>
<tr><td style="padding:6px 0;color:#6b7280;">Email</td><td style="padding:6px 0;"><a href="mailto:{email}" style="color:#6366f1;">{email}</a></td></tr>
<tr><td style="padding:6px 0;color:#6b7280;">Subject</td><td style="padding:6px 0;">{subject}</td></tr>
</table>
<div style="margin-top:20px;padding:16px;background:#f9fafb;border-left:4px solid #6366f1;border-radius:4px;font-size:15px;line-height:1.6;">{message}</div>
</td></tr>
<tr><td style="padding:16px 24px;border-top:1px solid #e5e7eb;font-size:12px;color:#9ca3af;">{footer}<br />Submitted from IP {ip}</td></tr>
</table>
</body>
</html>
"#
    )
}
