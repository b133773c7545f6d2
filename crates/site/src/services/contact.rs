//! Contact form dispatch.
//!
//! A submission is validated and sanitized, then two messages go out through
//! the relay at the same time: a notification to the site owner and an
//! auto-reply to the submitter. Nothing is stored and nothing is retried.

use std::sync::Arc;

use askama::Template;
use chrono::Utc;
use folio_core::Email;
use lettre::{
    Address, Message,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
};
use serde::Deserialize;
use thiserror::Error;

use super::relay::{Relay, RelayError};

/// Subject used when the submitter did not pick one.
const DEFAULT_SUBJECT: &str = "General inquiry";

/// HTML body of the owner notification.
#[derive(Template)]
#[template(path = "email/contact_notification.html")]
struct NotificationHtml<'a> {
    site_name: &'a str,
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    subject: &'a str,
    message: &'a str,
    received_at: &'a str,
}

/// Plain text body of the owner notification.
#[derive(Template)]
#[template(path = "email/contact_notification.txt")]
struct NotificationText<'a> {
    site_name: &'a str,
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    subject: &'a str,
    message: &'a str,
    received_at: &'a str,
}

/// HTML body of the auto-reply.
#[derive(Template)]
#[template(path = "email/contact_auto_reply.html")]
struct AutoReplyHtml<'a> {
    site_name: &'a str,
    name: &'a str,
    subject: &'a str,
    message: &'a str,
}

/// Plain text body of the auto-reply.
#[derive(Template)]
#[template(path = "email/contact_auto_reply.txt")]
struct AutoReplyText<'a> {
    site_name: &'a str,
    name: &'a str,
    subject: &'a str,
    message: &'a str,
}

/// Errors produced while handling a contact submission.
#[derive(Debug, Error)]
pub enum ContactError {
    /// A required field is missing or the email is malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The relay is missing, unreachable, or misconfigured.
    #[error("Relay configuration error: {0}")]
    Configuration(String),

    /// The relay rejected our credentials.
    #[error("Relay authentication failed: {0}")]
    Auth(String),

    /// The relay refused one of the messages.
    #[error("Delivery failed: {detail}")]
    Delivery {
        /// Relay-provided detail.
        detail: String,
        /// Address the visitor can write to directly instead.
        fallback: Email,
    },

    /// A message could not be composed.
    #[error("Failed to compose message: {0}")]
    Compose(String),
}

impl ContactError {
    /// Map a failure from `Relay::verify`.
    fn from_verify(err: RelayError) -> Self {
        match err {
            RelayError::Authentication(detail) => Self::Auth(detail),
            RelayError::Connection(detail) | RelayError::Rejected(detail) => {
                Self::Configuration(detail)
            }
        }
    }

    /// Map a failure from `Relay::send`.
    fn from_send(err: RelayError, fallback: &Email) -> Self {
        match err {
            RelayError::Authentication(detail) => Self::Auth(detail),
            RelayError::Connection(detail) | RelayError::Rejected(detail) => Self::Delivery {
                detail,
                fallback: fallback.clone(),
            },
        }
    }
}

impl From<askama::Error> for ContactError {
    fn from(err: askama::Error) -> Self {
        Self::Compose(err.to_string())
    }
}

impl From<lettre::error::Error> for ContactError {
    fn from(err: lettre::error::Error) -> Self {
        Self::Compose(err.to_string())
    }
}

/// Contact form payload as posted by the site.
///
/// Every field defaults to empty so that a missing field is reported as a
/// validation failure rather than a deserialization error. `service` is the
/// key used by the services page and is read as the subject.
#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    /// Submitter's name (required).
    #[serde(default)]
    pub name: String,
    /// Submitter's reply address (required).
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Topic picked on the form; also accepted as `service`.
    #[serde(default, alias = "service")]
    pub subject: Option<String>,
    /// Free-text message (required).
    #[serde(default)]
    pub message: String,
}

/// A validated, sanitized contact submission.
///
/// `name`, `phone`, and `subject` are single lines: they end up in mail
/// headers, so they never contain control characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    /// Lower-cased reply address.
    pub email: Email,
    pub phone: Option<String>,
    pub subject: Option<String>,
    /// Message body; keeps line breaks.
    pub message: String,
}

impl ContactForm {
    /// Validate required fields and the email shape, then sanitize.
    ///
    /// Angle brackets are removed everywhere. Control characters in the
    /// single-line fields (line breaks included) are folded into one space;
    /// the message keeps `\n` and `\t` and loses every other control
    /// character.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::Validation`] if `name`, `email`, or `message`
    /// is blank, or if the email is not shaped like `local@domain.tld`.
    pub fn validate(self) -> Result<ContactSubmission, ContactError> {
        let name = single_line(&self.name);
        let message = multi_line(&self.message);
        let email = self.email.trim().to_lowercase();

        if name.trim().is_empty() || email.is_empty() || message.trim().is_empty() {
            return Err(ContactError::Validation(
                "Name, email, and message are required.".to_string(),
            ));
        }

        let email = Email::parse(&email)
            .ok()
            .filter(|e| e.as_str().parse::<Address>().is_ok())
            .ok_or_else(|| {
                ContactError::Validation("Please enter a valid email address.".to_string())
            })?;

        Ok(ContactSubmission {
            name,
            email,
            phone: optional_text(self.phone.as_deref()),
            subject: optional_text(self.subject.as_deref()),
            message,
        })
    }
}

impl ContactSubmission {
    /// Subject line chosen by the submitter, or the default.
    #[must_use]
    pub fn subject_or_default(&self) -> &str {
        self.subject.as_deref().unwrap_or(DEFAULT_SUBJECT)
    }
}

/// Remove `<` and `>` from free text before it reaches an HTML body.
///
/// This is not a general sanitizer; the HTML templates escape on top of it.
#[must_use]
pub fn strip_angle_brackets(input: &str) -> String {
    input.chars().filter(|c| !matches!(c, '<' | '>')).collect()
}

/// Sanitize text bound for a mail header: strip angle brackets, turn
/// control characters into spaces, and collapse whitespace runs.
fn single_line(input: &str) -> String {
    strip_angle_brackets(input)
        .split(|c: char| c.is_control() || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn multi_line(input: &str) -> String {
    strip_angle_brackets(input.trim())
        .chars()
        .filter(|&c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect()
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value.map(single_line).filter(|v| !v.is_empty())
}

/// Sends contact notifications through a [`Relay`].
#[derive(Clone)]
pub struct ContactDispatcher {
    relay: Arc<dyn Relay>,
    from_address: Email,
    owner_address: Email,
    site_name: String,
}

impl ContactDispatcher {
    /// Create a dispatcher.
    ///
    /// * `from_address` - sender of both messages
    /// * `owner_address` - recipient of the notification, also offered as the
    ///   fallback contact when delivery fails
    #[must_use]
    pub fn new(
        relay: Arc<dyn Relay>,
        from_address: Email,
        owner_address: Email,
        site_name: impl Into<String>,
    ) -> Self {
        Self {
            relay,
            from_address,
            owner_address,
            site_name: site_name.into(),
        }
    }

    /// Check the relay without sending anything.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::Configuration`] or [`ContactError::Auth`].
    pub async fn verify(&self) -> Result<(), ContactError> {
        self.relay.verify().await.map_err(ContactError::from_verify)
    }

    /// Verify the relay, then send the notification and auto-reply
    /// concurrently.
    ///
    /// Both sends are awaited together; the first failure is returned. When
    /// verification fails, nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::Configuration`], [`ContactError::Auth`],
    /// [`ContactError::Delivery`], or [`ContactError::Compose`].
    pub async fn dispatch(&self, submission: &ContactSubmission) -> Result<(), ContactError> {
        self.verify().await?;

        let notification = self.owner_notification(submission)?;
        let auto_reply = self.auto_reply(submission)?;

        tokio::try_join!(self.relay.send(notification), self.relay.send(auto_reply))
            .map_err(|e| ContactError::from_send(e, &self.owner_address))?;

        tracing::info!(
            owner = %self.owner_address,
            submitter = %submission.email,
            subject = %submission.subject_or_default(),
            "Contact notifications sent"
        );
        Ok(())
    }

    /// Build the notification addressed to the site owner.
    ///
    /// `Reply-To` points at the submitter so the owner can answer directly.
    fn owner_notification(&self, submission: &ContactSubmission) -> Result<Message, ContactError> {
        let received_at = Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();
        let phone = submission.phone.as_deref().unwrap_or("");
        let subject = submission.subject_or_default();

        let html = NotificationHtml {
            site_name: &self.site_name,
            name: &submission.name,
            email: submission.email.as_str(),
            phone,
            subject,
            message: &submission.message,
            received_at: &received_at,
        }
        .render()?;
        let text = NotificationText {
            site_name: &self.site_name,
            name: &submission.name,
            email: submission.email.as_str(),
            phone,
            subject,
            message: &submission.message,
            received_at: &received_at,
        }
        .render()?;

        self.compose(
            mailbox(None, &self.owner_address)?,
            Some(mailbox(Some(submission.name.as_str()), &submission.email)?),
            &format!("New contact form submission: {subject}"),
            text,
            html,
        )
    }

    /// Build the acknowledgement addressed to the submitter.
    fn auto_reply(&self, submission: &ContactSubmission) -> Result<Message, ContactError> {
        let subject = submission.subject_or_default();

        let html = AutoReplyHtml {
            site_name: &self.site_name,
            name: &submission.name,
            subject,
            message: &submission.message,
        }
        .render()?;
        let text = AutoReplyText {
            site_name: &self.site_name,
            name: &submission.name,
            subject,
            message: &submission.message,
        }
        .render()?;

        self.compose(
            mailbox(Some(submission.name.as_str()), &submission.email)?,
            None,
            &format!("Thanks for reaching out to {}", self.site_name),
            text,
            html,
        )
    }

    /// Build a multipart message with both plain text and HTML versions.
    fn compose(
        &self,
        to: Mailbox,
        reply_to: Option<Mailbox>,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<Message, ContactError> {
        let mut builder = Message::builder()
            .from(mailbox(Some(self.site_name.as_str()), &self.from_address)?)
            .to(to)
            .subject(subject);
        if let Some(reply_to) = reply_to {
            builder = builder.reply_to(reply_to);
        }

        Ok(builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text_body),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html_body),
                ),
        )?)
    }
}

fn mailbox(name: Option<&str>, email: &Email) -> Result<Mailbox, ContactError> {
    let address = email
        .as_str()
        .parse::<Address>()
        .map_err(|e| ContactError::Compose(format!("{email}: {e}")))?;
    Ok(Mailbox::new(name.map(str::to_string), address))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::StubRelay;

    fn form() -> ContactForm {
        ContactForm {
            name: "Jane Doe".to_string(),
            email: "Jane@Example.com ".to_string(),
            phone: Some(" ".to_string()),
            subject: Some("Website redesign".to_string()),
            message: "I'd like a quote.".to_string(),
        }
    }

    fn dispatcher(relay: Arc<StubRelay>) -> ContactDispatcher {
        ContactDispatcher::new(
            relay,
            Email::parse("noreply@folio.test").unwrap(),
            Email::parse("owner@folio.test").unwrap(),
            "Folio",
        )
    }

    #[test]
    fn test_validate_normalizes_fields() {
        let submission = form().validate().unwrap();
        assert_eq!(submission.email.as_str(), "jane@example.com");
        assert_eq!(submission.phone, None);
        assert_eq!(submission.subject.as_deref(), Some("Website redesign"));
    }

    #[test]
    fn test_validate_missing_email() {
        let form = ContactForm {
            email: String::new(),
            ..form()
        };
        assert!(matches!(form.validate(), Err(ContactError::Validation(_))));
    }

    #[test]
    fn test_validate_bad_email() {
        let form = ContactForm {
            email: "not-an-email".to_string(),
            ..form()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Please enter a valid email address."
        );
    }

    #[test]
    fn test_validate_name_of_only_brackets_is_blank() {
        let form = ContactForm {
            name: "<>".to_string(),
            ..form()
        };
        assert!(matches!(form.validate(), Err(ContactError::Validation(_))));
    }

    #[test]
    fn test_validate_folds_line_breaks_in_header_fields() {
        let form = ContactForm {
            name: "Eve\nAdams".to_string(),
            phone: Some("555\r\n0100".to_string()),
            subject: Some("Hi\r\nBcc: victim@evil.test".to_string()),
            message: "line one\r\nline two\u{0}".to_string(),
            ..form()
        };
        let submission = form.validate().unwrap();

        assert_eq!(submission.name, "Eve Adams");
        assert_eq!(submission.phone.as_deref(), Some("555 0100"));
        assert_eq!(
            submission.subject.as_deref(),
            Some("Hi Bcc: victim@evil.test")
        );
        assert_eq!(submission.message, "line one\nline two");
    }

    #[test]
    fn test_validate_name_of_only_control_chars_is_blank() {
        let form = ContactForm {
            name: "\r\n\t".to_string(),
            ..form()
        };
        assert!(matches!(form.validate(), Err(ContactError::Validation(_))));
    }

    #[test]
    fn test_strip_angle_brackets() {
        assert_eq!(
            strip_angle_brackets("<script>alert(1)</script>"),
            "scriptalert(1)/script"
        );
        assert_eq!(strip_angle_brackets("a & b"), "a & b");
    }

    #[test]
    fn test_service_key_is_read_as_subject() {
        let form: ContactForm = serde_json::from_str(
            r#"{"name":"A","email":"a@b.co","service":"Branding","message":"hi"}"#,
        )
        .unwrap();
        assert_eq!(form.subject.as_deref(), Some("Branding"));
    }

    #[test]
    fn test_notification_html_is_sanitized_and_escaped() {
        let form = ContactForm {
            message: "<script>alert('x')</script> & thanks".to_string(),
            ..form()
        };
        let submission = form.validate().unwrap();
        let html = NotificationHtml {
            site_name: "Folio",
            name: &submission.name,
            email: submission.email.as_str(),
            phone: "",
            subject: submission.subject_or_default(),
            message: &submission.message,
            received_at: "now",
        }
        .render()
        .unwrap();

        assert!(!html.contains("<script>"));
        assert!(!html.contains("& thanks"));
        assert!(html.contains("thanks"));
        assert!(html.contains("jane@example.com"));
    }

    #[tokio::test]
    async fn test_dispatch_sends_owner_notification_and_auto_reply() {
        let relay = Arc::new(StubRelay::healthy());
        let submission = form().validate().unwrap();

        dispatcher(relay.clone()).dispatch(&submission).await.unwrap();

        let sent = relay.sent();
        assert_eq!(sent.len(), 2);
        let mut recipients: Vec<String> = sent.iter().flat_map(|m| m.to.clone()).collect();
        recipients.sort();
        assert_eq!(recipients, vec!["jane@example.com", "owner@folio.test"]);
    }

    #[tokio::test]
    async fn test_dispatch_sends_nothing_when_verify_fails() {
        let relay = Arc::new(StubRelay::failing_verify(RelayError::Connection(
            "connection refused".to_string(),
        )));
        let submission = form().validate().unwrap();

        let err = dispatcher(relay.clone())
            .dispatch(&submission)
            .await
            .unwrap_err();

        assert!(matches!(err, ContactError::Configuration(_)));
        assert!(relay.sent().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_auth_failure_on_verify() {
        let relay = Arc::new(StubRelay::failing_verify(RelayError::Authentication(
            "535".to_string(),
        )));
        let submission = form().validate().unwrap();

        let err = dispatcher(relay).dispatch(&submission).await.unwrap_err();
        assert!(matches!(err, ContactError::Auth(_)));
    }

    #[tokio::test]
    async fn test_dispatch_rejected_message_offers_fallback() {
        let relay = Arc::new(StubRelay::failing_send(RelayError::Rejected(
            "550 spam detected".to_string(),
        )));
        let submission = form().validate().unwrap();

        let err = dispatcher(relay).dispatch(&submission).await.unwrap_err();
        match err {
            ContactError::Delivery { fallback, .. } => {
                assert_eq!(fallback.as_str(), "owner@folio.test");
            }
            other => panic!("expected delivery error, got {other:?}"),
        }
    }
}
