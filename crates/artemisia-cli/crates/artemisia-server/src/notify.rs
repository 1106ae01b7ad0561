use artemisia_template::escape_html;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_SMTP_PORT: u16 = 587;

/// A contact form submission.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("mail is not configured: {0} is not set")]
    NotConfigured(&'static str),
    #[error("invalid address \"{address}\": {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Relays contact form submissions to the company.
#[async_trait]
pub trait ContactNotifier: Send + Sync {
    /// Deliver one submission, returning a delivery id on success.
    async fn send(&self, message: &ContactMessage) -> Result<String, NotifyError>;
}

/// SMTP transport configuration from `SMTP_*` and `COMPANY_EMAIL`.
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: u16,
    /// Implicit TLS from the first byte; otherwise STARTTLS when offered.
    pub secure: bool,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: Option<String>,
    pub company_email: Option<String>,
}

impl SmtpSettings {
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let port = match get("SMTP_PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid SMTP_PORT \"{raw}\", using {DEFAULT_SMTP_PORT}");
                DEFAULT_SMTP_PORT
            }),
            None => DEFAULT_SMTP_PORT,
        };
        Self {
            host: get("SMTP_HOST"),
            port,
            secure: get("SMTP_SECURE").as_deref() == Some("true"),
            user: get("SMTP_USER"),
            pass: get("SMTP_PASS"),
            from: get("SMTP_FROM"),
            company_email: get("COMPANY_EMAIL"),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Names of required settings that are missing.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.host.is_none() {
            missing.push("SMTP_HOST");
        }
        if self.company_email.is_none() {
            missing.push("COMPANY_EMAIL");
        }
        if self.from.is_none() && self.user.is_none() {
            missing.push("SMTP_FROM");
        }
        missing
    }
}

/// Sends each submission as one email through an SMTP relay.
///
/// A transport is built per message, so settings are only validated when
/// something is sent and a misconfigured relay never stops the server.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    settings: SmtpSettings,
}

impl SmtpNotifier {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    /// Build the email for a submission without sending it.
    pub fn compose(&self, contact: &ContactMessage) -> Result<Message, NotifyError> {
        let to = self
            .settings
            .company_email
            .as_deref()
            .ok_or(NotifyError::NotConfigured("COMPANY_EMAIL"))?;
        let from = self
            .settings
            .from
            .as_deref()
            .or(self.settings.user.as_deref())
            .ok_or(NotifyError::NotConfigured("SMTP_FROM"))?;

        let message = Message::builder()
            .from(Mailbox::new(Some("Website Contact".into()), parse_address(from)?))
            .to(Mailbox::new(None, parse_address(to)?))
            .reply_to(Mailbox::new(None, parse_address(&contact.email)?))
            .subject(format!("New Contact Form Submission from {}", contact.name))
            .multipart(MultiPart::alternative_plain_html(
                contact.message.clone(),
                html_body(contact),
            ))?;
        Ok(message)
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let host = self
            .settings
            .host
            .as_deref()
            .ok_or(NotifyError::NotConfigured("SMTP_HOST"))?;
        let tls = TlsParameters::new(host.to_string())?;
        let tls = if self.settings.secure {
            Tls::Wrapper(tls)
        } else {
            Tls::Opportunistic(tls)
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(self.settings.port)
            .tls(tls);
        if let Some(user) = &self.settings.user {
            let pass = self.settings.pass.clone().unwrap_or_default();
            builder = builder.credentials(Credentials::new(user.clone(), pass));
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl ContactNotifier for SmtpNotifier {
    async fn send(&self, contact: &ContactMessage) -> Result<String, NotifyError> {
        let transport = self.transport()?;
        let message = self.compose(contact)?;
        let response = transport.send(message).await?;
        Ok(response.message().collect::<Vec<_>>().join(" "))
    }
}

fn parse_address(raw: &str) -> Result<Address, NotifyError> {
    raw.trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| NotifyError::InvalidAddress {
            address: raw.to_string(),
            reason: e.to_string(),
        })
}

fn html_body(contact: &ContactMessage) -> String {
    format!(
        "<p><strong>Name:</strong> {}</p>\n<p><strong>Email:</strong> {}</p>\n<p><strong>Message:</strong><br/>{}</p>",
        escape_html(&contact.name),
        escape_html(&contact.email),
        escape_html(&contact.message).replace('\n', "<br/>"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> SmtpSettings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SmtpSettings::from_lookup(|name| map.get(name).cloned())
    }

    fn configured() -> SmtpSettings {
        settings(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "web@artemisiapharma.com"),
            ("SMTP_PASS", "secret"),
            ("COMPANY_EMAIL", "sales@artemisiapharma.com"),
        ])
    }

    fn contact() -> ContactMessage {
        ContactMessage {
            name: "Dana <QA>".into(),
            email: "dana@example.org".into(),
            message: "Need 20kg of IR pellets.\nCoA please.".into(),
        }
    }

    #[test]
    fn test_settings_defaults() {
        let s = settings(&[]);
        assert_eq!(s.port, 587);
        assert!(!s.secure);
        assert_eq!(s.missing(), vec!["SMTP_HOST", "COMPANY_EMAIL", "SMTP_FROM"]);
    }

    #[test]
    fn test_settings_from_lookup() {
        let s = settings(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "465"),
            ("SMTP_SECURE", "true"),
            ("SMTP_FROM", "noreply@artemisiapharma.com"),
            ("COMPANY_EMAIL", "sales@artemisiapharma.com"),
        ]);
        assert_eq!(s.port, 465);
        assert!(s.secure);
        assert_eq!(s.user, None);
        assert!(s.missing().is_empty());

        assert!(!settings(&[("SMTP_SECURE", "TRUE")]).secure);
        assert_eq!(settings(&[("SMTP_PORT", "smtp")]).port, 587);
    }

    #[test]
    fn test_compose_headers_and_body() {
        let notifier = SmtpNotifier::new(configured());
        let email = notifier.compose(&contact()).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("Website Contact"));
        assert!(raw.contains("<web@artemisiapharma.com>"));
        assert!(raw.contains("To: sales@artemisiapharma.com") || raw.contains("To: <sales@artemisiapharma.com>"));
        assert!(raw.contains("Reply-To:") && raw.contains("dana@example.org"));
        assert!(raw.contains("Subject: New Contact Form Submission from Dana <QA>"));
        assert!(raw.contains("multipart/alternative"));
    }

    #[test]
    fn test_html_body_escapes_and_breaks_lines() {
        let body = html_body(&contact());
        assert!(body.contains("<strong>Name:</strong> Dana &lt;QA&gt;"));
        assert!(body.contains("Need 20kg of IR pellets.<br/>CoA please."));
    }

    #[test]
    fn test_compose_prefers_smtp_from() {
        let mut s = configured();
        s.from = Some("noreply@artemisiapharma.com".into());
        let email = SmtpNotifier::new(s).compose(&contact()).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("<noreply@artemisiapharma.com>"));
    }

    #[test]
    fn test_compose_rejects_bad_reply_to() {
        let notifier = SmtpNotifier::new(configured());
        let mut bad = contact();
        bad.email = "not-an-email".into();
        assert!(matches!(
            notifier.compose(&bad),
            Err(NotifyError::InvalidAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_send_unconfigured_fails_without_network() {
        let notifier = SmtpNotifier::new(settings(&[("COMPANY_EMAIL", "sales@artemisiapharma.com")]));
        let err = notifier.send(&contact()).await.unwrap_err();
        assert!(matches!(err, NotifyError::NotConfigured("SMTP_HOST")));

        let notifier = SmtpNotifier::new(settings(&[("SMTP_HOST", "smtp.example.com")]));
        let err = notifier.send(&contact()).await.unwrap_err();
        assert!(matches!(err, NotifyError::NotConfigured("COMPANY_EMAIL")));
    }
}
