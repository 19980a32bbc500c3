//! Outbound mail
//!
//! The contact service talks to a [`Mailer`] so tests and mail-less
//! deployments can swap the SMTP transport out.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::config::MailConfig;

/// A plaintext message to a single recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

/// SMTP delivery through lettre's async transport
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let from = config
            .sender()
            .ok_or_else(|| anyhow!("Mail sender address not configured"))?
            .to_string();

        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let message = build_message(&self.from, mail)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;
        Ok(())
    }
}

/// Stand-in used when SMTP is not configured; every send fails
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, _mail: &OutgoingMail) -> Result<()> {
        Err(anyhow!("Outbound mail is not configured"))
    }
}

/// Pick the mailer for this configuration
pub fn mailer_from_config(config: &MailConfig) -> Arc<dyn Mailer> {
    if !config.is_enabled() {
        tracing::warn!("SMTP not configured; contact notifications will not be sent");
        return Arc::new(DisabledMailer);
    }
    match SmtpMailer::from_config(config) {
        Ok(mailer) => {
            tracing::info!("SMTP mailer ready ({}:{})", config.host, config.port);
            Arc::new(mailer)
        }
        Err(e) => {
            tracing::warn!("Invalid SMTP configuration, mail disabled: {:#}", e);
            Arc::new(DisabledMailer)
        }
    }
}

fn build_message(from: &str, mail: &OutgoingMail) -> Result<Message> {
    Message::builder()
        .from(from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
        .to(mail
            .to
            .parse()
            .map_err(|e| anyhow!("Invalid to address: {}", e))?)
        .subject(mail.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(mail.body.clone())
        .map_err(|e| anyhow!("Failed to build email: {}", e))
}

/// Mailer that records what it was asked to send, optionally failing
#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: std::sync::Mutex<Vec<OutgoingMail>>,
    pub fail: bool,
}

#[cfg(test)]
impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        self.sent.lock().unwrap().push(mail.clone());
        if self.fail {
            Err(anyhow!("smtp unavailable"))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail(to: &str) -> OutgoingMail {
        OutgoingMail {
            to: to.to_string(),
            subject: "New Contact Form Submission from Ada".to_string(),
            body: "Name: Ada".to_string(),
        }
    }

    #[test]
    fn test_build_message() {
        let message = build_message("site@example.com", &mail("team@example.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: team@example.com"));
        assert!(raw.contains("Subject: New Contact Form Submission from Ada"));
    }

    #[test]
    fn test_build_message_rejects_bad_address() {
        assert!(build_message("site@example.com", &mail("not an address")).is_err());
        assert!(build_message("nope", &mail("team@example.com")).is_err());
    }

    #[tokio::test]
    async fn test_disabled_mailer_errors() {
        assert!(DisabledMailer.send(&mail("a@example.com")).await.is_err());
    }

    #[test]
    fn test_smtp_mailer_requires_sender() {
        let config = MailConfig::default();
        assert!(SmtpMailer::from_config(&config).is_err());

        let config = MailConfig {
            username: Some("bot@example.com".to_string()),
            password: Some("secret".to_string()),
            ..MailConfig::default()
        };
        assert!(SmtpMailer::from_config(&config).is_ok());
    }
}
