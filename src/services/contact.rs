//! Contact form intake
//!
//! A submission is validated, stored, and then announced to staff by email.
//! Mail problems are logged and never undo or fail the stored submission.

use crate::db::repositories::ContactMessageRepository;
use crate::models::{ContactMessage, ContactMessageInput};
use crate::services::email::{Mailer, OutgoingMail};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ContactServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct ContactService {
    repo: Arc<dyn ContactMessageRepository>,
    mailer: Arc<dyn Mailer>,
    notify_to: Option<String>,
}

impl ContactService {
    /// `notify_to` is the staff address for notifications; `None` disables them.
    pub fn new(
        repo: Arc<dyn ContactMessageRepository>,
        mailer: Arc<dyn Mailer>,
        notify_to: Option<String>,
    ) -> Self {
        let notify_to = notify_to.filter(|to| !to.trim().is_empty());
        Self {
            repo,
            mailer,
            notify_to,
        }
    }

    /// Validate and store a submission, then send the staff notification.
    pub async fn submit(
        &self,
        input: ContactMessageInput,
    ) -> Result<ContactMessage, ContactServiceError> {
        let message = validate(input)?;

        let saved = self
            .repo
            .create(&message)
            .await
            .context("Failed to store contact message")?;
        tracing::info!("Stored contact message {} from {}", saved.id, saved.email);

        self.notify(&saved).await;
        Ok(saved)
    }

    /// All submissions, newest first
    pub async fn list(&self) -> Result<Vec<ContactMessage>, ContactServiceError> {
        Ok(self
            .repo
            .list()
            .await
            .context("Failed to list contact messages")?)
    }

    async fn notify(&self, message: &ContactMessage) {
        let Some(to) = &self.notify_to else {
            tracing::warn!(
                "No notification recipient configured; skipping email for message {}",
                message.id
            );
            return;
        };

        let mail = notification_mail(to, message);
        match self.mailer.send(&mail).await {
            Ok(()) => tracing::info!("Sent notification for contact message {}", message.id),
            Err(e) => tracing::warn!(
                "Failed to send notification for contact message {}: {:#}",
                message.id,
                e
            ),
        }
    }
}

fn validate(input: ContactMessageInput) -> Result<ContactMessage, ContactServiceError> {
    let name = input.name.trim();
    let email = input.email.trim();
    let body = input.message.trim();

    if name.is_empty() || email.is_empty() || body.is_empty() {
        return Err(ContactServiceError::ValidationError(
            "Name, email and message are required".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(ContactServiceError::ValidationError(
            "Please enter a valid email address".to_string(),
        ));
    }

    let company = input
        .company
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    Ok(ContactMessage {
        id: 0,
        name: name.to_string(),
        email: email.to_string(),
        company,
        message: body.to_string(),
        created_at: Utc::now(),
    })
}

/// Staff notification for a stored submission
pub fn notification_mail(to: &str, message: &ContactMessage) -> OutgoingMail {
    let body = format!(
        "New contact form submission:\n\n\
         Name: {}\n\
         Email: {}\n\
         Company: {}\n\
         Message:\n{}\n\n\
         Time: {}\n",
        message.name,
        message.email,
        message.company.as_deref().unwrap_or("N/A"),
        message.message,
        message.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );

    OutgoingMail {
        to: to.to_string(),
        subject: format!("New Contact Form Submission from {}", message.name),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxContactMessageRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::services::email::RecordingMailer;

    async fn setup(
        mailer: Arc<RecordingMailer>,
        notify_to: Option<&str>,
    ) -> (ContactService, Arc<dyn ContactMessageRepository>) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let repo = SqlxContactMessageRepository::boxed(pool);
        let service = ContactService::new(repo.clone(), mailer, notify_to.map(str::to_string));
        (service, repo)
    }

    fn input(name: &str, email: &str, company: Option<&str>, message: &str) -> ContactMessageInput {
        ContactMessageInput {
            name: name.to_string(),
            email: email.to_string(),
            company: company.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_stores_and_notifies() {
        let mailer = Arc::new(RecordingMailer::default());
        let (service, repo) = setup(mailer.clone(), Some("sales@example.com")).await;

        let saved = service
            .submit(input(" Ada ", "ada@example.com", Some("Acme"), "Need a quote"))
            .await
            .unwrap();
        assert_eq!(saved.name, "Ada");
        assert_eq!(repo.list().await.unwrap().len(), 1);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "sales@example.com");
        assert_eq!(sent[0].subject, "New Contact Form Submission from Ada");
        assert!(sent[0].body.contains("Company: Acme"));
        assert!(sent[0].body.contains("Need a quote"));
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected_without_row() {
        let mailer = Arc::new(RecordingMailer::default());
        let (service, repo) = setup(mailer.clone(), Some("sales@example.com")).await;

        let result = service
            .submit(input("Ada", "ada@example.com", None, "   "))
            .await;

        assert!(matches!(result, Err(ContactServiceError::ValidationError(_))));
        assert_eq!(repo.list().await.unwrap().len(), 0);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_name_or_bad_email_rejected() {
        let mailer = Arc::new(RecordingMailer::default());
        let (service, repo) = setup(mailer, None).await;

        assert!(service.submit(input("", "a@b.c", None, "hi")).await.is_err());
        assert!(service.submit(input("Ada", "", None, "hi")).await.is_err());
        assert!(service
            .submit(input("Ada", "not-an-email", None, "hi"))
            .await
            .is_err());
        assert_eq!(repo.list().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_mail_failure_keeps_the_row() {
        let mailer = Arc::new(RecordingMailer::failing());
        let (service, repo) = setup(mailer.clone(), Some("sales@example.com")).await;

        let saved = service
            .submit(input("Ada", "ada@example.com", None, "Hello"))
            .await
            .unwrap();

        assert!(saved.id > 0);
        assert_eq!(mailer.sent().len(), 1);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_recipient_skips_mail() {
        let mailer = Arc::new(RecordingMailer::default());
        let (service, repo) = setup(mailer.clone(), Some("  ")).await;

        service
            .submit(input("Ada", "ada@example.com", None, "Hello"))
            .await
            .unwrap();

        assert!(mailer.sent().is_empty());
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_company_becomes_none() {
        let mailer = Arc::new(RecordingMailer::default());
        let (service, _) = setup(mailer.clone(), Some("sales@example.com")).await;

        let saved = service
            .submit(input("Ada", "ada@example.com", Some("  "), "Hello"))
            .await
            .unwrap();

        assert_eq!(saved.company, None);
        assert!(mailer.sent()[0].body.contains("Company: N/A"));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let mailer = Arc::new(RecordingMailer::default());
        let (service, _) = setup(mailer, None).await;

        service.submit(input("First", "a@example.com", None, "1")).await.unwrap();
        service.submit(input("Second", "b@example.com", None, "2")).await.unwrap();

        let names: Vec<String> = service.list().await.unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }
}
