use crate::config::email::{EmailConfig, SmtpConfig};
use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Minutes a password-reset link stays usable, as announced in the mail.
const RESET_LINK_MINUTES: i64 = crate::services::auth::RESET_TOKEN_VALIDITY_MINUTES;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound mail collaborator injected into the account workflows.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<()>;
}

/// Delivers over SMTP with lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> Result<Self> {
        let creds = Credentials::new(cfg.username.clone(), cfg.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)?
            .port(cfg.port)
            .credentials(creds)
            .build();
        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        let from_mailbox: Mailbox =
            mail.from
                .parse()
                .map_err(|e: lettre::address::AddressError| {
                    anyhow::anyhow!("Invalid from address '{}': {}", mail.from, e)
                })?;
        let to_mailbox: Mailbox = mail.to.parse().map_err(|e: lettre::address::AddressError| {
            anyhow::anyhow!("Invalid to address '{}': {}", mail.to, e)
        })?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)?;

        self.transport.send(email).await?;
        tracing::info!("Email sent to {}: {}", mail.to, mail.subject);
        Ok(())
    }
}

/// Used when SMTP is not configured: the mail is only logged.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        tracing::debug!("SMTP not configured, skipping email to {}: {}", mail.to, mail.subject);
        Ok(())
    }
}

/// Keeps every mail in memory; handy for tests and local runs.
#[derive(Clone, Default)]
pub struct OutboxMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        self.sent.lock().await.push(mail);
        Ok(())
    }
}

#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
    from_address: String,
    site_url: String,
}

impl EmailService {
    pub fn new(mailer: Arc<dyn Mailer>, from_address: String, site_url: String) -> Self {
        Self {
            mailer,
            from_address,
            site_url,
        }
    }

    /// Build from environment variables. If SMTP is not configured, mails
    /// are logged and dropped (graceful degradation).
    pub fn from_env() -> Self {
        let cfg = EmailConfig::from_env();
        let mailer: Arc<dyn Mailer> = match &cfg.smtp {
            Some(smtp) => match SmtpMailer::new(smtp) {
                Ok(m) => Arc::new(m),
                Err(e) => {
                    tracing::warn!("Failed to build SMTP transport: {e}");
                    Arc::new(LogMailer)
                }
            },
            None => Arc::new(LogMailer),
        };
        Self::new(mailer, cfg.from_address, cfg.site_url)
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!(
            "{}/api/v1/auth/reset-password/confirm/{}",
            self.site_url, token
        )
    }

    pub async fn send_password_reset_email(&self, to: &str, token: &str) -> Result<()> {
        let body = format!(
            "Please use the following link to reset your password: {}. \
             This link will be usable for {} minutes, after which you will have \
             to fill in the “Forgot password” form once more.",
            self.reset_link(token),
            RESET_LINK_MINUTES
        );

        self.mailer
            .send(OutgoingMail {
                from: self.from_address.clone(),
                to: to.to_string(),
                subject: "Forum: new password request".to_string(),
                body,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with_outbox() -> (EmailService, OutboxMailer) {
        let outbox = OutboxMailer::new();
        let service = EmailService::new(
            Arc::new(outbox.clone()),
            "Forum <noreply@example.com>".to_string(),
            "https://forum.example.com".to_string(),
        );
        (service, outbox)
    }

    #[test]
    fn reset_link_embeds_token() {
        let (service, _) = service_with_outbox();
        assert_eq!(
            service.reset_link("abc"),
            "https://forum.example.com/api/v1/auth/reset-password/confirm/abc"
        );
    }

    #[tokio::test]
    async fn reset_mail_goes_through_the_mailer() {
        let (service, outbox) = service_with_outbox();
        service
            .send_password_reset_email("jane@example.com", "tok123")
            .await
            .unwrap();

        let sent = outbox.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jane@example.com");
        assert!(sent[0].body.contains("/reset-password/confirm/tok123"));
        assert!(sent[0].body.contains("10 minutes"));
    }
}
