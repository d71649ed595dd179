//! Email service
//!
//! Sends transactional mail over SMTP with lettre. When no SMTP host is
//! configured the message is written to the log instead, which keeps
//! development setups and tests free of network access.

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;

/// Outgoing mail, rendered but not yet sent
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Email service for transactional messages
pub struct EmailService {
    config: MailConfig,
}

impl EmailService {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Send the password reset link
    pub async fn send_password_reset(&self, to: &str, name: &str, link: &str) -> Result<()> {
        self.send(password_reset_mail(to, name, link)).await
    }

    /// Send the welcome message after registration
    pub async fn send_welcome(&self, to: &str, name: &str) -> Result<()> {
        self.send(welcome_mail(to, name)).await
    }

    /// Deliver a message, or log it when SMTP is not configured
    pub async fn send(&self, mail: OutgoingMail) -> Result<()> {
        if !self.config.is_configured() {
            tracing::info!(
                to = %mail.to,
                subject = %mail.subject,
                "SMTP not configured, mail not sent:\n{}",
                mail.body
            );
            return Ok(());
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from);
        let message = Message::builder()
            .from(from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
            .to(mail.to.parse().map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(self.config.smtp_port);
        if !self.config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            ));
        }
        let mailer: AsyncSmtpTransport<Tokio1Executor> = builder.build();

        mailer
            .send(message)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        tracing::debug!(to = %mail.to, "Mail sent");
        Ok(())
    }
}

fn password_reset_mail(to: &str, name: &str, link: &str) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Reset your HAY Property password".to_string(),
        body: format!(
            "Hello {},\n\nWe received a request to reset your password. \
             Open the link below within one hour to choose a new one:\n\n{}\n\n\
             If you did not ask for this, you can ignore this email.\n\nHAY Property",
            name, link
        ),
    }
}

fn welcome_mail(to: &str, name: &str) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Welcome to HAY Property".to_string(),
        body: format!(
            "Hello {},\n\nYour account is ready. You can now save properties to your \
             wishlist and follow the progress of your purchases.\n\nHAY Property",
            name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_mail_contains_link() {
        let mail = password_reset_mail("a@x.com", "Ada", "https://hay.test/reset-password?token=abc");
        assert_eq!(mail.to, "a@x.com");
        assert!(mail.body.contains("https://hay.test/reset-password?token=abc"));
        assert!(mail.body.contains("Ada"));
    }

    #[tokio::test]
    async fn test_unconfigured_service_logs_instead_of_sending() {
        let service = EmailService::new(MailConfig::default());
        assert!(!service.is_configured());
        service
            .send_welcome("a@x.com", "Ada")
            .await
            .expect("logging fallback should succeed");
    }
}
