use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::config::MailConfig;

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

pub fn confirmation_email(to: &str, confirm_url: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Confirm Your Email Address".to_string(),
        html: format!(
            "<p>Welcome! Thanks for signing up. Please follow this link to activate your account:</p>\
             <p><a href=\"{confirm_url}\">{confirm_url}</a></p>\
             <p>The link expires in one hour.</p>"
        ),
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig, username: &str, password: &str) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
            .port(config.port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        Ok(Self {
            transport,
            sender: config.sender.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(email.to.parse()?)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Used when no SMTP credentials are configured: the message is only logged.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        tracing::info!(to = %email.to, subject = %email.subject, body = %email.html, "mail delivery disabled, logging message");
        Ok(())
    }
}

pub fn mailer_from_config(config: &MailConfig) -> anyhow::Result<std::sync::Arc<dyn Mailer>> {
    match &config.credentials {
        Some((username, password)) => Ok(std::sync::Arc::new(SmtpMailer::new(
            config, username, password,
        )?)),
        None => Ok(std::sync::Arc::new(LogMailer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail_config(sender: &str) -> MailConfig {
        MailConfig {
            server: "smtp.example.com".into(),
            port: 587,
            sender: sender.into(),
            credentials: None,
        }
    }

    #[test]
    fn starttls_transport_builds_without_connecting() {
        let config = mail_config("Shop <shop@example.com>");
        assert!(SmtpMailer::new(&config, "user", "secret").is_ok());

        let config = mail_config("not an address");
        assert!(SmtpMailer::new(&config, "user", "secret").is_err());
    }

    #[test]
    fn confirmation_email_carries_the_link() {
        let email = confirmation_email("ada@example.com", "http://localhost/confirm/abc");
        assert_eq!(email.subject, "Confirm Your Email Address");
        assert!(email.html.contains("href=\"http://localhost/confirm/abc\""));
    }
}
