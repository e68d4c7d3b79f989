//! SMTP backend for sending emails
//!
//! Uses the `lettre` crate to send emails via SMTP servers. Emails with attachments are
//! sent as `multipart/mixed`, the text body first and each attachment after it.

use async_trait::async_trait;
use lettre::{
    message::{header, Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};

use crate::email::{Attachment, Email, EmailError, EmailSender};

/// SMTP email backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// SMTP server hostname
    pub host: String,

    /// SMTP server port (usually 587 for STARTTLS, 25 for a local relay)
    pub port: u16,

    /// SMTP username, no authentication when unset
    pub username: Option<String>,

    /// SMTP password
    pub password: Option<String>,

    /// Use STARTTLS (default: true)
    pub use_tls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: None,
            password: None,
            use_tls: true,
        }
    }
}

impl SmtpConfig {
    /// Create SMTP configuration from environment variables
    ///
    /// Expects the following environment variables:
    /// - `SMTP_HOST`: SMTP server hostname
    /// - `SMTP_PORT`: SMTP server port (default: 587)
    /// - `SMTP_USERNAME`, `SMTP_PASSWORD`: credentials (optional)
    /// - `SMTP_USE_TLS`: Use TLS (default: true)
    ///
    /// # Errors
    ///
    /// Returns `EmailError::ConfigError` if `SMTP_HOST` is missing or `SMTP_PORT` is not a port
    pub fn from_env() -> Result<Self, EmailError> {
        let host = std::env::var("SMTP_HOST")
            .map_err(|_| EmailError::config("SMTP_HOST environment variable not set"))?;

        let port = std::env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .map_err(|_| EmailError::config("SMTP_PORT must be a valid port number"))?;

        let use_tls = std::env::var("SMTP_USE_TLS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Self {
            host,
            port,
            username: std::env::var("SMTP_USERNAME").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
            use_tls,
        })
    }

    fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Some(Credentials::new(username.clone(), password.clone()))
            }
            _ => None,
        }
    }
}

/// SMTP email backend
///
/// # Examples
///
/// ```rust,no_run
/// use webform_summary::email::{Email, EmailSender, SmtpBackend, SmtpConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = SmtpBackend::new(SmtpConfig {
///     host: "smtp.example.com".to_string(),
///     ..SmtpConfig::default()
/// });
///
/// let email = Email::new()
///     .to("office@example.com")
///     .from("noreply@example.com")
///     .subject("Webform summary")
///     .text("No new submissions.");
///
/// backend.send(email).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SmtpBackend {
    config: SmtpConfig,
}

impl SmtpBackend {
    /// Create a new SMTP backend with the given configuration
    #[must_use]
    pub const fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Create a new SMTP backend from environment variables
    ///
    /// # Errors
    ///
    /// Returns `EmailError::ConfigError` if required environment variables are missing
    pub fn from_env() -> Result<Self, EmailError> {
        let config = SmtpConfig::from_env()?;
        Ok(Self::new(config))
    }

    fn mailbox(address: &str) -> Result<Mailbox, EmailError> {
        address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(address.to_string()))
    }

    fn mime_attachment(attachment: &Attachment) -> Result<SinglePart, EmailError> {
        let content_type = header::ContentType::parse(&attachment.content_type)
            .map_err(|_| EmailError::InvalidContentType(attachment.content_type.clone()))?;
        Ok(MimeAttachment::new(attachment.filename.clone())
            .body(attachment.content.clone(), content_type))
    }

    /// Build lettre Message from Email
    fn build_message(email: &Email) -> Result<Message, EmailError> {
        email.validate()?;

        let from = email.from.as_deref().ok_or(EmailError::NoSender)?;
        let mut builder = Message::builder().from(Self::mailbox(from)?);

        for to_addr in &email.to {
            builder = builder.to(Self::mailbox(to_addr)?);
        }

        let subject = email.subject.as_ref().ok_or(EmailError::NoSubject)?;
        builder = builder.subject(subject);

        if email.attachments.is_empty() {
            let text = email.text.clone().ok_or(EmailError::NoContent)?;
            return builder
                .header(header::ContentType::TEXT_PLAIN)
                .body(text)
                .map_err(|e| EmailError::smtp(e.to_string()));
        }

        let mut parts = Vec::with_capacity(email.attachments.len() + 1);
        if let Some(text) = &email.text {
            parts.push(SinglePart::plain(text.clone()));
        }
        for attachment in &email.attachments {
            parts.push(Self::mime_attachment(attachment)?);
        }

        let mut parts = parts.into_iter();
        let first = parts.next().ok_or(EmailError::NoContent)?;
        let multipart = parts.fold(MultiPart::mixed().singlepart(first), MultiPart::singlepart);

        builder
            .multipart(multipart)
            .map_err(|e| EmailError::smtp(e.to_string()))
    }

    /// Create SMTP transport from config
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let mut transport = if self.config.use_tls {
            let tls_parameters = TlsParameters::new(self.config.host.clone())
                .map_err(|e| EmailError::smtp(format!("TLS parameters error: {e}")))?;

            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
                .map_err(|e| EmailError::smtp(e.to_string()))?
                .tls(Tls::Required(tls_parameters))
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host)
        };

        transport = transport.port(self.config.port);
        if let Some(credentials) = self.config.credentials() {
            transport = transport.credentials(credentials);
        }

        Ok(transport.build())
    }
}

#[async_trait]
impl EmailSender for SmtpBackend {
    async fn send(&self, email: Email) -> Result<(), EmailError> {
        let message = Self::build_message(&email)?;
        let transport = self.create_transport()?;

        transport
            .send(message)
            .await
            .map_err(|e| EmailError::smtp(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Email {
        Email::new()
            .to("office@example.com")
            .from("noreply@example.com")
            .subject("Webform summary")
    }

    #[test]
    fn test_smtp_config_from_env() {
        std::env::set_var("SMTP_HOST", "smtp.example.com");
        std::env::set_var("SMTP_PORT", "2525");
        std::env::remove_var("SMTP_USERNAME");
        std::env::remove_var("SMTP_PASSWORD");
        std::env::remove_var("SMTP_USE_TLS");

        let config = SmtpConfig::from_env().unwrap();

        assert_eq!(config.host, "smtp.example.com");
        assert_eq!(config.port, 2525);
        assert!(config.use_tls);
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_credentials_need_both_parts() {
        let mut config = SmtpConfig {
            username: Some("user".to_string()),
            ..SmtpConfig::default()
        };
        assert!(config.credentials().is_none());

        config.password = Some("secret".to_string());
        assert!(config.credentials().is_some());
    }

    #[test]
    fn test_build_message_text_only() {
        let message = SmtpBackend::build_message(&summary().text("No new submissions."));
        assert!(message.is_ok());
    }

    #[test]
    fn test_build_message_with_attachments() {
        let email = summary()
            .text("Attached.")
            .attach(Attachment::new(
                "contact.csv",
                "text/csv; charset=ISO-8859-1",
                b"sid;name\n1;Zo\xeb\n".to_vec(),
            ))
            .attach(Attachment::new("survey.csv", "text/csv", b"sid\n2\n".to_vec()));

        let message = SmtpBackend::build_message(&email).unwrap();
        let formatted = String::from_utf8_lossy(&message.formatted()).into_owned();

        assert!(formatted.contains("multipart/mixed"));
        assert!(formatted.contains("contact.csv"));
        assert!(formatted.contains("survey.csv"));
    }

    #[test]
    fn test_build_message_attachments_without_text() {
        let email = summary().attach(Attachment::new("contact.csv", "text/csv", b"sid\n".to_vec()));
        assert!(SmtpBackend::build_message(&email).is_ok());
    }

    #[test]
    fn test_build_message_rejects_invalid_address() {
        let email = Email::new()
            .to("not an address")
            .from("noreply@example.com")
            .subject("Webform summary")
            .text("x");

        assert!(matches!(
            SmtpBackend::build_message(&email),
            Err(EmailError::InvalidAddress(address)) if address == "not an address"
        ));
    }

    #[test]
    fn test_build_message_rejects_invalid_content_type() {
        let email = summary().attach(Attachment::new("contact.csv", "not a mime", Vec::new()));
        assert!(matches!(
            SmtpBackend::build_message(&email),
            Err(EmailError::InvalidContentType(_))
        ));
    }
}
