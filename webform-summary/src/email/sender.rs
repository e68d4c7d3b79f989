//! Email sender trait abstraction

use async_trait::async_trait;

use super::{Email, EmailError};

/// Trait for sending emails
///
/// Implemented by the SMTP and console backends, and by test doubles.
///
/// # Examples
///
/// ```rust,no_run
/// use webform_summary::email::{Email, EmailSender, SmtpBackend};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sender = SmtpBackend::from_env()?;
///
/// let email = Email::new()
///     .to("office@example.com")
///     .from("noreply@example.com")
///     .subject("Webform summary")
///     .text("No new submissions.");
///
/// sender.send(email).await?;
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send an email
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the email cannot be sent or is invalid
    async fn send(&self, email: Email) -> Result<(), EmailError>;
}
