//! Console backend for development
//!
//! Prints emails to the console instead of sending them.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::email::{Email, EmailError, EmailSender};

/// Console email backend for development
///
/// Logs emails instead of sending them, so a mailing run can be rehearsed without an
/// SMTP relay.
///
/// # Examples
///
/// ```rust
/// use webform_summary::email::{ConsoleBackend, Email, EmailSender};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = ConsoleBackend::new();
///
/// let email = Email::new()
///     .to("office@example.com")
///     .from("noreply@example.com")
///     .subject("Webform summary")
///     .text("No new submissions.");
///
/// backend.send(email).await?; // Prints to console
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConsoleBackend {
    /// Whether to log email content in debug mode
    verbose: bool,
}

impl ConsoleBackend {
    /// Create a new console backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a verbose console backend that also logs attachment content
    #[must_use]
    pub const fn verbose() -> Self {
        Self { verbose: true }
    }
}

#[async_trait]
impl EmailSender for ConsoleBackend {
    async fn send(&self, email: Email) -> Result<(), EmailError> {
        email.validate()?;

        let from = email.from.as_ref().ok_or(EmailError::NoSender)?;
        let subject = email.subject.as_ref().ok_or(EmailError::NoSubject)?;

        info!(
            from = %from,
            to = ?email.to,
            subject = %subject,
            attachments = email.attachments.len(),
            "Console email sent"
        );

        if self.verbose {
            for attachment in &email.attachments {
                debug!(
                    filename = %attachment.filename,
                    content_type = %attachment.content_type,
                    content = %String::from_utf8_lossy(&attachment.content),
                    "Email attachment"
                );
            }
        }

        println!("\n╭─────────────────────────────────────────────────────╮");
        println!("│ 📧 Console Email                                     │");
        println!("├─────────────────────────────────────────────────────┤");
        println!("│ From:    {from:<43} │");
        println!("│ To:      {:<43} │", email.to.join(", "));
        println!("│ Subject: {subject:<43} │");
        println!("├─────────────────────────────────────────────────────┤");

        if let Some(text) = &email.text {
            for line in text.lines() {
                let truncated: String = line.chars().take(51).collect();
                println!("│ {truncated:<51} │");
            }
            println!("├─────────────────────────────────────────────────────┤");
        }

        for attachment in &email.attachments {
            let label = format!("📎 {} ({} bytes)", attachment.filename, attachment.len());
            println!("│ {label:<51} │");
        }

        println!("╰─────────────────────────────────────────────────────╯\n");

        Ok(())
    }
}
