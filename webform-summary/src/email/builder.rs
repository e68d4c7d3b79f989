//! Email builder with fluent API

use serde::{Deserialize, Serialize};

use super::EmailError;

/// A file attached to an email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name shown to the recipient
    pub filename: String,

    /// MIME type, including any charset parameter
    pub content_type: String,

    /// Raw file content
    pub content: Vec<u8>,
}

impl Attachment {
    /// Create an attachment
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content,
        }
    }

    /// Attachment size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the attachment has no content
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// An email message
///
/// ```rust
/// use webform_summary::email::{Attachment, Email};
///
/// let email = Email::new()
///     .to("office@example.com")
///     .from("noreply@example.com")
///     .subject("Webform summary")
///     .attach(Attachment::new("contact.csv", "text/csv", b"sid\n1\n".to_vec()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// Email recipients (To)
    pub to: Vec<String>,

    /// Email sender (From)
    pub from: Option<String>,

    /// Email subject
    pub subject: Option<String>,

    /// Plain text body
    pub text: Option<String>,

    /// Attached files, in attachment order
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// Create a new empty email
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recipient (To)
    #[must_use]
    pub fn to(mut self, address: &str) -> Self {
        self.to.push(address.to_string());
        self
    }

    /// Set the sender (From)
    #[must_use]
    pub fn from(mut self, address: &str) -> Self {
        self.from = Some(address.to_string());
        self
    }

    /// Set the email subject
    #[must_use]
    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    /// Set the plain text body
    #[must_use]
    pub fn text(mut self, body: &str) -> Self {
        self.text = Some(body.to_string());
        self
    }

    /// Attach a file
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Validate the email
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// - No recipients
    /// - No sender
    /// - No subject
    /// - Neither a text body nor attachments
    pub fn validate(&self) -> Result<(), EmailError> {
        if self.to.is_empty() {
            return Err(EmailError::NoRecipients);
        }

        if self.from.is_none() {
            return Err(EmailError::NoSender);
        }

        if self.subject.is_none() {
            return Err(EmailError::NoSubject);
        }

        if self.text.is_none() && self.attachments.is_empty() {
            return Err(EmailError::NoContent);
        }

        Ok(())
    }
}
