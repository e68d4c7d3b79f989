//! Testing utilities
//!
//! [`RecordingEmailSender`] captures emails instead of sending them, and can be told to
//! fail for chosen recipients. Together with [`MemorySource`](crate::source::MemorySource)
//! it runs a complete mailing in memory and on a temporary directory.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;

use crate::email::{Email, EmailError, EmailSender};

/// Email sender that records every email it is given
///
/// # Examples
///
/// ```rust
/// use webform_summary::email::{Email, EmailSender};
/// use webform_summary::testing::RecordingEmailSender;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sender = RecordingEmailSender::new();
///
/// let email = Email::new()
///     .to("office@example.com")
///     .from("noreply@example.com")
///     .subject("Webform summary")
///     .text("Hello");
///
/// sender.send(email).await?;
///
/// assert_eq!(sender.sent_count(), 1);
/// assert!(sender.was_sent_to("office@example.com"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingEmailSender {
    sent: Arc<Mutex<Vec<Email>>>,
    failing: Arc<Mutex<BTreeSet<String>>>,
}

impl RecordingEmailSender {
    /// Create a sender that accepts everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject emails addressed to `recipient`
    #[must_use]
    pub fn failing_for(self, recipient: &str) -> Self {
        self.failing.lock().insert(recipient.to_string());
        self
    }

    /// Number of emails accepted
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// All accepted emails, in send order
    #[must_use]
    pub fn sent_emails(&self) -> Vec<Email> {
        self.sent.lock().clone()
    }

    /// Accepted emails addressed to `recipient`
    #[must_use]
    pub fn emails_to(&self, recipient: &str) -> Vec<Email> {
        self.sent
            .lock()
            .iter()
            .filter(|email| email.to.iter().any(|to| to == recipient))
            .cloned()
            .collect()
    }

    /// Whether an email to `recipient` was accepted
    #[must_use]
    pub fn was_sent_to(&self, recipient: &str) -> bool {
        !self.emails_to(recipient).is_empty()
    }

    /// Forget the accepted emails
    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, email: Email) -> Result<(), EmailError> {
        email.validate()?;

        let failing = self.failing.lock();
        if let Some(recipient) = email.to.iter().find(|to| failing.contains(*to)) {
            return Err(EmailError::rejected(format!("{recipient} is configured to fail")));
        }
        drop(failing);

        self.sent.lock().push(email);
        Ok(())
    }
}

/// Midday UTC on the given day
///
/// # Panics
///
/// Panics if the date does not exist
#[must_use]
pub fn at_noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(|| panic!("invalid date {year}-{month}-{day}"))
}
