//! What happened during a mailing run

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::WebformId;
use crate::range::DateRange;

/// Why a webform, file or recipient ended where it did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Email delivered with these attachments
    Sent {
        /// Attached file names
        files: Vec<String>,
    },
    /// Email delivery failed
    SendFailed {
        /// File names that would have been attached
        files: Vec<String>,
        /// Transport error
        reason: String,
    },
    /// Webform had no submissions in range
    NoSubmissions,
    /// Webform had submissions but no recipient to send them to
    NoRecipient,
    /// A summary handler's settings are invalid, so its recipient is not used
    InvalidHandler {
        /// Handler instance id
        handler: String,
        /// Validation errors
        reason: String,
    },
    /// Submissions of a webform could not be queried or loaded
    SourceFailed {
        /// Source error
        reason: String,
    },
    /// The exporter failed
    ExportFailed {
        /// Export error
        reason: String,
    },
    /// The exporter reported success but no file was found
    ExportMissing,
    /// An export file could not be read back
    AttachmentUnreadable {
        /// I/O error
        reason: String,
    },
    /// An export file was empty after transcoding
    AttachmentEmpty,
    /// Recipient had nothing to attach, no email sent
    NoAttachments,
    /// Sending is disabled, no email sent
    Disabled,
    /// A temporary file could not be removed
    CleanupFailed {
        /// I/O error
        reason: String,
    },
}

impl OutcomeKind {
    /// Whether this outcome reports a failure rather than an expected skip
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::SendFailed { .. }
                | Self::InvalidHandler { .. }
                | Self::SourceFailed { .. }
                | Self::ExportFailed { .. }
                | Self::ExportMissing
                | Self::AttachmentUnreadable { .. }
                | Self::CleanupFailed { .. }
        )
    }

    /// Short label used in logs and CLI output
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Sent { .. } => "sent",
            Self::SendFailed { .. } => "send failed",
            Self::NoSubmissions => "no submissions",
            Self::NoRecipient => "no recipient",
            Self::InvalidHandler { .. } => "invalid handler",
            Self::SourceFailed { .. } => "source failed",
            Self::ExportFailed { .. } => "export failed",
            Self::ExportMissing => "export missing",
            Self::AttachmentUnreadable { .. } => "attachment unreadable",
            Self::AttachmentEmpty => "attachment empty",
            Self::NoAttachments => "no attachments",
            Self::Disabled => "disabled",
            Self::CleanupFailed { .. } => "cleanup failed",
        }
    }
}

/// One recorded result of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Recipient concerned, if any
    pub recipient: Option<String>,

    /// Webform concerned, if any
    pub webform: Option<WebformId>,

    /// What happened
    #[serde(flatten)]
    pub kind: OutcomeKind,
}

impl Outcome {
    /// Outcome concerning a whole webform
    #[must_use]
    pub fn webform(webform: &WebformId, kind: OutcomeKind) -> Self {
        Self {
            recipient: None,
            webform: Some(webform.clone()),
            kind,
        }
    }

    /// Outcome concerning one webform's file for one recipient
    #[must_use]
    pub fn file(webform: &WebformId, recipient: &str, kind: OutcomeKind) -> Self {
        Self {
            recipient: Some(recipient.to_string()),
            webform: Some(webform.clone()),
            kind,
        }
    }

    /// Outcome concerning a recipient's email
    #[must_use]
    pub fn recipient(recipient: &str, kind: OutcomeKind) -> Self {
        Self {
            recipient: Some(recipient.to_string()),
            webform: None,
            kind,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.label())?;
        if let Some(webform) = &self.webform {
            write!(f, " webform={webform}")?;
        }
        if let Some(recipient) = &self.recipient {
            write!(f, " recipient={recipient}")?;
        }
        match &self.kind {
            OutcomeKind::Sent { files } => write!(f, " files={}", files.join(", ")),
            OutcomeKind::InvalidHandler { handler, reason } => {
                write!(f, " handler={handler} reason={reason}")
            }
            OutcomeKind::SendFailed { reason, .. }
            | OutcomeKind::SourceFailed { reason }
            | OutcomeKind::ExportFailed { reason }
            | OutcomeKind::AttachmentUnreadable { reason }
            | OutcomeKind::CleanupFailed { reason } => write!(f, " reason={reason}"),
            _ => Ok(()),
        }
    }
}

/// Structured account of one mailing run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Range the run covered
    pub range: DateRange,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Everything recorded, in the order it happened
    pub outcomes: Vec<Outcome>,
}

impl RunReport {
    /// Start an empty report
    #[must_use]
    pub const fn new(range: DateRange, started_at: DateTime<Utc>) -> Self {
        Self {
            range,
            started_at,
            outcomes: Vec::new(),
        }
    }

    /// Record an outcome
    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    /// Number of emails delivered
    #[must_use]
    pub fn emails_sent(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.kind, OutcomeKind::Sent { .. }))
            .count()
    }

    /// Recipients an email was delivered to, in send order
    #[must_use]
    pub fn sent_to(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.kind, OutcomeKind::Sent { .. }))
            .filter_map(|o| o.recipient.as_deref())
            .collect()
    }

    /// Recorded failures
    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| o.kind.is_failure())
    }

    /// Whether nothing failed
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Outcomes recorded for a webform
    pub fn for_webform<'a>(&'a self, webform: &'a WebformId) -> impl Iterator<Item = &'a Outcome> {
        self.outcomes
            .iter()
            .filter(move |o| o.webform.as_ref() == Some(webform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn report() -> RunReport {
        let range = DateRange::single_day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        RunReport::new(range, Utc::now())
    }

    #[test]
    fn test_counts() {
        let mut report = report();
        let contact = WebformId::from("contact");
        report.push(Outcome::webform(&"survey".into(), OutcomeKind::NoSubmissions));
        report.push(Outcome::recipient(
            "r1@x.com",
            OutcomeKind::Sent {
                files: vec!["contact.csv".into()],
            },
        ));
        report.push(Outcome::file(
            &contact,
            "r2@x.com",
            OutcomeKind::ExportFailed {
                reason: "disk full".into(),
            },
        ));

        assert_eq!(report.emails_sent(), 1);
        assert_eq!(report.sent_to(), vec!["r1@x.com"]);
        assert_eq!(report.failures().count(), 1);
        assert!(!report.is_clean());
        assert_eq!(report.for_webform(&contact).count(), 1);
    }

    #[test]
    fn test_outcome_display() {
        let outcome = Outcome::file(
            &"contact".into(),
            "r1@x.com",
            OutcomeKind::CleanupFailed {
                reason: "permission denied".into(),
            },
        );
        assert_eq!(
            outcome.to_string(),
            "cleanup failed webform=contact recipient=r1@x.com reason=permission denied"
        );
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let outcome = Outcome::recipient("fb@x.com", OutcomeKind::Disabled);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"recipient": "fb@x.com", "webform": null, "kind": "disabled"})
        );
    }
}
