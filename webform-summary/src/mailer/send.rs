//! Sending one summary email per recipient

use tokio::fs;
use tracing::{debug, info, warn};

use super::batch::{FileEntry, RecipientBatch};
use super::report::{Outcome, OutcomeKind, RunReport};
use super::Mailer;
use crate::config::SummarySettings;
use crate::email::{Attachment, Email};

fn file_list(files: &[FileEntry]) -> String {
    files
        .iter()
        .map(|entry| entry.display_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Mailer {
    /// Send every recipient of `batch` one email carrying all of their files
    ///
    /// The disable flag is read once from `settings`; when set no email is sent at all.
    pub(super) async fn send_with(
        &self,
        settings: &SummarySettings,
        batch: &RecipientBatch,
        report: &mut RunReport,
    ) {
        if settings.disabled {
            for (recipient, files) in batch.iter() {
                info!(
                    recipient = %recipient,
                    files = %file_list(files),
                    "Sending disabled, summary not sent"
                );
                report.push(Outcome::recipient(recipient, OutcomeKind::Disabled));
            }
            return;
        }

        for (recipient, files) in batch.iter() {
            let attachments = self.attachments(recipient, files, report).await;
            if attachments.is_empty() {
                info!(recipient = %recipient, "Did not send webform summaries (no attachments)");
                report.push(Outcome::recipient(recipient, OutcomeKind::NoAttachments));
                continue;
            }

            let names: Vec<String> = attachments.iter().map(|a| a.filename.clone()).collect();
            let email = Self::summary_email(settings, recipient, attachments);

            match self.sender.send(email).await {
                Ok(()) => {
                    info!(
                        recipient = %recipient,
                        files = %names.join(", "),
                        "Sent webform summaries"
                    );
                    report.push(Outcome::recipient(
                        recipient,
                        OutcomeKind::Sent { files: names },
                    ));
                }
                Err(e) => {
                    warn!(
                        recipient = %recipient,
                        files = %names.join(", "),
                        error = %e,
                        "Could not send webform summaries"
                    );
                    report.push(Outcome::recipient(
                        recipient,
                        OutcomeKind::SendFailed {
                            files: names,
                            reason: e.to_string(),
                        },
                    ));
                }
            }
        }
    }

    async fn attachments(
        &self,
        recipient: &str,
        files: &[FileEntry],
        report: &mut RunReport,
    ) -> Vec<Attachment> {
        let mut attachments = Vec::with_capacity(files.len());
        for entry in files {
            let bytes = match fs::read(&entry.path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        recipient = %recipient,
                        path = %entry.path.display(),
                        error = %e,
                        "Could not read export"
                    );
                    report.push(Outcome::file(
                        &entry.webform,
                        recipient,
                        OutcomeKind::AttachmentUnreadable {
                            reason: e.to_string(),
                        },
                    ));
                    continue;
                }
            };

            let content = self.config.attachments.encoding.transcode(&bytes);
            if content.is_empty() {
                debug!(recipient = %recipient, path = %entry.path.display(), "Export is empty");
                report.push(Outcome::file(&entry.webform, recipient, OutcomeKind::AttachmentEmpty));
                continue;
            }

            attachments.push(Attachment::new(
                entry.display_name.clone(),
                self.config.attachments.encoding.content_type(),
                content,
            ));
        }
        attachments
    }

    fn summary_email(
        settings: &SummarySettings,
        recipient: &str,
        attachments: Vec<Attachment>,
    ) -> Email {
        let mut email = Email::new().to(recipient).subject(settings.subject_line());
        if !settings.sender.trim().is_empty() {
            email = email.from(settings.sender.trim());
        }
        if !settings.body.trim().is_empty() {
            email = email.text(&settings.body);
        }
        attachments.into_iter().fold(email, Email::attach)
    }
}
