//! Collecting export files across webforms

use std::sync::Arc;

use tokio::fs;
use tracing::{debug, warn};
use validator::Validate;

use super::batch::RecipientBatch;
use super::report::{Outcome, OutcomeKind, RunReport};
use super::request::RunRequest;
use super::writer::write_file;
use super::Mailer;
use crate::columns::ExcludedColumns;
use crate::config::SummarySettings;
use crate::error::{SummaryError, SummaryResult};
use crate::export::ExportOptions;
use crate::model::{Submission, Webform};
use crate::source::{AccessContext, SourceError};

impl Mailer {
    /// Write the exports of a run and group them by recipient
    ///
    /// Only failures that keep the whole run from starting, such as invalid summary
    /// settings, are returned as errors. A webform that cannot be queried, loaded or
    /// exported is recorded on `report` and left out of the batch. So is a summary handler
    /// whose settings do not validate.
    pub(super) async fn collect_with(
        &self,
        settings: &SummarySettings,
        request: &RunRequest,
        report: &mut RunReport,
    ) -> SummaryResult<RecipientBatch> {
        settings.validate()?;

        fs::create_dir_all(&self.config.temp_dir)
            .await
            .map_err(|source| SummaryError::TempDir {
                path: self.config.temp_dir.clone(),
                source,
            })?;

        let options = ExportOptions::new(request.range(), &self.config.temp_dir)
            .with_delimiter(self.config.delimiter_byte()?)
            .with_excluded_columns(ExcludedColumns::base(
                request.excluded_columns().iter().cloned(),
            ));

        let fallback = settings
            .fallback_recipient()
            .filter(|_| request.use_fallback());

        let listing = self.source.load_webforms(request.selected_webforms()).await?;
        for unreadable in &listing.unreadable {
            report.push(Outcome::webform(
                &unreadable.webform,
                OutcomeKind::SourceFailed {
                    reason: unreadable.error.to_string(),
                },
            ));
        }
        if let Some(selected) = request.selected_webforms() {
            for missing in selected.iter().filter(|id| !listing.contains(id)) {
                warn!(webform = %missing, "Selected webform not found");
                report.push(Outcome::webform(
                    missing,
                    OutcomeKind::SourceFailed {
                        reason: SourceError::UnknownWebform(missing.clone()).to_string(),
                    },
                ));
            }
        }

        let mut batch = RecipientBatch::new();
        if let Some(fallback) = fallback {
            batch.seed(fallback);
        }

        for webform in &listing.webforms {
            self.collect_webform(webform, &options, fallback, &mut batch, report)
                .await;
        }

        Ok(batch)
    }

    async fn collect_webform(
        &self,
        webform: &Webform,
        options: &ExportOptions,
        fallback: Option<&str>,
        batch: &mut RecipientBatch,
        report: &mut RunReport,
    ) {
        let source_failed = |e: SourceError| OutcomeKind::SourceFailed {
            reason: e.to_string(),
        };

        let ids = match self
            .source
            .query(&webform.id, &options.range, AccessContext::System)
            .await
        {
            Ok(ids) => ids,
            Err(e) => {
                warn!(webform = %webform.id, error = %e, "Could not query submissions");
                report.push(Outcome::webform(&webform.id, source_failed(e)));
                return;
            }
        };

        if ids.is_empty() {
            debug!(webform = %webform.id, range = %options.range, "No submissions in range");
            report.push(Outcome::webform(&webform.id, OutcomeKind::NoSubmissions));
            return;
        }

        let submissions: Arc<[Submission]> = match self.source.load(&webform.id, &ids).await {
            Ok(submissions) => submissions.into(),
            Err(e) => {
                warn!(webform = %webform.id, error = %e, "Could not load submissions");
                report.push(Outcome::webform(&webform.id, source_failed(e)));
                return;
            }
        };

        let mut handled = false;
        for handler in webform.summary_handlers() {
            let Some(recipient) = handler.settings.recipient() else {
                continue;
            };
            if let Err(errors) = handler.settings.validate() {
                warn!(
                    webform = %webform.id,
                    handler = %handler.handler_id,
                    recipient = %recipient,
                    "Ignoring summary handler with invalid settings"
                );
                report.push(Outcome::file(
                    &webform.id,
                    recipient,
                    OutcomeKind::InvalidHandler {
                        handler: handler.handler_id.clone(),
                        reason: errors.to_string(),
                    },
                ));
                continue;
            }
            handled = true;

            let handler_options = options
                .clone()
                .with_excluded_columns(options.excluded_columns.for_handler(&handler.settings));
            if let Some(entry) = write_file(
                &self.exporter,
                webform,
                &submissions,
                &handler_options,
                recipient,
                report,
            )
            .await
            {
                batch.add(recipient, entry);
            }
        }

        if handled {
            return;
        }

        match fallback {
            Some(recipient) => {
                if let Some(entry) = write_file(
                    &self.exporter,
                    webform,
                    &submissions,
                    options,
                    recipient,
                    report,
                )
                .await
                {
                    batch.add(recipient, entry);
                }
            }
            None => {
                debug!(webform = %webform.id, "No handler recipient and no fallback");
                report.push(Outcome::webform(&webform.id, OutcomeKind::NoRecipient));
            }
        }
    }
}
