//! The mailing run
//!
//! A run goes through three phases, all under one snapshot of the summary settings:
//!
//! 1. **Collect**: for every selected webform with submissions in range, write one CSV
//!    export per handler recipient (or one for the fallback recipient) and group the files
//!    by recipient in a [`RecipientBatch`]
//! 2. **Send**: email every recipient once, attaching all of their files
//! 3. **Cleanup**: remove the temporary files, whatever happened before
//!
//! Nothing scoped to a single webform, file or recipient aborts the run. Each skip and
//! failure is recorded as an [`Outcome`] on the returned [`RunReport`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chrono::Utc;
//! use webform_summary::prelude::*;
//!
//! # async fn example() -> SummaryResult<()> {
//! let config = MailerConfig::load_for_service("webform-summary")?;
//! let source = JsonDirectorySource::new(config.data_dir.clone())?;
//! let mailer = Mailer::new(config, Arc::new(source), Arc::new(ConsoleBackend::new()));
//!
//! let yesterday = DateRange::previous_day(Utc::now().date_naive());
//! let report = mailer.run(&RunRequest::new(yesterday)).await?;
//! for outcome in &report.outcomes {
//!     println!("{outcome}");
//! }
//! # Ok(())
//! # }
//! ```

mod batch;
mod cleanup;
mod collect;
mod encoding;
mod report;
mod request;
mod send;
mod writer;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::{MailerConfig, SummarySettings};
use crate::email::EmailSender;
use crate::error::SummaryResult;
use crate::export::{CsvExporter, SubmissionExporter};
use crate::model::WebformId;
use crate::range::DateRange;
use crate::source::SubmissionSource;

pub use batch::{FileEntry, RecipientBatch};
pub use cleanup::cleanup;
pub use encoding::AttachmentEncoding;
pub use report::{Outcome, OutcomeKind, RunReport};
pub use request::RunRequest;

/// Runs mailings of webform submission summaries
pub struct Mailer {
    config: MailerConfig,
    settings: RwLock<SummarySettings>,
    source: Arc<dyn SubmissionSource>,
    sender: Arc<dyn EmailSender>,
    exporter: Arc<dyn SubmissionExporter>,
}

impl Mailer {
    /// Create a mailer exporting with [`CsvExporter`]
    ///
    /// `config.settings` become the initial summary settings.
    #[must_use]
    pub fn new(
        config: MailerConfig,
        source: Arc<dyn SubmissionSource>,
        sender: Arc<dyn EmailSender>,
    ) -> Self {
        let settings = RwLock::new(config.settings.clone());
        Self {
            config,
            settings,
            source,
            sender,
            exporter: Arc::new(CsvExporter::new()),
        }
    }

    /// Replace the exporter
    #[must_use]
    pub fn with_exporter(mut self, exporter: Arc<dyn SubmissionExporter>) -> Self {
        self.exporter = exporter;
        self
    }

    /// Copy of the current summary settings
    #[must_use]
    pub fn settings(&self) -> SummarySettings {
        self.settings.read().clone()
    }

    /// Replace the summary settings
    ///
    /// A run already in progress keeps the settings it started with.
    pub fn update_settings(&self, settings: SummarySettings) {
        *self.settings.write() = settings;
    }

    /// Run a mailing: collect, send, then clean up
    ///
    /// # Errors
    ///
    /// Returns an error if the summary settings are invalid, the temporary directory cannot
    /// be created, the configured delimiter is unusable or the webforms cannot be listed.
    /// Nothing has been sent or written in that case.
    pub async fn run(&self, request: &RunRequest) -> SummaryResult<RunReport> {
        let settings = self.settings();
        let mut report = RunReport::new(request.range(), Utc::now());
        info!(
            range = %request.range(),
            fallback = request.use_fallback(),
            "Starting webform summary run"
        );

        let batch = self.collect_with(&settings, request, &mut report).await?;
        debug!(
            recipients = batch.len(),
            files = batch.file_count(),
            "Collected webform exports"
        );

        self.send_with(&settings, &batch, &mut report).await;
        for outcome in cleanup(&batch).await {
            report.push(outcome);
        }

        info!(
            range = %request.range(),
            sent = report.emails_sent(),
            failures = report.failures().count(),
            "Webform summary run finished"
        );
        Ok(report)
    }

    /// Collect phase on its own: write the exports and group them by recipient
    ///
    /// The caller owns the files of the returned batch; pass it to [`cleanup`] when done.
    pub async fn collect(
        &self,
        request: &RunRequest,
        report: &mut RunReport,
    ) -> SummaryResult<RecipientBatch> {
        let settings = self.settings();
        self.collect_with(&settings, request, report).await
    }

    /// Send phase on its own: email every recipient of `batch`
    pub async fn send(&self, batch: &RecipientBatch, report: &mut RunReport) {
        let settings = self.settings();
        self.send_with(&settings, batch, report).await;
    }

    /// Mail a closed webform's whole history up to `today`
    ///
    /// Does nothing and returns `None` unless sending on close is enabled.
    pub async fn send_on_close(
        &self,
        webform: impl Into<WebformId> + Send,
        today: NaiveDate,
    ) -> SummaryResult<Option<RunReport>> {
        let webform = webform.into();
        if !self.settings.read().close_send_data {
            debug!(webform = %webform, "Sending on close is disabled");
            return Ok(None);
        }

        info!(webform = %webform, "Webform closed, sending its submissions");
        let request = RunRequest::new(DateRange::until(today)).webform(webform);
        self.run(&request).await.map(Some)
    }
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("temp_dir", &self.config.temp_dir)
            .field("settings", &*self.settings.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::{EmailError, MockEmailSender};
    use crate::error::SummaryError;
    use crate::model::{Submission, SummaryHandlerSettings, Webform, WebformHandler};
    use crate::source::MemorySource;
    use chrono::TimeZone;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn source() -> MemorySource {
        let completed = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        MemorySource::new().with_webform(
            Webform::new("contact")
                .with_elements(["name"])
                .with_handler(WebformHandler::summary(
                    "summary",
                    SummaryHandlerSettings::new("r1@x.com"),
                )),
            vec![Submission::new(1, "contact", completed).with_value("name", "Alice")],
        )
    }

    fn config(dir: &std::path::Path) -> MailerConfig {
        let mut config = MailerConfig {
            temp_dir: dir.to_path_buf(),
            ..MailerConfig::default()
        };
        config.settings.sender = "noreply@x.com".to_string();
        config
    }

    #[tokio::test]
    async fn test_disabled_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.settings.disabled = true;

        let mut sender = MockEmailSender::new();
        sender.expect_send().times(0);

        let mailer = Mailer::new(config, Arc::new(source()), Arc::new(sender));
        let report = mailer.run(&RunRequest::new(DateRange::single_day(day()))).await.unwrap();

        assert_eq!(report.emails_sent(), 0);
        assert!(report.outcomes.iter().any(|o| {
            o.kind == OutcomeKind::Disabled && o.recipient.as_deref() == Some("r1@x.com")
        }));
        assert!(!dir.path().join("contact_r1@x.com.csv").exists());
    }

    #[tokio::test]
    async fn test_send_failure_is_reported_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();

        let mut sender = MockEmailSender::new();
        sender
            .expect_send()
            .times(1)
            .returning(|_| Err(EmailError::smtp("connection refused")));

        let mailer = Mailer::new(config(dir.path()), Arc::new(source()), Arc::new(sender));
        let report = mailer.run(&RunRequest::new(DateRange::single_day(day()))).await.unwrap();

        assert_eq!(report.emails_sent(), 0);
        assert!(matches!(
            &report.failures().next().unwrap().kind,
            OutcomeKind::SendFailed { files, .. } if files == &vec!["contact.csv".to_string()]
        ));
        assert!(!dir.path().join("contact_r1@x.com.csv").exists());
    }

    #[tokio::test]
    async fn test_email_carries_settings_and_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.settings.subject = "Daily summary".to_string();
        config.settings.body = "See attached.".to_string();

        let mut sender = MockEmailSender::new();
        sender
            .expect_send()
            .withf(|email| {
                email.to == vec!["r1@x.com".to_string()]
                    && email.from.as_deref() == Some("noreply@x.com")
                    && email.subject.as_deref() == Some("Daily summary")
                    && email.text.as_deref() == Some("See attached.")
                    && email.attachments.len() == 1
                    && email.attachments[0].filename == "contact.csv"
                    && email.attachments[0].content_type == "text/csv; charset=ISO-8859-1"
            })
            .times(1)
            .returning(|_| Ok(()));

        let mailer = Mailer::new(config, Arc::new(source()), Arc::new(sender));
        let report = mailer.run(&RunRequest::new(DateRange::single_day(day()))).await.unwrap();

        assert_eq!(report.sent_to(), vec!["r1@x.com"]);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_update_settings_applies_to_later_runs() {
        let dir = tempfile::tempdir().unwrap();

        let mut sender = MockEmailSender::new();
        sender.expect_send().times(1).returning(|_| Ok(()));

        let mailer = Mailer::new(config(dir.path()), Arc::new(source()), Arc::new(sender));
        let request = RunRequest::new(DateRange::single_day(day()));
        assert_eq!(mailer.run(&request).await.unwrap().emails_sent(), 1);

        let mut settings = mailer.settings();
        settings.disabled = true;
        mailer.update_settings(settings);

        assert_eq!(mailer.run(&request).await.unwrap().emails_sent(), 0);
    }

    #[tokio::test]
    async fn test_send_on_close_requires_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut sender = MockEmailSender::new();
        sender.expect_send().times(0);

        let mailer = Mailer::new(config(dir.path()), Arc::new(source()), Arc::new(sender));
        let result = mailer.send_on_close("contact", day()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_invalid_delimiter_stops_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.delimiter = '§';

        let mut sender = MockEmailSender::new();
        sender.expect_send().times(0);

        let mailer = Mailer::new(config, Arc::new(source()), Arc::new(sender));
        let result = mailer.run(&RunRequest::new(DateRange::single_day(day()))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_sender_stops_the_run_before_exporting() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.settings.sender = "not-an-address".to_string();

        let mut sender = MockEmailSender::new();
        sender.expect_send().times(0);

        let mailer = Mailer::new(config, Arc::new(source()), Arc::new(sender));
        let result = mailer.run(&RunRequest::new(DateRange::single_day(day()))).await;

        assert!(matches!(result, Err(SummaryError::InvalidSettings(_))));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_handler_recipient_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.settings.fallback_email = Some("fb@x.com".to_string());

        let completed = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let source = MemorySource::new().with_webform(
            Webform::new("contact")
                .with_elements(["name"])
                .with_handler(WebformHandler::summary(
                    "summary",
                    SummaryHandlerSettings::new("not-an-address"),
                )),
            vec![Submission::new(1, "contact", completed).with_value("name", "Alice")],
        );

        let mut sender = MockEmailSender::new();
        sender
            .expect_send()
            .withf(|email| email.to == vec!["fb@x.com".to_string()])
            .times(1)
            .returning(|_| Ok(()));

        let mailer = Mailer::new(config, Arc::new(source), Arc::new(sender));
        let report = mailer.run(&RunRequest::new(DateRange::single_day(day()))).await.unwrap();

        assert_eq!(report.sent_to(), vec!["fb@x.com"]);
        let invalid = report
            .outcomes
            .iter()
            .find(|o| matches!(o.kind, OutcomeKind::InvalidHandler { .. }))
            .unwrap();
        assert_eq!(invalid.recipient.as_deref(), Some("not-an-address"));
        assert!(matches!(
            &invalid.kind,
            OutcomeKind::InvalidHandler { handler, .. } if handler == "summary"
        ));
    }
}
