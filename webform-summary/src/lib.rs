//! webform-summary: periodic CSV summaries of webform submissions, delivered by email
//!
//! A mailing run collects the submissions completed within a date range for a set of
//! webforms, writes one CSV export per (webform, recipient) pair and sends every recipient a
//! single email carrying all of their exports. Recipients come from summary handlers attached
//! to each webform, with a configurable fallback address for webforms that have none.
//!
//! # Components
//!
//! - [`source`]: where webforms and submissions come from ([`SubmissionSource`])
//! - [`export`]: CSV rendering of submissions ([`SubmissionExporter`], [`CsvExporter`])
//! - [`email`]: outbound transport ([`EmailSender`], SMTP and console backends)
//! - [`mailer`]: the collect, send and cleanup workflow ([`Mailer`])
//! - [`config`]: layered configuration and the persisted summary settings
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use webform_summary::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     webform_summary::observability::init()?;
//!
//!     let config = MailerConfig::load_for_service("webform-summary")?;
//!     let source = JsonDirectorySource::new(config.data_dir.clone())?;
//!     let sender = SmtpBackend::new(config.transport.smtp.clone());
//!
//!     let mailer = Mailer::new(config, Arc::new(source), Arc::new(sender));
//!     let report = mailer.run(&RunRequest::new(DateRange::today())).await?;
//!
//!     tracing::info!(sent = report.emails_sent(), "Mailing finished");
//!     Ok(())
//! }
//! ```

#![allow(clippy::missing_errors_doc)]

pub mod columns;
pub mod config;
pub mod email;
pub mod error;
pub mod export;
pub mod mailer;
pub mod model;
pub mod observability;
pub mod range;
pub mod source;
pub mod testing;

pub use error::{SummaryError, SummaryResult};
pub use export::{CsvExporter, ExportOptions, SubmissionExporter};
pub use mailer::Mailer;
pub use source::SubmissionSource;
pub use email::EmailSender;

pub mod prelude {
    //! Convenience re-exports for embedding a mailing run
    //!
    //! ```rust
    //! use webform_summary::prelude::*;
    //! ```

    pub use crate::columns::ExcludedColumns;
    pub use crate::config::{AttachmentEncoding, MailerConfig, SummarySettings, TransportKind};
    pub use crate::email::{
        Attachment, ConsoleBackend, Email, EmailError, EmailSender, SmtpBackend, SmtpConfig,
    };
    pub use crate::error::{SummaryError, SummaryResult};
    pub use crate::export::{CsvExporter, ExportOptions, SubmissionExporter};
    pub use crate::mailer::{
        FileEntry, Mailer, Outcome, OutcomeKind, RecipientBatch, RunReport, RunRequest,
    };
    pub use crate::model::{Submission, SummaryHandlerSettings, Webform, WebformHandler, WebformId};
    pub use crate::range::DateRange;
    pub use crate::source::{
        AccessContext, JsonDirectorySource, MemorySource, SubmissionSource, WebformListing,
    };
}
