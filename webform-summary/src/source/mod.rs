//! Where webforms and their submissions come from
//!
//! A [`SubmissionSource`] answers three questions for the mailer: which webforms exist,
//! which submissions of a webform were completed within a date range, and what those
//! submissions contain. Access checks are explicit: every query names the
//! [`AccessContext`] it runs under, and the mailer always queries as
//! [`AccessContext::System`].

mod fs;
mod memory;

use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Submission, SubmissionId, Webform, WebformId};
use crate::range::DateRange;

pub use fs::JsonDirectorySource;
pub use memory::MemorySource;

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors raised by submission sources
#[derive(Debug, Error)]
pub enum SourceError {
    /// The requested webform does not exist
    #[error("webform not found: {0}")]
    UnknownWebform(WebformId),

    /// A source document could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        /// Document path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A source document is malformed
    #[error("cannot parse {path}: {source}")]
    Parse {
        /// Document path
        path: PathBuf,
        /// Underlying parse failure
        #[source]
        source: serde_json::Error,
    },

    /// The source location is not usable
    #[error("invalid source location: {0}")]
    InvalidLocation(String),
}

/// The identity a submission query runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessContext {
    /// Bypasses access checks and sees every submission
    System,
    /// Sees only the submissions owned by this account
    Account(u64),
}

impl AccessContext {
    /// Whether this identity may see `submission`
    #[must_use]
    pub const fn can_view(&self, submission: &Submission) -> bool {
        match self {
            Self::System => true,
            Self::Account(uid) => submission.uid == *uid,
        }
    }
}

/// A webform whose definition could not be loaded
#[derive(Debug)]
pub struct UnreadableWebform {
    /// Id the webform is stored under
    pub webform: WebformId,
    /// Why it could not be loaded
    pub error: SourceError,
}

/// Result of listing webforms
///
/// A single unreadable webform does not fail the listing; it is reported in
/// `unreadable` and the remaining webforms are still returned.
#[derive(Debug, Default)]
pub struct WebformListing {
    /// Loaded webforms, ordered by id
    pub webforms: Vec<Webform>,
    /// Webforms that exist but could not be loaded
    pub unreadable: Vec<UnreadableWebform>,
}

impl WebformListing {
    /// Whether `webform` was found, loaded or not
    #[must_use]
    pub fn contains(&self, webform: &WebformId) -> bool {
        self.webforms.iter().any(|w| &w.id == webform)
            || self.unreadable.iter().any(|u| &u.webform == webform)
    }
}

/// Abstraction over webform and submission storage
#[async_trait]
pub trait SubmissionSource: Send + Sync {
    /// Load webforms, all of them when `ids` is `None`
    ///
    /// Unknown ids are skipped. Webforms that exist but cannot be loaded are listed as
    /// unreadable; an error is returned only when the storage itself cannot be listed.
    async fn load_webforms(
        &self,
        ids: Option<&BTreeSet<WebformId>>,
    ) -> SourceResult<WebformListing>;

    /// Ids of the completed submissions of `webform` whose completion day lies in `range`
    /// and which `access` may see
    async fn query(
        &self,
        webform: &WebformId,
        range: &DateRange,
        access: AccessContext,
    ) -> SourceResult<Vec<SubmissionId>>;

    /// Load the submissions with the given ids, in stored order
    async fn load(
        &self,
        webform: &WebformId,
        ids: &[SubmissionId],
    ) -> SourceResult<Vec<Submission>>;
}

/// Whether `submission` answers a query for `range` under `access`
pub(crate) fn matches_query(
    submission: &Submission,
    range: &DateRange,
    access: AccessContext,
) -> bool {
    !submission.in_draft && range.contains(&submission.completed) && access.can_view(submission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_access_context() {
        let completed = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let submission = Submission::new(1, "contact", completed).owned_by(5);

        assert!(AccessContext::System.can_view(&submission));
        assert!(AccessContext::Account(5).can_view(&submission));
        assert!(!AccessContext::Account(6).can_view(&submission));
    }

    #[test]
    fn test_matches_query_skips_drafts() {
        let completed = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let range = DateRange::single_day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        let submission = Submission::new(1, "contact", completed);
        assert!(matches_query(&submission, &range, AccessContext::System));
        assert!(!matches_query(&submission.as_draft(), &range, AccessContext::System));
    }
}
