//! In-process submission source

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{
    matches_query, AccessContext, SourceError, SourceResult, SubmissionSource, WebformListing,
};
use crate::model::{Submission, SubmissionId, Webform, WebformId};
use crate::range::DateRange;

#[derive(Debug, Clone)]
struct Entry {
    webform: Webform,
    submissions: Vec<Submission>,
}

/// Submission source holding webforms and submissions in memory
///
/// # Examples
///
/// ```rust
/// use chrono::Utc;
/// use webform_summary::model::{Submission, Webform};
/// use webform_summary::source::MemorySource;
///
/// let source = MemorySource::new().with_webform(
///     Webform::new("contact"),
///     vec![Submission::new(1, "contact", Utc::now())],
/// );
/// ```
#[derive(Debug, Default)]
pub struct MemorySource {
    entries: RwLock<BTreeMap<WebformId, Entry>>,
}

impl MemorySource {
    /// Create an empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a webform together with its submissions
    #[must_use]
    pub fn with_webform(self, webform: Webform, submissions: Vec<Submission>) -> Self {
        self.insert_webform(webform, submissions);
        self
    }

    /// Add or replace a webform together with its submissions
    pub fn insert_webform(&self, webform: Webform, submissions: Vec<Submission>) {
        self.entries.write().insert(
            webform.id.clone(),
            Entry {
                webform,
                submissions,
            },
        );
    }

    /// Append a submission to an existing webform
    pub fn add_submission(&self, submission: Submission) -> SourceResult<()> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(&submission.webform_id)
            .ok_or_else(|| SourceError::UnknownWebform(submission.webform_id.clone()))?;
        entry.submissions.push(submission);
        Ok(())
    }
}

#[async_trait]
impl SubmissionSource for MemorySource {
    async fn load_webforms(
        &self,
        ids: Option<&BTreeSet<WebformId>>,
    ) -> SourceResult<WebformListing> {
        let entries = self.entries.read();
        let webforms = entries
            .values()
            .filter(|entry| ids.is_none_or(|ids| ids.contains(&entry.webform.id)))
            .map(|entry| entry.webform.clone())
            .collect();
        Ok(WebformListing {
            webforms,
            unreadable: Vec::new(),
        })
    }

    async fn query(
        &self,
        webform: &WebformId,
        range: &DateRange,
        access: AccessContext,
    ) -> SourceResult<Vec<SubmissionId>> {
        let entries = self.entries.read();
        let entry = entries
            .get(webform)
            .ok_or_else(|| SourceError::UnknownWebform(webform.clone()))?;
        Ok(entry
            .submissions
            .iter()
            .filter(|submission| matches_query(submission, range, access))
            .map(|submission| submission.sid)
            .collect())
    }

    async fn load(
        &self,
        webform: &WebformId,
        ids: &[SubmissionId],
    ) -> SourceResult<Vec<Submission>> {
        let entries = self.entries.read();
        let entry = entries
            .get(webform)
            .ok_or_else(|| SourceError::UnknownWebform(webform.clone()))?;
        Ok(entry
            .submissions
            .iter()
            .filter(|submission| ids.contains(&submission.sid))
            .cloned()
            .collect())
    }
}
