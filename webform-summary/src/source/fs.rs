//! Filesystem submission source
//!
//! Reads one JSON document per webform from a directory:
//!
//! ```text
//! webforms/
//! ├── contact.json
//! └── newsletter.json
//! ```
//!
//! Each document holds the webform definition and its submissions:
//!
//! ```json
//! {
//!   "id": "contact",
//!   "title": "Contact",
//!   "elements": ["name", "email", "message"],
//!   "handlers": [
//!     {
//!       "handler_id": "summary",
//!       "plugin_id": "mail_summary_handler",
//!       "settings": { "recipient_mail": "office@example.com", "metadata": false }
//!     }
//!   ],
//!   "submissions": [
//!     { "sid": 1, "completed": "2024-03-01T09:30:00Z", "data": { "name": "Alice" } }
//!   ]
//! }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use super::{
    matches_query, AccessContext, SourceError, SourceResult, SubmissionSource, UnreadableWebform,
    WebformListing,
};
use crate::model::{Submission, SubmissionId, Webform, WebformId};
use crate::range::DateRange;

#[derive(Debug, Deserialize)]
struct WebformDocument {
    #[serde(flatten)]
    webform: Webform,

    #[serde(default)]
    submissions: Vec<Submission>,
}

/// Submission source backed by a directory of webform documents
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    base_path: PathBuf,
}

impl JsonDirectorySource {
    /// Create a source reading from `base_path`
    ///
    /// # Errors
    ///
    /// Returns an error if `base_path` exists but is not a directory
    pub fn new(base_path: PathBuf) -> SourceResult<Self> {
        if base_path.exists() && !base_path.is_dir() {
            return Err(SourceError::InvalidLocation(format!(
                "{} is not a directory",
                base_path.display()
            )));
        }

        Ok(Self { base_path })
    }

    fn document_path(&self, webform: &WebformId) -> PathBuf {
        self.base_path.join(format!("{webform}.json"))
    }

    async fn read_document(path: &Path) -> SourceResult<WebformDocument> {
        let raw = fs::read(path).await.map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut document: WebformDocument =
            serde_json::from_slice(&raw).map_err(|source| SourceError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        for submission in &mut document.submissions {
            if submission.webform_id.as_str().is_empty() {
                submission.webform_id = document.webform.id.clone();
            }
        }
        Ok(document)
    }

    /// Every `*.json` document in the base directory, keyed by file stem
    async fn document_paths(&self) -> SourceResult<Vec<(WebformId, PathBuf)>> {
        let read_error = |source| SourceError::Read {
            path: self.base_path.clone(),
            source,
        };

        let mut entries = fs::read_dir(&self.base_path).await.map_err(read_error)?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                paths.push((WebformId::from(stem), path));
            }
        }
        Ok(paths)
    }

    async fn document(&self, webform: &WebformId) -> SourceResult<WebformDocument> {
        let path = self.document_path(webform);
        if !path.exists() {
            return Err(SourceError::UnknownWebform(webform.clone()));
        }
        Self::read_document(&path).await
    }
}

#[async_trait]
impl SubmissionSource for JsonDirectorySource {
    async fn load_webforms(
        &self,
        ids: Option<&BTreeSet<WebformId>>,
    ) -> SourceResult<WebformListing> {
        let mut listing = WebformListing::default();
        if !self.base_path.exists() {
            return Ok(listing);
        }

        let paths: Vec<(WebformId, PathBuf)> = match ids {
            Some(ids) => ids
                .iter()
                .map(|id| (id.clone(), self.document_path(id)))
                .filter(|(_, path)| path.exists())
                .collect(),
            None => self.document_paths().await?,
        };

        for (id, path) in paths {
            match Self::read_document(&path).await {
                Ok(document) => listing.webforms.push(document.webform),
                Err(error) => {
                    warn!(
                        webform = %id,
                        path = %path.display(),
                        error = %error,
                        "Skipping unreadable webform"
                    );
                    listing.unreadable.push(UnreadableWebform { webform: id, error });
                }
            }
        }

        listing.webforms.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(listing)
    }

    async fn query(
        &self,
        webform: &WebformId,
        range: &DateRange,
        access: AccessContext,
    ) -> SourceResult<Vec<SubmissionId>> {
        let document = self.document(webform).await?;
        Ok(document
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
        let document = self.document(webform).await?;
        Ok(document
            .submissions
            .into_iter()
            .filter(|submission| ids.contains(&submission.sid))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const CONTACT: &str = r#"{
        "id": "contact",
        "title": "Contact",
        "elements": ["name"],
        "handlers": [
            {"handler_id": "summary", "plugin_id": "mail_summary_handler",
             "settings": {"recipient_mail": "r1@x.com"}}
        ],
        "submissions": [
            {"sid": 1, "completed": "2024-03-01T09:30:00Z", "data": {"name": "Alice"}},
            {"sid": 2, "completed": "2024-03-05T09:30:00Z", "data": {"name": "Bob"}}
        ]
    }"#;

    async fn source_with(files: &[(&str, &str)]) -> (TempDir, JsonDirectorySource) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).await.unwrap();
        }
        let source = JsonDirectorySource::new(dir.path().to_path_buf()).unwrap();
        (dir, source)
    }

    #[tokio::test]
    async fn test_load_webforms_reads_json_documents_only() {
        let (_dir, source) = source_with(&[
            ("contact.json", CONTACT),
            ("survey.json", r#"{"id": "survey"}"#),
            ("notes.txt", "ignored"),
        ])
        .await;

        let listing = source.load_webforms(None).await.unwrap();
        let ids: Vec<_> = listing.webforms.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["contact", "survey"]);
        assert_eq!(listing.webforms[0].summary_handlers().count(), 1);
        assert!(listing.unreadable.is_empty());
    }

    #[tokio::test]
    async fn test_query_and_load() {
        let (_dir, source) = source_with(&[("contact.json", CONTACT)]).await;
        let contact = WebformId::from("contact");
        let range = DateRange::single_day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        let ids = source.query(&contact, &range, AccessContext::System).await.unwrap();
        assert_eq!(ids, vec![1]);

        let submissions = source.load(&contact, &ids).await.unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].webform_id, contact);
        assert_eq!(submissions[0].column_value("name"), "Alice");
    }

    #[tokio::test]
    async fn test_missing_document_is_unknown_webform() {
        let (_dir, source) = source_with(&[]).await;
        let range = DateRange::single_day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let result = source.query(&"contact".into(), &range, AccessContext::System).await;
        assert!(matches!(result, Err(SourceError::UnknownWebform(_))));
    }

    #[tokio::test]
    async fn test_malformed_document_is_listed_as_unreadable() {
        let (_dir, source) =
            source_with(&[("contact.json", CONTACT), ("broken.json", "{ not json")]).await;

        let listing = source.load_webforms(None).await.unwrap();
        assert_eq!(listing.webforms.len(), 1);
        assert_eq!(listing.webforms[0].id.as_str(), "contact");
        assert_eq!(listing.unreadable.len(), 1);
        assert_eq!(listing.unreadable[0].webform.as_str(), "broken");
        assert!(matches!(listing.unreadable[0].error, SourceError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_selected_webforms_only_read_their_documents() {
        let (_dir, source) =
            source_with(&[("contact.json", CONTACT), ("broken.json", "{ not json")]).await;
        let ids: BTreeSet<WebformId> = ["contact".into(), "missing".into()].into_iter().collect();

        let listing = source.load_webforms(Some(&ids)).await.unwrap();
        assert_eq!(listing.webforms.len(), 1);
        assert!(listing.unreadable.is_empty());
        assert!(!listing.contains(&"missing".into()));
    }

    #[tokio::test]
    async fn test_selected_malformed_document_is_unreadable() {
        let (_dir, source) = source_with(&[("broken.json", "{ not json")]).await;
        let ids: BTreeSet<WebformId> = ["broken".into()].into_iter().collect();

        let listing = source.load_webforms(Some(&ids)).await.unwrap();
        assert!(listing.webforms.is_empty());
        assert!(listing.contains(&"broken".into()));
    }

    #[test]
    fn test_rejects_file_as_base_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = JsonDirectorySource::new(file.path().to_path_buf());
        assert!(matches!(result, Err(SourceError::InvalidLocation(_))));
    }
}
