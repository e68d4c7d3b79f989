//! Exported files grouped by recipient

use std::path::PathBuf;

use serde::Serialize;

use crate::model::WebformId;

/// An export file waiting to be attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Webform the file was exported from
    pub webform: WebformId,

    /// Per-recipient file on disk
    pub path: PathBuf,

    /// File name shown to the recipient
    pub display_name: String,
}

impl FileEntry {
    /// Create a file entry
    #[must_use]
    pub fn new(
        webform: impl Into<WebformId>,
        path: impl Into<PathBuf>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            webform: webform.into(),
            path: path.into(),
            display_name: display_name.into(),
        }
    }
}

/// Export files of one run, keyed by recipient in first-seen order
///
/// A recipient appears once however many webforms contribute files to it.
///
/// ```rust
/// use webform_summary::mailer::{FileEntry, RecipientBatch};
///
/// let mut batch = RecipientBatch::new();
/// batch.add("office@example.com", FileEntry::new("a", "/tmp/a_office@example.com.csv", "a.csv"));
/// batch.add("office@example.com", FileEntry::new("b", "/tmp/b_office@example.com.csv", "b.csv"));
///
/// assert_eq!(batch.len(), 1);
/// assert_eq!(batch.file_count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecipientBatch {
    recipients: Vec<(String, Vec<FileEntry>)>,
}

impl RecipientBatch {
    /// Create an empty batch
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn files_mut(&mut self, recipient: &str) -> &mut Vec<FileEntry> {
        let index = match self.recipients.iter().position(|(r, _)| r == recipient) {
            Some(index) => index,
            None => {
                self.recipients.push((recipient.to_string(), Vec::new()));
                self.recipients.len() - 1
            }
        };
        &mut self.recipients[index].1
    }

    /// Register a recipient with no files yet
    pub fn seed(&mut self, recipient: &str) {
        self.files_mut(recipient);
    }

    /// Append a file to a recipient's list
    ///
    /// A file already listed under the same path is replaced in place.
    pub fn add(&mut self, recipient: &str, entry: FileEntry) {
        let files = self.files_mut(recipient);
        match files.iter_mut().find(|existing| existing.path == entry.path) {
            Some(existing) => *existing = entry,
            None => files.push(entry),
        }
    }

    /// Files listed for a recipient
    #[must_use]
    pub fn files(&self, recipient: &str) -> Option<&[FileEntry]> {
        self.recipients
            .iter()
            .find(|(r, _)| r == recipient)
            .map(|(_, files)| files.as_slice())
    }

    /// Iterate recipients and their files
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FileEntry])> {
        self.recipients
            .iter()
            .map(|(recipient, files)| (recipient.as_str(), files.as_slice()))
    }

    /// Iterate every file of the batch
    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.recipients.iter().flat_map(|(_, files)| files)
    }

    /// Number of recipients
    #[must_use]
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    /// Whether the batch has no recipients
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Number of files across all recipients
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.recipients.iter().map(|(_, files)| files.len()).sum()
    }
}
