//! CSV export of webform submissions

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::columns::{ExcludedColumns, BASE_COLUMNS};
use crate::model::{Submission, Webform, WebformId};
use crate::range::DateRange;

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors raised while writing an export
#[derive(Debug, Error)]
pub enum ExportError {
    /// Destination directory or file could not be written
    #[error("cannot write export {path}: {source}")]
    Io {
        /// Export path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding failure
    #[error("cannot encode export {path}: {source}")]
    Csv {
        /// Export path
        path: PathBuf,
        /// Underlying CSV failure
        #[source]
        source: csv::Error,
    },
}

/// How a webform's submissions are exported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Field delimiter
    pub delimiter: u8,

    /// Range the submissions were selected for
    pub range: DateRange,

    /// Columns left out of the export
    pub excluded_columns: ExcludedColumns,

    /// Directory the export file is written to
    pub destination: PathBuf,
}

impl ExportOptions {
    /// Options with a `;` delimiter and only the always-excluded columns
    #[must_use]
    pub fn new(range: DateRange, destination: impl Into<PathBuf>) -> Self {
        Self {
            delimiter: b';',
            range,
            excluded_columns: ExcludedColumns::base(Vec::<String>::new()),
            destination: destination.into(),
        }
    }

    /// Set the delimiter
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the excluded columns
    #[must_use]
    pub fn with_excluded_columns(mut self, excluded_columns: ExcludedColumns) -> Self {
        self.excluded_columns = excluded_columns;
        self
    }

    /// File name of a webform's export, also used as the attachment name
    #[must_use]
    pub fn file_name(webform: &WebformId) -> String {
        format!("{webform}.csv")
    }

    /// Where the exporter writes a webform's export
    #[must_use]
    pub fn temp_path(&self, webform: &WebformId) -> PathBuf {
        self.destination.join(Self::file_name(webform))
    }

    /// Where a webform's export is kept for one recipient
    #[must_use]
    pub fn recipient_path(&self, webform: &WebformId, recipient: &str) -> PathBuf {
        self.destination.join(format!("{webform}_{recipient}.csv"))
    }

    /// Header of a webform's export: base columns then element columns, minus exclusions
    ///
    /// Element columns follow the webform's element order. A webform without declared
    /// elements uses every element key found in `submissions`, sorted.
    #[must_use]
    pub fn columns(&self, webform: &Webform, submissions: &[Submission]) -> Vec<String> {
        let elements: Vec<String> = if webform.elements.is_empty() {
            submissions
                .iter()
                .flat_map(|submission| submission.data.keys().cloned())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        } else {
            webform.elements.clone()
        };

        BASE_COLUMNS
            .iter()
            .map(|column| (*column).to_string())
            .chain(elements)
            .filter(|column| !self.excluded_columns.contains(column))
            .collect()
    }
}

/// Renders submissions into an export file
///
/// Exporting is synchronous and may block on file I/O. The mailer runs exporters on
/// tokio's blocking pool.
pub trait SubmissionExporter: Send + Sync {
    /// Write the export of `submissions` to [`ExportOptions::temp_path`]
    ///
    /// Returns the path written.
    fn export(
        &self,
        webform: &Webform,
        submissions: &[Submission],
        options: &ExportOptions,
    ) -> ExportResult<PathBuf>;
}

/// Exporter writing delimited text through the `csv` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl CsvExporter {
    /// Create a CSV exporter
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SubmissionExporter for CsvExporter {
    fn export(
        &self,
        webform: &Webform,
        submissions: &[Submission],
        options: &ExportOptions,
    ) -> ExportResult<PathBuf> {
        let path = options.temp_path(&webform.id);
        std::fs::create_dir_all(&options.destination).map_err(|source| ExportError::Io {
            path: options.destination.clone(),
            source,
        })?;

        let csv_error = |source| ExportError::Csv {
            path: path.clone(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .from_path(&path)
            .map_err(csv_error)?;

        let columns = options.columns(webform, submissions);
        writer.write_record(&columns).map_err(csv_error)?;
        for submission in submissions {
            writer
                .write_record(columns.iter().map(|column| submission.column_value(column)))
                .map_err(csv_error)?;
        }

        writer.flush().map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}
