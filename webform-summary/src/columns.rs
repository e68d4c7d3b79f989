//! Column exclusion policy for exports

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::SummaryHandlerSettings;

/// Columns no export ever contains
pub const ALWAYS_EXCLUDED: [&str; 3] = ["uuid", "token", "webform_id"];

/// Submission metadata columns, exported only when a handler asks for metadata
pub const METADATA_COLUMNS: [&str; 15] = [
    "serial",
    "sid",
    "uri",
    "completed",
    "changed",
    "in_draft",
    "current_page",
    "remote_addr",
    "langcode",
    "entity_type",
    "entity_id",
    "sticky",
    "notes",
    "uid",
    "locked",
];

/// Base columns of every submission, in export order
pub const BASE_COLUMNS: [&str; 19] = [
    "serial",
    "sid",
    "uuid",
    "token",
    "uri",
    "created",
    "completed",
    "changed",
    "in_draft",
    "current_page",
    "remote_addr",
    "uid",
    "langcode",
    "webform_id",
    "entity_type",
    "entity_id",
    "locked",
    "sticky",
    "notes",
];

/// A set of column keys left out of an export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExcludedColumns(BTreeSet<String>);

impl ExcludedColumns {
    /// The always-excluded columns plus `extra`
    #[must_use]
    pub fn base<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: BTreeSet<String> =
            ALWAYS_EXCLUDED.iter().map(|c| (*c).to_string()).collect();
        columns.extend(extra.into_iter().map(Into::into));
        Self(columns)
    }

    /// This set widened by a handler's exclusions
    ///
    /// Adds the handler's excluded elements, and the metadata columns unless the handler
    /// includes metadata.
    #[must_use]
    pub fn for_handler(&self, settings: &SummaryHandlerSettings) -> Self {
        let mut columns = self.0.clone();
        columns.extend(settings.excluded_elements.iter().cloned());
        if !settings.metadata {
            columns.extend(METADATA_COLUMNS.iter().map(|c| (*c).to_string()));
        }
        Self(columns)
    }

    /// Whether `column` is excluded
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains(column)
    }

    /// Iterate the excluded columns in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of excluded columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is excluded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExcludedColumns {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_always_excludes_identifiers() {
        let columns = ExcludedColumns::base(["notes"]);
        for column in ALWAYS_EXCLUDED {
            assert!(columns.contains(column));
        }
        assert!(columns.contains("notes"));
        assert_eq!(columns.len(), 4);
    }

    #[test]
    fn test_handler_without_metadata_excludes_metadata() {
        let base = ExcludedColumns::base(Vec::<String>::new());
        let settings = SummaryHandlerSettings::new("r1@x.com").exclude("phone");

        let columns = base.for_handler(&settings);
        assert!(columns.contains("phone"));
        assert!(columns.contains("uuid"));
        for column in METADATA_COLUMNS {
            assert!(columns.contains(column), "{column} should be excluded");
        }
        assert!(!columns.contains("created"));
    }

    #[test]
    fn test_handler_with_metadata_keeps_metadata() {
        let base = ExcludedColumns::base(["remote_addr"]);
        let settings = SummaryHandlerSettings::new("r1@x.com").with_metadata();

        let columns = base.for_handler(&settings);
        assert!(columns.contains("remote_addr"));
        assert!(!columns.contains("sid"));
        assert!(!columns.contains("completed"));
        assert_eq!(columns, base);
    }

    #[test]
    fn test_for_handler_leaves_base_untouched() {
        let base = ExcludedColumns::base(Vec::<String>::new());
        let _ = base.for_handler(&SummaryHandlerSettings::new("r1@x.com").exclude("phone"));
        assert!(!base.contains("phone"));
        assert_eq!(base.len(), ALWAYS_EXCLUDED.len());
    }
}
