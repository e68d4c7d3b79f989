//! Parameters of one mailing run

use std::collections::BTreeSet;

use crate::model::WebformId;
use crate::range::DateRange;

/// What a mailing run covers
///
/// ```rust
/// use chrono::NaiveDate;
/// use webform_summary::mailer::RunRequest;
/// use webform_summary::range::DateRange;
///
/// let yesterday = DateRange::previous_day(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
/// let request = RunRequest::new(yesterday)
///     .webform("contact")
///     .exclude("notes")
///     .without_fallback();
///
/// assert!(!request.use_fallback());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    webforms: Option<BTreeSet<WebformId>>,
    range: DateRange,
    use_fallback: bool,
    excluded_columns: BTreeSet<String>,
}

impl RunRequest {
    /// All webforms over `range`, with the fallback recipient
    #[must_use]
    pub const fn new(range: DateRange) -> Self {
        Self {
            webforms: None,
            range,
            use_fallback: true,
            excluded_columns: BTreeSet::new(),
        }
    }

    /// Restrict the run to a webform; may be called repeatedly
    #[must_use]
    pub fn webform(mut self, webform: impl Into<WebformId>) -> Self {
        self.webforms
            .get_or_insert_with(BTreeSet::new)
            .insert(webform.into());
        self
    }

    /// Restrict the run to these webforms
    #[must_use]
    pub fn webforms<I, W>(self, webforms: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<WebformId>,
    {
        webforms.into_iter().fold(self, Self::webform)
    }

    /// Never send to the fallback recipient
    #[must_use]
    pub const fn without_fallback(mut self) -> Self {
        self.use_fallback = false;
        self
    }

    /// Exclude a column from every export of the run
    #[must_use]
    pub fn exclude(mut self, column: impl Into<String>) -> Self {
        self.excluded_columns.insert(column.into());
        self
    }

    /// Selected webforms, `None` for all
    #[must_use]
    pub const fn selected_webforms(&self) -> Option<&BTreeSet<WebformId>> {
        self.webforms.as_ref()
    }

    /// Covered range
    #[must_use]
    pub const fn range(&self) -> DateRange {
        self.range
    }

    /// Whether webforms without a handler recipient go to the fallback recipient
    #[must_use]
    pub const fn use_fallback(&self) -> bool {
        self.use_fallback
    }

    /// Extra excluded columns
    #[must_use]
    pub const fn excluded_columns(&self) -> &BTreeSet<String> {
        &self.excluded_columns
    }
}

impl Default for RunRequest {
    fn default() -> Self {
        Self::new(DateRange::today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = RunRequest::default();
        assert!(request.selected_webforms().is_none());
        assert!(request.use_fallback());
        assert!(request.excluded_columns().is_empty());
        assert_eq!(request.range(), DateRange::today());
    }

    #[test]
    fn test_webform_selection_accumulates() {
        let request = RunRequest::default()
            .webform("contact")
            .webforms(["survey", "contact"]);

        let selected: Vec<_> = request
            .selected_webforms()
            .unwrap()
            .iter()
            .map(WebformId::as_str)
            .collect();
        assert_eq!(selected, vec!["contact", "survey"]);
    }
}
