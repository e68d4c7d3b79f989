//! `run`: mail the submissions of a date range

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Args;
use webform_summary::prelude::*;

use super::{build_mailer, print_report};

/// Run a mailing
#[derive(Debug, Args)]
pub struct RunCommand {
    /// First day of the range (YYYY-MM-DD), defaults to the end of the range
    #[arg(long, value_name = "DATE", conflicts_with = "yesterday")]
    pub from: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD), defaults to today
    #[arg(long, value_name = "DATE", conflicts_with = "yesterday")]
    pub to: Option<NaiveDate>,

    /// Mail yesterday's submissions
    #[arg(long)]
    pub yesterday: bool,

    /// Only mail this webform; may be repeated
    #[arg(long = "webform", value_name = "ID")]
    pub webforms: Vec<String>,

    /// Do not send webforms without a handler to the fallback recipient
    #[arg(long)]
    pub no_fallback: bool,

    /// Leave a column out of every export; may be repeated
    #[arg(long = "exclude", value_name = "COLUMN")]
    pub excluded: Vec<String>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunCommand {
    /// Execute the run command, returning whether the run was clean
    ///
    /// # Errors
    ///
    /// Returns an error if the range is invalid or the run cannot start
    pub async fn execute(self, config: MailerConfig) -> Result<bool> {
        let request = self.request(Utc::now().date_naive())?;
        let mailer = build_mailer(config)?;
        let report = mailer.run(&request).await?;
        print_report(&report, self.json)
    }

    fn range(&self, today: NaiveDate) -> Result<DateRange> {
        if self.yesterday {
            return Ok(DateRange::previous_day(today));
        }
        let end = self.to.unwrap_or(today);
        let start = self.from.unwrap_or(end);
        Ok(DateRange::new(start, end)?)
    }

    fn request(&self, today: NaiveDate) -> Result<RunRequest> {
        let mut request = RunRequest::new(self.range(today)?)
            .webforms(self.webforms.iter().map(String::as_str));
        for column in &self.excluded {
            request = request.exclude(column.as_str());
        }
        if self.no_fallback {
            request = request.without_fallback();
        }
        Ok(request)
    }
}
