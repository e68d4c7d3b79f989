//! `close`: mail the whole history of a closed webform

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Args;
use console::style;
use webform_summary::prelude::*;

use super::{build_mailer, print_report, INFO};

/// Send a closed webform's submissions
#[derive(Debug, Args)]
pub struct CloseCommand {
    /// Webform that was closed, archived or deleted
    pub webform: String,

    /// Last day to include (YYYY-MM-DD), defaults to today
    #[arg(long, value_name = "DATE")]
    pub today: Option<NaiveDate>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

impl CloseCommand {
    /// Execute the close command, returning whether the run was clean
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot start
    pub async fn execute(self, config: MailerConfig) -> Result<bool> {
        let today = self.today.unwrap_or_else(|| Utc::now().date_naive());
        let mailer = build_mailer(config)?;

        match mailer.send_on_close(self.webform.as_str(), today).await? {
            Some(report) => print_report(&report, self.json),
            None => {
                println!(
                    "\n{} Sending on close is disabled, nothing sent for {}\n",
                    INFO,
                    style(&self.webform).cyan()
                );
                Ok(true)
            }
        }
    }
}
