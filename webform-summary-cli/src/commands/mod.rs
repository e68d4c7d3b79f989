//! CLI command implementations

pub mod check;
pub mod close;
pub mod run;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::{style, Emoji};
use webform_summary::prelude::*;

pub use check::CheckConfigCommand;
pub use close::CloseCommand;
pub use run::RunCommand;

static SUCCESS: Emoji = Emoji("✓", "√");
static WARNING: Emoji = Emoji("⚠", "!");
static INFO: Emoji = Emoji("ℹ", "i");

const SERVICE_NAME: &str = "webform-summary";

/// Load configuration from `path`, or from the standard locations
pub fn load_config(path: Option<&Path>) -> Result<MailerConfig> {
    match path {
        Some(path) => MailerConfig::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => {
            MailerConfig::load_for_service(SERVICE_NAME).context("Failed to load configuration")
        }
    }
}

/// Mailer reading the configured data directory and sending through the configured transport
fn build_mailer(config: MailerConfig) -> Result<Mailer> {
    let source = JsonDirectorySource::new(config.data_dir.clone())
        .with_context(|| format!("Cannot read webforms from {}", config.data_dir.display()))?;
    let sender: Arc<dyn EmailSender> = match config.transport.kind {
        TransportKind::Smtp => Arc::new(SmtpBackend::new(config.transport.smtp.clone())),
        TransportKind::Console => Arc::new(ConsoleBackend::new()),
    };
    Ok(Mailer::new(config, Arc::new(source), sender))
}

/// Print a report for humans, or as JSON; returns whether the run was clean
fn print_report(report: &RunReport, json: bool) -> Result<bool> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(report.is_clean());
    }

    println!("\n{} Webform summary run {}", INFO, style(report.range).cyan());
    println!("{}", "─".repeat(60));
    for outcome in &report.outcomes {
        let marker = match &outcome.kind {
            OutcomeKind::Sent { .. } => style(SUCCESS.to_string()).green(),
            kind if kind.is_failure() => style(WARNING.to_string()).red(),
            _ => style(INFO.to_string()).dim(),
        };
        println!("  {marker} {outcome}");
    }
    if report.outcomes.is_empty() {
        println!("  {}", style("(nothing to do)").dim());
    }
    println!("{}", "─".repeat(60));

    let failures = report.failures().count();
    let summary = format!("{} email(s) sent, {failures} failure(s)", report.emails_sent());
    if failures == 0 {
        println!("{} {}", SUCCESS, style(summary).green().bold());
    } else {
        println!("{} {}", WARNING, style(summary).yellow().bold());
    }
    println!();

    Ok(failures == 0)
}
