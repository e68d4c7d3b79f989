//! `check-config`: validate the settings and every summary handler

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use validator::{Validate, ValidationErrors};
use webform_summary::prelude::*;

use super::{SUCCESS, WARNING};

/// Validate configuration
#[derive(Debug, Args)]
pub struct CheckConfigCommand {}

fn messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = error.message.as_ref().map_or_else(
                || format!("{field}: {}", error.code),
                ToString::to_string,
            );
            messages.push(message);
        }
    }
    messages.sort();
    messages
}

fn report(label: &str, result: Result<(), ValidationErrors>) -> bool {
    match result {
        Ok(()) => {
            println!("  {} {}", SUCCESS, label);
            true
        }
        Err(errors) => {
            println!("  {} {}", WARNING, style(label).red());
            for message in messages(&errors) {
                println!("      {message}");
            }
            false
        }
    }
}

impl CheckConfigCommand {
    /// Execute the check, returning whether everything is valid
    ///
    /// # Errors
    ///
    /// Returns an error if the webform documents cannot be read
    pub async fn execute(self, config: MailerConfig) -> Result<bool> {
        println!("\n{}", style("Settings").bold());
        let mut valid = report("summary settings", config.settings.validate());

        if let Err(e) = config.delimiter_byte() {
            println!("  {} {}", WARNING, style(e).red());
            valid = false;
        }

        let source = JsonDirectorySource::new(config.data_dir.clone())?;
        let listing = source
            .load_webforms(None)
            .await
            .with_context(|| format!("Cannot read webforms from {}", config.data_dir.display()))?;

        println!("\n{} ({})", style("Summary handlers").bold(), config.data_dir.display());
        let mut handlers = 0;
        for unreadable in &listing.unreadable {
            println!(
                "  {} {}: {}",
                WARNING,
                style(&unreadable.webform).red(),
                unreadable.error
            );
            valid = false;
        }
        for webform in &listing.webforms {
            for handler in webform.summary_handlers() {
                handlers += 1;
                let label = format!("{} / {}", webform.id, handler.handler_id);
                valid &= report(&label, handler.settings.validate());
            }
        }
        if handlers == 0 {
            println!("  {}", style("(no summary handlers)").dim());
        }
        println!();

        Ok(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config(dir: &std::path::Path) -> MailerConfig {
        let mut config = MailerConfig {
            data_dir: dir.to_path_buf(),
            ..MailerConfig::default()
        };
        config.settings.sender = "noreply@example.com".to_string();
        config
    }

    #[tokio::test]
    async fn test_valid_configuration() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("contact.json"),
            r#"{"id": "contact", "handlers": [{"handler_id": "summary",
                "plugin_id": "mail_summary_handler",
                "settings": {"recipient_mail": "office@example.com"}}]}"#,
        )
        .unwrap();

        assert!(CheckConfigCommand {}.execute(config(dir.path())).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_handler_recipient() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("contact.json"),
            r#"{"id": "contact", "handlers": [{"handler_id": "summary",
                "plugin_id": "mail_summary_handler",
                "settings": {"recipient_mail": "not an address"}}]}"#,
        )
        .unwrap();

        assert!(!CheckConfigCommand {}.execute(config(dir.path())).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_document_fails_the_check() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        assert!(!CheckConfigCommand {}.execute(config(dir.path())).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_sender() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.settings.sender = String::new();

        assert!(!CheckConfigCommand {}.execute(config).await.unwrap());
    }

    #[test]
    fn test_messages_fall_back_to_code() {
        let mut errors = ValidationErrors::new();
        errors.add("recipient_mail", validator::ValidationError::new("email"));
        assert_eq!(messages(&errors), vec!["recipient_mail: email"]);
    }
}
