//! webform-summary CLI

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{CheckConfigCommand, CloseCommand, RunCommand};
use webform_summary::observability::{self, LogFormat};

#[derive(Debug, Parser)]
#[command(name = "webform-summary")]
#[command(version)]
#[command(about = "Mail CSV summaries of webform submissions", long_about = None)]
struct Cli {
    /// Configuration file, instead of the standard locations
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a mailing over a date range
    Run(RunCommand),
    /// Mail the whole history of a closed webform
    Close(CloseCommand),
    /// Validate the settings and every summary handler
    CheckConfig(CheckConfigCommand),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Auto
    };
    observability::init_with(format)?;

    let config = commands::load_config(cli.config.as_deref())?;
    let clean = match cli.command {
        Commands::Run(command) => command.execute(config).await?,
        Commands::Close(command) => command.execute(config).await?,
        Commands::CheckConfig(command) => command.execute(config).await?,
    };

    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "webform-summary",
            "check-config",
            "--config",
            "/etc/ws.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/ws.toml")));
        assert!(matches!(cli.command, Commands::CheckConfig(_)));
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "webform-summary",
            "run",
            "--from",
            "2024-03-01",
            "--to",
            "2024-03-07",
            "--webform",
            "contact",
            "--webform",
            "survey",
            "--exclude",
            "notes",
            "--no-fallback",
            "--json",
        ])
        .unwrap();

        let Commands::Run(run) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(run.webforms, vec!["contact", "survey"]);
        assert_eq!(run.excluded, vec!["notes"]);
        assert!(run.no_fallback);
        assert!(run.json);
    }

    #[test]
    fn test_yesterday_conflicts_with_explicit_dates() {
        let result =
            Cli::try_parse_from(["webform-summary", "run", "--yesterday", "--from", "2024-03-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_close_requires_webform() {
        assert!(Cli::try_parse_from(["webform-summary", "close"]).is_err());
        let cli = Cli::try_parse_from(["webform-summary", "close", "contact"]).unwrap();
        assert!(matches!(cli.command, Commands::Close(_)));
    }
}
