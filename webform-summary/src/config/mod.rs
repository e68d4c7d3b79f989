//! Configuration for mailing runs
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `WEBFORM_SUMMARY_` prefix, `__` for nesting)
//! 2. `./config.toml` (development)
//! 3. `~/.config/webform-summary/{service}/config.toml` (user config, XDG)
//! 4. `/etc/webform-summary/{service}/config.toml` (system config)
//! 5. Hardcoded defaults (fallback)
//!
//! The `[settings]` table keeps the key names the settings are persisted under, so an
//! exported settings object can be pasted in as is.
//!
//! # Example Configuration
//!
//! ```toml
//! temp_dir = "/tmp"
//! data_dir = "./webforms"
//! delimiter = ";"
//!
//! [settings]
//! webform_submissions_sender = "noreply@example.com"
//! webform_submissions_subject = "Daily webform summary"
//! webform_submissions_body = "Please find the new submissions attached."
//! webform_submissions_email = "office@example.com"
//! webform_close_send_data = true
//! webform_submissions_disable = false
//!
//! [transport]
//! kind = "smtp"
//!
//! [transport.smtp]
//! host = "smtp.example.com"
//! port = 587
//!
//! [attachments]
//! encoding = "latin1"
//! ```

pub mod validation;

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::email::SmtpConfig;
use crate::error::{SummaryError, SummaryResult};

pub use crate::mailer::AttachmentEncoding;

/// Subject used when no subject line is configured
pub const DEFAULT_SUBJECT: &str = "Webform summary";

/// The persisted summary settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Address the summaries are sent from
    #[serde(rename = "webform_submissions_sender")]
    pub sender: String,

    /// Subject line of the summary mail
    #[serde(rename = "webform_submissions_subject")]
    pub subject: String,

    /// Body of the summary mail
    #[serde(rename = "webform_submissions_body")]
    pub body: String,

    /// Recipient for webforms without a summary handler; no fallback mail when unset
    #[serde(rename = "webform_submissions_email")]
    pub fallback_email: Option<String>,

    /// Send a webform's data when it is closed, archived or deleted
    #[serde(rename = "webform_close_send_data")]
    pub close_send_data: bool,

    /// Globally disable sending
    #[serde(rename = "webform_submissions_disable")]
    pub disabled: bool,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            sender: String::new(),
            subject: DEFAULT_SUBJECT.to_string(),
            body: String::new(),
            fallback_email: None,
            close_send_data: false,
            disabled: false,
        }
    }
}

impl SummarySettings {
    /// The fallback recipient, if one is configured
    #[must_use]
    pub fn fallback_recipient(&self) -> Option<&str> {
        self.fallback_email
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }

    /// The configured subject, or the summary label when blank
    #[must_use]
    pub fn subject_line(&self) -> &str {
        let subject = self.subject.trim();
        if subject.is_empty() {
            DEFAULT_SUBJECT
        } else {
            subject
        }
    }
}

impl Validate for SummarySettings {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let sender = self.sender.trim();
        if sender.is_empty() {
            errors.add(
                "webform_submissions_sender",
                validation::required("Webform summary sender email"),
            );
        } else {
            check_address(&mut errors, "webform_submissions_sender", sender);
        }

        if self.subject.trim().is_empty() {
            errors.add(
                "webform_submissions_subject",
                validation::required("Webform summary subject line"),
            );
        }

        if let Some(fallback) = self.fallback_recipient() {
            check_address(&mut errors, "webform_submissions_email", fallback);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_address(errors: &mut ValidationErrors, field: &'static str, address: &str) {
    if !validation::is_valid_email(address) {
        errors.add(field, validation::invalid_email(address));
    } else if !validation::is_valid_return_path(address) {
        errors.add(field, validation::invalid_return_path(address));
    }
}

/// Outbound transport selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Log emails instead of sending them
    #[default]
    Console,
    /// Send through an SMTP relay
    Smtp,
}

/// Transport configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Which backend delivers the summaries
    pub kind: TransportKind,

    /// SMTP relay settings, used when `kind = "smtp"`
    pub smtp: SmtpConfig,
}

/// Attachment rendering
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentSettings {
    /// Text encoding of the attached CSV files
    pub encoding: AttachmentEncoding,
}

/// Complete runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailerConfig {
    /// Persisted summary settings
    pub settings: SummarySettings,

    /// Directory exports are written to before they are attached
    pub temp_dir: PathBuf,

    /// Directory of webform documents read by the filesystem source
    pub data_dir: PathBuf,

    /// CSV field delimiter
    pub delimiter: char,

    /// Outbound transport
    pub transport: TransportSettings,

    /// Attachment rendering
    pub attachments: AttachmentSettings,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            settings: SummarySettings::default(),
            temp_dir: std::env::temp_dir(),
            data_dir: PathBuf::from("./webforms"),
            delimiter: ';',
            transport: TransportSettings::default(),
            attachments: AttachmentSettings::default(),
        }
    }
}

impl MailerConfig {
    /// Load configuration for a specific service
    ///
    /// Searches for configuration in XDG-compliant locations with precedence:
    /// 1. Environment variables (`WEBFORM_SUMMARY_*`, use `__` for nesting)
    /// 2. `./config.toml`
    /// 3. `~/.config/webform-summary/{service_name}/config.toml`
    /// 4. `/etc/webform-summary/{service_name}/config.toml`
    /// 5. Defaults
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use webform_summary::config::MailerConfig;
    ///
    /// # fn example() -> webform_summary::SummaryResult<()> {
    /// let config = MailerConfig::load_for_service("webform-summary")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_for_service(service_name: &str) -> SummaryResult<Self> {
        let mut figment = Self::defaults()?;

        let system_config = PathBuf::from("/etc/webform-summary")
            .join(service_name)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        let user_config = Self::recommended_path(service_name);
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        let local_config = PathBuf::from("./config.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        figment = figment.merge(Self::environment());

        Ok(figment.extract()?)
    }

    /// Load configuration from a specific file
    ///
    /// A missing file yields the defaults; environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> SummaryResult<Self> {
        let config = Self::defaults()?
            .merge(Toml::file(path.as_ref()))
            .merge(Self::environment())
            .extract()?;

        Ok(config)
    }

    /// Get the recommended XDG config path for a service
    ///
    /// ```rust
    /// use webform_summary::config::MailerConfig;
    ///
    /// let path = MailerConfig::recommended_path("nightly");
    /// // Returns: ~/.config/webform-summary/nightly/config.toml
    /// ```
    #[must_use]
    pub fn recommended_path(service_name: &str) -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |config_dir| {
                config_dir
                    .join("webform-summary")
                    .join(service_name)
                    .join("config.toml")
            },
        )
    }

    /// The delimiter as the single byte the CSV writer expects
    pub fn delimiter_byte(&self) -> SummaryResult<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                SummaryError::config(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    self.delimiter
                ))
            })
    }

    fn defaults() -> SummaryResult<Figment> {
        let defaults = toml::to_string(&Self::default())
            .map_err(|e| SummaryError::config(format!("cannot serialize defaults: {e}")))?;
        Ok(Figment::new().merge(Toml::string(&defaults)))
    }

    fn environment() -> Env {
        Env::prefixed("WEBFORM_SUMMARY_").split("__").lowercase(true)
    }
}
