//! Structured logging
//!
//! Every outcome of a mailing run is logged through `tracing` with `webform`, `recipient`
//! and `files` fields, so a JSON log is enough to reconstruct what a run did.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing_subscriber::util::TryInitError;

/// How log lines are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human readable output
    Pretty,
    /// One JSON object per line
    Json,
    /// Pretty in debug builds, JSON in release builds
    #[default]
    Auto,
}

impl LogFormat {
    const fn resolve(self) -> Self {
        match self {
            Self::Auto if cfg!(debug_assertions) => Self::Pretty,
            Self::Auto => Self::Json,
            other => other,
        }
    }
}

/// Install the global subscriber with the build's default format
///
/// The level comes from `RUST_LOG`, defaulting to `info` (`debug` for this crate in debug
/// builds).
///
/// # Example
///
/// ```rust,no_run
/// use webform_summary::observability;
///
/// # fn main() -> anyhow::Result<()> {
/// observability::init()?;
/// tracing::info!("Mailer started");
/// # Ok(())
/// # }
/// ```
pub fn init() -> Result<(), TryInitError> {
    init_with(LogFormat::Auto)
}

/// Install the global subscriber with an explicit format
pub fn init_with(format: LogFormat) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("info,webform_summary=debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    match format.resolve() {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        _ => registry.with(tracing_subscriber::fmt::layer().pretty()).try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_resolves_per_build() {
        let expected = if cfg!(debug_assertions) {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        };
        assert_eq!(LogFormat::Auto.resolve(), expected);
        assert_eq!(LogFormat::Json.resolve(), LogFormat::Json);
    }

    #[test]
    fn test_second_init_fails_instead_of_panicking() {
        let _ = init_with(LogFormat::Json);
        assert!(init_with(LogFormat::Pretty).is_err());
    }
}
