//! Tracing subscriber setup

use diadoc_domain::{DiadocError, Result};
use tracing_subscriber::EnvFilter;

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Install a global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to `default_directive`
/// (for example `"info"` or `"diadoc_core=debug"`).
///
/// # Errors
/// Returns `DiadocError::Config` if the directive does not parse or a global
/// subscriber is already installed.
pub fn init_tracing(format: LogFormat, default_directive: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive)
            .map_err(|e| DiadocError::Config(format!("Invalid log filter {default_directive:?}: {e}")))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|e| DiadocError::Config(format!("Failed to install tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_installation_is_rejected() {
        // Another test may have installed a subscriber already.
        let _ = init_tracing(LogFormat::Json, "debug");
        let err = init_tracing(LogFormat::Pretty, "info").unwrap_err();
        assert!(matches!(err, DiadocError::Config(_)));
    }

    #[test]
    fn default_format_is_pretty() {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }
}
