//! Tracing subscriber setup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Default filter directive when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Installs a global fmt subscriber filtered by `RUST_LOG`.
///
/// Falls back to [`DEFAULT_FILTER`]. Returns `false` if a global subscriber
/// was already installed, which makes repeated calls harmless.
pub fn init_tracing(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(format, filter)
}

/// Installs a global fmt subscriber with explicit filter directives.
///
/// `RUST_LOG` is ignored. Returns `false` if a global subscriber was
/// already installed.
pub fn init_tracing_with_filter(format: LogFormat, directives: &str) -> bool {
    install(format, EnvFilter::new(directives))
}

fn install(format: LogFormat, filter: EnvFilter) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Text => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        // The subscriber is global to the test binary; keep it quiet.
        init_tracing_with_filter(LogFormat::Text, "error");
        assert!(!init_tracing(LogFormat::Json));
        assert!(!init_tracing_with_filter(LogFormat::Json, "info"));
        assert!(!tracing::enabled!(tracing::Level::WARN));
    }

    #[test]
    fn test_format_serde() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);
        assert_eq!(serde_json::to_string(&LogFormat::Text).unwrap(), r#""text""#);
    }
}
