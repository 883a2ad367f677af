use anyhow::Result;
use emulator_config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber described by `config`.
///
/// A second call is a no-op, so tests and embedders can call it freely.
pub fn init_logging_from_config(config: &LoggingConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.filter_directive()))
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_names(true);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    match result {
        Ok(()) => tracing::debug!(
            "Logging initialised at {} ({:?})",
            config.level,
            config.format
        ),
        Err(_) => tracing::debug!("Global tracing subscriber already initialized, skipping"),
    }

    Ok(())
}

// Configured directive first, then RUST_LOG, then plain info
fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use emulator_config::LogLevel;

    #[test]
    fn test_repeated_initialisation_is_harmless() {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            format: LogFormat::Compact,
            include_location: false,
        };
        assert!(init_logging_from_config(&config).is_ok());
        assert!(init_logging_from_config(&LoggingConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_directive_falls_back() {
        // Never panics, whatever the directive
        let _ = env_filter("not a [valid directive");
    }
}
