//! Centralized logging initialization with environment variable support

use crate::settings::{LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Environment variables (in priority order):
/// - `RUST_LOG`: Standard Rust log filter (takes precedence over all)
/// - `LOG_LEVEL`: Set log level (trace, debug, info, warn, error)
/// - `LOG_FORMAT`: Override format (json, pretty)
///
/// ```bash
/// # Debug output for the repository layer only
/// RUST_LOG=cmdhub_services=debug cmdhub manifest
///
/// # Machine-readable logs
/// LOG_FORMAT=json cmdhub manifest --refresh
/// ```
pub fn initialize(config: &LoggingConfig) {
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|l| l.parse().ok())
        .or_else(|| config.level.parse().ok())
        .unwrap_or(tracing::Level::WARN);

    let env_filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::default().add_directive(level.into()),
    };

    let format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|f| parse_format(&f))
        .unwrap_or_else(|| config.format.clone());

    // Always stderr: stdout carries command output
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    }
}

fn parse_format(value: &str) -> Option<LogFormat> {
    match value.to_lowercase().as_str() {
        "json" => Some(LogFormat::Json),
        "pretty" | "human" => Some(LogFormat::Pretty),
        _ => None,
    }
}

/// Span wrapping one top-level operation, so nested logs carry its name
pub fn operation_span(operation: &str, language: &str) -> tracing::Span {
    tracing::info_span!("operation", operation = %operation, language = %language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("JSON"), Some(LogFormat::Json));
        assert_eq!(parse_format("human"), Some(LogFormat::Pretty));
        assert_eq!(parse_format("xml"), None);
    }
}
