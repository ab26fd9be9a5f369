//! CLI configuration

use std::path::PathBuf;

use clap::{Args, Parser};
use rusty_money::iso::{Currency, EUR, GBP, USD};
use thiserror::Error;

/// Configuration errors not caught by argument parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Output format for the priced order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Receipt table
    Table,

    /// JSON document
    Json,
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "REBATE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Rebate configuration
#[derive(Debug, Parser)]
#[command(name = "rebate", about = "Price a cart with a promo code", long_about = None)]
pub struct Config {
    /// Directory holding `carts/` and `promotions/` fixture files
    #[arg(long, env = "REBATE_FIXTURES", default_value = "./fixtures")]
    pub fixtures: PathBuf,

    /// Fixture set name
    #[arg(short, long, env = "REBATE_SET", default_value = "example")]
    pub set: String,

    /// Promo code to apply
    #[arg(short, long, env = "REBATE_PROMO_CODE")]
    pub code: Option<String>,

    /// Currency used to display amounts (GBP, USD, EUR)
    #[arg(long, env = "REBATE_CURRENCY", default_value = "GBP")]
    pub currency: String,

    /// Output format (table, json)
    #[arg(short, long, env = "REBATE_FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Logging settings
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Resolve the display currency
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] for codes other than GBP, USD and EUR.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        parse_currency(&self.currency)
    }
}

/// Parse an ISO currency code.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownCurrency`] for codes other than GBP, USD and EUR.
pub fn parse_currency(code: &str) -> Result<&'static Currency, ConfigError> {
    match code.trim().to_ascii_uppercase().as_str() {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        _ => Err(ConfigError::UnknownCurrency(code.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_arguments() -> TestResult {
        let config = Config::try_parse_from([
            "rebate",
            "--fixtures",
            "/tmp/fixtures",
            "--set",
            "summer",
            "--code",
            "SAVE10",
            "--currency",
            "usd",
            "--format",
            "json",
        ])?;

        assert_eq!(config.fixtures, PathBuf::from("/tmp/fixtures"));
        assert_eq!(config.set, "summer");
        assert_eq!(config.code.as_deref(), Some("SAVE10"));
        assert_eq!(config.currency()?, USD);
        assert_eq!(config.format, OutputFormat::Json);

        Ok(())
    }

    #[test]
    fn rejects_unknown_currency() {
        assert_eq!(
            parse_currency("JPY"),
            Err(ConfigError::UnknownCurrency("JPY".to_string()))
        );
    }

    #[test]
    fn currency_codes_are_case_insensitive() -> TestResult {
        assert_eq!(parse_currency(" eur ")?, EUR);

        Ok(())
    }
}
