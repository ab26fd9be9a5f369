//! Rebate CLI
//!
//! Loads a fixture set, validates the requested promo code and prints the
//! priced order as a receipt table or JSON.

use std::{
    io::{self, Write},
    process::ExitCode,
};

use jiff::Timestamp;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rebate::{
    fixtures::{Fixture, FixtureError},
    pricing::{PricingError, price_order},
    promotions::codes::PromoCodeError,
    receipt::{Receipt, ReceiptError},
};

use crate::config::{Config, ConfigError, LogFormat, LoggingConfig, OutputFormat};

mod config;

/// Errors that stop the CLI.
#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    PromoCode(#[from] PromoCodeError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    #[error("failed to write JSON output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Rebate CLI entry point
pub fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            // Help and version requests are reported through the same path.
            _ = err.print();

            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(&config.logging);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(run_error) => {
            error!("{run_error}");

            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match config.log_format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(config: &Config) -> Result<(), RunError> {
    let currency = config.currency()?;
    let fixture = Fixture::from_set_in(&config.fixtures, &config.set)?;

    info!(
        set = %config.set,
        items = fixture.cart().len(),
        codes = fixture.catalog().len(),
        "loaded fixture set"
    );

    let redeemed = config
        .code
        .as_deref()
        .map(|code| {
            fixture
                .catalog()
                .redeem(code, Timestamp::now())
                .map(|promo| (code, promo))
        })
        .transpose()?;

    let pricing = price_order(
        fixture.cart(),
        redeemed.as_ref().map(|(code, promo)| (*code, promo)),
    )?;

    if let Some(code) = config.code.as_deref()
        && !pricing.has_promotion()
    {
        warn!(code, "promo code does not apply to this cart");
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match config.format {
        OutputFormat::Table => {
            Receipt::new(fixture.cart(), &pricing, currency).write_to(&mut handle)?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut handle, &pricing)?;
            writeln!(handle)?;
        }
    }

    Ok(())
}
