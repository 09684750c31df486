use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::Currency;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_SMALLEST_UNIT_FACTOR: i64 = 100;

/// Card fee schedule for one currency
#[derive(Clone, Debug, Deserialize, Validate, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FeeScheduleConfig {
    /// Fraction of the charged amount, e.g. `0.029`
    #[validate(custom = "validate_fee_rate")]
    pub transaction_fee_rate: Decimal,

    /// Fixed fee added to every card charge, e.g. `0.30`
    #[serde(default)]
    #[validate(custom = "validate_additional_fee")]
    pub additional_fee: Decimal,

    /// Factor to the provider's smallest unit (100 for cents, 1 for VND)
    #[serde(default = "default_smallest_unit_factor")]
    #[validate(range(min = 1))]
    pub smallest_unit_factor: i64,
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application environment
    #[serde(default = "default_environment")]
    #[validate(length(min = 1))]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Card fee schedules keyed by ISO currency code
    #[serde(default)]
    pub fee_schedules: HashMap<String, FeeScheduleConfig>,
}

impl AppConfig {
    /// Builds and validates the configuration from an already layered source.
    pub fn from_config(config: Config) -> Result<Self, AppConfigError> {
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate().map_err(|e| {
            error!("Configuration validation failed: {:?}", e);
            AppConfigError::Validation(e)
        })?;

        app_config.validate_additional_constraints().map_err(|e| {
            error!("Fee schedule validation failed: {:?}", e);
            AppConfigError::Validation(e)
        })?;

        Ok(app_config)
    }

    /// Returns whether the application is running in production
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Fee schedules with their keys parsed into currencies.
    pub fn parsed_fee_schedules(
        &self,
    ) -> Result<Vec<(Currency, &FeeScheduleConfig)>, AppConfigError> {
        self.fee_schedules
            .iter()
            .map(|(code, schedule)| {
                Currency::from_str(code)
                    .map(|currency| (currency, schedule))
                    .map_err(|_| {
                        AppConfigError::InvalidFeeSchedule(format!("unknown currency '{}'", code))
                    })
            })
            .collect()
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.fee_schedules.is_empty() {
            let mut err = ValidationError::new("fee_schedules_required");
            err.message = Some("At least one fee schedule must be configured".into());
            errors.add("fee_schedules", err);
        }

        for (code, schedule) in &self.fee_schedules {
            if Currency::from_str(code).is_err() {
                let mut err = ValidationError::new("fee_schedule_currency");
                err.message = Some(format!("Unknown currency code '{}'", code).into());
                errors.add("fee_schedules", err);
            }
            if let Err(nested) = schedule.validate() {
                let mut err = ValidationError::new("fee_schedule");
                err.message = Some(format!("Invalid fee schedule for '{}': {}", code, nested).into());
                errors.add("fee_schedules", err);
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid fee schedule: {0}")]
    InvalidFeeSchedule(String),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_smallest_unit_factor() -> i64 {
    DEFAULT_SMALLEST_UNIT_FACTOR
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_fee_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if rate.is_sign_negative() || *rate >= Decimal::ONE {
        let mut err = ValidationError::new("transaction_fee_rate");
        err.message = Some("transaction_fee_rate must be a fraction in [0, 1)".into());
        return Err(err);
    }
    Ok(())
}

fn validate_additional_fee(fee: &Decimal) -> Result<(), ValidationError> {
    if fee.is_sign_negative() && !fee.is_zero() {
        let mut err = ValidationError::new("additional_fee");
        err.message = Some("additional_fee must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("sourcing_pricing={level},price_order={level}");
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let builder = fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .with_writer(std::io::stderr);
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

/// Built-in defaults: a USD card schedule so a bare checkout can price USD
/// orders without any config file.
fn config_builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("fee_schedules.usd.transaction_fee_rate", "0.029")?
        .set_default("fee_schedules.usd.additional_fee", "0.30")?
        .set_default("fee_schedules.usd.smallest_unit_factor", DEFAULT_SMALLEST_UNIT_FACTOR)
}

/// Loads configuration from `config_dir` for the given profile.
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = config_builder()?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    AppConfig::from_config(config)
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    let app_config = load_config_from(Path::new(CONFIG_DIR), &run_env)?;
    info!(
        schedules = app_config.fee_schedules.len(),
        "Configuration loaded successfully"
    );
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use config::FileFormat;
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::TempDir;

    fn from_toml(content: &str) -> Result<AppConfig, AppConfigError> {
        let config = config_builder()
            .unwrap()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .unwrap();
        AppConfig::from_config(config)
    }

    #[test]
    fn defaults_carry_usd_schedule() {
        let cfg = from_toml("").unwrap();
        assert_eq!(cfg.environment, "development");
        assert_eq!(cfg.log_level(), "info");
        assert!(!cfg.log_json);

        let usd = &cfg.fee_schedules["usd"];
        assert_eq!(usd.transaction_fee_rate, dec!(0.029));
        assert_eq!(usd.additional_fee, dec!(0.30));
        assert_eq!(usd.smallest_unit_factor, 100);
    }

    #[test]
    fn file_adds_currencies() {
        let cfg = from_toml(
            r#"
            log_level = "debug"

            [fee_schedules.vnd]
            transaction_fee_rate = "0.032"
            additional_fee = "2000"
            smallest_unit_factor = 1
            "#,
        )
        .unwrap();

        let parsed = cfg.parsed_fee_schedules().unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed.iter().any(|(currency, schedule)| {
            *currency == Currency::Vnd && schedule.additional_fee == dec!(2000)
        }));
    }

    #[test]
    fn rejects_out_of_range_rate() {
        let result = from_toml(
            r#"
            [fee_schedules.eur]
            transaction_fee_rate = "1.5"
            "#,
        );
        assert_matches!(result, Err(AppConfigError::Validation(errors)) => {
            assert!(errors.field_errors().contains_key("fee_schedules"));
        });
    }

    #[test]
    fn rejects_unknown_currency_key() {
        let result = from_toml(
            r#"
            [fee_schedules.xyz]
            transaction_fee_rate = "0.01"
            "#,
        );
        assert_matches!(result, Err(AppConfigError::Validation(_)));
    }

    #[test]
    fn rejects_bad_log_level() {
        let result = from_toml(r#"log_level = "verbose""#);
        assert_matches!(result, Err(AppConfigError::Validation(errors)) => {
            assert!(errors.field_errors().contains_key("log_level"));
        });
    }

    #[test]
    fn profile_file_overrides_default_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "environment = \"staging\"\nlog_level = \"warn\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("production.toml"),
            "environment = \"production\"\n\n[fee_schedules.gbp]\ntransaction_fee_rate = \"0.025\"\nadditional_fee = \"0.20\"\n",
        )
        .unwrap();

        let cfg = load_config_from(dir.path(), "production").unwrap();
        assert!(cfg.is_production());
        assert_eq!(cfg.log_level(), "warn");
        assert_eq!(cfg.fee_schedules["gbp"].smallest_unit_factor, 100);
    }

    #[test]
    fn missing_directory_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config_from(&dir.path().join("absent"), "development").unwrap();
        assert!(cfg.fee_schedules.contains_key("usd"));
    }
}
