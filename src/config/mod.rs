use std::env;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::workflows::origination::applications::UnderwritingConfig;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for an embedding process.
///
/// Underwriting thresholds start from [`UnderwritingConfig::default`] and can
/// be overridden one variable at a time.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub log_level: String,
    pub underwriting: UnderwritingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("ORIGINATION_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level =
            env::var("ORIGINATION_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let mut underwriting = UnderwritingConfig::default();
        if let Ok(value) = env::var("ORIGINATION_MIN_CREDIT_SCORE") {
            underwriting.minimum_credit_score = value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidInteger {
                    variable: "ORIGINATION_MIN_CREDIT_SCORE",
                })?;
        }
        if let Ok(value) = env::var("ORIGINATION_REFERRAL_RISK_THRESHOLD") {
            underwriting.referral_risk_threshold = value
                .trim()
                .parse::<u8>()
                .map_err(|_| ConfigError::InvalidInteger {
                    variable: "ORIGINATION_REFERRAL_RISK_THRESHOLD",
                })?;
        }
        if let Ok(value) = env::var("ORIGINATION_MIN_MONTHLY_INCOME") {
            underwriting.minimum_monthly_income = parse_decimal(
                &value,
                "ORIGINATION_MIN_MONTHLY_INCOME",
            )?;
        }
        if let Ok(value) = env::var("ORIGINATION_MAX_DEBT_TO_INCOME") {
            underwriting.maximum_debt_to_income =
                parse_decimal(&value, "ORIGINATION_MAX_DEBT_TO_INCOME")?;
        }

        Ok(Self {
            environment,
            log_level,
            underwriting,
        })
    }
}

fn parse_decimal(value: &str, variable: &'static str) -> Result<Decimal, ConfigError> {
    let parsed =
        Decimal::from_str(value.trim()).map_err(|_| ConfigError::InvalidDecimal { variable })?;
    if parsed.is_sign_negative() {
        return Err(ConfigError::InvalidDecimal { variable });
    }
    Ok(parsed)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidInteger { variable: &'static str },
    InvalidDecimal { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidInteger { variable } => {
                write!(f, "{variable} must be a non-negative integer")
            }
            ConfigError::InvalidDecimal { variable } => {
                write!(f, "{variable} must be a non-negative decimal")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
