//! Configuration management for finboard
//!
//! This module handles loading, validation, and management of
//! finboard configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigErrorDetails, ConfigErrorSeverity, ConfigResult};

/// Currency every rate in the table is expressed against
pub const BASE_CURRENCY: &str = "PKR";

// ==================== Configuration Types ====================

/// Data source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the JSON snapshot exported from the data service
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./data/snapshot.json")
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Currency, exchange rate and number formatting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Currency with rate 1 in the table
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// Display currency used when the viewer has no preference
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// Rates relative to the base currency (1 base = rate units)
    #[serde(default = "default_rates")]
    pub rates: BTreeMap<String, f64>,
    /// Display symbols per currency code
    #[serde(default = "default_symbols")]
    pub symbols: BTreeMap<String, String>,
    /// Number of decimal places
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Thousands separator
    #[serde(default = "default_thousands_sep")]
    pub thousands_separator: String,
    /// Decimal separator
    #[serde(default = "default_decimal_sep")]
    pub decimal_separator: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            default_currency: default_currency(),
            rates: default_rates(),
            symbols: default_symbols(),
            decimal_places: default_decimal_places(),
            thousands_separator: default_thousands_sep(),
            decimal_separator: default_decimal_sep(),
        }
    }
}

impl CurrencyConfig {
    /// Display symbol for a currency, falling back to the code itself
    pub fn symbol<'a>(&'a self, code: &'a str) -> &'a str {
        self.symbols.get(code).map(String::as_str).unwrap_or(code)
    }
}

fn default_base_currency() -> String {
    BASE_CURRENCY.to_string()
}

fn default_currency() -> String {
    BASE_CURRENCY.to_string()
}

fn default_rates() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("PKR".to_string(), 1.0),
        ("USD".to_string(), 0.0036),
        ("EUR".to_string(), 0.0033),
        ("GBP".to_string(), 0.0028),
        ("JPY".to_string(), 0.54),
    ])
}

fn default_symbols() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("PKR".to_string(), "Rs".to_string()),
        ("USD".to_string(), "$".to_string()),
        ("EUR".to_string(), "€".to_string()),
        ("GBP".to_string(), "£".to_string()),
        ("JPY".to_string(), "¥".to_string()),
    ])
}

fn default_decimal_places() -> u32 {
    2
}

fn default_thousands_sep() -> String {
    ",".to_string()
}

fn default_decimal_sep() -> String {
    ".".to_string()
}

/// Budget health thresholds, in percent of the allocated amount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Spending at or above this share marks a budget at risk
    #[serde(default = "default_at_risk")]
    pub at_risk_threshold: f64,
    /// Spending at or above this share marks a budget over budget
    #[serde(default = "default_over_budget")]
    pub over_budget_threshold: f64,
    /// Variance analytics flag a budget critical from this share until it is fully spent
    #[serde(default = "default_variance_critical")]
    pub variance_critical_threshold: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            at_risk_threshold: default_at_risk(),
            over_budget_threshold: default_over_budget(),
            variance_critical_threshold: default_variance_critical(),
        }
    }
}

fn default_at_risk() -> f64 {
    75.0
}

fn default_over_budget() -> f64 {
    90.0
}

fn default_variance_critical() -> f64 {
    80.0
}

/// Dashboard list sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Number of transactions in the recent activity feed
    #[serde(default = "default_recent_activity")]
    pub recent_activity_count: usize,
    /// Number of categories in the spending breakdown
    #[serde(default = "default_top_categories")]
    pub top_categories_count: usize,
    /// Number of rows in the top income and expense description tables
    #[serde(default = "default_top_descriptions")]
    pub top_descriptions_count: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_activity_count: default_recent_activity(),
            top_categories_count: default_top_categories(),
            top_descriptions_count: default_top_descriptions(),
        }
    }
}

fn default_recent_activity() -> usize {
    5
}

fn default_top_categories() -> usize {
    4
}

fn default_top_descriptions() -> usize {
    5
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Data source settings
    #[serde(default)]
    pub data: DataConfig,
    /// Currency settings
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Budget thresholds
    #[serde(default)]
    pub budgets: BudgetConfig,
    /// Dashboard settings
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::IoError)?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(content).map_err(|_| ConfigError::InvalidYaml)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        let currency = &self.currency;

        for (code, rate) in &currency.rates {
            if !rate.is_finite() || *rate <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("currency.rates.{}", code),
                    reason: "Exchange rates must be positive numbers".to_string(),
                });
            }
        }

        match currency.rates.get(&currency.base_currency) {
            None => {
                return Err(ConfigError::MissingField {
                    field: format!("currency.rates.{}", currency.base_currency),
                })
            }
            Some(rate) if (*rate - 1.0).abs() > f64::EPSILON => {
                return Err(ConfigError::InvalidValue {
                    field: format!("currency.rates.{}", currency.base_currency),
                    reason: "The base currency must have a rate of 1".to_string(),
                });
            }
            Some(_) => {}
        }

        if !currency.rates.contains_key(&currency.default_currency) {
            return Err(ConfigError::InvalidValue {
                field: "currency.default_currency".to_string(),
                reason: format!("No exchange rate configured for {}", currency.default_currency),
            });
        }

        if currency.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "currency.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        let budgets = &self.budgets;
        if budgets.at_risk_threshold <= 0.0 || budgets.at_risk_threshold > budgets.over_budget_threshold {
            return Err(ConfigError::ValidationError {
                message: "budgets.at_risk_threshold must be positive and not exceed budgets.over_budget_threshold"
                    .to_string(),
            });
        }
        if budgets.variance_critical_threshold <= 0.0 || budgets.variance_critical_threshold > 100.0 {
            return Err(ConfigError::InvalidValue {
                field: "budgets.variance_critical_threshold".to_string(),
                reason: "Must be above 0 and at most 100".to_string(),
            });
        }

        if !matches!(
            self.logging.level.to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error" | "off"
        ) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: "Log level must be one of trace, debug, info, warn, error, off".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }
}
