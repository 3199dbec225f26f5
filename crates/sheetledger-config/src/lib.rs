//! Configuration management for sheetledger
//!
//! This module handles loading, validation, and management of
//! sheetledger configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Ledger sheet location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the exported ledger sheet (CSV)
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
    /// Secondary sheet that mirrors advance rows (optional)
    #[serde(default)]
    pub advance_path: Option<PathBuf>,
    /// Number of header rows at the top of each sheet
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            advance_path: None,
            header_rows: default_header_rows(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./data/ledger.csv")
}

fn default_header_rows() -> usize {
    1
}

/// Transaction cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable the in-memory month cache
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Entry lifetime in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    300
}

/// Classification vocabulary for rows
///
/// All comparisons are made on trimmed, lowercased text, except
/// `fuel_subcategory` which must match exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Direction flags that mean "income"
    #[serde(default = "default_income_flags")]
    pub income_flags: Vec<String>,
    /// Categories that are always income, whatever the stored flag says
    #[serde(default = "default_income_categories")]
    pub income_categories: Vec<String>,
    /// Payment-method values that put a row on the cash ledger
    #[serde(default = "default_cash_payment_methods")]
    pub cash_payment_methods: Vec<String>,
    /// Category substrings that put a row on the cash ledger
    #[serde(default = "default_cash_category_keywords")]
    pub cash_category_keywords: Vec<String>,
    /// Categories whose rows are also appended to the advance sheet
    #[serde(default = "default_mirror_categories")]
    pub mirror_categories: Vec<String>,
    /// Category substring for vehicle costs
    #[serde(default = "default_fuel_category")]
    pub fuel_category: String,
    /// Sub-category label for fuel purchases
    #[serde(default = "default_fuel_subcategory")]
    pub fuel_subcategory: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            income_flags: default_income_flags(),
            income_categories: default_income_categories(),
            cash_payment_methods: default_cash_payment_methods(),
            cash_category_keywords: default_cash_category_keywords(),
            mirror_categories: default_mirror_categories(),
            fuel_category: default_fuel_category(),
            fuel_subcategory: default_fuel_subcategory(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_income_flags() -> Vec<String> {
    strings(&["income", "in", "thu", "thu nhập", "thu nhap", "nhận", "nhan"])
}

fn default_income_categories() -> Vec<String> {
    strings(&[
        "account advance",
        "cash advance",
        "refund",
        "ứng tài khoản",
        "ứng tiền mặt",
        "hoàn tiền",
    ])
}

fn default_cash_payment_methods() -> Vec<String> {
    strings(&["cash", "tiền mặt", "tien mat"])
}

fn default_cash_category_keywords() -> Vec<String> {
    strings(&["cash", "tiền mặt"])
}

fn default_mirror_categories() -> Vec<String> {
    strings(&["account advance", "ứng tài khoản"])
}

fn default_fuel_category() -> String {
    "car expense".to_string()
}

fn default_fuel_subcategory() -> String {
    "Fuel".to_string()
}

/// Currency and number formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Currency label used in reports
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// Characters stripped from amount cells before parsing
    #[serde(default = "default_thousands_separators")]
    pub thousands_separators: Vec<char>,
    /// Decimal separator, if amounts carry fractions
    #[serde(default)]
    pub decimal_separator: Option<char>,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
            thousands_separators: default_thousands_separators(),
            decimal_separator: None,
        }
    }
}

fn default_currency() -> String {
    "VND".to_string()
}

fn default_thousands_separators() -> Vec<char> {
    vec![',', '.']
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Sheet locations
    #[serde(default)]
    pub data: DataConfig,
    /// Month cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Classification vocabulary
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Currency settings
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            },
            _ => ConfigError::IoError(e),
        })?;

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::InvalidYaml { message: e.to_string() })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.enabled && self.cache.ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.ttl_secs".to_string(),
                reason: "TTL must be greater than 0 when the cache is enabled".to_string(),
            });
        }

        if let Some(sep) = self.currency.decimal_separator {
            if self.currency.thousands_separators.contains(&sep) {
                return Err(ConfigError::InvalidValue {
                    field: "currency.decimal_separator".to_string(),
                    reason: format!("'{}' is also listed as a thousands separator", sep),
                });
            }
        }

        if self.ledger.fuel_subcategory.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ledger.fuel_subcategory".to_string(),
                reason: "Fuel sub-category must not be empty".to_string(),
            });
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => {}
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "logging.level".to_string(),
                    reason: format!("Unknown log level: {}", other),
                });
            }
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Cache lifetime as a duration (zero when the cache is disabled)
    pub fn cache_ttl(&self) -> std::time::Duration {
        if self.cache.enabled {
            std::time::Duration::from_secs(self.cache.ttl_secs)
        } else {
            std::time::Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.data.header_rows, 1);
        assert!(config.ledger.income_categories.iter().any(|c| c == "refund"));
    }

    #[test]
    fn test_bundled_template_parses() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        assert_eq!(config.currency.default_currency, "VND");
        assert_eq!(config.ledger.fuel_subcategory, "Fuel");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_yaml("cache:\n  ttl_secs: 60\n").unwrap();
        assert_eq!(config.cache.ttl_secs, 60);
        assert!(config.cache.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_rejects_conflicting_separators() {
        let yaml = "currency:\n  thousands_separators: [',', '.']\n  decimal_separator: '.'\n";
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "currency.decimal_separator"));
    }

    #[test]
    fn test_rejects_zero_ttl() {
        let err = Config::from_yaml("cache:\n  ttl_secs: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_disabled_cache_has_zero_ttl() {
        let config = Config::from_yaml("cache:\n  enabled: false\n  ttl_secs: 0\n").unwrap();
        assert_eq!(config.cache_ttl(), std::time::Duration::ZERO);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(PathBuf::from("/nonexistent/sheetledger.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data:\n  path: /tmp/ledger.csv\n  header_rows: 0").unwrap();
        let config = Config::load(file.path().to_path_buf()).unwrap();
        assert_eq!(config.data.path, PathBuf::from("/tmp/ledger.csv"));
        assert_eq!(config.data.header_rows, 0);
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::from_yaml("data: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidYaml { .. }));
    }
}
