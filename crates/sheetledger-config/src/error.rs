//! Errors raised while loading or validating `config.yaml`

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable codes printed next to a config failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigErrorCode {
    FileNotFound,
    InvalidYaml,
    InvalidValue,
    IoError,
}

impl std::fmt::Display for ConfigErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ConfigErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ConfigErrorCode::InvalidYaml => "INVALID_YAML",
            ConfigErrorCode::InvalidValue => "INVALID_VALUE",
            ConfigErrorCode::IoError => "IO_ERROR",
        };
        f.write_str(code)
    }
}

/// What the CLI prints when the config cannot be used
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigErrorDetails {
    pub code: ConfigErrorCode,
    pub message: String,
    /// Dotted path of the offending key, e.g. `cache.ttl_secs`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

impl ConfigErrorDetails {
    fn new(code: ConfigErrorCode, message: String) -> Self {
        Self { code, message, field: None, hints: Vec::new() }
    }

    fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

impl std::fmt::Display for ConfigErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(field) = &self.field {
            write!(f, "\n  key: {}", field)?;
        }
        for hint in &self.hints {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Config is not valid YAML: {message}")]
    InvalidYaml { message: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Cannot read config: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConfigError {
    pub fn code(&self) -> ConfigErrorCode {
        match self {
            ConfigError::FileNotFound { .. } => ConfigErrorCode::FileNotFound,
            ConfigError::InvalidYaml { .. } => ConfigErrorCode::InvalidYaml,
            ConfigError::InvalidValue { .. } => ConfigErrorCode::InvalidValue,
            ConfigError::IoError(_) => ConfigErrorCode::IoError,
        }
    }

    /// Code, offending key and hints for the command line
    pub fn to_details(&self) -> ConfigErrorDetails {
        let details = ConfigErrorDetails::new(self.code(), self.to_string());
        match self {
            ConfigError::FileNotFound { .. } => {
                details.hint("Run `sheetledger init-config` to write a default config.yaml.")
            }
            ConfigError::InvalidYaml { .. } => {
                details.hint("Compare the file with the output of `sheetledger init-config`.")
            }
            ConfigError::InvalidValue { field, .. } => ConfigErrorDetails {
                field: Some(field.clone()),
                ..details
            },
            ConfigError::IoError(_) => details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_code() {
        let error = ConfigError::FileNotFound { path: "/etc/sheetledger.yaml".to_string() };
        assert_eq!(error.code(), ConfigErrorCode::FileNotFound);
        assert_eq!(error.code().to_string(), "FILE_NOT_FOUND");
        assert_eq!(error.to_details().hints.len(), 1);
    }

    #[test]
    fn test_invalid_value_details_carry_field() {
        let error = ConfigError::InvalidValue {
            field: "cache.ttl_secs".to_string(),
            reason: "must be positive".to_string(),
        };
        let details = error.to_details();
        assert_eq!(details.field.as_deref(), Some("cache.ttl_secs"));
        let printed = details.to_string();
        assert!(printed.starts_with("[INVALID_VALUE]"));
        assert!(printed.contains("must be positive"));
        assert!(printed.contains("key: cache.ttl_secs"));
    }
}
