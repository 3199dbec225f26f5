//! Error types for sheetledger-core
//!
//! Error codes, severities and detail payloads for ledger operations, plus
//! the logger used by the service when a read degrades to a zeroed snapshot.

use serde::{Deserialize, Serialize};
use sheetledger_sheet::SheetError;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Backing sheet could not be read or written
    StoreUnavailable,
    /// No row at the given position
    RowNotFound,
    /// Month outside 1..=12
    InvalidPeriod,
    /// Rejected input
    ValidationError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::StoreUnavailable => write!(f, "STORE_UNAVAILABLE"),
            ErrorCode::RowNotFound => write!(f, "ROW_NOT_FOUND"),
            ErrorCode::InvalidPeriod => write!(f, "INVALID_PERIOD"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
        }
    }
}

/// Detailed error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    /// Operation may be affected
    Warning,
    /// Operation failed
    Error,
    /// Application may be unusable
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

impl ErrorSeverity {
    /// Level the error logger reports at
    pub fn log_level(&self) -> log::Level {
        match self {
            ErrorSeverity::Info => log::Level::Info,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error | ErrorSeverity::Critical => log::Level::Error,
        }
    }
}

/// Main error type for sheetledger-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Row not found at position {position}")]
    RowNotFound { position: usize },

    #[error("Invalid period: month {month} of {year}")]
    InvalidPeriod { month: u32, year: i32 },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::StoreUnavailable { .. } => ErrorCode::StoreUnavailable,
            CoreError::RowNotFound { .. } => ErrorCode::RowNotFound,
            CoreError::InvalidPeriod { .. } => ErrorCode::InvalidPeriod,
            CoreError::ValidationError { .. } => ErrorCode::ValidationError,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::StoreUnavailable { .. } => ErrorSeverity::Error,
            CoreError::RowNotFound { .. } => ErrorSeverity::Info,
            CoreError::InvalidPeriod { .. } => ErrorSeverity::Warning,
            CoreError::ValidationError { .. } => ErrorSeverity::Warning,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::StoreUnavailable { .. } => {
                details = details.with_suggestion(
                    "Check that the ledger sheet path in the configuration exists and is readable.".to_string(),
                );
            }
            CoreError::RowNotFound { position } => {
                details = details.with_detail(serde_json::json!({ "position": position }));
                details = details.with_suggestion(
                    "Use the list command to see row positions for the month.".to_string(),
                );
            }
            CoreError::InvalidPeriod { month, year } => {
                details = details.with_detail(serde_json::json!({ "month": month, "year": year }));
                details = details.with_suggestion("Months are numbered 1 to 12.".to_string());
            }
            CoreError::ValidationError { message } => {
                details = details.with_detail(serde_json::json!({ "validation_message": message }));
            }
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<SheetError> for CoreError {
    fn from(error: SheetError) -> Self {
        match error {
            SheetError::RowNotFound { position } => CoreError::RowNotFound { position },
            other => CoreError::StoreUnavailable { message: other.to_string() },
        }
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Additional context data
    pub data: serde_json::Value,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            data: serde_json::json!({}),
        }
    }

    /// Add context data
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

/// Error logger trait
pub trait ErrorLogger: Send + Sync {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Debug, Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        let severity = error.severity();
        log::log!(
            target: "sheetledger::error",
            severity.log_level(),
            "{} [{}] {} - Operation: {} - Context: {}",
            severity.to_string().to_uppercase(),
            error.code(),
            error,
            context.operation,
            context.data
        );
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "sheetledger::error",
            "WARNING: {} - Operation: {} - Context: {}",
            message,
            context.operation,
            context.data
        );
    }
}
