//! Error types for finboard-core
//!
//! Errors carry a stable code and a severity so callers can decide whether a
//! dashboard panel degrades to a placeholder or the whole run aborts.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Amount is not a number
    InvalidAmount,
    /// Currency code missing from the rate table
    UnknownCurrencyCode,
    /// Percentage requested against a zero whole
    DivisionByZero,
    /// User profile not found
    UserNotFound,
    /// Record failed boundary validation
    ValidationError,
    /// Snapshot is not valid JSON or has the wrong shape
    InvalidFormat,
    /// IO error
    IoError,
    /// Configuration error
    ConfigError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::InvalidAmount => write!(f, "INVALID_AMOUNT"),
            ErrorCode::UnknownCurrencyCode => write!(f, "UNKNOWN_CURRENCY_CODE"),
            ErrorCode::DivisionByZero => write!(f, "DIVISION_BY_ZERO"),
            ErrorCode::UserNotFound => write!(f, "USER_NOT_FOUND"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::InvalidFormat => write!(f, "INVALID_FORMAT"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
            ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
        }
    }
}

/// Detailed error information for report output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    /// Create a new error detail
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
    /// Informational
    Info,
    /// Warning - a figure may be degraded
    Warning,
    /// Error - operation failed
    Error,
    /// Critical - nothing can be computed
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

/// Main error type for finboard-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid amount: {value}")]
    InvalidAmount { value: String },

    #[error("Unknown currency code: {code}")]
    UnknownCurrencyCode { code: String },

    #[error("Division by zero computing a percentage of {part}")]
    DivisionByZero { part: f64 },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            CoreError::UnknownCurrencyCode { .. } => ErrorCode::UnknownCurrencyCode,
            CoreError::DivisionByZero { .. } => ErrorCode::DivisionByZero,
            CoreError::UserNotFound { .. } => ErrorCode::UserNotFound,
            CoreError::ValidationError { .. } => ErrorCode::ValidationError,
            CoreError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            CoreError::IoError(_) => ErrorCode::IoError,
            CoreError::ConfigError { .. } => ErrorCode::ConfigError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::UnknownCurrencyCode { .. } => ErrorSeverity::Warning,
            CoreError::DivisionByZero { .. } => ErrorSeverity::Info,
            CoreError::InvalidAmount { .. } => ErrorSeverity::Warning,
            CoreError::UserNotFound { .. } => ErrorSeverity::Info,
            CoreError::ValidationError { .. } => ErrorSeverity::Warning,
            CoreError::InvalidFormat { .. } => ErrorSeverity::Error,
            CoreError::IoError(_) => ErrorSeverity::Error,
            CoreError::ConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    /// Whether a dashboard can keep rendering with a placeholder value
    pub fn is_recoverable(&self) -> bool {
        matches!(self.severity(), ErrorSeverity::Info | ErrorSeverity::Warning)
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::InvalidAmount { value } => {
                details = details
                    .with_detail(serde_json::json!({ "value": value }))
                    .with_suggestion("Amounts must be numbers or numeric strings.".to_string());
            }
            CoreError::UnknownCurrencyCode { code } => {
                details = details
                    .with_suggestion(format!("Add a rate for '{}' under currency.rates.", code))
                    .with_suggestion("Until then the amount is treated as base currency.".to_string());
            }
            CoreError::UserNotFound { .. } => {
                details = details.with_suggestion(
                    "Check that the snapshot contains the user's profile.".to_string(),
                );
            }
            CoreError::ValidationError { message } => {
                details = details.with_detail(serde_json::json!({ "validation_message": message }));
            }
            CoreError::InvalidFormat { .. } => {
                details = details.with_suggestion(
                    "The snapshot must be a JSON object with profiles, transactions, budgets, savings_goals and categories arrays."
                        .to_string(),
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<finboard_config::ConfigError> for CoreError {
    fn from(error: finboard_config::ConfigError) -> Self {
        CoreError::ConfigError {
            message: error.to_string(),
        }
    }
}

/// Log an error and substitute a fallback value.
///
/// Recoverable errors are logged as warnings, anything else as an error.
pub fn degrade<T>(result: CoreResult<T>, fallback: T, operation: &str) -> T {
    match result {
        Ok(value) => value,
        Err(error) => {
            let level = if error.is_recoverable() {
                log::Level::Warn
            } else {
                log::Level::Error
            };
            log::log!(
                target: "finboard::error",
                level,
                "[{}] {} ({}) - Operation: {} - using fallback",
                error.code(),
                error,
                error.severity(),
                operation
            );
            fallback
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::InvalidAmount.to_string(), "INVALID_AMOUNT");
        assert_eq!(ErrorCode::UnknownCurrencyCode.to_string(), "UNKNOWN_CURRENCY_CODE");
        assert_eq!(ErrorCode::DivisionByZero.to_string(), "DIVISION_BY_ZERO");
    }

    #[test]
    fn test_core_error_severity() {
        let error = CoreError::UnknownCurrencyCode { code: "CHF".to_string() };
        assert_eq!(error.severity(), ErrorSeverity::Warning);
        assert!(error.is_recoverable());

        let error = CoreError::ConfigError { message: "bad".to_string() };
        assert_eq!(error.severity(), ErrorSeverity::Critical);
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_invalid_amount_details() {
        let error = CoreError::InvalidAmount { value: "\"abc\"".to_string() };
        let details = error.to_details();

        assert_eq!(details.code, ErrorCode::InvalidAmount);
        assert!(details.details.is_some());
        assert!(details.message.contains("abc"));
    }

    #[test]
    fn test_io_error_conversion() {
        let error: CoreError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert_eq!(error.code(), ErrorCode::IoError);
    }

    #[test]
    fn test_config_error_conversion() {
        let error: CoreError = finboard_config::ConfigError::InvalidYaml.into();
        assert_eq!(error.code(), ErrorCode::ConfigError);
    }

    #[test]
    fn test_degrade_uses_fallback() {
        let failed: CoreResult<f64> = Err(CoreError::DivisionByZero { part: 5.0 });
        assert_eq!(degrade(failed, 0.0, "test"), 0.0);
        assert_eq!(degrade(Ok(42.0), 0.0, "test"), 42.0);

        let fatal: CoreResult<f64> = Err(CoreError::InvalidFormat { message: "bad".to_string() });
        assert_eq!(degrade(fatal, -1.0, "test"), -1.0);
    }
}
