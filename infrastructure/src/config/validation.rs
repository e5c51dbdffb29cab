//! Structured configuration issues.
//!
//! [`FileConfig::validate`](super::FileConfig::validate) reports every
//! problem at once instead of stopping at the first one.

use std::fmt;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the run cannot start.
    Error,
    /// Non-fatal: the run starts but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A numeric value outside its allowed range.
    OutOfRange { field: String },
    /// A string that does not name a known variant.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    /// The progressive temperature schedule is unusable.
    InvalidSchedule,
    /// A required value is empty.
    Empty { field: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn out_of_range(field: &str, message: impl Into<String>) -> Self {
        Self::error(
            ConfigIssueCode::OutOfRange {
                field: field.to_string(),
            },
            message,
        )
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}
