//! Configuration issues.
//!
//! Config loading collects every problem it finds instead of stopping at the
//! first one. Errors make the configuration unusable; warnings are logged
//! and the affected value falls back to something sensible.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A required string is empty.
    EmptyValue { field: String },
    /// A numeric value is outside its allowed range.
    OutOfRange { field: String },
    /// A string does not name a known variant.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    /// A value required by another setting is missing.
    MissingValue { field: String, required_by: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
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

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_severity() {
        let code = ConfigIssueCode::EmptyValue {
            field: "model.name".to_string(),
        };
        assert!(ConfigIssue::error(code.clone(), "empty").is_error());
        assert!(!ConfigIssue::warning(code, "empty").is_error());
    }
}
