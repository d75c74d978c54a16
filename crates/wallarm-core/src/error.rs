use thiserror::Error;

/// Core error types for condition, point and identifier handling
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown locator kind: {0}")]
    UnknownLocator(String),

    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    #[error("Invalid number for {locator} locator: {value:?}")]
    InvalidNumber { locator: String, value: String },

    #[error("Invalid rule point: {0}")]
    InvalidPoint(String),

    #[error("Invalid resource ID {id:?}: expected format \"{expected}\"")]
    InvalidResourceId { id: String, expected: &'static str },

    #[error("Unknown rule type: {0}")]
    UnknownRuleType(String),
}

impl CoreError {
    /// Create a new UnknownLocator error
    pub fn unknown_locator(kind: impl Into<String>) -> Self {
        Self::UnknownLocator(kind.into())
    }

    /// Create a new InvalidCondition error
    pub fn invalid_condition(message: impl Into<String>) -> Self {
        Self::InvalidCondition(message.into())
    }

    /// Create a new InvalidNumber error
    pub fn invalid_number(locator: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidNumber {
            locator: locator.into(),
            value: value.into(),
        }
    }

    /// Create a new InvalidPoint error
    pub fn invalid_point(message: impl Into<String>) -> Self {
        Self::InvalidPoint(message.into())
    }

    /// Create a new InvalidResourceId error
    pub fn invalid_resource_id(id: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidResourceId {
            id: id.into(),
            expected,
        }
    }

    /// Create a new UnknownRuleType error
    pub fn unknown_rule_type(rule_type: impl Into<String>) -> Self {
        Self::UnknownRuleType(rule_type.into())
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownLocator(_) | Self::InvalidCondition(_) => ErrorCategory::Condition,
            Self::InvalidNumber { .. } => ErrorCategory::Parse,
            Self::InvalidPoint(_) => ErrorCategory::Point,
            Self::InvalidResourceId { .. } | Self::UnknownRuleType(_) => ErrorCategory::Validation,
        }
    }
}

/// Error categories for logging and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Condition,
    Parse,
    Point,
    Validation,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Condition => write!(f, "condition"),
            Self::Parse => write!(f, "parse"),
            Self::Point => write!(f, "point"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_number_error() {
        let err = CoreError::invalid_number("path", "abc");
        assert_eq!(err.to_string(), "Invalid number for path locator: \"abc\"");
        assert_eq!(err.category(), ErrorCategory::Parse);
    }

    #[test]
    fn test_invalid_resource_id_error() {
        let err = CoreError::invalid_resource_id("1/2", "{clientID}/{actionID}/{ruleID}");
        assert_eq!(
            err.to_string(),
            "Invalid resource ID \"1/2\": expected format \"{clientID}/{actionID}/{ruleID}\""
        );
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(ErrorCategory::Condition.to_string(), "condition");
        assert_eq!(ErrorCategory::Parse.to_string(), "parse");
        assert_eq!(ErrorCategory::Point.to_string(), "point");
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
    }

    #[test]
    fn test_condition_errors_share_category() {
        assert_eq!(
            CoreError::unknown_locator("cookie").category(),
            ErrorCategory::Condition
        );
        assert_eq!(
            CoreError::invalid_condition("two locators").category(),
            ErrorCategory::Condition
        );
    }
}
