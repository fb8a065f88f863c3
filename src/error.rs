//! Error types for construction-time failures.
//!
//! Only malformed input fails with an error. Rule breaches found while
//! evaluating a scenario are returned as [`Violation`](crate::models::Violation)
//! values instead.

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type for portfolio operations.
pub type Result<T> = std::result::Result<T, PortfolioError>;

/// Errors raised when input cannot be accepted at all.
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Two work items share the same ID.
    #[error("duplicate item id: {0}")]
    DuplicateId(String),

    /// A dependency list references an item that does not exist.
    #[error("item '{item_id}' references unknown dependency '{dependency_id}'")]
    UnknownDependency {
        item_id: String,
        dependency_id: String,
    },

    /// The requested item is not part of the portfolio.
    #[error("item not found: {0}")]
    ItemNotFound(String),

    /// A period index lies outside the planning horizon.
    #[error("period {period} is outside the planning horizon ({horizon} periods)")]
    InvalidPeriod { period: usize, horizon: usize },

    /// The dependency graph has no topological order.
    #[error("dependency cycle detected: {}", .0.join(" -> "))]
    CycleDetected(Vec<String>),

    /// A capacity plan is malformed.
    #[error("invalid capacity plan: {0}")]
    InvalidPlan(String),

    /// Batch input validation failed.
    #[error("invalid input: {} problem(s), first: {}", .0.len(), first_message(.0))]
    InvalidInput(Vec<ValidationError>),

    /// The requested path exists in the API but has no implementation yet.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// Engine configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

fn first_message(errors: &[ValidationError]) -> &str {
    errors.first().map(|e| e.message.as_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_error_messages() {
        let e = PortfolioError::UnknownDependency {
            item_id: "auth".into(),
            dependency_id: "ghost".into(),
        };
        assert_eq!(
            e.to_string(),
            "item 'auth' references unknown dependency 'ghost'"
        );

        let e = PortfolioError::CycleDetected(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(e.to_string(), "dependency cycle detected: a -> b -> a");
    }

    #[test]
    fn test_invalid_input_message() {
        let e = PortfolioError::InvalidInput(vec![ValidationError {
            kind: ValidationErrorKind::DuplicateId,
            message: "Duplicate item ID: x".into(),
        }]);
        assert!(e.to_string().contains("1 problem(s)"));
        assert!(e.to_string().contains("Duplicate item ID: x"));
    }
}
