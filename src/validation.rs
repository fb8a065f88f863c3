//! Input validation for portfolio data.
//!
//! Checks structural integrity of work items against a capacity plan
//! before any decision runs. Detects:
//! - Duplicate item IDs
//! - Dependencies on items that don't exist
//! - Zero durations
//! - Start periods outside the horizon
//! - Negative demand
//!
//! Dependency cycles are *not* input errors: they are reported as
//! DEPENDENCY_CYCLE violations during evaluation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::{CapacityPlan, WorkItem};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// Two items share the same ID.
    DuplicateId,
    /// An item depends on an ID that doesn't exist.
    UnknownDependency,
    /// An item has zero duration.
    InvalidDuration,
    /// An item starts outside the planning horizon.
    InvalidPeriod,
    /// An item demands a negative number of units.
    NegativeDemand,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates items against a plan.
///
/// Checks:
/// 1. No duplicate item IDs
/// 2. Every dependency references an existing item
/// 3. Every duration is at least one period
/// 4. Every start period lies inside the horizon
/// 5. No negative demand
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(items: &[WorkItem], plan: &CapacityPlan) -> ValidationResult {
    let mut errors = Vec::new();

    let mut ids = HashSet::new();
    for item in items {
        if !ids.insert(item.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate item ID: {}", item.id),
            ));
        }
    }

    for item in items {
        for dep in &item.dependencies {
            if !ids.contains(dep.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownDependency,
                    format!("Item '{}' depends on unknown item '{}'", item.id, dep),
                ));
            }
        }

        if item.duration == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!("Item '{}' has zero duration", item.id),
            ));
        }

        if let Some(start) = item.start_period {
            if start >= plan.horizon() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidPeriod,
                    format!(
                        "Item '{}' starts in period {} but the horizon has {} periods",
                        item.id,
                        start,
                        plan.horizon()
                    ),
                ));
            }
        }

        for (skill, &units) in &item.demand {
            if units < 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NegativeDemand,
                    format!("Item '{}' demands {} units of '{}'", item.id, units, skill),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> CapacityPlan {
        CapacityPlan::uniform(6, [("backend", 60), ("frontend", 50)])
    }

    fn sample_items() -> Vec<WorkItem> {
        vec![
            WorkItem::new("platform").with_demand("backend", 40),
            WorkItem::new("auth")
                .with_demand("frontend", 20)
                .with_dependency("platform")
                .with_start(1),
        ]
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_input(&sample_items(), &sample_plan()).is_ok());
    }

    #[test]
    fn test_empty_input() {
        assert!(validate_input(&[], &sample_plan()).is_ok());
    }

    #[test]
    fn test_duplicate_id() {
        let items = vec![WorkItem::new("a"), WorkItem::new("a")];
        let errors = validate_input(&items, &sample_plan()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_unknown_dependency() {
        let items = vec![WorkItem::new("a").with_dependency("ghost")];
        let errors = validate_input(&items, &sample_plan()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownDependency && e.message.contains("ghost")));
    }

    #[test]
    fn test_zero_duration() {
        let items = vec![WorkItem::new("a").with_duration(0)];
        let errors = validate_input(&items, &sample_plan()).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidDuration);
    }

    #[test]
    fn test_start_outside_horizon() {
        let items = vec![WorkItem::new("a").with_start(6)];
        let errors = validate_input(&items, &sample_plan()).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidPeriod);
    }

    #[test]
    fn test_cycle_is_not_an_input_error() {
        let items = vec![
            WorkItem::new("a").with_dependency("b"),
            WorkItem::new("b").with_dependency("a"),
        ];
        assert!(validate_input(&items, &sample_plan()).is_ok());
    }

    #[test]
    fn test_multiple_errors() {
        let items = vec![
            WorkItem::new("a").with_duration(0).with_demand("backend", -5),
            WorkItem::new("b").with_dependency("nope").with_start(99),
        ];
        let errors = validate_input(&items, &sample_plan()).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
