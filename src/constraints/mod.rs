//! Constraint evaluators and the validator that runs them.
//!
//! Each evaluator is a pure check `scenario → (violations, warnings)`.
//! Evaluators are independent of each other and their order does not
//! matter; the [`Validator`] runs every registered evaluator and merges the
//! results into a deterministically sorted [`ValidationReport`].
//!
//! # Usage
//!
//! ```
//! use u_portfolio::config::EngineConfig;
//! use u_portfolio::constraints::Validator;
//! use u_portfolio::models::{CapacityPlan, ScenarioView, WorkItem, ViolationCode};
//!
//! let plan = CapacityPlan::uniform(2, [("backend", 10)]);
//! let items = vec![WorkItem::new("big").with_demand("backend", 25).with_start(0)];
//!
//! let validator = Validator::standard(&EngineConfig::default());
//! let report = validator.validate(&ScenarioView::new(&items, &plan));
//! assert_eq!(report.violations[0].code, ViolationCode::CapacityExceeded);
//! ```

mod capacity;
mod cycle;
mod dependency;
mod temporal;

pub use capacity::CapacityEvaluator;
pub use cycle::CycleEvaluator;
pub use dependency::DependencyEvaluator;
pub use temporal::TemporalFitEvaluator;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::models::{ScenarioView, Violation, Warning};

/// Rule families a decision can be checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    /// Item existence and patch well-formedness.
    Structural,
    /// Allocated units against capacity.
    CapacityCheck,
    /// Items start after their dependencies finish.
    DependencyOrder,
    /// Items fit inside the horizon.
    TemporalFit,
    /// The dependency graph is acyclic.
    CycleCheck,
}

/// Output of one evaluator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
}

impl Evaluation {
    /// Creates an empty evaluation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing was found.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.warnings.is_empty()
    }
}

/// A pure scenario check.
pub trait ConstraintEvaluator: Send + Sync + Debug {
    /// Rule family this evaluator covers (registry key).
    fn kind(&self) -> ConstraintKind;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Evaluates a scenario.
    fn evaluate(&self, view: &ScenarioView<'_>) -> Evaluation;
}

/// Merged result of all evaluators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
    pub constraints_evaluated: Vec<ConstraintKind>,
}

impl ValidationReport {
    /// Whether there are no violations (warnings allowed).
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Registry of evaluators keyed by [`ConstraintKind`].
#[derive(Clone, Default)]
pub struct Validator {
    evaluators: BTreeMap<ConstraintKind, Arc<dyn ConstraintEvaluator>>,
}

impl Validator {
    /// Creates an empty validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a validator with the capacity, dependency, temporal-fit and
    /// cycle evaluators registered.
    pub fn standard(config: &EngineConfig) -> Self {
        Self::new()
            .with_evaluator(CapacityEvaluator::new(config.near_capacity_threshold))
            .with_evaluator(DependencyEvaluator)
            .with_evaluator(TemporalFitEvaluator)
            .with_evaluator(CycleEvaluator)
    }

    /// Registers an evaluator, replacing any with the same kind.
    pub fn register<E: ConstraintEvaluator + 'static>(&mut self, evaluator: E) {
        self.evaluators.insert(evaluator.kind(), Arc::new(evaluator));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_evaluator<E: ConstraintEvaluator + 'static>(mut self, evaluator: E) -> Self {
        self.register(evaluator);
        self
    }

    /// Registered kinds in order.
    pub fn kinds(&self) -> Vec<ConstraintKind> {
        self.evaluators.keys().copied().collect()
    }

    /// Runs every evaluator and merges the results.
    pub fn validate(&self, view: &ScenarioView<'_>) -> ValidationReport {
        let mut report = ValidationReport {
            constraints_evaluated: self.kinds(),
            ..Default::default()
        };

        for evaluator in self.evaluators.values() {
            let evaluation = evaluator.evaluate(view);
            tracing::debug!(
                evaluator = evaluator.name(),
                violations = evaluation.violations.len(),
                warnings = evaluation.warnings.len(),
                "evaluator finished"
            );
            report.violations.extend(evaluation.violations);
            report.warnings.extend(evaluation.warnings);
        }

        sort_violations(&mut report.violations);
        sort_warnings(&mut report.warnings);
        report
    }
}

impl Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field(
                "evaluators",
                &self.evaluators.values().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Sorts violations by code, affected items, then message.
pub(crate) fn sort_violations(violations: &mut [Violation]) {
    violations.sort_by(|a, b| {
        a.code
            .cmp(&b.code)
            .then_with(|| a.affected_item_ids.cmp(&b.affected_item_ids))
            .then_with(|| a.message.cmp(&b.message))
    });
}

/// Sorts warnings by code, affected items, then message.
pub(crate) fn sort_warnings(warnings: &mut [Warning]) {
    warnings.sort_by(|a, b| {
        a.code
            .cmp(&b.code)
            .then_with(|| a.affected_item_ids.cmp(&b.affected_item_ids))
            .then_with(|| a.message.cmp(&b.message))
    });
}
