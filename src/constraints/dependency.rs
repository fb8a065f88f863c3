//! Dependency timing evaluator.
//!
//! A scheduled item may not start before each of its dependencies
//! finishes: `item.start >= dependency.start + dependency.duration`.
//! Dependencies that are missing or unscheduled also fail the check unless
//! they are already complete.

use super::{ConstraintEvaluator, ConstraintKind, Evaluation};
use crate::models::{ScenarioView, Violation, ViolationCode, ViolationDetail};

/// Checks dependency ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyEvaluator;

impl ConstraintEvaluator for DependencyEvaluator {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::DependencyOrder
    }

    fn name(&self) -> &'static str {
        "dependency"
    }

    fn evaluate(&self, view: &ScenarioView<'_>) -> Evaluation {
        let mut evaluation = Evaluation::new();

        for item in view.items() {
            let Some(start) = item.start_period else {
                continue;
            };
            let mut deps: Vec<&String> = item.dependencies.iter().collect();
            deps.sort();
            deps.dedup();

            for dep_id in deps {
                let dependency = view.item(dep_id);
                if dependency.is_some_and(|d| d.status.is_done()) {
                    continue;
                }
                let dependency_end = dependency.and_then(|d| d.end_period());
                let message = match (dependency, dependency_end) {
                    (None, _) => format!("'{}' depends on '{dep_id}', which is not in the portfolio", item.id),
                    (Some(_), None) => format!("'{}' depends on '{dep_id}', which is not scheduled", item.id),
                    (Some(_), Some(end)) if start < end => format!(
                        "'{}' starts in period {start} before '{dep_id}' finishes (period {end})",
                        item.id
                    ),
                    _ => continue,
                };
                evaluation.violations.push(Violation::new(
                    ViolationCode::DependencyNotScheduled,
                    message,
                    vec![item.id.clone(), dep_id.clone()],
                    ViolationDetail::Dependency {
                        dependency_id: dep_id.clone(),
                        dependency_end,
                        start,
                    },
                ));
            }
        }
        evaluation
    }
}
