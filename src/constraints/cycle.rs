//! Cycle evaluator: reports each dependency cycle as a violation.

use super::{ConstraintEvaluator, ConstraintKind, Evaluation};
use crate::graph::DependencyGraph;
use crate::models::{ScenarioView, Violation};

/// Checks that the dependency graph is acyclic.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleEvaluator;

impl ConstraintEvaluator for CycleEvaluator {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::CycleCheck
    }

    fn name(&self) -> &'static str {
        "cycle"
    }

    fn evaluate(&self, view: &ScenarioView<'_>) -> Evaluation {
        let graph = DependencyGraph::partial(view.items());
        Evaluation {
            violations: graph
                .detect_cycles()
                .into_iter()
                .map(Violation::dependency_cycle)
                .collect(),
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CapacityPlan, ViolationCode, WorkItem};

    #[test]
    fn test_cycle_reported() {
        let plan = CapacityPlan::new(3);
        let items = vec![
            WorkItem::new("a").with_dependency("c"),
            WorkItem::new("b").with_dependency("a"),
            WorkItem::new("c").with_dependency("b"),
            WorkItem::new("d"),
        ];
        let e = CycleEvaluator.evaluate(&ScenarioView::new(&items, &plan));
        assert_eq!(e.violations.len(), 1);
        assert_eq!(e.violations[0].code, ViolationCode::DependencyCycle);
        assert_eq!(e.violations[0].affected_item_ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dangling_reference_is_not_a_cycle() {
        let plan = CapacityPlan::new(3);
        let items = vec![WorkItem::new("a").with_dependency("removed")];
        assert!(CycleEvaluator
            .evaluate(&ScenarioView::new(&items, &plan))
            .is_clean());
    }
}
