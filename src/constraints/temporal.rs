//! Temporal-fit evaluator: scheduled items must end within the horizon.

use super::{ConstraintEvaluator, ConstraintKind, Evaluation};
use crate::models::{ScenarioView, Violation, ViolationCode, ViolationDetail};

/// Checks `start + duration <= horizon`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalFitEvaluator;

impl ConstraintEvaluator for TemporalFitEvaluator {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::TemporalFit
    }

    fn name(&self) -> &'static str {
        "temporal-fit"
    }

    fn evaluate(&self, view: &ScenarioView<'_>) -> Evaluation {
        let horizon = view.plan().horizon();
        let violations = view
            .items()
            .filter_map(|item| {
                let start = item.start_period?;
                let end = start.saturating_add(item.duration);
                (end > horizon).then(|| {
                    Violation::new(
                        ViolationCode::PeriodConflict,
                        format!(
                            "'{}' runs periods {start}..{end} past the {horizon}-period horizon",
                            item.id
                        ),
                        vec![item.id.clone()],
                        ViolationDetail::Temporal {
                            start,
                            end,
                            horizon,
                        },
                    )
                })
            })
            .collect();
        Evaluation {
            violations,
            warnings: Vec::new(),
        }
    }
}
