//! Capacity evaluator.
//!
//! Sums allocation per (team, period). A cell whose allocation exceeds its
//! capacity is a violation naming every item allocated there; a cell above
//! the near-capacity threshold is a warning.

use std::collections::BTreeMap;

use super::{ConstraintEvaluator, ConstraintKind, Evaluation};
use crate::models::{ScenarioView, Violation, Warning, WarningCode};

/// Checks allocation against capacity.
#[derive(Debug, Clone)]
pub struct CapacityEvaluator {
    near_capacity_threshold: f64,
}

impl CapacityEvaluator {
    /// Creates an evaluator warning above `near_capacity_threshold` utilization.
    pub fn new(near_capacity_threshold: f64) -> Self {
        Self {
            near_capacity_threshold,
        }
    }
}

impl Default for CapacityEvaluator {
    fn default() -> Self {
        Self::new(0.85)
    }
}

impl ConstraintEvaluator for CapacityEvaluator {
    fn kind(&self) -> ConstraintKind {
        ConstraintKind::CapacityCheck
    }

    fn name(&self) -> &'static str {
        "capacity"
    }

    fn evaluate(&self, view: &ScenarioView<'_>) -> Evaluation {
        let matrix = view.matrix();
        let horizon = matrix.horizon();

        let mut contributors: BTreeMap<(&str, usize), Vec<String>> = BTreeMap::new();
        for item in view.items() {
            let Some(start) = item.start_period else {
                continue;
            };
            let end = start.saturating_add(item.duration).min(horizon);
            for (skill, &units) in &item.demand {
                if units <= 0 {
                    continue;
                }
                for period in start..end {
                    contributors
                        .entry((skill.as_str(), period))
                        .or_default()
                        .push(item.id.clone());
                }
            }
        }

        let mut evaluation = Evaluation::new();
        for (team, period, slot) in matrix.cells() {
            let affected = || contributors.get(&(team, period)).cloned().unwrap_or_default();
            if slot.is_overbooked() {
                evaluation.violations.push(Violation::capacity_exceeded(
                    team,
                    period,
                    slot.allocated,
                    slot.total,
                    affected(),
                ));
            } else if slot.total > 0 && slot.utilization > self.near_capacity_threshold {
                evaluation.warnings.push(Warning::new(
                    WarningCode::NearCapacity,
                    format!(
                        "'{team}' is at {:.0}% of capacity in period {period}",
                        slot.utilization * 100.0
                    ),
                    affected(),
                ));
            }
        }
        evaluation
    }
}
