//! What-if simulation.
//!
//! Copies live items and the plan into scratch state, applies a batch of
//! hypothetical changes in order, and compares the revalidated result with
//! the live baseline. Live state is never touched. A change that cannot be
//! applied (unknown item, invalid period, ...) is skipped and reported
//! instead of aborting the batch.
//!
//! New and resolved violations are a set difference keyed by
//! [`Violation::key`] (code plus affected items).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::log::{DecisionAction, DecisionResult, DecisionTimer, EntryDraft};
use super::GovernanceEngine;
use crate::capacity::CapacityMatrix;
use crate::models::{
    CapacityPlan, ProjectedScenario, ScenarioView, Violation, ViolationKey, Warning, WorkItem,
};

/// One hypothetical change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioChange {
    AddItem(WorkItem),
    RemoveItem {
        item_id: String,
    },
    MoveItem {
        item_id: String,
        start_period: usize,
    },
    ResizeItem {
        item_id: String,
        duration: Option<usize>,
        /// Replaces the whole demand map.
        demand: Option<BTreeMap<String, i64>>,
    },
    /// Adds `delta` units per period, or in one period when given.
    AddCapacity {
        skill: String,
        delta: i64,
        period: Option<usize>,
    },
    /// Removes `delta` units per period (clamped at zero).
    RemoveCapacity {
        skill: String,
        delta: i64,
        period: Option<usize>,
    },
}

impl ScenarioChange {
    /// Shorthand for adding capacity in every period.
    pub fn add_capacity(skill: impl Into<String>, delta: i64) -> Self {
        Self::AddCapacity {
            skill: skill.into(),
            delta,
            period: None,
        }
    }

    /// Shorthand for removing capacity in every period.
    pub fn remove_capacity(skill: impl Into<String>, delta: i64) -> Self {
        Self::RemoveCapacity {
            skill: skill.into(),
            delta,
            period: None,
        }
    }

    /// Shorthand for moving an item.
    pub fn move_item(item_id: impl Into<String>, start_period: usize) -> Self {
        Self::MoveItem {
            item_id: item_id.into(),
            start_period,
        }
    }

    /// Shorthand for removing an item.
    pub fn remove_item(item_id: impl Into<String>) -> Self {
        Self::RemoveItem {
            item_id: item_id.into(),
        }
    }
}

/// A change that was not applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedChange {
    /// Position in the submitted batch.
    pub index: usize,
    pub reason: String,
}

/// Capacity and demand movement of one skill, in units over the horizon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityImpact {
    pub capacity_change: i64,
    pub demand_change: i64,
}

/// Difference between baseline and projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatIfDelta {
    /// `projected.utilization - baseline.utilization`.
    pub utilization_change: f64,
    /// Violations present only in the projection.
    pub new_violations: Vec<Violation>,
    /// Violations present only in the baseline.
    pub resolved_violations: Vec<Violation>,
    /// Skills whose capacity or demand moved.
    pub capacity_impact: BTreeMap<String, CapacityImpact>,
}

/// Outcome of [`GovernanceEngine::what_if`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatIfResult {
    pub baseline: ProjectedScenario,
    pub projected: ProjectedScenario,
    pub baseline_violations: Vec<Violation>,
    pub projected_violations: Vec<Violation>,
    pub projected_warnings: Vec<Warning>,
    pub delta: WhatIfDelta,
    pub skipped_changes: Vec<SkippedChange>,
}

/// Mutable copy of a scenario.
#[derive(Debug, Clone)]
struct Scratch {
    items: BTreeMap<String, WorkItem>,
    plan: CapacityPlan,
}

impl Scratch {
    fn view(&self) -> ScenarioView<'_> {
        ScenarioView::new(self.items.values(), &self.plan)
    }

    fn apply(&mut self, change: &ScenarioChange) -> std::result::Result<(), String> {
        match change {
            ScenarioChange::AddItem(item) => {
                if self.items.contains_key(&item.id) {
                    return Err(format!("item '{}' already exists", item.id));
                }
                if item.duration == 0 {
                    return Err(format!("item '{}' has zero duration", item.id));
                }
                self.check_period(item.start_period)?;
                self.items.insert(item.id.clone(), item.clone());
            }
            ScenarioChange::RemoveItem { item_id } => {
                self.items
                    .remove(item_id)
                    .ok_or_else(|| format!("item '{item_id}' does not exist"))?;
            }
            ScenarioChange::MoveItem {
                item_id,
                start_period,
            } => {
                self.check_period(Some(*start_period))?;
                self.item_mut(item_id)?.start_period = Some(*start_period);
            }
            ScenarioChange::ResizeItem {
                item_id,
                duration,
                demand,
            } => {
                if *duration == Some(0) {
                    return Err("duration must be at least one period".to_string());
                }
                if demand.as_ref().is_some_and(|d| d.values().any(|&u| u < 0)) {
                    return Err("demand must not be negative".to_string());
                }
                let item = self.item_mut(item_id)?;
                if let Some(duration) = duration {
                    item.duration = *duration;
                }
                if let Some(demand) = demand {
                    item.demand = demand.clone();
                }
            }
            ScenarioChange::AddCapacity {
                skill,
                delta,
                period,
            } => {
                if *delta < 0 {
                    return Err(format!("capacity delta must not be negative ({delta})"));
                }
                self.check_period(*period)?;
                self.plan = self.plan.with_capacity_delta(skill, *delta, *period);
            }
            ScenarioChange::RemoveCapacity {
                skill,
                delta,
                period,
            } => {
                if *delta < 0 {
                    return Err(format!("capacity delta must not be negative ({delta})"));
                }
                if self.plan.profile(skill).is_none() {
                    return Err(format!("skill '{skill}' has no capacity to remove"));
                }
                self.check_period(*period)?;
                self.plan = self.plan.with_capacity_delta(skill, -delta, *period);
            }
        }
        Ok(())
    }

    fn item_mut(&mut self, item_id: &str) -> std::result::Result<&mut WorkItem, String> {
        self.items
            .get_mut(item_id)
            .ok_or_else(|| format!("item '{item_id}' does not exist"))
    }

    fn check_period(&self, period: Option<usize>) -> std::result::Result<(), String> {
        match period {
            Some(p) if p >= self.plan.horizon() => Err(format!(
                "period {p} is outside the {}-period horizon",
                self.plan.horizon()
            )),
            _ => Ok(()),
        }
    }
}

impl GovernanceEngine {
    /// Evaluates hypothetical changes without touching live state.
    ///
    /// Records one WHAT_IF entry.
    pub fn what_if(&self, changes: &[ScenarioChange]) -> WhatIfResult {
        let timer = DecisionTimer::start();

        let live = self.live_view();
        let baseline_report = self.validator.validate(&live);
        let baseline = ProjectedScenario::project(&live);
        let baseline_matrix = live.matrix();

        let mut scratch = Scratch {
            items: self.items.clone(),
            plan: self.plan.clone(),
        };
        let mut skipped_changes = Vec::new();
        for (index, change) in changes.iter().enumerate() {
            if let Err(reason) = scratch.apply(change) {
                tracing::warn!(index, reason = %reason, "what-if change skipped");
                skipped_changes.push(SkippedChange { index, reason });
            }
        }

        let view = scratch.view();
        let report = self.validator.validate(&view);
        let projected = ProjectedScenario::project(&view);
        let projected_matrix = view.matrix();

        let delta = WhatIfDelta {
            utilization_change: projected.utilization - baseline.utilization,
            new_violations: difference(&report.violations, &baseline_report.violations),
            resolved_violations: difference(&baseline_report.violations, &report.violations),
            capacity_impact: capacity_impact(&baseline_matrix, &projected_matrix),
        };

        self.record(
            timer,
            EntryDraft {
                action: DecisionAction::WhatIf,
                item_id: None,
                projected_scenario: projected.clone(),
                constraints_evaluated: report.constraints_evaluated,
                result: DecisionResult::Evaluated,
                violations: report.violations.clone(),
                warnings: report.warnings.clone(),
            },
        );

        WhatIfResult {
            baseline,
            projected,
            baseline_violations: baseline_report.violations,
            projected_violations: report.violations,
            projected_warnings: report.warnings,
            delta,
            skipped_changes,
        }
    }
}

/// Violations in `a` whose key is absent from `b`.
fn difference(a: &[Violation], b: &[Violation]) -> Vec<Violation> {
    let keys: BTreeSet<ViolationKey> = b.iter().map(Violation::key).collect();
    a.iter().filter(|v| !keys.contains(&v.key())).cloned().collect()
}

fn capacity_impact(
    baseline: &CapacityMatrix,
    projected: &CapacityMatrix,
) -> BTreeMap<String, CapacityImpact> {
    let supplied = |m: &CapacityMatrix, team: &str| -> i64 {
        m.row(team).map(|r| r.iter().map(|s| s.total).sum()).unwrap_or(0)
    };
    let teams: BTreeSet<&str> = baseline.teams().chain(projected.teams()).collect();

    teams
        .into_iter()
        .filter_map(|team| {
            let impact = CapacityImpact {
                capacity_change: supplied(projected, team) - supplied(baseline, team),
                demand_change: projected.team_allocated(team) - baseline.team_allocated(team),
            };
            (impact != CapacityImpact::default()).then(|| (team.to_string(), impact))
        })
        .collect()
}
