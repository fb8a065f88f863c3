//! Proposed changes to a single item.
//!
//! A transition runs in three phases and is all-or-nothing:
//!
//! 1. **Structural**: the item must exist and the patch must be well formed.
//! 2. **Cycle**: a patch that rewires dependencies must keep the graph acyclic.
//! 3. **Scenario**: the patched item replaces the live one in a scratch
//!    scenario, which is revalidated in full. Only a scenario with zero
//!    violations is committed.
//!
//! When the patched item overloads capacity, the engine searches later
//! periods for a start that fits and offers it as an alternative.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::log::{DecisionAction, DecisionResult, DecisionTimer, EntryDraft};
use super::GovernanceEngine;
use crate::capacity::CapacityMatrix;
use crate::constraints::{ConstraintKind, ValidationReport};
use crate::graph::DependencyGraph;
use crate::models::{
    ItemStatus, ProjectedScenario, ScenarioView, Violation, ViolationCode, Warning, WorkItem,
};

/// Field changes for one item. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionPatch {
    pub title: Option<String>,
    pub start_period: Option<usize>,
    pub duration: Option<usize>,
    /// Replaces the whole demand map.
    pub demand: Option<BTreeMap<String, i64>>,
    /// Replaces the whole dependency list.
    pub dependencies: Option<Vec<String>>,
    pub priority: Option<i32>,
    pub status: Option<ItemStatus>,
}

impl TransitionPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_start(mut self, start_period: usize) -> Self {
        self.start_period = Some(start_period);
        self
    }

    pub fn with_duration(mut self, duration: usize) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Adds a skill to the replacement demand map.
    pub fn with_demand(mut self, skill: impl Into<String>, units: i64) -> Self {
        self.demand
            .get_or_insert_with(BTreeMap::new)
            .insert(skill.into(), units);
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = Some(dependencies.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns a patched copy of `item`.
    pub fn apply(&self, item: &WorkItem) -> WorkItem {
        let mut next = item.clone();
        if let Some(title) = &self.title {
            next.title = title.clone();
        }
        if let Some(start) = self.start_period {
            next.start_period = Some(start);
        }
        if let Some(duration) = self.duration {
            next.duration = duration;
        }
        if let Some(demand) = &self.demand {
            next.demand = demand.clone();
        }
        if let Some(dependencies) = &self.dependencies {
            next.dependencies = dependencies.clone();
        }
        if let Some(priority) = self.priority {
            next.priority = priority;
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        next
    }

    /// Whether applying the patch alters the item's dependency set.
    pub fn changes_dependencies(&self, item: &WorkItem) -> bool {
        self.dependencies.as_ref().is_some_and(|deps| {
            let mut proposed: Vec<&String> = deps.iter().collect();
            let mut current: Vec<&String> = item.dependencies.iter().collect();
            proposed.sort();
            proposed.dedup();
            current.sort();
            current.dedup();
            proposed != current
        })
    }
}

/// A later start that would fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeSuggestion {
    pub start_period: usize,
    /// Human-readable cost of taking the suggestion.
    pub tradeoff: String,
}

/// Outcome of [`GovernanceEngine::request_transition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionResult {
    pub approved: bool,
    pub item_id: String,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
    pub alternative_suggestions: Option<AlternativeSuggestion>,
    /// The live item after the call; unchanged on rejection.
    pub item: Option<WorkItem>,
}

impl GovernanceEngine {
    /// Validates a patch against the whole portfolio and commits it only
    /// when the resulting scenario has no violations.
    ///
    /// Rejections leave the live item untouched. Records one
    /// REQUEST_TRANSITION entry.
    pub fn request_transition(&mut self, item_id: &str, patch: &TransitionPatch) -> TransitionResult {
        let timer = DecisionTimer::start();

        let Some(live) = self.items.get(item_id) else {
            return self.reject_structural(timer, item_id, "item does not exist");
        };
        if let Some(reason) = self.structural_problem(patch) {
            return self.reject_structural(timer, item_id, &reason);
        }
        let candidate = patch.apply(live);

        if patch.changes_dependencies(live) {
            let graph = DependencyGraph::partial(
                self.items
                    .values()
                    .filter(|i| i.id != item_id)
                    .chain(std::iter::once(&candidate)),
            );
            let cycles = graph.detect_cycles();
            if !cycles.is_empty() {
                let violations: Vec<Violation> =
                    cycles.into_iter().map(Violation::dependency_cycle).collect();
                tracing::warn!(item = item_id, cycles = violations.len(), "transition introduces a dependency cycle");
                return self.finish_transition(
                    timer,
                    item_id,
                    &candidate,
                    ValidationReport {
                        violations,
                        warnings: Vec::new(),
                        constraints_evaluated: vec![ConstraintKind::Structural, ConstraintKind::CycleCheck],
                    },
                    None,
                );
            }
        }

        let mut report = {
            let view = self.scratch_view(&candidate);
            self.validator.validate(&view)
        };
        report.constraints_evaluated.insert(0, ConstraintKind::Structural);
        report.constraints_evaluated.dedup();

        let suggestion = report
            .violations
            .iter()
            .any(|v| v.code == ViolationCode::CapacityExceeded && v.affects(item_id))
            .then(|| self.suggest_start(&candidate))
            .flatten();

        self.finish_transition(timer, item_id, &candidate, report, suggestion)
    }

    fn structural_problem(&self, patch: &TransitionPatch) -> Option<String> {
        if patch.duration == Some(0) {
            return Some("duration must be at least one period".to_string());
        }
        if let Some((skill, units)) = patch
            .demand
            .as_ref()
            .and_then(|d| d.iter().find(|(_, &units)| units < 0))
        {
            return Some(format!("demand for '{skill}' is negative ({units})"));
        }
        patch
            .dependencies
            .as_ref()
            .and_then(|deps| deps.iter().find(|d| !self.items.contains_key(d.as_str())))
            .map(|d| format!("unknown dependency '{d}'"))
    }

    fn reject_structural(&self, timer: DecisionTimer, item_id: &str, reason: &str) -> TransitionResult {
        tracing::warn!(item = item_id, reason, "transition rejected");
        let violation = Violation::invalid_transition(item_id, reason);
        let result = TransitionResult {
            approved: false,
            item_id: item_id.to_string(),
            violations: vec![violation],
            warnings: Vec::new(),
            alternative_suggestions: None,
            item: self.items.get(item_id).cloned(),
        };
        self.record(
            timer,
            EntryDraft {
                action: DecisionAction::RequestTransition,
                item_id: Some(item_id.to_string()),
                projected_scenario: ProjectedScenario::project(&self.live_view()),
                constraints_evaluated: vec![ConstraintKind::Structural],
                result: DecisionResult::Rejected,
                violations: result.violations.clone(),
                warnings: Vec::new(),
            },
        );
        result
    }

    fn finish_transition(
        &mut self,
        timer: DecisionTimer,
        item_id: &str,
        candidate: &WorkItem,
        report: ValidationReport,
        suggestion: Option<AlternativeSuggestion>,
    ) -> TransitionResult {
        let approved = report.violations.is_empty();
        let projected_scenario = ProjectedScenario::project(&self.scratch_view(candidate));

        if approved {
            self.items.insert(item_id.to_string(), candidate.clone());
        } else {
            tracing::warn!(
                item = item_id,
                violations = report.violations.len(),
                suggestion = ?suggestion.as_ref().map(|s| s.start_period),
                "transition rejected"
            );
        }

        self.record(
            timer,
            EntryDraft {
                action: DecisionAction::RequestTransition,
                item_id: Some(item_id.to_string()),
                projected_scenario,
                constraints_evaluated: report.constraints_evaluated,
                result: if approved {
                    DecisionResult::Approved
                } else {
                    DecisionResult::Rejected
                },
                violations: report.violations.clone(),
                warnings: report.warnings.clone(),
            },
        );

        TransitionResult {
            approved,
            item_id: item_id.to_string(),
            violations: report.violations,
            warnings: report.warnings,
            alternative_suggestions: suggestion,
            item: self.items.get(item_id).cloned(),
        }
    }

    /// Live items with `candidate` in place of the item sharing its ID.
    fn scratch_view<'a>(&'a self, candidate: &'a WorkItem) -> ScenarioView<'a> {
        ScenarioView::new(
            self.items.values().chain(std::iter::once(candidate)),
            &self.plan,
        )
    }

    /// First start after the requested one where `candidate` fits next to
    /// every other live item and after its dependencies finish.
    fn suggest_start(&self, candidate: &WorkItem) -> Option<AlternativeSuggestion> {
        let requested = candidate.start_period?;
        let others = self.items.values().filter(|i| i.id != candidate.id);
        let matrix = CapacityMatrix::for_items(&self.plan, others);

        let dependency_ready = candidate
            .dependencies
            .iter()
            .filter_map(|d| self.items.get(d).and_then(WorkItem::end_period))
            .max()
            .unwrap_or(0);
        let from = (requested + 1).max(dependency_ready);

        matrix
            .find_feasible_window(candidate, from)
            .map(|start_period| AlternativeSuggestion {
                start_period,
                tradeoff: format!("Delay start to period {start_period}"),
            })
    }
}
