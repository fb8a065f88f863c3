//! Governance decision engine.
//!
//! Owns the live portfolio (items keyed by ID) and the capacity plan it is
//! measured against, and exposes the decisions that read or change it:
//!
//! | Call | Mutates | Log action |
//! |------|---------|-----------|
//! | [`add_item`](GovernanceEngine::add_item) / [`add_items`](GovernanceEngine::add_items) | yes | ADD_ITEM |
//! | [`auto_schedule`](GovernanceEngine::auto_schedule) | yes | AUTO_SCHEDULE |
//! | [`request_transition`](GovernanceEngine::request_transition) | on approval | REQUEST_TRANSITION |
//! | [`validate_portfolio`](GovernanceEngine::validate_portfolio) | no | VALIDATE_PORTFOLIO |
//! | [`what_if`](GovernanceEngine::what_if) | no | WHAT_IF |
//!
//! Every decision appends exactly one [`DecisionLogEntry`], failures
//! included. Mutating calls take `&mut self`; read-only decisions take
//! `&self` and may run concurrently from several threads.
//!
//! # Example
//!
//! ```
//! use u_portfolio::engine::{GovernanceEngine, TransitionPatch};
//! use u_portfolio::models::{CapacityPlan, WorkItem};
//!
//! let plan = CapacityPlan::uniform(4, [("backend", 10)]);
//! let mut engine = GovernanceEngine::new(plan);
//! engine
//!     .auto_schedule(vec![
//!         WorkItem::new("api").with_demand("backend", 8),
//!         WorkItem::new("worker").with_demand("backend", 8),
//!     ])
//!     .unwrap();
//!
//! // Moving the worker onto the API's period would overbook backend.
//! let result = engine.request_transition("worker", &TransitionPatch::new().with_start(0));
//! assert!(!result.approved);
//! assert_eq!(engine.decision_log().len(), 2);
//! ```

mod health;
mod log;
mod transition;
mod what_if;

pub use health::PortfolioHealth;
pub use log::{DecisionAction, DecisionLog, DecisionLogEntry, DecisionResult};
pub use transition::{AlternativeSuggestion, TransitionPatch, TransitionResult};
pub use what_if::{CapacityImpact, ScenarioChange, SkippedChange, WhatIfDelta, WhatIfResult};

use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::constraints::{ConstraintKind, Validator};
use crate::error::{PortfolioError, Result};
use crate::models::{CapacityPlan, ProjectedScenario, ScenarioView, WorkItem};
use crate::scheduler::{AutoScheduler, PlanKpi, ScheduleOutcome};
use crate::validation::validate_input;
use self::log::{DecisionTimer, EntryDraft};

/// In-memory decision engine over one portfolio.
#[derive(Debug)]
pub struct GovernanceEngine {
    items: BTreeMap<String, WorkItem>,
    plan: CapacityPlan,
    config: EngineConfig,
    validator: Validator,
    log: DecisionLog,
}

impl GovernanceEngine {
    /// Creates an empty engine with the default configuration.
    pub fn new(plan: CapacityPlan) -> Self {
        Self::with_config(plan, EngineConfig::default())
    }

    /// Creates an empty engine.
    pub fn with_config(plan: CapacityPlan, config: EngineConfig) -> Self {
        Self {
            items: BTreeMap::new(),
            plan,
            validator: Validator::standard(&config),
            config,
            log: DecisionLog::new(),
        }
    }

    /// Creates an engine rehydrated with existing items.
    ///
    /// # Errors
    /// `InvalidInput` when the items fail [`validate_input`].
    pub fn with_items(plan: CapacityPlan, items: Vec<WorkItem>) -> Result<Self> {
        validate_input(&items, &plan).map_err(PortfolioError::InvalidInput)?;
        let mut engine = Self::new(plan);
        engine.items = items.into_iter().map(|i| (i.id.clone(), i)).collect();
        Ok(engine)
    }

    /// Replaces the evaluator registry.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    // ---- accessors (not logged) ----

    /// Looks up a live item.
    pub fn get_item(&self, id: &str) -> Option<&WorkItem> {
        self.items.get(id)
    }

    /// Live items in ID order.
    pub fn items(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.values()
    }

    /// The capacity plan.
    pub fn plan(&self) -> &CapacityPlan {
        &self.plan
    }

    /// The configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The audit trail.
    pub fn decision_log(&self) -> &DecisionLog {
        &self.log
    }

    /// Freshly computed summary of the live portfolio.
    pub fn scenario(&self) -> ProjectedScenario {
        ProjectedScenario::project(&self.live_view())
    }

    /// Plan KPIs of the live portfolio.
    pub fn kpi(&self) -> PlanKpi {
        let items: Vec<WorkItem> = self.items.values().cloned().collect();
        PlanKpi::calculate(&items, &self.plan)
    }

    // ---- decisions (logged) ----

    /// Adds one item. Only ID uniqueness is checked.
    ///
    /// # Errors
    /// `DuplicateId` when the ID is taken.
    pub fn add_item(&mut self, item: WorkItem) -> Result<()> {
        self.add_items(vec![item])
    }

    /// Adds several items, all or none. Only ID uniqueness is checked.
    ///
    /// # Errors
    /// `DuplicateId` when any ID is taken or repeated in the batch.
    pub fn add_items(&mut self, items: Vec<WorkItem>) -> Result<()> {
        let timer = DecisionTimer::start();
        let item_id = match items.as_slice() {
            [only] => Some(only.id.clone()),
            _ => None,
        };

        let mut seen = std::collections::HashSet::new();
        let duplicate = items
            .iter()
            .find(|i| self.items.contains_key(&i.id) || !seen.insert(i.id.as_str()))
            .map(|i| i.id.clone());

        let result = match duplicate {
            Some(id) => {
                tracing::warn!(item = %id, "duplicate item id");
                Err(PortfolioError::DuplicateId(id))
            }
            None => {
                for item in items {
                    self.items.insert(item.id.clone(), item);
                }
                Ok(())
            }
        };

        self.record(
            timer,
            EntryDraft {
                action: DecisionAction::AddItem,
                item_id,
                projected_scenario: self.scenario(),
                constraints_evaluated: vec![ConstraintKind::Structural],
                result: if result.is_ok() {
                    DecisionResult::Approved
                } else {
                    DecisionResult::Failed
                },
                violations: Vec::new(),
                warnings: Vec::new(),
            },
        );
        result
    }

    /// Schedules `items` from scratch and makes them the live portfolio.
    ///
    /// Existing start periods in `items` are ignored. Items that cannot be
    /// placed stay unscheduled and are explained in the outcome's
    /// violations; the portfolio is replaced either way.
    ///
    /// # Errors
    /// `InvalidInput` for malformed items, `NotImplemented` for an
    /// unavailable window search. The live portfolio is unchanged on error.
    pub fn auto_schedule(&mut self, items: Vec<WorkItem>) -> Result<ScheduleOutcome> {
        let timer = DecisionTimer::start();
        let constraints_evaluated = vec![
            ConstraintKind::CapacityCheck,
            ConstraintKind::DependencyOrder,
            ConstraintKind::CycleCheck,
        ];

        let outcome = match AutoScheduler::new(&self.config).schedule(&items, &self.plan) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(error = %err, "auto-schedule failed");
                self.record(
                    timer,
                    EntryDraft {
                        action: DecisionAction::AutoSchedule,
                        item_id: None,
                        projected_scenario: self.scenario(),
                        constraints_evaluated,
                        result: DecisionResult::Failed,
                        violations: Vec::new(),
                        warnings: Vec::new(),
                    },
                );
                return Err(err);
            }
        };

        self.items = outcome
            .items
            .iter()
            .map(|i| (i.id.clone(), i.clone()))
            .collect();

        self.record(
            timer,
            EntryDraft {
                action: DecisionAction::AutoSchedule,
                item_id: None,
                projected_scenario: self.scenario(),
                constraints_evaluated,
                result: DecisionResult::Approved,
                violations: outcome.violations.clone(),
                warnings: Vec::new(),
            },
        );
        Ok(outcome)
    }

    /// Re-runs [`auto_schedule`](Self::auto_schedule) over the live items.
    pub fn reschedule(&mut self) -> Result<ScheduleOutcome> {
        let items = self.items.values().cloned().collect();
        self.auto_schedule(items)
    }

    // ---- internals ----

    fn live_view(&self) -> ScenarioView<'_> {
        ScenarioView::new(self.items.values(), &self.plan)
    }

    fn record(&self, timer: DecisionTimer, draft: EntryDraft) -> DecisionLogEntry {
        let entry = self.log.append(timer, draft);
        tracing::info!(
            sequence = entry.sequence,
            action = ?entry.action,
            item = ?entry.item_id,
            result = ?entry.result,
            violations = entry.violations.len(),
            warnings = entry.warnings.len(),
            duration_ms = entry.duration_ms,
            "decision recorded"
        );
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowSearch;
    use crate::models::{ItemStatus, ViolationCode};

    fn plan() -> CapacityPlan {
        CapacityPlan::uniform(4, [("backend", 10)])
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GovernanceEngine>();
    }

    #[test]
    fn test_add_item_uniqueness() {
        let mut engine = GovernanceEngine::new(plan());
        engine.add_item(WorkItem::new("a")).unwrap();
        let err = engine.add_item(WorkItem::new("a")).unwrap_err();
        assert!(matches!(err, PortfolioError::DuplicateId(ref id) if id == "a"));

        // Batch is all-or-nothing.
        let err = engine
            .add_items(vec![WorkItem::new("b"), WorkItem::new("b")])
            .unwrap_err();
        assert!(matches!(err, PortfolioError::DuplicateId(_)));
        assert!(engine.get_item("b").is_none());

        let entries = engine.decision_log().entries();
        let results: Vec<DecisionResult> = entries.iter().map(|e| e.result).collect();
        assert_eq!(
            results,
            vec![DecisionResult::Approved, DecisionResult::Failed, DecisionResult::Failed]
        );
        assert_eq!(entries[0].item_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_add_item_skips_rule_checks() {
        let mut engine = GovernanceEngine::new(plan());
        engine
            .add_item(WorkItem::new("huge").with_demand("backend", 100).with_start(0))
            .unwrap();
        assert!(engine.get_item("huge").is_some());
    }

    #[test]
    fn test_with_items_validates() {
        let err = GovernanceEngine::with_items(plan(), vec![WorkItem::new("a").with_dependency("x")])
            .unwrap_err();
        assert!(matches!(err, PortfolioError::InvalidInput(_)));

        let engine = GovernanceEngine::with_items(plan(), vec![WorkItem::new("a")]).unwrap();
        assert!(engine.decision_log().is_empty());
    }

    #[test]
    fn test_auto_schedule_commits_and_logs() {
        let mut engine = GovernanceEngine::new(plan());
        let outcome = engine
            .auto_schedule(vec![
                WorkItem::new("a").with_demand("backend", 6),
                WorkItem::new("b").with_demand("backend", 6).with_dependency("a"),
            ])
            .unwrap();
        assert!(outcome.is_feasible());
        assert_eq!(engine.get_item("b").unwrap().start_period, Some(1));
        assert_eq!(engine.get_item("b").unwrap().status, ItemStatus::Scheduled);

        let entry = engine.decision_log().last().unwrap();
        assert_eq!(entry.action, DecisionAction::AutoSchedule);
        assert!(entry.constraints_evaluated.contains(&ConstraintKind::CapacityCheck));
        assert!(entry.constraints_evaluated.contains(&ConstraintKind::DependencyOrder));
        assert_eq!(entry.projected_scenario.total_demand, 12);
    }

    #[test]
    fn test_auto_schedule_failure_keeps_portfolio() {
        let config = EngineConfig::default().with_window_search(WindowSearch::ExternalSolver);
        let mut engine = GovernanceEngine::with_config(plan(), config);
        engine.add_item(WorkItem::new("keep")).unwrap();

        let err = engine.auto_schedule(vec![WorkItem::new("new")]).unwrap_err();
        assert!(matches!(err, PortfolioError::NotImplemented(_)));
        assert!(engine.get_item("keep").is_some());
        assert_eq!(engine.decision_log().last().unwrap().result, DecisionResult::Failed);
    }

    #[test]
    fn test_reschedule_live_items() {
        let mut engine = GovernanceEngine::new(plan());
        engine
            .add_items(vec![
                WorkItem::new("a").with_demand("backend", 6).with_start(0),
                WorkItem::new("b").with_demand("backend", 6).with_start(0),
            ])
            .unwrap();
        assert_eq!(engine.validate_portfolio().violations[0].code, ViolationCode::CapacityExceeded);

        engine.reschedule().unwrap();
        assert!(engine.validate_portfolio().healthy);
    }

    #[test]
    fn test_concurrent_read_only_decisions() {
        let mut engine = GovernanceEngine::new(plan());
        engine.add_item(WorkItem::new("a").with_demand("backend", 5).with_start(0)).unwrap();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    engine.what_if(&[ScenarioChange::move_item("a", 1)]);
                    engine.validate_portfolio();
                });
            }
        });

        let log = engine.decision_log();
        assert_eq!(log.len(), 9);
        let sequences: Vec<u64> = log.entries().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, (0..9).collect::<Vec<u64>>());
        assert_eq!(engine.get_item("a").unwrap().start_period, Some(0));
    }

    #[test]
    fn test_accessors_do_not_log() {
        let engine = GovernanceEngine::with_items(plan(), vec![WorkItem::new("a").with_start(1)]).unwrap();
        let _ = engine.scenario();
        let _ = engine.kpi();
        let _ = engine.items().count();
        assert!(engine.decision_log().is_empty());
        assert_eq!(engine.kpi().scheduled_count, 1);
    }
}
