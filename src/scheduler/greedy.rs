//! Greedy dependency-aware scheduler.
//!
//! # Algorithm
//!
//! 1. Clear every start period (the input's schedule state is overwritten).
//! 2. Order items topologically, ties broken by priority (lower first), then ID.
//! 3. For each item, earliest legal start = `max(0, max(dependency end))`.
//! 4. Scan the capacity matrix forward for the first window where every
//!    skill has enough remaining units for the whole duration.
//! 5. Commit the allocation, or leave the item unscheduled with a violation.
//!
//! # Complexity
//! O(n · h · s · d) where n=items, h=horizon, s=skills/item, d=duration.
//!
//! # Reference
//! Kolisch (1996), "Serial and parallel resource-constrained project
//! scheduling methods revisited"

use std::collections::HashMap;

use crate::capacity::CapacityMatrix;
use crate::config::{EngineConfig, WindowSearch};
use crate::constraints::sort_violations;
use crate::error::{PortfolioError, Result};
use crate::graph::DependencyGraph;
use crate::models::{CapacityPlan, ItemStatus, Violation, ViolationCode, ViolationDetail, WorkItem};
use crate::validation::validate_input;

/// Result of an auto-schedule run.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    /// Items in input order, with start periods assigned where placement succeeded.
    pub items: Vec<WorkItem>,
    /// Allocation state after placement.
    pub matrix: CapacityMatrix,
    /// Items that could not be placed, and why.
    pub violations: Vec<Violation>,
    /// Order in which items were considered.
    pub order: Vec<String>,
}

impl ScheduleOutcome {
    /// A plan is feasible when it has no violations.
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of items that received a start period.
    pub fn scheduled_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_scheduled()).count()
    }

    /// Looks up a scheduled item by ID.
    pub fn item(&self, id: &str) -> Option<&WorkItem> {
        self.items.iter().find(|i| i.id == id)
    }
}

/// Greedy first-fit scheduler.
///
/// # Example
///
/// ```
/// use u_portfolio::config::EngineConfig;
/// use u_portfolio::models::{CapacityPlan, WorkItem};
/// use u_portfolio::scheduler::AutoScheduler;
///
/// let plan = CapacityPlan::uniform(4, [("backend", 10)]);
/// let items = vec![
///     WorkItem::new("api").with_demand("backend", 8),
///     WorkItem::new("ui").with_demand("backend", 8).with_dependency("api"),
/// ];
///
/// let outcome = AutoScheduler::new(&EngineConfig::default())
///     .schedule(&items, &plan)
///     .unwrap();
/// assert!(outcome.is_feasible());
/// assert_eq!(outcome.item("ui").unwrap().start_period, Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutoScheduler {
    window_search: WindowSearch,
}

impl AutoScheduler {
    /// Creates a scheduler using the configured window search.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            window_search: config.window_search,
        }
    }

    /// Overrides the window search strategy.
    pub fn with_window_search(mut self, window_search: WindowSearch) -> Self {
        self.window_search = window_search;
        self
    }

    /// Places items into periods.
    ///
    /// # Errors
    /// - `NotImplemented` for [`WindowSearch::ExternalSolver`]
    /// - `InvalidInput` when the items fail [`validate_input`]
    pub fn schedule(&self, items: &[WorkItem], plan: &CapacityPlan) -> Result<ScheduleOutcome> {
        if self.window_search == WindowSearch::ExternalSolver {
            return Err(PortfolioError::NotImplemented("external window solver"));
        }

        let mut items: Vec<WorkItem> = items.to_vec();
        for item in &mut items {
            item.unschedule();
        }
        validate_input(&items, plan).map_err(PortfolioError::InvalidInput)?;

        let graph = DependencyGraph::new(&items)?;
        let cycles = graph.detect_cycles();
        if !cycles.is_empty() {
            tracing::debug!(cycles = cycles.len(), "cyclic input, nothing scheduled");
            let mut violations: Vec<Violation> =
                cycles.into_iter().map(Violation::dependency_cycle).collect();
            sort_violations(&mut violations);
            return Ok(ScheduleOutcome {
                items,
                matrix: CapacityMatrix::from_plan(plan),
                violations,
                order: Vec::new(),
            });
        }

        let order = {
            let priority: HashMap<&str, i32> =
                items.iter().map(|i| (i.id.as_str(), i.priority)).collect();
            graph.topological_sort_by(|id| priority.get(id).copied().unwrap_or(i32::MAX))?
        };
        let index: HashMap<String, usize> = items
            .iter()
            .enumerate()
            .map(|(idx, item)| (item.id.clone(), idx))
            .collect();

        let mut matrix = CapacityMatrix::from_plan(plan);
        let mut ends: HashMap<&str, usize> = HashMap::new();
        let mut violations = Vec::new();

        for id in &order {
            let Some(&idx) = index.get(id) else {
                continue;
            };

            let mut earliest = 0;
            let mut blocked_by = None;
            for dep in graph.dependencies(id) {
                match ends.get(dep.as_str()) {
                    Some(&end) => earliest = earliest.max(end),
                    None => {
                        blocked_by = Some(dep);
                        break;
                    }
                }
            }

            if let Some(dep) = blocked_by {
                tracing::debug!(item = %id, dependency = %dep, "dependency unplaced, skipping");
                violations.push(Violation::new(
                    ViolationCode::DependencyNotScheduled,
                    format!("'{id}' cannot be scheduled because '{dep}' was not placed"),
                    vec![id.clone(), dep.clone()],
                    ViolationDetail::Dependency {
                        dependency_id: dep.clone(),
                        dependency_end: None,
                        start: earliest,
                    },
                ));
                continue;
            }

            match matrix.find_feasible_window(&items[idx], earliest) {
                Some(start) => {
                    matrix = matrix.schedule_item(&items[idx], start);
                    let item = &mut items[idx];
                    item.start_period = Some(start);
                    if item.status == ItemStatus::Proposed {
                        item.status = ItemStatus::Scheduled;
                    }
                    ends.insert(id.as_str(), start.saturating_add(item.duration));
                    tracing::debug!(item = %id, start, earliest, "placed item");
                }
                None => {
                    tracing::debug!(item = %id, earliest, "no feasible window");
                    violations.push(Violation::new(
                        ViolationCode::CapacityExceeded,
                        format!(
                            "No feasible window for '{id}' from period {earliest} within the {}-period horizon",
                            plan.horizon()
                        ),
                        vec![id.clone()],
                        ViolationDetail::Unplaceable {
                            earliest_start: earliest,
                        },
                    ));
                }
            }
        }

        sort_violations(&mut violations);
        Ok(ScheduleOutcome {
            items,
            matrix,
            violations,
            order,
        })
    }
}
