//! Scenario views and projections.
//!
//! A [`ScenarioView`] is the read-only input every constraint evaluator
//! receives: a set of items plus the capacity plan they are measured
//! against. A [`ProjectedScenario`] is the summary recorded in the decision
//! log. It is always recomputed from items and plan, never cached.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CapacityPlan, ItemStatus, WorkItem};
use crate::capacity::CapacityMatrix;

/// Borrowed scenario: items and the plan they run against.
#[derive(Debug, Clone)]
pub struct ScenarioView<'a> {
    items: BTreeMap<&'a str, &'a WorkItem>,
    plan: &'a CapacityPlan,
}

impl<'a> ScenarioView<'a> {
    /// Creates a view. Later items with a repeated ID replace earlier ones.
    pub fn new<I>(items: I, plan: &'a CapacityPlan) -> Self
    where
        I: IntoIterator<Item = &'a WorkItem>,
    {
        Self {
            items: items.into_iter().map(|i| (i.id.as_str(), i)).collect(),
            plan,
        }
    }

    /// Items in ID order.
    pub fn items(&self) -> impl Iterator<Item = &'a WorkItem> + '_ {
        self.items.values().copied()
    }

    /// Looks up an item.
    pub fn item(&self, id: &str) -> Option<&'a WorkItem> {
        self.items.get(id).copied()
    }

    /// The capacity plan.
    pub fn plan(&self) -> &'a CapacityPlan {
        self.plan
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the view has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Allocation state of this scenario.
    pub fn matrix(&self) -> CapacityMatrix {
        CapacityMatrix::for_items(self.plan, self.items())
    }
}

/// Compact item state recorded in a projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub id: String,
    pub start_period: Option<usize>,
    pub end_period: Option<usize>,
    pub status: ItemStatus,
}

impl From<&WorkItem> for ItemSnapshot {
    fn from(item: &WorkItem) -> Self {
        Self {
            id: item.id.clone(),
            start_period: item.start_period,
            end_period: item.end_period(),
            status: item.status,
        }
    }
}

/// Aggregate capacity of one period across all teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodCapacity {
    pub period: usize,
    pub capacity: i64,
    pub allocated: i64,
    pub utilization: f64,
}

/// Read-only scenario summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedScenario {
    pub items: Vec<ItemSnapshot>,
    pub period_capacity: Vec<PeriodCapacity>,
    /// Units allocated by scheduled items inside the horizon.
    pub total_demand: i64,
    /// Units supplied by the plan across the horizon.
    pub total_capacity: i64,
    /// `total_demand / total_capacity`.
    pub utilization: f64,
}

impl ProjectedScenario {
    /// Projects a scenario.
    pub fn project(view: &ScenarioView<'_>) -> Self {
        let matrix = view.matrix();
        let period_capacity = (0..matrix.horizon())
            .map(|period| {
                let (capacity, allocated) = matrix
                    .teams()
                    .filter_map(|team| matrix.slot(team, period))
                    .fold((0, 0), |(c, a), s| (c + s.total, a + s.allocated));
                PeriodCapacity {
                    period,
                    capacity,
                    allocated,
                    utilization: ratio(allocated, capacity),
                }
            })
            .collect();
        let total_demand = matrix.total_allocated();
        let total_capacity = view.plan().total_capacity();

        Self {
            items: view.items().map(ItemSnapshot::from).collect(),
            period_capacity,
            total_demand,
            total_capacity,
            utilization: ratio(total_demand, total_capacity),
        }
    }
}

fn ratio(allocated: i64, capacity: i64) -> f64 {
    crate::capacity::Slot::new(capacity, allocated).utilization
}
