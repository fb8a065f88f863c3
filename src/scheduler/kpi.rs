//! Plan quality metrics (KPIs).
//!
//! Computes portfolio-level indicators from items and the capacity plan
//! they run against.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Latest end period of any scheduled item |
//! | Scheduled Rate | Fraction of items with a start period |
//! | Utilization by Skill | Allocated / supplied units over the horizon |
//! | Avg Utilization | Allocated / supplied units over all skills |
//! | Peak Utilization | Highest single (skill, period) utilization |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::capacity::{CapacityMatrix, Slot};
use crate::models::{CapacityPlan, WorkItem};

/// Plan performance indicators.
///
/// Periods are plan period indices; utilization values are ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanKpi {
    /// First period after the last scheduled item ends.
    pub makespan_periods: usize,
    /// Items with a start period.
    pub scheduled_count: usize,
    /// Items without a start period.
    pub unscheduled_count: usize,
    /// `scheduled_count / total` (1.0 for an empty portfolio).
    pub scheduled_rate: f64,
    /// Overall allocated / supplied units.
    pub avg_utilization: f64,
    /// Highest utilization of any single cell.
    pub peak_utilization: f64,
    /// Per-skill utilization across the horizon.
    pub utilization_by_skill: BTreeMap<String, f64>,
}

impl PlanKpi {
    /// Computes KPIs for items against a plan.
    pub fn calculate(items: &[WorkItem], plan: &CapacityPlan) -> Self {
        let matrix = CapacityMatrix::for_items(plan, items);

        let makespan_periods = items.iter().filter_map(WorkItem::end_period).max().unwrap_or(0);
        let scheduled_count = items.iter().filter(|i| i.is_scheduled()).count();
        let unscheduled_count = items.len() - scheduled_count;
        let scheduled_rate = if items.is_empty() {
            1.0
        } else {
            scheduled_count as f64 / items.len() as f64
        };

        let utilization_by_skill = matrix
            .teams()
            .map(|team| {
                let supplied = matrix
                    .row(team)
                    .map(|r| r.iter().map(|s| s.total).sum())
                    .unwrap_or(0);
                let ratio = Slot::new(supplied, matrix.team_allocated(team)).utilization;
                (team.to_string(), ratio)
            })
            .collect();

        let peak_utilization = matrix
            .cells()
            .map(|(_, _, slot)| slot.utilization)
            .fold(0.0, f64::max);

        Self {
            makespan_periods,
            scheduled_count,
            unscheduled_count,
            scheduled_rate,
            avg_utilization: matrix.overall_utilization(),
            peak_utilization,
            utilization_by_skill,
        }
    }

    /// Whether the plan meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_scheduled_rate: f64, max_peak_utilization: f64) -> bool {
        self.scheduled_rate >= min_scheduled_rate && self.peak_utilization <= max_peak_utilization
    }
}
