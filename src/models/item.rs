//! Work item model.
//!
//! A work item is a unit of portfolio work: it demands a number of units per
//! skill for every period it runs, depends on other items finishing first,
//! and carries a lifecycle status.
//!
//! # Time Representation
//! Time is discrete. Periods are 0-indexed columns of the capacity plan; an
//! item scheduled at `start_period = s` with `duration = d` occupies periods
//! `s..s + d`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle status of a work item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    /// Submitted but not yet placed on the plan.
    #[default]
    Proposed,
    /// Placed on the plan.
    Scheduled,
    /// Work has started.
    InProgress,
    /// Work is done.
    Complete,
}

impl ItemStatus {
    /// Whether dependents may start on top of this item.
    pub fn is_done(self) -> bool {
        matches!(self, ItemStatus::Complete)
    }
}

/// A work item to be planned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique item identifier.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Units needed per period, keyed by skill (or team).
    pub demand: BTreeMap<String, i64>,
    /// IDs of items that must finish before this one starts.
    pub dependencies: Vec<String>,
    /// Scheduling priority (lower = more urgent).
    pub priority: i32,
    /// First occupied period. `None` = unscheduled.
    pub start_period: Option<usize>,
    /// Number of consecutive periods occupied (at least 1).
    pub duration: usize,
    /// Lifecycle status.
    pub status: ItemStatus,
}

impl WorkItem {
    /// Creates an unscheduled, one-period item with no demand.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            demand: BTreeMap::new(),
            dependencies: Vec::new(),
            priority: 0,
            start_period: None,
            duration: 1,
            status: ItemStatus::Proposed,
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the per-period demand for a skill.
    pub fn with_demand(mut self, skill: impl Into<String>, units: i64) -> Self {
        self.demand.insert(skill.into(), units);
        self
    }

    /// Adds a dependency.
    pub fn with_dependency(mut self, dependency_id: impl Into<String>) -> Self {
        self.dependencies.push(dependency_id.into());
        self
    }

    /// Sets the priority (lower = more urgent).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Places the item at a start period.
    pub fn with_start(mut self, start_period: usize) -> Self {
        self.start_period = Some(start_period);
        self
    }

    /// Sets the duration in periods.
    pub fn with_duration(mut self, duration: usize) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the lifecycle status.
    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the item has a start period.
    #[inline]
    pub fn is_scheduled(&self) -> bool {
        self.start_period.is_some()
    }

    /// First period after the item finishes (`start + duration`, saturating).
    #[inline]
    pub fn end_period(&self) -> Option<usize> {
        self.start_period.map(|s| s.saturating_add(self.duration))
    }

    /// Per-period demand for a skill (0 if none).
    pub fn demand_for(&self, skill: &str) -> i64 {
        self.demand.get(skill).copied().unwrap_or(0)
    }

    /// Total demand across all skills and all periods.
    pub fn total_demand(&self) -> i64 {
        let periods = i64::try_from(self.duration).unwrap_or(i64::MAX);
        self.demand.values().sum::<i64>().saturating_mul(periods)
    }

    /// Clears the schedule.
    pub fn unschedule(&mut self) {
        self.start_period = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_builder() {
        let item = WorkItem::new("auth")
            .with_title("Authentication")
            .with_demand("backend", 30)
            .with_demand("frontend", 20)
            .with_dependency("platform")
            .with_priority(2)
            .with_duration(3)
            .with_start(1)
            .with_status(ItemStatus::Scheduled);

        assert_eq!(item.id, "auth");
        assert_eq!(item.title, "Authentication");
        assert_eq!(item.demand_for("backend"), 30);
        assert_eq!(item.demand_for("data"), 0);
        assert_eq!(item.dependencies, vec!["platform"]);
        assert_eq!(item.priority, 2);
        assert_eq!(item.start_period, Some(1));
        assert_eq!(item.end_period(), Some(4));
        assert_eq!(item.status, ItemStatus::Scheduled);
    }

    #[test]
    fn test_item_defaults() {
        let item = WorkItem::new("x");
        assert!(!item.is_scheduled());
        assert_eq!(item.end_period(), None);
        assert_eq!(item.duration, 1);
        assert_eq!(item.status, ItemStatus::Proposed);
        assert_eq!(item.total_demand(), 0);
    }

    #[test]
    fn test_total_demand() {
        let item = WorkItem::new("x")
            .with_demand("a", 10)
            .with_demand("b", 5)
            .with_duration(2);
        assert_eq!(item.total_demand(), 30);
    }

    #[test]
    fn test_huge_duration_saturates() {
        let item = WorkItem::new("x")
            .with_demand("a", 10)
            .with_duration(usize::MAX)
            .with_start(3);
        assert_eq!(item.end_period(), Some(usize::MAX));
        assert_eq!(item.total_demand(), i64::MAX);
    }

    #[test]
    fn test_unschedule() {
        let mut item = WorkItem::new("x").with_start(2);
        item.unschedule();
        assert!(!item.is_scheduled());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&ItemStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        assert!(ItemStatus::Complete.is_done());
        assert!(!ItemStatus::InProgress.is_done());
    }
}
