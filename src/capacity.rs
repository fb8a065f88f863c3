//! Team × period capacity matrix.
//!
//! Rows are teams (skills), columns are periods. Each cell is a [`Slot`]
//! holding total, allocated and remaining units. The matrix is a value:
//! every mutation returns a new matrix and leaves the receiver untouched.
//! Untouched rows are shared between the old and new matrix through `Arc`,
//! so cloning scenario state for what-if evaluation is cheap.
//!
//! # Feasibility search
//!
//! [`CapacityMatrix::find_feasible_window`] is a greedy first-fit scan: it
//! returns the earliest start at which every skill has enough remaining
//! units for the whole duration. It makes no attempt at optimality and can
//! be swapped for a solver without changing its contract.
//!
//! # Complexity
//! `find_feasible_window` is O(horizon × duration × skills).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use crate::error::{PortfolioError, Result};
use crate::models::{CapacityPlan, WorkItem};

/// One team/period cell.
///
/// Invariant: `remaining == total - allocated` and `allocated >= 0`.
/// `remaining` goes negative when the cell is overbooked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub total: i64,
    pub allocated: i64,
    pub remaining: i64,
    /// `allocated / total`; `f64::INFINITY` if `total == 0` and `allocated > 0`.
    pub utilization: f64,
}

impl Slot {
    /// Builds a cell. Negative allocations clamp to 0.
    pub fn new(total: i64, allocated: i64) -> Self {
        let allocated = allocated.max(0);
        let utilization = if total > 0 {
            allocated as f64 / total as f64
        } else if allocated > 0 {
            f64::INFINITY
        } else {
            0.0
        };
        Self {
            total,
            allocated,
            remaining: total - allocated,
            utilization,
        }
    }

    /// Whether allocation exceeds the total.
    #[inline]
    pub fn is_overbooked(&self) -> bool {
        self.allocated > self.total
    }
}

/// Utilization of one team at one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contention {
    pub team: String,
    pub utilization: f64,
}

/// Immutable-update capacity grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityMatrix {
    horizon: usize,
    rows: BTreeMap<String, Arc<[Slot]>>,
}

impl CapacityMatrix {
    /// Creates an unallocated matrix from a plan.
    pub fn from_plan(plan: &CapacityPlan) -> Self {
        let rows = plan
            .skills()
            .map(|skill| {
                let cells: Arc<[Slot]> = plan
                    .profile(skill)
                    .unwrap_or(&[])
                    .iter()
                    .map(|&total| Slot::new(total, 0))
                    .collect();
                (skill.to_string(), cells)
            })
            .collect();
        Self {
            horizon: plan.horizon(),
            rows,
        }
    }

    /// Creates a matrix with every scheduled item allocated.
    pub fn for_items<'a, I>(plan: &CapacityPlan, items: I) -> Self
    where
        I: IntoIterator<Item = &'a WorkItem>,
    {
        items
            .into_iter()
            .fold(Self::from_plan(plan), |matrix, item| match item.start_period {
                Some(start) => matrix.schedule_item(item, start),
                None => matrix,
            })
    }

    /// Number of periods.
    #[inline]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Team names in sorted order.
    pub fn teams(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(|t| t.as_str())
    }

    /// Cells of one team.
    pub fn row(&self, team: &str) -> Option<&[Slot]> {
        self.rows.get(team).map(|r| &r[..])
    }

    /// One cell, if the team exists and the period is in range.
    pub fn slot(&self, team: &str, period: usize) -> Option<Slot> {
        self.rows.get(team).and_then(|r| r.get(period)).copied()
    }

    /// Remaining units of a team at a period (0 for unknown teams).
    pub fn remaining(&self, team: &str, period: usize) -> i64 {
        self.slot(team, period).map(|s| s.remaining).unwrap_or(0)
    }

    /// Iterates over every cell as `(team, period, slot)`.
    pub fn cells(&self) -> impl Iterator<Item = (&str, usize, &Slot)> {
        self.rows.iter().flat_map(|(team, row)| {
            row.iter()
                .enumerate()
                .map(move |(period, slot)| (team.as_str(), period, slot))
        })
    }

    /// Returns a new matrix with `units` more allocated to one cell.
    ///
    /// Allocating to an unknown team creates a zero-capacity row.
    pub fn allocate(&self, team: &str, period: usize, units: i64) -> Result<Self> {
        self.check_period(period)?;
        Ok(self.with_changes(&[(team, period..period + 1, units)]))
    }

    /// Returns a new matrix with `units` released from one cell (clamped at 0).
    pub fn deallocate(&self, team: &str, period: usize, units: i64) -> Result<Self> {
        self.check_period(period)?;
        Ok(self.with_changes(&[(team, period..period + 1, -units)]))
    }

    /// Allocates an item's demand for `duration` periods from `start`.
    ///
    /// Periods past the horizon are silently dropped.
    pub fn schedule_item(&self, item: &WorkItem, start: usize) -> Self {
        self.apply_item(item, start, 1)
    }

    /// Releases what [`schedule_item`](Self::schedule_item) allocated.
    pub fn unschedule_item(&self, item: &WorkItem, start: usize) -> Self {
        self.apply_item(item, start, -1)
    }

    /// Whether an item fits at `start` for its full duration.
    pub fn fits_at(&self, item: &WorkItem, start: usize) -> bool {
        let end = start.saturating_add(item.duration);
        if end > self.horizon {
            return false;
        }
        item.demand
            .iter()
            .filter(|(_, &units)| units > 0)
            .all(|(skill, &units)| (start..end).all(|p| self.remaining(skill, p) >= units))
    }

    /// Earliest start `>= earliest_start` where the item fits, or `None`.
    ///
    /// Scans up to `horizon - duration`.
    pub fn find_feasible_window(&self, item: &WorkItem, earliest_start: usize) -> Option<usize> {
        let last = self.horizon.checked_sub(item.duration)?;
        (earliest_start..=last).find(|&start| self.fits_at(item, start))
    }

    /// Per-team utilization at a period, most contended first.
    pub fn get_contention(&self, period: usize) -> Vec<Contention> {
        let mut contention: Vec<Contention> = self
            .rows
            .iter()
            .filter_map(|(team, row)| {
                row.get(period).map(|slot| Contention {
                    team: team.clone(),
                    utilization: slot.utilization,
                })
            })
            .collect();
        contention.sort_by(|a, b| {
            b.utilization
                .partial_cmp(&a.utilization)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.team.cmp(&b.team))
        });
        contention
    }

    /// Sum of allocated units over all cells.
    pub fn total_allocated(&self) -> i64 {
        self.cells().map(|(_, _, s)| s.allocated).sum()
    }

    /// Sum of total units over all cells.
    pub fn total_capacity(&self) -> i64 {
        self.cells().map(|(_, _, s)| s.total).sum()
    }

    /// Allocated units of one team across the horizon.
    pub fn team_allocated(&self, team: &str) -> i64 {
        self.row(team)
            .map(|r| r.iter().map(|s| s.allocated).sum())
            .unwrap_or(0)
    }

    /// `total_allocated / total_capacity` (see [`Slot::utilization`] for the zero case).
    pub fn overall_utilization(&self) -> f64 {
        Slot::new(self.total_capacity(), self.total_allocated()).utilization
    }

    fn check_period(&self, period: usize) -> Result<()> {
        if period >= self.horizon {
            return Err(PortfolioError::InvalidPeriod {
                period,
                horizon: self.horizon,
            });
        }
        Ok(())
    }

    fn apply_item(&self, item: &WorkItem, start: usize, sign: i64) -> Self {
        let end = start.saturating_add(item.duration).min(self.horizon);
        if start >= end {
            return self.clone();
        }
        let changes: Vec<(&str, Range<usize>, i64)> = item
            .demand
            .iter()
            .filter(|(_, &units)| units != 0)
            .map(|(skill, &units)| (skill.as_str(), start..end, sign * units))
            .collect();
        self.with_changes(&changes)
    }

    fn with_changes(&self, changes: &[(&str, Range<usize>, i64)]) -> Self {
        let mut rows = self.rows.clone();
        for (team, range, delta) in changes {
            let mut cells: Vec<Slot> = match rows.get(*team) {
                Some(row) => row.to_vec(),
                None if *delta > 0 => vec![Slot::new(0, 0); self.horizon],
                None => continue,
            };
            for cell in &mut cells[range.clone()] {
                *cell = Slot::new(cell.total, cell.allocated + delta);
            }
            rows.insert((*team).to_string(), cells.into());
        }
        Self {
            horizon: self.horizon,
            rows,
        }
    }
}
