//! Capacity plan model.
//!
//! A capacity plan is the total supply of units per skill per period over a
//! fixed horizon. It never records usage; allocation state lives in
//! [`CapacityMatrix`](crate::capacity::CapacityMatrix).
//!
//! Plans are immutable once built. Derivations such as
//! [`CapacityPlan::with_capacity_delta`] return a new plan.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{PortfolioError, Result};

/// Per-skill, per-period capacity over a planning horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityPlan {
    horizon: usize,
    skills: BTreeMap<String, Vec<i64>>,
}

impl CapacityPlan {
    /// Creates an empty plan with the given number of periods.
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            skills: BTreeMap::new(),
        }
    }

    /// Creates a plan where every skill has the same capacity in every period.
    pub fn uniform<I, S>(horizon: usize, per_period: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let skills = per_period
            .into_iter()
            .map(|(skill, units)| (skill.into(), vec![units.max(0); horizon]))
            .collect();
        Self { horizon, skills }
    }

    /// Sets the capacity of one skill across all periods.
    pub fn with_skill(mut self, skill: impl Into<String>, units: i64) -> Self {
        self.skills.insert(skill.into(), vec![units.max(0); self.horizon]);
        self
    }

    /// Sets a per-period capacity profile for one skill.
    ///
    /// # Errors
    /// `InvalidPlan` if the profile length differs from the horizon or any
    /// entry is negative.
    pub fn with_skill_periods(mut self, skill: impl Into<String>, units: Vec<i64>) -> Result<Self> {
        let skill = skill.into();
        if units.len() != self.horizon {
            return Err(PortfolioError::InvalidPlan(format!(
                "skill '{skill}' has {} periods, horizon is {}",
                units.len(),
                self.horizon
            )));
        }
        if let Some(p) = units.iter().position(|&u| u < 0) {
            return Err(PortfolioError::InvalidPlan(format!(
                "skill '{skill}' has negative capacity in period {p}"
            )));
        }
        self.skills.insert(skill, units);
        Ok(self)
    }

    /// Number of periods.
    #[inline]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Skill names in sorted order.
    pub fn skills(&self) -> impl Iterator<Item = &str> {
        self.skills.keys().map(|s| s.as_str())
    }

    /// Per-period profile for a skill.
    pub fn profile(&self, skill: &str) -> Option<&[i64]> {
        self.skills.get(skill).map(|v| v.as_slice())
    }

    /// Capacity of a skill at a period (0 if unknown or out of range).
    pub fn capacity(&self, skill: &str, period: usize) -> i64 {
        self.skills
            .get(skill)
            .and_then(|v| v.get(period))
            .copied()
            .unwrap_or(0)
    }

    /// Total capacity of a skill across the horizon.
    pub fn skill_total(&self, skill: &str) -> i64 {
        self.skills.get(skill).map(|v| v.iter().sum()).unwrap_or(0)
    }

    /// Total capacity of all skills across the horizon.
    pub fn total_capacity(&self) -> i64 {
        self.skills.values().flat_map(|v| v.iter()).sum()
    }

    /// Total capacity of all skills in one period.
    pub fn period_capacity(&self, period: usize) -> i64 {
        self.skills
            .values()
            .filter_map(|v| v.get(period))
            .sum()
    }

    /// Returns a new plan with `delta` units added to a skill.
    ///
    /// Applies to one period when `period` is set, otherwise to every
    /// period. Results are clamped at 0. An unknown skill is created only
    /// when `delta` is positive. Out-of-range periods leave the plan as is.
    pub fn with_capacity_delta(&self, skill: &str, delta: i64, period: Option<usize>) -> Self {
        let mut next = self.clone();
        if period.is_some_and(|p| p >= self.horizon) {
            return next;
        }
        if !next.skills.contains_key(skill) {
            if delta <= 0 {
                return next;
            }
            next.skills.insert(skill.to_string(), vec![0; self.horizon]);
        }
        let Some(row) = next.skills.get_mut(skill) else {
            return next;
        };
        match period {
            Some(p) => row[p] = (row[p] + delta).max(0),
            None => row.iter_mut().for_each(|u| *u = (*u + delta).max(0)),
        }
        next
    }
}
