//! Violations and warnings.
//!
//! A violation is a structured, explainable rule breach: which rule failed
//! (`code`), for whom (`affected_item_ids`), and why (`message`, `detail`).
//! Violations are generated fresh on every evaluation and never mutated.
//!
//! Warnings flag risk without blocking a decision.

use serde::{Deserialize, Serialize};

/// Classification of rule breaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    /// Allocated units exceed the available capacity of a team in a period.
    CapacityExceeded,
    /// The dependency graph contains a cycle.
    DependencyCycle,
    /// A dependency is missing, unscheduled, or finishes after the dependent starts.
    DependencyNotScheduled,
    /// The requested transition cannot be applied to the item at all.
    InvalidStateTransition,
    /// Demand placed against a team with no capacity in that period.
    Overallocation,
    /// The item does not fit inside the planning horizon.
    PeriodConflict,
}

impl ViolationCode {
    /// Default severity for this code.
    pub fn default_severity(self) -> Severity {
        match self {
            ViolationCode::CapacityExceeded => Severity::High,
            ViolationCode::DependencyCycle => Severity::Critical,
            ViolationCode::DependencyNotScheduled => Severity::High,
            ViolationCode::InvalidStateTransition => Severity::High,
            ViolationCode::Overallocation => Severity::Critical,
            ViolationCode::PeriodConflict => Severity::Medium,
        }
    }
}

/// Violation severity (ordered, `Low < Critical`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Machine-readable context of a violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationDetail {
    /// Team/period overload.
    Capacity {
        team: String,
        period: usize,
        demand: i64,
        capacity: i64,
    },
    /// Dependency ordering breach. `dependency_end` is `None` when the
    /// dependency is missing or unscheduled.
    Dependency {
        dependency_id: String,
        dependency_end: Option<usize>,
        start: usize,
    },
    /// Item overruns the horizon.
    Temporal {
        start: usize,
        end: usize,
        horizon: usize,
    },
    /// Cycle path, first node repeated implicitly.
    Cycle { path: Vec<String> },
    /// Structural rejection.
    Transition { reason: String },
    /// No feasible window from the earliest legal start.
    Unplaceable { earliest_start: usize },
}

/// A rule breach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Which rule failed.
    pub code: ViolationCode,
    /// How bad it is.
    pub severity: Severity,
    /// Human-readable explanation.
    pub message: String,
    /// Items involved, sorted.
    pub affected_item_ids: Vec<String>,
    /// Structured context.
    pub detail: ViolationDetail,
}

/// Identity of a violation for set comparison: code plus affected items.
pub type ViolationKey = (ViolationCode, Vec<String>);

impl Violation {
    /// Creates a violation with the code's default severity.
    pub fn new(
        code: ViolationCode,
        message: impl Into<String>,
        affected_item_ids: Vec<String>,
        detail: ViolationDetail,
    ) -> Self {
        let mut affected_item_ids = affected_item_ids;
        affected_item_ids.sort();
        affected_item_ids.dedup();
        Self {
            code,
            severity: code.default_severity(),
            message: message.into(),
            affected_item_ids,
            detail,
        }
    }

    /// Creates a capacity overload violation.
    ///
    /// Uses OVERALLOCATION when the team has no capacity at all.
    pub fn capacity_exceeded(
        team: &str,
        period: usize,
        demand: i64,
        capacity: i64,
        affected_item_ids: Vec<String>,
    ) -> Self {
        let (code, message) = if capacity == 0 {
            (
                ViolationCode::Overallocation,
                format!("Team '{team}' has no capacity in period {period} but {demand} units are allocated"),
            )
        } else {
            (
                ViolationCode::CapacityExceeded,
                format!("Capacity exceeded for '{team}' in period {period}: demand {demand} > capacity {capacity}"),
            )
        };
        Self::new(
            code,
            message,
            affected_item_ids,
            ViolationDetail::Capacity {
                team: team.to_string(),
                period,
                demand,
                capacity,
            },
        )
    }

    /// Creates a dependency-cycle violation.
    pub fn dependency_cycle(path: Vec<String>) -> Self {
        let mut shown = path.clone();
        if let Some(first) = path.first() {
            shown.push(first.clone());
        }
        Self::new(
            ViolationCode::DependencyCycle,
            format!("Dependency cycle: {}", shown.join(" -> ")),
            path.clone(),
            ViolationDetail::Cycle { path },
        )
    }

    /// Creates a structural transition rejection.
    pub fn invalid_transition(item_id: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(
            ViolationCode::InvalidStateTransition,
            format!("Transition rejected for '{item_id}': {reason}"),
            vec![item_id.to_string()],
            ViolationDetail::Transition { reason },
        )
    }

    /// Set-comparison key.
    pub fn key(&self) -> ViolationKey {
        (self.code, self.affected_item_ids.clone())
    }

    /// Whether the violation names an item.
    pub fn affects(&self, item_id: &str) -> bool {
        self.affected_item_ids.iter().any(|id| id == item_id)
    }
}

/// Classification of non-blocking risks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    /// Utilization above the configured threshold but within capacity.
    NearCapacity,
    /// A long chain of sequential dependencies.
    TightDependencyChain,
    /// Many items depend on one item.
    SinglePointOfFailure,
    /// A merge point starts the moment its last dependency ends.
    NoBuffer,
}

/// A non-blocking risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub code: WarningCode,
    pub message: String,
    pub affected_item_ids: Vec<String>,
}

impl Warning {
    /// Creates a warning.
    pub fn new(code: WarningCode, message: impl Into<String>, affected_item_ids: Vec<String>) -> Self {
        Self {
            code,
            message: message.into(),
            affected_item_ids,
        }
    }
}
