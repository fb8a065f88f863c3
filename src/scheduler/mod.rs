//! Greedy scheduler and KPI evaluation.
//!
//! Provides a dependency-aware first-fit scheduler and plan quality
//! metrics.
//!
//! # Algorithm
//!
//! `AutoScheduler` walks items in topological order (priority, then ID)
//! and places each at the earliest period where its dependencies have
//! finished and every demanded skill has room for the full duration. It
//! is not optimal, but gives fast, deterministic baseline plans.
//!
//! # KPI
//!
//! `PlanKpi` computes makespan, scheduled rate, and utilization metrics.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Kolisch (1996), "Serial and parallel resource-constrained project scheduling methods revisited"

mod greedy;
mod kpi;

pub use greedy::{AutoScheduler, ScheduleOutcome};
pub use kpi::PlanKpi;
