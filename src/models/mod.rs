//! Portfolio domain models.
//!
//! Provides the core data types for portfolio planning: work items with
//! per-skill demand, the capacity plan they are measured against,
//! violations/warnings produced by evaluation, and scenario projections.
//!
//! # Domain Mappings
//!
//! | u-portfolio | Product Org | Consulting | Infrastructure |
//! |-------------|-------------|------------|----------------|
//! | WorkItem | Epic/Initiative | Engagement | Migration |
//! | Skill | Team | Practice | Platform crew |
//! | Period | Sprint/Quarter | Month | Change window |
//! | CapacityPlan | Headcount plan | Bench plan | On-call roster |

mod item;
mod plan;
mod scenario;
mod violation;

pub use item::{ItemStatus, WorkItem};
pub use plan::CapacityPlan;
pub use scenario::{ItemSnapshot, PeriodCapacity, ProjectedScenario, ScenarioView};
pub use violation::{
    Severity, Violation, ViolationCode, ViolationDetail, ViolationKey, Warning, WarningCode,
};
