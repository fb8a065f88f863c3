//! Portfolio governance engine for the U-Engine ecosystem.
//!
//! Decides whether work fits: given work items with per-skill demand,
//! dependencies and priority, plus a multi-period capacity plan, it
//! auto-schedules items, validates proposed changes before committing
//! them, simulates hypothetical changes without touching live state, and
//! records every decision in an append-only log.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `WorkItem`, `CapacityPlan`, `Violation`,
//!   `Warning`, `ScenarioView`, `ProjectedScenario`
//! - **`graph`**: Dependency graph: topological order, cycles, critical path
//! - **`capacity`**: Immutable skill × period allocation matrix
//! - **`constraints`**: Pure evaluators and the `Validator` registry
//! - **`scheduler`**: Greedy first-fit `AutoScheduler` and `PlanKpi`
//! - **`engine`**: `GovernanceEngine` and its decision log
//! - **`validation`**: Input integrity checks (duplicate IDs, references, periods)
//! - **`config`**: Evaluation policy (`EngineConfig`)
//!
//! # Architecture
//!
//! Reads flow engine → graph/matrix → evaluators → engine. Only the engine
//! mutates committed state; every matrix update returns a new matrix, so
//! what-if scratch state never aliases live data. Rule breaches are
//! returned as structured `Violation` values; only malformed input is an
//! error.
//!
//! # References
//!
//! - Kahn (1962), "Topological sorting of large networks"
//! - Kolisch (1996), "Serial and parallel resource-constrained project scheduling methods revisited"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

pub mod capacity;
pub mod config;
pub mod constraints;
pub mod engine;
pub mod error;
pub mod graph;
pub mod models;
pub mod scheduler;
pub mod validation;

pub use capacity::CapacityMatrix;
pub use config::EngineConfig;
pub use engine::{GovernanceEngine, ScenarioChange, TransitionPatch};
pub use error::{PortfolioError, Result};
pub use graph::DependencyGraph;
