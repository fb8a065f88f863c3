//! Portfolio health: score and dependency-structure warnings.
//!
//! # Score
//!
//! `score = clamp(100 − Σ weight(severity) − warning_penalty × warnings, 0, 100)`,
//! rounded to two decimals. Weights come from
//! [`SeverityWeights`](crate::config::SeverityWeights). The warning term
//! only applies once there is at least one violation, so a portfolio
//! without violations always scores 100.
//!
//! # Structure warnings
//!
//! | Code | Raised for |
//! |------|-----------|
//! | TIGHT_DEPENDENCY_CHAIN | a sink whose longest incoming chain has ≥ `chain_depth_threshold` hops |
//! | SINGLE_POINT_OF_FAILURE | an item with ≥ `fan_out_threshold` dependents |
//! | NO_BUFFER | a scheduled item with ≥ `fan_in_threshold` dependencies that starts the period its last dependency ends |

use serde::{Deserialize, Serialize};

use super::log::{DecisionAction, DecisionResult, DecisionTimer, EntryDraft};
use super::GovernanceEngine;
use crate::config::EngineConfig;
use crate::constraints::sort_warnings;
use crate::graph::DependencyGraph;
use crate::models::{ProjectedScenario, ScenarioView, Violation, Warning, WarningCode};

/// Result of [`GovernanceEngine::validate_portfolio`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioHealth {
    /// No violations (warnings allowed).
    pub healthy: bool,
    /// 0–100, higher is better.
    pub score: f64,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
    /// Longest dependency chain, root first. Empty when the graph is cyclic.
    pub critical_path: Vec<String>,
}

impl GovernanceEngine {
    /// Validates the live portfolio and scores its health.
    ///
    /// Read-only; records one VALIDATE_PORTFOLIO entry.
    pub fn validate_portfolio(&self) -> PortfolioHealth {
        let timer = DecisionTimer::start();
        let view = self.live_view();
        let report = self.validator.validate(&view);

        let mut warnings = report.warnings;
        warnings.extend(structure_warnings(&view, &self.config));
        sort_warnings(&mut warnings);

        let critical_path = DependencyGraph::partial(view.items())
            .critical_path()
            .unwrap_or_default();
        let score = health_score(&report.violations, warnings.len(), &self.config);
        let health = PortfolioHealth {
            healthy: report.violations.is_empty(),
            score,
            violations: report.violations,
            warnings,
            critical_path,
        };

        self.record(
            timer,
            EntryDraft {
                action: DecisionAction::ValidatePortfolio,
                item_id: None,
                projected_scenario: ProjectedScenario::project(&view),
                constraints_evaluated: report.constraints_evaluated,
                result: DecisionResult::Evaluated,
                violations: health.violations.clone(),
                warnings: health.warnings.clone(),
            },
        );
        health
    }
}

/// Computes the 0–100 health score.
pub(crate) fn health_score(violations: &[Violation], warnings: usize, config: &EngineConfig) -> f64 {
    if violations.is_empty() {
        return 100.0;
    }
    let penalty: f64 = violations
        .iter()
        .map(|v| config.severity_weights.weight(v.severity))
        .sum::<f64>()
        + config.warning_penalty * warnings as f64;
    let score = (100.0 - penalty).clamp(0.0, 100.0);
    (score * 100.0).round() / 100.0
}

/// Chain-depth and fan-in/out warnings for a scenario.
pub(crate) fn structure_warnings(view: &ScenarioView<'_>, config: &EngineConfig) -> Vec<Warning> {
    let graph = DependencyGraph::partial(view.items());
    let mut warnings = Vec::new();

    // Chain depth needs a topological order; cycles are reported elsewhere.
    if !graph.has_cycle() {
        for id in graph.ids().filter(|id| graph.fan_out(id) == 0) {
            let Ok(chain) = graph.longest_chain_to(id) else {
                continue;
            };
            let hops = chain.len().saturating_sub(1);
            if hops >= config.chain_depth_threshold {
                warnings.push(Warning::new(
                    WarningCode::TightDependencyChain,
                    format!("'{id}' ends a chain of {hops} sequential dependencies: {}", chain.join(" -> ")),
                    sorted(chain),
                ));
            }
        }
    }

    for id in graph.ids() {
        let fan_out = graph.fan_out(id);
        if fan_out >= config.fan_out_threshold {
            let mut affected = graph.dependents(id).to_vec();
            affected.push(id.to_string());
            warnings.push(Warning::new(
                WarningCode::SinglePointOfFailure,
                format!("{fan_out} items depend on '{id}'"),
                sorted(affected),
            ));
        }

        if graph.fan_in(id) < config.fan_in_threshold {
            continue;
        }
        let Some(start) = view.item(id).and_then(|i| i.start_period) else {
            continue;
        };
        let ends: Option<Vec<usize>> = graph
            .dependencies(id)
            .iter()
            .map(|dep| view.item(dep).and_then(|d| d.end_period()))
            .collect();
        if let Some(last_end) = ends.and_then(|e| e.into_iter().max()) {
            if start == last_end {
                let mut affected = graph.dependencies(id).to_vec();
                affected.push(id.to_string());
                warnings.push(Warning::new(
                    WarningCode::NoBuffer,
                    format!("'{id}' starts in period {start}, the period its last dependency ends"),
                    sorted(affected),
                ));
            }
        }
    }

    warnings
}

fn sorted(mut ids: Vec<String>) -> Vec<String> {
    ids.sort();
    ids.dedup();
    ids
}
