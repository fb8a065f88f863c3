//! Engine configuration.
//!
//! All evaluation policy lives here: the near-capacity threshold, the
//! severity weights used by the portfolio health score, and the thresholds
//! for dependency-structure warnings. Values can be set with the builder
//! methods or loaded from TOML.
//!
//! ```
//! use u_portfolio::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(
//!     r#"
//!     near_capacity_threshold = 0.9
//!     [severity_weights]
//!     critical = 40.0
//!     "#,
//! ).unwrap();
//! assert!((config.near_capacity_threshold - 0.9).abs() < 1e-12);
//! assert!((config.severity_weights.critical - 40.0).abs() < 1e-12);
//! assert!((config.severity_weights.high - 15.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Severity;

/// Strategy used to search for a feasible start period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSearch {
    /// Linear scan, first start that fits wins.
    #[default]
    FirstFit,
    /// Delegates to an external solver. Not available in this crate.
    ExternalSolver,
}

/// Health-score penalty per violation severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityWeights {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl SeverityWeights {
    /// Penalty for one violation of the given severity.
    pub fn weight(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            critical: 25.0,
            high: 15.0,
            medium: 10.0,
            low: 5.0,
        }
    }
}

/// Tunable evaluation policy for the decision engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Utilization above which a NEAR_CAPACITY warning is raised (0.0..1.0).
    pub near_capacity_threshold: f64,
    /// Health-score penalty per violation severity.
    pub severity_weights: SeverityWeights,
    /// Health-score penalty per warning.
    pub warning_penalty: f64,
    /// Chains with at least this many hops raise TIGHT_DEPENDENCY_CHAIN.
    pub chain_depth_threshold: usize,
    /// Items with at least this many dependents raise SINGLE_POINT_OF_FAILURE.
    pub fan_out_threshold: usize,
    /// Merge points with at least this many dependencies are checked for NO_BUFFER.
    pub fan_in_threshold: usize,
    /// Feasible-window search strategy.
    pub window_search: WindowSearch,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            near_capacity_threshold: 0.85,
            severity_weights: SeverityWeights::default(),
            warning_penalty: 1.0,
            chain_depth_threshold: 3,
            fan_out_threshold: 3,
            fan_in_threshold: 2,
            window_search: WindowSearch::FirstFit,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Sets the near-capacity warning threshold.
    pub fn with_near_capacity_threshold(mut self, threshold: f64) -> Self {
        self.near_capacity_threshold = threshold;
        self
    }

    /// Sets the severity weights.
    pub fn with_severity_weights(mut self, weights: SeverityWeights) -> Self {
        self.severity_weights = weights;
        self
    }

    /// Sets the per-warning penalty.
    pub fn with_warning_penalty(mut self, penalty: f64) -> Self {
        self.warning_penalty = penalty;
        self
    }

    /// Sets the tight-chain hop threshold.
    pub fn with_chain_depth_threshold(mut self, hops: usize) -> Self {
        self.chain_depth_threshold = hops;
        self
    }

    /// Sets the fan-out and fan-in thresholds.
    pub fn with_fan_thresholds(mut self, fan_out: usize, fan_in: usize) -> Self {
        self.fan_out_threshold = fan_out;
        self.fan_in_threshold = fan_in;
        self
    }

    /// Sets the window search strategy.
    pub fn with_window_search(mut self, search: WindowSearch) -> Self {
        self.window_search = search;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PortfolioError;

    #[test]
    fn test_defaults() {
        let c = EngineConfig::new();
        assert!((c.near_capacity_threshold - 0.85).abs() < 1e-12);
        assert_eq!(c.chain_depth_threshold, 3);
        assert_eq!(c.window_search, WindowSearch::FirstFit);
        assert!((c.severity_weights.weight(Severity::Critical) - 25.0).abs() < 1e-12);
        assert!((c.severity_weights.weight(Severity::Low) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_builder() {
        let c = EngineConfig::new()
            .with_near_capacity_threshold(0.7)
            .with_warning_penalty(0.0)
            .with_chain_depth_threshold(5)
            .with_fan_thresholds(4, 3)
            .with_window_search(WindowSearch::ExternalSolver);
        assert!((c.near_capacity_threshold - 0.7).abs() < 1e-12);
        assert_eq!(c.chain_depth_threshold, 5);
        assert_eq!(c.fan_out_threshold, 4);
        assert_eq!(c.fan_in_threshold, 3);
        assert_eq!(c.window_search, WindowSearch::ExternalSolver);
    }

    #[test]
    fn test_from_toml_partial() {
        let c = EngineConfig::from_toml_str("window_search = \"external_solver\"").unwrap();
        assert_eq!(c.window_search, WindowSearch::ExternalSolver);
        assert_eq!(c.fan_out_threshold, 3);
    }

    #[test]
    fn test_from_toml_invalid() {
        let err = EngineConfig::from_toml_str("near_capacity_threshold = \"high\"").unwrap_err();
        assert!(matches!(err, PortfolioError::Config(_)));
    }
}
