//! Append-only decision log.
//!
//! Every public engine decision writes exactly one entry, in call order.
//! Entries are never rewritten. Storage sits behind a `parking_lot`
//! lock so read-only decisions can still append through `&self`.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use crate::constraints::ConstraintKind;
use crate::models::{ProjectedScenario, Violation, Warning};

/// Which public call produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionAction {
    AddItem,
    AutoSchedule,
    RequestTransition,
    ValidatePortfolio,
    WhatIf,
}

/// Outcome of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionResult {
    /// State changed.
    Approved,
    /// A proposed change was refused; state unchanged.
    Rejected,
    /// Read-only evaluation.
    Evaluated,
    /// The call returned an error.
    Failed,
}

/// One immutable log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    pub id: Uuid,
    /// Position in the log, starting at 0.
    pub sequence: u64,
    /// When the call started.
    pub timestamp: DateTime<Utc>,
    pub action: DecisionAction,
    /// Item the decision was about, when there is exactly one.
    pub item_id: Option<String>,
    /// Scenario the decision was evaluated against.
    pub projected_scenario: ProjectedScenario,
    pub constraints_evaluated: Vec<ConstraintKind>,
    pub result: DecisionResult,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
    /// Wall time of the whole call.
    pub duration_ms: f64,
}

/// Start time of a decision, captured on entry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DecisionTimer {
    started_at: DateTime<Utc>,
    clock: Instant,
}

impl DecisionTimer {
    pub(crate) fn start() -> Self {
        Self {
            started_at: Utc::now(),
            clock: Instant::now(),
        }
    }
}

/// Everything but the log-assigned fields of an entry.
#[derive(Debug)]
pub(crate) struct EntryDraft {
    pub action: DecisionAction,
    pub item_id: Option<String>,
    pub projected_scenario: ProjectedScenario,
    pub constraints_evaluated: Vec<ConstraintKind>,
    pub result: DecisionResult,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
}

/// The audit trail of an engine.
#[derive(Debug, Default)]
pub struct DecisionLog {
    entries: RwLock<Vec<DecisionLogEntry>>,
}

impl DecisionLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and returns a copy of it.
    pub(crate) fn append(&self, timer: DecisionTimer, draft: EntryDraft) -> DecisionLogEntry {
        let duration_ms = timer.clock.elapsed().as_secs_f64() * 1000.0;
        let mut entries = self.entries.write();
        let entry = DecisionLogEntry {
            id: Uuid::new_v4(),
            sequence: entries.len() as u64,
            timestamp: timer.started_at,
            action: draft.action,
            item_id: draft.item_id,
            projected_scenario: draft.projected_scenario,
            constraints_evaluated: draft.constraints_evaluated,
            result: draft.result,
            violations: draft.violations,
            warnings: draft.warnings,
            duration_ms,
        };
        entries.push(entry.clone());
        entry
    }

    /// Snapshot of all entries in order.
    pub fn entries(&self) -> Vec<DecisionLogEntry> {
        self.entries.read().clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<DecisionLogEntry> {
        self.entries.read().last().cloned()
    }

    /// Entries produced by one kind of call.
    pub fn by_action(&self, action: DecisionAction) -> Vec<DecisionLogEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }

    /// Exports the log as one JSON object per line.
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let entries = self.entries.read();
        let mut out = String::new();
        for entry in entries.iter() {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CapacityPlan, ScenarioView};

    fn draft(action: DecisionAction, result: DecisionResult) -> EntryDraft {
        let plan = CapacityPlan::new(2);
        EntryDraft {
            action,
            item_id: None,
            projected_scenario: ProjectedScenario::project(&ScenarioView::new(std::iter::empty(), &plan)),
            constraints_evaluated: vec![ConstraintKind::CapacityCheck],
            result,
            violations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_append_assigns_sequence() {
        let log = DecisionLog::new();
        assert!(log.is_empty());
        let first = log.append(DecisionTimer::start(), draft(DecisionAction::AddItem, DecisionResult::Approved));
        let second = log.append(DecisionTimer::start(), draft(DecisionAction::WhatIf, DecisionResult::Evaluated));
        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
        assert_ne!(first.id, second.id);
        assert!(second.duration_ms >= 0.0);
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().map(|e| e.action), Some(DecisionAction::WhatIf));
        assert_eq!(log.by_action(DecisionAction::AddItem).len(), 1);
    }

    #[test]
    fn test_json_lines() {
        let log = DecisionLog::new();
        log.append(DecisionTimer::start(), draft(DecisionAction::ValidatePortfolio, DecisionResult::Evaluated));
        log.append(DecisionTimer::start(), draft(DecisionAction::AutoSchedule, DecisionResult::Failed));

        let text = log.to_json_lines().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(value["action"], "AUTO_SCHEDULE");
        assert_eq!(value["result"], "FAILED");
        assert_eq!(value["constraints_evaluated"][0], "CAPACITY_CHECK");

        let parsed: DecisionLogEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.id, log.entries()[0].id);
        assert_eq!(parsed.sequence, 0);
    }
}
