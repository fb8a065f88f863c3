//! End-to-end portfolio scenarios and property tests.

use proptest::prelude::*;
use u_portfolio::capacity::CapacityMatrix;
use u_portfolio::engine::{
    DecisionAction, DecisionResult, GovernanceEngine, ScenarioChange, TransitionPatch,
};
use u_portfolio::graph::DependencyGraph;
use u_portfolio::models::{
    CapacityPlan, ItemStatus, ViolationCode, ViolationDetail, WarningCode, WorkItem,
};
use u_portfolio::PortfolioError;

fn team_plan() -> CapacityPlan {
    CapacityPlan::uniform(
        6,
        [("backend", 60), ("frontend", 50), ("data", 40), ("devops", 30)],
    )
}

fn roadmap() -> Vec<WorkItem> {
    vec![
        WorkItem::new("platform")
            .with_title("Platform foundation")
            .with_demand("backend", 40)
            .with_demand("devops", 20)
            .with_priority(1),
        WorkItem::new("auth")
            .with_demand("backend", 30)
            .with_demand("frontend", 20)
            .with_dependency("platform")
            .with_priority(2),
        WorkItem::new("data")
            .with_demand("backend", 20)
            .with_demand("data", 30)
            .with_dependency("platform")
            .with_priority(2),
        WorkItem::new("dashboard")
            .with_demand("frontend", 40)
            .with_dependency("auth")
            .with_priority(3),
        WorkItem::new("analytics")
            .with_demand("data", 30)
            .with_demand("frontend", 10)
            .with_dependency("data")
            .with_priority(3),
    ]
}

fn scheduled_engine() -> GovernanceEngine {
    let mut engine = GovernanceEngine::new(team_plan());
    engine.auto_schedule(roadmap()).unwrap();
    engine
}

fn start(engine: &GovernanceEngine, id: &str) -> usize {
    engine.get_item(id).and_then(|i| i.start_period).unwrap()
}

fn end(engine: &GovernanceEngine, id: &str) -> usize {
    engine.get_item(id).and_then(|i| i.end_period()).unwrap()
}

// ======================== Scenarios ========================

#[test]
fn test_auto_schedule_roadmap() {
    let mut engine = GovernanceEngine::new(team_plan());
    let outcome = engine.auto_schedule(roadmap()).unwrap();

    assert!(outcome.is_feasible());
    assert_eq!(outcome.scheduled_count(), 5);
    assert_eq!(
        outcome.order,
        vec!["platform", "auth", "data", "analytics", "dashboard"]
    );

    assert_eq!(start(&engine, "platform"), 0);
    assert_eq!(start(&engine, "auth"), 1);
    assert_eq!(start(&engine, "data"), 1);
    assert_eq!(start(&engine, "dashboard"), 2);
    assert_eq!(start(&engine, "analytics"), 2);
    assert!(start(&engine, "auth") >= end(&engine, "platform"));
    assert!(start(&engine, "dashboard") >= end(&engine, "auth"));
    assert!(engine.items().all(|i| i.status == ItemStatus::Scheduled));

    let scenario = engine.scenario();
    assert_eq!(scenario.total_demand, 240);
    assert_eq!(scenario.total_capacity, 1080);
    assert!(scenario.utilization > 0.0 && scenario.utilization <= 1.0);

    let kpi = engine.kpi();
    assert_eq!(kpi.makespan_periods, 3);
    assert!((kpi.scheduled_rate - 1.0).abs() < 1e-12);
}

#[test]
fn test_roadmap_health() {
    let engine = scheduled_engine();
    let health = engine.validate_portfolio();

    assert!(health.healthy);
    assert!(health.violations.is_empty());
    // dashboard + analytics fill frontend in period 2.
    assert_eq!(health.warnings.len(), 1);
    assert_eq!(health.warnings[0].code, WarningCode::NearCapacity);
    assert_eq!(health.warnings[0].affected_item_ids, vec!["analytics", "dashboard"]);
    assert_eq!(health.score, 100.0);
    assert_eq!(health.critical_path, vec!["platform", "auth", "dashboard"]);
}

#[test]
fn test_overloading_transition_rejected() {
    let mut engine = scheduled_engine();
    let before = engine.get_item("dashboard").cloned();

    let patch = TransitionPatch::new()
        .with_start(start(&engine, "auth"))
        .with_demand("frontend", 200);
    let result = engine.request_transition("dashboard", &patch);

    assert!(!result.approved);
    let capacity: Vec<_> = result
        .violations
        .iter()
        .filter(|v| v.code == ViolationCode::CapacityExceeded)
        .collect();
    assert_eq!(capacity.len(), 1);
    match &capacity[0].detail {
        ViolationDetail::Capacity {
            team,
            demand,
            capacity,
            ..
        } => {
            assert_eq!(team, "frontend");
            assert!(demand > capacity);
        }
        other => panic!("unexpected detail: {other:?}"),
    }
    assert!(result.alternative_suggestions.is_none());
    assert_eq!(engine.get_item("dashboard").cloned(), before);
    assert_eq!(result.item, before);

    let entry = engine.decision_log().last().unwrap();
    assert_eq!(entry.action, DecisionAction::RequestTransition);
    assert_eq!(entry.result, DecisionResult::Rejected);
    assert_eq!(entry.item_id.as_deref(), Some("dashboard"));
}

#[test]
fn test_transition_suggests_delay() {
    let mut engine = scheduled_engine();
    let result = engine.request_transition(
        "dashboard",
        &TransitionPatch::new().with_demand("frontend", 45),
    );

    assert!(!result.approved);
    assert_eq!(result.violations.len(), 1);
    let suggestion = result.alternative_suggestions.unwrap();
    assert_eq!(suggestion.start_period, 3);
    assert_eq!(suggestion.tradeoff, "Delay start to period 3");

    let accepted = engine.request_transition(
        "dashboard",
        &TransitionPatch::new()
            .with_demand("frontend", 45)
            .with_start(suggestion.start_period),
    );
    assert!(accepted.approved);
    assert_eq!(start(&engine, "dashboard"), 3);
}

#[test]
fn test_what_if_capacity_relieves_backend() {
    let plan = CapacityPlan::uniform(4, [("backend", 60), ("frontend", 50)]);
    let mut engine = GovernanceEngine::new(plan);
    engine
        .add_items(vec![
            WorkItem::new("billing").with_demand("backend", 70).with_start(0),
            WorkItem::new("search").with_demand("backend", 70).with_start(1),
        ])
        .unwrap();

    let before = engine.validate_portfolio();
    assert_eq!(before.violations.len(), 2);

    let result = engine.what_if(&[ScenarioChange::add_capacity("backend", 80)]);
    let backend = |vs: &[u_portfolio::models::Violation]| {
        vs.iter()
            .filter(|v| matches!(&v.detail, ViolationDetail::Capacity { team, .. } if team == "backend"))
            .count()
    };
    assert!(backend(&result.projected_violations) < backend(&result.baseline_violations));
    assert_eq!(backend(&result.projected_violations), 0);
    assert!(result.delta.utilization_change < 0.0);
    assert_eq!(result.delta.resolved_violations.len(), 2);

    // Live state untouched.
    assert_eq!(engine.validate_portfolio().violations.len(), 2);
    assert_eq!(engine.plan().capacity("backend", 0), 60);
}

#[test]
fn test_empty_portfolio_is_healthy() {
    let engine = GovernanceEngine::new(team_plan());
    let health = engine.validate_portfolio();
    assert_eq!(health.score, 100.0);
    assert!(health.healthy);
    assert!(health.critical_path.is_empty());
}

#[test]
fn test_cycle_detection_and_sort_failure() {
    let items = vec![
        WorkItem::new("a").with_dependency("c"),
        WorkItem::new("b").with_dependency("a"),
        WorkItem::new("c").with_dependency("b"),
    ];
    let graph = DependencyGraph::new(&items).unwrap();
    let cycles = graph.detect_cycles();
    assert_eq!(cycles.len(), 1);
    let mut members = cycles[0].clone();
    members.sort();
    assert_eq!(members, vec!["a", "b", "c"]);
    assert!(matches!(
        graph.topological_sort(),
        Err(PortfolioError::CycleDetected(_))
    ));

    let mut engine = GovernanceEngine::new(team_plan());
    let outcome = engine.auto_schedule(items).unwrap();
    assert_eq!(outcome.scheduled_count(), 0);
    assert_eq!(outcome.violations[0].code, ViolationCode::DependencyCycle);
}

#[test]
fn test_every_call_logged_in_order() {
    let mut engine = scheduled_engine();
    engine.validate_portfolio();
    engine.what_if(&[ScenarioChange::remove_item("ghost")]);
    engine.request_transition("ghost", &TransitionPatch::new());
    let _ = engine.add_item(WorkItem::new("platform"));

    let actions: Vec<DecisionAction> = engine
        .decision_log()
        .entries()
        .iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            DecisionAction::AutoSchedule,
            DecisionAction::ValidatePortfolio,
            DecisionAction::WhatIf,
            DecisionAction::RequestTransition,
            DecisionAction::AddItem,
        ]
    );

    let json = engine.decision_log().to_json_lines().unwrap();
    assert_eq!(json.lines().count(), 5);
    assert!(json.contains("\"WHAT_IF\""));
}

// ======================== Properties ========================

const TEAMS: [&str; 3] = ["backend", "frontend", "data"];

fn small_plan() -> CapacityPlan {
    CapacityPlan::uniform(6, [("backend", 50), ("frontend", 40), ("data", 30)])
}

/// Items `n0..nK`; item `i` may depend on any `j < i`, so the graph is acyclic.
fn dag_items(edges: &[Vec<bool>], demand: &[(usize, i64)]) -> Vec<WorkItem> {
    edges
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let (team, units) = demand[i % demand.len()];
            let mut item = WorkItem::new(format!("n{i}"))
                .with_demand(TEAMS[team], units)
                .with_priority((i % 3) as i32);
            for (j, &edge) in row.iter().enumerate().take(i) {
                if edge {
                    item = item.with_dependency(format!("n{j}"));
                }
            }
            item
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_allocate_deallocate_conserves(
        ops in prop::collection::vec((0usize..3, 0usize..6, 1i64..80), 0..24)
    ) {
        let base = CapacityMatrix::from_plan(&small_plan());
        let mut matrix = base.clone();
        for &(team, period, units) in &ops {
            matrix = matrix.allocate(TEAMS[team], period, units).unwrap();
        }
        for &(team, period, units) in ops.iter().rev() {
            matrix = matrix.deallocate(TEAMS[team], period, units).unwrap();
        }
        prop_assert_eq!(matrix, base);
    }

    #[test]
    fn prop_topological_sort_deterministic(
        edges in prop::collection::vec(prop::collection::vec(any::<bool>(), 8), 1..8)
    ) {
        let items = dag_items(&edges, &[(0, 10)]);
        let graph = DependencyGraph::new(&items).unwrap();
        let order = graph.topological_sort().unwrap();
        prop_assert_eq!(&order, &graph.topological_sort().unwrap());

        let reversed: Vec<WorkItem> = items.iter().rev().cloned().collect();
        prop_assert_eq!(&order, &DependencyGraph::new(&reversed).unwrap().topological_sort().unwrap());

        for item in &items {
            let pos = order.iter().position(|id| *id == item.id).unwrap();
            for dep in &item.dependencies {
                prop_assert!(order.iter().position(|id| id == dep).unwrap() < pos);
            }
        }
        prop_assert_eq!(graph.detect_cycles(), graph.detect_cycles());
    }

    #[test]
    fn prop_schedule_respects_rules(
        edges in prop::collection::vec(prop::collection::vec(any::<bool>(), 8), 1..8),
        demand in prop::collection::vec((0usize..3, 0i64..45), 1..8)
    ) {
        let items = dag_items(&edges, &demand);
        let mut engine = GovernanceEngine::new(small_plan());
        let outcome = engine.auto_schedule(items).unwrap();

        // Placed items never overbook a cell and follow their dependencies.
        prop_assert!(outcome.matrix.cells().all(|(_, _, slot)| !slot.is_overbooked()));
        for item in outcome.items.iter().filter(|i| i.is_scheduled()) {
            for dep in &item.dependencies {
                let dep_end = outcome.item(dep).and_then(|d| d.end_period());
                prop_assert!(dep_end.is_some_and(|e| e <= item.start_period.unwrap_or(0)));
            }
        }
        // Every unplaced item is explained.
        for item in outcome.items.iter().filter(|i| !i.is_scheduled()) {
            prop_assert!(outcome.violations.iter().any(|v| v.affects(&item.id)));
        }
    }

    #[test]
    fn prop_validate_portfolio_idempotent(
        starts in prop::collection::vec(0usize..6, 5)
    ) {
        let mut engine = GovernanceEngine::new(team_plan());
        let items: Vec<WorkItem> = roadmap()
            .into_iter()
            .zip(&starts)
            .map(|(item, &s)| item.with_start(s))
            .collect();
        engine.add_items(items).unwrap();
        prop_assert_eq!(engine.validate_portfolio(), engine.validate_portfolio());
    }

    #[test]
    fn prop_rejected_transition_is_pure(
        target in 0usize..5,
        new_start in 0usize..6,
        frontend in 0i64..250
    ) {
        let mut engine = scheduled_engine();
        let id = roadmap()[target].id.clone();
        let before = engine.get_item(&id).cloned();
        let others: Vec<WorkItem> = engine.items().filter(|i| i.id != id).cloned().collect();

        let patch = TransitionPatch::new()
            .with_start(new_start)
            .with_demand("frontend", frontend);
        let result = engine.request_transition(&id, &patch);

        if !result.approved {
            prop_assert_eq!(engine.get_item(&id).cloned(), before);
        } else {
            prop_assert_eq!(engine.get_item(&id).and_then(|i| i.start_period), Some(new_start));
        }
        let after: Vec<WorkItem> = engine.items().filter(|i| i.id != id).cloned().collect();
        prop_assert_eq!(others, after);
    }
}
