//! Dependency graph over work items.
//!
//! Holds forward (dependency → dependents) and reverse (item → dependencies)
//! adjacency built from each item's dependency list. All adjacency lists are
//! kept sorted, so every traversal is deterministic.
//!
//! # Algorithms
//!
//! - **Topological sort**: Kahn's algorithm. The zero-indegree frontier is a
//!   sorted vector; newly freed nodes are inserted at their sorted position,
//!   so ties always resolve by key then ID.
//! - **Cycle detection**: iterative three-color DFS over dependency edges with
//!   an explicit stack and a parent map. A back edge to an in-progress node
//!   yields the cycle by walking parents back to that node.
//! - **Critical path**: longest path (unit edge weight) by dynamic
//!   programming over the topological order.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.3-22.4, 24.2

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{PortfolioError, Result};
use crate::models::{ItemStatus, WorkItem};

/// Outcome of a start-readiness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartCheck {
    /// Whether every dependency is done.
    pub allowed: bool,
    /// Dependencies not yet done, sorted.
    pub blockers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

/// Directed dependency graph. Edges point from an item to what it depends on.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    status: BTreeMap<String, ItemStatus>,
    dependencies: BTreeMap<String, Vec<String>>,
    dependents: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Builds a graph, failing on duplicate IDs or unknown dependency references.
    pub fn new<'a, I>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a WorkItem>,
    {
        let items: Vec<&WorkItem> = items.into_iter().collect();

        let mut ids = BTreeSet::new();
        for item in &items {
            if !ids.insert(item.id.as_str()) {
                return Err(PortfolioError::DuplicateId(item.id.clone()));
            }
        }
        for item in &items {
            if let Some(dep) = item.dependencies.iter().find(|d| !ids.contains(d.as_str())) {
                return Err(PortfolioError::UnknownDependency {
                    item_id: item.id.clone(),
                    dependency_id: dep.clone(),
                });
            }
        }

        Ok(Self::assemble(&items))
    }

    /// Builds a graph, silently dropping references to unknown items.
    ///
    /// Used on scratch scenarios where removals may leave dangling edges;
    /// those are reported by the dependency evaluator instead. An item
    /// replaces any earlier item with the same ID, edges included.
    pub fn partial<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a WorkItem>,
    {
        let items: Vec<&WorkItem> = items.into_iter().collect();
        Self::assemble(&items)
    }

    fn assemble(items: &[&WorkItem]) -> Self {
        let latest: BTreeMap<&str, &WorkItem> =
            items.iter().map(|item| (item.id.as_str(), *item)).collect();
        let status: BTreeMap<String, ItemStatus> = latest
            .iter()
            .map(|(id, item)| (id.to_string(), item.status))
            .collect();

        let empty = || -> BTreeMap<String, Vec<String>> {
            status.keys().map(|id| (id.clone(), Vec::new())).collect()
        };
        let mut dependencies = empty();
        let mut dependents = empty();

        for item in latest.values() {
            for dep in &item.dependencies {
                if !status.contains_key(dep) {
                    continue;
                }
                if let Some(deps) = dependencies.get_mut(&item.id) {
                    deps.push(dep.clone());
                }
                if let Some(users) = dependents.get_mut(dep) {
                    users.push(item.id.clone());
                }
            }
        }

        for list in dependencies.values_mut().chain(dependents.values_mut()) {
            list.sort();
            list.dedup();
        }

        Self {
            status,
            dependencies,
            dependents,
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.status.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
    }

    /// Whether a node exists.
    pub fn contains(&self, id: &str) -> bool {
        self.status.contains_key(id)
    }

    /// Node IDs in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.status.keys().map(|id| id.as_str())
    }

    /// Direct dependencies of a node, sorted.
    pub fn dependencies(&self, id: &str) -> &[String] {
        self.dependencies.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Direct dependents of a node, sorted.
    pub fn dependents(&self, id: &str) -> &[String] {
        self.dependents.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Number of direct dependencies.
    pub fn fan_in(&self, id: &str) -> usize {
        self.dependencies(id).len()
    }

    /// Number of direct dependents.
    pub fn fan_out(&self, id: &str) -> usize {
        self.dependents(id).len()
    }

    /// Topological order, dependencies first, ties broken by ID.
    ///
    /// # Errors
    /// `CycleDetected` if some node cannot be ordered.
    pub fn topological_sort(&self) -> Result<Vec<String>> {
        self.topological_sort_by(|_| ())
    }

    /// Topological order with ties broken by `key`, then by ID.
    pub fn topological_sort_by<K, F>(&self, key: F) -> Result<Vec<String>>
    where
        K: Ord,
        F: Fn(&str) -> K,
    {
        let mut indegree: HashMap<&str, usize> = self
            .dependencies
            .iter()
            .map(|(id, deps)| (id.as_str(), deps.len()))
            .collect();

        let mut frontier: Vec<(K, &str)> = self
            .ids()
            .filter(|id| indegree.get(id) == Some(&0))
            .map(|id| (key(id), id))
            .collect();
        frontier.sort();

        let mut order = Vec::with_capacity(self.len());
        while !frontier.is_empty() {
            let (_, id) = frontier.remove(0);
            order.push(id.to_string());

            for next in self.dependents(id) {
                let Some(degree) = indegree.get_mut(next.as_str()) else {
                    continue;
                };
                *degree -= 1;
                if *degree == 0 {
                    let entry = (key(next), next.as_str());
                    let pos = frontier.binary_search(&entry).unwrap_or_else(|p| p);
                    frontier.insert(pos, entry);
                }
            }
        }

        if order.len() < self.len() {
            let cycle = self.detect_cycles().into_iter().next().unwrap_or_else(|| {
                self.ids()
                    .filter(|id| !order.iter().any(|o| o.as_str() == *id))
                    .map(str::to_string)
                    .collect()
            });
            return Err(PortfolioError::CycleDetected(cycle));
        }
        Ok(order)
    }

    /// Finds dependency cycles.
    ///
    /// Roots are visited in ID order. Each cycle is returned as the path
    /// from the repeated node along dependency edges, e.g. `[a, b, c]` for
    /// `a → b → c → a`.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        let mut color: HashMap<&str, Color> =
            self.ids().map(|id| (id, Color::Unvisited)).collect();
        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut cycles = Vec::new();

        for root in self.ids() {
            if color.get(root) != Some(&Color::Unvisited) {
                continue;
            }
            color.insert(root, Color::InProgress);
            let mut stack: Vec<(&str, usize)> = vec![(root, 0)];

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                let deps = self.dependencies(node);
                if top.1 >= deps.len() {
                    color.insert(node, Color::Done);
                    stack.pop();
                    continue;
                }
                let next = deps[top.1].as_str();
                top.1 += 1;

                match color.get(next).copied().unwrap_or(Color::Done) {
                    Color::Unvisited => {
                        parent.insert(next, node);
                        color.insert(next, Color::InProgress);
                        stack.push((next, 0));
                    }
                    Color::InProgress => cycles.push(walk_back(node, next, &parent)),
                    Color::Done => {}
                }
            }
        }

        cycles
    }

    /// Whether the graph has at least one cycle.
    pub fn has_cycle(&self) -> bool {
        !self.detect_cycles().is_empty()
    }

    /// Checks whether an item may start: every dependency must be done.
    pub fn can_start(&self, id: &str) -> Result<StartCheck> {
        if !self.contains(id) {
            return Err(PortfolioError::ItemNotFound(id.to_string()));
        }
        let blockers: Vec<String> = self
            .dependencies(id)
            .iter()
            .filter(|dep| !self.status.get(dep.as_str()).is_some_and(|s| s.is_done()))
            .cloned()
            .collect();
        Ok(StartCheck {
            allowed: blockers.is_empty(),
            blockers,
        })
    }

    /// Longest dependency chain in the graph, root first.
    ///
    /// Empty for an empty graph. On ties the node reached first in
    /// topological order wins.
    pub fn critical_path(&self) -> Result<Vec<String>> {
        let (order, depth, parent) = self.longest_paths()?;
        let mut end: Option<&str> = None;
        let mut best = 0;
        for id in &order {
            let d = depth[id.as_str()];
            if end.is_none() || d > best {
                end = Some(id.as_str());
                best = d;
            }
        }
        Ok(end.map(|e| trace(e, &parent)).unwrap_or_default())
    }

    /// Number of hops on the longest chain ending at `id`.
    pub fn chain_depth(&self, id: &str) -> Result<usize> {
        if !self.contains(id) {
            return Err(PortfolioError::ItemNotFound(id.to_string()));
        }
        let (_, depth, _) = self.longest_paths()?;
        Ok(depth.get(id).copied().unwrap_or(0))
    }

    /// Longest chain ending at `id`, root first.
    pub fn longest_chain_to(&self, id: &str) -> Result<Vec<String>> {
        if !self.contains(id) {
            return Err(PortfolioError::ItemNotFound(id.to_string()));
        }
        let (_, _, parent) = self.longest_paths()?;
        Ok(trace(id, &parent))
    }

    #[allow(clippy::type_complexity)]
    fn longest_paths(&self) -> Result<(Vec<String>, HashMap<&str, usize>, HashMap<&str, &str>)> {
        let order = self.topological_sort()?;
        let mut depth: HashMap<&str, usize> = self.ids().map(|id| (id, 0)).collect();
        let mut parent: HashMap<&str, &str> = HashMap::new();

        for id in self.ids_in(&order) {
            let d = depth.get(id).copied().unwrap_or(0);
            for next in self.dependents(id) {
                let next = next.as_str();
                if d + 1 > depth.get(next).copied().unwrap_or(0) {
                    depth.insert(next, d + 1);
                    parent.insert(next, id);
                }
            }
        }
        Ok((order, depth, parent))
    }

    /// Re-borrows IDs from the graph in the given order.
    fn ids_in<'s>(&'s self, order: &[String]) -> Vec<&'s str> {
        order
            .iter()
            .filter_map(|id| self.status.get_key_value(id.as_str()).map(|(k, _)| k.as_str()))
            .collect()
    }
}

fn walk_back(node: &str, repeated: &str, parent: &HashMap<&str, &str>) -> Vec<String> {
    let mut path = vec![node.to_string()];
    let mut current = node;
    while current != repeated {
        match parent.get(current) {
            Some(&p) => {
                current = p;
                path.push(p.to_string());
            }
            None => break,
        }
    }
    path.reverse();
    path
}

fn trace(end: &str, parent: &HashMap<&str, &str>) -> Vec<String> {
    let mut path = vec![end.to_string()];
    let mut current = end;
    while let Some(&p) = parent.get(current) {
        path.push(p.to_string());
        current = p;
    }
    path.reverse();
    path
}
