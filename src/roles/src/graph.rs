//! In-memory view of the grant relation
//!
//! A `RoleGraph` holds role names and directed grant edges
//! (`grantee -> role`, "grantee includes role"). All algorithms here are
//! synchronous and bounded by the number of roles loaded:
//!
//! - **Reachability**: breadth-first closure over grant edges
//! - **Cycle check**: rejecting an edge whose target already reaches its source
//! - **Integrity check**: topological sort (petgraph) plus dangling-edge scan
//!
//! The manager loads only the part of the graph it needs into a `RoleGraph`
//! before running these checks.

use crate::types::RoleSet;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Structural violations found by [`RoleGraph::verify`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The grant relation contains a cycle
    #[error("Circular grant detected: {0}")]
    Cycle(String),

    /// An edge references a role that does not exist
    #[error("Grant {grantee} -> {role} references an undefined role")]
    DanglingEdge { grantee: String, role: String },
}

/// Directed graph of roles and grant edges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleGraph {
    /// Defined role names
    roles: HashSet<String>,

    /// grantee -> directly granted roles
    edges: HashMap<String, RoleSet>,
}

impl RoleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_role(&mut self, name: impl Into<String>) {
        self.roles.insert(name.into());
    }

    pub fn contains_role(&self, name: &str) -> bool {
        self.roles.contains(name)
    }

    pub fn roles(&self) -> &HashSet<String> {
        &self.roles
    }

    /// Record the direct grants of `grantee`, replacing any previous entry
    pub fn set_direct(&mut self, grantee: &str, granted: RoleSet) {
        self.edges.insert(grantee.to_string(), granted);
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|granted| granted.len()).sum()
    }

    /// All edges as sorted `(grantee, role)` pairs
    pub fn edges(&self) -> Vec<(String, String)> {
        let mut edges: Vec<(String, String)> = self
            .edges
            .iter()
            .flat_map(|(grantee, granted)| {
                granted
                    .iter()
                    .map(move |role| (grantee.clone(), role.clone()))
            })
            .collect();
        edges.sort();
        edges
    }

    /// Every role reachable from `start` by following grant edges.
    ///
    /// `start` itself is only included if it lies on a cycle. Each role is
    /// visited once, so the walk terminates even on a corrupted graph.
    pub fn reachable_from(&self, start: &str) -> RoleSet {
        let mut reached = RoleSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(start.to_string());

        while let Some(current) = queue.pop_front() {
            if let Some(granted) = self.edges.get(&current) {
                for role in granted {
                    if reached.insert(role.clone()) {
                        queue.push_back(role.clone());
                    }
                }
            }
        }

        reached
    }

    /// Whether `to` can be reached from `from` along one or more edges
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        self.reachable_from(from).contains(to)
    }

    /// Whether adding `grantee -> role` would close a cycle.
    ///
    /// Self-grants are 1-cycles. Otherwise the edge closes a cycle exactly
    /// when `grantee` is already reachable from `role`.
    pub fn would_create_cycle(&self, grantee: &str, role: &str) -> bool {
        grantee == role || self.has_path(role, grantee)
    }

    /// Check acyclicity and that every edge endpoint is a defined role
    pub fn verify(&self) -> Result<(), GraphError> {
        for (grantee, role) in self.edges() {
            if !self.roles.contains(&grantee) || !self.roles.contains(&role) {
                return Err(GraphError::DanglingEdge { grantee, role });
            }
        }

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in &self.roles {
            graph.add_node(name.as_str());
        }
        for (grantee, granted) in &self.edges {
            for role in granted {
                graph.add_edge(grantee.as_str(), role.as_str(), ());
            }
        }

        if toposort(&graph, None).is_err() {
            let path = self
                .find_cycle()
                .map(|cycle| cycle.join(" -> "))
                .unwrap_or_else(|| "unknown cycle".to_string());
            return Err(GraphError::Cycle(path));
        }

        Ok(())
    }

    /// Locate one cycle with a three-color DFS, returning its path
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        // 0 = unvisited, 1 = on the DFS stack, 2 = finished
        let mut state: BTreeMap<&str, u8> = BTreeMap::new();
        let mut starts: Vec<&str> = self.edges.keys().map(String::as_str).collect();
        starts.sort_unstable();

        for start in starts {
            if state.get(start).copied().unwrap_or(0) == 0 {
                let mut path = Vec::new();
                if let Some(cycle) = self.dfs_cycle(start, &mut state, &mut path) {
                    return Some(cycle);
                }
            }
        }

        None
    }

    fn dfs_cycle<'a>(
        &'a self,
        node: &'a str,
        state: &mut BTreeMap<&'a str, u8>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        match state.get(node) {
            Some(1) => {
                let start = path.iter().position(|n| *n == node)?;
                return Some(
                    path[start..]
                        .iter()
                        .chain(std::iter::once(&node))
                        .map(|n| n.to_string())
                        .collect(),
                );
            }
            Some(2) => return None,
            _ => {}
        }

        state.insert(node, 1);
        path.push(node);

        if let Some(granted) = self.edges.get(node) {
            let mut next: Vec<&str> = granted.iter().map(String::as_str).collect();
            next.sort_unstable();
            for role in next {
                if let Some(cycle) = self.dfs_cycle(role, state, path) {
                    return Some(cycle);
                }
            }
        }

        state.insert(node, 2);
        path.pop();
        None
    }
}
