//! # Dependency Graph Verifier
//!
//! A standalone topological sorter used to decide component
//! commission and decommission order. Vertices carry an arbitrary
//! payload and directed edges to the vertices they depend on; a
//! successful sort assigns every vertex an order rank such that each
//! dependency ranks strictly below its dependents. Cycles are
//! reported with the full offending path for diagnostics.
//!
//! The sorter has no knowledge of the kernel; it is reused anywhere a
//! dependency ordering is needed.

pub mod error;

pub use error::GraphError;

use std::collections::HashMap;

/// A node in the dependency graph.
///
/// `order` is only meaningful after a successful [`TopologicalSorter::sort`];
/// `seen` marks membership of the current DFS recursion stack and is
/// reset before every run.
#[derive(Debug)]
pub struct Vertex<T> {
    name: String,
    payload: T,
    dependencies: Vec<usize>,
    order: usize,
    seen: bool,
    resolved: bool,
}

impl<T> Vertex<T> {
    fn new(name: String, payload: T) -> Self {
        Self {
            name,
            payload,
            dependencies: Vec::new(),
            order: 0,
            seen: false,
            resolved: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Computed rank: 0 for a vertex with no dependencies, otherwise
    /// one more than the highest-ranked dependency.
    pub fn order(&self) -> usize {
        self.order
    }
}

/// Verifies that a set of vertices with directed dependency edges is
/// acyclic and computes a total order consistent with every edge.
pub struct TopologicalSorter<T> {
    vertices: Vec<Vertex<T>>,
    index: HashMap<String, usize>,
}

impl<T> TopologicalSorter<T> {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add a vertex. Names must be unique within the sorter.
    pub fn add_vertex(&mut self, name: &str, payload: T) -> Result<(), GraphError> {
        if self.index.contains_key(name) {
            return Err(GraphError::DuplicateVertex(name.to_string()));
        }
        self.index.insert(name.to_string(), self.vertices.len());
        self.vertices.push(Vertex::new(name.to_string(), payload));
        Ok(())
    }

    /// Add a directed edge: `name` depends on `dependency`.
    pub fn add_edge(&mut self, name: &str, dependency: &str) -> Result<(), GraphError> {
        let from = *self
            .index
            .get(name)
            .ok_or_else(|| GraphError::UnknownVertex(name.to_string()))?;
        let to = *self
            .index
            .get(dependency)
            .ok_or_else(|| GraphError::UnknownVertex(dependency.to_string()))?;
        self.vertices[from].dependencies.push(to);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The rank assigned by the last successful sort.
    pub fn order_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).map(|i| self.vertices[*i].order)
    }

    /// Compute the order ranks and return vertex names sorted
    /// ascending by rank (dependencies first). The sorter can be
    /// re-sorted after adding more vertices or edges; each run resets
    /// previous state.
    pub fn sort(&mut self) -> Result<Vec<String>, GraphError> {
        self.reset();

        let mut stack = Vec::new();
        for idx in 0..self.vertices.len() {
            self.resolve_order(idx, &mut stack)?;
        }

        let mut sorted: Vec<usize> = (0..self.vertices.len()).collect();
        // Stable: equal ranks keep insertion order.
        sorted.sort_by_key(|i| self.vertices[*i].order);
        Ok(sorted
            .into_iter()
            .map(|i| self.vertices[i].name.clone())
            .collect())
    }

    /// [`sort`](Self::sort) reversed: dependents first. This is the
    /// decommission order.
    pub fn reverse_sort(&mut self) -> Result<Vec<String>, GraphError> {
        let mut order = self.sort()?;
        order.reverse();
        Ok(order)
    }

    fn reset(&mut self) {
        for vertex in &mut self.vertices {
            vertex.order = 0;
            vertex.seen = false;
            vertex.resolved = false;
        }
    }

    /// DFS with a recursion-stack marker. `seen` distinguishes "on
    /// the current path" (back-edge, i.e. a cycle) from "already
    /// resolved by an earlier walk".
    fn resolve_order(&mut self, idx: usize, stack: &mut Vec<usize>) -> Result<usize, GraphError> {
        if self.vertices[idx].resolved {
            return Ok(self.vertices[idx].order);
        }
        if self.vertices[idx].seen {
            // An ancestor on the current path depends on itself
            // transitively. Report the path from its first
            // occurrence back to it.
            let start = stack
                .iter()
                .position(|i| *i == idx)
                .unwrap_or(0);
            let mut path: Vec<String> = stack[start..]
                .iter()
                .map(|i| self.vertices[*i].name.clone())
                .collect();
            path.push(self.vertices[idx].name.clone());
            return Err(GraphError::CyclicDependency(path));
        }

        self.vertices[idx].seen = true;
        stack.push(idx);

        let mut order = 0;
        let dependencies = self.vertices[idx].dependencies.clone();
        for dep in dependencies {
            order = order.max(1 + self.resolve_order(dep, stack)?);
        }

        stack.pop();
        let vertex = &mut self.vertices[idx];
        vertex.seen = false;
        vertex.resolved = true;
        vertex.order = order;
        Ok(order)
    }
}

impl<T> Default for TopologicalSorter<T> {
    fn default() -> Self {
        Self::new()
    }
}
