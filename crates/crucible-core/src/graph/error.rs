use thiserror::Error;

/// Error that can occur while building or sorting the dependency graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// A vertex with this name was already added
    #[error("Duplicate vertex: {0}")]
    DuplicateVertex(String),

    /// An edge referenced a vertex that was never added
    #[error("Unknown vertex: {0}")]
    UnknownVertex(String),

    /// Dependency cycle detected; carries the offending path
    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),
}
