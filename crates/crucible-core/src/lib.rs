//! # Crucible Core
//!
//! An in-process inversion-of-control microkernel: components are
//! registered against a [`Kernel`] with an explicit constructor
//! binding and a declared dependency list, and the kernel wires the
//! object graph, gates resolution on dependency availability, and
//! tears everything down in reverse dependency order.

pub mod component;
pub mod config;
pub mod factory;
pub mod graph;
pub mod handler;
pub mod kernel;
pub mod lifestyle;
mod utils;

// Re-export key public types for easier use by embedding applications.
pub use component::{ActivationPolicy, ComponentModel, DependencyModel, Instance, Lifestyle, ServiceKey};
pub use config::{ConfigNode, ConfigurationProvider, MemoryConfiguration};
pub use factory::ComponentConcern;
pub use graph::TopologicalSorter;
pub use handler::{Handler, HandlerState};
pub use kernel::Kernel;
pub use kernel::error::{Error, Result};
pub use lifestyle::LifestyleManager;

// Cross-subsystem integration tests.
#[cfg(test)]
mod tests;
