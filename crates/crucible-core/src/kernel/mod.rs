//! # Kernel
//!
//! The microkernel registry. Maps component keys and service types to
//! handlers, tracks which declared dependencies are still unsatisfied
//! kernel-wide, and notifies waiting handlers synchronously when a
//! newly added component satisfies them. Commission and decommission
//! walk the component set in dependency order computed by the
//! [`graph`](crate::graph) verifier, so teardown is deterministic and
//! reverse-ordered rather than left to drop timing.

pub mod constants;
pub mod error;
pub mod registry;

pub use error::{Error, Result};
pub use registry::{Kernel, ModelListener};
