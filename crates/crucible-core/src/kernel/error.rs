//! # Kernel Errors
//!
//! [`Error`] is the top-level error type embedding applications see:
//! it aggregates the typed subsystem errors and adds the kernel's own
//! lookup and lifecycle failures. Each subsystem keeps its specific
//! enum; `#[from]` conversions let `?` flow them upward.

use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::component::error::RegistrationError;
use crate::config::error::ConfigError;
use crate::factory::error::FactoryError;
use crate::graph::error::GraphError;
use crate::handler::error::HandlerError;

/// Top-level error type for kernel operations
#[derive(Debug, ThisError)]
pub enum Error {
    /// Component model construction or registration failed
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// A handler refused or failed a resolve
    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    /// Instance construction failed
    #[error("Factory error: {0}")]
    Factory(#[from] FactoryError),

    /// The dependency graph could not be ordered
    #[error("Dependency graph error: {0}")]
    Graph(#[from] GraphError),

    /// Configuration loading or conversion failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No component registered under this key
    #[error("No component registered under key '{0}'")]
    ComponentNotFound(String),

    /// No component provides this service
    #[error("No component provides service {0}")]
    ServiceNotFound(&'static str),

    /// A typed resolve found an instance of a different type
    #[error("Component '{key}' did not resolve to an instance of {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// The kernel was disposed; no further operations are accepted
    #[error("Kernel has been disposed")]
    KernelDisposed,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;
