use thiserror::Error;

use crate::factory::FactoryError;

/// Error raised by a handler on resolve
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler is in the waiting state; the component cannot be
    /// built until the listed services gain providers. Distinct from
    /// a construction failure so callers can tell "not ready yet"
    /// from "broke while building".
    #[error("Component '{component}' is awaiting dependencies: {}", missing.join(", "))]
    AwaitingDependencies {
        component: String,
        missing: Vec<String>,
    },

    /// The handler was decommissioned
    #[error("Component '{component}' has been decommissioned")]
    InvalidState { component: String },

    /// Instance construction failed; the cause is preserved
    #[error("Exception while attempting to instantiate component '{component}'")]
    CreationFailed {
        component: String,
        #[source]
        source: FactoryError,
    },
}
