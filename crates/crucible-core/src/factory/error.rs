use thiserror::Error;

use crate::component::ConstructionError;
use crate::handler::error::HandlerError;

/// Error raised while building a component instance
#[derive(Debug, Error)]
pub enum FactoryError {
    /// A required dependency had no provider, or its provider failed
    #[error("Cannot satisfy dependency '{dependency}' ({service}) of component '{component}'")]
    UnresolvedDependency {
        component: String,
        dependency: String,
        service: &'static str,
        #[source]
        source: Option<Box<HandlerError>>,
    },

    /// The constructor binding failed
    #[error("Exception while attempting to instantiate {implementation} for component '{component}'")]
    Construction {
        component: String,
        implementation: &'static str,
        #[source]
        source: ConstructionError,
    },

    /// A commission stage (concern or model hook) rejected the instance
    #[error("Commission stage failed for component '{component}'")]
    Commission {
        component: String,
        #[source]
        source: ConstructionError,
    },
}
