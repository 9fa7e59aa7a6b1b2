//! # Lifestyle Managers
//!
//! Instance caching policies. Every manager delegates actual
//! creation and destruction to the component's [`ComponentFactory`];
//! the policies differ only in what they cache between resolves:
//!
//! - [`SingletonManager`]: at most one shared instance
//! - [`TransientManager`]: a fresh instance per resolve, no cache
//! - [`PerThreadManager`]: one instance per calling thread
//! - [`PooledManager`]: a bounded free list of reusable instances
//!
//! [`Lifestyle::Custom`](crate::component::Lifestyle::Custom) models
//! supply their own manager through the model's lifestyle factory.

pub mod per_thread;
pub mod pooled;
pub mod singleton;
pub mod transient;

pub use per_thread::PerThreadManager;
pub use pooled::PooledManager;
pub use singleton::SingletonManager;
pub use transient::TransientManager;

use std::sync::Arc;

use crate::component::{ComponentModel, Instance, Lifestyle, RegistrationError};
use crate::factory::{ComponentFactory, FactoryError};

/// Instance lifecycle policy owned by exactly one handler.
///
/// `commission` and `decommission` bracket the manager's own setup
/// and teardown, independent of per-instance resolve/release. The
/// owning handler never calls `resolve` while its dependencies are
/// unsatisfied.
pub trait LifestyleManager: Send + Sync {
    /// Produce an instance according to the caching policy.
    fn resolve(&self) -> Result<Instance, FactoryError>;

    /// Hand an instance back. What this does is policy-specific; it
    /// is only called for instances this manager produced.
    fn release(&self, instance: &Instance);

    /// Manager setup hook, called during kernel commission.
    fn commission(&self) -> Result<(), FactoryError> {
        Ok(())
    }

    /// Manager teardown hook; destroys whatever the policy cached.
    fn decommission(&self) {}
}

/// Build the manager matching the model's declared lifestyle.
pub(crate) fn for_model(
    model: &ComponentModel,
    factory: Arc<ComponentFactory>,
) -> Result<Box<dyn LifestyleManager>, RegistrationError> {
    Ok(match model.lifestyle() {
        Lifestyle::Singleton => Box::new(SingletonManager::new(factory)),
        Lifestyle::Transient => Box::new(TransientManager::new(factory)),
        Lifestyle::PerThread => Box::new(PerThreadManager::new(factory)),
        Lifestyle::Pooled => Box::new(PooledManager::new(factory, model.pool_capacity())),
        Lifestyle::Custom => {
            let lifestyle_factory = model
                .lifestyle_factory()
                .ok_or_else(|| RegistrationError::MissingLifestyleFactory(model.name().to_string()))?;
            lifestyle_factory(factory)
        }
    })
}
