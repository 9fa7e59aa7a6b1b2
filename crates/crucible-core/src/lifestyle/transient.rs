use std::sync::Arc;

use crate::component::Instance;
use crate::factory::{ComponentFactory, FactoryError};
use crate::lifestyle::LifestyleManager;

/// Builds a brand-new instance on every resolve and destroys it as
/// soon as it is released. Nothing is cached.
pub struct TransientManager {
    factory: Arc<ComponentFactory>,
}

impl TransientManager {
    pub fn new(factory: Arc<ComponentFactory>) -> Self {
        Self { factory }
    }
}

impl LifestyleManager for TransientManager {
    fn resolve(&self) -> Result<Instance, FactoryError> {
        self.factory.incarnate()
    }

    fn release(&self, instance: &Instance) {
        self.factory.etherialize(instance);
    }
}
