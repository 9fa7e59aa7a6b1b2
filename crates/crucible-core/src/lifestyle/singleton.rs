use std::sync::{Arc, Mutex};

use crate::component::Instance;
use crate::factory::{ComponentFactory, FactoryError};
use crate::lifestyle::LifestyleManager;
use crate::utils::lock;

/// Lazily creates exactly one instance and shares it with every
/// caller. The slot mutex is held across first construction, so two
/// threads racing the first resolve cannot build two instances; the
/// lock is scoped to this component's factory, not a kernel-wide
/// lock.
///
/// Because the lock is held while dependencies are resolved, a
/// dependency cycle between singleton components would deadlock a
/// direct resolve. Cycles must be ruled out before resolving, which
/// `Kernel::commission_all` does through the graph verifier.
pub struct SingletonManager {
    factory: Arc<ComponentFactory>,
    instance: Mutex<Option<Instance>>,
}

impl SingletonManager {
    pub fn new(factory: Arc<ComponentFactory>) -> Self {
        Self {
            factory,
            instance: Mutex::new(None),
        }
    }
}

impl LifestyleManager for SingletonManager {
    fn resolve(&self) -> Result<Instance, FactoryError> {
        let mut slot = lock(&self.instance);
        if let Some(instance) = slot.as_ref() {
            return Ok(instance.clone());
        }
        let instance = self.factory.incarnate()?;
        *slot = Some(instance.clone());
        Ok(instance)
    }

    fn release(&self, _instance: &Instance) {
        // The shared instance lives until decommission.
    }

    fn decommission(&self) {
        if let Some(instance) = lock(&self.instance).take() {
            self.factory.etherialize(&instance);
        }
    }
}
