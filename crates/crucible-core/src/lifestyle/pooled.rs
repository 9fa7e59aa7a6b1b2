use std::sync::{Arc, Mutex};

use crate::component::Instance;
use crate::factory::{ComponentFactory, FactoryError};
use crate::lifestyle::LifestyleManager;
use crate::utils::lock;

/// A bounded free list of reusable instances. Resolve recycles a
/// pooled instance when one is available and incarnates otherwise;
/// release returns the instance to the pool up to capacity and
/// destroys the overflow.
pub struct PooledManager {
    factory: Arc<ComponentFactory>,
    capacity: usize,
    pool: Mutex<Vec<Instance>>,
}

impl PooledManager {
    pub fn new(factory: Arc<ComponentFactory>, capacity: usize) -> Self {
        Self {
            factory,
            capacity,
            pool: Mutex::new(Vec::new()),
        }
    }

    /// Instances currently sitting idle in the pool.
    pub fn idle(&self) -> usize {
        lock(&self.pool).len()
    }
}

impl LifestyleManager for PooledManager {
    fn resolve(&self) -> Result<Instance, FactoryError> {
        if let Some(instance) = lock(&self.pool).pop() {
            log::trace!(
                target: self.factory.model().logger_target(),
                "Recycling a pooled instance of '{}'",
                self.factory.model().name()
            );
            return Ok(instance);
        }
        self.factory.incarnate()
    }

    fn release(&self, instance: &Instance) {
        let mut pool = lock(&self.pool);
        if pool.len() < self.capacity {
            pool.push(instance.clone());
            return;
        }
        drop(pool);
        self.factory.etherialize(instance);
    }

    fn decommission(&self) {
        let drained: Vec<Instance> = lock(&self.pool).drain(..).collect();
        for instance in drained {
            self.factory.etherialize(&instance);
        }
    }
}
