use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::component::Instance;
use crate::factory::{ComponentFactory, FactoryError};
use crate::lifestyle::LifestyleManager;

// One slot map per thread, keyed by manager id. The cached instance
// never lives in a shared field, so it cannot cross threads.
thread_local! {
    static THREAD_INSTANCES: RefCell<HashMap<usize, Instance>> = RefCell::new(HashMap::new());
}

static NEXT_SLOT: AtomicUsize = AtomicUsize::new(0);

/// One instance per calling thread, cached in thread-local storage.
/// Two threads resolving the same component see distinct instances;
/// repeated resolves on one thread see the same one.
///
/// Decommission can only drain the calling thread's slot; slots on
/// other threads are dropped with their thread-local map when that
/// thread exits.
pub struct PerThreadManager {
    factory: Arc<ComponentFactory>,
    slot: usize,
}

impl PerThreadManager {
    pub fn new(factory: Arc<ComponentFactory>) -> Self {
        Self {
            factory,
            slot: NEXT_SLOT.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl LifestyleManager for PerThreadManager {
    fn resolve(&self) -> Result<Instance, FactoryError> {
        let cached = THREAD_INSTANCES.with(|map| map.borrow().get(&self.slot).cloned());
        if let Some(instance) = cached {
            return Ok(instance);
        }
        // Incarnate outside the borrow: construction may recursively
        // resolve other per-thread components.
        let instance = self.factory.incarnate()?;
        THREAD_INSTANCES.with(|map| {
            map.borrow_mut().insert(self.slot, instance.clone());
        });
        Ok(instance)
    }

    fn release(&self, _instance: &Instance) {
        // The thread keeps its instance until decommission.
    }

    fn decommission(&self) {
        let cached = THREAD_INSTANCES.with(|map| map.borrow_mut().remove(&self.slot));
        if let Some(instance) = cached {
            self.factory.etherialize(&instance);
        }
    }
}
