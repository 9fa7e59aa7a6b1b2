use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::component::{ComponentModel, Instance, RegistrationError, ServiceKey};
use crate::config::{ConfigurationProvider, NullConfiguration};
use crate::factory::{ComponentConcern, ConcernSet};
use crate::graph::TopologicalSorter;
use crate::handler::Handler;
use crate::kernel::constants;
use crate::kernel::error::{Error, Result};
use crate::utils::{lock, read, write};

/// Facility hook invoked when a component model has been constructed,
/// before its handler is finalized. Listeners may override lifestyle
/// or activation on the model.
pub trait ModelListener: Send + Sync {
    fn model_constructed(&self, model: &mut ComponentModel);
}

/// The microkernel: registry of handlers keyed by component name and
/// by provided service.
///
/// All operations are synchronous; dependency-satisfaction
/// notifications are delivered in the thread performing the
/// satisfying registration, before that call returns. The kernel owns
/// the subscription table, so handlers never hold a reference back to
/// it. Registrations are serialized against each other and against
/// dispose, which keeps check-and-subscribe atomic with respect to
/// publish-and-notify.
pub struct Kernel {
    /// Serializes add_component and dispose. Without it a provider
    /// registering between a consumer's init and its subscription
    /// would notify nobody, stranding the consumer in
    /// WaitingDependency.
    registration: Mutex<()>,
    handlers: RwLock<HashMap<String, Arc<Handler>>>,
    /// Registration order, kept for deterministic graph construction
    /// and as the teardown fallback.
    registration_order: Mutex<Vec<String>>,
    /// Service lookup; the first registered provider of a service wins.
    services: RwLock<HashMap<ServiceKey, Arc<Handler>>>,
    /// Handlers waiting for a provider of a service.
    waiting: Mutex<HashMap<ServiceKey, Vec<Weak<Handler>>>>,
    listeners: Mutex<Vec<Box<dyn ModelListener>>>,
    concerns: Arc<ConcernSet>,
    configuration: Arc<dyn ConfigurationProvider>,
    commission_order: Mutex<Option<Vec<String>>>,
    disposed: AtomicBool,
}

impl Kernel {
    pub fn new() -> Self {
        Self::with_configuration(Arc::new(NullConfiguration))
    }

    /// Create a kernel drawing component configuration from the given
    /// provider.
    pub fn with_configuration(configuration: Arc<dyn ConfigurationProvider>) -> Self {
        log::info!(
            target: constants::LOG_TARGET,
            "Starting {} v{}",
            constants::KERNEL_NAME,
            constants::KERNEL_VERSION
        );
        Self {
            registration: Mutex::new(()),
            handlers: RwLock::new(HashMap::new()),
            registration_order: Mutex::new(Vec::new()),
            services: RwLock::new(HashMap::new()),
            waiting: Mutex::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
            concerns: Arc::new(ConcernSet::default()),
            configuration,
            commission_order: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    /// Register a facility hook run against every model before its
    /// handler is built. Applies to registrations after this call.
    pub fn add_model_listener(&self, listener: Box<dyn ModelListener>) {
        lock(&self.listeners).push(listener);
    }

    /// Register a kernel-wide commission/decommission concern applied
    /// around every instance built from now on.
    pub fn add_concern(&self, concern: Arc<dyn ComponentConcern>) {
        self.concerns.push(concern);
    }

    /// Register a component. Builds the handler, wires it against the
    /// services already known, publishes the model's service, and
    /// synchronously notifies handlers that were waiting for it.
    pub fn add_component(&self, mut model: ComponentModel) -> Result<Arc<Handler>> {
        let _registration = lock(&self.registration);
        self.ensure_live()?;
        let name = model.name().to_string();
        if read(&self.handlers).contains_key(&name) {
            return Err(RegistrationError::DuplicateKey(name).into());
        }

        model.set_configuration(self.configuration.configuration(&name));
        model.set_logger_target(format!("{}::{}", constants::LOG_TARGET, name));
        for listener in lock(&self.listeners).iter() {
            listener.model_constructed(&mut model);
        }
        log::debug!(
            target: constants::LOG_TARGET,
            "Registering component '{}' providing {} ({} lifestyle)",
            name,
            model.service(),
            model.lifestyle()
        );

        let service = model.service();
        let handler = Arc::new(Handler::new(model, self.concerns.clone())?);
        let subscriptions = {
            let services = read(&self.services);
            handler.init(&services)
        };

        write(&self.handlers).insert(name.clone(), handler.clone());
        lock(&self.registration_order).push(name.clone());

        {
            let mut waiting = lock(&self.waiting);
            for service in subscriptions {
                waiting
                    .entry(service)
                    .or_default()
                    .push(Arc::downgrade(&handler));
            }
        }

        let newly_published = {
            let mut services = write(&self.services);
            match services.contains_key(&service) {
                true => false,
                false => {
                    services.insert(service, handler.clone());
                    true
                }
            }
        };
        if newly_published {
            let waiters = lock(&self.waiting).remove(&service).unwrap_or_default();
            for waiter in waiters {
                if let Some(waiter) = waiter.upgrade() {
                    // A component cannot provide its own dependency.
                    if Arc::ptr_eq(&waiter, &handler) {
                        continue;
                    }
                    waiter.dependency_satisfied(service, handler.clone());
                }
            }
        }
        Ok(handler)
    }

    /// Handler registered under this component key.
    pub fn handler(&self, key: &str) -> Result<Arc<Handler>> {
        self.ensure_live()?;
        read(&self.handlers)
            .get(key)
            .cloned()
            .ok_or_else(|| Error::ComponentNotFound(key.to_string()))
    }

    /// Handler currently providing service `S`.
    pub fn handler_for_service<S: Any + Send + Sync>(&self) -> Result<Arc<Handler>> {
        self.ensure_live()?;
        let service = ServiceKey::of::<S>();
        read(&self.services)
            .get(&service)
            .cloned()
            .ok_or(Error::ServiceNotFound(service.type_name()))
    }

    pub fn has_component(&self, key: &str) -> bool {
        !self.is_disposed() && read(&self.handlers).contains_key(key)
    }

    pub fn has_service<S: Any + Send + Sync>(&self) -> bool {
        !self.is_disposed() && read(&self.services).contains_key(&ServiceKey::of::<S>())
    }

    pub fn component_count(&self) -> usize {
        read(&self.handlers).len()
    }

    /// Resolve an instance by component key.
    pub fn resolve(&self, key: &str) -> Result<Instance> {
        Ok(self.handler(key)?.resolve()?)
    }

    /// Resolve by component key and downcast to the expected type.
    pub fn resolve_as<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>> {
        self.resolve(key)?
            .downcast::<T>()
            .map_err(|_| Error::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Resolve whichever component provides service `S`.
    pub fn resolve_service<S: Any + Send + Sync>(&self) -> Result<Arc<S>> {
        let handler = self.handler_for_service::<S>()?;
        let key = handler.model().name().to_string();
        handler
            .resolve()?
            .downcast::<S>()
            .map_err(|_| Error::TypeMismatch {
                key,
                expected: type_name::<S>(),
            })
    }

    /// Hand an instance back to the handler that produced it. A no-op
    /// if that handler does not own the instance.
    pub fn release(&self, key: &str, instance: &Instance) -> Result<()> {
        self.handler(key)?.release(instance);
        Ok(())
    }

    /// Commission every registered component in dependency order:
    /// dependencies before dependents, eager components resolved once.
    /// Fails on dependency cycles.
    pub fn commission_all(&self) -> Result<()> {
        self.ensure_live()?;
        let order = self.dependency_order()?;
        log::info!(
            target: constants::LOG_TARGET,
            "Commissioning {} components",
            order.len()
        );
        for name in &order {
            self.handler(name)?.commission()?;
        }
        *lock(&self.commission_order) = Some(order);
        Ok(())
    }

    /// Decommission every component in reverse dependency order and
    /// drop the registry. Idempotent; all later kernel operations
    /// fail with [`Error::KernelDisposed`].
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        // Wait out any in-flight registration before tearing down.
        let _registration = lock(&self.registration);
        log::info!(target: constants::LOG_TARGET, "Disposing kernel");

        let order = match lock(&self.commission_order).take() {
            Some(order) => order,
            None => match self.dependency_order() {
                Ok(order) => order,
                Err(err) => {
                    // Teardown proceeds best-effort even on a broken graph.
                    log::warn!(
                        target: constants::LOG_TARGET,
                        "Falling back to registration order for teardown: {}",
                        err
                    );
                    lock(&self.registration_order).clone()
                }
            },
        };

        let handlers: HashMap<String, Arc<Handler>> = read(&self.handlers).clone();
        for name in order.iter().rev() {
            if let Some(handler) = handlers.get(name) {
                handler.decommission();
            }
        }

        write(&self.handlers).clear();
        write(&self.services).clear();
        lock(&self.waiting).clear();
        lock(&self.registration_order).clear();
        log::info!(target: constants::LOG_TARGET, "Kernel disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn ensure_live(&self) -> Result<()> {
        match self.is_disposed() {
            true => Err(Error::KernelDisposed),
            false => Ok(()),
        }
    }

    /// Topological order over all registered components: dependencies
    /// first. Edges follow the provider each dependency actually
    /// resolves against; unsatisfied dependencies contribute no edge.
    fn dependency_order(&self) -> Result<Vec<String>> {
        let handlers = read(&self.handlers);
        let services = read(&self.services);
        let order = lock(&self.registration_order).clone();

        let mut sorter = TopologicalSorter::new();
        for name in &order {
            sorter.add_vertex(name, ())?;
        }
        for name in &order {
            let Some(handler) = handlers.get(name) else { continue };
            for dependency in handler.model().dependencies() {
                if let Some(provider) = services.get(&dependency.service) {
                    let provider_name = provider.model().name();
                    if provider_name != name {
                        sorter.add_edge(name, provider_name)?;
                    }
                }
            }
        }
        Ok(sorter.sort()?)
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Kernel {
    fn drop(&mut self) {
        self.dispose();
    }
}
