//! # Handler
//!
//! The live, stateful manager of one registered component. A handler
//! tracks whether the component's declared dependencies are currently
//! satisfiable, owns the component's lifestyle manager and factory,
//! and keeps the set of instances it has produced so release calls
//! can be checked against real ownership.
//!
//! State machine: a handler starts `Valid` when every required
//! dependency already has a provider, otherwise `WaitingDependency`.
//! The kernel notifies it as providers register; once the missing set
//! drains, the handler becomes `Valid` and stays that way (there is
//! no component removal path). Decommission moves it to `Invalid`.

pub mod error;

pub use error::HandlerError;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use crate::component::{ActivationPolicy, ComponentModel, Instance, RegistrationError, ServiceKey};
use crate::factory::{ComponentFactory, ConcernSet};
use crate::lifestyle::{self, LifestyleManager};
use crate::utils::{lock, read, write};

/// Dependency-satisfaction state of a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    /// All required dependencies have providers; instances can be built
    Valid,
    /// At least one required dependency has no provider yet
    WaitingDependency,
    /// Decommissioned; the handler will never produce instances again
    Invalid,
}

impl fmt::Display for HandlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandlerState::Valid => "valid",
            HandlerState::WaitingDependency => "waiting-dependency",
            HandlerState::Invalid => "invalid",
        };
        write!(f, "{}", name)
    }
}

/// Service-to-provider map populated incrementally as dependencies
/// are satisfied. Shared between a handler and its factory.
#[derive(Default)]
pub(crate) struct ProviderMap {
    inner: RwLock<HashMap<ServiceKey, Arc<Handler>>>,
}

impl ProviderMap {
    pub(crate) fn get(&self, service: &ServiceKey) -> Option<Arc<Handler>> {
        read(&self.inner).get(service).cloned()
    }

    pub(crate) fn insert_if_absent(&self, service: ServiceKey, provider: Arc<Handler>) {
        write(&self.inner).entry(service).or_insert(provider);
    }
}

/// Per-component state machine; owned exclusively by the kernel that
/// created it.
pub struct Handler {
    model: Arc<ComponentModel>,
    state: RwLock<HandlerState>,
    providers: Arc<ProviderMap>,
    missing: Mutex<HashSet<ServiceKey>>,
    lifestyle: Box<dyn LifestyleManager>,
    instances: Mutex<Vec<Instance>>,
}

impl Handler {
    pub(crate) fn new(
        model: ComponentModel,
        concerns: Arc<ConcernSet>,
    ) -> Result<Self, RegistrationError> {
        let model = Arc::new(model);
        let providers = Arc::new(ProviderMap::default());
        let factory = Arc::new(ComponentFactory::new(
            model.clone(),
            providers.clone(),
            concerns,
        ));
        let lifestyle = lifestyle::for_model(&model, factory)?;
        Ok(Self {
            model,
            state: RwLock::new(HandlerState::Valid),
            providers,
            missing: Mutex::new(HashSet::new()),
            lifestyle,
            instances: Mutex::new(Vec::new()),
        })
    }

    pub fn model(&self) -> &ComponentModel {
        &self.model
    }

    pub fn state(&self) -> HandlerState {
        *read(&self.state)
    }

    pub fn is_valid(&self) -> bool {
        self.state() == HandlerState::Valid
    }

    /// Service type names still waiting for a provider, sorted for
    /// stable diagnostics.
    pub fn missing_dependencies(&self) -> Vec<String> {
        let mut missing: Vec<String> = lock(&self.missing)
            .iter()
            .map(|service| service.type_name().to_string())
            .collect();
        missing.sort();
        missing
    }

    /// Called exactly once at registration. Records providers the
    /// kernel already knows and returns the service keys to subscribe
    /// to; required services without a provider put the handler into
    /// `WaitingDependency`.
    pub(crate) fn init(&self, known: &HashMap<ServiceKey, Arc<Handler>>) -> Vec<ServiceKey> {
        let mut subscriptions: Vec<ServiceKey> = Vec::new();
        {
            let mut missing = lock(&self.missing);
            for dependency in self.model.dependencies() {
                match known.get(&dependency.service) {
                    Some(provider) => {
                        self.providers
                            .insert_if_absent(dependency.service, provider.clone());
                    }
                    None => {
                        if !subscriptions.contains(&dependency.service) {
                            subscriptions.push(dependency.service);
                        }
                        if !dependency.optional {
                            missing.insert(dependency.service);
                        }
                    }
                }
            }
            if !missing.is_empty() {
                *write(&self.state) = HandlerState::WaitingDependency;
                log::debug!(
                    target: self.model.logger_target(),
                    "Component '{}' is waiting on {} unsatisfied dependencies",
                    self.model.name(),
                    missing.len()
                );
            }
        }
        subscriptions
    }

    /// Kernel notification: `service` now has a provider. Transitions
    /// to `Valid` once no required dependency is missing.
    pub(crate) fn dependency_satisfied(&self, service: ServiceKey, provider: Arc<Handler>) {
        self.providers.insert_if_absent(service, provider);
        let mut missing = lock(&self.missing);
        missing.remove(&service);
        if missing.is_empty() {
            let mut state = write(&self.state);
            if *state == HandlerState::WaitingDependency {
                *state = HandlerState::Valid;
                log::debug!(
                    target: self.model.logger_target(),
                    "Component '{}' is now valid",
                    self.model.name()
                );
            }
        }
    }

    /// Produce an instance through the lifestyle manager. Fails while
    /// dependencies are missing; construction failures are wrapped
    /// with the component identity and the cause preserved.
    pub fn resolve(&self) -> Result<Instance, HandlerError> {
        match self.state() {
            HandlerState::WaitingDependency => Err(HandlerError::AwaitingDependencies {
                component: self.model.name().to_string(),
                missing: self.missing_dependencies(),
            }),
            HandlerState::Invalid => Err(HandlerError::InvalidState {
                component: self.model.name().to_string(),
            }),
            HandlerState::Valid => {
                let instance =
                    self.lifestyle
                        .resolve()
                        .map_err(|source| HandlerError::CreationFailed {
                            component: self.model.name().to_string(),
                            source,
                        })?;
                lock(&self.instances).push(instance.clone());
                Ok(instance)
            }
        }
    }

    /// Hand back an instance. A no-op for instances this handler
    /// never produced; ownership is checked by reference identity.
    pub fn release(&self, instance: &Instance) {
        let owned = {
            let mut instances = lock(&self.instances);
            match instances.iter().position(|i| Arc::ptr_eq(i, instance)) {
                Some(index) => {
                    instances.swap_remove(index);
                    true
                }
                None => false,
            }
        };
        if owned {
            self.lifestyle.release(instance);
        } else {
            log::trace!(
                target: self.model.logger_target(),
                "Ignoring release of an instance '{}' does not own",
                self.model.name()
            );
        }
    }

    /// Kernel commission: set the lifestyle manager up and activate
    /// eager components.
    pub(crate) fn commission(&self) -> Result<(), HandlerError> {
        self.lifestyle
            .commission()
            .map_err(|source| HandlerError::CreationFailed {
                component: self.model.name().to_string(),
                source,
            })?;
        if self.model.activation() == ActivationPolicy::Eager {
            self.resolve()?;
        }
        Ok(())
    }

    /// Kernel decommission: release every live instance, tear the
    /// lifestyle manager down, and go `Invalid`. Never fails;
    /// teardown is best-effort.
    pub(crate) fn decommission(&self) {
        log::debug!(
            target: self.model.logger_target(),
            "Decommissioning component '{}'",
            self.model.name()
        );
        let owned: Vec<Instance> = {
            let mut instances = lock(&self.instances);
            instances.drain(..).collect()
        };
        for instance in owned.iter().rev() {
            self.lifestyle.release(instance);
        }
        self.lifestyle.decommission();
        *write(&self.state) = HandlerState::Invalid;
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("component", &self.model.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// Test module declaration
#[cfg(test)]
mod tests;
