//! # Component Factory
//!
//! Builds and tears down raw component instances. `incarnate`
//! resolves the model's declared dependencies through the handlers
//! currently providing them, invokes the constructor binding, and
//! runs the commission stages (kernel-wide concerns first, then the
//! model's own hooks). Every dependency instance consumed for a
//! construction is recorded as that instance's *burden* so
//! `etherialize` can release each one symmetrically, which keeps
//! pooled and transient dependencies from leaking.

pub mod error;

pub use error::FactoryError;

use std::sync::{Arc, Mutex, RwLock};

use crate::component::{ComponentModel, ConstructionError, Instance, ResolvedArguments};
use crate::handler::{Handler, ProviderMap};
use crate::utils::{lock, read, write};

/// A cross-cutting stage applied around every component instance the
/// kernel builds (e.g. configure or start), without the component
/// knowing about the container.
///
/// Commission runs after construction; a failure discards the
/// instance. Decommission runs during teardown; failures are logged
/// and suppressed so the remaining dependency chain is still
/// released.
pub trait ComponentConcern: Send + Sync {
    fn commission(&self, instance: &Instance, model: &ComponentModel) -> Result<(), ConstructionError> {
        let _ = (instance, model);
        Ok(())
    }

    fn decommission(&self, instance: &Instance, model: &ComponentModel) -> Result<(), ConstructionError> {
        let _ = (instance, model);
        Ok(())
    }
}

/// Kernel-wide concern registry, shared with every factory.
#[derive(Default)]
pub(crate) struct ConcernSet {
    inner: RwLock<Vec<Arc<dyn ComponentConcern>>>,
}

impl ConcernSet {
    pub(crate) fn push(&self, concern: Arc<dyn ComponentConcern>) {
        write(&self.inner).push(concern);
    }

    fn snapshot(&self) -> Vec<Arc<dyn ComponentConcern>> {
        read(&self.inner).clone()
    }
}

/// Dependency instances consumed to build one owner instance.
struct Burden {
    owner: Instance,
    consumed: Vec<(Arc<Handler>, Instance)>,
}

/// Creates fully wired instances for exactly one component model.
///
/// Shared between the handler and its lifestyle manager; the
/// singleton lifestyle locks its construction slot around this
/// factory, so unrelated components are never serialized against
/// each other.
pub struct ComponentFactory {
    model: Arc<ComponentModel>,
    providers: Arc<ProviderMap>,
    concerns: Arc<ConcernSet>,
    burdens: Mutex<Vec<Burden>>,
}

impl ComponentFactory {
    pub(crate) fn new(
        model: Arc<ComponentModel>,
        providers: Arc<ProviderMap>,
        concerns: Arc<ConcernSet>,
    ) -> Self {
        Self {
            model,
            providers,
            concerns,
            burdens: Mutex::new(Vec::new()),
        }
    }

    pub fn model(&self) -> &ComponentModel {
        &self.model
    }

    /// Build a new raw instance, fully wired: resolve each declared
    /// dependency in order, construct, run commission stages, record
    /// the burden.
    pub fn incarnate(&self) -> Result<Instance, FactoryError> {
        log::debug!(
            target: self.model.logger_target(),
            "Incarnating '{}' ({})",
            self.model.name(),
            self.model.implementation()
        );

        let mut consumed: Vec<(Arc<Handler>, Instance)> = Vec::new();
        let mut values = Vec::new();
        for dependency in self.model.dependencies() {
            match self.providers.get(&dependency.service) {
                Some(provider) => match provider.resolve() {
                    Ok(instance) => {
                        consumed.push((provider, instance.clone()));
                        values.push((dependency.clone(), Some(instance)));
                    }
                    Err(source) => {
                        if dependency.optional {
                            log::debug!(
                                target: self.model.logger_target(),
                                "Optional dependency '{}' unavailable: {}",
                                dependency.key,
                                source
                            );
                            values.push((dependency.clone(), None));
                        } else {
                            self.release_consumed(&mut consumed);
                            return Err(FactoryError::UnresolvedDependency {
                                component: self.model.name().to_string(),
                                dependency: dependency.key.clone(),
                                service: dependency.service.type_name(),
                                source: Some(Box::new(source)),
                            });
                        }
                    }
                },
                None if dependency.optional => values.push((dependency.clone(), None)),
                None => {
                    self.release_consumed(&mut consumed);
                    return Err(FactoryError::UnresolvedDependency {
                        component: self.model.name().to_string(),
                        dependency: dependency.key.clone(),
                        service: dependency.service.type_name(),
                        source: None,
                    });
                }
            }
        }

        let arguments = ResolvedArguments::new(values);
        let instance = match (self.model.constructor())(&arguments) {
            Ok(instance) => instance,
            Err(source) => {
                self.release_consumed(&mut consumed);
                return Err(FactoryError::Construction {
                    component: self.model.name().to_string(),
                    implementation: self.model.implementation(),
                    source,
                });
            }
        };

        if let Err(err) = self.commission_stages(&instance) {
            self.release_consumed(&mut consumed);
            return Err(err);
        }

        lock(&self.burdens).push(Burden {
            owner: instance.clone(),
            consumed,
        });
        Ok(instance)
    }

    /// Tear an instance down: run decommission stages in reverse
    /// commission order, then release every dependency instance in
    /// its burden. Teardown is best-effort; stage failures are
    /// logged, never propagated.
    pub fn etherialize(&self, instance: &Instance) {
        log::debug!(
            target: self.model.logger_target(),
            "Etherializing an instance of '{}'",
            self.model.name()
        );

        for hook in self.model.decommission_hooks().iter().rev() {
            hook(instance);
        }
        for concern in self.concerns.snapshot().iter().rev() {
            if let Err(err) = concern.decommission(instance, &self.model) {
                log::warn!(
                    target: self.model.logger_target(),
                    "Decommission stage failed for '{}': {}",
                    self.model.name(),
                    err
                );
            }
        }

        let burden = {
            let mut burdens = lock(&self.burdens);
            burdens
                .iter()
                .position(|burden| Arc::ptr_eq(&burden.owner, instance))
                .map(|index| burdens.swap_remove(index))
        };
        if let Some(burden) = burden {
            for (provider, dependency) in burden.consumed.into_iter().rev() {
                provider.release(&dependency);
            }
        }
    }

    fn commission_stages(&self, instance: &Instance) -> Result<(), FactoryError> {
        for concern in self.concerns.snapshot() {
            concern
                .commission(instance, &self.model)
                .map_err(|source| FactoryError::Commission {
                    component: self.model.name().to_string(),
                    source,
                })?;
        }
        for hook in self.model.commission_hooks() {
            hook(instance).map_err(|source| FactoryError::Commission {
                component: self.model.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    fn release_consumed(&self, consumed: &mut Vec<(Arc<Handler>, Instance)>) {
        for (provider, instance) in consumed.drain(..).rev() {
            provider.release(&instance);
        }
    }
}
