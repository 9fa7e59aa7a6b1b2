//! # Component Model
//!
//! Immutable descriptors for registered components. A
//! [`ComponentModel`] captures everything the kernel needs to manage
//! one component: its unique name, the service it provides, its
//! instance lifestyle, its declared dependencies, and the typed
//! constructor binding that builds instances from resolved
//! dependencies.
//!
//! There is no runtime reflection: dependencies are declared
//! explicitly on the [`ComponentModelBuilder`] and handed to the
//! constructor closure as [`ResolvedArguments`].

pub mod error;

pub use error::{ArgumentError, RegistrationError};

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use crate::config::ConfigNode;

/// A live component instance, shared between its handler and callers.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Error type produced by user-supplied construction and hook closures.
pub type ConstructionError = Box<dyn std::error::Error + Send + Sync>;

/// Constructor binding: builds a raw instance from resolved dependencies.
pub type Constructor = Arc<dyn Fn(&ResolvedArguments) -> Result<Instance, ConstructionError> + Send + Sync>;

/// Per-model commission stage hook, run after construction.
pub type CommissionHook = Arc<dyn Fn(&Instance) -> Result<(), ConstructionError> + Send + Sync>;

/// Per-model decommission stage hook, run before dependency release.
pub type DecommissionHook = Arc<dyn Fn(&Instance) + Send + Sync>;

/// Factory for user-defined lifestyle managers ([`Lifestyle::Custom`]).
pub type LifestyleFactory = Arc<
    dyn Fn(Arc<crate::factory::ComponentFactory>) -> Box<dyn crate::lifestyle::LifestyleManager>
        + Send
        + Sync,
>;

/// Identity of a service contract: the Rust type under which
/// instances of its providers are stored and downcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    id: TypeId,
    name: &'static str,
}

impl ServiceKey {
    pub fn of<S: Any + Send + Sync>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: type_name::<S>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The caching/sharing policy for instances of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifestyle {
    /// At most one instance, created lazily and shared by all callers
    #[default]
    Singleton,
    /// A fresh instance on every resolve
    Transient,
    /// One instance per calling thread
    PerThread,
    /// A bounded pool of reusable instances
    Pooled,
    /// Policy supplied by the model's lifestyle factory
    Custom,
}

impl fmt::Display for Lifestyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifestyle::Singleton => "singleton",
            Lifestyle::Transient => "transient",
            Lifestyle::PerThread => "per-thread",
            Lifestyle::Pooled => "pooled",
            Lifestyle::Custom => "custom",
        };
        write!(f, "{}", name)
    }
}

/// Eager components are resolved once during kernel commission;
/// lazy components wait for the first caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationPolicy {
    #[default]
    Lazy,
    Eager,
}

/// A declared requirement of a component on a service
#[derive(Debug, Clone)]
pub struct DependencyModel {
    /// The service the component needs
    pub service: ServiceKey,
    /// The argument key the constructor looks the dependency up under
    pub key: String,
    /// Whether the component can be built without it
    pub optional: bool,
}

impl fmt::Display for DependencyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let requirement = if self.optional { "Optional" } else { "Requires" };
        write!(f, "{} service: {} (key: {})", requirement, self.service, self.key)
    }
}

/// Dependencies resolved for one construction, in declaration order.
///
/// An entry is `None` when the dependency is optional and no provider
/// was available.
pub struct ResolvedArguments {
    values: Vec<(DependencyModel, Option<Instance>)>,
}

impl ResolvedArguments {
    pub(crate) fn new(values: Vec<(DependencyModel, Option<Instance>)>) -> Self {
        Self { values }
    }

    /// Typed access to a required dependency by key.
    pub fn get<S: Any + Send + Sync>(&self, key: &str) -> Result<Arc<S>, ArgumentError> {
        let (_, value) = self
            .values
            .iter()
            .find(|(dep, _)| dep.key == key)
            .ok_or_else(|| ArgumentError::Undeclared(key.to_string()))?;
        let instance = value
            .as_ref()
            .ok_or_else(|| ArgumentError::Missing(key.to_string()))?;
        instance
            .clone()
            .downcast::<S>()
            .map_err(|_| ArgumentError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<S>(),
            })
    }

    /// Typed access to an optional dependency; `None` when absent.
    pub fn get_optional<S: Any + Send + Sync>(&self, key: &str) -> Option<Arc<S>> {
        self.values
            .iter()
            .find(|(dep, _)| dep.key == key)
            .and_then(|(_, value)| value.clone())
            .and_then(|instance| instance.downcast::<S>().ok())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Immutable descriptor of a registered component.
///
/// Built through [`ComponentModel::builder`]; the kernel attaches the
/// configuration node and logger target at registration time, and
/// model listeners may override lifestyle and activation before the
/// handler is finalized. After that the model never changes.
pub struct ComponentModel {
    name: String,
    service: ServiceKey,
    implementation: &'static str,
    lifestyle: Lifestyle,
    activation: ActivationPolicy,
    dependencies: Vec<DependencyModel>,
    configuration: ConfigNode,
    logger_target: String,
    constructor: Constructor,
    commission_hooks: Vec<CommissionHook>,
    decommission_hooks: Vec<DecommissionHook>,
    pool_capacity: usize,
    lifestyle_factory: Option<LifestyleFactory>,
}

impl ComponentModel {
    /// Start building a model for a component providing service `S`.
    pub fn builder<S: Any + Send + Sync>(name: impl Into<String>) -> ComponentModelBuilder {
        ComponentModelBuilder::new(name.into(), ServiceKey::of::<S>())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service(&self) -> ServiceKey {
        self.service
    }

    /// Concrete type name of the construction product, for diagnostics.
    pub fn implementation(&self) -> &'static str {
        self.implementation
    }

    pub fn lifestyle(&self) -> Lifestyle {
        self.lifestyle
    }

    pub fn activation(&self) -> ActivationPolicy {
        self.activation
    }

    pub fn dependencies(&self) -> &[DependencyModel] {
        &self.dependencies
    }

    pub fn configuration(&self) -> &ConfigNode {
        &self.configuration
    }

    /// Log target for everything this component's handler and factory emit.
    pub fn logger_target(&self) -> &str {
        &self.logger_target
    }

    pub fn pool_capacity(&self) -> usize {
        self.pool_capacity
    }

    pub(crate) fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    pub(crate) fn commission_hooks(&self) -> &[CommissionHook] {
        &self.commission_hooks
    }

    pub(crate) fn decommission_hooks(&self) -> &[DecommissionHook] {
        &self.decommission_hooks
    }

    pub(crate) fn lifestyle_factory(&self) -> Option<&LifestyleFactory> {
        self.lifestyle_factory.as_ref()
    }

    /// Override the lifestyle. Intended for model listeners running
    /// before the handler is built.
    pub fn set_lifestyle(&mut self, lifestyle: Lifestyle) {
        self.lifestyle = lifestyle;
    }

    /// Override the activation policy. Intended for model listeners.
    pub fn set_activation(&mut self, activation: ActivationPolicy) {
        self.activation = activation;
    }

    pub(crate) fn set_configuration(&mut self, configuration: ConfigNode) {
        self.configuration = configuration;
    }

    pub(crate) fn set_logger_target(&mut self, target: String) {
        self.logger_target = target;
    }
}

impl fmt::Debug for ComponentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentModel")
            .field("name", &self.name)
            .field("service", &self.service)
            .field("implementation", &self.implementation)
            .field("lifestyle", &self.lifestyle)
            .field("activation", &self.activation)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ComponentModel`]
pub struct ComponentModelBuilder {
    name: String,
    service: ServiceKey,
    implementation: &'static str,
    lifestyle: Lifestyle,
    activation: ActivationPolicy,
    dependencies: Vec<DependencyModel>,
    constructor: Option<Constructor>,
    commission_hooks: Vec<CommissionHook>,
    decommission_hooks: Vec<DecommissionHook>,
    pool_capacity: usize,
    lifestyle_factory: Option<LifestyleFactory>,
}

impl ComponentModelBuilder {
    fn new(name: String, service: ServiceKey) -> Self {
        Self {
            name,
            service,
            implementation: service.type_name(),
            lifestyle: Lifestyle::default(),
            activation: ActivationPolicy::default(),
            dependencies: Vec::new(),
            constructor: None,
            commission_hooks: Vec::new(),
            decommission_hooks: Vec::new(),
            pool_capacity: DEFAULT_POOL_CAPACITY,
            lifestyle_factory: None,
        }
    }

    pub fn lifestyle(mut self, lifestyle: Lifestyle) -> Self {
        self.lifestyle = lifestyle;
        self
    }

    pub fn activation(mut self, activation: ActivationPolicy) -> Self {
        self.activation = activation;
        self
    }

    /// Declare a required dependency on service `S`, looked up by the
    /// constructor under `key`.
    pub fn depends_on<S: Any + Send + Sync>(mut self, key: impl Into<String>) -> Self {
        self.dependencies.push(DependencyModel {
            service: ServiceKey::of::<S>(),
            key: key.into(),
            optional: false,
        });
        self
    }

    /// Declare an optional dependency on service `S`.
    pub fn optionally_depends_on<S: Any + Send + Sync>(mut self, key: impl Into<String>) -> Self {
        self.dependencies.push(DependencyModel {
            service: ServiceKey::of::<S>(),
            key: key.into(),
            optional: true,
        });
        self
    }

    /// Bind the constructor. The closure receives the resolved
    /// dependencies and returns the concrete instance.
    pub fn constructor<T, F>(mut self, construct: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&ResolvedArguments) -> Result<T, ConstructionError> + Send + Sync + 'static,
    {
        self.implementation = type_name::<T>();
        self.constructor = Some(Arc::new(move |args| {
            construct(args).map(|value| Arc::new(value) as Instance)
        }));
        self
    }

    /// Add a typed commission hook, run after construction in
    /// declaration order. Fails construction if the instance is not a `T`.
    pub fn on_commission<T, F>(mut self, hook: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> Result<(), ConstructionError> + Send + Sync + 'static,
    {
        self.commission_hooks.push(Arc::new(move |instance: &Instance| {
            match instance.downcast_ref::<T>() {
                Some(concrete) => hook(concrete),
                None => Err(format!(
                    "commission hook expected an instance of {}",
                    type_name::<T>()
                )
                .into()),
            }
        }));
        self
    }

    /// Add a typed decommission hook, run in reverse declaration
    /// order before dependency release. A non-`T` instance is skipped.
    pub fn on_decommission<T, F>(mut self, hook: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.decommission_hooks.push(Arc::new(move |instance: &Instance| {
            if let Some(concrete) = instance.downcast_ref::<T>() {
                hook(concrete);
            }
        }));
        self
    }

    /// Upper bound of cached instances for [`Lifestyle::Pooled`].
    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    /// Supply the lifestyle manager factory for [`Lifestyle::Custom`].
    pub fn lifestyle_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(Arc<crate::factory::ComponentFactory>) -> Box<dyn crate::lifestyle::LifestyleManager>
            + Send
            + Sync
            + 'static,
    {
        self.lifestyle_factory = Some(Arc::new(factory));
        self
    }

    pub fn build(self) -> Result<ComponentModel, RegistrationError> {
        if self.name.trim().is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        let constructor = self
            .constructor
            .ok_or_else(|| RegistrationError::MissingConstructor(self.name.clone()))?;
        if self.lifestyle == Lifestyle::Custom && self.lifestyle_factory.is_none() {
            return Err(RegistrationError::MissingLifestyleFactory(self.name));
        }
        if self.lifestyle == Lifestyle::Pooled && self.pool_capacity == 0 {
            return Err(RegistrationError::ZeroPoolCapacity(self.name));
        }
        for (i, dep) in self.dependencies.iter().enumerate() {
            if self.dependencies[..i].iter().any(|d| d.key == dep.key) {
                return Err(RegistrationError::DuplicateDependencyKey {
                    component: self.name,
                    key: dep.key.clone(),
                });
            }
        }

        let logger_target = format!("{}::{}", crate::kernel::constants::LOG_TARGET, self.name);
        Ok(ComponentModel {
            name: self.name,
            service: self.service,
            implementation: self.implementation,
            lifestyle: self.lifestyle,
            activation: self.activation,
            dependencies: self.dependencies,
            configuration: ConfigNode::empty(),
            logger_target,
            constructor,
            commission_hooks: self.commission_hooks,
            decommission_hooks: self.decommission_hooks,
            pool_capacity: self.pool_capacity,
            lifestyle_factory: self.lifestyle_factory,
        })
    }
}

const DEFAULT_POOL_CAPACITY: usize = 4;
