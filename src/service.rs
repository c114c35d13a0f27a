//! Service descriptors
//!
//! A [`Service`] is the registry record for one class: its identifier, tags,
//! implemented interfaces, explicit argument overrides and, once built, the
//! cached instance together with the arguments it was built from. Building is
//! lazy and happens at most once per descriptor.
//!
//! ## Resolution
//!
//! Each constructor parameter is satisfied according to its kind:
//!
//! - **container**: the owning container itself
//! - **class**: the registered service for that class, registered and built on
//!   the spot when the class is known to the catalog but not yet registered
//! - **interface**: the class named by an explicit override for the parameter,
//!   or else the first registered service declaring the interface
//! - **scalar / untyped**: the explicit argument, the parameter default, or
//!   the container's [`MissingArguments`] policy

use crate::resolution::ResolutionStack;
use crate::{
    Argument, Arguments, ClassDefinition, Container, Dependency, DiError, Instance,
    MissingArguments, Parameter, ParameterKind, Result, WeakContainer,
};
use ahash::RandomState;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

/// Instance and the arguments it was constructed with
struct Built {
    instance: Instance,
    args: Vec<Argument>,
}

/// Diagnostic view of a service: its class and constructor arguments.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ServiceSnapshot {
    pub class: String,
    pub args: Vec<Argument>,
}

/// One resolvable service.
///
/// # Examples
///
/// ```rust
/// use service_container::{Catalog, ClassDefinition, Container, Service};
///
/// #[derive(Default)]
/// struct Clock;
///
/// let catalog = Catalog::new().with(ClassDefinition::of::<Clock>());
/// let container = Container::new(catalog);
///
/// let id = service_container::class_id::<Clock>();
/// container.set(id, Service::new(id).with_tags(["time"]));
///
/// let service = container.service(id).unwrap();
/// assert!(!service.is_instantiated());
///
/// let first = service.get_instance().unwrap();
/// let second = service.get_instance().unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// assert!(service.is_instantiated());
/// ```
pub struct Service {
    class: String,
    definition: Option<Arc<ClassDefinition>>,
    container: Option<WeakContainer>,
    given_args: HashMap<String, Argument, RandomState>,
    tags: Vec<String>,
    interfaces: Vec<String>,
    preset_args: Vec<Argument>,
    built: OnceCell<Built>,
}

impl Service {
    /// A descriptor for `class`. Its definition is looked up in the catalog of
    /// the container it gets registered in.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            definition: None,
            container: None,
            given_args: HashMap::default(),
            tags: Vec::new(),
            interfaces: Vec::new(),
            preset_args: Vec::new(),
            built: OnceCell::new(),
        }
    }

    /// A descriptor for a known definition, carrying the interfaces it declares.
    pub fn from_definition(definition: Arc<ClassDefinition>) -> Self {
        let mut service = Self::new(definition.id());
        service.interfaces = definition.interfaces().map(str::to_owned).collect();
        service.definition = Some(definition);
        service
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[inline]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[inline]
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    #[inline]
    pub fn given_args(&self) -> &HashMap<String, Argument, RandomState> {
        &self.given_args
    }

    #[inline]
    pub fn definition(&self) -> Option<&Arc<ClassDefinition>> {
        self.definition.as_ref()
    }

    #[inline]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    #[inline]
    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface)
    }

    /// True once an instance exists.
    #[inline]
    pub fn is_instantiated(&self) -> bool {
        self.built.get().is_some()
    }

    /// The cached instance, without building it.
    #[inline]
    pub fn instance(&self) -> Option<Instance> {
        self.built.get().map(|built| Arc::clone(&built.instance))
    }

    /// Constructor arguments: those of the built instance, or the preset ones.
    pub fn args(&self) -> Vec<Argument> {
        match self.built.get() {
            Some(built) => built.args.clone(),
            None => self.preset_args.clone(),
        }
    }

    /// Constructor parameters with their classified types, in declaration order.
    ///
    /// Empty when the class takes no parameters or its definition is not
    /// known yet.
    pub fn get_dependencies(&self) -> Vec<Dependency> {
        self.definition
            .as_ref()
            .map(|definition| definition.dependencies())
            .unwrap_or_default()
    }

    /// Class identifier and constructor arguments, for diagnostics.
    pub fn to_snapshot(&self) -> ServiceSnapshot {
        ServiceSnapshot {
            class: self.class.clone(),
            args: self.args(),
        }
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    /// Explicit arguments by parameter name. For interface-typed parameters
    /// the value is the identifier of the implementing class to use.
    pub fn set_given_args<K, V>(&mut self, args: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<Argument>,
    {
        self.given_args = args
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        self
    }

    pub fn set_tags<S: Into<String>>(&mut self, tags: impl IntoIterator<Item = S>) -> &mut Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_interfaces<S: Into<String>>(
        &mut self,
        interfaces: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        self.interfaces = interfaces.into_iter().map(Into::into).collect();
        self
    }

    /// Preset constructor arguments, used positionally when the class
    /// resolves no parameters itself.
    pub fn set_args(&mut self, args: Vec<Argument>) -> &mut Self {
        if let Some(built) = self.built.get_mut() {
            built.args = args.clone();
        }
        self.preset_args = args;
        self
    }

    /// Supply the instance directly; the service counts as instantiated.
    pub fn set_instance(&mut self, instance: Instance) -> &mut Self {
        self.built = OnceCell::with_value(Built {
            instance,
            args: self.preset_args.clone(),
        });
        self
    }

    pub fn with_given_args<K, V>(mut self, args: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Argument>,
    {
        self.set_given_args(args);
        self
    }

    /// Add one explicit argument.
    pub fn with_given_arg(mut self, name: impl Into<String>, value: impl Into<Argument>) -> Self {
        self.given_args.insert(name.into(), value.into());
        self
    }

    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.set_tags(tags);
        self
    }

    pub fn with_interfaces<S: Into<String>>(mut self, interfaces: impl IntoIterator<Item = S>) -> Self {
        self.set_interfaces(interfaces);
        self
    }

    pub fn with_args(mut self, args: Vec<Argument>) -> Self {
        self.set_args(args);
        self
    }

    pub fn with_instance(mut self, instance: Instance) -> Self {
        self.set_instance(instance);
        self
    }

    /// Attach to the container registering this service. A descriptor that
    /// declares no interfaces takes those of its class definition.
    pub(crate) fn bind(&mut self, container: &Container) {
        if self.definition.is_none() {
            self.definition = container.catalog().get(&self.class);
        }
        if self.interfaces.is_empty() {
            if let Some(definition) = &self.definition {
                self.interfaces = definition.interfaces().map(str::to_owned).collect();
            }
        }
        self.container = Some(container.downgrade());
    }

    // =========================================================================
    // Instantiation
    // =========================================================================

    /// The instance, built on first call through the container this service
    /// is registered in.
    ///
    /// A service registered under the container's own class yields the
    /// container. Fails with [`DiError::MissingContainer`] when the service
    /// was never registered and has no instance yet.
    pub fn get_instance(&self) -> Result<Instance> {
        if let Some(instance) = self.instance() {
            return Ok(instance);
        }

        let container = self
            .container
            .as_ref()
            .and_then(WeakContainer::upgrade)
            .ok_or(DiError::MissingContainer)?;

        self.instance_in(&container)
    }

    /// Typed `get_instance`.
    pub fn get_instance_as<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.get_instance()?
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(&self.class))
    }

    /// The instance, built if needed, resolving dependencies through `container`.
    pub fn instance_in(&self, container: &Container) -> Result<Instance> {
        self.resolve(container, &mut ResolutionStack::new())
    }

    pub(crate) fn resolve(&self, container: &Container, stack: &mut ResolutionStack) -> Result<Instance> {
        if self.class == Container::CLASS {
            return Ok(container.as_instance());
        }

        if let Some(built) = self.built.get() {
            #[cfg(feature = "logging")]
            trace!(
                target: "service_container",
                service = %self.class,
                "Service already instantiated, returning cached instance"
            );
            return Ok(Arc::clone(&built.instance));
        }

        stack.enter(&self.class)?;
        let result = self
            .built
            .get_or_try_init(|| self.instantiate(container, stack))
            .map(|built| Arc::clone(&built.instance));
        stack.exit();

        result
    }

    fn instantiate(&self, container: &Container, stack: &mut ResolutionStack) -> Result<Built> {
        let definition = match &self.definition {
            Some(definition) => Arc::clone(definition),
            None => container
                .catalog()
                .get(&self.class)
                .ok_or_else(|| DiError::class_not_found(&self.class))?,
        };

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            service = %self.class,
            parameters = definition.parameter_list().len(),
            depth = stack.depth(),
            "Instantiating service"
        );

        let mut resolved = Vec::with_capacity(definition.parameter_list().len());
        for parameter in definition.parameter_list() {
            let value = self.resolve_parameter(parameter, container, stack)?;
            resolved.push((parameter.name().to_owned(), value));
        }

        if resolved.is_empty() {
            resolved = self
                .preset_args
                .iter()
                .enumerate()
                .map(|(position, value)| (position.to_string(), value.clone()))
                .collect();
        }

        let arguments = Arguments::new(&self.class, resolved);
        let instance = definition.construct(&arguments)?;

        Ok(Built {
            instance,
            args: arguments.into_values(),
        })
    }

    fn resolve_parameter(
        &self,
        parameter: &Parameter,
        container: &Container,
        stack: &mut ResolutionStack,
    ) -> Result<Argument> {
        #[cfg(feature = "logging")]
        trace!(
            target: "service_container",
            service = %self.class,
            parameter = parameter.name(),
            kind = ?parameter.kind(),
            "Resolving parameter"
        );

        match parameter.kind() {
            ParameterKind::Container => Ok(Argument::Container(container.downgrade())),
            ParameterKind::Class(class) => {
                let instance = resolve_class(container, class, stack)?;
                Ok(Argument::service(class.as_str(), instance))
            }
            ParameterKind::Interface(interface) => {
                self.resolve_interface(parameter.name(), interface, container, stack)
            }
            ParameterKind::Scalar(_) | ParameterKind::Untyped => {
                self.explicit_value(parameter, container)
            }
        }
    }

    fn resolve_interface(
        &self,
        name: &str,
        interface: &str,
        container: &Container,
        stack: &mut ResolutionStack,
    ) -> Result<Argument> {
        if let Some(given) = self.given_args.get(name) {
            let class = given.as_str().ok_or_else(|| {
                DiError::invalid_argument(
                    &self.class,
                    name,
                    format!("expected implementing class name, found {}", given.kind()),
                )
            })?;

            let definition = container
                .catalog()
                .get(class)
                .ok_or_else(|| DiError::class_not_found(class))?;

            #[cfg(feature = "logging")]
            if !definition.implements_interface(interface) {
                warn!(
                    target: "service_container",
                    service = %self.class,
                    parameter = name,
                    class = class,
                    interface = interface,
                    "Override class does not declare the parameter's interface"
                );
            }

            let instance = resolve_class(container, class, stack)?;
            return Ok(Argument::service(
                class,
                definition.cast_to(interface, &instance),
            ));
        }

        let candidates = container.get_by_interface(interface);
        let Some(first) = candidates.first() else {
            #[cfg(feature = "logging")]
            debug!(
                target: "service_container",
                service = %self.class,
                interface = interface,
                "No registered service implements interface"
            );
            return Err(DiError::missing_implementation(interface));
        };

        #[cfg(feature = "logging")]
        if candidates.len() > 1 {
            debug!(
                target: "service_container",
                service = %self.class,
                interface = interface,
                candidates = candidates.len(),
                selected = first.class(),
                "Several services implement interface, using the first registered"
            );
        }

        let instance = first.resolve(container, stack)?;
        let instance = match first.definition() {
            Some(definition) => definition.cast_to(interface, &instance),
            None => instance,
        };
        Ok(Argument::service(first.class(), instance))
    }

    fn explicit_value(&self, parameter: &Parameter, container: &Container) -> Result<Argument> {
        if let Some(value) = self.given_args.get(parameter.name()) {
            return Ok(value.clone());
        }
        if let Some(default) = parameter.default_value() {
            return Ok(default.clone());
        }

        match container.config().missing_arguments {
            MissingArguments::Fail => Err(DiError::missing_argument(&self.class, parameter.name())),
            MissingArguments::Null => {
                #[cfg(feature = "logging")]
                debug!(
                    target: "service_container",
                    service = %self.class,
                    parameter = parameter.name(),
                    "No explicit argument, passing null"
                );
                Ok(Argument::Null)
            }
        }
    }
}

/// Instance of a concrete class dependency.
///
/// A registered class is fetched through its descriptor. An unregistered one
/// must exist in the catalog; it is registered and built immediately, and
/// unregistered again if building fails.
fn resolve_class(container: &Container, class: &str, stack: &mut ResolutionStack) -> Result<Instance> {
    if let Some(service) = container.service(class) {
        return service.resolve(container, stack);
    }

    let definition = container
        .catalog()
        .get(class)
        .ok_or_else(|| DiError::class_not_found(class))?;
    container.ensure_unlocked()?;

    #[cfg(feature = "logging")]
    debug!(
        target: "service_container",
        service = class,
        depth = stack.depth(),
        "Registering discovered dependency"
    );

    let mut service = Service::from_definition(definition);
    service.bind(container);
    let (service, inserted) = container.storage().insert_if_absent(class.to_owned(), Arc::new(service));

    service.resolve(container, stack).inspect_err(|_err| {
        if inserted {
            container.storage().remove_if_same(class, &service);

            #[cfg(feature = "logging")]
            debug!(
                target: "service_container",
                service = class,
                error = %_err,
                "Discovered dependency failed to build, unregistering"
            );
        }
    })
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("class", &self.class)
            .field("tags", &self.tags)
            .field("interfaces", &self.interfaces)
            .field("given_args", &self.given_args)
            .field("instantiated", &self.is_instantiated())
            .finish()
    }
}
