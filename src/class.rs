//! Class definitions and the class catalog
//!
//! Rust has no runtime reflection, so every constructible type is described up
//! front: its identifier, its constructor parameters in declaration order, the
//! interfaces it implements and a constructor function. The [`Catalog`] holds
//! these definitions; "class exists" means "the catalog has a definition".

use crate::{Argument, Arguments, Container, Instance, Result};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::debug;

/// Identifier used for a Rust type `T` (its fully qualified type name).
///
/// ```rust
/// use service_container::class_id;
///
/// struct Mailer;
/// assert!(class_id::<Mailer>().ends_with("::Mailer"));
/// ```
#[inline]
pub fn class_id<T: ?Sized + 'static>() -> &'static str {
    std::any::type_name::<T>()
}

/// Identifier used for an interface given as a trait object type, e.g. `dyn Transport`.
#[inline]
pub fn interface_id<I: ?Sized + 'static>() -> &'static str {
    std::any::type_name::<I>()
}

/// Scalar parameter types. Their values always come from explicit arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Int,
    Float,
    String,
    Array,
}

impl ScalarType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "array",
        }
    }
}

/// How a constructor parameter gets its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// The owning container
    Container,
    /// A concrete class, registered on demand
    Class(String),
    /// An interface, satisfied by a registered implementation or an explicit override
    Interface(String),
    /// A scalar value supplied explicitly
    Scalar(ScalarType),
    /// No declared type: supplied explicitly
    Untyped,
}

/// One constructor parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    default: Option<Argument>,
}

impl Parameter {
    fn with_kind(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// A parameter typed as a concrete class. Naming the container's own class
    /// yields a container parameter.
    pub fn class(name: impl Into<String>, class: impl Into<String>) -> Self {
        let class = class.into();
        if class == Container::CLASS {
            return Self::container(name);
        }
        Self::with_kind(name, ParameterKind::Class(class))
    }

    /// A parameter typed as the Rust type `T`.
    pub fn class_of<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::class(name, class_id::<T>())
    }

    pub fn interface(name: impl Into<String>, interface: impl Into<String>) -> Self {
        Self::with_kind(name, ParameterKind::Interface(interface.into()))
    }

    /// A parameter typed as the trait object `I`, e.g. `dyn Transport`.
    pub fn interface_of<I: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::interface(name, interface_id::<I>())
    }

    pub fn scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::with_kind(name, ParameterKind::Scalar(scalar))
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParameterKind::Untyped)
    }

    pub fn container(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParameterKind::Container)
    }

    /// Value used when no explicit argument is given.
    pub fn with_default(mut self, default: impl Into<Argument>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    #[inline]
    pub fn default_value(&self) -> Option<&Argument> {
        self.default.as_ref()
    }

    /// Declared type name: the class or interface identifier, the scalar name,
    /// or `None` when untyped.
    pub fn type_name(&self) -> Option<&str> {
        match &self.kind {
            ParameterKind::Container => Some(Container::CLASS),
            ParameterKind::Class(id) | ParameterKind::Interface(id) => Some(id.as_str()),
            ParameterKind::Scalar(scalar) => Some(scalar.name()),
            ParameterKind::Untyped => None,
        }
    }
}

/// A parameter name with its classified type, as reported by
/// [`Service::get_dependencies`](crate::Service::get_dependencies).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub type_name: Option<String>,
    /// True when the type is a class, interface or the container, i.e.
    /// resolved by the container rather than supplied explicitly
    pub qualified: bool,
}

/// Type-erased constructor
pub type Constructor = Arc<dyn Fn(&Arguments) -> Result<Instance> + Send + Sync>;

/// Turns an instance of the implementing class into the interface's form
type InterfaceCast = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

#[derive(Clone)]
struct InterfaceBinding {
    interface: String,
    cast: Option<InterfaceCast>,
}

/// Static description of a constructible class.
///
/// # Examples
///
/// ```rust
/// use service_container::{ClassDefinition, Parameter, ScalarType};
/// use std::sync::Arc;
///
/// trait Transport: Send + Sync {}
///
/// struct SmtpTransport { host: String }
/// impl Transport for SmtpTransport {}
///
/// let definition = ClassDefinition::new("app::SmtpTransport", |args| {
///     Ok(SmtpTransport { host: args.string("host")?.to_owned() })
/// })
/// .parameter(Parameter::scalar("host", ScalarType::String))
/// .implements_as(|t: Arc<SmtpTransport>| t as Arc<dyn Transport>);
///
/// assert_eq!(definition.parameter_list().len(), 1);
/// assert!(definition.implements_interface(service_container::interface_id::<dyn Transport>()));
/// ```
#[derive(Clone)]
pub struct ClassDefinition {
    id: String,
    parameters: Vec<Parameter>,
    interfaces: Vec<InterfaceBinding>,
    constructor: Constructor,
}

impl ClassDefinition {
    /// Define a class by identifier and constructor.
    pub fn new<T, F>(id: impl Into<String>, constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Arguments) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            parameters: Vec::new(),
            interfaces: Vec::new(),
            constructor: Arc::new(move |args: &Arguments| -> Result<Instance> {
                Ok(Arc::new(constructor(args)?) as Instance)
            }),
        }
    }

    /// A class without constructor parameters, built with `Default`.
    pub fn of<T: Default + Send + Sync + 'static>() -> Self {
        Self::new(class_id::<T>(), |_| Ok(T::default()))
    }

    /// Definition taken from an [`Injectable`] implementation.
    pub fn injectable<T: Injectable>() -> Self {
        let definition = Self::new(T::class_name(), T::construct).parameters(T::parameters());
        T::declare(definition)
    }

    /// Append a constructor parameter.
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Append constructor parameters.
    pub fn parameters(mut self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Declare an implemented interface by identifier only. Dependents receive
    /// the concrete instance.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(InterfaceBinding {
            interface: interface.into(),
            cast: None,
        });
        self
    }

    /// Declare an implemented trait-object interface. Dependents receive the
    /// instance as `Arc<I>`, readable through
    /// [`Arguments::interface`](crate::Arguments::interface).
    pub fn implements_as<T, I, F>(mut self, cast: F) -> Self
    where
        T: Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        let cast: InterfaceCast = Arc::new(move |instance: &Instance| {
            let concrete = Arc::clone(instance).downcast::<T>().ok()?;
            Some(Arc::new(cast(concrete)) as Instance)
        });
        self.interfaces.push(InterfaceBinding {
            interface: interface_id::<I>().to_owned(),
            cast: Some(cast),
        });
        self
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn parameter_list(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Identifiers of the declared interfaces, in declaration order.
    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.interfaces.iter().map(|b| b.interface.as_str())
    }

    pub fn implements_interface(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|b| b.interface == interface)
    }

    /// Parameters with their classified types, in declaration order.
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.parameters
            .iter()
            .map(|p| Dependency {
                name: p.name.clone(),
                type_name: p.type_name().map(str::to_owned),
                qualified: !matches!(p.kind, ParameterKind::Scalar(_) | ParameterKind::Untyped),
            })
            .collect()
    }

    /// Run the constructor.
    #[inline]
    pub fn construct(&self, args: &Arguments) -> Result<Instance> {
        (self.constructor)(args)
    }

    /// The form of `instance` handed to a dependent typed as `interface`:
    /// the declared cast when there is one, the instance itself otherwise.
    pub fn cast_to(&self, interface: &str, instance: &Instance) -> Instance {
        self.interfaces
            .iter()
            .find(|b| b.interface == interface)
            .and_then(|b| b.cast.as_ref())
            .and_then(|cast| cast(instance))
            .unwrap_or_else(|| Arc::clone(instance))
    }
}

impl std::fmt::Debug for ClassDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassDefinition")
            .field("id", &self.id)
            .field("parameters", &self.parameters)
            .field("interfaces", &self.interfaces().collect::<Vec<_>>())
            .finish()
    }
}

/// A type that describes its own constructor.
///
/// # Example
///
/// ```rust
/// use service_container::{Arguments, Injectable, Parameter, Result, ScalarType};
/// use std::sync::Arc;
///
/// struct Config { dsn: String }
///
/// impl Injectable for Config {
///     fn parameters() -> Vec<Parameter> {
///         vec![Parameter::scalar("dsn", ScalarType::String)]
///     }
///
///     fn construct(args: &Arguments) -> Result<Self> {
///         Ok(Config { dsn: args.string("dsn")?.to_owned() })
///     }
/// }
///
/// struct Repository { config: Arc<Config> }
///
/// impl Injectable for Repository {
///     fn parameters() -> Vec<Parameter> {
///         vec![Parameter::class_of::<Config>("config")]
///     }
///
///     fn construct(args: &Arguments) -> Result<Self> {
///         Ok(Repository { config: args.service("config")? })
///     }
/// }
/// ```
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Class identifier; the Rust type name by default.
    fn class_name() -> &'static str {
        class_id::<Self>()
    }

    /// Constructor parameters in declaration order.
    fn parameters() -> Vec<Parameter> {
        Vec::new()
    }

    /// Build an instance from resolved arguments.
    fn construct(args: &Arguments) -> Result<Self>;

    /// Hook to declare implemented interfaces on the generated definition.
    fn declare(definition: ClassDefinition) -> ClassDefinition {
        definition
    }
}

/// Registry of class definitions.
///
/// Uses `DashMap` with `ahash` so definitions can be added while containers
/// built on the catalog are already resolving.
pub struct Catalog {
    classes: DashMap<String, Arc<ClassDefinition>, RandomState>,
}

impl Catalog {
    #[inline]
    pub fn new() -> Self {
        Self {
            classes: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Add a definition, replacing any previous one with the same identifier.
    pub fn register(&self, definition: ClassDefinition) {
        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            class = definition.id(),
            parameters = definition.parameters.len(),
            interfaces = definition.interfaces.len(),
            "Registering class definition"
        );

        self.classes
            .insert(definition.id.clone(), Arc::new(definition));
    }

    /// Add the definition of an [`Injectable`] type.
    #[inline]
    pub fn register_injectable<T: Injectable>(&self) {
        self.register(ClassDefinition::injectable::<T>());
    }

    /// Builder-style `register`.
    #[inline]
    pub fn with(self, definition: ClassDefinition) -> Self {
        self.register(definition);
        self
    }

    /// Builder-style `register_injectable`.
    #[inline]
    pub fn with_injectable<T: Injectable>(self) -> Self {
        self.with(ClassDefinition::injectable::<T>())
    }

    /// Whether a class with this identifier exists.
    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.classes.contains_key(id)
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<Arc<ClassDefinition>> {
        self.classes.get(id).map(|entry| Arc::clone(entry.value()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("count", &self.len())
            .finish()
    }
}
