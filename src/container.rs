//! Service container
//!
//! The `Container` owns the service registry: one [`Service`] descriptor per
//! identifier, looked up by identifier, by tag or by interface. It is also a
//! service itself, registered under [`Container::CLASS`] and injected into
//! any constructor parameter declared as the container.

use crate::storage::ServiceStorage;
use crate::{Catalog, ContainerConfig, DiError, Instance, MissingArguments, Result, Service, ServiceSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Shared container state
pub(crate) struct ContainerInner {
    /// Service registry (lock-free)
    storage: ServiceStorage,
    /// Known classes
    catalog: Arc<Catalog>,
    config: ContainerConfig,
    /// Lock state - uses AtomicBool for fast lock checking (no contention)
    locked: AtomicBool,
}

/// Non-owning container handle.
///
/// Registered services and recorded constructor arguments hold the container
/// through this handle, so the registry is freed once the last [`Container`]
/// is dropped.
#[derive(Clone)]
pub struct WeakContainer(Weak<ContainerInner>);

impl WeakContainer {
    /// The container, if it is still alive.
    #[inline]
    pub fn upgrade(&self) -> Option<Container> {
        self.0.upgrade().map(|inner| Container { inner })
    }
}

/// Constructor-injection service container.
///
/// Cloning is cheap and every clone shares the same registry.
///
/// # Examples
///
/// ```rust
/// use service_container::{Arguments, Catalog, ClassDefinition, Container, Parameter, Service};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Database;
///
/// struct UserRepository { db: Arc<Database> }
///
/// let catalog = Catalog::new()
///     .with(ClassDefinition::of::<Database>())
///     .with(
///         ClassDefinition::new("app::UserRepository", |args: &Arguments| {
///             Ok(UserRepository { db: args.service("db")? })
///         })
///         .parameter(Parameter::class_of::<Database>("db")),
///     );
///
/// let container = Container::new(catalog);
/// container.set("app::UserRepository", Service::new("app::UserRepository"));
///
/// // Database is registered and built on demand
/// let repo = container.get_as::<UserRepository>("app::UserRepository").unwrap();
/// let db = container.get_as::<Database>(service_container::class_id::<Database>()).unwrap();
/// assert!(Arc::ptr_eq(&repo.db, &db));
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Identifier of the container itself, equal to `class_id::<Container>()`.
    pub const CLASS: &'static str = "service_container::container::Container";

    /// Create a container over `catalog` with default settings.
    #[inline]
    pub fn new(catalog: impl Into<Arc<Catalog>>) -> Self {
        Self::with_config(catalog, ContainerConfig::default())
    }

    /// Create a container with pre-allocated capacity.
    #[inline]
    pub fn with_capacity(catalog: impl Into<Arc<Catalog>>, capacity: usize) -> Self {
        Self::with_config(catalog, ContainerConfig::default().with_capacity(capacity))
    }

    /// Create a container with explicit settings.
    pub fn with_config(catalog: impl Into<Arc<Catalog>>, config: ContainerConfig) -> Self {
        let catalog = catalog.into();

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            classes = catalog.len(),
            capacity = config.capacity,
            missing_arguments = ?config.missing_arguments,
            "Creating new service container"
        );

        let container = Self {
            inner: Arc::new(ContainerInner {
                storage: ServiceStorage::with_capacity(config.capacity),
                catalog,
                config,
                locked: AtomicBool::new(false),
            }),
        };

        let mut this = Service::new(Self::CLASS);
        this.bind(&container);
        container
            .inner
            .storage
            .insert(Self::CLASS.to_owned(), Arc::new(this));

        container
    }

    /// Start a fluent container configuration.
    #[inline]
    pub fn builder(catalog: impl Into<Arc<Catalog>>) -> ContainerBuilder {
        ContainerBuilder::new(catalog)
    }

    #[inline]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.inner.catalog
    }

    #[inline]
    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// Whether two handles share one registry.
    #[inline]
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Non-owning handle to this container.
    #[inline]
    pub fn downgrade(&self) -> WeakContainer {
        WeakContainer(Arc::downgrade(&self.inner))
    }

    #[inline]
    pub(crate) fn as_instance(&self) -> Instance {
        Arc::new(self.clone())
    }

    #[inline]
    pub(crate) fn storage(&self) -> &ServiceStorage {
        &self.inner.storage
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Register a service under `id`, replacing any previous one silently.
    ///
    /// # Panics
    ///
    /// Panics if the container is locked. Use [`try_set`](Self::try_set) to
    /// get an error instead.
    #[inline]
    pub fn set(&self, id: impl Into<String>, service: Service) {
        self.check_not_locked();
        self.insert(id.into(), service);
    }

    /// Register a service under `id`, or fail with [`DiError::Locked`].
    #[inline]
    pub fn try_set(&self, id: impl Into<String>, service: Service) -> Result<()> {
        self.ensure_unlocked()?;
        self.insert(id.into(), service);
        Ok(())
    }

    fn insert(&self, id: String, mut service: Service) {
        service.bind(self);

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            id = %id,
            service = service.class(),
            tags = ?service.tags(),
            interfaces = ?service.interfaces(),
            replacing = self.inner.storage.contains(&id),
            "Registering service"
        );

        self.inner.storage.insert(id, Arc::new(service));
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve the service registered under `id`, building it on first access.
    pub fn get(&self, id: &str) -> Result<Instance> {
        #[cfg(feature = "logging")]
        trace!(
            target: "service_container",
            id = id,
            "Resolving service"
        );

        let Some(service) = self.inner.storage.get(id) else {
            #[cfg(feature = "logging")]
            debug!(
                target: "service_container",
                id = id,
                "Service not found in container"
            );
            return Err(DiError::service_not_found(id));
        };

        service.instance_in(self)
    }

    /// Resolve and downcast to `T`.
    pub fn get_as<T: Send + Sync + 'static>(&self, id: &str) -> Result<Arc<T>> {
        self.get(id)?
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(id))
    }

    /// Resolve, returning None on any failure.
    #[inline]
    pub fn try_get(&self, id: &str) -> Option<Instance> {
        self.get(id).ok()
    }

    /// Descriptor registered under `id`.
    #[inline]
    pub fn service(&self, id: &str) -> Option<Arc<Service>> {
        self.inner.storage.get(id)
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Check if an identifier is registered.
    #[inline]
    pub fn has(&self, id: &str) -> bool {
        self.inner.storage.contains(id)
    }

    /// Services tagged `tag`, in registration order.
    pub fn get_by_tag(&self, tag: &str) -> Vec<Arc<Service>> {
        self.inner.storage.filter(|service| service.has_tag(tag))
    }

    /// Services carrying every one of `tags`, in registration order.
    /// An empty list matches nothing.
    pub fn get_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> Vec<Arc<Service>> {
        if tags.is_empty() {
            return Vec::new();
        }
        self.inner
            .storage
            .filter(|service| tags.iter().all(|tag| service.has_tag(tag.as_ref())))
    }

    /// Services declaring `interface`, in registration order.
    pub fn get_by_interface(&self, interface: &str) -> Vec<Arc<Service>> {
        self.inner
            .storage
            .filter(|service| service.implements(interface))
    }

    /// Services declaring every one of `interfaces`, in registration order.
    /// An empty list matches nothing.
    pub fn get_by_interfaces<S: AsRef<str>>(&self, interfaces: &[S]) -> Vec<Arc<Service>> {
        if interfaces.is_empty() {
            return Vec::new();
        }
        self.inner.storage.filter(|service| {
            interfaces
                .iter()
                .all(|interface| service.implements(interface.as_ref()))
        })
    }

    /// Registered identifiers, in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.inner.storage.ids()
    }

    /// Number of registered services, the container's own entry included.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.storage.is_empty()
    }

    /// Snapshot of every service, in registration order.
    pub fn snapshot(&self) -> Vec<ServiceSnapshot> {
        self.inner
            .storage
            .filter(|_| true)
            .iter()
            .map(|service| service.to_snapshot())
            .collect()
    }

    // =========================================================================
    // Lifecycle Methods
    // =========================================================================

    /// Lock the container to prevent further registrations.
    ///
    /// Explicit registration panics afterwards, and resolving a dependency
    /// that is not registered yet fails with [`DiError::Locked`].
    #[inline]
    pub fn lock(&self) {
        self.inner.locked.store(true, Ordering::Release);

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            service_count = self.inner.storage.len(),
            "Container locked - no further registrations allowed"
        );
    }

    /// Check if the container is locked.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.inner.locked.load(Ordering::Acquire)
    }

    /// Remove every service except the container's own entry.
    pub fn clear(&self) {
        #[cfg(feature = "logging")]
        let count = self.inner.storage.len();

        self.inner.storage.retain(|id| id == Self::CLASS);

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            services_removed = count - self.inner.storage.len(),
            "Container cleared"
        );
    }

    /// `Err(Locked)` if locked (internal helper).
    #[inline]
    pub(crate) fn ensure_unlocked(&self) -> Result<()> {
        if self.is_locked() {
            return Err(DiError::Locked);
        }
        Ok(())
    }

    /// Panic if locked (internal helper).
    #[inline]
    fn check_not_locked(&self) {
        if self.inner.locked.load(Ordering::Relaxed) {
            panic!("Cannot register services: container is locked");
        }
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.len())
            .field("classes", &self.inner.catalog.len())
            .field("locked", &self.is_locked())
            .finish()
    }
}

/// Fluent container configuration.
///
/// # Example
///
/// ```rust
/// use service_container::{Catalog, ClassDefinition, Container, MissingArguments, Service};
///
/// #[derive(Default)]
/// struct Mailer;
///
/// let id = service_container::class_id::<Mailer>();
/// let container = Container::builder(Catalog::new().with(ClassDefinition::of::<Mailer>()))
///     .with_capacity(16)
///     .missing_arguments(MissingArguments::Null)
///     .service(Service::new(id).with_tags(["mail"]))
///     .build();
///
/// assert!(container.has(id));
/// assert_eq!(container.get_by_tag("mail").len(), 1);
/// ```
pub struct ContainerBuilder {
    catalog: Arc<Catalog>,
    config: ContainerConfig,
    services: Vec<(String, Service)>,
}

impl ContainerBuilder {
    pub fn new(catalog: impl Into<Arc<Catalog>>) -> Self {
        Self {
            catalog: catalog.into(),
            config: ContainerConfig::default(),
            services: Vec::new(),
        }
    }

    /// Replace the whole configuration.
    #[inline]
    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    #[inline]
    pub fn missing_arguments(mut self, policy: MissingArguments) -> Self {
        self.config.missing_arguments = policy;
        self
    }

    /// Register a service under its class identifier.
    #[inline]
    pub fn service(self, service: Service) -> Self {
        let id = service.class().to_owned();
        self.service_as(id, service)
    }

    /// Register a service under an explicit identifier.
    #[inline]
    pub fn service_as(mut self, id: impl Into<String>, service: Service) -> Self {
        self.services.push((id.into(), service));
        self
    }

    /// Build the container, registering services in the order given.
    pub fn build(self) -> Container {
        let container = Container::with_config(self.catalog, self.config);

        #[cfg(feature = "logging")]
        let count = self.services.len();

        for (id, service) in self.services {
            container.insert(id, service);
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            services_registered = count,
            "Container built"
        );

        container
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Argument, Arguments, ClassDefinition, Injectable, Parameter, ScalarType, class_id,
        interface_id,
    };
    use std::sync::atomic::AtomicU32;

    trait Transport: Send + Sync {
        fn name(&self) -> &'static str;
    }

    #[derive(Default)]
    struct SmtpTransport;

    impl Transport for SmtpTransport {
        fn name(&self) -> &'static str {
            "smtp"
        }
    }

    #[derive(Default)]
    struct SendmailTransport;

    impl Transport for SendmailTransport {
        fn name(&self) -> &'static str {
            "sendmail"
        }
    }

    struct Mailer {
        transport: Arc<dyn Transport>,
    }

    impl Injectable for Mailer {
        fn parameters() -> Vec<Parameter> {
            vec![Parameter::interface_of::<dyn Transport>("transport")]
        }

        fn construct(args: &Arguments) -> Result<Self> {
            Ok(Mailer {
                transport: args.interface("transport")?,
            })
        }
    }

    struct Newsletter {
        mailer: Arc<Mailer>,
        container: Container,
    }

    impl Injectable for Newsletter {
        fn parameters() -> Vec<Parameter> {
            vec![
                Parameter::class_of::<Mailer>("mailer"),
                Parameter::container("container"),
            ]
        }

        fn construct(args: &Arguments) -> Result<Self> {
            Ok(Newsletter {
                mailer: args.service("mailer")?,
                container: args.container("container")?,
            })
        }
    }

    fn transport_catalog() -> Catalog {
        Catalog::new()
            .with(
                ClassDefinition::of::<SmtpTransport>()
                    .implements_as(|t: Arc<SmtpTransport>| t as Arc<dyn Transport>),
            )
            .with(
                ClassDefinition::of::<SendmailTransport>()
                    .implements_as(|t: Arc<SendmailTransport>| t as Arc<dyn Transport>),
            )
            .with_injectable::<Mailer>()
            .with_injectable::<Newsletter>()
    }

    fn register<T: 'static>(container: &Container) {
        let definition = container.catalog().get(class_id::<T>()).unwrap();
        container.set(class_id::<T>(), Service::from_definition(definition));
    }

    #[test]
    fn test_container_registers_itself() {
        let container = Container::new(Catalog::new());
        assert!(container.has(Container::CLASS));
        assert_eq!(container.len(), 1);

        let resolved = container.get_as::<Container>(Container::CLASS).unwrap();
        assert!(resolved.ptr_eq(&container));

        // The identifier matches the Rust type name
        assert_eq!(class_id::<Container>(), Container::CLASS);
        let resolved = container.get_as::<Container>(class_id::<Container>()).unwrap();
        assert!(resolved.ptr_eq(&container));
    }

    #[test]
    fn test_get_unregistered_id() {
        let container = Container::new(Catalog::new());
        assert_eq!(
            container.get("app::Nothing").unwrap_err(),
            DiError::service_not_found("app::Nothing")
        );
        assert!(container.try_get("app::Nothing").is_none());
    }

    #[test]
    fn test_get_as_wrong_type() {
        let container = Container::new(transport_catalog());
        register::<SmtpTransport>(&container);

        let err = container.get_as::<String>(class_id::<SmtpTransport>()).unwrap_err();
        assert!(matches!(err, DiError::TypeMismatch { .. }));
    }

    #[test]
    fn test_self_injection() {
        let container = Container::new(transport_catalog());
        register::<SmtpTransport>(&container);
        register::<Newsletter>(&container);
        let before = container.len();

        let newsletter = container.get_as::<Newsletter>(class_id::<Newsletter>()).unwrap();
        assert!(newsletter.container.ptr_eq(&container));
        assert_eq!(newsletter.mailer.transport.name(), "smtp");
        // Mailer discovered, no descriptor created for the container itself
        assert_eq!(container.len(), before + 1);
        assert_eq!(container.ids()[0], Container::CLASS);
    }

    #[test]
    fn test_container_argument_does_not_keep_registry_alive() {
        static DROPPED: AtomicU32 = AtomicU32::new(0);

        struct Job;

        impl Drop for Job {
            fn drop(&mut self) {
                DROPPED.fetch_add(1, Ordering::SeqCst);
            }
        }

        let catalog = Catalog::new().with(
            ClassDefinition::new("app::Job", |args: &Arguments| {
                drop(args.container("container")?);
                Ok(Job)
            })
            .parameter(Parameter::container("container")),
        );
        let container = Container::new(catalog);
        container.set("app::Job", Service::new("app::Job"));
        container.get("app::Job").unwrap();

        let service = container.service("app::Job").unwrap();
        let recorded = service.args();
        assert!(matches!(recorded[0], Argument::Container(_)));

        drop(container);

        // The descriptor still hands out its cached instance
        assert!(service.get_instance().is_ok());
        assert_eq!(DROPPED.load(Ordering::SeqCst), 0);

        // The recorded argument no longer reaches a container
        let args = Arguments::new("app::Job", vec![("container".into(), recorded[0].clone())]);
        assert_eq!(args.container("container").unwrap_err(), DiError::MissingContainer);

        drop(service);
        assert_eq!(DROPPED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_registration_takes_definition_interfaces() {
        let container = Container::new(transport_catalog());
        container.set(class_id::<SmtpTransport>(), Service::new(class_id::<SmtpTransport>()));
        container.set(class_id::<Mailer>(), Service::new(class_id::<Mailer>()));

        let implementations = container.get_by_interface(interface_id::<dyn Transport>());
        assert_eq!(implementations.len(), 1);
        assert_eq!(implementations[0].class(), class_id::<SmtpTransport>());

        let mailer = container.get_as::<Mailer>(class_id::<Mailer>()).unwrap();
        assert_eq!(mailer.transport.name(), "smtp");

        // Interfaces given explicitly are kept as they are
        container.set(
            "app::Custom",
            Service::new(class_id::<SendmailTransport>()).with_interfaces(["app::Other"]),
        );
        let custom = container.service("app::Custom").unwrap();
        assert!(custom.implements("app::Other"));
        assert!(!custom.implements(interface_id::<dyn Transport>()));
    }

    #[test]
    fn test_interface_override_reuses_registered_service() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        struct CountingTransport;

        impl Transport for CountingTransport {
            fn name(&self) -> &'static str {
                "counting"
            }
        }

        let catalog = transport_catalog().with(
            ClassDefinition::new(class_id::<CountingTransport>(), |_: &Arguments| {
                BUILT.fetch_add(1, Ordering::SeqCst);
                Ok(CountingTransport)
            })
            .implements_as(|t: Arc<CountingTransport>| t as Arc<dyn Transport>),
        );
        let container = Container::new(catalog);
        let counting = class_id::<CountingTransport>();
        container.set(counting, Service::new(counting));
        let direct = container.get_as::<CountingTransport>(counting).unwrap();
        let registered = container.len();

        container.set(
            class_id::<Mailer>(),
            Service::new(class_id::<Mailer>()).with_given_arg("transport", counting),
        );
        let mailer = container.get_as::<Mailer>(class_id::<Mailer>()).unwrap();

        assert_eq!(mailer.transport.name(), "counting");
        assert!(std::ptr::addr_eq(Arc::as_ptr(&mailer.transport), Arc::as_ptr(&direct)));
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
        // Only the mailer was added
        assert_eq!(container.len(), registered + 1);
    }

    #[test]
    fn test_registered_dependency_outside_catalog() {
        let catalog = Catalog::new().with(
            ClassDefinition::new("app::Scheduler", |args: &Arguments| {
                args.service::<u64>("clock").map(|tick| *tick)
            })
            .parameter(Parameter::class("clock", "app::Clock")),
        );
        let catalog = Arc::new(catalog);
        assert!(!catalog.contains("app::Clock"));

        // A preset instance satisfies the dependency
        let container = Container::new(Arc::clone(&catalog));
        container.set("app::Clock", Service::new("app::Clock").with_instance(Arc::new(7_u64)));
        container.set("app::Scheduler", Service::new("app::Scheduler"));
        assert_eq!(*container.get_as::<u64>("app::Scheduler").unwrap(), 7);

        // Without one the class cannot be built, and the descriptor stays registered
        let container = Container::new(catalog);
        container.set("app::Clock", Service::new("app::Clock"));
        container.set("app::Scheduler", Service::new("app::Scheduler"));
        assert_eq!(
            container.get("app::Scheduler").unwrap_err(),
            DiError::class_not_found("app::Clock")
        );
        assert!(container.has("app::Clock"));
    }

    #[test]
    fn test_constructor_rejects_arguments() {
        let catalog = Catalog::new().with(
            ClassDefinition::new("app::Pool", |args: &Arguments| {
                let size = args.int("size")?;
                if size <= 0 {
                    return Err(DiError::creation_failed(args.class(), "size must be positive"));
                }
                Ok(size)
            })
            .parameter(Parameter::scalar("size", ScalarType::Int)),
        );
        let container = Container::new(catalog);
        container.set("app::Pool", Service::new("app::Pool").with_given_arg("size", 0));

        let err = container.get("app::Pool").unwrap_err();
        assert_eq!(err, DiError::creation_failed("app::Pool", "size must be positive"));
        assert_eq!(err.to_string(), "Failed to create service app::Pool: size must be positive");
        assert!(!container.service("app::Pool").unwrap().is_instantiated());
    }

    #[test]
    fn test_interface_resolution_single_implementation() {
        let container = Container::new(transport_catalog());
        register::<SendmailTransport>(&container);

        let mailer = container.get_as::<Mailer>(class_id::<Mailer>());
        // Mailer itself is not registered
        assert!(mailer.is_err());

        register::<Mailer>(&container);
        let mailer = container.get_as::<Mailer>(class_id::<Mailer>()).unwrap();
        assert_eq!(mailer.transport.name(), "sendmail");
    }

    #[test]
    fn test_first_registered_implementation_wins() {
        for _ in 0..10 {
            let container = Container::new(transport_catalog());
            register::<SendmailTransport>(&container);
            register::<SmtpTransport>(&container);
            register::<Mailer>(&container);

            let mailer = container.get_as::<Mailer>(class_id::<Mailer>()).unwrap();
            assert_eq!(mailer.transport.name(), "sendmail");
        }
    }

    #[test]
    fn test_interface_override() {
        let container = Container::new(transport_catalog());
        register::<SendmailTransport>(&container);
        container.set(
            class_id::<Mailer>(),
            Service::new(class_id::<Mailer>())
                .with_given_arg("transport", class_id::<SmtpTransport>()),
        );

        let mailer = container.get_as::<Mailer>(class_id::<Mailer>()).unwrap();
        assert_eq!(mailer.transport.name(), "smtp");

        // The override class was registered and built eagerly
        let smtp = container.service(class_id::<SmtpTransport>()).unwrap();
        assert!(smtp.is_instantiated());
    }

    #[test]
    fn test_interface_override_unknown_class() {
        let container = Container::new(transport_catalog());
        container.set(
            class_id::<Mailer>(),
            Service::new(class_id::<Mailer>()).with_given_arg("transport", "app::CarrierPigeon"),
        );

        let err = container.get(class_id::<Mailer>()).unwrap_err();
        assert_eq!(err, DiError::class_not_found("app::CarrierPigeon"));
        assert!(!container.has("app::CarrierPigeon"));
    }

    #[test]
    fn test_interface_override_must_be_class_name() {
        let container = Container::new(transport_catalog());
        container.set(
            class_id::<Mailer>(),
            Service::new(class_id::<Mailer>()).with_given_arg("transport", Argument::Int(1)),
        );

        assert!(matches!(
            container.get(class_id::<Mailer>()).unwrap_err(),
            DiError::InvalidArgument { parameter, .. } if parameter == "transport"
        ));
    }

    #[test]
    fn test_missing_implementation() {
        let container = Container::new(transport_catalog());
        register::<Mailer>(&container);

        let err = container.get(class_id::<Mailer>()).unwrap_err();
        assert_eq!(err, DiError::missing_implementation(interface_id::<dyn Transport>()));
        assert!(err.is_class_not_found());
    }

    #[test]
    fn test_missing_class_leaves_registry_untouched() {
        let catalog = Catalog::new().with(
            ClassDefinition::new("app::Report", |args: &Arguments| {
                args.service::<u8>("source").map(|_| ())
            })
            .parameter(Parameter::class("source", "app::Missing")),
        );
        let container = Container::new(catalog);
        container.set("app::Report", Service::new("app::Report"));
        let ids = container.ids();

        let err = container.get("app::Report").unwrap_err();
        assert_eq!(err, DiError::class_not_found("app::Missing"));
        assert!(!container.has("app::Missing"));
        assert_eq!(container.ids(), ids);
    }

    #[test]
    fn test_failed_discovery_is_rolled_back() {
        let catalog = Catalog::new()
            .with(
                ClassDefinition::new("app::Outer", |_: &Arguments| Ok(()))
                    .parameter(Parameter::class("inner", "app::Inner")),
            )
            .with(
                ClassDefinition::new("app::Inner", |_: &Arguments| Ok(()))
                    .parameter(Parameter::scalar("dsn", ScalarType::String)),
            );
        let container = Container::new(catalog);
        container.set("app::Outer", Service::new("app::Outer"));

        let err = container.get("app::Outer").unwrap_err();
        assert_eq!(err, DiError::missing_argument("app::Inner", "dsn"));
        assert!(!container.has("app::Inner"));
        assert!(!container.service("app::Outer").unwrap().is_instantiated());
    }

    #[test]
    fn test_circular_dependency() {
        let catalog = Catalog::new()
            .with(
                ClassDefinition::new("app::Chicken", |_: &Arguments| Ok(()))
                    .parameter(Parameter::class("egg", "app::Egg")),
            )
            .with(
                ClassDefinition::new("app::Egg", |_: &Arguments| Ok(()))
                    .parameter(Parameter::class("chicken", "app::Chicken")),
            );
        let container = Container::new(catalog);
        container.set("app::Chicken", Service::new("app::Chicken"));

        let err = container.get("app::Chicken").unwrap_err();
        assert_eq!(
            err,
            DiError::CircularDependency {
                chain: vec!["app::Chicken".into(), "app::Egg".into(), "app::Chicken".into()]
            }
        );
        assert!(!container.has("app::Egg"));
    }

    #[test]
    fn test_tag_grouping_in_registration_order() {
        let container = Container::new(Catalog::new());
        container.set("app::A", Service::new("app::A").with_tags(["listener", "kernel"]));
        container.set("app::B", Service::new("app::B").with_tags(["kernel"]));
        container.set("app::C", Service::new("app::C").with_tags(["listener"]));

        let classes = |services: Vec<Arc<Service>>| -> Vec<String> {
            services.iter().map(|s| s.class().to_owned()).collect()
        };

        assert_eq!(classes(container.get_by_tag("listener")), vec!["app::A", "app::C"]);
        assert_eq!(classes(container.get_by_tag("kernel")), vec!["app::A", "app::B"]);
        assert_eq!(classes(container.get_by_tags(&["listener", "kernel"])), vec!["app::A"]);
        assert!(container.get_by_tag("missing").is_empty());
        assert!(container.get_by_tags::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_interface_grouping() {
        let container = Container::new(Catalog::new());
        container.set("app::A", Service::new("app::A").with_interfaces(["app::Reader"]));
        container.set(
            "app::B",
            Service::new("app::B").with_interfaces(["app::Reader", "app::Writer"]),
        );

        assert_eq!(container.get_by_interface("app::Reader").len(), 2);
        let both = container.get_by_interfaces(&["app::Reader", "app::Writer"]);
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].class(), "app::B");
        assert!(container.get_by_interface("app::Other").is_empty());
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let container = Container::new(Catalog::new());
        container.set("first", Service::new("app::A").with_tags(["t"]));
        container.set("second", Service::new("app::B").with_tags(["t"]));
        container.set("first", Service::new("app::C").with_tags(["t"]));

        let classes: Vec<_> = container
            .get_by_tag("t")
            .iter()
            .map(|s| s.class().to_owned())
            .collect();
        assert_eq!(classes, vec!["app::C", "app::B"]);
    }

    #[test]
    fn test_missing_argument_policy() {
        let catalog = Catalog::new().with(
            ClassDefinition::new("app::Greeting", |args: &Arguments| {
                Ok(args.optional_string("name")?.unwrap_or("world").to_owned())
            })
            .parameter(Parameter::scalar("name", ScalarType::String)),
        );
        let catalog = Arc::new(catalog);

        let strict = Container::new(Arc::clone(&catalog));
        strict.set("app::Greeting", Service::new("app::Greeting"));
        assert_eq!(
            strict.get("app::Greeting").unwrap_err(),
            DiError::missing_argument("app::Greeting", "name")
        );

        let lenient = Container::builder(catalog)
            .missing_arguments(MissingArguments::Null)
            .service(Service::new("app::Greeting"))
            .build();
        let greeting = lenient.get_as::<String>("app::Greeting").unwrap();
        assert_eq!(greeting.as_str(), "world");
        assert!(lenient.service("app::Greeting").unwrap().args()[0].is_null());
    }

    #[test]
    fn test_parameter_default() {
        let catalog = Catalog::new().with(
            ClassDefinition::new("app::Pool", |args: &Arguments| args.int("size"))
                .parameter(Parameter::scalar("size", ScalarType::Int).with_default(8)),
        );
        let container = Container::new(catalog);
        container.set("app::Pool", Service::new("app::Pool"));
        container.set(
            "app::BigPool",
            Service::new("app::Pool").with_given_arg("size", 64),
        );

        assert_eq!(*container.get_as::<i64>("app::Pool").unwrap(), 8);
        assert_eq!(*container.get_as::<i64>("app::BigPool").unwrap(), 64);
    }

    #[test]
    fn test_lock_blocks_discovery() {
        let container = Container::new(transport_catalog());
        register::<SmtpTransport>(&container);
        register::<Newsletter>(&container);
        container.lock();
        assert!(container.is_locked());

        assert_eq!(container.get(class_id::<Newsletter>()).unwrap_err(), DiError::Locked);
        assert_eq!(
            container.try_set("app::X", Service::new("app::X")).unwrap_err(),
            DiError::Locked
        );
    }

    #[test]
    #[should_panic(expected = "Cannot register services: container is locked")]
    fn test_register_after_lock() {
        let container = Container::new(Catalog::new());
        container.lock();
        container.set("app::X", Service::new("app::X"));
    }

    #[test]
    fn test_clear_keeps_self() {
        let container = Container::new(Catalog::new());
        container.set("app::A", Service::new("app::A"));
        container.clear();

        assert_eq!(container.ids(), vec![Container::CLASS.to_string()]);
    }

    #[test]
    fn test_lazy_instantiation_once() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let catalog = Catalog::new().with(ClassDefinition::new("app::Counter", |_: &Arguments| {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        let container = Container::new(catalog);
        container.set("app::Counter", Service::new("app::Counter"));
        assert_eq!(BUILT.load(Ordering::SeqCst), 0);

        let a = container.get("app::Counter").unwrap();
        let b = container.get("app::Counter").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_resolution_builds_once() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        let catalog = Catalog::new()
            .with(ClassDefinition::new("app::Shared", |_: &Arguments| {
                BUILT.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .with(
                ClassDefinition::new("app::Consumer", |args: &Arguments| {
                    args.service::<()>("shared")
                })
                .parameter(Parameter::class("shared", "app::Shared")),
            );
        let container = Container::new(catalog);
        container.set("app::Consumer", Service::new("app::Consumer"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let container = container.clone();
                std::thread::spawn(move || container.get("app::Consumer").unwrap())
            })
            .collect();
        let instances: Vec<Instance> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_snapshot_lists_wiring() {
        let container = Container::new(transport_catalog());
        register::<SmtpTransport>(&container);
        register::<Mailer>(&container);
        container.get(class_id::<Mailer>()).unwrap();

        let snapshot = container.snapshot();
        let mailer = snapshot
            .iter()
            .find(|s| s.class == class_id::<Mailer>())
            .unwrap();
        assert_eq!(mailer.args.len(), 1);
        assert!(matches!(
            &mailer.args[0],
            Argument::Service { class, .. } if class == class_id::<SmtpTransport>()
        ));
    }
}
