//! # Service Container - Constructor Injection by Class, Interface and Tag
//!
//! A runtime service container: services are registered by identifier, built
//! lazily on first access, and their constructor parameters are satisfied
//! automatically from what the container knows.
//!
//! ## Features
//!
//! - ⚡ **Lock-free** - Uses `DashMap` for concurrent registry access
//! - 🏭 **Lazy** - Each service is built at most once, on first access
//! - 🔍 **Auto-discovery** - Concrete dependencies are registered on demand
//! - 🔌 **Interfaces** - Abstract parameters bind to the first registered implementation
//! - 🏷️ **Tags** - Group services and fetch them in registration order
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use service_container::{Arguments, Catalog, ClassDefinition, Container, Parameter, ScalarType, Service};
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! // Rust has no reflection: describe the classes up front
//! let catalog = Catalog::new()
//!     .with(
//!         ClassDefinition::new("app::Database", |args: &Arguments| {
//!             Ok(Database { url: args.string("url")?.to_owned() })
//!         })
//!         .parameter(Parameter::scalar("url", ScalarType::String)),
//!     )
//!     .with(
//!         ClassDefinition::new("app::UserService", |args: &Arguments| {
//!             Ok(UserService { db: args.service("db")? })
//!         })
//!         .parameter(Parameter::class("db", "app::Database")),
//!     );
//!
//! let container = Container::new(catalog);
//!
//! // Register services
//! container.set(
//!     "app::Database",
//!     Service::new("app::Database").with_given_arg("url", "postgres://localhost"),
//! );
//! container.set("app::UserService", Service::new("app::UserService"));
//!
//! // Resolve - returns the shared instance
//! let users = container.get_as::<UserService>("app::UserService").unwrap();
//! assert_eq!(users.db.url, "postgres://localhost");
//! ```
//!
//! ## Interfaces and Tags
//!
//! ```rust
//! use service_container::{Arguments, Catalog, ClassDefinition, Container, Injectable, Parameter, Result, Service};
//! use std::sync::Arc;
//!
//! trait Cache: Send + Sync {
//!     fn backend(&self) -> &'static str;
//! }
//!
//! #[derive(Default)]
//! struct MemoryCache;
//! impl Cache for MemoryCache {
//!     fn backend(&self) -> &'static str { "memory" }
//! }
//!
//! struct Sessions {
//!     cache: Arc<dyn Cache>,
//! }
//!
//! impl Injectable for Sessions {
//!     fn parameters() -> Vec<Parameter> {
//!         vec![Parameter::interface_of::<dyn Cache>("cache")]
//!     }
//!
//!     fn construct(args: &Arguments) -> Result<Self> {
//!         Ok(Sessions { cache: args.interface("cache")? })
//!     }
//! }
//!
//! let catalog = Catalog::new()
//!     .with(ClassDefinition::of::<MemoryCache>().implements_as(|c: Arc<MemoryCache>| c as Arc<dyn Cache>))
//!     .with_injectable::<Sessions>();
//!
//! let container = Container::new(catalog);
//! let cache = service_container::class_id::<MemoryCache>();
//! let sessions = service_container::class_id::<Sessions>();
//!
//! // Interfaces declared by the class definition are picked up on registration
//! container.set(cache, Service::new(cache));
//! container.set(sessions, Service::new(sessions).with_tags(["http"]));
//!
//! let resolved = container.get_as::<Sessions>(sessions).unwrap();
//! assert_eq!(resolved.cache.backend(), "memory");
//! assert_eq!(container.get_by_tag("http").len(), 1);
//! ```
//!
//! ## Performance
//!
//! - **Lock-free reads**: Using `DashMap` for concurrent registry access vs `RwLock`
//! - **AHash**: Faster hashing for string identifiers
//! - **Once per service**: `OnceCell` guarantees a single construction even under contention

mod argument;
mod class;
mod config;
mod container;
mod error;
#[cfg(feature = "logging")]
pub mod logging;
mod resolution;
mod service;
mod storage;

pub use argument::*;
pub use class::*;
pub use config::*;
pub use container::{Container, ContainerBuilder, WeakContainer};
pub use error::*;
pub use service::*;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Argument, Arguments, Catalog, ClassDefinition, Container, ContainerBuilder, DiError,
        Injectable, Instance, MissingArguments, Parameter, Result, ScalarType, Service,
        class_id, interface_id,
    };
    pub use std::sync::Arc;
}
