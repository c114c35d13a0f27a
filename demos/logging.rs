//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use service_container::{
    Arguments, Catalog, ClassDefinition, Container, Parameter, ScalarType, Service,
};

#[allow(dead_code)]
struct Database {
    url: String,
}

#[allow(dead_code)]
struct UserService {
    db: std::sync::Arc<Database>,
}

fn main() {
    // Initialize logging - uses JSON if logging-json feature enabled,
    // pretty if logging-pretty enabled
    service_container::logging::builder()
        .trace()
        .container_only()
        .init();

    println!("=== Service Container Logging Demo ===\n");

    let catalog = Catalog::new()
        .with(
            ClassDefinition::new("app::Database", |args: &Arguments| {
                Ok(Database {
                    url: args.string("url")?.to_owned(),
                })
            })
            .parameter(Parameter::scalar("url", ScalarType::String)),
        )
        .with(
            ClassDefinition::new("app::UserService", |args: &Arguments| {
                Ok(UserService {
                    db: args.service("db")?,
                })
            })
            .parameter(Parameter::class("db", "app::Database")),
        );

    // Logs: "Creating new service container", "Registering service"
    let container = Container::new(catalog);
    container.set(
        "app::UserService",
        Service::new("app::UserService").with_tags(["users"]),
    );

    // Database is unknown to the registry: discovery registers it, then fails
    // for lack of a url and unregisters it again
    // Logs: "Registering discovered dependency", "Discovered dependency failed to build"
    let err = container.get("app::UserService").unwrap_err();
    println!("Expected failure: {err}");

    container.set(
        "app::Database",
        Service::new("app::Database").with_given_arg("url", "postgres://localhost/mydb"),
    );

    // Logs: "Instantiating service", "Resolving parameter"
    let _users = container.get("app::UserService").unwrap();

    // Logs: "Service already instantiated, returning cached instance"
    let _again = container.get("app::UserService").unwrap();

    // Logs: "Service not found in container"
    assert!(container.try_get("app::Missing").is_none());

    // Logs: "Container locked - no further registrations allowed"
    container.lock();

    println!("\n=== Demo Complete ===");
}
