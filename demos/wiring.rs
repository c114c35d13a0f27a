//! Wiring a small application: interfaces, overrides, tags and self-injection
//!
//! ```bash
//! cargo run --example wiring
//! ```

use service_container::prelude::*;

trait Transport: Send + Sync {
    fn send(&self, to: &str, body: &str) -> String;
}

#[derive(Default)]
struct SmtpTransport;

impl Transport for SmtpTransport {
    fn send(&self, to: &str, body: &str) -> String {
        format!("SMTP -> {to}: {body}")
    }
}

#[derive(Default)]
struct NullTransport;

impl Transport for NullTransport {
    fn send(&self, to: &str, _body: &str) -> String {
        format!("(dropped message for {to})")
    }
}

struct Mailer {
    transport: Arc<dyn Transport>,
    sender: String,
}

impl Injectable for Mailer {
    fn class_name() -> &'static str {
        "app::Mailer"
    }

    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::interface_of::<dyn Transport>("transport"),
            Parameter::scalar("sender", ScalarType::String).with_default("noreply@example.com"),
        ]
    }

    fn construct(args: &Arguments) -> Result<Self> {
        Ok(Mailer {
            transport: args.interface("transport")?,
            sender: args.string("sender")?.to_owned(),
        })
    }
}

trait Listener: Send + Sync {
    fn on_signup(&self, user: &str) -> String;
}

struct WelcomeListener {
    mailer: Arc<Mailer>,
}

impl Listener for WelcomeListener {
    fn on_signup(&self, user: &str) -> String {
        self.mailer
            .transport
            .send(user, &format!("Welcome! ({})", self.mailer.sender))
    }
}

impl Injectable for WelcomeListener {
    fn class_name() -> &'static str {
        "app::WelcomeListener"
    }

    fn parameters() -> Vec<Parameter> {
        vec![Parameter::class("mailer", "app::Mailer")]
    }

    fn construct(args: &Arguments) -> Result<Self> {
        Ok(WelcomeListener {
            mailer: args.service("mailer")?,
        })
    }

    fn declare(definition: ClassDefinition) -> ClassDefinition {
        definition.implements_as(|l: Arc<WelcomeListener>| l as Arc<dyn Listener>)
    }
}

/// Dispatches to every service tagged "listener", resolved through the container
struct Dispatcher {
    container: Container,
}

impl Dispatcher {
    fn signup(&self, user: &str) -> Result<Vec<String>> {
        let interface = interface_id::<dyn Listener>();
        let mut outputs = Vec::new();
        for service in self.container.get_by_tag("listener") {
            let instance = service.get_instance()?;
            let Some(definition) = service.definition() else {
                continue;
            };
            let cast = definition.cast_to(interface, &instance);
            if let Some(listener) = cast.downcast_ref::<Arc<dyn Listener>>() {
                outputs.push(listener.on_signup(user));
            }
        }
        Ok(outputs)
    }
}

impl Injectable for Dispatcher {
    fn class_name() -> &'static str {
        "app::Dispatcher"
    }

    fn parameters() -> Vec<Parameter> {
        vec![Parameter::container("container")]
    }

    fn construct(args: &Arguments) -> Result<Self> {
        Ok(Dispatcher {
            container: args.container("container")?,
        })
    }
}

fn main() -> Result<()> {
    let catalog = Catalog::new()
        .with(
            ClassDefinition::of::<SmtpTransport>()
                .implements_as(|t: Arc<SmtpTransport>| t as Arc<dyn Transport>),
        )
        .with(
            ClassDefinition::of::<NullTransport>()
                .implements_as(|t: Arc<NullTransport>| t as Arc<dyn Transport>),
        )
        .with_injectable::<Mailer>()
        .with_injectable::<WelcomeListener>()
        .with_injectable::<Dispatcher>();

    let container = Container::builder(catalog)
        // First registered implementation of Transport wins
        .service(Service::new(class_id::<SmtpTransport>()))
        .service(Service::new(class_id::<NullTransport>()))
        .service(Service::new("app::WelcomeListener").with_tags(["listener"]))
        .service(Service::new("app::Dispatcher"))
        .build();

    let dispatcher = container.get_as::<Dispatcher>("app::Dispatcher")?;
    for line in dispatcher.signup("ada@example.com")? {
        println!("{line}");
    }

    // A second mailer forced onto the null transport, registered under its own id
    container.set(
        "mailer.silent",
        Service::new("app::Mailer")
            .with_given_arg("transport", class_id::<NullTransport>())
            .with_given_arg("sender", "silent@example.com"),
    );
    let silent = container.get_as::<Mailer>("mailer.silent")?;
    println!("{}", silent.transport.send("grace@example.com", "hello"));

    println!("\nRegistered services:");
    for snapshot in container.snapshot() {
        println!("  {} {:?}", snapshot.class, snapshot.args);
    }

    Ok(())
}
