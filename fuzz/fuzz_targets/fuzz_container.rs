#![no_main]

//! Fuzz target for registration and resolution over random dependency graphs
//!
//! Graphs may contain cycles, unknown classes and parameters without values;
//! resolution must fail cleanly instead of panicking or recursing forever.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use service_container::{
    Argument, Arguments, Catalog, ClassDefinition, Container, DiError, MissingArguments,
    Parameter, ScalarType, Service,
};
use std::sync::Arc;

const CLASSES: usize = 8;
const TAGS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Arbitrary)]
struct ClassShape {
    /// Class dependencies, as indexes into the graph (out of range = unknown class)
    dependencies: Vec<u8>,
    /// Interface dependency on "fuzz::Iface"
    wants_interface: bool,
    /// Scalar parameter, optionally defaulted
    scalar: Option<Option<i64>>,
    implements_interface: bool,
}

#[derive(Debug, Arbitrary)]
enum ContainerOp {
    Register {
        class: u8,
        tags: u8,
        value: Option<i64>,
        iface_override: Option<u8>,
    },
    Get(u8),
    GetTwice(u8),
    GetByTag(u8),
    GetByTags(u8),
    GetByInterface,
    Snapshot,
    Lock,
    Clear,
}

#[derive(Debug, Arbitrary)]
struct Input {
    classes: Vec<ClassShape>,
    lenient: bool,
    ops: Vec<ContainerOp>,
}

fn class_name(index: u8) -> String {
    format!("fuzz::C{index}")
}

fn build_catalog(classes: &[ClassShape]) -> Catalog {
    let catalog = Catalog::new();
    for (index, shape) in classes.iter().take(CLASSES).enumerate() {
        let mut definition = ClassDefinition::new(class_name(index as u8), |args: &Arguments| {
            Ok(args.len())
        });
        for (position, dependency) in shape.dependencies.iter().take(4).enumerate() {
            definition = definition.parameter(Parameter::class(
                format!("dep{position}"),
                class_name(dependency % (CLASSES as u8 + 2)),
            ));
        }
        if shape.wants_interface {
            definition = definition.parameter(Parameter::interface("iface", "fuzz::Iface"));
        }
        if let Some(default) = shape.scalar {
            let mut parameter = Parameter::scalar("value", ScalarType::Int);
            if let Some(default) = default {
                parameter = parameter.with_default(default);
            }
            definition = definition.parameter(parameter);
        }
        if shape.implements_interface {
            definition = definition.implements("fuzz::Iface");
        }
        catalog.register(definition);
    }
    catalog
}

fn check_error(err: &DiError) {
    match err {
        DiError::CircularDependency { chain } => {
            assert!(chain.len() >= 2);
            assert_eq!(chain.first(), chain.last());
        }
        DiError::ClassNotFound { .. }
        | DiError::MissingImplementation { .. }
        | DiError::ServiceNotFound { .. }
        | DiError::MissingArgument { .. }
        | DiError::Locked => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

fuzz_target!(|input: Input| {
    let policy = if input.lenient {
        MissingArguments::Null
    } else {
        MissingArguments::Fail
    };
    let container = Container::builder(build_catalog(&input.classes))
        .missing_arguments(policy)
        .build();

    for op in input.ops.into_iter().take(64) {
        match op {
            ContainerOp::Register {
                class,
                tags,
                value,
                iface_override,
            } => {
                let id = class_name(class % CLASSES as u8);
                let tags = TAGS
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| tags & (1 << bit) != 0)
                    .map(|(_, tag)| *tag);
                let mut service = Service::new(id.clone())
                    .with_tags(tags)
                    .with_interfaces(["fuzz::Iface"]);
                if let Some(value) = value {
                    service = service.with_given_arg("value", value);
                }
                if let Some(target) = iface_override {
                    service = service.with_given_arg("iface", class_name(target % CLASSES as u8));
                }
                let result = container.try_set(id.clone(), service);
                assert_eq!(result.is_err(), container.is_locked());
                if result.is_ok() {
                    assert!(container.has(&id));
                }
            }
            ContainerOp::Get(class) => {
                if let Err(err) = container.get(&class_name(class)) {
                    check_error(&err);
                }
            }
            ContainerOp::GetTwice(class) => {
                let id = class_name(class);
                if let Ok(first) = container.get(&id) {
                    let second = container.get(&id).unwrap();
                    assert!(Arc::ptr_eq(&first, &second));
                }
            }
            ContainerOp::GetByTag(tag) => {
                let tag = TAGS[tag as usize % TAGS.len()];
                for service in container.get_by_tag(tag) {
                    assert!(service.has_tag(tag));
                }
            }
            ContainerOp::GetByTags(mask) => {
                let tags: Vec<&str> = TAGS
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| mask & (1 << bit) != 0)
                    .map(|(_, tag)| *tag)
                    .collect();
                let found = container.get_by_tags(&tags);
                if tags.is_empty() {
                    assert!(found.is_empty());
                }
            }
            ContainerOp::GetByInterface => {
                let ids = container.ids();
                let found = container.get_by_interface("fuzz::Iface");
                // Registration order is preserved
                let positions: Vec<usize> = found
                    .iter()
                    .filter_map(|s| ids.iter().position(|id| id == s.class()))
                    .collect();
                assert!(positions.windows(2).all(|w| w[0] <= w[1]));
            }
            ContainerOp::Snapshot => {
                let snapshot = container.snapshot();
                assert_eq!(snapshot.len(), container.len());
                for entry in snapshot {
                    let _ = entry.args.iter().map(Argument::kind).count();
                }
            }
            ContainerOp::Lock => container.lock(),
            ContainerOp::Clear => {
                container.clear();
                assert_eq!(container.len(), 1);
                assert!(container.has(Container::CLASS));
            }
        }
    }
});
