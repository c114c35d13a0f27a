#![no_main]

//! Fuzz target for concurrent resolution
//!
//! Several threads resolve overlapping services of a shared acyclic graph at
//! once; every class must still be built exactly once.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use service_container::{Arguments, Catalog, ClassDefinition, Container, Parameter, Service};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

const CLASSES: usize = 6;

#[derive(Debug, Arbitrary)]
struct Input {
    /// Edge bitmasks; class `i` may only depend on classes with a higher index
    edges: [u8; CLASSES],
    /// Classes registered up front, the rest are discovered
    registered: u8,
    /// Per thread, the class it resolves
    threads: Vec<u8>,
}

fn class_name(index: usize) -> String {
    format!("fuzz::C{index}")
}

fuzz_target!(|input: Input| {
    let builds: Arc<Vec<AtomicUsize>> =
        Arc::new((0..CLASSES).map(|_| AtomicUsize::new(0)).collect());

    let catalog = Catalog::new();
    for index in 0..CLASSES {
        let counter = Arc::clone(&builds);
        let mut definition = ClassDefinition::new(class_name(index), move |_: &Arguments| {
            counter[index].fetch_add(1, Ordering::SeqCst);
            Ok(index)
        });
        for target in (index + 1)..CLASSES {
            if input.edges[index] & (1 << target) != 0 {
                definition = definition
                    .parameter(Parameter::class(format!("dep{target}"), class_name(target)));
            }
        }
        catalog.register(definition);
    }

    let container = Container::new(catalog);
    for index in 0..CLASSES {
        if input.registered & (1 << index) != 0 {
            container.set(class_name(index), Service::new(class_name(index)));
        }
    }

    let handles: Vec<_> = input
        .threads
        .iter()
        .take(8)
        .map(|&class| {
            let container = container.clone();
            let id = class_name(class as usize % CLASSES);
            thread::spawn(move || container.get(&id).ok())
        })
        .collect();

    for handle in handles {
        let _ = handle.join().unwrap();
    }

    for count in builds.iter() {
        assert!(count.load(Ordering::SeqCst) <= 1);
    }
});
