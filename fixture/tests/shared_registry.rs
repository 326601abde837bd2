use rand::{rngs::StdRng, Rng, SeedableRng};
use std::thread;
use wireproof_fixture::{catalog, Builder, Construct, Field, Primitive, Scalar, TypeHandler};

#[test]
fn test_concurrent_generate_and_validate() {
    let registry = catalog::atomic();
    let workers: Vec<_> = (0..4u64)
        .map(|worker| {
            let registry = registry.clone();
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(worker);
                for handler in registry.handlers() {
                    let seed = rng.gen::<i64>();
                    let sample = handler.generate(seed);
                    assert!(handler.is_valid(&sample, seed), "{}", handler.name());
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn test_same_sample_on_every_thread() {
    let registry = catalog::atomic();
    let expected: Vec<_> = registry
        .handlers()
        .map(|handler| handler.generate(42).encode())
        .collect();
    let observed = thread::spawn(move || {
        registry
            .handlers()
            .map(|handler| handler.generate(42).encode())
            .collect::<Vec<_>>()
    })
    .join()
    .unwrap();
    assert_eq!(expected, observed);
}

#[test]
fn test_custom_types_alongside_catalog() {
    let mut builder = Builder::new();
    catalog::register(&mut builder).unwrap();
    builder
        .register(TypeHandler::new(
            "Custom::Int32Topic",
            Construct::structure(
                "Int32Topic",
                vec![
                    Field::key("id", Construct::primitive(Primitive::Int32, Scalar::IDENTITY)),
                    Field::new("value", Construct::primitive(Primitive::Int32, Scalar::affine(2, 0))),
                ],
            ),
        ))
        .unwrap();
    let registry = builder.build();

    // Unqualified lookups resolve to the first registration
    assert_eq!(registry.get("Int32Topic").unwrap().name(), "AtomicTests::Int32Topic");
    let custom = registry.get("Custom::Int32Topic").unwrap();
    let sample = custom.generate(3);
    assert!(custom.is_valid(&sample, 3));
    assert!(!registry.get("Int32Topic").unwrap().is_valid(&sample, 3));
}
