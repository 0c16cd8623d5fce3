//! Performance benchmarks for the registry

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use wiring_di::{Declaration, DIResult, Overrides, Registry};

/// Simple test component for benchmarking
#[derive(Debug, Clone)]
struct TestService {
    id: u32,
    data: Vec<u8>,
}

impl TestService {
    fn new(id: u32) -> Self {
        Self {
            id,
            data: vec![0; 1024], // 1KB of data
        }
    }
}

/// Registry with a chain `chain.n0 <- chain.n1 <- ... <- chain.n{len-1}`
fn chain_registry(len: usize) -> Registry {
    let registry = Registry::new();
    registry
        .register("chain.n0", || Ok(TestService::new(0)))
        .unwrap();
    for i in 1..len {
        let dep = format!("chain.n{}", i - 1);
        registry
            .register_with_deps(
                format!("chain.n{}", i),
                Declaration::from_keys([dep]).unwrap(),
                move |_| Ok(TestService::new(i as u32)),
            )
            .unwrap();
    }
    registry
}

fn benchmark_registration(c: &mut Criterion) {
    c.bench_function("register_singleton_component", |b| {
        b.iter(|| {
            let registry = Registry::new();
            let result = registry.register("services.test", || Ok(TestService::new(black_box(42))));
            black_box(result)
        })
    });

    c.bench_function("register_component_with_deps", |b| {
        b.iter(|| {
            let registry = Registry::new();
            let result = registry.register_with_deps(
                "services.test",
                Declaration::from_keys(["settings", "clients.email"]).unwrap(),
                |_| Ok(TestService::new(black_box(42))),
            );
            black_box(result)
        })
    });
}

fn benchmark_resolution(c: &mut Criterion) {
    let registry = Registry::new();
    registry
        .register("services.singleton", || Ok(TestService::new(42)))
        .unwrap();
    registry
        .register_transient("services.transient", Declaration::empty(), |_| {
            Ok(TestService::new(42))
        })
        .unwrap();

    c.bench_function("resolve_cached_singleton", |b| {
        b.iter(|| {
            let result: DIResult<Arc<TestService>> = registry.resolve_as("services.singleton");
            black_box(result)
        })
    });

    c.bench_function("resolve_transient", |b| {
        b.iter(|| {
            let result: DIResult<Arc<TestService>> = registry.resolve_as("services.transient");
            black_box(result)
        })
    });

    c.bench_function("resolve_unknown_key", |b| {
        b.iter(|| black_box(registry.resolve("services.missing").is_err()))
    });
}

fn benchmark_construct(c: &mut Criterion) {
    let registry = chain_registry(2);
    let declaration = Declaration::from_keys(["chain.n0", "chain.n1"]).unwrap();
    let overrides = Overrides::new().with("n0", TestService::new(7));

    c.bench_function("construct_without_overrides", |b| {
        b.iter(|| black_box(declaration.construct(&registry, &Overrides::new())))
    });

    c.bench_function("construct_with_override", |b| {
        b.iter(|| black_box(declaration.construct(&registry, &overrides)))
    });
}

fn benchmark_boot(c: &mut Criterion) {
    c.bench_function("boot_order_chain_64", |b| {
        let registry = chain_registry(64);
        b.iter(|| black_box(registry.boot_order()))
    });

    c.bench_function("eager_load_chain_64", |b| {
        b.iter(|| {
            let registry = chain_registry(64);
            let produced = registry.eager_load_all().unwrap();
            let last = registry.resolve_as::<TestService>("chain.n63").unwrap();
            black_box((produced.len(), last.id, last.data.len()))
        })
    });
}

criterion_group!(
    benches,
    benchmark_registration,
    benchmark_resolution,
    benchmark_construct,
    benchmark_boot
);
criterion_main!(benches);
