//! Concurrent resolution: exactly-once production and per-caller cycle tracking

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use wiring_di::*;

#[derive(Debug)]
struct SlowService {
    id: usize,
}

fn slow_registry(counter: &Arc<AtomicUsize>) -> Arc<Registry> {
    let registry = Registry::new();
    let seen = Arc::clone(counter);
    registry
        .register("services.slow", move || {
            // Widen the window in which concurrent callers race
            thread::sleep(Duration::from_millis(20));
            Ok(SlowService {
                id: seen.fetch_add(1, Ordering::SeqCst),
            })
        })
        .unwrap();
    registry.freeze();
    Arc::new(registry)
}

#[test]
fn test_concurrent_first_resolution_runs_factory_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = slow_registry(&counter);
    let thread_count = 16;
    let barrier = Arc::new(Barrier::new(thread_count));

    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.resolve_as::<SlowService>("services.slow").unwrap()
            })
        })
        .collect();

    let results: Vec<Arc<SlowService>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    for result in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], result));
    }
    assert_eq!(results[0].id, 0);
}

#[test]
fn test_concurrent_dependents_share_dependency() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = Registry::new();
    let seen = Arc::clone(&counter);
    registry
        .register("db.pool", move || {
            thread::sleep(Duration::from_millis(10));
            Ok(seen.fetch_add(1, Ordering::SeqCst))
        })
        .unwrap();

    for name in ["repos.users", "repos.orders", "repos.invoices", "repos.carts"] {
        registry
            .register_with_deps(name, Declaration::from_keys(["db.pool"]).unwrap(), |deps| {
                deps.get::<usize>("pool").map_err(anyhow::Error::from)
            })
            .unwrap();
    }
    let registry = Arc::new(registry);

    thread::scope(|scope| {
        for name in ["repos.users", "repos.orders", "repos.invoices", "repos.carts"] {
            let registry = &registry;
            scope.spawn(move || registry.resolve(name).unwrap());
        }
    });

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(registry.cached_count(), 5);
}

#[test]
fn test_disjoint_resolutions_are_not_mistaken_for_cycles() {
    // Two threads resolve chains that share the same leaf at the same time.
    let registry = Registry::new();
    registry
        .register("shared.leaf", || {
            thread::sleep(Duration::from_millis(20));
            Ok(())
        })
        .unwrap();
    registry
        .register_with_deps("left", Declaration::from_keys(["shared.leaf"]).unwrap(), |_| Ok(()))
        .unwrap();
    registry
        .register_with_deps("right", Declaration::from_keys(["shared.leaf"]).unwrap(), |_| Ok(()))
        .unwrap();
    let registry = Arc::new(registry);
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["left", "right"]
        .into_iter()
        .map(|key| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.resolve(key).map(|_| ())
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolution_from_tasks() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = slow_registry(&counter);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::task::spawn_blocking(move || {
                registry.resolve_as::<SlowService>("services.slow").unwrap()
            })
        })
        .collect();

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap());
    }

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
}
