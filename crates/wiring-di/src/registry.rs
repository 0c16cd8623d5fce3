//! Component registry
//!
//! Maps keys to factories and caches produced instances. Each singleton
//! entry owns a [`OnceCell`], so concurrent first resolutions of the same
//! key run its factory once and all observe the same instance.
//!
//! Dependencies are resolved before an entry's cell is initialized and the
//! factory only sees already-resolved values, so no cell is held while
//! another key is being resolved. Cycles are caught by the resolution path
//! each call chain carries with it.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::declaration::{Declaration, Injectable, Injected, Overrides};
use crate::error::{DIError, DIResult};
use crate::key::{IntoKey, Key};

/// A produced component
pub type Instance = Arc<dyn Any + Send + Sync>;

type ErasedFactory = Box<dyn Fn(&Injected) -> anyhow::Result<Instance> + Send + Sync>;

/// How often a component is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentLifetime {
    /// Produced once, cached for the life of the registry
    Singleton,
    /// Produced on every resolution, never cached
    Transient,
}

struct ComponentEntry {
    key: Key,
    declaration: Declaration,
    lifetime: ComponentLifetime,
    factory: ErasedFactory,
    instance: OnceCell<Instance>,
}

impl ComponentEntry {
    fn produce(&self, deps: &Injected) -> DIResult<Instance> {
        let instance = (self.factory)(deps)
            .map_err(|source| DIError::factory(self.key.as_str(), source))?;
        debug!("Produced component: {} ({:?})", self.key, self.lifetime);
        Ok(instance)
    }
}

/// Keys currently being resolved by one call chain
#[derive(Debug, Default)]
pub(crate) struct ResolutionPath {
    stack: Vec<Key>,
}

impl ResolutionPath {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn enter(&mut self, key: &Key) -> DIResult<()> {
        if let Some(start) = self.stack.iter().position(|k| k == key) {
            let mut path = self.stack[start..].to_vec();
            path.push(key.clone());
            return Err(DIError::CyclicDependency { path });
        }
        self.stack.push(key.clone());
        Ok(())
    }

    fn leave(&mut self) {
        self.stack.pop();
    }
}

#[derive(Default)]
struct Entries {
    by_key: HashMap<Key, Arc<ComponentEntry>>,
    order: Vec<Key>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Key → factory store with per-key instance caching
pub struct Registry {
    entries: RwLock<Entries>,
    frozen: AtomicBool,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            frozen: AtomicBool::new(false),
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a singleton factory with no dependencies
    pub fn register<K, T, F>(&self, key: K, factory: F) -> DIResult<()>
    where
        K: IntoKey,
        T: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.register_with_deps(key, Declaration::empty(), move |_| factory())
    }

    /// Register a singleton factory that receives its declared dependencies
    pub fn register_with_deps<K, T, F>(&self, key: K, declaration: Declaration, factory: F) -> DIResult<()>
    where
        K: IntoKey,
        T: Send + Sync + 'static,
        F: Fn(&Injected) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.insert(
            key.into_key()?,
            declaration,
            ComponentLifetime::Singleton,
            erase(factory),
            None,
        )
    }

    /// Register a factory that runs on every resolution
    pub fn register_transient<K, T, F>(&self, key: K, declaration: Declaration, factory: F) -> DIResult<()>
    where
        K: IntoKey,
        T: Send + Sync + 'static,
        F: Fn(&Injected) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.insert(
            key.into_key()?,
            declaration,
            ComponentLifetime::Transient,
            erase(factory),
            None,
        )
    }

    /// Register an already-built value
    pub fn register_instance<K, T>(&self, key: K, value: T) -> DIResult<()>
    where
        K: IntoKey,
        T: Send + Sync + 'static,
    {
        let instance: Instance = Arc::new(value);
        let cached = Arc::clone(&instance);
        self.insert(
            key.into_key()?,
            Declaration::empty(),
            ComponentLifetime::Singleton,
            Box::new(move |_| Ok(Arc::clone(&instance))),
            Some(cached),
        )
    }

    /// Register a component that declares its own dependencies
    pub fn register_injectable<T: Injectable>(&self, key: impl IntoKey) -> DIResult<()> {
        let declaration = T::dependencies()?;
        self.register_with_deps(key, declaration, T::inject)
    }

    fn insert(
        &self,
        key: Key,
        declaration: Declaration,
        lifetime: ComponentLifetime,
        factory: ErasedFactory,
        instance: Option<Instance>,
    ) -> DIResult<()> {
        if self.is_frozen() {
            return Err(DIError::RegistrationClosed { key });
        }

        let mut entries = self.entries.write();
        if entries.by_key.contains_key(&key) {
            return Err(DIError::DuplicateKey { key });
        }

        let cell = OnceCell::new();
        if let Some(instance) = instance {
            let _ = cell.set(instance);
        }

        let entry = ComponentEntry {
            key: key.clone(),
            declaration,
            lifetime,
            factory,
            instance: cell,
        };
        entries.by_key.insert(key.clone(), Arc::new(entry));
        entries.order.push(key.clone());

        debug!("Registered component: {} ({:?})", key, lifetime);
        Ok(())
    }

    /// Close registration; later `register*` calls fail
    pub fn freeze(&self) {
        if !self.frozen.swap(true, Ordering::SeqCst) {
            info!("Registry frozen with {} components", self.len());
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve a component, producing and caching it on first use
    pub fn resolve(&self, key: impl AsRef<str>) -> DIResult<Instance> {
        let entry = self.entry(key.as_ref())?;
        let mut path = ResolutionPath::new();
        self.resolve_entry(&entry, &mut path)
    }

    /// Resolve and downcast
    pub fn resolve_as<T: Send + Sync + 'static>(&self, key: impl AsRef<str>) -> DIResult<Arc<T>> {
        let key = key.as_ref();
        self.resolve(key)?
            .downcast::<T>()
            .map_err(|_| DIError::TypeMismatch {
                name: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub(crate) fn resolve_on_path(&self, key: &Key, path: &mut ResolutionPath) -> DIResult<Instance> {
        let entry = self.entry(key.as_str())?;
        self.resolve_entry(&entry, path)
    }

    fn resolve_entry(&self, entry: &ComponentEntry, path: &mut ResolutionPath) -> DIResult<Instance> {
        path.enter(&entry.key)?;
        let result = self.produce_entry(entry, path);
        path.leave();
        result
    }

    fn produce_entry(&self, entry: &ComponentEntry, path: &mut ResolutionPath) -> DIResult<Instance> {
        if let Some(instance) = entry.instance.get() {
            return Ok(Arc::clone(instance));
        }

        let deps = entry.declaration.wire(self, &Overrides::new(), path)?;
        match entry.lifetime {
            ComponentLifetime::Singleton => entry
                .instance
                .get_or_try_init(|| entry.produce(&deps))
                .map(Arc::clone),
            ComponentLifetime::Transient => entry.produce(&deps),
        }
    }

    fn entry(&self, key: &str) -> DIResult<Arc<ComponentEntry>> {
        if let Some(entry) = self.entries.read().by_key.get(key) {
            return Ok(Arc::clone(entry));
        }
        Err(match Key::parse(key) {
            Ok(key) => DIError::UnknownKey { key },
            Err(invalid) => invalid,
        })
    }

    // ========================================================================
    // Boot
    // ========================================================================

    /// Registered keys ordered so that every dependency precedes its
    /// dependents. Ties keep registration order.
    ///
    /// Fails on unknown dependency keys and on cycles.
    pub fn boot_order(&self) -> DIResult<Vec<Key>> {
        let (order, graph) = {
            let entries = self.entries.read();
            (entries.order.clone(), entries.by_key.clone())
        };

        let mut marks: HashMap<Key, Mark> = HashMap::with_capacity(order.len());
        let mut stack = Vec::new();
        let mut sorted = Vec::with_capacity(order.len());
        for key in &order {
            visit(key, &graph, &mut marks, &mut stack, &mut sorted)?;
        }
        Ok(sorted)
    }

    /// Check the dependency graph without producing anything
    pub fn validate(&self) -> DIResult<()> {
        self.boot_order().map(|_| ())
    }

    /// Produce every singleton in dependency order.
    ///
    /// The graph is validated before anything is produced. The first
    /// factory failure aborts the remaining sequence. Returns the keys this
    /// call found uncached and produced; a repeated call returns an empty
    /// list. Transient components are validated but not produced.
    pub fn eager_load_all(&self) -> DIResult<Vec<Key>> {
        let order = self.boot_order()?;
        let mut produced = Vec::new();

        for key in order {
            let entry = self.entry(key.as_str())?;
            if entry.lifetime == ComponentLifetime::Transient || entry.instance.get().is_some() {
                continue;
            }
            let mut path = ResolutionPath::new();
            self.resolve_entry(&entry, &mut path)?;
            produced.push(key);
        }

        info!("Eager load produced {} components", produced.len());
        Ok(produced)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// True if `key` is registered. Never triggers production.
    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.entries.read().by_key.contains_key(key.as_ref())
    }

    /// True if `key` has a cached instance
    pub fn is_cached(&self, key: impl AsRef<str>) -> bool {
        self.entries
            .read()
            .by_key
            .get(key.as_ref())
            .map(|entry| entry.instance.get().is_some())
            .unwrap_or(false)
    }

    pub fn cached_count(&self) -> usize {
        self.entries
            .read()
            .by_key
            .values()
            .filter(|entry| entry.instance.get().is_some())
            .count()
    }

    /// Declared dependencies of `key`
    pub fn declaration(&self, key: impl AsRef<str>) -> Option<Declaration> {
        self.entries
            .read()
            .by_key
            .get(key.as_ref())
            .map(|entry| entry.declaration.clone())
    }

    pub fn lifetime(&self, key: impl AsRef<str>) -> Option<ComponentLifetime> {
        self.entries
            .read()
            .by_key
            .get(key.as_ref())
            .map(|entry| entry.lifetime)
    }

    /// Keys in registration order
    pub fn keys(&self) -> Vec<Key> {
        self.entries.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("keys", &self.keys())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

fn erase<T, F>(factory: F) -> ErasedFactory
where
    T: Send + Sync + 'static,
    F: Fn(&Injected) -> anyhow::Result<T> + Send + Sync + 'static,
{
    Box::new(move |deps: &Injected| -> anyhow::Result<Instance> {
        let value = factory(deps)?;
        Ok(Arc::new(value) as Instance)
    })
}

fn visit(
    key: &Key,
    graph: &HashMap<Key, Arc<ComponentEntry>>,
    marks: &mut HashMap<Key, Mark>,
    stack: &mut Vec<Key>,
    sorted: &mut Vec<Key>,
) -> DIResult<()> {
    match marks.get(key) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = stack.iter().position(|k| k == key).unwrap_or(0);
            let mut path = stack[start..].to_vec();
            path.push(key.clone());
            return Err(DIError::CyclicDependency { path });
        }
        None => {}
    }

    let entry = graph
        .get(key)
        .ok_or_else(|| DIError::UnknownKey { key: key.clone() })?;

    marks.insert(key.clone(), Mark::Visiting);
    stack.push(key.clone());
    for dependency in entry.declaration.keys() {
        visit(dependency, graph, marks, stack, sorted)?;
    }
    stack.pop();
    marks.insert(key.clone(), Mark::Done);
    sorted.push(key.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting(counter: &Arc<AtomicUsize>) -> impl Fn() -> anyhow::Result<usize> + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move || Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[test]
    fn test_resolve_is_cached() {
        let registry = Registry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        registry.register("counter", counting(&counter)).unwrap();

        assert!(!registry.is_cached("counter"));
        let first = registry.resolve("counter").unwrap();
        let second = registry.resolve("counter").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(registry.is_cached("counter"));
    }

    #[test]
    fn test_transient_is_not_cached() {
        let registry = Registry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let produce = counting(&counter);
        registry
            .register_transient("builder", Declaration::empty(), move |_| produce())
            .unwrap();

        let first = registry.resolve_as::<usize>("builder").unwrap();
        let second = registry.resolve_as::<usize>("builder").unwrap();

        assert_eq!((*first, *second), (1, 2));
        assert!(!registry.is_cached("builder"));
    }

    #[test]
    fn test_contains_does_not_produce() {
        let registry = Registry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        registry.register("counter", counting(&counter)).unwrap();

        assert!(registry.contains("counter"));
        assert!(!registry.contains("other"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_duplicate_key_has_no_side_effect() {
        let registry = Registry::new();
        registry.register_instance("settings", 1u8).unwrap();

        let result = registry.register_instance("settings", 2u8);
        assert!(matches!(result, Err(DIError::DuplicateKey { .. })));
        assert_eq!(registry.len(), 1);
        assert_eq!(*registry.resolve_as::<u8>("settings").unwrap(), 1);
    }

    #[test]
    fn test_unknown_and_invalid_keys() {
        let registry = Registry::new();
        assert!(matches!(
            registry.resolve("missing.key"),
            Err(DIError::UnknownKey { .. })
        ));
        assert!(matches!(
            registry.resolve("not a key"),
            Err(DIError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let registry = Registry::new();
        registry
            .register_with_deps("loop", Declaration::from_keys(["loop"]).unwrap(), |_| Ok(()))
            .unwrap();

        match registry.resolve("loop") {
            Err(DIError::CyclicDependency { path }) => {
                let names: Vec<_> = path.iter().map(Key::as_str).collect();
                assert_eq!(names, vec!["loop", "loop"]);
            }
            other => panic!("expected cycle, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_factory_failure_is_wrapped_and_not_cached() {
        let registry = Registry::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&attempts);
        registry
            .register("clients.smtp", move || -> anyhow::Result<()> {
                seen.fetch_add(1, Ordering::SeqCst);
                anyhow::bail!("connection refused")
            })
            .unwrap();

        let err = registry.resolve("clients.smtp").unwrap_err();
        assert!(matches!(err, DIError::Factory { ref component, .. } if component == "clients.smtp"));
        assert!(!registry.is_cached("clients.smtp"));

        let _ = registry.resolve("clients.smtp");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_freeze_closes_registration() {
        let registry = Registry::new();
        registry.freeze();

        let result = registry.register_instance("late", ());
        assert!(matches!(result, Err(DIError::RegistrationClosed { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_boot_order_puts_dependencies_first() {
        let registry = Registry::new();
        registry
            .register_with_deps("op", Declaration::from_keys(["client", "settings"]).unwrap(), |_| Ok(()))
            .unwrap();
        registry
            .register_with_deps("client", Declaration::from_keys(["settings"]).unwrap(), |_| Ok(()))
            .unwrap();
        registry.register_instance("settings", ()).unwrap();

        let order: Vec<_> = registry.boot_order().unwrap();
        let names: Vec<_> = order.iter().map(Key::as_str).collect();
        assert_eq!(names, vec!["settings", "client", "op"]);
    }

    #[test]
    fn test_boot_order_reports_unknown_dependency() {
        let registry = Registry::new();
        registry
            .register_with_deps("op", Declaration::from_keys(["ghost"]).unwrap(), |_| Ok(()))
            .unwrap();

        assert!(matches!(
            registry.validate(),
            Err(DIError::UnknownKey { key }) if key.as_str() == "ghost"
        ));
    }

    #[test]
    fn test_eager_load_is_idempotent() {
        let registry = Registry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        registry.register("a", counting(&counter)).unwrap();
        registry.register("b", counting(&counter)).unwrap();

        assert_eq!(registry.eager_load_all().unwrap().len(), 2);
        assert!(registry.eager_load_all().unwrap().is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(registry.cached_count(), 2);
    }
}
