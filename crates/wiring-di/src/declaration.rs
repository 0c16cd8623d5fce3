//! Dependency declarations and construction
//!
//! A [`Declaration`] is an ordered list of `(local name, key)` pairs. Calling
//! [`Declaration::construct`] wires each pair either from the registry or
//! from a caller-supplied override, producing an [`Injected`] accessor set.
//!
//! ```rust
//! use std::sync::Arc;
//! use wiring_di::{Declaration, Overrides, Registry};
//!
//! let registry = Registry::new();
//! registry.register_instance("settings", 42u32).unwrap();
//! registry.register_instance("clients.smtp", "smtp://localhost").unwrap();
//!
//! let declaration = Declaration::builder()
//!     .key("settings")
//!     .alias("client", "clients.smtp")
//!     .build()
//!     .unwrap();
//!
//! let deps = declaration
//!     .construct(&registry, &Overrides::new().with("client", "mock"))
//!     .unwrap();
//!
//! assert_eq!(*deps.get::<u32>("settings").unwrap(), 42);
//! assert_eq!(*deps.get::<&str>("client").unwrap(), "mock");
//! ```

use std::any::type_name;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{DIError, DIResult};
use crate::key::{is_valid_segment, IntoKey, Key};
use crate::registry::{Instance, Registry, ResolutionPath};

/// One declared dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    local_name: String,
    key: Key,
}

impl Dependency {
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn key(&self) -> &Key {
        &self.key
    }
}

/// Ordered, validated set of `(local name, key)` pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declaration {
    dependencies: Vec<Dependency>,
}

impl Declaration {
    /// A declaration with no dependencies
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start a builder
    pub fn builder() -> DeclarationBuilder {
        DeclarationBuilder::default()
    }

    /// Declare dependencies from explicit `(local name, key)` pairs.
    ///
    /// Fails with [`DIError::DuplicateLocalName`] if a local name repeats.
    pub fn declare<I, N, K>(pairs: I) -> DIResult<Self>
    where
        I: IntoIterator<Item = (N, K)>,
        N: Into<String>,
        K: IntoKey,
    {
        let mut builder = Self::builder();
        for (name, key) in pairs {
            builder = builder.alias(name, key);
        }
        builder.build()
    }

    /// Declare dependencies by key only; each local name is the key's final
    /// segment.
    pub fn from_keys<I, K>(keys: I) -> DIResult<Self>
    where
        I: IntoIterator<Item = K>,
        K: IntoKey,
    {
        keys.into_iter()
            .fold(Self::builder(), |builder, key| builder.key(key))
            .build()
    }

    fn from_dependencies(dependencies: Vec<Dependency>) -> DIResult<Self> {
        let mut seen = HashSet::with_capacity(dependencies.len());
        for dependency in &dependencies {
            if !is_valid_segment(&dependency.local_name) {
                return Err(DIError::InvalidLocalName {
                    name: dependency.local_name.clone(),
                });
            }
            if !seen.insert(dependency.local_name.as_str()) {
                return Err(DIError::DuplicateLocalName {
                    name: dependency.local_name.clone(),
                });
            }
        }
        Ok(Self { dependencies })
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Keys in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.dependencies.iter().map(|d| &d.key)
    }

    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|d| d.local_name.as_str())
    }

    /// Key bound to a local name
    pub fn get(&self, local_name: &str) -> Option<&Key> {
        self.dependencies
            .iter()
            .find(|d| d.local_name == local_name)
            .map(|d| &d.key)
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Wire every declared dependency.
    ///
    /// Overridden names take the override value as-is, without a registry
    /// lookup. Everything else is resolved from `registry`. Overrides for
    /// names this declaration does not define are ignored.
    pub fn construct(&self, registry: &Registry, overrides: &Overrides) -> DIResult<Injected> {
        let mut path = ResolutionPath::new();
        self.wire(registry, overrides, &mut path)
    }

    pub(crate) fn wire(
        &self,
        registry: &Registry,
        overrides: &Overrides,
        path: &mut ResolutionPath,
    ) -> DIResult<Injected> {
        if !overrides.is_empty() {
            let ignored: Vec<&str> = overrides
                .names()
                .filter(|name| self.get(name).is_none())
                .collect();
            if !ignored.is_empty() {
                debug!(?ignored, "Ignoring overrides for undeclared dependencies");
            }
        }

        let mut values = Vec::with_capacity(self.dependencies.len());
        for dependency in &self.dependencies {
            let (instance, overridden) = match overrides.get(&dependency.local_name) {
                Some(value) => (Arc::clone(value), true),
                None => (registry.resolve_on_path(&dependency.key, path)?, false),
            };
            values.push(InjectedValue {
                name: dependency.local_name.clone(),
                key: dependency.key.clone(),
                instance,
                overridden,
            });
        }
        Ok(Injected { values })
    }
}

/// Builder for [`Declaration`]
#[derive(Default)]
pub struct DeclarationBuilder {
    dependencies: Vec<Dependency>,
    error: Option<DIError>,
}

impl DeclarationBuilder {
    /// Depend on `key`, exposed under its final segment
    pub fn key(mut self, key: impl IntoKey) -> Self {
        match key.into_key() {
            Ok(key) => {
                let local_name = key.last_segment().to_string();
                self.dependencies.push(Dependency { local_name, key });
            }
            Err(err) => self.record(err),
        }
        self
    }

    /// Depend on `key`, exposed as `local_name`
    pub fn alias(mut self, local_name: impl Into<String>, key: impl IntoKey) -> Self {
        match key.into_key() {
            Ok(key) => self.dependencies.push(Dependency {
                local_name: local_name.into(),
                key,
            }),
            Err(err) => self.record(err),
        }
        self
    }

    fn record(&mut self, err: DIError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Validate and build
    pub fn build(self) -> DIResult<Declaration> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Declaration::from_dependencies(self.dependencies)
    }
}

/// Replacement values keyed by local name
#[derive(Clone, Default)]
pub struct Overrides {
    values: HashMap<String, Instance>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override `name` with `value`
    pub fn with<T: Send + Sync + 'static>(self, name: impl Into<String>, value: T) -> Self {
        self.with_instance(name, Arc::new(value))
    }

    /// Override `name` with an existing shared value
    pub fn with_arc<T: Send + Sync + 'static>(self, name: impl Into<String>, value: Arc<T>) -> Self {
        self.with_instance(name, value)
    }

    /// Override `name` with a type-erased instance
    pub fn with_instance(mut self, name: impl Into<String>, value: Instance) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

#[derive(Clone)]
struct InjectedValue {
    name: String,
    key: Key,
    instance: Instance,
    overridden: bool,
}

/// Read-only accessors produced by [`Declaration::construct`]
#[derive(Clone, Default)]
pub struct Injected {
    values: Vec<InjectedValue>,
}

impl Injected {
    fn find(&self, name: &str) -> DIResult<&InjectedValue> {
        self.values
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| DIError::MissingDependency {
                name: name.to_string(),
            })
    }

    /// Typed accessor
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> DIResult<Arc<T>> {
        let value = self.find(name)?;
        Arc::clone(&value.instance)
            .downcast::<T>()
            .map_err(|_| DIError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Type-erased accessor
    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.values
            .iter()
            .find(|v| v.name == name)
            .map(|v| &v.instance)
    }

    /// Key the local name was declared with
    pub fn key_of(&self, name: &str) -> Option<&Key> {
        self.values.iter().find(|v| v.name == name).map(|v| &v.key)
    }

    /// True if the value came from an override rather than the registry
    pub fn is_overridden(&self, name: &str) -> bool {
        self.values.iter().any(|v| v.name == name && v.overridden)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|v| v.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Instance)> {
        self.values.iter().map(|v| (v.name.as_str(), &v.instance))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Injected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for value in &self.values {
            map.entry(&value.name, &value.key.as_str());
        }
        map.finish()
    }
}

/// A component that declares its own dependencies and builds itself from
/// them.
pub trait Injectable: Sized + Send + Sync + 'static {
    fn dependencies() -> DIResult<Declaration>;

    fn inject(deps: &Injected) -> anyhow::Result<Self>;
}

/// Build an [`Injectable`] outside the registry, with optional overrides
pub fn construct_injectable<T: Injectable>(registry: &Registry, overrides: &Overrides) -> DIResult<T> {
    let deps = T::dependencies()?.construct(registry, overrides)?;
    T::inject(&deps).map_err(|source| DIError::factory(type_name::<T>(), source))
}
