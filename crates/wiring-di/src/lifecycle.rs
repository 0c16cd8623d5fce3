//! Container lifecycle
//!
//! A [`Container`] is built once from a [`ContainerBuilder`]. Building runs
//! every registration source and closes the registry (`Prepared`). In
//! [`LifecycleMode::Eager`] the container then boots immediately, producing
//! every singleton in dependency order and starting providers (`Booted`). In
//! [`LifecycleMode::Lazy`] components are produced on first resolution and
//! [`Container::boot`] may still be called explicitly later.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tracing::info;
use wiring_config::{ContainerSettings, LifecycleMode};

use crate::declaration::{construct_injectable, Declaration, Injectable, Injected, Overrides};
use crate::error::{DIError, DIResult};
use crate::key::IntoKey;
use crate::provider::{ServiceProvider, ServiceProviderRegistry};
use crate::registration::register_all_discovered;
use crate::registry::{Instance, Registry};

/// Where a container is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Registration closed, components produced on demand
    Prepared,
    /// Every singleton produced and providers started
    Booted,
    /// Providers stopped; resolution is refused
    ShutDown,
}

/// Builder pattern for configuring the container
pub struct ContainerBuilder {
    registry: Registry,
    providers: ServiceProviderRegistry,
    mode: LifecycleMode,
    discover: bool,
}

impl ContainerBuilder {
    /// Create a new container builder (lazy mode)
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            providers: ServiceProviderRegistry::new(),
            mode: LifecycleMode::default(),
            discover: false,
        }
    }

    pub fn mode(mut self, mode: LifecycleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Take the lifecycle mode from loaded settings
    pub fn with_settings(self, settings: &ContainerSettings) -> Self {
        self.mode(settings.mode)
    }

    /// Add a service provider
    pub fn provider<P: ServiceProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.add(provider);
        self
    }

    /// Include registrations submitted through `inventory`
    pub fn discover(mut self) -> Self {
        self.discover = true;
        self
    }

    /// Register a factory with no dependencies
    pub fn register<K, T, F>(self, key: K, factory: F) -> DIResult<Self>
    where
        K: IntoKey,
        T: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.registry.register(key, factory)?;
        Ok(self)
    }

    /// Register a factory with declared dependencies
    pub fn register_with_deps<K, T, F>(self, key: K, declaration: Declaration, factory: F) -> DIResult<Self>
    where
        K: IntoKey,
        T: Send + Sync + 'static,
        F: Fn(&Injected) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.registry.register_with_deps(key, declaration, factory)?;
        Ok(self)
    }

    /// Register an already-built value
    pub fn register_instance<K, T>(self, key: K, value: T) -> DIResult<Self>
    where
        K: IntoKey,
        T: Send + Sync + 'static,
    {
        self.registry.register_instance(key, value)?;
        Ok(self)
    }

    /// Registry being populated, for registration styles not covered above
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run all registration sources, close registration and, in eager mode,
    /// boot.
    pub fn build(self) -> DIResult<Container> {
        if self.discover {
            register_all_discovered(&self.registry)?;
        }
        self.providers.register_all(&self.registry)?;
        self.registry.freeze();

        let container = Container {
            registry: Arc::new(self.registry),
            providers: self.providers,
            mode: self.mode,
            state: RwLock::new(LifecycleState::Prepared),
            transition: Mutex::new(()),
        };
        info!(
            "Container prepared: {} components, mode {}",
            container.registry.len(),
            container.mode
        );

        if container.mode == LifecycleMode::Eager {
            container.boot()?;
        }
        Ok(container)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Explicit container handle: a closed registry plus its providers
pub struct Container {
    registry: Arc<Registry>,
    providers: ServiceProviderRegistry,
    mode: LifecycleMode,
    state: RwLock<LifecycleState>,
    // Serializes boot and shutdown
    transition: Mutex<()>,
}

impl Container {
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn mode(&self) -> LifecycleMode {
        self.mode
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Shared handle to the registry
    pub fn registry_handle(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.provider_names()
    }

    fn ensure_live(&self) -> DIResult<()> {
        if self.state() == LifecycleState::ShutDown {
            return Err(DIError::ContainerShutDown);
        }
        Ok(())
    }

    pub fn resolve(&self, key: impl AsRef<str>) -> DIResult<Instance> {
        self.ensure_live()?;
        self.registry.resolve(key)
    }

    pub fn resolve_as<T: Send + Sync + 'static>(&self, key: impl AsRef<str>) -> DIResult<Arc<T>> {
        self.ensure_live()?;
        self.registry.resolve_as(key)
    }

    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.registry.contains(key)
    }

    /// Wire a declaration against this container
    pub fn construct(&self, declaration: &Declaration, overrides: &Overrides) -> DIResult<Injected> {
        self.ensure_live()?;
        declaration.construct(&self.registry, overrides)
    }

    /// Build an [`Injectable`] from this container
    pub fn construct_injectable<T: Injectable>(&self, overrides: &Overrides) -> DIResult<T> {
        self.ensure_live()?;
        construct_injectable(&self.registry, overrides)
    }

    /// Produce every singleton and start providers. Idempotent once booted.
    ///
    /// On failure the remaining sequence is abandoned, providers that had
    /// already started are stopped again and the container stays `Prepared`.
    pub fn boot(&self) -> DIResult<()> {
        let _transition = self.transition.lock();
        match self.state() {
            LifecycleState::Booted => return Ok(()),
            LifecycleState::ShutDown => return Err(DIError::ContainerShutDown),
            LifecycleState::Prepared => {}
        }

        let started = Instant::now();
        let produced = self.registry.eager_load_all()?;
        self.providers.start_all(&self.registry)?;
        *self.state.write() = LifecycleState::Booted;

        info!(
            "Container booted: {} components produced in {:?}",
            produced.len(),
            started.elapsed()
        );
        Ok(())
    }

    /// Stop providers (if booted) and refuse further resolution.
    ///
    /// Every stop hook runs; the first failure is returned.
    pub fn shutdown(&self) -> DIResult<()> {
        let _transition = self.transition.lock();
        let previous = self.state();
        if previous == LifecycleState::ShutDown {
            return Ok(());
        }

        *self.state.write() = LifecycleState::ShutDown;
        info!("Container shutting down");
        if previous == LifecycleState::Booted {
            self.providers.stop_all(&self.registry)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("mode", &self.mode)
            .field("state", &self.state())
            .field("components", &self.registry.len())
            .finish()
    }
}
