//! Service providers
//!
//! A provider groups the registrations of one concern (a mailer, a database
//! pool, ...) and optionally hooks into the container lifecycle.
//!
//! ```rust
//! use wiring_di::{DIResult, Registry, ServiceProvider};
//!
//! pub struct MailProvider;
//!
//! impl ServiceProvider for MailProvider {
//!     fn name(&self) -> &'static str {
//!         "mail"
//!     }
//!
//!     fn register(&self, registry: &Registry) -> DIResult<()> {
//!         registry.register_instance("mail.sender", "noreply@example.com")?;
//!         Ok(())
//!     }
//! }
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{DIError, DIResult};
use crate::registry::Registry;

// ============================================================================
// ServiceProvider Trait
// ============================================================================

/// A group of registrations with optional start/stop hooks
pub trait ServiceProvider: Send + Sync {
    /// Returns the name of this service provider.
    ///
    /// Used for logging and error reporting.
    fn name(&self) -> &'static str;

    /// Lower values are registered and started first. Default is 100.
    fn priority(&self) -> u32 {
        100
    }

    /// Register components. Runs while the registry is still open.
    fn register(&self, registry: &Registry) -> DIResult<()>;

    /// Called when the container boots, after eager loading.
    #[allow(unused_variables)]
    fn start(&self, registry: &Registry) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called on shutdown, in reverse start order.
    #[allow(unused_variables)]
    fn stop(&self, registry: &Registry) -> anyhow::Result<()> {
        Ok(())
    }
}

// ============================================================================
// ServiceProviderRegistry
// ============================================================================

/// Ordered collection of providers
#[derive(Default, Clone)]
pub struct ServiceProviderRegistry {
    providers: Vec<Arc<dyn ServiceProvider>>,
}

impl ServiceProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service provider to the registry.
    pub fn add<P: ServiceProvider + 'static>(&mut self, provider: P) -> &mut Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Add a shared service provider to the registry.
    pub fn add_shared(&mut self, provider: Arc<dyn ServiceProvider>) -> &mut Self {
        self.providers.push(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in priority order
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.sorted().iter().map(|p| p.name()).collect()
    }

    /// Stable sort: equal priorities keep insertion order
    fn sorted(&self) -> Vec<&Arc<dyn ServiceProvider>> {
        let mut sorted: Vec<_> = self.providers.iter().collect();
        sorted.sort_by_key(|p| p.priority());
        sorted
    }

    /// Run every provider's `register` hook in priority order
    pub fn register_all(&self, registry: &Registry) -> DIResult<()> {
        let sorted = self.sorted();
        info!("Registering {} service providers", sorted.len());

        for provider in sorted {
            debug!(
                "Registering provider '{}' (priority: {})",
                provider.name(),
                provider.priority()
            );
            provider.register(registry)?;
        }
        Ok(())
    }

    /// Run every provider's `start` hook in priority order.
    ///
    /// On the first failure the providers already started are stopped again,
    /// in reverse order, before the start error is returned. Stop failures
    /// during that rollback are logged and do not replace the start error.
    pub fn start_all(&self, registry: &Registry) -> DIResult<()> {
        let sorted = self.sorted();
        for (index, provider) in sorted.iter().enumerate() {
            debug!("Starting provider '{}'", provider.name());
            if let Err(source) = provider.start(registry) {
                for started in sorted[..index].iter().rev() {
                    debug!("Rolling back provider '{}'", started.name());
                    if let Err(err) = started.stop(registry) {
                        warn!("Provider '{}' failed to stop during rollback: {:#}", started.name(), err);
                    }
                }
                return Err(DIError::Provider {
                    provider: provider.name(),
                    source,
                });
            }
        }
        Ok(())
    }

    /// Run every provider's `stop` hook in reverse priority order.
    ///
    /// All hooks run; the first failure is returned.
    pub fn stop_all(&self, registry: &Registry) -> DIResult<()> {
        let mut first_error = None;
        for provider in self.sorted().into_iter().rev() {
            debug!("Stopping provider '{}'", provider.name());
            if let Err(source) = provider.stop(registry) {
                first_error.get_or_insert(DIError::Provider {
                    provider: provider.name(),
                    source,
                });
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
