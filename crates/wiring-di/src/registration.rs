//! Auto-discovered component registration using the inventory crate
//!
//! Instead of scanning a source tree, each crate submits its registrations
//! at link time and the container collects them when it is built.
//!
//! ## Usage
//!
//! In a component crate:
//!
//! ```rust,ignore
//! use wiring_di::{ComponentRegistration, Registry, DIResult};
//!
//! fn register_mail(registry: &Registry) -> DIResult<()> {
//!     registry.register("mail.sender", || Ok(SmtpSender::connect()?))?;
//!     Ok(())
//! }
//!
//! inventory::submit! {
//!     ComponentRegistration::new("mail", register_mail)
//! }
//! ```
//!
//! At startup:
//!
//! ```rust,ignore
//! let registry = Registry::new();
//! wiring_di::registration::register_all_discovered(&registry)?;
//! ```

use crate::{DIResult, Registry};
use tracing::{debug, info};

/// A registration entry collected via inventory.
pub struct ComponentRegistration {
    /// Name of the component group (e.g. "mail", "storage")
    pub name: &'static str,

    /// Registers the group's components
    pub register_fn: fn(&Registry) -> DIResult<()>,

    /// Registration order (lower = earlier, default = 100)
    pub priority: u32,
}

impl ComponentRegistration {
    /// Create a new registration with default priority
    pub const fn new(name: &'static str, register_fn: fn(&Registry) -> DIResult<()>) -> Self {
        Self {
            name,
            register_fn,
            priority: 100,
        }
    }

    /// Create a new registration with custom priority
    pub const fn with_priority(
        name: &'static str,
        register_fn: fn(&Registry) -> DIResult<()>,
        priority: u32,
    ) -> Self {
        Self {
            name,
            register_fn,
            priority,
        }
    }
}

inventory::collect!(ComponentRegistration);

fn sorted_registrations() -> Vec<&'static ComponentRegistration> {
    let mut registrations: Vec<&ComponentRegistration> =
        inventory::iter::<ComponentRegistration>().collect();
    // Submission order across crates is unspecified; sort by name within a
    // priority so registration is deterministic.
    registrations.sort_by_key(|r| (r.priority, r.name));
    registrations
}

/// Run every discovered registration against `registry`, in priority order.
pub fn register_all_discovered(registry: &Registry) -> DIResult<()> {
    let registrations = sorted_registrations();

    info!(
        "Discovered {} component registrations via inventory",
        registrations.len()
    );

    for registration in registrations {
        debug!(
            "Registering components for '{}' (priority: {})",
            registration.name, registration.priority
        );
        (registration.register_fn)(registry)?;
    }
    Ok(())
}

/// Number of discovered registrations
pub fn discovered_registration_count() -> usize {
    inventory::iter::<ComponentRegistration>().count()
}

/// Names of discovered registrations, in the order they would run
pub fn list_discovered_registrations() -> Vec<&'static str> {
    sorted_registrations().into_iter().map(|r| r.name).collect()
}
