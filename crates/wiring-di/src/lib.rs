//! Keyed dependency injection container
//!
//! Components are registered under dot-separated string keys
//! (`emails.welcome.operations.send`), produced by factories, cached per key
//! and wired into each other through explicit dependency declarations.
//!
//! ## Quick Start
//!
//! ```rust
//! use wiring_di::{Declaration, Overrides, Registry};
//!
//! struct Settings {
//!     email_sending_enabled: bool,
//! }
//!
//! let registry = Registry::new();
//! registry
//!     .register("settings", || Ok(Settings { email_sending_enabled: true }))
//!     .unwrap();
//!
//! let deps = Declaration::from_keys(["settings"])
//!     .unwrap()
//!     .construct(&registry, &Overrides::new())
//!     .unwrap();
//!
//! assert!(deps.get::<Settings>("settings").unwrap().email_sending_enabled);
//! ```
//!
//! See [`usage`] module for detailed usage examples.

pub mod declaration;
pub mod error;
pub mod key;
pub mod lifecycle;
pub mod provider;
pub mod registration;
pub mod registry;
pub mod usage;

pub use declaration::{
    construct_injectable, Declaration, DeclarationBuilder, Dependency, Injectable, Injected,
    Overrides,
};
pub use error::{DIError, DIResult};
pub use key::{IntoKey, Key};
pub use lifecycle::{Container, ContainerBuilder, LifecycleState};
pub use provider::{ServiceProvider, ServiceProviderRegistry};
pub use registration::ComponentRegistration;
pub use registry::{ComponentLifetime, Instance, Registry};
pub use wiring_config::LifecycleMode;

// Re-exported so component crates can submit registrations without a direct
// inventory dependency.
pub use inventory;

/// Convenience macro for submitting a discoverable registration
#[macro_export]
macro_rules! submit_components {
    ($name:expr, $register_fn:expr) => {
        $crate::inventory::submit! {
            $crate::ComponentRegistration::new($name, $register_fn)
        }
    };
    ($name:expr, $register_fn:expr, priority = $priority:expr) => {
        $crate::inventory::submit! {
            $crate::ComponentRegistration::with_priority($name, $register_fn, $priority)
        }
    };
}

/// Convenience macro for resolving a typed component
#[macro_export]
macro_rules! resolve_component {
    ($registry:expr, $key:expr, $component_type:ty) => {
        $registry.resolve_as::<$component_type>($key)
    };
}
