//! # Wiring Container Usage Guide
//!
//! ## Keys
//!
//! Every component lives under a dot-separated key. The final segment is the
//! name a dependent sees when it does not rename the dependency:
//!
//! ```rust
//! use wiring_di::Key;
//!
//! let key = Key::parse("emails.welcome.operations.send").unwrap();
//! assert_eq!(key.last_segment(), "send");
//! assert_eq!(key.namespace(), Some("emails.welcome.operations"));
//!
//! // Path convention for tooling that maps files to components
//! let key = Key::from_relative_path("emails/welcome/operations/send.rs").unwrap();
//! assert_eq!(key.as_str(), "emails.welcome.operations.send");
//! ```
//!
//! ## Declaring Dependencies
//!
//! A component declares what it needs and receives an [`Injected`] accessor
//! set in its factory:
//!
//! ```rust
//! use std::sync::Arc;
//! use wiring_di::{Declaration, Registry};
//!
//! struct Settings {
//!     email_sending_enabled: bool,
//! }
//!
//! struct Client;
//!
//! struct SendWelcome {
//!     settings: Arc<Settings>,
//!     client: Arc<Client>,
//! }
//!
//! let registry = Registry::new();
//! registry.register("settings", || Ok(Settings { email_sending_enabled: true })).unwrap();
//! registry.register("client", || Ok(Client)).unwrap();
//! registry
//!     .register_with_deps(
//!         "emails.welcome.operations.send",
//!         Declaration::from_keys(["settings", "client"]).unwrap(),
//!         |deps| {
//!             Ok(SendWelcome {
//!                 settings: deps.get("settings")?,
//!                 client: deps.get("client")?,
//!             })
//!         },
//!     )
//!     .unwrap();
//!
//! let op = registry
//!     .resolve_as::<SendWelcome>("emails.welcome.operations.send")
//!     .unwrap();
//! assert!(op.settings.email_sending_enabled);
//! ```
//!
//! ## Overrides in Tests
//!
//! Any subset of a declaration can be replaced while the rest resolves
//! normally. Overrides are used as-is and are not checked against the shape
//! of the registered component:
//!
//! ```rust
//! use wiring_di::{Declaration, Overrides, Registry};
//!
//! let registry = Registry::new();
//! registry.register_instance("settings", true).unwrap();
//! registry.register_instance("client", "smtp").unwrap();
//!
//! let declaration = Declaration::from_keys(["settings", "client"]).unwrap();
//! let deps = declaration
//!     .construct(&registry, &Overrides::new().with("client", "mock"))
//!     .unwrap();
//!
//! assert_eq!(*deps.get::<&str>("client").unwrap(), "mock");
//! assert!(*deps.get::<bool>("settings").unwrap());
//! ```
//!
//! ## Lifecycle Modes
//!
//! ```rust
//! use wiring_di::{ContainerBuilder, LifecycleMode, LifecycleState};
//!
//! let container = ContainerBuilder::new()
//!     .mode(LifecycleMode::Eager)
//!     .register("settings", || Ok(42u32))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(container.state(), LifecycleState::Booted);
//! assert!(container.registry().is_cached("settings"));
//! ```
//!
//! - `Lazy` (prepared): components are produced on first resolution.
//! - `Eager` (booted): every singleton is produced at build time, in
//!   dependency order, and providers are started.
//!
//! ## Best Practices
//!
//! 1. **Finish registration before serving**; the container closes
//!    registration when it is built
//! 2. **Keep factories free of container access**; declare dependencies
//!    instead so cycles are caught and no lock is held across resolutions
//! 3. **Use eager mode in servers** so a broken graph fails startup
//! 4. **Use overrides, not re-registration,** to substitute test doubles
//!
//! [`Injected`]: crate::Injected
