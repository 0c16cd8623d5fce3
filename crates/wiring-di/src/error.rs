//! Container error types

use thiserror::Error;

use crate::key::Key;

/// Errors that can occur during registration, declaration and resolution
#[derive(Debug, Error)]
pub enum DIError {
    /// Two factories registered under the same key
    #[error("Component already registered: {key}")]
    DuplicateKey { key: Key },

    /// Key was never registered
    #[error("Component not registered: {key}")]
    UnknownKey { key: Key },

    /// Key is already in progress on the current resolution path
    #[error("Cyclic dependency detected: {}", format_path(.path))]
    CyclicDependency { path: Vec<Key> },

    /// Two dependencies map to the same local name
    #[error("Duplicate local name in dependency declaration: {name}")]
    DuplicateLocalName { name: String },

    /// A factory failed while producing its instance
    #[error("Factory for {component} failed: {source}")]
    Factory {
        component: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Invalid local name: '{name}'")]
    InvalidLocalName { name: String },

    #[error("Type mismatch for {name}: expected {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("No dependency named '{name}'")]
    MissingDependency { name: String },

    #[error("Registration is closed, cannot register {key}")]
    RegistrationClosed { key: Key },

    #[error("Container has been shut down")]
    ContainerShutDown,

    #[error("Provider {provider} failed: {source}")]
    Provider {
        provider: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

pub type DIResult<T> = Result<T, DIError>;

impl DIError {
    /// Wrap a factory failure
    pub fn factory<S: Into<String>>(component: S, source: anyhow::Error) -> Self {
        Self::Factory {
            component: component.into(),
            source,
        }
    }

    /// True for errors caused by the shape of the dependency graph
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            DIError::UnknownKey { .. } | DIError::CyclicDependency { .. }
        )
    }
}

fn format_path(path: &[Key]) -> String {
    path.iter()
        .map(Key::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
