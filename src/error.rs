//! Error types for service resolution

use thiserror::Error;

/// Errors that can occur while registering or resolving services
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// A declared dependency or explicit override names a class the catalog does not know
    #[error("Class {class} not found")]
    ClassNotFound { class: String },

    /// No registered service implements the requested interface
    #[error("Missing class implementing {interface} interface")]
    MissingImplementation { interface: String },

    /// The service was never registered in a container, or its container was dropped
    #[error("Container not set")]
    MissingContainer,

    /// A service depends on itself, directly or through other services
    #[error("Circular dependency detected while resolving: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    /// Lookup of an identifier that has no registered service
    #[error("Service not found: {id}")]
    ServiceNotFound { id: String },

    /// A scalar or untyped parameter has neither an explicit value nor a default
    #[error("Missing argument ${parameter} for {class}")]
    MissingArgument { class: String, parameter: String },

    /// An argument has the wrong shape for its parameter
    #[error("Invalid argument ${parameter} for {class}: {reason}")]
    InvalidArgument {
        class: String,
        parameter: String,
        reason: String,
    },

    /// A resolved instance is not of the requested Rust type
    #[error("Service {id} is not a {expected}")]
    TypeMismatch { id: String, expected: &'static str },

    /// The class constructor rejected its arguments
    #[error("Failed to create service {class}: {reason}")]
    CreationFailed { class: String, reason: String },

    /// Container is locked and cannot register new services
    #[error("Container is locked - cannot register new services")]
    Locked,
}

impl DiError {
    /// Create a ClassNotFound error
    #[inline]
    pub fn class_not_found(class: impl Into<String>) -> Self {
        Self::ClassNotFound {
            class: class.into(),
        }
    }

    /// Create a MissingImplementation error
    #[inline]
    pub fn missing_implementation(interface: impl Into<String>) -> Self {
        Self::MissingImplementation {
            interface: interface.into(),
        }
    }

    /// Create a ServiceNotFound error
    #[inline]
    pub fn service_not_found(id: impl Into<String>) -> Self {
        Self::ServiceNotFound { id: id.into() }
    }

    /// Create a MissingArgument error
    #[inline]
    pub fn missing_argument(class: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::MissingArgument {
            class: class.into(),
            parameter: parameter.into(),
        }
    }

    /// Create an InvalidArgument error
    #[inline]
    pub fn invalid_argument(
        class: impl Into<String>,
        parameter: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            class: class.into(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a TypeMismatch error for a type
    #[inline]
    pub fn type_mismatch<T: ?Sized + 'static>(id: impl Into<String>) -> Self {
        Self::TypeMismatch {
            id: id.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            class: class.into(),
            reason: reason.into(),
        }
    }

    /// True for both "class not found" flavours: unknown class and unimplemented interface
    #[inline]
    pub fn is_class_not_found(&self) -> bool {
        matches!(
            self,
            Self::ClassNotFound { .. } | Self::MissingImplementation { .. }
        )
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, DiError>;
