//! Error types for the dependency injection container.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Error returned by [`Injectable::construct`](crate::Injectable::construct).
pub type ConstructError = Box<dyn Error + Send + Sync + 'static>;

/// Dependency injection errors
///
/// Every failure that can happen while resolving a service surfaces as one
/// of these variants. Errors raised by a nested resolution are returned to
/// the top-level caller exactly as they were produced; the resolver never
/// wraps or downgrades them.
///
/// # Examples
///
/// ```rust
/// use scopewire::{DiError, ServiceCollection, Resolver};
///
/// struct Unregistered;
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<Unregistered>() {
///     Err(DiError::NotFound(type_name)) => {
///         assert!(type_name.ends_with("Unregistered"));
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use scopewire::DiError;
///
/// let circular = DiError::Circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
/// assert_eq!(circular.to_string(), "Circular dependency: ServiceA -> ServiceB -> ServiceA");
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// Service not registered
    NotFound(&'static str),
    /// Scoped service requested while no scope is active for this context
    NoActiveScope(&'static str),
    /// Circular dependency detected (includes path)
    Circular(Vec<&'static str>),
    /// Maximum recursion depth exceeded
    DepthExceeded(usize),
    /// Type downcast failed
    TypeMismatch(&'static str),
    /// A constructor returned an error; carried unchanged
    Construction(Arc<dyn Error + Send + Sync + 'static>),
}

impl DiError {
    /// Wraps a constructor failure.
    pub fn construction(err: impl Into<ConstructError>) -> Self {
        DiError::Construction(Arc::from(err.into()))
    }

    /// Returns the constructor error, if this is a construction failure.
    pub fn construction_error(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            DiError::Construction(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::NotFound(name) => write!(f, "Service not found: {}", name),
            DiError::NoActiveScope(name) => {
                write!(f, "Cannot resolve scoped service {} outside of a scope", name)
            }
            DiError::Circular(path) => {
                write!(f, "Circular dependency: {}", path.join(" -> "))
            }
            DiError::DepthExceeded(depth) => write!(f, "Max depth {} exceeded", depth),
            DiError::TypeMismatch(name) => write!(f, "Type mismatch for: {}", name),
            DiError::Construction(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl Error for DiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DiError::Construction(err) => err.source(),
            _ => None,
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
