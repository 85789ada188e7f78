//! Service descriptors for introspection and diagnostics.

use crate::injectable::DependencyInfo;
use crate::key::Key;
use crate::lifetime::Lifetime;

/// Service descriptor for introspection and diagnostics
///
/// Snapshot of one binding, as returned by
/// [`ServiceCollection::get_service_descriptors`](crate::ServiceCollection::get_service_descriptors).
///
/// # Examples
///
/// ```rust
/// use scopewire::{ConstructError, Injectable, Lifetime, ServiceCollection};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {}
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {}
/// impl Injectable for ConsoleLogger {
///     type Deps = ();
///     fn construct(_: ()) -> Result<Self, ConstructError> { Ok(ConsoleLogger) }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.bind_singleton::<dyn Logger, ConsoleLogger, _>(|l| l);
/// services.add_instance(42u32);
///
/// let descriptors = services.get_service_descriptors();
/// let logger = descriptors.iter().find(|d| d.type_name().contains("Logger")).unwrap();
/// assert_eq!(logger.lifetime, Lifetime::Singleton);
/// assert!(logger.impl_type_name.ends_with("ConsoleLogger"));
/// assert!(logger.is_trait_binding());
///
/// let number = descriptors.iter().find(|d| d.type_name() == "u32").unwrap();
/// assert!(!number.is_trait_binding());
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// The key the binding is registered under
    pub key: Key,
    /// Service lifetime
    pub lifetime: Lifetime,
    /// Implementation type name
    pub impl_type_name: &'static str,
    /// Declared constructor dependencies, in order
    pub dependencies: Vec<DependencyInfo>,
    /// Number of interceptor factories applied to new instances
    pub interceptors: usize,
}

impl ServiceDescriptor {
    /// Get the type/trait name of the key
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    /// Whether the key differs from the implementation type.
    pub fn is_trait_binding(&self) -> bool {
        self.key.display_name() != self.impl_type_name
    }

    /// Whether `T` is among the declared dependencies.
    pub fn depends_on<T: ?Sized + 'static>(&self) -> bool {
        let key = Key::of::<T>();
        self.dependencies.iter().any(|d| d.key == key)
    }

    /// Whether any interceptor applies to this binding.
    pub fn is_intercepted(&self) -> bool {
        self.interceptors > 0
    }
}
