//! # scopewire
//!
//! Type-safe dependency injection for Rust with singleton, scoped and
//! transient lifetimes, execution-context scopes and call interception.
//!
//! ## Features
//!
//! - **Declared dependencies**: each type lists its constructor dependencies as a tuple
//! - **Lifetimes**: Singleton, Scoped, and Transient services
//! - **Trait bindings**: resolve `dyn Trait` keys bound to an implementation
//! - **Context-local scopes**: the active scope follows the thread (or tokio task)
//! - **Interception**: wrap freshly built instances with decorators and call hooks
//! - **Circular dependency detection**: fails with the full resolution path
//!
//! ## Quick Start
//!
//! ```rust
//! use scopewire::{ConstructError, Injectable, Resolver, ServiceCollection};
//! use std::sync::Arc;
//!
//! // Define your services
//! struct Database {
//!     connection_string: String,
//! }
//!
//! impl Injectable for Database {
//!     type Deps = ();
//!     fn construct(_: ()) -> Result<Self, ConstructError> {
//!         Ok(Database { connection_string: "postgres://localhost".to_string() })
//!     }
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for UserService {
//!     type Deps = (Arc<Database>,);
//!     fn construct((db,): Self::Deps) -> Result<Self, ConstructError> {
//!         Ok(UserService { db })
//!     }
//! }
//!
//! // Register services
//! let mut services = ServiceCollection::new();
//! services.add_singleton::<Database>();
//! services.add_transient::<UserService>();
//!
//! // Build and use the service provider
//! let provider = services.build();
//! let user_service = provider.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: Created once and shared across the entire provider
//! - **Scoped**: Created once per scope (ideal for request contexts)
//! - **Transient**: Created fresh on every resolution
//!
//! ## Trait Resolution
//!
//! ```rust
//! use scopewire::{ConstructError, Injectable, Resolver, ServiceCollection};
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str) -> String;
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) -> String {
//!         format!("[LOG] {}", message)
//!     }
//! }
//! impl Injectable for ConsoleLogger {
//!     type Deps = ();
//!     fn construct(_: ()) -> Result<Self, ConstructError> { Ok(ConsoleLogger) }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.bind_singleton::<dyn Logger, ConsoleLogger, _>(|l| l);
//!
//! let provider = services.build();
//! let logger = provider.get_required::<dyn Logger>();
//! assert_eq!(logger.log("Hello, World!"), "[LOG] Hello, World!");
//! ```
//!
//! ## Scoped Services
//!
//! ```rust
//! use scopewire::{DiError, Lifetime, Resolver, ServiceCollection};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! struct RequestId(usize);
//!
//! let counter = Arc::new(AtomicUsize::new(0));
//! let counter_clone = counter.clone();
//!
//! let mut services = ServiceCollection::new();
//! services.register_factory(Lifetime::Scoped, move |_| {
//!     Ok(RequestId(counter_clone.fetch_add(1, Ordering::SeqCst) + 1))
//! });
//!
//! let provider = services.build();
//! {
//!     let _scope = provider.create_scope();
//!     let a = provider.get_required::<RequestId>();
//!     let b = provider.get_required::<RequestId>();
//!     assert_eq!((a.0, b.0), (1, 1));
//! }
//! {
//!     let _scope = provider.create_scope();
//!     assert_eq!(provider.get_required::<RequestId>().0, 2);
//! }
//!
//! // No scope is active anymore
//! assert!(matches!(provider.get::<RequestId>(), Err(DiError::NoActiveScope(_))));
//! ```
//!
//! ## Cargo features
//!
//! - `async`: [`ServiceProvider::scope_async`] with tokio task-local scopes
//! - `ahash`: faster hashing for the binding registry
//! - `diagnostics`: `ServiceProvider::to_debug_string`

// Module declarations
pub mod collection;
pub mod descriptors;
pub mod error;
pub mod injectable;
pub mod interception;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod options;
pub mod provider;
pub mod traits;
pub mod validation;

// Internal modules
mod internal;
mod registration;

// Re-export core types
pub use collection::{ServiceCollection, ServiceModule};
pub use descriptors::ServiceDescriptor;
pub use error::{ConstructError, DiError, DiResult};
pub use injectable::{Dependencies, Dependency, DependencyInfo, Injectable};
pub use interception::{AfterCallback, BeforeCallback, Interceptor, InterceptorBuilder, Invocation};
pub use key::{key_of_type, Key};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, LoggingObserver};
pub use options::ContainerOptions;
pub use provider::{ResolverContext, Scope, ScopeGuard, ScopeId, ServiceProvider};
pub use traits::{Resolver, ResolverCore};
pub use validation::{ValidationError, ValidationReport, ValidationWarning};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    static BUILT: AtomicUsize = AtomicUsize::new(0);

    struct Counted(usize);
    impl Injectable for Counted {
        type Deps = ();
        fn construct(_: ()) -> Result<Self, ConstructError> {
            Ok(Counted(BUILT.fetch_add(1, Ordering::SeqCst)))
        }
    }

    #[test]
    fn test_singleton_resolution() {
        let mut sc = ServiceCollection::new();
        sc.add_instance(42usize);

        let sp = sc.build();
        let a = sp.get_required::<usize>();
        let b = sp.get_required::<usize>();

        assert_eq!(*a, 42);
        assert!(Arc::ptr_eq(&a, &b)); // Same instance
    }

    #[test]
    fn test_transient_resolution() {
        let mut sc = ServiceCollection::new();
        sc.add_transient::<Counted>();

        let sp = sc.build();
        let a = sp.get_required::<Counted>();
        let b = sp.get_required::<Counted>();

        assert_ne!(a.0, b.0);
        assert!(!Arc::ptr_eq(&a, &b)); // Different instances
    }

    #[test]
    fn test_scoped_resolution() {
        let mut sc = ServiceCollection::new();
        sc.add_scoped::<Counted>();

        let sp = sc.build();

        // Same scope should have same instance
        let scope1 = sp.new_scope();
        let s1a = scope1.get_required::<Counted>();
        let s1b = scope1.get_required::<Counted>();
        assert!(Arc::ptr_eq(&s1a, &s1b));

        // Different scope should have different instance
        let scope2 = sp.new_scope();
        let s2 = scope2.get_required::<Counted>();
        assert!(!Arc::ptr_eq(&s1a, &s2));
    }

    #[test]
    fn test_unregistered_type() {
        let sp = ServiceCollection::new().build();
        assert!(matches!(sp.get::<Counted>(), Err(DiError::NotFound(_))));
    }
}
