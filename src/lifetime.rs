//! Service lifetime definitions.

use std::fmt;

/// Service lifetimes controlling instance caching behavior
///
/// The lifetime is attached to each binding and governs caching only; it
/// has no other effect on how an instance is built.
///
/// # Examples
///
/// ```rust
/// use scopewire::{ConstructError, Injectable, Lifetime, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Database;
/// impl Injectable for Database {
///     type Deps = ();
///     fn construct(_: ()) -> Result<Self, ConstructError> { Ok(Database) }
/// }
///
/// struct Repository { db: Arc<Database> }
/// impl Injectable for Repository {
///     type Deps = (Arc<Database>,);
///     fn construct((db,): Self::Deps) -> Result<Self, ConstructError> { Ok(Repository { db }) }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.register_with::<Database>(Lifetime::Singleton);
/// services.register_with::<Repository>(Lifetime::Scoped);
///
/// let provider = services.build();
///
/// let scope1 = provider.create_scope();
/// let repo1a = scope1.get_required::<Repository>();
/// let repo1b = scope1.get_required::<Repository>();
/// assert!(Arc::ptr_eq(&repo1a, &repo1b)); // Same within scope
/// drop(scope1);
///
/// let scope2 = provider.create_scope();
/// let repo2 = scope2.get_required::<Repository>();
/// assert!(!Arc::ptr_eq(&repo1a, &repo2)); // Different across scopes
/// assert!(Arc::ptr_eq(&repo1a.db, &repo2.db)); // Singleton shared
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// Single instance per provider, created on first use and cached forever
    Singleton,
    /// Single instance per scope, cached for the scope's lifetime
    ///
    /// Resolving a scoped service with no active scope is an error; it never
    /// falls back to another lifetime.
    Scoped,
    /// New instance per resolution, never cached
    #[default]
    Transient,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        };
        f.write_str(s)
    }
}
