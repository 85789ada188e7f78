//! Constructor metadata: how a type declares and receives its dependencies.
//!
//! Rust has no runtime view of constructor parameters, so every injectable
//! type states its dependency list at compile time as a tuple. The tuple
//! order is the constructor order, and the resolver walks it left to right.

use std::sync::Arc;

use crate::error::{ConstructError, DiResult};
use crate::key::Key;
use crate::provider::ResolverContext;
use crate::traits::{Resolver, ResolverCore};

/// A type the container knows how to build.
///
/// `Deps` lists the dependencies in declaration order. Each element is
/// resolved (including its entire subgraph) before the next one starts, and
/// the finished tuple is handed to [`construct`](Injectable::construct).
///
/// An error returned from `construct` reaches the caller of the top-level
/// resolution unchanged, as [`DiError::Construction`](crate::DiError::Construction).
///
/// # Examples
///
/// ```
/// use scopewire::{ConstructError, Injectable, Lifetime, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct DatabaseConnection { url: String }
///
/// impl Injectable for DatabaseConnection {
///     type Deps = ();
///     fn construct(_: ()) -> Result<Self, ConstructError> {
///         Ok(DatabaseConnection { url: "postgres://localhost".into() })
///     }
/// }
///
/// struct UserRepository { db: Arc<DatabaseConnection> }
///
/// impl Injectable for UserRepository {
///     type Deps = (Arc<DatabaseConnection>,);
///     fn construct((db,): Self::Deps) -> Result<Self, ConstructError> {
///         Ok(UserRepository { db })
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<DatabaseConnection>();
/// services.add_transient::<UserRepository>();
///
/// let provider = services.build();
/// let repo = provider.get_required::<UserRepository>();
/// assert_eq!(repo.db.url, "postgres://localhost");
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Dependencies in constructor order.
    type Deps: Dependencies;

    /// Builds the instance from its resolved dependencies.
    fn construct(deps: Self::Deps) -> Result<Self, ConstructError>;
}

/// Static description of one declared dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyInfo {
    /// Key the dependency is looked up by
    pub key: Key,
    /// Whether a missing registration is tolerated
    pub optional: bool,
}

/// A single constructor argument the container can supply.
///
/// Implemented for `Arc<T>` (required) and `Option<Arc<T>>` (resolved to
/// `None` when `T` has no binding). `T` may be a trait object.
pub trait Dependency: Sized {
    /// Describes what this argument needs.
    fn info() -> DependencyInfo;

    /// Resolves this argument through `resolver`.
    fn resolve_from(resolver: &ResolverContext<'_>) -> DiResult<Self>;
}

impl<T: ?Sized + Send + Sync + 'static> Dependency for Arc<T> {
    fn info() -> DependencyInfo {
        DependencyInfo { key: Key::of::<T>(), optional: false }
    }

    fn resolve_from(resolver: &ResolverContext<'_>) -> DiResult<Self> {
        resolver.get::<T>()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Dependency for Option<Arc<T>> {
    fn info() -> DependencyInfo {
        DependencyInfo { key: Key::of::<T>(), optional: true }
    }

    fn resolve_from(resolver: &ResolverContext<'_>) -> DiResult<Self> {
        // Only a missing binding for T itself maps to None; failures deeper
        // in T's graph still propagate.
        if resolver.is_registered(&Key::of::<T>()) {
            resolver.get::<T>().map(Some)
        } else {
            Ok(None)
        }
    }
}

/// An ordered list of constructor arguments.
///
/// Implemented for `()` and for tuples of up to twelve [`Dependency`]
/// elements.
pub trait Dependencies: Sized {
    /// Argument descriptions in declaration order.
    fn describe() -> Vec<DependencyInfo>;

    /// Resolves every argument, left to right.
    fn resolve_all(resolver: &ResolverContext<'_>) -> DiResult<Self>;

    /// Keys in declaration order.
    fn keys() -> Vec<Key> {
        Self::describe().into_iter().map(|d| d.key).collect()
    }
}

impl Dependencies for () {
    fn describe() -> Vec<DependencyInfo> {
        Vec::new()
    }

    fn resolve_all(_resolver: &ResolverContext<'_>) -> DiResult<Self> {
        Ok(())
    }
}

macro_rules! impl_dependencies {
    ($($name:ident),+) => {
        impl<$($name: Dependency),+> Dependencies for ($($name,)+) {
            fn describe() -> Vec<DependencyInfo> {
                vec![$($name::info()),+]
            }

            // Tuple operands are evaluated left to right, so each
            // dependency finishes before the next one starts.
            fn resolve_all(resolver: &ResolverContext<'_>) -> DiResult<Self> {
                Ok(($($name::resolve_from(resolver)?,)+))
            }
        }
    };
}

impl_dependencies!(A);
impl_dependencies!(A, B);
impl_dependencies!(A, B, C);
impl_dependencies!(A, B, C, D);
impl_dependencies!(A, B, C, D, E);
impl_dependencies!(A, B, C, D, E, F);
impl_dependencies!(A, B, C, D, E, F, G);
impl_dependencies!(A, B, C, D, E, F, G, H);
impl_dependencies!(A, B, C, D, E, F, G, H, I);
impl_dependencies!(A, B, C, D, E, F, G, H, I, J);
impl_dependencies!(A, B, C, D, E, F, G, H, I, J, K);
impl_dependencies!(A, B, C, D, E, F, G, H, I, J, K, L);

#[cfg(test)]
mod tests {
    use super::*;

    trait Clock: Send + Sync {}

    #[test]
    fn describe_keeps_declaration_order() {
        type Deps = (Arc<u8>, Option<Arc<dyn Clock>>, Arc<String>);
        let info = <Deps as Dependencies>::describe();
        assert_eq!(info.len(), 3);
        assert_eq!(info[0].key, Key::of::<u8>());
        assert_eq!(info[1].key, Key::of::<dyn Clock>());
        assert!(info[1].optional);
        assert!(!info[2].optional);
        assert_eq!(<Deps as Dependencies>::keys()[2], Key::of::<String>());
    }

    #[test]
    fn unit_has_no_dependencies() {
        assert!(<() as Dependencies>::describe().is_empty());
    }
}
