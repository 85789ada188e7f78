//! Service provider module for dependency injection.
//!
//! This module contains the ServiceProvider type and related functionality
//! for resolving registered services from the DI container.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;

use crate::error::{DiError, DiResult};
use crate::interception::InterceptorRegistry;
use crate::internal::{active_scope, StackGuard};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::observer::Observers;
use crate::options::ContainerOptions;
use crate::registration::{AnyArc, Registration, Registry};
use crate::traits::ResolverCore;

pub mod context;
pub mod scope;
pub use context::ResolverContext;
pub use scope::{Scope, ScopeGuard, ScopeId};

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(1);

/// Service provider for resolving dependencies from the DI container.
///
/// The provider owns the read-only binding registry, the singleton store
/// and the interceptor factories. It resolves services according to their
/// lifetimes:
///
/// - **Singleton**: built once per provider; concurrent first resolutions
///   are serialized so exactly one instance is constructed
/// - **Scoped**: built once per active scope; fails with
///   [`DiError::NoActiveScope`] when no scope is active for the calling
///   context
/// - **Transient**: built on every resolution
///
/// # Thread Safety
///
/// ServiceProvider is `Send + Sync` and cheap to clone (it uses `Arc`
/// internally). The active scope is tracked per thread (and per task with
/// the `async` feature), so concurrent units of work never see each
/// other's scope.
///
/// # Examples
///
/// ```
/// use scopewire::{ConstructError, Injectable, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// impl Injectable for Database {
///     type Deps = ();
///     fn construct(_: ()) -> Result<Self, ConstructError> {
///         Ok(Database { url: "postgres://localhost".to_string() })
///     }
/// }
///
/// struct UserService { db: Arc<Database> }
/// impl Injectable for UserService {
///     type Deps = (Arc<Database>,);
///     fn construct((db,): Self::Deps) -> Result<Self, ConstructError> {
///         Ok(UserService { db })
///     }
/// }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton::<Database>();
/// collection.add_transient::<UserService>();
///
/// let provider = collection.build();
/// let user_service = provider.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    pub(crate) id: u64,
    pub(crate) registry: Registry,
    pub(crate) interceptors: InterceptorRegistry,
    pub(crate) observers: Observers,
    pub(crate) options: ContainerOptions,
}

impl ServiceProvider {
    pub(crate) fn new(
        registry: Registry,
        interceptors: InterceptorRegistry,
        observers: Observers,
        options: ContainerOptions,
    ) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                id: NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed),
                registry,
                interceptors,
                observers,
                options,
            }),
        }
    }

    /// Convenience accessor for the inner provider
    #[inline]
    pub(crate) fn inner(&self) -> &ProviderInner {
        &self.inner
    }

    /// Options this provider was built with.
    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.inner.registry.len()
    }

    /// Whether the provider has no bindings.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lifetime bound to `key`, if any.
    pub fn lifetime_of(&self, key: &Key) -> Option<Lifetime> {
        self.inner.registry.get(key).map(|reg| reg.lifetime)
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut lines: Vec<String> = self
            .inner
            .registry
            .iter()
            .map(|(k, r)| {
                format!(
                    "  {} => {} ({}, {} interceptor(s))",
                    k.display_name(),
                    r.impl_name,
                    r.lifetime,
                    self.inner.interceptors.count(k)
                )
            })
            .collect();
        lines.sort();

        let mut s = String::new();
        s.push_str("=== Service Provider Debug ===\n");
        s.push_str("Bindings:\n");
        for line in lines {
            s.push_str(&line);
            s.push('\n');
        }
        s
    }

    fn resolve_any_impl(&self, key: &Key) -> DiResult<AnyArc> {
        let reg = self
            .inner
            .registry
            .get(key)
            .ok_or(DiError::NotFound(key.display_name()))?;

        match reg.lifetime {
            Lifetime::Singleton => match &reg.singleton {
                Some(cell) => self.resolve_cached(cell, reg, key),
                None => self.construct_guarded(reg, key),
            },
            Lifetime::Scoped => {
                let scope = active_scope::current(self.inner.id)
                    .ok_or(DiError::NoActiveScope(key.display_name()))?;
                match reg.scoped_slot.and_then(|slot| scope.cell(slot)) {
                    Some(cell) => self.resolve_cached(cell, reg, key),
                    None => self.construct_guarded(reg, key),
                }
            }
            Lifetime::Transient => self.construct_guarded(reg, key),
        }
    }

    /// Returns the cached instance or builds it exactly once.
    ///
    /// The resolution chain is checked before `get_or_try_init`, so a cycle
    /// fails instead of re-entering a cell this thread is initializing.
    /// Other threads racing for the same cell block until the winner is
    /// done and then share its instance. A failed construction leaves the
    /// cell empty.
    fn resolve_cached(&self, cell: &OnceCell<AnyArc>, reg: &Registration, key: &Key) -> DiResult<AnyArc> {
        if let Some(value) = cell.get() {
            tracing::trace!("Cache hit for {}", key.display_name());
            return Ok(value.clone());
        }

        let _guard = StackGuard::enter(*key, self.inner.options.max_depth)?;
        cell.get_or_try_init(|| {
            tracing::debug!("Constructing {} {}", reg.lifetime, key.display_name());
            self.construct(reg, key)
        })
        .cloned()
    }

    fn construct_guarded(&self, reg: &Registration, key: &Key) -> DiResult<AnyArc> {
        let _guard = StackGuard::enter(*key, self.inner.options.max_depth)?;
        self.construct(reg, key)
    }

    /// Builds a fresh instance and applies the key's interceptors to it.
    fn construct(&self, reg: &Registration, key: &Key) -> DiResult<AnyArc> {
        let ctx = ResolverContext::new(self);
        let instance = (reg.ctor)(&ctx)?;
        if reg.prebuilt {
            return Ok(instance);
        }
        self.inner.interceptors.apply(key, instance)
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>> {
        let observers = &self.inner.observers;
        if !observers.has_observers() {
            return self.resolve_any_impl(key);
        }

        let start = Instant::now();
        observers.resolving(key);
        let result = self.resolve_any_impl(key);
        match &result {
            Ok(_) => observers.resolved(key, start.elapsed()),
            Err(err) => observers.resolution_failed(key, err),
        }
        result
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.inner.registry.contains_key(key)
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("id", &self.inner.id)
            .field("bindings", &self.inner.registry.len())
            .finish()
    }
}
