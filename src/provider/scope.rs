//! Scoped service resolution and scope lifecycle.
//!
//! A scope is an isolated cache for scoped services, modelling one unit of
//! work. [`ServiceProvider::create_scope`] opens a scope and makes it the
//! active one for the calling thread; dropping the returned [`ScopeGuard`]
//! restores whatever was active before and discards the cache.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::DiResult;
use crate::internal::active_scope::{self, ActiveEntry};
use crate::key::Key;
use crate::registration::AnyArc;
use crate::traits::ResolverCore;
use super::ServiceProvider;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique scope identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    fn next() -> Self {
        ScopeId(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope-{}", self.0)
    }
}

/// Scope state shared between the handle and the active-scope stacks.
pub(crate) struct ScopeInner {
    pub(crate) id: ScopeId,
    /// One cell per scoped registration, indexed by `scoped_slot`
    pub(crate) cells: Box<[OnceCell<AnyArc>]>,
}

impl ScopeInner {
    pub(crate) fn cell(&self, slot: usize) -> Option<&OnceCell<AnyArc>> {
        self.cells.get(slot)
    }
}

/// Scoped service container for one unit of work.
///
/// Resolving through a `Scope` handle activates it for the duration of the
/// call, whatever else is active on the thread. This is the explicit
/// alternative to relying on the ambient active scope, and the way to use
/// one scope from several threads.
///
/// # Lifetime Behavior
///
/// - **Singleton**: Resolved and cached in the root provider (shared across all scopes)
/// - **Scoped**: Resolved and cached within this specific scope
/// - **Transient**: Created fresh on every resolution (no caching)
///
/// # Examples
///
/// ```
/// use scopewire::{ConstructError, Injectable, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct RequestContext;
/// impl Injectable for RequestContext {
///     type Deps = ();
///     fn construct(_: ()) -> Result<Self, ConstructError> { Ok(RequestContext) }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped::<RequestContext>();
/// let provider = services.build();
///
/// let scope = provider.new_scope();
/// let handle = scope.clone();
/// let from_thread = std::thread::spawn(move || handle.get_required::<RequestContext>())
///     .join()
///     .unwrap();
///
/// assert!(Arc::ptr_eq(&from_thread, &scope.get_required::<RequestContext>()));
/// ```
#[derive(Clone)]
pub struct Scope {
    pub(crate) root: ServiceProvider,
    pub(crate) inner: Arc<ScopeInner>,
}

impl Scope {
    pub(crate) fn new(root: ServiceProvider) -> Self {
        let scoped_count = root.inner().registry.scoped_count;
        let cells: Box<[OnceCell<AnyArc>]> = (0..scoped_count)
            .map(|_| OnceCell::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            root,
            inner: Arc::new(ScopeInner {
                id: ScopeId::next(),
                cells,
            }),
        }
    }

    /// This scope's identifier.
    pub fn id(&self) -> ScopeId {
        self.inner.id
    }

    /// Makes this scope the active one for the current thread until the
    /// returned guard is dropped.
    pub fn enter(&self) -> ScopeGuard {
        ScopeGuard::activate(self.clone())
    }

    fn entry(&self) -> ActiveEntry {
        ActiveEntry::new(self.root.inner().id, self.inner.clone())
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope").field("id", &self.inner.id).finish()
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>> {
        let _active = Activation::push(self.entry());
        self.root.resolve_any(key)
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.root.is_registered(key)
    }
}

/// Pushes an entry on the thread's active-scope stack; removes it on drop.
struct Activation {
    id: ScopeId,
}

impl Activation {
    fn push(entry: ActiveEntry) -> Self {
        let id = entry.scope.id;
        active_scope::push(entry);
        Self { id }
    }
}

impl Drop for Activation {
    fn drop(&mut self) {
        active_scope::remove(self.id);
    }
}

/// RAII handle for an active scope.
///
/// While the guard lives, its scope is the active scope of the current
/// thread for the owning provider; the previously active scope is suspended,
/// not discarded. Dropping the guard restores it on every exit path: normal
/// return, `?` propagation, and panic unwinding.
///
/// The guard is tied to the thread that created it and is not `Send`. Do
/// not hold it across an `.await`; async code should use
/// [`ServiceProvider::scope_async`] (feature `async`).
pub struct ScopeGuard {
    scope: Scope,
    _activation: Activation,
    _not_send: PhantomData<*const ()>,
}

impl ScopeGuard {
    fn activate(scope: Scope) -> Self {
        let activation = Activation::push(scope.entry());
        tracing::debug!("Entered {}", scope.id());
        scope.root.inner().observers.scope_opened(scope.id());
        Self {
            scope,
            _activation: activation,
            _not_send: PhantomData,
        }
    }

    /// The scope this guard keeps active.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

impl Deref for ScopeGuard {
    type Target = Scope;

    fn deref(&self) -> &Scope {
        &self.scope
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        // `_activation` is dropped right after this, restoring the previous scope
        tracing::debug!("Leaving {}", self.scope.id());
        self.scope.root.inner().observers.scope_closed(self.scope.id());
    }
}

impl ServiceProvider {
    /// Opens a new scope and makes it active for the current thread.
    ///
    /// Scoped services resolved through this provider on this thread are
    /// cached in the new scope until the guard is dropped. Nested calls
    /// stack: the inner scope wins until its guard is dropped, then the
    /// outer one is active again.
    ///
    /// # Examples
    ///
    /// ```
    /// use scopewire::{ConstructError, Injectable, Resolver, ServiceCollection};
    /// use std::sync::Arc;
    ///
    /// struct UserContext;
    /// impl Injectable for UserContext {
    ///     type Deps = ();
    ///     fn construct(_: ()) -> Result<Self, ConstructError> { Ok(UserContext) }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_scoped::<UserContext>();
    /// let provider = services.build();
    ///
    /// let outer = provider.create_scope();
    /// let a = provider.get_required::<UserContext>();
    /// {
    ///     let _inner = provider.create_scope();
    ///     let b = provider.get_required::<UserContext>();
    ///     assert!(!Arc::ptr_eq(&a, &b));
    /// }
    /// // Outer scope restored
    /// assert!(Arc::ptr_eq(&a, &provider.get_required::<UserContext>()));
    /// drop(outer);
    ///
    /// assert!(provider.get::<UserContext>().is_err());
    /// ```
    pub fn create_scope(&self) -> ScopeGuard {
        ScopeGuard::activate(Scope::new(self.clone()))
    }

    /// Creates a scope without activating it.
    ///
    /// Resolve through the returned handle, or call [`Scope::enter`].
    pub fn new_scope(&self) -> Scope {
        Scope::new(self.clone())
    }

    /// Id of the scope active for this provider in the current context.
    pub fn current_scope_id(&self) -> Option<ScopeId> {
        active_scope::current(self.inner().id).map(|scope| scope.id)
    }

    /// Runs `fut` with a fresh scope active for the current task.
    ///
    /// The scope is task-local: other tasks, even on the same worker thread,
    /// never observe it. It is discarded when the future completes.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[cfg(feature = "async")]
    /// # async fn demo() {
    /// use scopewire::{ConstructError, Injectable, Resolver, ServiceCollection};
    ///
    /// struct RequestId;
    /// impl Injectable for RequestId {
    ///     type Deps = ();
    ///     fn construct(_: ()) -> Result<Self, ConstructError> { Ok(RequestId) }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_scoped::<RequestId>();
    /// let provider = services.build();
    ///
    /// let inner = provider.clone();
    /// provider
    ///     .scope_async(async move {
    ///         assert!(inner.get::<RequestId>().is_ok());
    ///     })
    ///     .await;
    /// # }
    /// ```
    #[cfg(feature = "async")]
    pub async fn scope_async<F>(&self, fut: F) -> F::Output
    where
        F: std::future::Future,
    {
        let scope = Scope::new(self.clone());
        let id = scope.id();
        tracing::debug!("Entered {} (task)", id);
        self.inner().observers.scope_opened(id);

        let output = active_scope::run_in_task_scope(scope.entry(), fut).await;

        tracing::debug!("Leaving {} (task)", id);
        self.inner().observers.scope_closed(id);
        output
    }
}
