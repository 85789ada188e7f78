//! Call interception for freshly constructed services.
//!
//! Interception has two layers:
//!
//! - **Factories** registered with
//!   [`ServiceCollection::add_interceptor`](crate::ServiceCollection::add_interceptor)
//!   take the raw `Arc<T>` right after construction and return a replacement
//!   exposing the same interface. Several factories for one key nest in
//!   registration order, so the caller receives `Fn_n(..Fn_1(raw))`.
//!   Factories never run on instances served from a singleton or scope cache.
//! - [`Interceptor`] is the building block for such a replacement: a
//!   decorator that implements the service trait by routing every operation
//!   through [`Interceptor::invoke`], which runs the `before` callbacks,
//!   the real call, then the `after` callbacks.
//!
//! # Examples
//!
//! ```
//! use scopewire::{ConstructError, Injectable, Interceptor, Lifetime, Resolver, ServiceCollection};
//! use std::sync::{Arc, Mutex};
//!
//! trait UserRepository: Send + Sync {
//!     fn get_user(&self, id: &str) -> String;
//! }
//!
//! struct SqlUserRepository;
//! impl UserRepository for SqlUserRepository {
//!     fn get_user(&self, id: &str) -> String { format!("user-{id}") }
//! }
//! impl Injectable for SqlUserRepository {
//!     type Deps = ();
//!     fn construct(_: ()) -> Result<Self, ConstructError> { Ok(SqlUserRepository) }
//! }
//!
//! // Explicit decorator: same interface, every operation goes through `invoke`.
//! struct InterceptedRepository(Interceptor<dyn UserRepository>);
//! impl UserRepository for InterceptedRepository {
//!     fn get_user(&self, id: &str) -> String {
//!         self.0.invoke("get_user", &[&id], |inner| inner.get_user(id))
//!     }
//! }
//!
//! let log = Arc::new(Mutex::new(Vec::new()));
//! let (before_log, after_log) = (log.clone(), log.clone());
//!
//! let factory = Interceptor::<dyn UserRepository>::builder()
//!     .before(move |_, call| before_log.lock().unwrap().push(format!("before {}", call.operation)))
//!     .after(move |_, call, _| after_log.lock().unwrap().push(format!("after {}", call.operation)))
//!     .into_factory(|interceptor| Arc::new(InterceptedRepository(interceptor)) as Arc<dyn UserRepository>);
//!
//! let mut services = ServiceCollection::new();
//! services.bind::<dyn UserRepository, SqlUserRepository, _>(Lifetime::Singleton, |r| r);
//! services.add_interceptor::<dyn UserRepository, _>(factory);
//!
//! let provider = services.build();
//! let repo = provider.get_required::<dyn UserRepository>();
//! assert_eq!(repo.get_user("123"), "user-123");
//! assert_eq!(*log.lock().unwrap(), vec!["before get_user", "after get_user"]);
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::{AnyArc, Map};

/// Callback run before the real operation.
pub type BeforeCallback<T> = Arc<dyn Fn(&T, &Invocation<'_>) + Send + Sync>;

/// Callback run after the real operation; receives the result.
pub type AfterCallback<T> = Arc<dyn Fn(&T, &Invocation<'_>, &dyn Any) + Send + Sync>;

/// One intercepted operation call.
pub struct Invocation<'a> {
    /// Name of the service type being called
    pub target: &'static str,
    /// Name of the operation being called
    pub operation: &'static str,
    /// The call's arguments, in order
    pub args: &'a [&'a dyn fmt::Debug],
    started: Instant,
}

impl Invocation<'_> {
    /// Time since the invocation started. In `after` callbacks this covers
    /// the `before` callbacks and the real operation.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("target", &self.target)
            .field("operation", &self.operation)
            .field("args", &self.args)
            .finish()
    }
}

struct Callbacks<T: ?Sized> {
    before: Vec<BeforeCallback<T>>,
    after: Vec<AfterCallback<T>>,
}

impl<T: ?Sized> Clone for Callbacks<T> {
    fn clone(&self) -> Self {
        Self {
            before: self.before.clone(),
            after: self.after.clone(),
        }
    }
}

impl<T: ?Sized> Default for Callbacks<T> {
    fn default() -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
        }
    }
}

/// Wraps one service instance and runs callbacks around each operation.
///
/// Callbacks observe but cannot alter control flow: the real operation
/// always runs with the original arguments and its result is returned
/// unchanged. Plain data is reached through [`inner`](Self::inner) without
/// any interception.
pub struct Interceptor<T: ?Sized> {
    inner: Arc<T>,
    callbacks: Arc<Callbacks<T>>,
}

impl<T: ?Sized> Clone for Interceptor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            callbacks: self.callbacks.clone(),
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> Interceptor<T> {
    /// Wraps `inner` with no callbacks.
    pub fn new(inner: Arc<T>) -> Self {
        Self {
            inner,
            callbacks: Arc::new(Callbacks::default()),
        }
    }

    /// Starts a reusable set of callbacks; see [`InterceptorBuilder`].
    pub fn builder() -> InterceptorBuilder<T> {
        InterceptorBuilder::new()
    }

    /// Appends a `before` callback.
    pub fn before<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T, &Invocation<'_>) + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.callbacks).before.push(Arc::new(callback));
        self
    }

    /// Appends an `after` callback.
    pub fn after<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T, &Invocation<'_>, &dyn Any) + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.callbacks).after.push(Arc::new(callback));
        self
    }

    /// Appends an `after` callback that logs the call duration.
    pub fn timing(self) -> Self {
        self.after(log_timing)
    }

    /// The wrapped instance.
    pub fn inner(&self) -> &Arc<T> {
        &self.inner
    }

    /// Runs `call` against the wrapped instance inside the callback pipeline.
    ///
    /// Order: every `before` callback in registration order, `call`, then
    /// every `after` callback in registration order.
    pub fn invoke<R, F>(&self, operation: &'static str, args: &[&dyn fmt::Debug], call: F) -> R
    where
        R: Any,
        F: FnOnce(&T) -> R,
    {
        let invocation = Invocation {
            target: std::any::type_name::<T>(),
            operation,
            args,
            started: Instant::now(),
        };

        for callback in &self.callbacks.before {
            callback(self.inner.as_ref(), &invocation);
        }

        let result = call(self.inner.as_ref());

        for callback in &self.callbacks.after {
            callback(self.inner.as_ref(), &invocation, &result as &dyn Any);
        }

        result
    }
}

fn log_timing<T: ?Sized>(_: &T, call: &Invocation<'_>, _: &dyn Any) {
    tracing::debug!(
        target: "scopewire::interception",
        "Completed {}.{} in {:?}",
        call.target,
        call.operation,
        call.elapsed()
    );
}

/// Collects callbacks once and turns them into an interceptor factory.
///
/// Every instance the factory wraps gets its own [`Interceptor`]; the
/// callback lists are shared.
pub struct InterceptorBuilder<T: ?Sized> {
    callbacks: Callbacks<T>,
}

impl<T: ?Sized + Send + Sync + 'static> InterceptorBuilder<T> {
    /// A builder with no callbacks.
    pub fn new() -> Self {
        Self {
            callbacks: Callbacks::default(),
        }
    }

    /// Appends a `before` callback shared by every wrapped instance.
    pub fn before<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T, &Invocation<'_>) + Send + Sync + 'static,
    {
        self.callbacks.before.push(Arc::new(callback));
        self
    }

    /// Appends an `after` callback shared by every wrapped instance.
    pub fn after<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T, &Invocation<'_>, &dyn Any) + Send + Sync + 'static,
    {
        self.callbacks.after.push(Arc::new(callback));
        self
    }

    /// Logs every call's duration at debug level.
    pub fn with_timing(self) -> Self {
        self.after(log_timing)
    }

    /// Produces a factory for `add_interceptor`. `wrap` turns the prepared
    /// [`Interceptor`] into the decorator implementing `T`.
    pub fn into_factory<W>(self, wrap: W) -> impl Fn(Arc<T>) -> Arc<T> + Send + Sync + 'static
    where
        W: Fn(Interceptor<T>) -> Arc<T> + Send + Sync + 'static,
    {
        let callbacks = Arc::new(self.callbacks);
        move |inner| {
            wrap(Interceptor {
                inner,
                callbacks: callbacks.clone(),
            })
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> Default for InterceptorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

type ErasedFactory = Arc<dyn Fn(AnyArc) -> DiResult<AnyArc> + Send + Sync>;

/// Interceptor factories per key, in registration order.
#[derive(Default, Clone)]
pub(crate) struct InterceptorRegistry {
    factories: Map<Key, Vec<ErasedFactory>>,
}

impl InterceptorRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push<T, F>(&mut self, factory: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<T> + Send + Sync + 'static,
    {
        let key = Key::of::<T>();
        let erased: ErasedFactory = Arc::new(move |any: AnyArc| {
            let typed = any
                .downcast::<Arc<T>>()
                .map_err(|_| DiError::TypeMismatch(key.display_name()))?;
            let wrapped = factory((*typed).clone());
            Ok(Arc::new(wrapped) as AnyArc)
        });
        self.factories.entry(key).or_default().push(erased);
    }

    pub(crate) fn count(&self, key: &Key) -> usize {
        self.factories.get(key).map_or(0, Vec::len)
    }

    /// Applies every factory for `key` to a freshly constructed instance.
    pub(crate) fn apply(&self, key: &Key, instance: AnyArc) -> DiResult<AnyArc> {
        match self.factories.get(key) {
            Some(factories) => factories.iter().try_fold(instance, |current, factory| factory(current)),
            None => Ok(instance),
        }
    }
}
