//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// Core resolver trait for object-safe service resolution.
///
/// This trait provides the type-erased resolution entry point. Resolution
/// runs synchronously to completion on the calling thread; circular
/// dependencies are detected through a thread-local chain of the keys
/// currently under construction.
///
/// Most users should use the [`Resolver`] trait instead, which provides
/// typed methods built on top of this one.
pub trait ResolverCore: Send + Sync {
    /// Resolves the service bound to `key`.
    ///
    /// # Returns
    ///
    /// * `Ok(AnyArc)` - An `Arc<T>` boxed as `Arc<dyn Any>`
    /// * `Err(DiError)` - not found, no active scope, circular, or a
    ///   constructor failure, exactly as raised
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>>;

    /// Whether `key` has a binding.
    fn is_registered(&self, key: &Key) -> bool;
}

/// High-level resolver interface with generic methods for type-safe service resolution.
///
/// Implemented for everything that implements [`ResolverCore`]:
/// `ServiceProvider`, `Scope`, and the `ResolverContext` handed to
/// constructors.
///
/// # Examples
///
/// ```
/// use scopewire::{ConstructError, Injectable, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
/// impl Injectable for English {
///     type Deps = ();
///     fn construct(_: ()) -> Result<Self, ConstructError> { Ok(English) }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_instance(42usize);
/// services.bind_singleton::<dyn Greeter, English, _>(|g| g);
///
/// let provider = services.build();
/// assert_eq!(*provider.get_required::<usize>(), 42);
/// assert_eq!(provider.get_required::<dyn Greeter>().greet(), "hello");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves `T`, which may be a concrete type or a trait object.
    ///
    /// # Examples
    ///
    /// ```
    /// use scopewire::{ServiceCollection, Resolver};
    ///
    /// let mut collection = ServiceCollection::new();
    /// collection.add_instance("configuration".to_string());
    ///
    /// let provider = collection.build();
    /// let config = provider.get::<String>().unwrap();
    /// assert_eq!(&*config, "configuration");
    /// ```
    fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = Key::of::<T>();
        let any = self.resolve_any(&key)?;
        any.downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| DiError::TypeMismatch(key.display_name()))
    }

    /// Resolves `T`, returning `None` when it has no binding.
    ///
    /// Every other failure is still returned as an error.
    fn try_get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        if self.is_registered(&Key::of::<T>()) {
            self.get::<T>().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Resolves `T`, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics with the resolution error's message if `T` cannot be resolved.
    fn get_required<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        match self.get::<T>() {
            Ok(service) => service,
            Err(err) => panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), err),
        }
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
