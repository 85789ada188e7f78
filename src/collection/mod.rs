//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type and related functionality
//! for registering services and building service providers.

use std::any::type_name;
use std::sync::Arc;

use crate::descriptors::ServiceDescriptor;
use crate::error::{ConstructError, DiError};
use crate::injectable::{Dependencies, Injectable};
use crate::interception::InterceptorRegistry;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::options::ContainerOptions;
use crate::provider::{ResolverContext, ServiceProvider};
use crate::registration::{AnyArc, Ctor, Registration, Registry};
use crate::validation::{self, ValidationReport};
use crate::DiResult;

pub mod module_system;
pub use module_system::*;

/// Mutable set of bindings, turned into a [`ServiceProvider`] by [`build`](Self::build).
///
/// Registering a key that is already bound replaces the earlier binding.
/// The replacement is logged at warn level and reported by
/// [`validate`](Self::validate), but it is not an error.
pub struct ServiceCollection {
    registry: Registry,
    interceptors: InterceptorRegistry,
    observers: Observers,
    options: ContainerOptions,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            interceptors: InterceptorRegistry::new(),
            observers: Observers::new(),
            options: ContainerOptions::default(),
        }
    }

    // ----- Concrete Type Registrations -----

    /// Binds `T` to itself with the default lifetime (transient).
    pub fn register<T: Injectable>(&mut self) -> &mut Self {
        self.register_with::<T>(Lifetime::default())
    }

    /// Binds `T` to itself with the given lifetime.
    ///
    /// The constructor's dependencies come from `T::Deps` and are resolved
    /// in declaration order each time an instance is built.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scopewire::{ConstructError, Injectable, Lifetime, Resolver, ServiceCollection};
    /// use std::sync::Arc;
    ///
    /// struct Clock;
    /// impl Injectable for Clock {
    ///     type Deps = ();
    ///     fn construct(_: ()) -> Result<Self, ConstructError> { Ok(Clock) }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.register_with::<Clock>(Lifetime::Singleton);
    /// let provider = services.build();
    ///
    /// let a = provider.get_required::<Clock>();
    /// let b = provider.get_required::<Clock>();
    /// assert!(Arc::ptr_eq(&a, &b));
    /// ```
    pub fn register_with<T: Injectable>(&mut self, lifetime: Lifetime) -> &mut Self {
        let ctor: Ctor = Arc::new(|ctx: &ResolverContext<'_>| {
            let deps = T::Deps::resolve_all(ctx)?;
            let value = T::construct(deps).map_err(DiError::construction)?;
            Ok(Arc::new(Arc::new(value)) as AnyArc)
        });
        let registration = Registration::new(lifetime, type_name::<T>(), T::Deps::describe(), ctor);
        self.insert(Key::of::<T>(), registration)
    }

    /// Binds `T` as a singleton: built on first use, then shared.
    pub fn add_singleton<T: Injectable>(&mut self) -> &mut Self {
        self.register_with::<T>(Lifetime::Singleton)
    }

    /// Binds `T` as scoped: one instance per active scope.
    pub fn add_scoped<T: Injectable>(&mut self) -> &mut Self {
        self.register_with::<T>(Lifetime::Scoped)
    }

    /// Binds `T` as transient: a new instance on every resolution.
    pub fn add_transient<T: Injectable>(&mut self) -> &mut Self {
        self.register_with::<T>(Lifetime::Transient)
    }

    /// Registers a singleton instance that already exists.
    ///
    /// The value is never constructed by the container and interceptors are
    /// not applied to it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scopewire::{Resolver, ServiceCollection};
    ///
    /// struct Config { database_url: String }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_instance(Config { database_url: "postgres://localhost".to_string() });
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<Config>().database_url, "postgres://localhost");
    /// ```
    pub fn add_instance<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        let registration = Registration::prebuilt(type_name::<T>(), Arc::new(Arc::new(value)) as AnyArc);
        self.insert(Key::of::<T>(), registration)
    }

    /// Registers an existing shared value under `I`, typically a trait object.
    ///
    /// ```rust
    /// use scopewire::{Resolver, ServiceCollection};
    /// use std::sync::Arc;
    ///
    /// trait Greeter: Send + Sync { fn greet(&self) -> String; }
    /// struct English;
    /// impl Greeter for English { fn greet(&self) -> String { "hello".into() } }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_shared::<dyn Greeter>(Arc::new(English));
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<dyn Greeter>().greet(), "hello");
    /// ```
    pub fn add_shared<I: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<I>) -> &mut Self {
        let registration = Registration::prebuilt(type_name::<I>(), Arc::new(value) as AnyArc);
        self.insert(Key::of::<I>(), registration)
    }

    /// Binds `T` to a factory closure instead of an [`Injectable`] impl.
    ///
    /// The factory resolves what it needs through the context it receives.
    /// Its dependencies are not declared, so [`validate`](Self::validate)
    /// cannot see them.
    ///
    /// ```rust
    /// use scopewire::{Lifetime, Resolver, ServiceCollection};
    ///
    /// struct Port(u16);
    /// struct Endpoint(String);
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_instance(Port(8080));
    /// services.register_factory(Lifetime::Transient, |r| {
    ///     let port = r.get::<Port>()?;
    ///     Ok(Endpoint(format!("http://localhost:{}", port.0)))
    /// });
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<Endpoint>().0, "http://localhost:8080");
    /// ```
    pub fn register_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Result<T, ConstructError> + Send + Sync + 'static,
    {
        let ctor: Ctor = Arc::new(move |ctx: &ResolverContext<'_>| {
            let value = factory(ctx).map_err(into_di_error)?;
            Ok(Arc::new(Arc::new(value)) as AnyArc)
        });
        self.insert(Key::of::<T>(), Registration::new(lifetime, type_name::<T>(), Vec::new(), ctor))
    }

    // ----- Trait Registrations -----

    /// Binds the key `I` (usually `dyn Trait`) to the implementation `Impl`.
    ///
    /// `cast` converts the constructed `Arc<Impl>` into `Arc<I>`; for trait
    /// objects `|x| x` is enough, the unsizing coercion does the rest.
    /// Dependencies are those of `Impl`, and lifetime caching is per key:
    /// binding one implementation under two keys yields two instances.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scopewire::{ConstructError, Injectable, Lifetime, Resolver, ServiceCollection};
    ///
    /// trait Notifier: Send + Sync { fn channel(&self) -> &'static str; }
    ///
    /// struct EmailNotifier;
    /// impl Notifier for EmailNotifier { fn channel(&self) -> &'static str { "email" } }
    /// impl Injectable for EmailNotifier {
    ///     type Deps = ();
    ///     fn construct(_: ()) -> Result<Self, ConstructError> { Ok(EmailNotifier) }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.bind::<dyn Notifier, EmailNotifier, _>(Lifetime::Scoped, |n| n);
    /// let provider = services.build();
    ///
    /// let _scope = provider.create_scope();
    /// assert_eq!(provider.get_required::<dyn Notifier>().channel(), "email");
    /// ```
    pub fn bind<I, Impl, C>(&mut self, lifetime: Lifetime, cast: C) -> &mut Self
    where
        I: ?Sized + Send + Sync + 'static,
        Impl: Injectable,
        C: Fn(Arc<Impl>) -> Arc<I> + Send + Sync + 'static,
    {
        let ctor: Ctor = Arc::new(move |ctx: &ResolverContext<'_>| {
            let deps = Impl::Deps::resolve_all(ctx)?;
            let value = Impl::construct(deps).map_err(DiError::construction)?;
            let bound: Arc<I> = cast(Arc::new(value));
            Ok(Arc::new(bound) as AnyArc)
        });
        let registration = Registration::new(lifetime, type_name::<Impl>(), Impl::Deps::describe(), ctor);
        self.insert(Key::of::<I>(), registration)
    }

    /// [`bind`](Self::bind) with [`Lifetime::Singleton`].
    pub fn bind_singleton<I, Impl, C>(&mut self, cast: C) -> &mut Self
    where
        I: ?Sized + Send + Sync + 'static,
        Impl: Injectable,
        C: Fn(Arc<Impl>) -> Arc<I> + Send + Sync + 'static,
    {
        self.bind::<I, Impl, C>(Lifetime::Singleton, cast)
    }

    /// [`bind`](Self::bind) with [`Lifetime::Scoped`].
    pub fn bind_scoped<I, Impl, C>(&mut self, cast: C) -> &mut Self
    where
        I: ?Sized + Send + Sync + 'static,
        Impl: Injectable,
        C: Fn(Arc<Impl>) -> Arc<I> + Send + Sync + 'static,
    {
        self.bind::<I, Impl, C>(Lifetime::Scoped, cast)
    }

    /// [`bind`](Self::bind) with [`Lifetime::Transient`].
    pub fn bind_transient<I, Impl, C>(&mut self, cast: C) -> &mut Self
    where
        I: ?Sized + Send + Sync + 'static,
        Impl: Injectable,
        C: Fn(Arc<Impl>) -> Arc<I> + Send + Sync + 'static,
    {
        self.bind::<I, Impl, C>(Lifetime::Transient, cast)
    }

    // ----- Interception / Observers / Options -----

    /// Appends an interceptor factory for `T`.
    ///
    /// Every freshly constructed `T` is passed through the factories in the
    /// order they were added, and the last result is what gets cached and
    /// returned: with factories `f1` then `f2` the caller receives
    /// `f2(f1(raw))`. Factories may be added for keys that are not bound
    /// (yet); they simply never run.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scopewire::{ConstructError, Injectable, Resolver, ServiceCollection};
    /// use std::sync::Arc;
    ///
    /// trait Pricing: Send + Sync { fn price(&self) -> u32; }
    ///
    /// struct Base;
    /// impl Pricing for Base { fn price(&self) -> u32 { 100 } }
    /// impl Injectable for Base {
    ///     type Deps = ();
    ///     fn construct(_: ()) -> Result<Self, ConstructError> { Ok(Base) }
    /// }
    ///
    /// struct Discount(Arc<dyn Pricing>);
    /// impl Pricing for Discount { fn price(&self) -> u32 { self.0.price() - 10 } }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.bind_transient::<dyn Pricing, Base, _>(|b| b);
    /// services.add_interceptor::<dyn Pricing, _>(|inner| Arc::new(Discount(inner)) as Arc<dyn Pricing>);
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<dyn Pricing>().price(), 90);
    /// ```
    pub fn add_interceptor<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<T> + Send + Sync + 'static,
    {
        self.interceptors.push::<T, F>(factory);
        self
    }

    /// Adds an observer notified of every resolution and scope event.
    ///
    /// ```rust
    /// use scopewire::{LoggingObserver, ServiceCollection};
    /// use std::sync::Arc;
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_observer(Arc::new(LoggingObserver::new()));
    /// let provider = services.build();
    /// ```
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Replaces the container options.
    pub fn with_options(&mut self, options: ContainerOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Lets `module` register its services into this collection.
    pub fn add_module<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register_services(self)?;
        Ok(self)
    }

    // ----- Introspection / Build -----

    /// Whether `T` has a binding.
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.registry.contains_key(&Key::of::<T>())
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no bindings have been added.
    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Describes every binding, sorted by key name.
    ///
    /// ```rust
    /// use scopewire::{ConstructError, Injectable, Lifetime, ServiceCollection};
    /// use std::sync::Arc;
    ///
    /// struct Database;
    /// impl Injectable for Database {
    ///     type Deps = ();
    ///     fn construct(_: ()) -> Result<Self, ConstructError> { Ok(Database) }
    /// }
    ///
    /// struct Repository;
    /// impl Injectable for Repository {
    ///     type Deps = (Arc<Database>,);
    ///     fn construct(_: Self::Deps) -> Result<Self, ConstructError> { Ok(Repository) }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton::<Database>();
    /// services.add_scoped::<Repository>();
    ///
    /// let descriptors = services.get_service_descriptors();
    /// let repo = descriptors.iter().find(|d| d.type_name().ends_with("Repository")).unwrap();
    /// assert_eq!(repo.lifetime, Lifetime::Scoped);
    /// assert!(repo.depends_on::<Database>());
    /// ```
    pub fn get_service_descriptors(&self) -> Vec<ServiceDescriptor> {
        let mut descriptors: Vec<ServiceDescriptor> = self
            .registry
            .iter()
            .map(|(key, reg)| ServiceDescriptor {
                key: *key,
                lifetime: reg.lifetime,
                impl_type_name: reg.impl_name,
                dependencies: reg.dependencies.clone(),
                interceptors: if reg.prebuilt { 0 } else { self.interceptors.count(key) },
            })
            .collect();
        descriptors.sort_by_key(|d| d.key.display_name());
        descriptors
    }

    /// Checks the declared dependency graph without building anything.
    ///
    /// See [`ValidationReport`] for what is reported.
    pub fn validate(&self) -> ValidationReport {
        validation::validate_registry(&self.registry)
    }

    /// Freezes the collection into a provider.
    ///
    /// No validation happens here; a missing binding or a cycle surfaces on
    /// the first resolution that reaches it.
    pub fn build(mut self) -> ServiceProvider {
        // Finalize registry by assigning scoped slot indices
        self.registry.finalize();
        tracing::debug!(
            "Building service provider with {} bindings ({} scoped)",
            self.registry.len(),
            self.registry.scoped_count
        );
        ServiceProvider::new(self.registry, self.interceptors, self.observers, self.options)
    }

    /// Like [`build`](Self::build), but runs [`validate`](Self::validate)
    /// first when [`ContainerOptions::validate_on_build`] is set and refuses
    /// to build if it reports errors. Warnings never block the build.
    pub fn try_build(self) -> Result<ServiceProvider, ValidationReport> {
        if self.options.validate_on_build {
            let report = self.validate();
            if !report.is_valid() {
                tracing::warn!("Refusing to build: {}", report);
                return Err(report);
            }
            for warning in &report.warnings {
                tracing::warn!("{}", warning);
            }
        }
        Ok(self.build())
    }

    fn insert(&mut self, key: Key, registration: Registration) -> &mut Self {
        let lifetime = registration.lifetime;
        if self.registry.insert(key, registration) {
            tracing::warn!("Replacing existing registration for {}", key.display_name());
        }
        tracing::trace!("Registered {} as {}", key.display_name(), lifetime);
        self
    }
}

/// Factories may propagate a `DiError` from a nested `get` with `?`; keep it
/// as is instead of wrapping it as a construction failure.
fn into_di_error(err: ConstructError) -> DiError {
    match err.downcast::<DiError>() {
        Ok(inner) => *inner,
        Err(other) => DiError::construction(other),
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("bindings", &self.registry.len())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Resolver;
    use std::fmt;

    struct Leaf;
    impl Injectable for Leaf {
        type Deps = ();
        fn construct(_: ()) -> Result<Self, ConstructError> {
            Ok(Leaf)
        }
    }

    #[derive(Debug)]
    struct Boom;
    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom")
        }
    }
    impl std::error::Error for Boom {}

    #[test]
    fn register_defaults_to_transient() {
        let mut services = ServiceCollection::new();
        services.register::<Leaf>();
        let descriptors = services.get_service_descriptors();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].lifetime, Lifetime::Transient);
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let mut services = ServiceCollection::new();
        services.add_transient::<Leaf>().add_singleton::<Leaf>();
        assert_eq!(services.len(), 1);

        let provider = services.build();
        let a = provider.get_required::<Leaf>();
        let b = provider.get_required::<Leaf>();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn factory_keeps_nested_di_errors_unwrapped() {
        struct NeedsMissing;
        let mut services = ServiceCollection::new();
        services.register_factory(Lifetime::Transient, |r| {
            r.get::<Leaf>()?;
            Ok(NeedsMissing)
        });

        let provider = services.build();
        match provider.get::<NeedsMissing>() {
            Err(DiError::NotFound(name)) => assert!(name.ends_with("Leaf")),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn factory_errors_become_construction_errors() {
        struct Fails;
        let mut services = ServiceCollection::new();
        services.register_factory::<Fails, _>(Lifetime::Singleton, |_| Err(Boom.into()));

        let err = services.build().get::<Fails>().err().unwrap();
        assert!(err.construction_error().unwrap().is::<Boom>());
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn instances_are_not_intercepted() {
        let mut services = ServiceCollection::new();
        services.add_instance(7u32);
        services.add_interceptor::<u32, _>(|v| Arc::new(*v + 1));

        assert_eq!(services.get_service_descriptors()[0].interceptors, 0);
        assert_eq!(*services.build().get_required::<u32>(), 7);
    }
}
