//! Service module system for modular registration.
//!
//! This module provides the trait for organizing service registrations into
//! reusable modules.

use crate::{DiResult, ServiceCollection};

/// A module that can register services with a ServiceCollection.
///
/// Modules group the bindings of one feature area so an application can
/// compose them. Later modules win over earlier ones for the same key, like
/// any other registration.
///
/// # Example
///
/// ```rust
/// use scopewire::{ConstructError, DiResult, Injectable, Resolver, ServiceCollection, ServiceModule};
/// use std::sync::Arc;
///
/// struct UserConfig;
/// impl Injectable for UserConfig {
///     type Deps = ();
///     fn construct(_: ()) -> Result<Self, ConstructError> { Ok(UserConfig) }
/// }
///
/// struct UserService { config: Arc<UserConfig> }
/// impl Injectable for UserService {
///     type Deps = (Arc<UserConfig>,);
///     fn construct((config,): Self::Deps) -> Result<Self, ConstructError> {
///         Ok(UserService { config })
///     }
/// }
///
/// struct UserModule;
///
/// impl ServiceModule for UserModule {
///     fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
///         services.add_singleton::<UserConfig>();
///         services.add_scoped::<UserService>();
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut services = ServiceCollection::new();
/// services.add_module(UserModule)?;
/// let provider = services.build();
///
/// let _scope = provider.create_scope();
/// let _user_service = provider.get::<UserService>()?;
/// # Ok(())
/// # }
/// ```
pub trait ServiceModule {
    /// Register this module's services with the ServiceCollection.
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()>;
}

impl<F> ServiceModule for F
where
    F: FnOnce(&mut ServiceCollection) -> DiResult<()>,
{
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
        self(services)
    }
}
