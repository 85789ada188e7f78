//! Resolver context for dependency injection.
//!
//! This module contains the ResolverContext type which is handed to
//! constructors while their dependency list is being resolved.

use std::any::Any;
use std::sync::Arc;

use crate::error::DiResult;
use crate::key::Key;
use crate::traits::ResolverCore;
use super::ServiceProvider;

/// Context passed to dependency resolution during construction.
///
/// Every dependency is resolved through the provider that started the
/// construction, so the active scope of the current execution context and
/// the thread's resolution chain apply to the whole object graph.
pub struct ResolverContext<'a> {
    provider: &'a ServiceProvider,
}

impl<'a> ResolverContext<'a> {
    /// Creates a new ResolverContext wrapping the given provider.
    pub(crate) fn new(provider: &'a ServiceProvider) -> Self {
        Self { provider }
    }

    /// The provider doing the construction.
    pub fn provider(&self) -> &ServiceProvider {
        self.provider
    }
}

impl<'a> ResolverCore for ResolverContext<'a> {
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>> {
        self.provider.resolve_any(key)
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.provider.is_registered(key)
    }
}
