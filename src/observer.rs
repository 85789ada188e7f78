//! Diagnostic observers for resolution and scope events.
//!
//! Observers are registered on the `ServiceCollection` and notified
//! synchronously by the provider. When none are registered the provider
//! skips the timing and notification work entirely.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::Key;
use crate::provider::ScopeId;

/// Observer trait for dependency injection resolution events.
///
/// Observer calls are made synchronously during resolution. Keep
/// implementations lightweight; nested resolutions notify too, so a single
/// top-level `get` produces one `resolving`/`resolved` pair per node of the
/// object graph.
///
/// # Examples
///
/// ```
/// use scopewire::{DiObserver, ServiceCollection, Key};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct CountingObserver {
///     resolved: AtomicUsize,
/// }
///
/// impl DiObserver for CountingObserver {
///     fn resolving(&self, _key: &Key) {}
///
///     fn resolved(&self, _key: &Key, _duration: Duration) {
///         self.resolved.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(CountingObserver::default()));
/// let provider = services.build();
/// ```
pub trait DiObserver: Send + Sync {
    /// Called when starting to resolve a service.
    fn resolving(&self, key: &Key);

    /// Called when a service is successfully resolved.
    ///
    /// # Arguments
    ///
    /// * `key` - The service key that was resolved
    /// * `duration` - Time elapsed from `resolving` to `resolved`
    fn resolved(&self, key: &Key, duration: Duration);

    /// Called when resolution of `key` fails. The error still propagates.
    fn resolution_failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }

    /// Called after a scope becomes active.
    fn scope_opened(&self, id: ScopeId) {
        let _ = id;
    }

    /// Called after a scope is closed and its cache discarded.
    fn scope_closed(&self, id: ScopeId) {
        let _ = id;
    }
}

/// Container for registered observers.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    /// Returns true if any observers are registered.
    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    #[inline]
    pub(crate) fn resolution_failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.resolution_failed(key, error);
        }
    }

    pub(crate) fn scope_opened(&self, id: ScopeId) {
        for observer in &self.observers {
            observer.scope_opened(id);
        }
    }

    pub(crate) fn scope_closed(&self, id: ScopeId) {
        for observer in &self.observers {
            observer.scope_closed(id);
        }
    }
}

/// Built-in observer that forwards every event to `tracing`.
///
/// Resolution events are emitted at `debug`, failures at `warn`. Install a
/// `tracing` subscriber to see them.
///
/// # Examples
///
/// ```
/// use scopewire::{ServiceCollection, LoggingObserver};
/// use std::sync::Arc;
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(LoggingObserver::with_prefix("[orders]")));
/// let provider = services.build();
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    /// Creates a new logging observer with default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "[scopewire]".to_string(),
        }
    }

    /// Creates a new logging observer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        tracing::debug!("{} Resolving: {}", self.prefix, key.display_name());
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::debug!("{} Resolved: {} in {:?}", self.prefix, key.display_name(), duration);
    }

    fn resolution_failed(&self, key: &Key, error: &DiError) {
        tracing::warn!("{} Failed to resolve {}: {}", self.prefix, key.display_name(), error);
    }

    fn scope_opened(&self, id: ScopeId) {
        tracing::debug!("{} Opened {}", self.prefix, id);
    }

    fn scope_closed(&self, id: ScopeId) {
        tracing::debug!("{} Closed {}", self.prefix, id);
    }
}
