//! Service registration types.

use std::any::Any;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::DiResult;
use crate::injectable::DependencyInfo;
use crate::key::Key;
use crate::lifetime::Lifetime;

// ResolverContext is defined in provider module
pub(crate) use crate::provider::ResolverContext;

// Type-erased storage. The payload is always an `Arc<T>` so that trait
// objects and concrete types share one representation.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Ctor = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

#[cfg(feature = "ahash")]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V>;

/// Service registration with lifetime and constructor
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    pub(crate) ctor: Ctor,
    /// Implementation type name; differs from the key for trait bindings
    pub(crate) impl_name: &'static str,
    /// Declared constructor dependencies, in order
    pub(crate) dependencies: Vec<DependencyInfo>,
    /// Registered with a ready-made value; never constructed or intercepted
    pub(crate) prebuilt: bool,
    /// Singleton cache, initialized at most once
    pub(crate) singleton: Option<OnceCell<AnyArc>>,
    /// Scoped slot index, assigned by `Registry::finalize`
    pub(crate) scoped_slot: Option<usize>,
}

impl Registration {
    pub(crate) fn new(
        lifetime: Lifetime,
        impl_name: &'static str,
        dependencies: Vec<DependencyInfo>,
        ctor: Ctor,
    ) -> Self {
        let singleton = match lifetime {
            Lifetime::Singleton => Some(OnceCell::new()),
            _ => None,
        };

        Self {
            lifetime,
            ctor,
            impl_name,
            dependencies,
            prebuilt: false,
            singleton,
            scoped_slot: None,
        }
    }

    /// A singleton whose instance already exists.
    pub(crate) fn prebuilt(impl_name: &'static str, value: AnyArc) -> Self {
        let stored = value.clone();
        let ctor: Ctor = Arc::new(move |_: &ResolverContext<'_>| Ok(stored.clone()));
        Self {
            lifetime: Lifetime::Singleton,
            ctor,
            impl_name,
            dependencies: Vec::new(),
            prebuilt: true,
            singleton: Some(OnceCell::with_value(value)),
            scoped_slot: None,
        }
    }
}

/// Service registry holding all registrations
#[derive(Default)]
pub(crate) struct Registry {
    entries: Map<Key, Registration>,
    /// Keys whose binding was overwritten by a later registration
    pub(crate) replaced: Vec<Key>,
    /// Total count of scoped registrations for slot allocation
    pub(crate) scoped_count: usize,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts a registration. Last write wins; the replaced key is recorded.
    pub(crate) fn insert(&mut self, key: Key, registration: Registration) -> bool {
        let replaced = self.entries.insert(key, registration).is_some();
        if replaced {
            self.replaced.push(key);
        }
        replaced
    }

    #[inline(always)]
    pub(crate) fn get(&self, key: &Key) -> Option<&Registration> {
        self.entries.get(key)
    }

    #[inline(always)]
    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterator over all key-registration pairs
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Registration)> {
        self.entries.iter()
    }

    /// Finalizes registry by assigning scoped slot indices
    pub(crate) fn finalize(&mut self) {
        let mut next_scoped_slot = 0;

        for reg in self.entries.values_mut() {
            if reg.lifetime == Lifetime::Scoped {
                reg.scoped_slot = Some(next_scoped_slot);
                next_scoped_slot += 1;
            }
        }

        self.scoped_count = next_scoped_slot;
    }
}
