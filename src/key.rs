//! Service key types for the dependency injection container.

use std::any::TypeId;
use std::fmt;

/// Key for service storage and lookup.
///
/// A key identifies one bindable type: a concrete struct, or a trait object
/// such as `dyn Logger`. Equality and hashing only look at the `TypeId`; the
/// name is carried along for diagnostics and error messages.
///
/// # Examples
///
/// ```rust
/// use scopewire::{Key, key_of_type};
///
/// trait Logger: Send + Sync {}
///
/// let a = key_of_type::<String>();
/// let b = Key::of::<String>();
/// assert_eq!(a, b);
/// assert_eq!(a.display_name(), "alloc::string::String");
///
/// let logger = Key::of::<dyn Logger>();
/// assert!(logger.display_name().contains("Logger"));
/// assert_ne!(logger, a);
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Creates the key for `T`, which may be a trait object.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Key {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Get the type or trait name for display
    pub fn display_name(&self) -> &'static str {
        self.name
    }

    /// The underlying `TypeId`.
    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// Hot path: TypeId-only comparison, the name is diagnostic only
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// Helper function for creating type keys - add aggressive inlining
#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}
