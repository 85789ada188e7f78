//! Circular dependency detection infrastructure.
//!
//! Each thread keeps the chain of keys it is currently constructing. A key
//! that shows up again in its own ancestor chain is a cycle; it is reported
//! as an error before any cache cell is touched, so a cycle can never
//! re-enter a cell that is already being initialized on this thread.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::key::Key;

pub(crate) const DEFAULT_MAX_DEPTH: usize = 1024;

// Thread-local resolution state for circular dependency detection
thread_local! {
    static RESOLUTION_TLS: RefCell<Vec<Key>> = const { RefCell::new(Vec::new()) };
}

/// Guard for one entry in the thread-local resolution chain.
///
/// Popping happens in `Drop`, so the chain stays balanced on error returns
/// and while a constructor panic unwinds.
pub(crate) struct StackGuard {
    key: Key,
}

impl StackGuard {
    pub(crate) fn enter(key: Key, max_depth: usize) -> DiResult<Self> {
        RESOLUTION_TLS.with(|tls| {
            let mut stack = tls.borrow_mut();

            // Circular detection BEFORE pushing the new key
            if stack.contains(&key) {
                let mut path: Vec<&'static str> = stack.iter().map(Key::display_name).collect();
                path.push(key.display_name());
                return Err(DiError::Circular(path));
            }

            if stack.len() >= max_depth {
                return Err(DiError::DepthExceeded(stack.len()));
            }

            stack.push(key);
            Ok(Self { key })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            if let Some(last) = tls.borrow_mut().pop() {
                debug_assert_eq!(last, self.key);
            }
        });
    }
}

#[cfg(test)]
pub(crate) fn chain_depth() -> usize {
    RESOLUTION_TLS.with(|tls| tls.borrow().len())
}
