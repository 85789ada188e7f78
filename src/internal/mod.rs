//! Internal implementation details.

pub(crate) mod active_scope;
pub(crate) mod circular;

pub(crate) use circular::{StackGuard, DEFAULT_MAX_DEPTH};
