//! Container tuning options.

use crate::internal::DEFAULT_MAX_DEPTH;

/// Options applied when a `ServiceCollection` is built.
///
/// # Examples
///
/// ```
/// use scopewire::{ContainerOptions, ServiceCollection};
///
/// let mut services = ServiceCollection::new();
/// services.with_options(ContainerOptions::default().max_depth(64).validate_on_build(true));
/// let provider = services.try_build().expect("empty collection is valid");
/// assert_eq!(provider.options().max_depth, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerOptions {
    /// Longest resolution chain before `DiError::DepthExceeded`
    pub max_depth: usize,
    /// Whether `try_build` runs `validate` and rejects a collection with errors
    pub validate_on_build: bool,
}

impl ContainerOptions {
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn validate_on_build(mut self, enabled: bool) -> Self {
        self.validate_on_build = enabled;
        self
    }
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            validate_on_build: false,
        }
    }
}
