//! Static validation of a service collection's dependency graph.
//!
//! Validation walks the dependencies each binding declares and reports
//! configuration problems before anything is constructed. It never changes
//! runtime behavior: a collection with errors still builds with
//! [`ServiceCollection::build`](crate::ServiceCollection::build) and fails
//! on first use instead.
//!
//! # Rules
//!
//! - **Missing dependency**: error. A required dependency has no binding.
//!   Optional dependencies (`Option<Arc<T>>`) are never reported.
//! - **Circular dependency**: error. Resolving any service on the cycle
//!   fails with `DiError::Circular`.
//! - **Singleton → Scoped**: warning. Legal, but the singleton captures the
//!   scoped instance of whichever scope was active at its first resolution.
//!   Transient links in between are followed.
//! - **Replaced registration**: warning. A key was bound more than once and
//!   only the last binding is used.
//!
//! # Examples
//!
//! ```
//! use scopewire::{ConstructError, Injectable, ServiceCollection, ValidationError};
//! use std::sync::Arc;
//!
//! struct Settings;
//! struct Mailer { settings: Arc<Settings> }
//! impl Injectable for Mailer {
//!     type Deps = (Arc<Settings>,);
//!     fn construct((settings,): Self::Deps) -> Result<Self, ConstructError> {
//!         Ok(Mailer { settings })
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton::<Mailer>();
//!
//! let report = services.validate();
//! assert!(!report.is_valid());
//! assert!(matches!(
//!     &report.errors[0],
//!     ValidationError::MissingDependency { dependency, .. } if dependency.ends_with("Settings")
//! ));
//! ```

use std::collections::HashSet;
use std::fmt;

use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::Registry;

/// Result of validating a collection.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Problems that make resolution fail
    pub errors: Vec<ValidationError>,
    /// Legal but probably unintended configuration
    pub warnings: Vec<ValidationWarning>,
}

/// A validation error that makes some resolution fail at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required dependency is not registered
    MissingDependency {
        service: &'static str,
        dependency: &'static str,
    },
    /// Circular dependency; the first name is repeated at the end
    CircularDependency { cycle: Vec<&'static str> },
}

/// A validation warning about potentially problematic configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Singleton reaches a scoped service (directly or through transients)
    SingletonDependsOnScoped {
        singleton: &'static str,
        scoped: &'static str,
    },
    /// The key was registered more than once; the last registration is used
    ReplacedRegistration { service: &'static str },
}

impl ValidationReport {
    /// Returns true if validation passed without errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if there are warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Formats errors and warnings for display.
    pub fn format_issues(&self) -> String {
        let mut output = String::new();

        if !self.errors.is_empty() {
            output.push_str("Validation Errors:\n");
            for error in &self.errors {
                output.push_str(&format!("  - {}\n", error));
            }
        }

        if !self.warnings.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str("Validation Warnings:\n");
            for warning in &self.warnings {
                output.push_str(&format!("  - {}\n", warning));
            }
        }

        output
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} validation error(s), {} warning(s)",
            self.errors.len(),
            self.warnings.len()
        )?;
        if let Some(first) = self.errors.first() {
            write!(f, ": {}", first)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingDependency { service, dependency } => {
                write!(f, "Service '{}' depends on unregistered service '{}'", service, dependency)
            }
            ValidationError::CircularDependency { cycle } => {
                write!(f, "Circular dependency detected: {}", cycle.join(" -> "))
            }
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::SingletonDependsOnScoped { singleton, scoped } => write!(
                f,
                "Singleton '{}' depends on scoped service '{}' and will keep the instance of the first scope",
                singleton, scoped
            ),
            ValidationWarning::ReplacedRegistration { service } => {
                write!(f, "Service '{}' was registered more than once; the last registration is used", service)
            }
        }
    }
}

pub(crate) fn validate_registry(registry: &Registry) -> ValidationReport {
    let mut report = ValidationReport::default();

    // Sorted so reports are stable across runs
    let mut keys: Vec<Key> = registry.iter().map(|(k, _)| *k).collect();
    keys.sort_by_key(|k| k.display_name());

    for key in &keys {
        if let Some(reg) = registry.get(key) {
            for dep in &reg.dependencies {
                if !dep.optional && !registry.contains_key(&dep.key) {
                    report.errors.push(ValidationError::MissingDependency {
                        service: key.display_name(),
                        dependency: dep.key.display_name(),
                    });
                }
            }
        }
    }

    for cycle in detect_cycles(registry, &keys) {
        report.errors.push(ValidationError::CircularDependency { cycle });
    }

    for key in &keys {
        let is_singleton = registry.get(key).map_or(false, |r| r.lifetime == Lifetime::Singleton);
        if !is_singleton {
            continue;
        }
        for scoped in captive_scoped(registry, *key) {
            report.warnings.push(ValidationWarning::SingletonDependsOnScoped {
                singleton: key.display_name(),
                scoped: scoped.display_name(),
            });
        }
    }

    let mut seen = HashSet::new();
    for key in &registry.replaced {
        if seen.insert(*key) {
            report.warnings.push(ValidationWarning::ReplacedRegistration {
                service: key.display_name(),
            });
        }
    }

    report
}

/// Registered dependencies of `key`, in declaration order.
fn edges(registry: &Registry, key: &Key) -> Vec<Key> {
    registry
        .get(key)
        .map(|reg| {
            reg.dependencies
                .iter()
                .map(|d| d.key)
                .filter(|k| registry.contains_key(k))
                .collect()
        })
        .unwrap_or_default()
}

/// Detects circular dependencies using DFS.
fn detect_cycles(registry: &Registry, keys: &[Key]) -> Vec<Vec<&'static str>> {
    let mut visited = HashSet::new();
    let mut path = Vec::new();
    let mut cycles = Vec::new();

    for key in keys {
        if !visited.contains(key) {
            dfs_cycles(registry, *key, &mut visited, &mut path, &mut cycles);
        }
    }

    cycles
}

fn dfs_cycles(
    registry: &Registry,
    current: Key,
    visited: &mut HashSet<Key>,
    path: &mut Vec<Key>,
    cycles: &mut Vec<Vec<&'static str>>,
) {
    if let Some(cycle_start) = path.iter().position(|k| *k == current) {
        let cycle = path[cycle_start..]
            .iter()
            .chain(std::iter::once(&current))
            .map(|k| k.display_name())
            .collect();
        cycles.push(cycle);
        return;
    }

    if !visited.insert(current) {
        return;
    }

    path.push(current);
    for dep in edges(registry, &current) {
        dfs_cycles(registry, dep, visited, path, cycles);
    }
    path.pop();
}

/// Scoped services a singleton reaches without passing another cache.
fn captive_scoped(registry: &Registry, singleton: Key) -> Vec<Key> {
    let mut found = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = edges(registry, &singleton);
    stack.reverse();

    while let Some(key) = stack.pop() {
        if !visited.insert(key) {
            continue;
        }
        match registry.get(&key).map(|r| r.lifetime) {
            Some(Lifetime::Scoped) => found.push(key),
            Some(Lifetime::Transient) => {
                let mut next = edges(registry, &key);
                next.reverse();
                stack.extend(next);
            }
            // Another singleton owns its own dependencies
            _ => {}
        }
    }

    found
}
