//! The process-wide class registry.
//!
//! Classes are collected into a [`MetaRegistry`] by an explicit bootstrap step
//! and then [installed](MetaRegistry::install) exactly once. After that the
//! registry is read-only: lookups by name go through [`find_meta_class`].

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::class::MetaClass;
use crate::{MetaError, Reflect};

static REGISTRY: OnceLock<MetaRegistry> = OnceLock::new();

/// Name -> class table.
#[derive(Debug, Default)]
pub struct MetaRegistry {
    by_name: HashMap<&'static str, &'static MetaClass>,
    /// Registration order, for listing.
    classes: Vec<&'static MetaClass>,
}

impl MetaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the class descriptor of `T`.
    ///
    /// Registering the same type twice is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not a class, or if a different class already uses the
    /// same name.
    pub fn register<T: Reflect>(&mut self) -> &mut Self {
        let meta = T::meta_type();
        let class = match meta.as_meta_class() {
            Some(class) => class,
            None => panic!("{}", MetaError::NotAClass(meta.name().to_owned())),
        };
        if let Some(existing) = self.by_name.get(class.name()) {
            assert!(
                existing.type_id() == class.type_id(),
                "class name '{}' is already registered for a different type",
                class.name()
            );
            return self;
        }
        self.by_name.insert(class.name(), class);
        self.classes.push(class);
        tracing::trace!(class = class.name(), "registered meta class");
        self
    }

    /// Look up a class by its exact name.
    pub fn find_meta_class(&self, name: &str) -> Option<&'static MetaClass> {
        self.by_name.get(name).copied()
    }

    /// Registered classes in registration order.
    pub fn classes(&self) -> impl Iterator<Item = &'static MetaClass> + '_ {
        self.classes.iter().copied()
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no class has been registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Sorted class names, for diagnostics.
    pub fn registered_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.by_name.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Make this registry the process-wide one.
    ///
    /// Fails with [`MetaError::AlreadyInstalled`] if a registry was installed
    /// before; the earlier registry stays in place.
    pub fn install(self) -> Result<&'static MetaRegistry, MetaError> {
        let count = self.len();
        REGISTRY
            .set(self)
            .map_err(|_| MetaError::AlreadyInstalled)?;
        tracing::debug!(classes = count, "installed reflection registry");
        registry().ok_or(MetaError::AlreadyInstalled)
    }
}

/// The installed registry, if any.
pub fn registry() -> Option<&'static MetaRegistry> {
    REGISTRY.get()
}

/// Look up a class by name in the installed registry.
///
/// Returns `None` if no registry is installed or the name is unknown.
pub fn find_meta_class(name: &str) -> Option<&'static MetaClass> {
    registry()?.find_meta_class(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
