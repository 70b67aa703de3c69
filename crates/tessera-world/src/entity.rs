//! Entities: a name, a handle and an ordered list of components.

use std::fmt;

use crate::component::Component;
use crate::handle::Handle;

/// A named container of components living in a [`World`](crate::World).
///
/// Entities are created by the world and stored in its arena; user code
/// reaches them through a [`Handle`].
pub struct Entity {
    name: String,
    handle: Handle,
    /// A slot is `None` only while its component is running a hook.
    components: Vec<Option<Box<dyn Component>>>,
}

impl Entity {
    pub(crate) fn new() -> Self {
        Self {
            name: String::new(),
            handle: Handle::NULL,
            components: Vec::new(),
        }
    }

    /// Name given at creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The handle this entity was created with.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub(crate) fn set_identity(&mut self, name: String, handle: Handle) {
        self.name = name;
        self.handle = handle;
    }

    /// Append a component and return a reference to it.
    pub fn add_component<T: Component>(&mut self, component: T) -> &mut T {
        let index = self.add_boxed(Box::new(component));
        self.components[index]
            .as_deref_mut()
            .and_then(|component| component.as_any_mut().downcast_mut::<T>())
            .expect("component was just inserted")
    }

    pub(crate) fn add_boxed(&mut self, component: Box<dyn Component>) -> usize {
        self.components.push(Some(component));
        self.components.len() - 1
    }

    /// First component of type `T`.
    pub fn component<T: Component>(&self) -> Option<&T> {
        self.components()
            .find_map(|component| component.as_any().downcast_ref::<T>())
    }

    /// Mutable access to the first component of type `T`.
    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .filter_map(|slot| slot.as_deref_mut())
            .find_map(|component| component.as_any_mut().downcast_mut::<T>())
    }

    /// Whether a component of type `T` is attached.
    pub fn has_component<T: Component>(&self) -> bool {
        self.component::<T>().is_some()
    }

    /// Attached components in insertion order.
    pub fn components(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.iter().filter_map(|slot| slot.as_deref())
    }

    /// Number of attached components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub(crate) fn take_component(&mut self, index: usize) -> Option<Box<dyn Component>> {
        self.components.get_mut(index)?.take()
    }

    pub(crate) fn restore_component(&mut self, index: usize, component: Box<dyn Component>) {
        if let Some(slot) = self.components.get_mut(index) {
            *slot = Some(component);
        }
    }

    /// Terminate every component, last added first.
    pub(crate) fn terminate(&mut self) {
        for component in self.components.iter_mut().rev().flatten() {
            component.terminate();
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("components", &self.components.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
