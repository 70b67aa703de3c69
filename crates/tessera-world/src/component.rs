//! Component behaviour and type registration.
//!
//! A [`Component`] is a unit of data plus lifecycle hooks attached to an
//! [`Entity`]. Component types that can be built from templates are
//! registered in a [`ComponentRegistry`], which pairs each type's reflection
//! class with a constructor.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use tessera_meta::{MetaClass, Reflect};

use crate::arena::SlotIndex;
use crate::debug_draw::DebugDraw;
use crate::entity::Entity;
use crate::factory::EntityTemplate;
use crate::handle::Handle;
use crate::world::World;

// ---------------------------------------------------------------------------
// AsAny
// ---------------------------------------------------------------------------

/// Upcast to [`Any`] for downcasting trait objects.
///
/// Implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Behaviour attached to an entity.
///
/// Every hook has an empty default. Hooks that may change the world receive
/// a [`ComponentContext`]; while a hook runs, the component itself is
/// detached from its entity, so sibling lookups never alias it.
pub trait Component: AsAny {
    /// Called once after the owning entity has its name and handle.
    fn initialize(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called when the owning entity is destroyed. Components are terminated
    /// in the reverse of the order they were added.
    fn terminate(&mut self) {}

    fn update(&mut self, _ctx: &mut ComponentContext<'_>, _delta_time: f32) {}

    fn render(&self, _owner: &Entity) {}

    fn debug_ui(&self, _owner: &Entity, _draw: &mut DebugDraw) {}
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("type_id", &self.as_any().type_id())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ComponentInfo
// ---------------------------------------------------------------------------

/// Metadata about a registered component type.
#[derive(Clone, Copy)]
pub struct ComponentInfo {
    /// Reflection class; its name is the template key.
    pub meta: &'static MetaClass,
    /// Builds a default instance.
    pub construct: fn() -> Box<dyn Component>,
}

impl ComponentInfo {
    /// Class name, used as the template key.
    pub fn name(&self) -> &'static str {
        self.meta.name()
    }

    /// `TypeId` of the component type.
    pub fn type_id(&self) -> TypeId {
        self.meta.type_id()
    }
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

fn construct<T: Component + Default>() -> Box<dyn Component> {
    Box::new(T::default())
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Registry mapping component types to their reflection class and
/// constructor.
///
/// A type can only be registered once; registering it again is a no-op.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, usize>,
    /// Class name -> index, for template lookup.
    by_name: HashMap<&'static str, usize>,
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under the name of its reflection class.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not reflected as a class, or if another type already
    /// uses the same class name.
    pub fn register<T>(&mut self) -> &ComponentInfo
    where
        T: Component + Reflect + Default,
    {
        let type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return &self.infos[existing];
        }

        let meta_type = T::meta_type();
        let Some(meta) = meta_type.as_meta_class() else {
            panic!("component type '{}' is not a reflected class", meta_type.name());
        };
        if self.by_name.contains_key(meta.name()) {
            panic!(
                "component name '{}' is already registered for a different type",
                meta.name()
            );
        }

        let index = self.infos.len();
        self.infos.push(ComponentInfo {
            meta,
            construct: construct::<T>,
        });
        self.by_type.insert(type_id, index);
        self.by_name.insert(meta.name(), index);
        tracing::trace!(component = meta.name(), "registered component type");
        &self.infos[index]
    }

    /// Info for the component type with `type_id`.
    pub fn get_by_type(&self, type_id: TypeId) -> Option<&ComponentInfo> {
        self.by_type.get(&type_id).map(|&index| &self.infos[index])
    }

    /// Info for the component class named `name`.
    pub fn get_by_name(&self, name: &str) -> Option<&ComponentInfo> {
        self.by_name.get(name).map(|&index| &self.infos[index])
    }

    /// Info for the concrete type behind `component`.
    pub fn info_of(&self, component: &dyn Component) -> Option<&ComponentInfo> {
        self.get_by_type(component.as_any().type_id())
    }

    /// Whether `T` has been registered.
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    /// Registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.infos.iter()
    }

    /// Number of registered component types.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether no component type is registered.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ComponentContext
// ---------------------------------------------------------------------------

/// Access to the world from inside a component hook.
///
/// The component running the hook is detached from its entity for the
/// duration of the call; [`sibling`](Self::sibling) sees every other
/// component of the owner.
pub struct ComponentContext<'w> {
    pub(crate) world: &'w mut World,
    pub(crate) owner: Handle,
    pub(crate) slot: SlotIndex,
}

impl<'w> ComponentContext<'w> {
    /// Handle of the entity that owns the running component.
    pub fn owner(&self) -> Handle {
        self.owner
    }

    /// The owning entity. Still available after the owner was destroyed
    /// during an update, until the deferred teardown runs.
    pub fn owner_entity(&self) -> Option<&Entity> {
        self.world
            .entity_at(self.slot)
            .filter(|entity| entity.handle() == self.owner)
    }

    /// Mutable access to the owning entity.
    pub fn owner_entity_mut(&mut self) -> Option<&mut Entity> {
        let owner = self.owner;
        self.world
            .entity_at_mut(self.slot)
            .filter(|entity| entity.handle() == owner)
    }

    /// First other component of the owner with type `T`.
    pub fn sibling<T: Component>(&self) -> Option<&T> {
        self.owner_entity()?.component::<T>()
    }

    /// Mutable access to the first other component of type `T`.
    pub fn sibling_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.owner_entity_mut()?.component_mut::<T>()
    }

    /// The whole world, read-only.
    pub fn world(&self) -> &World {
        self.world
    }

    /// The whole world. Structural changes follow the usual deferral rules.
    pub fn world_mut(&mut self) -> &mut World {
        self.world
    }

    /// See [`World::create`].
    pub fn create(&mut self, template: impl AsRef<Path>, name: impl Into<String>) -> Handle {
        self.world.create(template, name)
    }

    /// See [`World::create_from_template`].
    pub fn create_from_template(
        &mut self,
        template: &EntityTemplate,
        name: impl Into<String>,
    ) -> Handle {
        self.world.create_from_template(template, name)
    }

    /// See [`World::find`].
    pub fn find(&self, name: &str) -> Handle {
        self.world.find(name)
    }

    /// See [`World::destroy`]. Destroying the owner is allowed.
    pub fn destroy(&mut self, handle: Handle) {
        self.world.destroy(handle);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
