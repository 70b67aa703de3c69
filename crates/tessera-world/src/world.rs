//! The world controller.
//!
//! [`World`] owns the entity arena, the handle table, the ordered update
//! list and the services. Structural changes requested while the world is
//! updating are deferred: destroyed entities are unregistered at once (their
//! handles stop validating immediately) but torn down only after the update
//! pass finishes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tessera_meta::Reflect;

use crate::arena::{Arena, SlotIndex};
use crate::collider::Collider;
use crate::component::{Component, ComponentContext, ComponentRegistry};
use crate::debug_draw::DebugDraw;
use crate::entity::Entity;
use crate::factory::{EntityFactory, EntityTemplate};
use crate::handle::{Handle, HandleTable};
use crate::service::Service;
use crate::transform::Transform;

// ---------------------------------------------------------------------------
// WorldConfig
// ---------------------------------------------------------------------------

/// Settings for [`World::initialize_with`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Maximum number of live entities.
    pub capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Owner of all entities and services.
pub struct World {
    services: Vec<Box<dyn Service>>,
    components: ComponentRegistry,
    arena: Arena<Entity>,
    handles: HandleTable,
    /// Live entities in creation order.
    update_list: Vec<SlotIndex>,
    /// Entities destroyed during an update, torn down after it.
    destroy_list: Vec<SlotIndex>,
    debug_draw: DebugDraw,
    initialized: bool,
    updating: bool,
}

impl World {
    /// Create an uninitialized world with the built-in components
    /// registered.
    pub fn new() -> Self {
        let mut components = ComponentRegistry::new();
        components.register::<Transform>();
        components.register::<Collider>();
        Self {
            services: Vec::new(),
            components,
            arena: Arena::default(),
            handles: HandleTable::default(),
            update_list: Vec::new(),
            destroy_list: Vec::new(),
            debug_draw: DebugDraw::new(),
            initialized: false,
            updating: false,
        }
    }

    // -- registration ------------------------------------------------------

    /// Make `T` constructible from templates by its class name.
    pub fn register_component<T>(&mut self) -> &mut Self
    where
        T: Component + Reflect + Default,
    {
        self.components.register::<T>();
        self
    }

    /// Component types known to this world.
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Add a service. Services receive lifecycle calls in the order they
    /// were added.
    ///
    /// # Panics
    ///
    /// Panics if the world is already initialized.
    pub fn add_service<T: Service>(&mut self, service: T) -> &mut T {
        assert!(
            !self.initialized,
            "cannot add a service after the world is initialized"
        );
        self.services.push(Box::new(service));
        self.services
            .last_mut()
            .and_then(|service| (**service).as_any_mut().downcast_mut::<T>())
            .expect("service was just inserted")
    }

    /// First service of type `T`.
    pub fn service<T: Service>(&self) -> Option<&T> {
        self.services
            .iter()
            .find_map(|service| (**service).as_any().downcast_ref::<T>())
    }

    /// Mutable access to the first service of type `T`.
    pub fn service_mut<T: Service>(&mut self) -> Option<&mut T> {
        self.services
            .iter_mut()
            .find_map(|service| (**service).as_any_mut().downcast_mut::<T>())
    }

    // -- lifecycle -----------------------------------------------------------

    /// Initialize services and allocate room for `capacity` entities.
    ///
    /// # Panics
    ///
    /// Panics if the world is already initialized, or if `capacity` does not
    /// fit in a 32-bit slot index.
    pub fn initialize(&mut self, capacity: usize) {
        assert!(!self.initialized, "world is already initialized");

        for service in &mut self.services {
            tracing::debug!(service = service.name(), "initializing service");
            service.initialize();
        }
        self.arena = Arena::new(capacity);
        self.handles.resize(capacity);
        self.initialized = true;

        tracing::info!(
            capacity,
            services = self.services.len(),
            "world initialized"
        );
    }

    /// [`initialize`](Self::initialize) with settings from a [`WorldConfig`].
    pub fn initialize_with(&mut self, config: &WorldConfig) {
        self.initialize(config.capacity);
    }

    /// Destroy every entity, release storage and terminate services.
    ///
    /// Does nothing if the world is not initialized.
    ///
    /// # Panics
    ///
    /// Panics if called while the world is updating.
    pub fn terminate(&mut self) {
        if !self.initialized {
            return;
        }
        assert!(!self.updating, "cannot terminate the world during an update");

        let live = self.update_list.len();
        self.updating = true;
        for handle in self.live_handles() {
            self.destroy(handle);
        }
        self.updating = false;
        self.update_list.clear();
        self.process_destroy_list();

        self.arena = Arena::default();
        // Generations are kept so handles from this run stay stale.
        self.handles.resize(0);

        for service in &mut self.services {
            tracing::debug!(service = service.name(), "terminating service");
            service.terminate();
        }
        self.initialized = false;

        tracing::info!(destroyed = live, "world terminated");
    }

    // -- entities ------------------------------------------------------------

    /// Create an entity from the template file at `template` and name it.
    ///
    /// An empty path creates an entity with only a transform. Returns
    /// [`Handle::NULL`] if the world has no free slot (or is not
    /// initialized).
    pub fn create(&mut self, template: impl AsRef<Path>, name: impl Into<String>) -> Handle {
        let template = template.as_ref();
        let slot = EntityFactory::create(&mut self.arena, &self.components, template);
        if slot.is_none() {
            tracing::warn!(
                template = %template.display(),
                capacity = self.arena.capacity(),
                "failed to create entity: world is full"
            );
        }
        self.register_created(slot, name.into())
    }

    /// Create an entity from an in-memory template.
    pub fn create_from_template(
        &mut self,
        template: &EntityTemplate,
        name: impl Into<String>,
    ) -> Handle {
        let slot = EntityFactory::create_from_template(&mut self.arena, &self.components, template);
        if slot.is_none() {
            tracing::warn!(
                capacity = self.arena.capacity(),
                "failed to create entity: world is full"
            );
        }
        self.register_created(slot, name.into())
    }

    fn register_created(&mut self, slot: Option<SlotIndex>, name: String) -> Handle {
        let Some(slot) = slot else {
            return Handle::NULL;
        };
        let Some(handle) = self.handles.register(slot) else {
            tracing::warn!(?slot, "slot already has a live handle; discarding entity");
            if let Some(mut entity) = EntityFactory::destroy(&mut self.arena, slot) {
                entity.terminate();
            }
            return Handle::NULL;
        };
        if let Some(entity) = self.arena.get_mut(slot) {
            entity.set_identity(name, handle);
        }

        self.run_hooks(slot, handle, |component, ctx| component.initialize(ctx));

        // Initialization may have destroyed the entity outright.
        if self.entity_at(slot).is_some_and(|entity| entity.handle() == handle) {
            self.update_list.push(slot);
        }
        tracing::debug!(entity = ?handle, "created entity");
        handle
    }

    /// Handle of the first live entity named `name` in creation order, or
    /// [`Handle::NULL`].
    pub fn find(&self, name: &str) -> Handle {
        self.entities()
            .find(|entity| entity.name() == name)
            .map_or(Handle::NULL, Entity::handle)
    }

    /// Destroy the entity behind `handle`.
    ///
    /// The handle (and all copies) stop validating immediately. During an
    /// update the teardown is deferred until the update finishes; otherwise
    /// it happens now. Stale handles are ignored.
    pub fn destroy(&mut self, handle: Handle) {
        let Some(slot) = self.handles.get(handle) else {
            return;
        };
        self.handles.unregister(handle);

        if self.updating {
            self.destroy_list.push(slot);
            tracing::trace!(entity = ?handle, "deferred entity destroy");
        } else {
            self.destroy_internal(slot);
        }
    }

    fn destroy_internal(&mut self, slot: SlotIndex) {
        assert!(!self.updating, "cannot tear down entities during an update");

        if let Some(position) = self.update_list.iter().position(|&s| s == slot) {
            self.update_list.remove(position);
        }
        if let Some(mut entity) = EntityFactory::destroy(&mut self.arena, slot) {
            entity.terminate();
            tracing::debug!(entity = ?entity.handle(), name = entity.name(), "destroyed entity");
        }
    }

    fn process_destroy_list(&mut self) {
        if self.destroy_list.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.destroy_list);
        tracing::trace!(count = pending.len(), "processing deferred destroys");
        for slot in pending {
            self.destroy_internal(slot);
        }
    }

    // -- per-frame -----------------------------------------------------------

    /// Update services, then every live entity in creation order.
    ///
    /// Entities created during the pass are updated in the same pass;
    /// entities destroyed during it are skipped and torn down at the end.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly.
    pub fn update(&mut self, delta_time: f32) {
        assert!(!self.updating, "world is already updating");
        self.updating = true;

        for service in &mut self.services {
            service.update(delta_time);
        }

        let mut i = 0;
        while i < self.update_list.len() {
            let slot = self.update_list[i];
            i += 1;
            let Some(handle) = self.entity_at(slot).map(Entity::handle) else {
                continue;
            };
            if !self.handles.is_valid(handle) {
                continue;
            }
            self.run_hooks(slot, handle, |component, ctx| {
                component.update(ctx, delta_time)
            });
        }

        self.updating = false;
        self.process_destroy_list();
    }

    /// Render services, then every live entity in creation order.
    pub fn render(&self) {
        for service in &self.services {
            service.render();
        }
        for entity in self.update_list.iter().filter_map(|&slot| self.arena.get(slot)) {
            for component in entity.components() {
                component.render(entity);
            }
        }
    }

    /// Collect debug shapes from services and entities into
    /// [`debug_draw`](Self::debug_draw), replacing the previous pass.
    pub fn debug_ui(&mut self) {
        let draw = &mut self.debug_draw;
        draw.clear();
        for service in &self.services {
            service.debug_ui(draw);
        }
        for &slot in &self.update_list {
            if let Some(entity) = self.arena.get(slot) {
                for component in entity.components() {
                    component.debug_ui(entity, draw);
                }
            }
        }
    }

    /// Shapes collected by the last [`debug_ui`](Self::debug_ui) pass.
    pub fn debug_draw(&self) -> &DebugDraw {
        &self.debug_draw
    }

    /// Mutable access to the debug-draw sink.
    pub fn debug_draw_mut(&mut self) -> &mut DebugDraw {
        &mut self.debug_draw
    }

    /// Run a hook on each component of the entity at `slot`, detaching the
    /// component for the duration of the call.
    fn run_hooks<F>(&mut self, slot: SlotIndex, owner: Handle, mut hook: F)
    where
        F: FnMut(&mut dyn Component, &mut ComponentContext<'_>),
    {
        let mut index = 0;
        loop {
            let Some(entity) = self.entity_at_mut(slot).filter(|e| e.handle() == owner) else {
                break;
            };
            if index >= entity.component_count() {
                break;
            }
            let Some(mut component) = entity.take_component(index) else {
                index += 1;
                continue;
            };

            let mut ctx = ComponentContext {
                world: &mut *self,
                owner,
                slot,
            };
            hook(&mut *component, &mut ctx);

            match self.entity_at_mut(slot).filter(|e| e.handle() == owner) {
                Some(entity) => entity.restore_component(index, component),
                // The owner was torn down while this component was detached.
                None => component.terminate(),
            }
            index += 1;
        }
    }

    // -- introspection -------------------------------------------------------

    /// Whether `handle` refers to a live entity.
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.handles.is_valid(handle)
    }

    /// The entity behind `handle`, if it is still valid.
    pub fn get(&self, handle: Handle) -> Option<&Entity> {
        self.handles
            .get(handle)
            .and_then(|slot| self.arena.get(slot))
    }

    /// Mutable access to the entity behind `handle`, if it is still valid.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Entity> {
        let slot = self.handles.get(handle)?;
        self.arena.get_mut(slot)
    }

    pub(crate) fn entity_at(&self, slot: SlotIndex) -> Option<&Entity> {
        self.arena.get(slot)
    }

    pub(crate) fn entity_at_mut(&mut self, slot: SlotIndex) -> Option<&mut Entity> {
        self.arena.get_mut(slot)
    }

    /// Live entities in creation order. Entities destroyed during the
    /// current update are excluded.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.update_list
            .iter()
            .filter_map(|&slot| self.arena.get(slot))
            .filter(|entity| self.handles.is_valid(entity.handle()))
    }

    /// Handles of [`entities`](Self::entities).
    pub fn live_handles(&self) -> Vec<Handle> {
        self.entities().map(Entity::handle).collect()
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities().count()
    }

    /// Entities destroyed during the current update and not yet torn down.
    pub fn pending_destroy_count(&self) -> usize {
        self.destroy_list.len()
    }

    /// Number of entity slots.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Whether [`initialize`](Self::initialize) has run without a matching terminate.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether an update pass is running.
    pub fn is_updating(&self) -> bool {
        self.updating
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for World {
    fn drop(&mut self) {
        if self.initialized && !self.updating {
            self.terminate();
        }
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("initialized", &self.initialized)
            .field("updating", &self.updating)
            .field("capacity", &self.arena.capacity())
            .field("entities", &self.update_list.len())
            .field("pending_destroy", &self.destroy_list.len())
            .field("services", &self.services.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
