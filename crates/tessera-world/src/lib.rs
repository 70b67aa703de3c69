//! Tessera World -- entities, components and the world controller.
//!
//! Entities live in a fixed-capacity [`Arena`] and are referred to through
//! generational [`Handle`]s, which stop validating the moment an entity is
//! destroyed. The [`World`] drives services and entities through their
//! lifecycle, deferring teardown of anything destroyed mid-update. Entities
//! are built from JSON templates whose component entries are resolved
//! through the `tessera-meta` reflection registry.
//!
//! # Quick Start
//!
//! ```
//! use serde_json::json;
//! use tessera_world::prelude::*;
//!
//! let mut registry = tessera_meta::MetaRegistry::new();
//! tessera_world::register_builtins(&mut registry);
//! registry.install().unwrap();
//!
//! let mut world = World::new();
//! world.initialize(16);
//!
//! let template = EntityTemplate::new()
//!     .with_component("ColliderComponent", json!({ "Extend": { "x": 1.0, "y": 1.0, "z": 1.0 } }));
//! let crate_box = world.create_from_template(&template, "crate");
//!
//! world.update(1.0 / 60.0);
//! assert!(crate_box.is_valid(&world));
//! assert!(crate_box.get(&world).unwrap().has_component::<Transform>());
//!
//! world.destroy(crate_box);
//! assert!(!crate_box.is_valid(&world));
//! ```

#![deny(unsafe_code)]

pub mod arena;
pub mod collider;
pub mod component;
pub mod debug_draw;
pub mod entity;
pub mod factory;
pub mod handle;
pub mod scene;
pub mod service;
pub mod transform;
pub mod world;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;

use tessera_meta::MetaRegistry;

pub use arena::{Arena, SlotIndex};
pub use collider::{Aabb, Collider};
pub use component::{AsAny, Component, ComponentContext, ComponentInfo, ComponentRegistry};
pub use debug_draw::{Color, DebugDraw, DebugShape};
pub use entity::Entity;
pub use factory::{EntityFactory, EntityTemplate};
pub use handle::{Handle, HandleTable};
pub use scene::{SceneDocument, SceneEntry};
pub use service::Service;
pub use transform::{Quat, Transform, Vec3};
pub use world::{World, WorldConfig};

/// Add the reflection classes of the built-in components to `registry`.
pub fn register_builtins(registry: &mut MetaRegistry) -> &mut MetaRegistry {
    registry
        .register::<Vec3>()
        .register::<Quat>()
        .register::<Transform>()
        .register::<Collider>()
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while reading or writing entity templates.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to access template '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template '{}' is not valid JSON", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document has no `GameObject` object at its root.
    #[error("template has no 'GameObject' object")]
    MissingGameObject,

    /// `GameObject.Components` is present but not an object.
    #[error("template 'GameObject.Components' is not an object")]
    InvalidComponents,
}

/// Errors produced while reading or writing scene documents.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to access scene '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scene '{}' is not valid JSON", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed scene document: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::arena::{Arena, SlotIndex};
    pub use crate::collider::Collider;
    pub use crate::component::{Component, ComponentContext, ComponentRegistry};
    pub use crate::debug_draw::DebugDraw;
    pub use crate::entity::Entity;
    pub use crate::factory::EntityTemplate;
    pub use crate::handle::Handle;
    pub use crate::scene::SceneDocument;
    pub use crate::service::Service;
    pub use crate::transform::{Quat, Transform, Vec3};
    pub use crate::world::{World, WorldConfig};
    pub use crate::{SceneError, TemplateError};
}
