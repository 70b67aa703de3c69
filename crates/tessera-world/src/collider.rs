//! The built-in box collider component.

use crate::component::{Component, ComponentContext};
use crate::debug_draw::{Color, DebugDraw};
use crate::entity::Entity;
use crate::transform::{Transform, Vec3};

/// Axis-aligned bounding box: center plus half extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec3,
    pub extend: Vec3,
}

impl Aabb {
    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        self.center - self.extend
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        self.center + self.extend
    }

    /// Whether `point` lies inside or on the box.
    pub fn contains(&self, point: Vec3) -> bool {
        let (min, max) = (self.min(), self.max());
        (min.x..=max.x).contains(&point.x)
            && (min.y..=max.y).contains(&point.y)
            && (min.z..=max.z).contains(&point.z)
    }
}

/// Box collider positioned relative to the owner's [`Transform`].
///
/// Orientation and scale of the transform are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collider {
    pub center: Vec3,
    pub extend: Vec3,
}

tessera_meta::reflect_class!(Collider as "ColliderComponent" {
    center => "Center",
    extend => "Extend",
});

impl Collider {
    /// World-space box for an owner with the given transform.
    pub fn aabb(&self, transform: &Transform) -> Aabb {
        Aabb {
            center: transform.position + self.center,
            extend: self.extend,
        }
    }

    /// World-space box, using the owner's transform when it has one.
    pub fn world_aabb(&self, owner: &Entity) -> Aabb {
        match owner.component::<Transform>() {
            Some(transform) => self.aabb(transform),
            None => Aabb {
                center: self.center,
                extend: self.extend,
            },
        }
    }
}

impl Component for Collider {
    fn initialize(&mut self, ctx: &mut ComponentContext<'_>) {
        if ctx.sibling::<Transform>().is_none() {
            tracing::warn!(
                entity = ?ctx.owner(),
                "collider attached to an entity without a transform; using local space"
            );
        }
    }

    fn debug_ui(&self, owner: &Entity, draw: &mut DebugDraw) {
        let aabb = self.world_aabb(owner);
        draw.add_aabb(aabb.center, aabb.extend, Color::LIGHT_GREEN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_follows_transform_position() {
        let collider = Collider {
            center: Vec3::new(0.0, 1.0, 0.0),
            extend: Vec3::splat(0.5),
        };
        let transform = Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            ..Transform::default()
        };
        let aabb = collider.aabb(&transform);
        assert_eq!(aabb.center, Vec3::new(10.0, 1.0, 0.0));
        assert_eq!(aabb.min(), Vec3::new(9.5, 0.5, -0.5));
        assert!(aabb.contains(Vec3::new(10.2, 1.4, 0.0)));
        assert!(!aabb.contains(Vec3::ZERO));
    }

    #[test]
    fn world_aabb_reads_sibling_transform() {
        let mut owner = Entity::new();
        owner.add_component(Transform::default()).position = Vec3::new(0.0, 0.0, 5.0);
        let collider = Collider {
            center: Vec3::ZERO,
            extend: Vec3::ONE,
        };
        assert_eq!(collider.world_aabb(&owner).center, Vec3::new(0.0, 0.0, 5.0));
    }
}
