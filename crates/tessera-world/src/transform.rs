//! Spatial math values and the built-in transform component.

use std::ops::{Add, Mul, Sub};

use crate::component::{Component, ComponentContext};
use crate::debug_draw::DebugDraw;
use crate::entity::Entity;

// ---------------------------------------------------------------------------
// Vec3
// ---------------------------------------------------------------------------

/// 3D vector, reflected as `Vector3`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

tessera_meta::reflect_class!(Vec3 as "Vector3" {
    x => "x",
    y => "y",
    z => "z",
});

impl Vec3 {
    /// All zeros.
    pub const ZERO: Vec3 = Vec3::splat(0.0);
    /// All ones.
    pub const ONE: Vec3 = Vec3::splat(1.0);

    /// Vector from its components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Vector with every component set to `value`.
    pub const fn splat(value: f32) -> Self {
        Self::new(value, value, value)
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

// ---------------------------------------------------------------------------
// Quat
// ---------------------------------------------------------------------------

/// Rotation quaternion. Defaults to the identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

tessera_meta::reflect_class!(Quat as "Quaternion" {
    x => "x",
    y => "y",
    z => "z",
    w => "w",
});

impl Quat {
    /// No rotation.
    pub const IDENTITY: Quat = Quat::new(0.0, 0.0, 0.0, 1.0);

    /// Quaternion from its components.
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Unit-length copy. A zero or non-finite quaternion becomes the identity.
    pub fn normalize(self) -> Quat {
        let length = self.length();
        if length <= f32::EPSILON || !length.is_finite() {
            return Quat::IDENTITY;
        }
        Quat::new(
            self.x / length,
            self.y / length,
            self.z / length,
            self.w / length,
        )
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// Position, orientation and scale of an entity.
///
/// Every entity built by the factory carries one.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

tessera_meta::reflect_class!(Transform as "TransformComponent" {
    position => "Position",
    rotation => "Rotation",
    scale => "Scale",
});

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Component for Transform {
    fn initialize(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.rotation = self.rotation.normalize();
    }

    fn debug_ui(&self, _owner: &Entity, draw: &mut DebugDraw) {
        draw.add_transform(self.position, self.rotation, self.scale);
    }
}
