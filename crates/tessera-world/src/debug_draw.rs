//! Debug primitive sink.
//!
//! Components and services push shapes during the world's debug-UI pass;
//! an external renderer reads or drains them afterwards.

use crate::transform::{Quat, Vec3};

/// RGBA colour, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    /// Colour used for collider boxes.
    pub const LIGHT_GREEN: Color = Color::rgb(0.56, 0.93, 0.56);

    /// Opaque colour from its red, green and blue parts.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// One debug primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugShape {
    /// Local axes of a transform.
    Transform {
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
    },
    /// Axis-aligned box given by its center and half extents.
    Aabb {
        center: Vec3,
        extend: Vec3,
        color: Color,
    },
    /// Straight segment between two points.
    Line {
        from: Vec3,
        to: Vec3,
        color: Color,
    },
}

/// Shapes recorded during one debug-UI pass.
#[derive(Debug, Clone, Default)]
pub struct DebugDraw {
    shapes: Vec<DebugShape>,
}

impl DebugDraw {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the axes of a transform.
    pub fn add_transform(&mut self, position: Vec3, rotation: Quat, scale: Vec3) {
        self.shapes.push(DebugShape::Transform {
            position,
            rotation,
            scale,
        });
    }

    /// Record an axis-aligned box.
    pub fn add_aabb(&mut self, center: Vec3, extend: Vec3, color: Color) {
        self.shapes.push(DebugShape::Aabb {
            center,
            extend,
            color,
        });
    }

    /// Record a line segment.
    pub fn add_line(&mut self, from: Vec3, to: Vec3, color: Color) {
        self.shapes.push(DebugShape::Line { from, to, color });
    }

    /// Shapes recorded so far, in order.
    pub fn shapes(&self) -> &[DebugShape] {
        &self.shapes
    }

    /// Number of recorded shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Forget every recorded shape.
    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    /// Take every recorded shape, leaving the sink empty.
    pub fn drain(&mut self) -> impl Iterator<Item = DebugShape> + '_ {
        self.shapes.drain(..)
    }
}
