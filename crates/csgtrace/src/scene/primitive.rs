//! Analytic primitives, the leaves of every scene graph.
//!
//! Both kinds are described in their own local space; any placement in the
//! world comes from an enclosing transform chain.
//! - Sphere: centered at `position` with radius `radius`
//! - HalfPlane: the solid below the plane `y = position.y`, or above it when
//!   the orientation (stored in `radius`) is negative

use crate::geometry::Vec3;

use super::MaterialId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Sphere,
    HalfPlane,
}

impl PrimitiveKind {
    /// Type tag stored in device primitive records
    pub const fn tag(self) -> u32 {
        match self {
            PrimitiveKind::Sphere => 0,
            PrimitiveKind::HalfPlane => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub position: Vec3,
    // radius for spheres, orientation for half-planes
    pub radius: f32,
    pub material: MaterialId,
}

impl Primitive {
    pub fn sphere(position: Vec3, radius: f32, material: MaterialId) -> Primitive {
        Primitive { kind: PrimitiveKind::Sphere, position, radius, material }
    }

    pub fn half_plane(position: Vec3, orientation: f32, material: MaterialId) -> Primitive {
        Primitive { kind: PrimitiveKind::HalfPlane, position, radius: orientation, material }
    }

    /// Outward normal of a half-plane in local space.
    pub fn half_plane_normal(orientation: f32) -> Vec3 {
        if orientation >= 0.0 {
            Vec3(0.0, 1.0, 0.0)
        } else {
            Vec3(0.0, -1.0, 0.0)
        }
    }
}
