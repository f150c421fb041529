use bytemuck::{Pod, Zeroable};
use csgtrace::geometry::Vec3;

#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// One entry of a level's ray buffer. The fourth channel of the origin
/// carries the ray's weight, the fourth channel of the direction the
/// refractive index of the medium the ray travels through. An all-zero slot
/// was never spawned.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RaySlot {
    pub origin: Vec3,
    pub weight: f32,
    pub direction: Vec3,
    pub ior: f32,
}

impl RaySlot {
    pub fn primary(origin: Vec3, direction: Vec3) -> RaySlot {
        RaySlot { origin, weight: 1.0, direction, ior: 1.0 }
    }

    pub fn is_idle(&self) -> bool {
        self.origin.is_zero() && self.direction.is_zero()
    }

    pub fn ray(&self) -> Ray {
        Ray { origin: self.origin, direction: self.direction }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub t: f32,
    // world space, unit length
    pub normal: Vec3,
    pub primitive: u32,
}

impl Hit {
    pub fn flipped(self) -> Hit {
        Hit { normal: -self.normal, ..self }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Miss,
    Entering,
    Exiting,
}

pub fn classify(hit: Option<Hit>, direction: Vec3) -> Classification {
    match hit {
        None => Classification::Miss,
        Some(hit) if Vec3::dot(hit.normal, direction) < 0.0 => Classification::Entering,
        Some(_) => Classification::Exiting,
    }
}
