use super::{Matrix4x4, Vec3};

/// Affine transform stored together with its inverse. Inverses are derived
/// per operation rather than by numerically inverting the forward matrix.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub forward: Matrix4x4,
    pub inverse: Matrix4x4,
}

impl Default for Transform {
    fn default() -> Self {
        Transform::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Transform { forward: Matrix4x4::identity(), inverse: Matrix4x4::identity() }
    }

    pub fn translate(direction: Vec3) -> Self {
        Transform {
            forward: Matrix4x4::translation(direction),
            inverse: Matrix4x4::translation(-direction),
        }
    }

    pub fn scale(scale: Vec3) -> Self {
        Transform {
            forward: Matrix4x4::scale(scale),
            inverse: Matrix4x4::scale(Vec3(1.0 / scale.0, 1.0 / scale.1, 1.0 / scale.2)),
        }
    }

    pub fn rotate_x(theta: f32) -> Self {
        Transform {
            forward: Matrix4x4::rotation_x(theta),
            inverse: Matrix4x4::rotation_x(-theta),
        }
    }

    pub fn rotate_y(theta: f32) -> Self {
        Transform {
            forward: Matrix4x4::rotation_y(theta),
            inverse: Matrix4x4::rotation_y(-theta),
        }
    }

    pub fn rotate_z(theta: f32) -> Self {
        Transform {
            forward: Matrix4x4::rotation_z(theta),
            inverse: Matrix4x4::rotation_z(-theta),
        }
    }

    /// Transform which applies `self` first, then `other`.
    pub fn compose(&self, other: Transform) -> Self {
        // OTHER matmul SELF for forward direction
        // SELF.INVERSE matmul OTHER for inverse
        Transform {
            forward: Matrix4x4::matmul(other.forward, self.forward),
            inverse: Matrix4x4::matmul(self.inverse, other.inverse)
        }
    }

    pub fn apply_point(&self, point: Vec3) -> Vec3 {
        self.forward.apply_point(point)
    }
}
