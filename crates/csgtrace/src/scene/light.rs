use crate::geometry::Vec3;

/// Point light; lights are packed in declaration order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    pub position: Vec3,
    pub color: Vec3,
}
